//! Host-facing handles for blades.
//!
//! Every controller is reached through an API object built by the plugin
//! pool. The pool caches API objects, so asking twice for the same
//! controller yields the same handle while the host holds it.

/// Input and monitor APIs.
pub mod binding;
/// The generic blade API.
pub mod blade;
/// Button APIs.
pub mod button;
/// API object cache.
pub mod cache;
/// Adding and removing children.
pub mod container;
/// API events.
pub mod event;
/// Folder APIs.
pub mod folder;
/// The root container.
pub mod pane;
/// Tab and tab page APIs.
pub mod tab;
/// List, slider and text blade APIs.
pub mod value_blade;

pub use binding::{BindingApi, GraphBindingApi, ListBindingApi, SliderBindingApi};
pub use blade::{AnyBladeApi, BladeApi};
pub use button::ButtonApi;
pub use cache::BladeApiCache;
pub use container::Container;
pub use event::{ApiEvent, ApiEventName, ChangeEvent};
pub use folder::FolderApi;
pub use pane::{Pane, PaneConfig};
pub use tab::{TabApi, TabPageApi};
pub use value_blade::{ListBladeApi, SliderBladeApi, TextBladeApi, ValueBladeApi};
