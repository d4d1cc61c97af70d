//! Blade bodies and the value controllers plugins build for bindings.

use std::{any::Any, result::Result as StdResult};

use crate::{
    error::{ParseError, Result},
    state::BladeState,
};

/// Binding blade bodies.
pub mod binding;
/// Button blades.
pub mod button;
/// Checkbox value controllers.
pub mod checkbox;
/// Color value controllers.
pub mod color;
/// Folder blades.
pub mod folder;
/// Graph monitor controllers.
pub mod graph;
/// Labels of value blades.
pub mod label;
/// Choice value controllers.
pub mod list;
/// Log monitor controllers.
pub mod log;
/// Point value controllers.
pub mod point;
/// Separator blades.
pub mod separator;
/// Slider value controllers.
pub mod slider;
/// Tab blades and their pages.
pub mod tab;
/// Text value controllers.
pub mod text;
/// Blades owning a labelled value.
pub mod value_blade;

pub use binding::{BindingController, BoundValue};
pub use button::ButtonBody;
pub use checkbox::CheckboxController;
pub use color::{Color, ColorController};
pub use folder::FolderBody;
pub use graph::GraphController;
pub use label::LabelProps;
pub use list::{ListController, ListOptionsRef, list_options};
pub use log::LogController;
pub use point::PointController;
pub use separator::SeparatorBody;
pub use slider::{SliderController, SliderProps};
pub use tab::{Tab, TabBody, TabPageBody};
pub use text::TextController;
pub use value_blade::ValueBladeBody;

/// The plugin-specific half of a binding blade: edits or displays the
/// bound value, and may carry its own exported props.
pub trait ValueController: Any {
    /// Check prop fields of a state record without applying them.
    fn validate_props(&self, _state: &BladeState) -> StdResult<(), ParseError> {
        Ok(())
    }

    /// Apply prop fields of a state record.
    fn import_props(&self, _state: &BladeState) -> Result<()> {
        Ok(())
    }

    /// Export prop fields.
    fn export_props(&self) -> BladeState {
        BladeState::new()
    }

    /// Release resources.
    fn dispose(&self) {}

    /// Downcasting support.
    fn as_any(&self) -> &dyn Any;
}
