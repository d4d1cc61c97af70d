//! Plugins: recipes that turn a bound value or a set of params into a
//! controller, and the pool that dispatches between them.

/// Plugins for blades with no bound value.
pub mod blades;
/// Boolean inputs and monitors.
pub mod boolean;
/// Color inputs.
pub mod color;
/// Conversions between bound JSON and internal values.
pub mod convert;
/// Number inputs and monitors.
pub mod number;
/// Plugin options.
pub mod params;
/// The plugin protocol.
pub mod plugin;
/// Point inputs.
pub mod point;
/// Plugin registration and dispatch.
pub mod pool;
/// String inputs and monitors.
pub mod string;

pub use params::{BindingParams, BladeParams, Params};
pub use plugin::{
    AnyBindingPlugin, AnyBladePlugin, BindingArgs, BladeArgs, BladePlugin, InputControllerArgs,
    InputPlugin, MonitorControllerArgs, MonitorPlugin, Plugin, PluginBundle,
};
pub use pool::PluginPool;
