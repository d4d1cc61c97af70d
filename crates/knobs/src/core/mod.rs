//! The reactive engine: events, values, bindings, constraints and the
//! controller tree.

/// Bindable objects, binding targets and bindings.
pub mod binding;
/// Values glued to bindings.
pub mod binding_value;
/// Blades and blade controllers.
pub mod blade;
/// Value-shaping constraints.
pub mod constraint;
/// Typed publish/subscribe.
pub mod emitter;
/// Core error types.
pub mod error;
/// Blade and plugin identifiers.
pub mod id;
/// Ordered child collections.
pub mod rack;
/// Timer host for interval tickers.
pub mod scheduler;
/// Core version tags.
pub mod semver;
/// Exported state records.
pub mod state;
/// Testing utilities.
#[cfg(any(test, feature = "testing"))]
pub mod testing;
/// Tick sources.
pub mod ticker;
/// Observable values.
pub mod value;
/// Observable records.
pub mod value_map;
/// Cascading view state.
pub mod view_props;
