//! The plugin protocol.
//!
//! A plugin is a recipe for one family of blades or bound values. Plugin
//! authors implement one of the typed traits [`BladePlugin`],
//! [`InputPlugin`] or [`MonitorPlugin`]. The pool only sees the erased
//! forms, which assemble the binding, value and controller in a fixed
//! order once a plugin accepts.

use std::{fmt, rc::Rc};

use serde_json::Value as JsonValue;
use tracing::debug;

use super::{
    params::{BindingParams, BladeParams, Params},
    pool::PluginPool,
};
use crate::{
    api::AnyBladeApi,
    binding::{BindingReader, BindingTarget, BindingWriter, ReadWriteBinding, ReadonlyBinding},
    binding_value::{Buffer, InputBindingValue, MonitorBindingValue},
    blade::{Blade, BladeController, BladeRef},
    constraint::ConstraintRef,
    controllers::{BindingController, ValueController},
    error::Result,
    scheduler::Scheduler,
    semver::Semver,
    ticker::{IntervalTicker, ManualTicker, Ticker},
    value::{ComplexValue, Equality, ValueRef},
    view_props::ViewProps,
};

/// Inputs to a blade plugin's controller factory.
pub struct BladeArgs<P> {
    /// The plugin's accepted params.
    pub params: P,
    /// Ordering state for the new controller.
    pub blade: Blade,
    /// View state for the new controller.
    pub view_props: ViewProps,
}

/// A recipe for a blade with no bound value.
pub trait BladePlugin: 'static {
    /// The plugin's parsed options.
    type Params;

    /// Plugin identifier.
    fn id(&self) -> &str;

    /// The core version the plugin was built against.
    fn core(&self) -> Semver {
        Semver::core()
    }

    /// Parse params, or decline with `Ok(None)`.
    fn accept(&self, params: &Params) -> Result<Option<Self::Params>>;

    /// Build the controller.
    fn controller(&self, args: BladeArgs<Self::Params>) -> BladeRef;

    /// Build a specific API object. `None` uses the generic one.
    fn api(&self, _controller: &BladeRef, _pool: &Rc<PluginPool>) -> Option<Rc<dyn AnyBladeApi>> {
        None
    }
}

/// Inputs to the binding factories of input and monitor plugins.
pub struct BindingArgs<'a, P> {
    /// The external value at bind time.
    pub initial: &'a JsonValue,
    /// The plugin's accepted params.
    pub params: &'a P,
    /// The bound property.
    pub target: &'a BindingTarget,
}

/// Inputs to an input plugin's controller factory.
pub struct InputControllerArgs<'a, T, P> {
    /// The bound value. Edits made through it are written out.
    pub value: ValueRef<T>,
    /// The constraint the value applies.
    pub constraint: Option<ConstraintRef<T>>,
    /// The plugin's accepted params.
    pub params: &'a P,
    /// View state of the binding blade.
    pub view_props: ViewProps,
}

/// A recipe for an editable bound value.
pub trait InputPlugin: 'static {
    /// The internal representation.
    type Value: Clone + PartialEq + 'static;
    /// The plugin's parsed options.
    type Params;

    /// Plugin identifier.
    fn id(&self) -> &str;

    /// The core version the plugin was built against.
    fn core(&self) -> Semver {
        Semver::core()
    }

    /// Inspect the external value and params, or decline with `Ok(None)`.
    fn accept(&self, value: &JsonValue, params: &Params) -> Result<Option<Self::Params>>;

    /// External to internal conversion.
    fn reader(&self, args: &BindingArgs<'_, Self::Params>) -> BindingReader<Self::Value>;

    /// Constraint applied to every write.
    fn constraint(&self, _args: &BindingArgs<'_, Self::Params>) -> Option<ConstraintRef<Self::Value>> {
        None
    }

    /// Change detection. Defaults to `PartialEq`.
    fn equals(&self, _args: &BindingArgs<'_, Self::Params>) -> Option<Equality<Self::Value>> {
        None
    }

    /// Internal to external conversion.
    fn writer(&self, args: &BindingArgs<'_, Self::Params>) -> BindingWriter<Self::Value>;

    /// Build the value controller.
    fn controller(
        &self,
        args: InputControllerArgs<'_, Self::Value, Self::Params>,
    ) -> Box<dyn ValueController>;

    /// Build a specific API object. `None` uses the generic one.
    fn api(&self, _controller: &BladeRef, _pool: &Rc<PluginPool>) -> Option<Rc<dyn AnyBladeApi>> {
        None
    }
}

/// Inputs to a monitor plugin's controller factory.
pub struct MonitorControllerArgs<'a, T, P> {
    /// The sample history.
    pub value: Rc<ComplexValue<Buffer<T>>>,
    /// The plugin's accepted params.
    pub params: &'a P,
    /// View state of the binding blade.
    pub view_props: ViewProps,
}

/// A recipe for a polled, read-only bound value.
pub trait MonitorPlugin: 'static {
    /// The internal representation of one sample.
    type Value: Clone + 'static;
    /// The plugin's parsed options.
    type Params;

    /// Plugin identifier.
    fn id(&self) -> &str;

    /// The core version the plugin was built against.
    fn core(&self) -> Semver {
        Semver::core()
    }

    /// Inspect the external value and params, or decline with `Ok(None)`.
    fn accept(&self, value: &JsonValue, params: &Params) -> Result<Option<Self::Params>>;

    /// External to internal conversion.
    fn reader(&self, args: &BindingArgs<'_, Self::Params>) -> BindingReader<Self::Value>;

    /// History length when the host does not set `bufferSize`.
    fn default_buffer_size(&self, _params: &Self::Params) -> usize {
        1
    }

    /// Build the value controller.
    fn controller(
        &self,
        args: MonitorControllerArgs<'_, Self::Value, Self::Params>,
    ) -> Box<dyn ValueController>;

    /// Build a specific API object. `None` uses the generic one.
    fn api(&self, _controller: &BladeRef, _pool: &Rc<PluginPool>) -> Option<Rc<dyn AnyBladeApi>> {
        None
    }
}

/// What the pool hands a binding plugin.
pub struct BindingContext<'a> {
    /// The bound property.
    pub target: &'a BindingTarget,
    /// The external value at bind time.
    pub initial: &'a JsonValue,
    /// The host's params.
    pub params: &'a Params,
    /// Base options parsed from `params`.
    pub base: &'a BindingParams,
    /// Timer host for interval tickers.
    pub scheduler: &'a Scheduler,
}

/// A blade plugin with its params type erased.
pub trait AnyBladePlugin {
    /// Plugin identifier.
    fn id(&self) -> &str;
    /// The core version the plugin was built against.
    fn core(&self) -> Semver;
    /// Build a controller if the plugin accepts.
    fn create(&self, params: &Params, base: &BladeParams) -> Result<Option<BladeRef>>;
    /// Build a specific API object.
    fn api(&self, controller: &BladeRef, pool: &Rc<PluginPool>) -> Option<Rc<dyn AnyBladeApi>>;
}

impl<P: BladePlugin> AnyBladePlugin for P {
    fn id(&self) -> &str {
        BladePlugin::id(self)
    }

    fn core(&self) -> Semver {
        BladePlugin::core(self)
    }

    fn create(&self, params: &Params, base: &BladeParams) -> Result<Option<BladeRef>> {
        let Some(params) = BladePlugin::accept(self, params)? else {
            return Ok(None);
        };
        debug!(plugin = BladePlugin::id(self), "blade accepted");
        Ok(Some(self.controller(BladeArgs {
            params,
            blade: Blade::create(),
            view_props: base.view_props(),
        })))
    }

    fn api(&self, controller: &BladeRef, pool: &Rc<PluginPool>) -> Option<Rc<dyn AnyBladeApi>> {
        BladePlugin::api(self, controller, pool)
    }
}

/// An input or monitor plugin with its types erased.
pub trait AnyBindingPlugin {
    /// Plugin identifier.
    fn id(&self) -> &str;
    /// The core version the plugin was built against.
    fn core(&self) -> Semver;
    /// Build a binding controller if the plugin accepts.
    fn create(&self, cx: &BindingContext<'_>) -> Result<Option<BladeRef>>;
    /// Build a specific API object.
    fn api(&self, controller: &BladeRef, pool: &Rc<PluginPool>) -> Option<Rc<dyn AnyBladeApi>>;
}

/// `PartialEq` as a value comparator.
fn default_equals<T: PartialEq + 'static>() -> Equality<T> {
    Rc::new(|a: &T, b: &T| a == b)
}

/// Adapts an [`InputPlugin`] to [`AnyBindingPlugin`].
pub struct Input<P>(pub P);

impl<P: InputPlugin> AnyBindingPlugin for Input<P> {
    fn id(&self) -> &str {
        self.0.id()
    }

    fn core(&self) -> Semver {
        self.0.core()
    }

    fn create(&self, cx: &BindingContext<'_>) -> Result<Option<BladeRef>> {
        let plugin = &self.0;
        let Some(params) = plugin.accept(cx.initial, cx.params)? else {
            return Ok(None);
        };
        let args = BindingArgs {
            initial: cx.initial,
            params: &params,
            target: cx.target,
        };
        let reader = plugin.reader(&args);
        let constraint = plugin.constraint(&args);
        let equals = plugin.equals(&args).unwrap_or_else(default_equals);
        let writer = plugin.writer(&args);

        let binding = ReadWriteBinding::new(cx.target.clone(), reader.clone(), writer);
        let value = Rc::new(ComplexValue::with_equality(
            reader(cx.initial),
            constraint.clone(),
            equals,
        ));
        let bound = InputBindingValue::new(value, binding);
        let view_props = cx.base.view_props();
        let controller = plugin.controller(InputControllerArgs {
            value: bound.clone(),
            constraint,
            params: &params,
            view_props: view_props.clone(),
        });
        let body = BindingController::input(
            Some(cx.base.label_for(cx.target.key())),
            cx.base.tag.clone(),
            bound,
            controller,
        );
        debug!(plugin = plugin.id(), key = cx.target.key(), "input created");
        Ok(Some(BladeController::new(Blade::create(), view_props, body)))
    }

    fn api(&self, controller: &BladeRef, pool: &Rc<PluginPool>) -> Option<Rc<dyn AnyBladeApi>> {
        self.0.api(controller, pool)
    }
}

/// Adapts a [`MonitorPlugin`] to [`AnyBindingPlugin`].
pub struct Monitor<P>(pub P);

impl<P: MonitorPlugin> AnyBindingPlugin for Monitor<P> {
    fn id(&self) -> &str {
        self.0.id()
    }

    fn core(&self) -> Semver {
        self.0.core()
    }

    fn create(&self, cx: &BindingContext<'_>) -> Result<Option<BladeRef>> {
        let plugin = &self.0;
        let Some(params) = plugin.accept(cx.initial, cx.params)? else {
            return Ok(None);
        };
        let args = BindingArgs {
            initial: cx.initial,
            params: &params,
            target: cx.target,
        };
        let reader = plugin.reader(&args);
        let buffer_size = cx
            .base
            .buffer_size
            .unwrap_or_else(|| plugin.default_buffer_size(&params));
        let interval = cx.base.interval();
        let ticker: Rc<dyn Ticker> = if interval.is_zero() {
            Rc::new(ManualTicker::new())
        } else {
            IntervalTicker::new(cx.scheduler, interval)
        };
        let bound = MonitorBindingValue::new(
            ReadonlyBinding::new(cx.target.clone(), reader),
            ticker,
            buffer_size,
        );
        let view_props = cx.base.view_props();
        let controller = plugin.controller(MonitorControllerArgs {
            value: bound.value().clone(),
            params: &params,
            view_props: view_props.clone(),
        });
        let body = BindingController::monitor(
            Some(cx.base.label_for(cx.target.key())),
            cx.base.tag.clone(),
            bound,
            controller,
            &view_props,
        );
        debug!(
            plugin = plugin.id(),
            key = cx.target.key(),
            buffer_size,
            "monitor created"
        );
        Ok(Some(BladeController::new(Blade::create(), view_props, body)))
    }

    fn api(&self, controller: &BladeRef, pool: &Rc<PluginPool>) -> Option<Rc<dyn AnyBladeApi>> {
        self.0.api(controller, pool)
    }
}

/// A registered plugin of any kind.
#[derive(Clone)]
pub enum Plugin {
    /// A blade plugin.
    Blade(Rc<dyn AnyBladePlugin>),
    /// An input plugin.
    Input(Rc<dyn AnyBindingPlugin>),
    /// A monitor plugin.
    Monitor(Rc<dyn AnyBindingPlugin>),
}

impl Plugin {
    /// Wrap a blade plugin.
    pub fn blade(p: impl BladePlugin) -> Self {
        Self::Blade(Rc::new(p))
    }

    /// Wrap an input plugin.
    pub fn input(p: impl InputPlugin) -> Self {
        Self::Input(Rc::new(Input(p)))
    }

    /// Wrap a monitor plugin.
    pub fn monitor(p: impl MonitorPlugin) -> Self {
        Self::Monitor(Rc::new(Monitor(p)))
    }

    /// Plugin identifier.
    pub fn id(&self) -> &str {
        match self {
            Self::Blade(p) => p.id(),
            Self::Input(p) | Self::Monitor(p) => p.id(),
        }
    }

    /// The core version the plugin was built against.
    pub fn core(&self) -> Semver {
        match self {
            Self::Blade(p) => p.core(),
            Self::Input(p) | Self::Monitor(p) => p.core(),
        }
    }

    /// A short name for the plugin kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Blade(_) => "blade",
            Self::Input(_) => "input",
            Self::Monitor(_) => "monitor",
        }
    }

    /// Build a specific API object.
    pub(crate) fn api(
        &self,
        controller: &BladeRef,
        pool: &Rc<PluginPool>,
    ) -> Option<Rc<dyn AnyBladeApi>> {
        match self {
            Self::Blade(p) => p.api(controller, pool),
            Self::Input(p) | Self::Monitor(p) => p.api(controller, pool),
        }
    }
}

impl fmt::Debug for Plugin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind(), self.id())
    }
}

/// Plugins registered together under one bundle id.
#[derive(Debug, Clone)]
pub struct PluginBundle {
    /// Bundle identifier.
    pub id: String,
    /// The plugins, in registration order.
    pub plugins: Vec<Plugin>,
}

impl PluginBundle {
    /// An empty bundle.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            plugins: vec![],
        }
    }

    /// Add a plugin.
    pub fn with(mut self, plugin: Plugin) -> Self {
        self.plugins.push(plugin);
        self
    }
}
