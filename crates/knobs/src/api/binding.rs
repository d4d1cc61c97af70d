//! The API of input and monitor blades.

use std::{
    any::Any,
    ops::Deref,
    rc::{Rc, Weak},
};

use serde_json::Value as JsonValue;

use super::{
    AnyBladeApi, BladeApi,
    blade::extended_api,
    event::{ApiEvent, emit_change},
};
use crate::{
    binding::BindingTarget,
    blade::BladeRef,
    constraint::ListItem,
    controllers::{
        BindingController, GraphController, ListController, ListOptionsRef, SliderController,
        ValueController,
    },
    emitter::{Emitter, Subscription},
    error::{Error, Result},
    plugins::PluginPool,
    value::{ComplexValue, Value},
};

/// Host-facing handle to a binding blade.
pub struct BindingApi {
    /// Generic part.
    blade: BladeApi,
    /// The bound property.
    target: BindingTarget,
    /// `change` and `internal-change` events.
    emitter: Emitter<ApiEvent>,
    /// Listener on the bound value.
    _sub: Option<Subscription>,
}

impl AnyBladeApi for BindingApi {
    fn blade_api(&self) -> &BladeApi {
        &self.blade
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Rc<Self>) -> Rc<dyn Any> {
        self
    }

    fn into_binding(self: Rc<Self>) -> Option<Rc<BindingApi>> {
        Some(self)
    }
}

impl Deref for BindingApi {
    type Target = BladeApi;

    fn deref(&self) -> &Self::Target {
        &self.blade
    }
}

impl BindingApi {
    /// Wrap a binding controller. `None` for other blades.
    pub fn new(controller: BladeRef, pool: Rc<PluginPool>) -> Option<Self> {
        let target = controller.body_as::<BindingController>()?.target().clone();
        let emitter = Emitter::new();
        let weak_emitter = emitter.downgrade();
        let weak_controller: Weak<_> = Rc::downgrade(&controller);
        let sub = controller.body().on_value_change(Rc::new(move |options, internal| {
            if let (Some(emitter), Some(controller)) =
                (weak_emitter.upgrade(), weak_controller.upgrade())
            {
                emit_change(&emitter, &controller, options, internal);
            }
        }));
        Some(Self {
            blade: BladeApi::new(controller, pool),
            target,
            emitter,
            _sub: sub,
        })
    }

    /// The binding body.
    fn body(&self) -> Result<&BindingController> {
        self.controller()
            .body_as::<BindingController>()
            .ok_or(Error::ShouldNeverHappen)
    }

    /// `change` and `internal-change` events.
    pub fn emitter(&self) -> &Emitter<ApiEvent> {
        &self.emitter
    }

    /// The bound key.
    pub fn key(&self) -> &str {
        self.target.key()
    }

    /// The current external value.
    pub fn value(&self) -> Result<JsonValue> {
        self.target.read()
    }

    /// True for monitors.
    pub fn is_readonly(&self) -> bool {
        self.body().is_ok_and(BindingController::is_readonly)
    }

    /// The label.
    pub fn label(&self) -> Option<String> {
        self.body().ok()?.label().label.raw_value()
    }

    /// Replace the label.
    pub fn set_label(&self, label: Option<String>) -> Result<()> {
        self.ensure_live()?;
        self.body()?.label().label.set(label);
        Ok(())
    }

    /// The host tag.
    pub fn tag(&self) -> Option<String> {
        self.body().ok()?.tag()
    }

    /// Replace the host tag.
    pub fn set_tag(&self, tag: Option<String>) -> Result<()> {
        self.ensure_live()?;
        self.body()?.set_tag(tag);
        Ok(())
    }

    /// Re-read the bound property.
    pub fn refresh(&self) -> Result<()> {
        self.controller().refresh()
    }
}

/// The value controller of a binding blade, as a concrete type.
fn value_controller<C: ValueController>(controller: &BladeRef) -> Option<&C> {
    controller.body_as::<BindingController>()?.controller_as::<C>()
}

/// Host-facing handle to a number input shown as a slider.
pub struct SliderBindingApi {
    /// The binding API it extends.
    base: Rc<BindingApi>,
    /// Left end of the range.
    min: Rc<ComplexValue<f64>>,
    /// Right end of the range.
    max: Rc<ComplexValue<f64>>,
}

extended_api!(SliderBindingApi => BindingApi);

impl SliderBindingApi {
    /// Wrap a slider input. `None` for other blades.
    pub fn new(controller: BladeRef, pool: Rc<PluginPool>) -> Option<Self> {
        let props = value_controller::<SliderController>(&controller)?.props();
        let (min, max) = (props.min.clone(), props.max.clone());
        Some(Self {
            base: Rc::new(BindingApi::new(controller, pool)?),
            min,
            max,
        })
    }

    /// Left end of the range.
    pub fn min(&self) -> f64 {
        self.min.raw_value()
    }

    /// Move the left end. The bound value is clamped into the new range.
    pub fn set_min(&self, min: f64) -> Result<()> {
        self.ensure_live()?;
        self.min.set(min);
        Ok(())
    }

    /// Right end of the range.
    pub fn max(&self) -> f64 {
        self.max.raw_value()
    }

    /// Move the right end. The bound value is clamped into the new range.
    pub fn set_max(&self, max: f64) -> Result<()> {
        self.ensure_live()?;
        self.max.set(max);
        Ok(())
    }
}

/// Host-facing handle to an input picking from a list of choices.
pub struct ListBindingApi<T> {
    /// The binding API it extends.
    base: Rc<BindingApi>,
    /// The choices.
    options: ListOptionsRef<T>,
}

extended_api!(ListBindingApi<T> => BindingApi);

impl<T: Clone + PartialEq + 'static> ListBindingApi<T> {
    /// Wrap a list input over `T`. `None` for other blades.
    pub fn new(controller: BladeRef, pool: Rc<PluginPool>) -> Option<Self> {
        let options = value_controller::<ListController<T>>(&controller)?
            .options()
            .clone();
        Some(Self {
            base: Rc::new(BindingApi::new(controller, pool)?),
            options,
        })
    }

    /// The choices, in display order.
    pub fn options(&self) -> Vec<ListItem<T>> {
        self.options.raw_value()
    }

    /// Replace the choices. A bound value that is no longer a choice
    /// becomes the first one.
    pub fn set_options(&self, options: Vec<ListItem<T>>) -> Result<()> {
        self.ensure_live()?;
        self.options.set(options);
        Ok(())
    }
}

/// Host-facing handle to a number monitor shown as a graph.
pub struct GraphBindingApi {
    /// The binding API it extends.
    base: Rc<BindingApi>,
    /// Bottom of the plot.
    min: Rc<ComplexValue<f64>>,
    /// Top of the plot.
    max: Rc<ComplexValue<f64>>,
}

extended_api!(GraphBindingApi => BindingApi);

impl GraphBindingApi {
    /// Wrap a graph monitor. `None` for other blades.
    pub fn new(controller: BladeRef, pool: Rc<PluginPool>) -> Option<Self> {
        let props = value_controller::<GraphController>(&controller)?.props();
        let (min, max) = (props.min.clone(), props.max.clone());
        Some(Self {
            base: Rc::new(BindingApi::new(controller, pool)?),
            min,
            max,
        })
    }

    /// Bottom of the plot.
    pub fn min(&self) -> f64 {
        self.min.raw_value()
    }

    /// Move the bottom of the plot.
    pub fn set_min(&self, min: f64) -> Result<()> {
        self.ensure_live()?;
        self.min.set(min);
        Ok(())
    }

    /// Top of the plot.
    pub fn max(&self) -> f64 {
        self.max.raw_value()
    }

    /// Move the top of the plot.
    pub fn set_max(&self, max: f64) -> Result<()> {
        self.ensure_live()?;
        self.max.set(max);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use serde_json::json;

    use super::*;
    use crate::{
        api::{
            AnyBladeApi,
            event::{ApiEventName, ChangeEvent},
        },
        binding::{BindableRef, bindable},
        controllers::SliderController,
        plugins::Params,
        scheduler::Scheduler,
        state::record,
    };

    /// A number input over `obj.x`, with its API.
    fn setup(obj: &BindableRef, params: &Params) -> Rc<BindingApi> {
        let pool = PluginPool::with_defaults(Scheduler::new());
        let bc = pool.create_binding(obj, "x", params).unwrap();
        pool.create_api(&bc).into_binding().unwrap()
    }

    /// The plugin-specific API of a binding of `obj[key]`.
    fn specific_api<A: AnyBladeApi>(obj: &BindableRef, key: &str, params: &Params) -> Rc<A> {
        let pool = PluginPool::with_defaults(Scheduler::new());
        let bc = pool.create_binding(obj, key, params).unwrap();
        pool.create_api(&bc).into_any().downcast::<A>().unwrap()
    }

    /// Record the value and `last` flag of events named `name`.
    fn record_events(
        api: &BindingApi,
        name: ApiEventName,
    ) -> (Rc<RefCell<Vec<(JsonValue, bool)>>>, Subscription) {
        let seen = Rc::new(RefCell::new(vec![]));
        let s = seen.clone();
        let sub = api.emitter().on(name, move |ev| {
            if let ApiEvent::Change(ChangeEvent { value, last, .. })
            | ApiEvent::InternalChange(ChangeEvent { value, last, .. }) = ev
            {
                s.borrow_mut().push((value.clone(), *last));
            }
        });
        (seen, sub)
    }

    #[test]
    fn change_events() {
        let obj: BindableRef = bindable(json!({"x": 1}));
        let api = setup(&obj, &record(json!({"min": 0, "max": 10})));
        let (all, _a) = record_events(&api, ApiEventName::Change);
        let (internal, _b) = record_events(&api, ApiEventName::InternalChange);

        obj.borrow_mut().write_property("x", json!(3)).unwrap();
        api.refresh().unwrap();
        let body = api.controller().body_as::<BindingController>().unwrap();
        let slider = body.controller_as::<SliderController>().unwrap();
        slider.set_ratio(0.5, false);
        slider.set_ratio(0.6, true);

        assert_eq!(
            *all.borrow(),
            vec![(json!(3), true), (json!(5), false), (json!(6), true)]
        );
        assert_eq!(*internal.borrow(), vec![(json!(5), false), (json!(6), true)]);
    }

    #[test]
    fn label_and_tag() {
        let obj: BindableRef = bindable(json!({"x": 1}));
        let api = setup(&obj, &record(json!({"label": "Ex", "tag": "t1"})));
        assert_eq!(api.key(), "x");
        assert_eq!(api.label().as_deref(), Some("Ex"));
        assert_eq!(api.tag().as_deref(), Some("t1"));
        api.set_label(None).unwrap();
        assert_eq!(api.label(), None);
        api.dispose().unwrap();
        assert_eq!(api.set_tag(None), Err(Error::AlreadyDisposed));
        assert_eq!(api.dispose(), Err(Error::AlreadyDisposed));
    }

    #[test]
    fn slider_range_moves_the_bound_value() {
        let obj: BindableRef = bindable(json!({"x": 8}));
        let api = specific_api::<SliderBindingApi>(&obj, "x", &record(json!({"min": 0, "max": 10})));
        assert_eq!((api.min(), api.max()), (0.0, 10.0));
        assert_eq!(api.key(), "x");

        api.set_max(5.0).unwrap();
        assert_eq!(obj.borrow().read_property("x"), Some(json!(5)));
        assert_eq!(api.export_state().unwrap()["max"], json!(5.0));

        let binding = api.clone().into_binding().unwrap();
        assert!(Rc::ptr_eq(&binding, &api.base));
        api.dispose().unwrap();
        assert_eq!(api.set_min(1.0), Err(Error::AlreadyDisposed));
    }

    #[test]
    fn list_options_can_be_replaced() {
        let obj: BindableRef = bindable(json!({"s": "b"}));
        let params = record(json!({"options": {"A": "a", "B": "b"}}));
        let api = specific_api::<ListBindingApi<String>>(&obj, "s", &params);
        let texts: Vec<_> = api.options().into_iter().map(|o| o.text).collect();
        assert_eq!(texts, vec!["A", "B"]);

        api.set_options(vec![ListItem {
            text: "C".into(),
            value: "c".into(),
        }])
        .unwrap();
        assert_eq!(obj.borrow().read_property("s"), Some(json!("c")));
        assert_eq!(api.options()[0].value, "c");
    }

    #[test]
    fn graph_range_rescales_points() {
        let obj: BindableRef = bindable(json!({"x": 50}));
        let params = record(json!({"readonly": true, "view": "graph", "interval": 0}));
        let api = specific_api::<GraphBindingApi>(&obj, "x", &params);
        assert!(api.is_readonly());
        assert_eq!(api.max(), 100.0);

        api.set_max(200.0).unwrap();
        let body = api.controller().body_as::<BindingController>().unwrap();
        let graph = body.controller_as::<GraphController>().unwrap();
        assert_eq!(graph.points().last(), Some(&Some(0.25)));
    }

    #[test]
    fn plain_inputs_keep_the_generic_api() {
        let obj: BindableRef = bindable(json!({"x": 1}));
        let pool = PluginPool::with_defaults(Scheduler::new());
        let bc = pool.create_binding(&obj, "x", &Params::new()).unwrap();
        let api = pool.create_api(&bc);
        assert!(api.as_any().is::<BindingApi>());
        assert!(api.into_binding().is_some());
    }
}
