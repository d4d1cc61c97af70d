//! The blade body of a binding.
//!
//! A [`BindingController`] pairs a type-erased bound value with the value
//! controller a plugin built for it. Inputs and monitors share the body;
//! they differ in how state is restored and in what drives their fetches.

use std::{any::Any, cell::RefCell, rc::Rc, result::Result as StdResult};

use serde::Deserialize;
use serde_json::{Value as JsonValue, json};
use tracing::warn;

use super::{ValueController, label::LabelProps};
use crate::{
    binding::BindingTarget,
    binding_value::{InputBindingValue, MonitorBindingValue},
    blade::{BladeBody, ValueChangeHandler},
    emitter::{Subscription, Subscriptions},
    error::{Error, ParseError, Result},
    state::{BladeState, merge_state, parse_record},
    value::{Value, ValueEvent, ValueEventName},
    view_props::ViewProps,
};

/// A bound value with its element type erased.
pub trait BoundValue: Any {
    /// Re-read the bound property.
    fn fetch(&self) -> Result<()>;

    /// Restore an exported external value. Inputs write it to the bound
    /// object and fetch it back; monitors ignore it.
    fn import_value(&self, value: JsonValue) -> Result<()>;

    /// Observe changes. The handler receives the options and whether the
    /// change was internal.
    fn on_change(&self, handler: ValueChangeHandler) -> Subscription;

    /// Release subscriptions and tick sources.
    fn dispose(&self);

    /// Downcasting support.
    fn as_any(&self) -> &dyn Any;
}

impl<T: Clone + 'static> BoundValue for InputBindingValue<T> {
    fn fetch(&self) -> Result<()> {
        Self::fetch(self)
    }

    fn import_value(&self, value: JsonValue) -> Result<()> {
        self.binding().inject(value)?;
        Self::fetch(self)
    }

    fn on_change(&self, handler: ValueChangeHandler) -> Subscription {
        Value::emitter(self).on(ValueEventName::Change, move |ev| {
            if let ValueEvent::Change(c) = ev {
                handler(c.options, c.is_internal_change.unwrap_or(false));
            }
        })
    }

    fn dispose(&self) {
        Self::dispose(self);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl<T: Clone + 'static> BoundValue for MonitorBindingValue<T> {
    fn fetch(&self) -> Result<()> {
        Self::fetch(self)
    }

    fn import_value(&self, _value: JsonValue) -> Result<()> {
        Ok(())
    }

    fn on_change(&self, handler: ValueChangeHandler) -> Subscription {
        self.value().emitter().on(ValueEventName::Change, move |ev| {
            if let ValueEvent::Change(c) = ev {
                handler(c.options, false);
            }
        })
    }

    fn dispose(&self) {
        Self::dispose(self);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// The `binding` section of an input's state.
#[derive(Debug, Deserialize)]
struct InputSection {
    /// The externally visible value.
    value: JsonValue,
}

/// Input state fields.
#[derive(Debug, Deserialize)]
struct InputState {
    /// Binding section.
    binding: InputSection,
    /// Tag.
    tag: Option<String>,
}

/// Monitor state fields.
#[derive(Debug, Deserialize)]
struct MonitorState {
    /// Tag.
    tag: Option<String>,
}

/// The body of an input or monitor blade.
pub struct BindingController {
    /// Label state.
    label: LabelProps,
    /// Free-form host tag.
    tag: RefCell<Option<String>>,
    /// The bound property.
    target: BindingTarget,
    /// True for monitors.
    readonly: bool,
    /// The bound value.
    value: Rc<dyn BoundValue>,
    /// The plugin-built controller.
    controller: Box<dyn ValueController>,
    /// Subscriptions on collaborators.
    subs: Subscriptions,
}

impl BindingController {
    /// The body of an input blade.
    pub fn input<T: Clone + 'static>(
        label: Option<String>,
        tag: Option<String>,
        value: Rc<InputBindingValue<T>>,
        controller: Box<dyn ValueController>,
    ) -> Self {
        Self {
            label: LabelProps::new(label),
            tag: RefCell::new(tag),
            target: value.binding().target.clone(),
            readonly: false,
            value,
            controller,
            subs: Subscriptions::new(),
        }
    }

    /// The body of a monitor blade. The ticker is suppressed while the
    /// blade is globally disabled.
    pub fn monitor<T: Clone + 'static>(
        label: Option<String>,
        tag: Option<String>,
        value: Rc<MonitorBindingValue<T>>,
        controller: Box<dyn ValueController>,
        view_props: &ViewProps,
    ) -> Self {
        let subs = Subscriptions::new();
        let ticker = value.ticker().clone();
        ticker.set_disabled(view_props.is_globally_disabled());
        subs.push(
            view_props
                .global_disabled()
                .emitter()
                .on(ValueEventName::Change, move |ev| {
                    if let ValueEvent::Change(c) = ev {
                        ticker.set_disabled(c.raw_value);
                    }
                }),
        );
        Self {
            label: LabelProps::new(label),
            tag: RefCell::new(tag),
            target: value.binding().target.clone(),
            readonly: true,
            value,
            controller,
            subs,
        }
    }

    /// Label state.
    pub fn label(&self) -> &LabelProps {
        &self.label
    }

    /// The host tag.
    pub fn tag(&self) -> Option<String> {
        self.tag.borrow().clone()
    }

    /// Replace the host tag.
    pub fn set_tag(&self, tag: Option<String>) {
        *self.tag.borrow_mut() = tag;
    }

    /// The bound property.
    pub fn target(&self) -> &BindingTarget {
        &self.target
    }

    /// True for monitors.
    pub fn is_readonly(&self) -> bool {
        self.readonly
    }

    /// The bound value.
    pub fn bound_value(&self) -> &Rc<dyn BoundValue> {
        &self.value
    }

    /// The bound value of an input with element type `T`.
    pub fn input_value<T: Clone + 'static>(&self) -> Option<&InputBindingValue<T>> {
        self.value.as_any().downcast_ref()
    }

    /// The bound value of a monitor with element type `T`.
    pub fn monitor_value<T: Clone + 'static>(&self) -> Option<&MonitorBindingValue<T>> {
        self.value.as_any().downcast_ref()
    }

    /// The plugin-built controller.
    pub fn controller(&self) -> &dyn ValueController {
        self.controller.as_ref()
    }

    /// The plugin-built controller as a concrete type.
    pub fn controller_as<C: ValueController>(&self) -> Option<&C> {
        self.controller.as_any().downcast_ref()
    }
}

impl BladeBody for BindingController {
    fn validate_state(&self, state: &BladeState) -> StdResult<(), ParseError> {
        LabelProps::validate_state(state)?;
        if self.readonly {
            parse_record::<MonitorState>(state)?;
        } else {
            parse_record::<InputState>(state)?;
        }
        self.controller.validate_props(state)
    }

    fn check_import(&self) -> Result<()> {
        if !self.readonly && !self.target.is_alive() {
            return Err(Error::NotBindable);
        }
        Ok(())
    }

    fn apply_state(&self, state: &BladeState) -> Result<()> {
        self.label.import_state(state)?;
        self.controller.import_props(state)?;
        if self.readonly {
            let s: MonitorState = parse_record(state)?;
            if s.tag.is_some() {
                self.set_tag(s.tag);
            }
            return Ok(());
        }
        let s: InputState = parse_record(state)?;
        if s.tag.is_some() {
            self.set_tag(s.tag);
        }
        self.value.import_value(s.binding.value)
    }

    fn export_state(&self) -> BladeState {
        let value = self.target.read().unwrap_or_else(|e| {
            warn!(key = self.target.key(), error = %e, "export read failed");
            JsonValue::Null
        });
        let mut binding = json!({"key": self.target.key(), "value": value});
        if self.readonly {
            binding["readonly"] = JsonValue::Bool(true);
        }
        let mut own = BladeState::new();
        own.insert("binding".into(), binding);
        if let Some(tag) = self.tag() {
            own.insert("tag".into(), JsonValue::String(tag));
        }
        merge_state([self.label.export_state(), own, self.controller.export_props()])
    }

    fn on_value_change(&self, handler: ValueChangeHandler) -> Option<Subscription> {
        Some(self.value.on_change(handler))
    }

    fn change_value(&self) -> Option<(Option<&str>, Result<JsonValue>)> {
        Some((Some(self.target.key()), self.target.read()))
    }

    fn refresh(&self) {
        if let Err(e) = self.value.fetch() {
            warn!(key = self.target.key(), error = %e, "refresh failed");
        }
    }

    fn dispose(&self) {
        self.controller.dispose();
        self.value.dispose();
        self.subs.release_all();
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::{
        binding::{BindableRef, ReadWriteBinding, ReadonlyBinding, bindable, write_primitive},
        blade::{Blade, BladeController},
        state::record,
        ticker::{ManualTicker, Ticker},
        value::ComplexValue,
    };

    /// A controller with no props.
    struct Bare;

    impl ValueController for Bare {
        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    /// An input over `obj.x`.
    fn input(obj: &BindableRef) -> Rc<BladeController> {
        let binding = ReadWriteBinding::new(
            BindingTarget::new(obj, "x").unwrap(),
            Rc::new(|v: &JsonValue| v.as_f64().unwrap_or(0.0)),
            Rc::new(write_primitive::<f64>),
        );
        let value = Rc::new(ComplexValue::new(binding.read().unwrap()));
        let bv = InputBindingValue::new(value, binding);
        let body = BindingController::input(Some("x".into()), None, bv, Box::new(Bare));
        BladeController::new(Blade::create(), ViewProps::default(), body)
    }

    #[test]
    fn export_and_import() {
        let obj: BindableRef = bindable(json!({"x": 1.0}));
        let bc = input(&obj);
        let s = bc.export_state().unwrap();
        assert_eq!(
            JsonValue::Object(s.clone()),
            json!({
                "disabled": false,
                "hidden": false,
                "label": "x",
                "binding": {"key": "x", "value": 1.0},
            })
        );
        obj.borrow_mut().write_property("x", json!(4.0)).unwrap();
        bc.refresh().unwrap();
        bc.import_state(&s).unwrap();
        let body = bc.body_as::<BindingController>().unwrap();
        assert_eq!(body.input_value::<f64>().unwrap().raw_value(), 1.0);
        assert_eq!(obj.borrow().read_property("x"), Some(json!(1.0)));
    }

    #[test]
    fn input_import_requires_value() {
        let obj: BindableRef = bindable(json!({"x": 1.0}));
        let bc = input(&obj);
        let err = bc
            .import_state(&record(json!({"binding": {"key": "x"}, "tag": "t"})))
            .unwrap_err();
        assert_eq!(err, Error::invalid_params("value"));
        let body = bc.body_as::<BindingController>().unwrap();
        assert_eq!(body.tag(), None);
    }

    #[test]
    fn import_into_dropped_object_changes_nothing() {
        let obj: BindableRef = bindable(json!({"x": 1.0}));
        let bc = input(&obj);
        let mut s = bc.export_state().unwrap();
        s.insert("label".into(), json!("why"));
        s.insert("disabled".into(), json!(true));
        s.insert("tag".into(), json!("t"));
        drop(obj);
        assert_eq!(bc.import_state(&s), Err(Error::NotBindable));
        let body = bc.body_as::<BindingController>().unwrap();
        assert_eq!(body.label().label.raw_value().as_deref(), Some("x"));
        assert_eq!(body.tag(), None);
        assert!(!bc.view_props().disabled());
    }

    #[test]
    fn monitor_ticker_follows_global_disabled() {
        let obj: BindableRef = bindable(json!({"n": 1}));
        let ticker = Rc::new(ManualTicker::new());
        let mv = MonitorBindingValue::new(
            ReadonlyBinding::new(
                BindingTarget::new(&obj, "n").unwrap(),
                Rc::new(|v: &JsonValue| v.as_i64().unwrap_or(0)),
            ),
            ticker.clone(),
            1,
        );
        let parent = ViewProps::default();
        let vp = ViewProps::default();
        vp.set_parent(Some(parent.clone()));
        let body = BindingController::monitor(None, None, mv, Box::new(Bare), &vp);
        parent.set_disabled(true);
        assert!(ticker.disabled());
        parent.set_disabled(false);
        assert!(!ticker.disabled());
        let s = body.export_state();
        assert_eq!(s["binding"], json!({"key": "n", "value": 1, "readonly": true}));
    }
}
