//! Blades that own a value instead of binding one.
//!
//! A [`ValueBladeBody`] pairs a label with a plain value and the value
//! controller editing it. The value is exported as `value`, next to the
//! label and any controller props.

use std::{any::Any, rc::Rc, result::Result as StdResult};

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value as JsonValue;
use tracing::warn;

use super::{ValueController, label::LabelProps};
use crate::{
    blade::{BladeBody, ValueChangeHandler},
    emitter::Subscription,
    error::{Error, ParseError, Result},
    state::{BladeState, merge_state, parse_record},
    value::{ComplexValue, Value, ValueEvent, ValueEventName},
};

/// Value fields accepted on import.
#[derive(Debug, Deserialize)]
#[serde(bound = "T: DeserializeOwned")]
struct ValueState<T> {
    /// The value.
    value: T,
}

/// The body of a list, slider or text blade.
pub struct ValueBladeBody<T> {
    /// Label state.
    label: LabelProps,
    /// The owned value.
    value: Rc<ComplexValue<T>>,
    /// The controller editing the value.
    controller: Box<dyn ValueController>,
}

impl<T> ValueBladeBody<T>
where
    T: Clone + PartialEq + Serialize + DeserializeOwned + 'static,
{
    /// Construct a body. `controller` must edit `value`.
    pub fn new(
        label: Option<String>,
        value: Rc<ComplexValue<T>>,
        controller: Box<dyn ValueController>,
    ) -> Self {
        Self {
            label: LabelProps::new(label),
            value,
            controller,
        }
    }

    /// Label state.
    pub fn label(&self) -> &LabelProps {
        &self.label
    }

    /// The owned value.
    pub fn value(&self) -> &Rc<ComplexValue<T>> {
        &self.value
    }

    /// The controller editing the value.
    pub fn controller(&self) -> &dyn ValueController {
        self.controller.as_ref()
    }

    /// The controller as a concrete type.
    pub fn controller_as<C: ValueController>(&self) -> Option<&C> {
        self.controller.as_any().downcast_ref()
    }

    /// The value as JSON.
    fn value_json(&self) -> Result<JsonValue> {
        serde_json::to_value(self.value.raw_value()).map_err(|_| Error::ShouldNeverHappen)
    }
}

impl<T> BladeBody for ValueBladeBody<T>
where
    T: Clone + PartialEq + Serialize + DeserializeOwned + 'static,
{
    fn validate_state(&self, state: &BladeState) -> StdResult<(), ParseError> {
        LabelProps::validate_state(state)?;
        parse_record::<ValueState<T>>(state)?;
        self.controller.validate_props(state)
    }

    fn apply_state(&self, state: &BladeState) -> Result<()> {
        self.label.import_state(state)?;
        self.controller.import_props(state)?;
        let s: ValueState<T> = parse_record(state)?;
        self.value.set(s.value);
        Ok(())
    }

    fn export_state(&self) -> BladeState {
        let value = self.value_json().unwrap_or_else(|e| {
            warn!(error = %e, "value export failed");
            JsonValue::Null
        });
        let mut own = BladeState::new();
        own.insert("value".into(), value);
        merge_state([self.label.export_state(), own, self.controller.export_props()])
    }

    fn on_value_change(&self, handler: ValueChangeHandler) -> Option<Subscription> {
        Some(self.value.emitter().on(ValueEventName::Change, move |ev| {
            if let ValueEvent::Change(c) = ev {
                handler(c.options, false);
            }
        }))
    }

    fn change_value(&self) -> Option<(Option<&str>, Result<JsonValue>)> {
        Some((None, self.value_json()))
    }

    fn dispose(&self) {
        self.controller.dispose();
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use serde_json::json;

    use super::*;
    use crate::{
        blade::{Blade, BladeController},
        constraint::DefiniteRangeConstraint,
        controllers::{SliderController, SliderProps},
        state::record,
        value::{ValueConfig, create_value},
        view_props::ViewProps,
    };

    /// A slider blade over `[0, 10]` holding `value`.
    fn slider_blade(value: f64) -> ValueBladeBody<f64> {
        let range = Rc::new(DefiniteRangeConstraint::new(0.0, 10.0));
        let props = SliderProps::from_values(range.min().clone(), range.max().clone());
        let value = create_value(
            value,
            ValueConfig {
                constraint: Some(range),
                equals: None,
            },
        );
        let controller = SliderController::new(value.clone(), props, 1, ViewProps::default());
        ValueBladeBody::new(Some("speed".into()), value, Box::new(controller))
    }

    #[test]
    fn exports_label_value_and_props() {
        let b = slider_blade(4.0);
        assert_eq!(
            b.export_state(),
            record(json!({"label": "speed", "value": 4.0, "min": 0.0, "max": 10.0}))
        );
        assert_eq!(b.change_value(), Some((None, Ok(json!(4.0)))));
    }

    #[test]
    fn import_applies_props_before_the_value() {
        let b = slider_blade(4.0);
        assert!(b.validate_state(&record(json!({"label": "x"}))).is_err());
        assert!(b.validate_state(&record(json!({"value": "fast"}))).is_err());
        b.apply_state(&record(json!({"value": 15.0, "max": 20.0})))
            .unwrap();
        assert_eq!(b.value().raw_value(), 15.0);
        assert_eq!(b.label().label.raw_value().as_deref(), Some("speed"));
    }

    #[test]
    fn changes_reach_the_tree() {
        let bc = BladeController::new(Blade::create(), ViewProps::default(), slider_blade(1.0));
        let seen = Rc::new(RefCell::new(vec![]));
        let s = seen.clone();
        let _sub = bc.body().on_value_change(Rc::new(move |options, internal| {
            s.borrow_mut().push((options.last, internal));
        }));
        let body = bc.body_as::<ValueBladeBody<f64>>().unwrap();
        let slider = body.controller_as::<SliderController>().unwrap();
        slider.set_ratio(0.5, false);
        assert_eq!(body.value().raw_value(), 5.0);
        assert_eq!(*seen.borrow(), vec![(false, false)]);
    }
}
