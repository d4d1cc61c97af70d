//! A slider paired with a number text field, for numbers with a definite
//! range.

use std::{
    any::Any,
    rc::{Rc, Weak},
    result::Result as StdResult,
};

use serde::Deserialize;
use serde_json::json;

use super::{
    ValueController,
    text::{TextController, number_formatter, parse_number},
};
use crate::{
    emitter::Subscription,
    error::{ParseError, Result},
    state::{BladeState, parse_record, record},
    value::{Value, ValueChangeOptions, ValueRef},
    value_map::ValueMapEventName,
    view_props::ViewProps,
};

crate::value_map! {
    /// Slider range.
    pub struct SliderProps: SliderKey {
        /// Value at the left end.
        min => Min: f64,
        /// Value at the right end.
        max => Max: f64,
    }
}

/// Slider fields accepted on import.
#[derive(Debug, Deserialize)]
struct SliderState {
    /// Value at the left end.
    min: Option<f64>,
    /// Value at the right end.
    max: Option<f64>,
}

/// Edits a number by position within a range.
pub struct SliderController {
    /// The edited value.
    value: ValueRef<f64>,
    /// Range.
    props: SliderProps,
    /// The paired text field.
    text: TextController<f64>,
    /// View state.
    view_props: ViewProps,
    /// Re-applies the value's constraint when the range moves.
    _sub: Subscription,
}

impl SliderController {
    /// Construct a controller over the range in `props`, rendering
    /// `digits` decimal digits in its text field. When `props` shares its
    /// values with the value's range constraint, a range edit re-clamps
    /// the value.
    pub fn new(value: ValueRef<f64>, props: SliderProps, digits: usize, view_props: ViewProps) -> Self {
        let text = TextController::new(
            value.clone(),
            Rc::new(parse_number),
            number_formatter(digits),
            view_props.clone(),
        );
        // Weak: the value's constraint may hold the range values.
        let target: Weak<_> = Rc::downgrade(&value);
        let sub = props.emitter().on(ValueMapEventName::Change, move |_| {
            if let Some(target) = target.upgrade() {
                target.set(target.raw_value());
            }
        });
        Self {
            value,
            props,
            text,
            view_props,
            _sub: sub,
        }
    }

    /// The edited value.
    pub fn value(&self) -> &ValueRef<f64> {
        &self.value
    }

    /// Range.
    pub fn props(&self) -> &SliderProps {
        &self.props
    }

    /// The paired text field.
    pub fn text(&self) -> &TextController<f64> {
        &self.text
    }

    /// Position of the value in the range, in `[0, 1]`.
    pub fn ratio(&self) -> f64 {
        let (min, max) = (self.props.min.raw_value(), self.props.max.raw_value());
        if max <= min {
            return 0.0;
        }
        ((self.value.raw_value() - min) / (max - min)).clamp(0.0, 1.0)
    }

    /// Move the slider. `last` is false while a drag is in progress.
    /// Returns false if the blade is disabled.
    pub fn set_ratio(&self, ratio: f64, last: bool) -> bool {
        if self.view_props.is_globally_disabled() {
            return false;
        }
        let (min, max) = (self.props.min.raw_value(), self.props.max.raw_value());
        let v = min + ratio.clamp(0.0, 1.0) * (max - min);
        let options = if last {
            ValueChangeOptions::default()
        } else {
            ValueChangeOptions::intermediate()
        };
        self.value.set_raw_value(v, options);
        true
    }
}

impl ValueController for SliderController {
    fn validate_props(&self, state: &BladeState) -> StdResult<(), ParseError> {
        parse_record::<SliderState>(state).map(|_| ())
    }

    fn import_props(&self, state: &BladeState) -> Result<()> {
        let s: SliderState = parse_record(state)?;
        if let Some(min) = s.min {
            self.props.min.set(min);
        }
        if let Some(max) = s.max {
            self.props.max.set(max);
        }
        Ok(())
    }

    fn export_props(&self) -> BladeState {
        record(json!({
            "min": self.props.min.raw_value(),
            "max": self.props.max.raw_value(),
        }))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
