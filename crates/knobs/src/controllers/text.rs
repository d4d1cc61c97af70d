//! Free-text editing of a value through a parser and a formatter.

use std::{any::Any, rc::Rc};

use crate::{
    constraint::{Constraint, StepConstraint, find_constraint},
    value::{Value, ValueRef},
    view_props::ViewProps,
};

use super::ValueController;

/// Converts entered text into a value. `None` rejects the text.
pub type Parser<T> = Rc<dyn Fn(&str) -> Option<T>>;

/// Renders a value as text.
pub type Formatter<T> = Rc<dyn Fn(&T) -> String>;

/// Parse a finite number, ignoring surrounding whitespace.
pub fn parse_number(text: &str) -> Option<f64> {
    text.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Number of decimal digits in the shortest rendering of `v`.
pub fn decimal_digits(v: f64) -> usize {
    let s = v.to_string();
    s.split_once('.').map_or(0, |(_, frac)| frac.len())
}

/// Decimal digits suitable for displaying a number: those of the step when
/// there is one, otherwise those of the value with a floor of two.
pub fn suitable_decimal_digits(constraint: Option<&dyn Constraint<f64>>, raw: f64) -> usize {
    if let Some(sc) = constraint.and_then(find_constraint::<StepConstraint, f64>) {
        return decimal_digits(sc.step);
    }
    decimal_digits(raw).max(2)
}

/// A formatter rendering a fixed number of decimal digits.
pub fn number_formatter(digits: usize) -> Formatter<f64> {
    Rc::new(move |v: &f64| format!("{v:.digits$}"))
}

/// Edits a value as text.
pub struct TextController<T> {
    /// The edited value.
    value: ValueRef<T>,
    /// Text to value.
    parser: Parser<T>,
    /// Value to text.
    formatter: Formatter<T>,
    /// View state.
    view_props: ViewProps,
}

impl<T: Clone + 'static> TextController<T> {
    /// Construct a controller.
    pub fn new(
        value: ValueRef<T>,
        parser: Parser<T>,
        formatter: Formatter<T>,
        view_props: ViewProps,
    ) -> Self {
        Self {
            value,
            parser,
            formatter,
            view_props,
        }
    }

    /// The edited value.
    pub fn value(&self) -> &ValueRef<T> {
        &self.value
    }

    /// The current value as text.
    pub fn text(&self) -> String {
        (self.formatter)(&self.value.raw_value())
    }

    /// Commit entered text. Returns false if the text was rejected or the
    /// blade is disabled.
    pub fn input_text(&self, text: &str) -> bool {
        if self.view_props.is_globally_disabled() {
            return false;
        }
        match (self.parser)(text) {
            Some(v) => {
                self.value.set(v);
                true
            }
            None => false,
        }
    }
}

impl<T: Clone + 'static> ValueController for TextController<T> {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{constraint::ConstraintRef, value::ComplexValue};

    #[test]
    fn digits() {
        assert_eq!(decimal_digits(1.0), 0);
        assert_eq!(decimal_digits(0.25), 2);
        assert_eq!(suitable_decimal_digits(None, 3.0), 2);
        assert_eq!(suitable_decimal_digits(None, 0.125), 3);
        let step: ConstraintRef<f64> = Rc::new(StepConstraint::new(0.1, 0.0));
        assert_eq!(suitable_decimal_digits(Some(step.as_ref()), 0.125), 1);
    }

    #[test]
    fn input_text() {
        let value: ValueRef<f64> = Rc::new(ComplexValue::new(1.0));
        let vp = ViewProps::default();
        let c = TextController::new(value.clone(), Rc::new(parse_number), number_formatter(2), vp.clone());
        assert_eq!(c.text(), "1.00");
        assert!(c.input_text(" 2.5 "));
        assert_eq!(value.raw_value(), 2.5);
        assert!(!c.input_text("abc"));
        vp.set_disabled(true);
        assert!(!c.input_text("3"));
        assert_eq!(value.raw_value(), 2.5);
    }
}
