//! Pure value-shaping constraints.
//!
//! A constraint never owns state beyond its parameters. Composites apply
//! their members left to right, each consuming the previous output, so the
//! last constraint in the list wins when two of them disagree.

use std::{any::Any, fmt, rc::Rc};

use serde::Deserialize;

use super::value::{ComplexValue, Value};

/// A stateless value transform.
pub trait Constraint<T>: Any {
    /// Shape a value.
    fn constrain(&self, value: T) -> T;

    /// Downcasting support for [`find_constraint`].
    fn as_any(&self) -> &dyn Any;
}

/// Shared constraint handle.
pub type ConstraintRef<T> = Rc<dyn Constraint<T>>;

/// An ordered chain of constraints.
pub struct CompositeConstraint<T> {
    /// Members, applied in order.
    pub constraints: Vec<ConstraintRef<T>>,
}

impl<T> fmt::Debug for CompositeConstraint<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositeConstraint")
            .field("len", &self.constraints.len())
            .finish()
    }
}

impl<T> CompositeConstraint<T> {
    /// Compose a chain.
    pub fn new(constraints: Vec<ConstraintRef<T>>) -> Self {
        Self { constraints }
    }
}

impl<T: 'static> Constraint<T> for CompositeConstraint<T> {
    fn constrain(&self, value: T) -> T {
        self.constraints
            .iter()
            .fold(value, |v, c| c.constrain(v))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Find the first constraint of type `C`, looking inside composites.
pub fn find_constraint<'a, C: 'static, T: 'static>(c: &'a dyn Constraint<T>) -> Option<&'a C> {
    if let Some(found) = c.as_any().downcast_ref::<C>() {
        return Some(found);
    }
    let composite = c.as_any().downcast_ref::<CompositeConstraint<T>>()?;
    composite
        .constraints
        .iter()
        .find_map(|c| find_constraint::<C, T>(c.as_ref()))
}

/// Clamp into an optionally bounded range.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RangeConstraint {
    /// Lower bound.
    pub min: Option<f64>,
    /// Upper bound.
    pub max: Option<f64>,
}

impl RangeConstraint {
    /// Construct a range. Either bound may be open.
    pub fn new(min: Option<f64>, max: Option<f64>) -> Self {
        Self { min, max }
    }
}

impl Constraint<f64> for RangeConstraint {
    fn constrain(&self, value: f64) -> f64 {
        let mut v = value;
        if let Some(min) = self.min {
            v = v.max(min);
        }
        if let Some(max) = self.max {
            v = v.min(max);
        }
        v
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Clamp into a range with both bounds present. Sliders require one.
///
/// The bounds are live values, so a slider editing its range moves the
/// clamp with it.
#[derive(Debug)]
pub struct DefiniteRangeConstraint {
    /// Lower bound.
    min: Rc<ComplexValue<f64>>,
    /// Upper bound.
    max: Rc<ComplexValue<f64>>,
}

impl DefiniteRangeConstraint {
    /// Construct a bounded range.
    pub fn new(min: f64, max: f64) -> Self {
        Self {
            min: Rc::new(ComplexValue::new(min)),
            max: Rc::new(ComplexValue::new(max)),
        }
    }

    /// Lower bound.
    pub fn min(&self) -> &Rc<ComplexValue<f64>> {
        &self.min
    }

    /// Upper bound.
    pub fn max(&self) -> &Rc<ComplexValue<f64>> {
        &self.max
    }
}

impl Constraint<f64> for DefiniteRangeConstraint {
    fn constrain(&self, value: f64) -> f64 {
        value.max(self.min.raw_value()).min(self.max.raw_value())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Snap to the nearest multiple of `step` offset by `origin`. Halves round
/// up.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepConstraint {
    /// Step size.
    pub step: f64,
    /// Snap origin.
    pub origin: f64,
}

impl StepConstraint {
    /// Construct a step constraint.
    pub fn new(step: f64, origin: f64) -> Self {
        Self { step, origin }
    }
}

impl Constraint<f64> for StepConstraint {
    fn constrain(&self, value: f64) -> f64 {
        if self.step == 0.0 || !self.step.is_finite() {
            return value;
        }
        let o = self.origin % self.step;
        let r = ((value - o) / self.step + 0.5).floor();
        o + r * self.step
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// A labelled choice.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ListItem<T> {
    /// Display text.
    pub text: String,
    /// Choice value.
    pub value: T,
}

/// Restrict to a set of choices. A value outside the set becomes the first
/// choice; an empty set lets every value through. The choices are a live
/// value, so editing them reshapes later writes.
#[derive(Debug, Clone)]
pub struct ListConstraint<T: Clone> {
    /// Allowed choices.
    options: Rc<ComplexValue<Vec<ListItem<T>>>>,
}

impl<T: Clone + PartialEq + 'static> ListConstraint<T> {
    /// Construct a list constraint.
    pub fn new(options: Vec<ListItem<T>>) -> Self {
        Self {
            options: Rc::new(ComplexValue::new(options)),
        }
    }

    /// Allowed choices.
    pub fn options(&self) -> &Rc<ComplexValue<Vec<ListItem<T>>>> {
        &self.options
    }
}

impl<T: PartialEq + Clone + 'static> Constraint<T> for ListConstraint<T> {
    fn constrain(&self, value: T) -> T {
        self.options.with_raw(|options| match options.first() {
            None => value,
            Some(_) if options.iter().any(|o| o.value == value) => value,
            Some(first) => first.value.clone(),
        })
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Per-axis constraints for an N-dimensional point.
pub struct PointNdConstraint {
    /// One optional constraint per axis.
    pub components: Vec<Option<ConstraintRef<f64>>>,
}

impl fmt::Debug for PointNdConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let axes: Vec<bool> = self.components.iter().map(Option::is_some).collect();
        f.debug_struct("PointNdConstraint")
            .field("axes", &axes)
            .finish()
    }
}

impl PointNdConstraint {
    /// Construct from per-axis constraints.
    pub fn new(components: Vec<Option<ConstraintRef<f64>>>) -> Self {
        Self { components }
    }
}

impl Constraint<Vec<f64>> for PointNdConstraint {
    fn constrain(&self, value: Vec<f64>) -> Vec<f64> {
        value
            .into_iter()
            .enumerate()
            .map(|(i, v)| match self.components.get(i) {
                Some(Some(c)) => c.constrain(v),
                _ => v,
            })
            .collect()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Numeric options from which a number constraint is assembled.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NumberConstraintParams {
    /// Step size.
    pub step: Option<f64>,
    /// Lower bound.
    pub min: Option<f64>,
    /// Upper bound.
    pub max: Option<f64>,
    /// Choices.
    pub options: Option<Vec<ListItem<f64>>>,
}

/// Assemble the constraint for a number binding. The order is fixed:
/// step, then range, then list. The range is applied after snapping, so a
/// snapped value never escapes the bounds.
pub fn create_number_constraint(
    params: &NumberConstraintParams,
    initial: f64,
) -> Option<ConstraintRef<f64>> {
    let mut chain: Vec<ConstraintRef<f64>> = vec![];
    if let Some(step) = params.step {
        chain.push(Rc::new(StepConstraint::new(step, initial)));
    }
    match (params.min, params.max) {
        (Some(min), Some(max)) => chain.push(Rc::new(DefiniteRangeConstraint::new(min, max))),
        (None, None) => {}
        (min, max) => chain.push(Rc::new(RangeConstraint::new(min, max))),
    }
    if let Some(options) = &params.options {
        chain.push(Rc::new(ListConstraint::new(options.clone())));
    }
    if chain.is_empty() {
        None
    } else {
        Some(Rc::new(CompositeConstraint::new(chain)))
    }
}

/// The bounds of a number constraint, when both are known.
pub fn definite_range(c: &dyn Constraint<f64>) -> Option<(f64, f64)> {
    if let Some(r) = find_constraint::<DefiniteRangeConstraint, f64>(c) {
        return Some((r.min.raw_value(), r.max.raw_value()));
    }
    let r = find_constraint::<RangeConstraint, f64>(c)?;
    Some((r.min?, r.max?))
}
