//! Per-axis editing of a point value.

use std::{any::Any, rc::Rc};

use crate::{
    constraint::{ConstraintRef, PointNdConstraint},
    emitter::Subscriptions,
    value::{ComplexValue, Value, ValueRef, connect_values},
    view_props::ViewProps,
};

use super::ValueController;

/// Edits a point through one synchronized value per axis. Each axis value
/// applies that axis' constraint.
pub struct PointController {
    /// The edited point.
    value: ValueRef<Vec<f64>>,
    /// One value per axis.
    axes: Vec<Rc<ComplexValue<f64>>>,
    /// View state.
    view_props: ViewProps,
    /// Axis synchronization.
    subs: Subscriptions,
}

impl PointController {
    /// Construct a controller over a point with `dimensions` axes.
    pub fn new(
        value: ValueRef<Vec<f64>>,
        constraint: Option<&PointNdConstraint>,
        dimensions: usize,
        view_props: ViewProps,
    ) -> Self {
        let subs = Subscriptions::new();
        let point = value.raw_value();
        let axes: Vec<_> = (0..dimensions)
            .map(|i| {
                let c: Option<ConstraintRef<f64>> =
                    constraint.and_then(|c| c.components.get(i).cloned().flatten());
                let axis = Rc::new(ComplexValue::with_equality(
                    point.get(i).copied().unwrap_or_default(),
                    c,
                    Rc::new(|a: &f64, b: &f64| a == b),
                ));
                subs.absorb(connect_values(
                    value.clone(),
                    axis.clone() as ValueRef<f64>,
                    move |p: &Vec<f64>, _: &f64| p.get(i).copied().unwrap_or_default(),
                    move |p: &Vec<f64>, s: &f64| {
                        let mut next = p.clone();
                        if let Some(slot) = next.get_mut(i) {
                            *slot = *s;
                        }
                        next
                    },
                ));
                axis
            })
            .collect();
        Self {
            value,
            axes,
            view_props,
            subs,
        }
    }

    /// The edited point.
    pub fn value(&self) -> &ValueRef<Vec<f64>> {
        &self.value
    }

    /// The value of one axis.
    pub fn axis(&self, index: usize) -> Option<&Rc<ComplexValue<f64>>> {
        self.axes.get(index)
    }

    /// Number of axes.
    pub fn dimensions(&self) -> usize {
        self.axes.len()
    }

    /// Edit one axis. Returns false for an unknown axis or a disabled
    /// blade.
    pub fn set_component(&self, index: usize, v: f64) -> bool {
        if self.view_props.is_globally_disabled() {
            return false;
        }
        match self.axes.get(index) {
            Some(axis) => {
                axis.set(v);
                true
            }
            None => false,
        }
    }
}

impl ValueController for PointController {
    fn dispose(&self) {
        self.subs.release_all();
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraint::RangeConstraint;

    #[test]
    fn axes_follow_point() {
        let value: ValueRef<Vec<f64>> = Rc::new(ComplexValue::new(vec![1.0, 2.0]));
        let c = PointNdConstraint::new(vec![
            Some(Rc::new(RangeConstraint::new(Some(0.0), Some(10.0)))),
            None,
        ]);
        let p = PointController::new(value.clone(), Some(&c), 2, ViewProps::default());
        assert_eq!(p.axis(1).unwrap().raw_value(), 2.0);
        assert!(p.set_component(0, 20.0));
        assert_eq!(value.raw_value(), vec![10.0, 2.0]);
        value.set(vec![3.0, 4.0]);
        assert_eq!(p.axis(0).unwrap().raw_value(), 3.0);
        assert!(!p.set_component(2, 1.0));
    }
}
