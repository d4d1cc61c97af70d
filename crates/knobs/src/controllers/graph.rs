use std::{any::Any, cell::Cell, rc::Rc};

use crate::{
    binding_value::Buffer,
    value::{ComplexValue, Value},
};

use super::ValueController;

crate::value_map! {
    /// Vertical range of a graph.
    pub struct GraphProps: GraphKey {
        /// Bottom of the plot.
        min => Min: f64,
        /// Top of the plot.
        max => Max: f64,
    }
}

/// Plots the sample history of a number monitor.
pub struct GraphController {
    /// The history.
    value: Rc<ComplexValue<Buffer<f64>>>,
    /// Vertical range.
    props: GraphProps,
    /// Hovered slot.
    cursor: Cell<Option<usize>>,
}

impl GraphController {
    /// Construct a controller plotting over `[min, max]`.
    pub fn new(value: Rc<ComplexValue<Buffer<f64>>>, min: f64, max: f64) -> Self {
        Self {
            value,
            props: GraphProps::new(min, max),
            cursor: Cell::new(None),
        }
    }

    /// The history.
    pub fn value(&self) -> &Rc<ComplexValue<Buffer<f64>>> {
        &self.value
    }

    /// Vertical range.
    pub fn props(&self) -> &GraphProps {
        &self.props
    }

    /// Each slot mapped into `[0, 1]` of the vertical range. Values outside
    /// the range are clamped; unfilled slots stay `None`.
    pub fn points(&self) -> Vec<Option<f64>> {
        let (min, max) = (self.props.min.raw_value(), self.props.max.raw_value());
        let span = max - min;
        self.value
            .raw_value()
            .iter()
            .map(|v| {
                v.map(|v| {
                    if span > 0.0 {
                        ((v - min) / span).clamp(0.0, 1.0)
                    } else {
                        0.0
                    }
                })
            })
            .collect()
    }

    /// The smallest and largest filled samples.
    pub fn sample_range(&self) -> Option<(f64, f64)> {
        self.value.raw_value().iter().flatten().fold(None, |acc, &v| {
            Some(match acc {
                None => (v, v),
                Some((lo, hi)) => (f64::min(lo, v), f64::max(hi, v)),
            })
        })
    }

    /// The hovered slot.
    pub fn cursor(&self) -> Option<usize> {
        self.cursor.get()
    }

    /// Hover a slot. Out-of-range slots clear the cursor.
    pub fn set_cursor(&self, index: Option<usize>) {
        let len = self.value.with_raw(Vec::len);
        self.cursor.set(index.filter(|i| *i < len));
    }

    /// The sample under the cursor.
    pub fn cursor_value(&self) -> Option<f64> {
        let i = self.cursor.get()?;
        self.value.with_raw(|b| b.get(i).copied().flatten())
    }
}

impl ValueController for GraphController {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn points_and_cursor() {
        let value = Rc::new(ComplexValue::new(vec![Some(0.0), Some(50.0), Some(150.0), None]));
        let g = GraphController::new(value, 0.0, 100.0);
        assert_eq!(g.points(), vec![Some(0.0), Some(0.5), Some(1.0), None]);
        assert_eq!(g.sample_range(), Some((0.0, 150.0)));
        g.set_cursor(Some(1));
        assert_eq!(g.cursor_value(), Some(50.0));
        g.set_cursor(Some(9));
        assert_eq!(g.cursor(), None);
    }
}
