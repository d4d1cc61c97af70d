use std::{any::Any, rc::Rc};

use crate::{
    binding_value::Buffer,
    value::{ComplexValue, Value},
};

use super::{ValueController, text::Formatter};

/// Displays the sample history of a monitor as text.
pub struct LogController<T> {
    /// The history.
    value: Rc<ComplexValue<Buffer<T>>>,
    /// Sample to text.
    formatter: Formatter<T>,
    /// Visible rows when multiline.
    rows: Option<usize>,
}

impl<T: Clone + 'static> LogController<T> {
    /// A controller showing only the latest sample.
    pub fn single(value: Rc<ComplexValue<Buffer<T>>>, formatter: Formatter<T>) -> Self {
        Self {
            value,
            formatter,
            rows: None,
        }
    }

    /// A controller showing the history over `rows` rows.
    pub fn multiline(value: Rc<ComplexValue<Buffer<T>>>, formatter: Formatter<T>, rows: usize) -> Self {
        Self {
            value,
            formatter,
            rows: Some(rows),
        }
    }

    /// The history.
    pub fn value(&self) -> &Rc<ComplexValue<Buffer<T>>> {
        &self.value
    }

    /// Visible rows when multiline.
    pub fn rows(&self) -> Option<usize> {
        self.rows
    }

    /// Filled samples as text, oldest first.
    pub fn lines(&self) -> Vec<String> {
        self.value
            .raw_value()
            .iter()
            .flatten()
            .map(|v| (self.formatter)(v))
            .collect()
    }

    /// The text shown: the latest sample, or every line when multiline.
    pub fn text(&self) -> String {
        let lines = self.lines();
        if self.rows.is_some() {
            lines.join("\n")
        } else {
            lines.last().cloned().unwrap_or_default()
        }
    }
}

impl<T: Clone + 'static> ValueController for LogController<T> {
    fn as_any(&self) -> &dyn Any {
        self
    }
}
