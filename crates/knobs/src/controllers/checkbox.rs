use std::any::Any;

use crate::{
    value::{Value, ValueRef},
    view_props::ViewProps,
};

use super::ValueController;

/// Edits a boolean value.
pub struct CheckboxController {
    /// The edited value.
    value: ValueRef<bool>,
    /// View state.
    view_props: ViewProps,
}

impl CheckboxController {
    /// Construct a controller.
    pub fn new(value: ValueRef<bool>, view_props: ViewProps) -> Self {
        Self { value, view_props }
    }

    /// The edited value.
    pub fn value(&self) -> &ValueRef<bool> {
        &self.value
    }

    /// The current state.
    pub fn checked(&self) -> bool {
        self.value.raw_value()
    }

    /// Flip the state. Returns false if the blade is disabled.
    pub fn toggle(&self) -> bool {
        if self.view_props.is_globally_disabled() {
            return false;
        }
        self.value.set(!self.value.raw_value());
        true
    }
}

impl ValueController for CheckboxController {
    fn as_any(&self) -> &dyn Any {
        self
    }
}
