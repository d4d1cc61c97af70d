use std::{
    any::Any,
    rc::{Rc, Weak},
};

use crate::{
    constraint::{Constraint, ListConstraint, ListItem, find_constraint},
    emitter::Subscription,
    value::{ComplexValue, Value, ValueEventName, ValueRef},
    view_props::ViewProps,
};

use super::ValueController;

/// Shared, editable choices.
pub type ListOptionsRef<T> = Rc<ComplexValue<Vec<ListItem<T>>>>;

/// The choices of the list constraint inside `constraint`, so that option
/// edits also reshape writes. Fresh choices from `items` when there is no
/// list constraint.
pub fn list_options<T: Clone + PartialEq + 'static>(
    constraint: Option<&dyn Constraint<T>>,
    items: &[ListItem<T>],
) -> ListOptionsRef<T> {
    match constraint.and_then(find_constraint::<ListConstraint<T>, T>) {
        Some(list) => list.options().clone(),
        None => Rc::new(ComplexValue::new(items.to_vec())),
    }
}

/// Picks a value from a list of options.
pub struct ListController<T> {
    /// The edited value.
    value: ValueRef<T>,
    /// The choices, in display order.
    options: ListOptionsRef<T>,
    /// View state.
    view_props: ViewProps,
    /// Re-applies the value's constraint when the choices change.
    _sub: Subscription,
}

impl<T: Clone + PartialEq + 'static> ListController<T> {
    /// Construct a controller.
    pub fn new(value: ValueRef<T>, options: ListOptionsRef<T>, view_props: ViewProps) -> Self {
        // Weak: the value's constraint may hold the options.
        let target: Weak<_> = Rc::downgrade(&value);
        let sub = options.emitter().on(ValueEventName::Change, move |_| {
            if let Some(target) = target.upgrade() {
                target.set(target.raw_value());
            }
        });
        Self {
            value,
            options,
            view_props,
            _sub: sub,
        }
    }

    /// The edited value.
    pub fn value(&self) -> &ValueRef<T> {
        &self.value
    }

    /// The choices.
    pub fn options(&self) -> &ListOptionsRef<T> {
        &self.options
    }

    /// Index of the option matching the current value.
    pub fn selected_index(&self) -> Option<usize> {
        let v = self.value.raw_value();
        self.options
            .with_raw(|options| options.iter().position(|o| o.value == v))
    }

    /// Select an option by index. Returns false for an out-of-range index
    /// or a disabled blade.
    pub fn select_index(&self, index: usize) -> bool {
        if self.view_props.is_globally_disabled() {
            return false;
        }
        let chosen = self
            .options
            .with_raw(|options| options.get(index).map(|o| o.value.clone()));
        match chosen {
            Some(v) => {
                self.value.set(v);
                true
            }
            None => false,
        }
    }
}

impl<T: Clone + PartialEq + 'static> ValueController for ListController<T> {
    fn as_any(&self) -> &dyn Any {
        self
    }
}
