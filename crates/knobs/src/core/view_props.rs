//! Per-node disabled/hidden/parent state with a cascading global disabled
//! flag.

use std::{
    cell::RefCell,
    fmt,
    rc::{Rc, Weak},
};

use serde::Deserialize;
use serde_json::Value as JsonValue;

use super::{
    emitter::{Subscription, Subscriptions},
    error::ParseError,
    state::{BladeState, parse_record},
    value::{
        ComplexValue, RawValueSetter, ReadonlyValue, Value, ValueChangeOptions, ValueEvent,
        ValueEventName, create_readonly_value,
    },
};

crate::value_map! {
    /// The own view state of a node.
    pub struct ViewPropsMap: ViewPropsKey {
        /// Own disabled flag.
        disabled => Disabled: bool,
        /// Set once the owning controller is disposed.
        disposed => Disposed: bool,
        /// Own hidden flag. Not cascaded.
        hidden => Hidden: bool,
        /// The parent node's props.
        parent => Parent: Option<ViewProps>,
    }
}

/// Shared state behind a [`ViewProps`] handle.
struct Inner {
    /// Own state.
    map: ViewPropsMap,
    /// Own disabled OR the parent's global disabled.
    global_disabled: ReadonlyValue<bool>,
    /// Write half of `global_disabled`.
    set_global_disabled: RawValueSetter<bool>,
    /// Subscription on the current parent's global disabled value.
    parent_sub: RefCell<Option<Subscription>>,
    /// Subscriptions on own values.
    #[allow(dead_code)]
    subs: Subscriptions,
}

/// A handle to a node's view state. Clones share state; equality is
/// identity.
#[derive(Clone)]
pub struct ViewProps {
    /// Shared state.
    inner: Rc<Inner>,
}

impl PartialEq for ViewProps {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for ViewProps {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewProps")
            .field("disabled", &self.disabled())
            .field("global_disabled", &self.is_globally_disabled())
            .field("hidden", &self.hidden())
            .field("disposed", &self.disposed())
            .field("has_parent", &self.parent().is_some())
            .finish()
    }
}

impl Default for ViewProps {
    fn default() -> Self {
        Self::create(false, false)
    }
}

/// Optional view state fields accepted on import.
#[derive(Debug, Deserialize)]
struct ViewPropsState {
    /// Own disabled flag.
    disabled: Option<bool>,
    /// Own hidden flag.
    hidden: Option<bool>,
}

impl ViewProps {
    /// Construct detached props.
    pub fn create(disabled: bool, hidden: bool) -> Self {
        let inner = Rc::new_cyclic(|weak: &Weak<Inner>| {
            let map = ViewPropsMap::new(disabled, false, hidden, None);
            let (global_disabled, set_global_disabled) =
                create_readonly_value(Rc::new(ComplexValue::new(disabled)));
            let subs = Subscriptions::new();
            let w = weak.clone();
            subs.push(map.disabled.emitter().on(ValueEventName::Change, move |_| {
                if let Some(me) = w.upgrade() {
                    me.update_global_disabled();
                }
            }));
            let w = weak.clone();
            subs.push(map.parent.emitter().on(ValueEventName::Change, move |_| {
                if let Some(me) = w.upgrade() {
                    me.on_parent_change(&w);
                }
            }));
            Inner {
                map,
                global_disabled,
                set_global_disabled,
                parent_sub: RefCell::new(None),
                subs,
            }
        });
        Self { inner }
    }

    /// The underlying value map.
    pub fn map(&self) -> &ViewPropsMap {
        &self.inner.map
    }

    /// Own disabled flag.
    pub fn disabled(&self) -> bool {
        self.inner.map.disabled.raw_value()
    }

    /// Set the own disabled flag.
    pub fn set_disabled(&self, disabled: bool) {
        self.inner.map.disabled.set(disabled);
    }

    /// Own hidden flag.
    pub fn hidden(&self) -> bool {
        self.inner.map.hidden.raw_value()
    }

    /// Set the own hidden flag.
    pub fn set_hidden(&self, hidden: bool) {
        self.inner.map.hidden.set(hidden);
    }

    /// True once the owning controller was disposed.
    pub fn disposed(&self) -> bool {
        self.inner.map.disposed.raw_value()
    }

    /// Mark the owner disposed. Disposal is terminal.
    pub fn set_disposed(&self) {
        self.inner.map.disposed.set(true);
    }

    /// The parent node's props.
    pub fn parent(&self) -> Option<Self> {
        self.inner.map.parent.raw_value()
    }

    /// Reparent. The old parent's cascade subscription is swapped for the
    /// new one within this call.
    pub fn set_parent(&self, parent: Option<Self>) {
        self.inner.map.parent.set(parent);
    }

    /// The cascaded disabled value.
    pub fn global_disabled(&self) -> &ReadonlyValue<bool> {
        &self.inner.global_disabled
    }

    /// Own disabled OR any ancestor disabled.
    pub fn is_globally_disabled(&self) -> bool {
        self.inner.global_disabled.raw_value()
    }

    /// Run `f` once when the owner is disposed.
    pub fn handle_dispose(&self, f: impl Fn() + 'static) -> Subscription {
        self.inner
            .map
            .disposed
            .emitter()
            .on(ValueEventName::Change, move |ev| {
                if let ValueEvent::Change(c) = ev
                    && c.raw_value
                {
                    f();
                }
            })
    }

    /// Export the disabled and hidden flags. Both are always present.
    pub fn export_state(&self) -> BladeState {
        let mut s = BladeState::new();
        s.insert("disabled".into(), JsonValue::Bool(self.disabled()));
        s.insert("hidden".into(), JsonValue::Bool(self.hidden()));
        s
    }

    /// Check an imported record without applying it.
    pub fn validate_state(state: &BladeState) -> Result<(), ParseError> {
        parse_record::<ViewPropsState>(state).map(|_| ())
    }

    /// Apply the flags present in a record. Absent flags are left alone.
    pub fn import_state(&self, state: &BladeState) -> Result<(), ParseError> {
        let s: ViewPropsState = parse_record(state)?;
        if let Some(d) = s.disabled {
            self.set_disabled(d);
        }
        if let Some(h) = s.hidden {
            self.set_hidden(h);
        }
        Ok(())
    }
}

impl Inner {
    /// Recompute the cascaded flag.
    fn update_global_disabled(&self) {
        let parent = self
            .map
            .parent
            .with_raw(|p| p.as_ref().is_some_and(ViewProps::is_globally_disabled));
        let global = self.map.disabled.raw_value() || parent;
        self.set_global_disabled
            .set(global, ValueChangeOptions::default());
    }

    /// Swap the parent subscription and recompute.
    fn on_parent_change(&self, weak: &Weak<Self>) {
        let sub = self.map.parent.with_raw(|p| {
            p.as_ref().map(|p| {
                let w = weak.clone();
                p.global_disabled()
                    .emitter()
                    .on(ValueEventName::Change, move |_| {
                        if let Some(me) = w.upgrade() {
                            me.update_global_disabled();
                        }
                    })
            })
        });
        let old = self.parent_sub.replace(sub);
        drop(old);
        self.update_global_disabled();
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use serde_json::json;

    use super::*;
    use crate::core::state::record;

    #[test]
    fn cascade() {
        let root = ViewProps::create(false, false);
        let child = ViewProps::create(false, false);
        child.set_parent(Some(root.clone()));
        assert!(!child.is_globally_disabled());
        root.set_disabled(true);
        assert!(child.is_globally_disabled());
        assert!(!child.disabled());
        root.set_disabled(false);
        assert!(!child.is_globally_disabled());
    }

    #[test]
    fn cascade_three_levels() {
        let a = ViewProps::default();
        let b = ViewProps::default();
        let c = ViewProps::default();
        b.set_parent(Some(a.clone()));
        c.set_parent(Some(b.clone()));
        a.set_disabled(true);
        assert!(c.is_globally_disabled());
        a.set_disabled(false);
        c.set_disabled(true);
        assert!(c.is_globally_disabled());
        assert!(!b.is_globally_disabled());
    }

    #[test]
    fn reparent_swaps_subscription() {
        let p1 = ViewProps::create(true, false);
        let p2 = ViewProps::create(false, false);
        let child = ViewProps::default();
        child.set_parent(Some(p1.clone()));
        assert!(child.is_globally_disabled());
        child.set_parent(Some(p2.clone()));
        assert!(!child.is_globally_disabled());
        assert_eq!(
            p1.global_disabled()
                .emitter()
                .listener_count(ValueEventName::Change),
            0
        );
        p1.set_disabled(false);
        p1.set_disabled(true);
        assert!(!child.is_globally_disabled());
        p2.set_disabled(true);
        assert!(child.is_globally_disabled());
        child.set_parent(None);
        assert!(!child.is_globally_disabled());
    }

    #[test]
    fn hidden_is_not_cascaded() {
        let root = ViewProps::create(false, true);
        let child = ViewProps::default();
        child.set_parent(Some(root.clone()));
        assert!(!child.hidden());
    }

    #[test]
    fn dispose_handler() {
        let vp = ViewProps::default();
        let n = Rc::new(Cell::new(0));
        let c = n.clone();
        let _sub = vp.handle_dispose(move || c.set(c.get() + 1));
        vp.set_disposed();
        vp.set_disposed();
        assert_eq!(n.get(), 1);
        assert!(vp.disposed());
    }

    #[test]
    fn state_round_trip() {
        let vp = ViewProps::create(true, false);
        let s = vp.export_state();
        assert_eq!(JsonValue::Object(s.clone()), json!({"disabled": true, "hidden": false}));
        let other = ViewProps::default();
        other.import_state(&s).unwrap();
        assert!(other.disabled());
        other.import_state(&record(json!({}))).unwrap();
        assert!(other.disabled());
        assert!(other.import_state(&record(json!({"hidden": 1}))).is_err());
    }
}
