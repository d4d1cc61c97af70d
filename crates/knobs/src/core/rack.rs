//! Ordered, event-propagating collections of sibling blades.
//!
//! A rack owns membership and render order of its children, never their
//! bound objects. Render order follows position tags: `veryfirst`, then
//! `first`, then untagged, then `last`, then `verylast`. Within a tier,
//! order is the raw insertion order.
//!
//! Value changes of any descendant bubble up as one `ValueChange` event per
//! ancestor rack. Structural events from nested racks bubble with
//! `root == false`.

use std::{
    cell::RefCell,
    fmt,
    rc::{Rc, Weak},
};

use serde_json::Value as JsonValue;
use tracing::debug;

use super::{
    blade::{BladeController, BladeRef, position_tier},
    emitter::{Emitter, Event, Subscriptions},
    error::Result,
    state::BladeState,
    value::{Value, ValueChangeOptions, ValueEventName},
    value_map::ValueMapEventName,
    view_props::{ViewProps, ViewPropsKey},
};

/// Events raised by a rack.
#[derive(Debug, Clone)]
pub enum RackEvent {
    /// A blade was inserted.
    Add {
        /// The inserted blade.
        blade: BladeRef,
        /// Its render index in the rack that owns it.
        index: usize,
        /// True if it was inserted into this rack rather than a descendant.
        root: bool,
    },
    /// A blade was removed.
    Remove {
        /// The removed blade.
        blade: BladeRef,
        /// True if it was removed from this rack rather than a descendant.
        root: bool,
    },
    /// The value of a descendant changed.
    ValueChange {
        /// The blade whose value changed.
        blade: BladeRef,
        /// Change options.
        options: ValueChangeOptions,
        /// True for UI-originated changes.
        internal: bool,
    },
    /// Render order changed.
    Layout,
}

/// Names of [`RackEvent`] variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RackEventName {
    /// See [`RackEvent::Add`].
    Add,
    /// See [`RackEvent::Remove`].
    Remove,
    /// See [`RackEvent::ValueChange`].
    ValueChange,
    /// See [`RackEvent::Layout`].
    Layout,
}

impl Event for RackEvent {
    type Name = RackEventName;

    fn name(&self) -> RackEventName {
        match self {
            Self::Add { .. } => RackEventName::Add,
            Self::Remove { .. } => RackEventName::Remove,
            Self::ValueChange { .. } => RackEventName::ValueChange,
            Self::Layout => RackEventName::Layout,
        }
    }
}

impl RackEvent {
    /// The same event as seen from an ancestor rack.
    fn bubbled(&self) -> Self {
        match self {
            Self::Add { blade, index, .. } => Self::Add {
                blade: blade.clone(),
                index: *index,
                root: false,
            },
            Self::Remove { blade, .. } => Self::Remove {
                blade: blade.clone(),
                root: false,
            },
            other => other.clone(),
        }
    }
}

/// A child and the listeners the rack attached to it.
struct Child {
    /// The child.
    blade: BladeRef,
    /// Listeners on the child, released on removal.
    subs: Subscriptions,
}

/// Shared rack state.
struct Inner {
    /// Children in render order.
    children: RefCell<Vec<Child>>,
    /// Rack events.
    emitter: Emitter<RackEvent>,
    /// View state of the owning container.
    view_props: ViewProps,
}

/// An ordered collection of blades. Cloning produces another handle to the
/// same rack.
#[derive(Clone)]
pub struct Rack {
    /// Shared state.
    inner: Rc<Inner>,
}

impl fmt::Debug for Rack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ids: Vec<_> = self.children().iter().map(|c| c.id()).collect();
        f.debug_struct("Rack").field("children", &ids).finish()
    }
}

/// A non-owning rack handle.
#[derive(Clone)]
pub struct WeakRack {
    /// Weak shared state.
    inner: Weak<Inner>,
}

impl WeakRack {
    /// Recover a strong handle if the rack is alive.
    pub fn upgrade(&self) -> Option<Rack> {
        self.inner.upgrade().map(|inner| Rack { inner })
    }
}

impl Rack {
    /// Construct an empty rack whose children cascade from `view_props`.
    pub fn new(view_props: ViewProps) -> Self {
        Self {
            inner: Rc::new(Inner {
                children: RefCell::new(vec![]),
                emitter: Emitter::new(),
                view_props,
            }),
        }
    }

    /// A weak handle.
    pub fn downgrade(&self) -> WeakRack {
        WeakRack {
            inner: Rc::downgrade(&self.inner),
        }
    }

    /// Rack events.
    pub fn emitter(&self) -> &Emitter<RackEvent> {
        &self.inner.emitter
    }

    /// View state of the owning container.
    pub fn view_props(&self) -> &ViewProps {
        &self.inner.view_props
    }

    /// Children in render order.
    pub fn children(&self) -> Vec<BladeRef> {
        self.inner
            .children
            .borrow()
            .iter()
            .map(|c| c.blade.clone())
            .collect()
    }

    /// Number of children.
    pub fn len(&self) -> usize {
        self.inner.children.borrow().len()
    }

    /// True if there are no children.
    pub fn is_empty(&self) -> bool {
        self.inner.children.borrow().is_empty()
    }

    /// Render index of a child.
    pub fn index_of(&self, blade: &BladeController) -> Option<usize> {
        self.inner
            .children
            .borrow()
            .iter()
            .position(|c| c.blade.id() == blade.id())
    }

    /// Insert a blade at a raw index (appended if absent or out of range),
    /// then re-derive render order from position tags. A blade attached
    /// elsewhere is detached first. Returns the render index.
    pub fn add(&self, blade: BladeRef, index: Option<usize>) -> usize {
        if let Some(old) = blade.parent() {
            old.remove(&blade);
        }
        let subs = self.listen(&blade);
        {
            let mut children = self.inner.children.borrow_mut();
            let at = index.map_or(children.len(), |i| i.min(children.len()));
            children.insert(
                at,
                Child {
                    blade: blade.clone(),
                    subs,
                },
            );
        }
        self.sort();
        blade.set_parent(Some(self.downgrade()));
        blade
            .view_props()
            .set_parent(Some(self.inner.view_props.clone()));
        let index = self.index_of(&blade).unwrap_or_default();
        debug!(id = %blade.id(), index, "rack add");
        self.inner.emitter.emit(&RackEvent::Add {
            blade,
            index,
            root: true,
        });
        index
    }

    /// Detach a blade and release every listener attached to it. Returns
    /// false if it was not a child.
    pub fn remove(&self, blade: &BladeController) -> bool {
        let removed = {
            let mut children = self.inner.children.borrow_mut();
            match children.iter().position(|c| c.blade.id() == blade.id()) {
                Some(i) => children.remove(i),
                None => return false,
            }
        };
        removed.subs.release_all();
        removed.blade.set_parent(None);
        removed.blade.view_props().set_parent(None);
        debug!(id = %removed.blade.id(), "rack remove");
        self.inner.emitter.emit(&RackEvent::Remove {
            blade: removed.blade,
            root: true,
        });
        true
    }

    /// Dispose every child, last first.
    pub fn dispose_children(&self) {
        for child in self.children().into_iter().rev() {
            if let Err(e) = child.dispose() {
                debug!(id = %child.id(), error = %e, "child dispose skipped");
            }
        }
    }

    /// Export every child, in render order. Children that fail to export
    /// are skipped.
    pub fn export_children(&self) -> Vec<JsonValue> {
        self.children()
            .iter()
            .filter_map(|c| match c.export_state() {
                Ok(s) => Some(JsonValue::Object(s)),
                Err(e) => {
                    debug!(id = %c.id(), error = %e, "child export skipped");
                    None
                }
            })
            .collect()
    }

    /// Import one state per child, in render order. Every child is
    /// attempted; the first failure is returned.
    pub fn import_children(&self, states: &[BladeState]) -> Result<()> {
        let mut first = Ok(());
        for (child, state) in self.children().iter().zip(states) {
            if let Err(e) = child.import_state(state) {
                debug!(id = %child.id(), error = %e, "child import rejected");
                if first.is_ok() {
                    first = Err(e);
                }
            }
        }
        first
    }

    /// Re-read the bound values of every child.
    pub fn refresh_children(&self) {
        for child in self.children() {
            if let Err(e) = child.refresh() {
                debug!(id = %child.id(), error = %e, "child refresh skipped");
            }
        }
    }

    /// Stable sort by position tier.
    fn sort(&self) {
        self.inner
            .children
            .borrow_mut()
            .sort_by_key(|c| c.blade.blade().positions.with_raw(|p| position_tier(p)));
    }

    /// Attach listeners to a new child.
    fn listen(&self, blade: &BladeRef) -> Subscriptions {
        let subs = Subscriptions::new();
        let weak_rack = self.downgrade();
        let weak_blade = Rc::downgrade(blade);

        {
            let (r, b) = (weak_rack.clone(), weak_blade.clone());
            subs.push(
                blade
                    .blade()
                    .positions
                    .emitter()
                    .on(ValueEventName::Change, move |_| {
                        if let (Some(rack), Some(_)) = (r.upgrade(), b.upgrade()) {
                            rack.sort();
                            rack.inner.emitter.emit(&RackEvent::Layout);
                        }
                    }),
            );
        }
        {
            let (r, b) = (weak_rack.clone(), weak_blade.clone());
            subs.push(blade.view_props().handle_dispose(move || {
                if let (Some(rack), Some(blade)) = (r.upgrade(), b.upgrade()) {
                    rack.remove(&blade);
                }
            }));
        }
        {
            let (r, b) = (weak_rack.clone(), weak_blade.clone());
            subs.push(
                blade
                    .view_props()
                    .map()
                    .emitter()
                    .on(ValueMapEventName::Change, move |ev| {
                        if ev.key != ViewPropsKey::Hidden {
                            return;
                        }
                        if let (Some(rack), Some(_)) = (r.upgrade(), b.upgrade()) {
                            rack.inner.emitter.emit(&RackEvent::Layout);
                        }
                    }),
            );
        }
        {
            let (r, b) = (weak_rack.clone(), weak_blade);
            let handler = Rc::new(move |options: ValueChangeOptions, internal: bool| {
                if let (Some(rack), Some(blade)) = (r.upgrade(), b.upgrade()) {
                    rack.inner.emitter.emit(&RackEvent::ValueChange {
                        blade,
                        options,
                        internal,
                    });
                }
            });
            if let Some(sub) = blade.body().on_value_change(handler) {
                subs.push(sub);
            }
        }
        if let Some(nested) = blade.rack() {
            for name in [
                RackEventName::Add,
                RackEventName::Remove,
                RackEventName::ValueChange,
                RackEventName::Layout,
            ] {
                let r = weak_rack.clone();
                subs.push(nested.emitter().on(name, move |ev| {
                    if let Some(rack) = r.upgrade() {
                        rack.inner.emitter.emit(&ev.bubbled());
                    }
                }));
            }
        }
        subs
    }
}

#[cfg(test)]
mod tests {
    use std::{any::Any, cell::Cell};

    use proptest::prelude::*;

    use super::*;
    use crate::core::{
        blade::{Blade, BladeBody, BladePosition, ValueChangeHandler},
        emitter::Subscription,
        value::{ComplexValue, ValueEvent},
    };

    /// A plain body.
    struct Plain;

    impl BladeBody for Plain {
        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    /// A body carrying a value.
    struct Valued {
        /// The value.
        value: Rc<ComplexValue<i32>>,
    }

    impl BladeBody for Valued {
        fn on_value_change(&self, handler: ValueChangeHandler) -> Option<Subscription> {
            Some(self.value.emitter().on(ValueEventName::Change, move |ev| {
                if let ValueEvent::Change(c) = ev {
                    handler(c.options, true);
                }
            }))
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    /// A container body.
    struct Nested {
        /// The nested rack.
        rack: Rack,
    }

    impl BladeBody for Nested {
        fn rack(&self) -> Option<&Rack> {
            Some(&self.rack)
        }

        fn dispose(&self) {
            self.rack.dispose_children();
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    /// A plain blade tagged with positions.
    fn tagged(positions: Vec<BladePosition>) -> BladeRef {
        BladeController::new(Blade::new(positions), ViewProps::default(), Plain)
    }

    /// A container blade.
    fn nested() -> BladeRef {
        let vp = ViewProps::default();
        BladeController::new(Blade::create(), vp.clone(), Nested { rack: Rack::new(vp) })
    }

    /// Count events of one name.
    fn count(rack: &Rack, name: RackEventName) -> (Rc<Cell<usize>>, Subscription) {
        let n = Rc::new(Cell::new(0));
        let c = n.clone();
        let sub = rack.emitter().on(name, move |_| c.set(c.get() + 1));
        (n, sub)
    }

    #[test]
    fn position_ordering() {
        use BladePosition::*;
        let rack = Rack::new(ViewProps::default());
        let vl = tagged(vec![VeryLast]);
        let f = tagged(vec![First]);
        let vf = tagged(vec![VeryFirst]);
        let l = tagged(vec![Last]);
        for b in [&vl, &f, &vf, &l] {
            rack.add(b.clone(), None);
        }
        let ids: Vec<_> = rack.children().iter().map(|c| c.id()).collect();
        assert_eq!(ids, vec![vf.id(), f.id(), l.id(), vl.id()]);
    }

    #[test]
    fn raw_index_within_tier() {
        let rack = Rack::new(ViewProps::default());
        let a = tagged(vec![]);
        let b = tagged(vec![]);
        let c = tagged(vec![]);
        rack.add(a.clone(), None);
        rack.add(b.clone(), None);
        assert_eq!(rack.add(c.clone(), Some(0)), 0);
        let ids: Vec<_> = rack.children().iter().map(|c| c.id()).collect();
        assert_eq!(ids, vec![c.id(), a.id(), b.id()]);
    }

    #[test]
    fn position_change_relayouts() {
        let rack = Rack::new(ViewProps::default());
        let a = tagged(vec![]);
        let b = tagged(vec![]);
        rack.add(a.clone(), None);
        rack.add(b.clone(), None);
        let (layouts, _sub) = count(&rack, RackEventName::Layout);
        b.blade().positions.set(vec![BladePosition::First]);
        assert_eq!(rack.index_of(&b), Some(0));
        assert_eq!(layouts.get(), 1);
    }

    #[test]
    fn remove_releases_listeners() {
        let rack = Rack::new(ViewProps::default());
        let a = tagged(vec![]);
        rack.add(a.clone(), None);
        assert!(a.parent().is_some());
        assert!(rack.remove(&a));
        assert!(!rack.remove(&a));
        assert!(a.parent().is_none());
        assert!(a.view_props().parent().is_none());
        assert_eq!(
            a.blade()
                .positions
                .emitter()
                .listener_count(ValueEventName::Change),
            0
        );
        let (layouts, _sub) = count(&rack, RackEventName::Layout);
        a.blade().positions.set(vec![BladePosition::Last]);
        assert_eq!(layouts.get(), 0);
    }

    #[test]
    fn dispose_detaches() {
        let rack = Rack::new(ViewProps::default());
        let a = tagged(vec![]);
        rack.add(a.clone(), None);
        let (removes, _sub) = count(&rack, RackEventName::Remove);
        a.dispose().unwrap();
        assert!(rack.is_empty());
        assert_eq!(removes.get(), 1);
    }

    #[test]
    fn children_cascade_disabled() {
        let vp = ViewProps::default();
        let rack = Rack::new(vp.clone());
        let a = tagged(vec![]);
        rack.add(a.clone(), None);
        vp.set_disabled(true);
        assert!(a.view_props().is_globally_disabled());
        rack.remove(&a);
        assert!(!a.view_props().is_globally_disabled());
    }

    #[test]
    fn value_change_bubbles_through_nested_racks() {
        let root = Rack::new(ViewProps::default());
        let folder = nested();
        root.add(folder.clone(), None);
        let value = Rc::new(ComplexValue::new(0));
        let leaf = BladeController::new(
            Blade::create(),
            ViewProps::default(),
            Valued {
                value: value.clone(),
            },
        );

        let (adds, _a) = count(&root, RackEventName::Add);
        let roots = Rc::new(RefCell::new(vec![]));
        let r = roots.clone();
        let _b = root.emitter().on(RackEventName::Add, move |ev| {
            if let RackEvent::Add { root, .. } = ev {
                r.borrow_mut().push(*root);
            }
        });
        folder.rack().unwrap().add(leaf.clone(), None);
        assert_eq!(adds.get(), 1);
        assert_eq!(*roots.borrow(), vec![false]);

        let seen = Rc::new(RefCell::new(vec![]));
        let s = seen.clone();
        let _c = root.emitter().on(RackEventName::ValueChange, move |ev| {
            if let RackEvent::ValueChange { blade, .. } = ev {
                s.borrow_mut().push(blade.id());
            }
        });
        value.set(5);
        assert_eq!(*seen.borrow(), vec![leaf.id()]);
    }

    #[test]
    fn container_dispose_disposes_children() {
        let folder = nested();
        let a = tagged(vec![]);
        folder.rack().unwrap().add(a.clone(), None);
        folder.dispose().unwrap();
        assert!(a.is_disposed());
        assert!(folder.rack().unwrap().is_empty());
    }

    #[test]
    fn readd_moves_between_racks() {
        let r1 = Rack::new(ViewProps::default());
        let r2 = Rack::new(ViewProps::default());
        let a = tagged(vec![]);
        r1.add(a.clone(), None);
        r2.add(a.clone(), None);
        assert!(r1.is_empty());
        assert_eq!(r2.len(), 1);
    }

    /// Strategy for a position tag set.
    fn positions() -> impl Strategy<Value = Vec<BladePosition>> {
        proptest::collection::vec(proptest::sample::select(BladePosition::ALL.to_vec()), 0..2)
    }

    proptest! {
        #[test]
        fn render_order_is_tier_sorted(tags in proptest::collection::vec(positions(), 0..12)) {
            let rack = Rack::new(ViewProps::default());
            let blades: Vec<_> = tags.iter().map(|t| tagged(t.clone())).collect();
            for b in &blades {
                rack.add(b.clone(), None);
            }
            let order = rack.children();
            let tiers: Vec<u8> = order
                .iter()
                .map(|b| b.blade().positions.with_raw(|p| position_tier(p)))
                .collect();
            prop_assert!(tiers.windows(2).all(|w| w[0] <= w[1]));
            // Within a tier, insertion order is kept.
            for w in order.windows(2) {
                let t0 = w[0].blade().positions.with_raw(|p| position_tier(p));
                let t1 = w[1].blade().positions.with_raw(|p| position_tier(p));
                if t0 == t1 {
                    prop_assert!(w[0].id() < w[1].id());
                }
            }
        }
    }
}
