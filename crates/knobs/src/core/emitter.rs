//! A typed, per-instance publish/subscribe bus.
//!
//! Each emitter carries one event type `E`. Every payload variant maps to a
//! closed set of event names via [`Event::name`], and handlers register
//! against a name. Dispatch is synchronous and runs handlers in registration
//! order on the calling thread.
//!
//! Handlers may call `on`/`off` on the emitter that is currently
//! dispatching. The handler list is snapshotted before dispatch, so such
//! calls never fail, but whether a handler added or removed mid-dispatch
//! sees the in-flight event is unspecified.

use std::{
    cell::{Cell, RefCell},
    collections::HashMap,
    fmt,
    hash::Hash,
    mem,
    rc::{Rc, Weak},
};

/// An event payload that knows its own name.
pub trait Event {
    /// The closed set of names for this event type.
    type Name: Copy + Eq + Hash + fmt::Debug + 'static;

    /// Name of this payload.
    fn name(&self) -> Self::Name;
}

/// Handler function type.
pub type Handler<E> = Rc<dyn Fn(&E)>;

thread_local! {
    /// Counter for anonymous listener keys.
    static NEXT_KEY: Cell<u64> = const { Cell::new(1) };
}

/// Opaque key used to remove one or more registered handlers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerKey(u64);

impl ListenerKey {
    /// Allocate a fresh, unique key.
    pub fn unique() -> Self {
        NEXT_KEY.with(|n| {
            let k = n.get();
            n.set(k + 1);
            Self(k)
        })
    }
}

/// A registered handler.
struct Observer<E> {
    /// Removal key.
    key: ListenerKey,
    /// Handler function.
    handler: Handler<E>,
}

impl<E> Clone for Observer<E> {
    fn clone(&self) -> Self {
        Self {
            key: self.key,
            handler: self.handler.clone(),
        }
    }
}

/// Handler table keyed by event name.
type Observers<E> = HashMap<<E as Event>::Name, Vec<Observer<E>>>;

/// A typed event emitter. Cloning produces another handle to the same bus.
pub struct Emitter<E: Event> {
    /// Shared handler table.
    observers: Rc<RefCell<Observers<E>>>,
}

impl<E: Event> Clone for Emitter<E> {
    fn clone(&self) -> Self {
        Self {
            observers: self.observers.clone(),
        }
    }
}

impl<E: Event> Default for Emitter<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Event> fmt::Debug for Emitter<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let counts: HashMap<E::Name, usize> = self
            .observers
            .borrow()
            .iter()
            .map(|(k, v)| (*k, v.len()))
            .collect();
        f.debug_struct("Emitter").field("observers", &counts).finish()
    }
}

impl<E: Event> Emitter<E> {
    /// Construct an emitter with no handlers.
    pub fn new() -> Self {
        Self {
            observers: Rc::new(RefCell::new(HashMap::new())),
        }
    }

    /// Register a handler. The returned subscription removes it when released
    /// or dropped.
    #[must_use = "dropping the subscription removes the handler"]
    pub fn on(&self, name: E::Name, handler: impl Fn(&E) + 'static) -> Subscription
    where
        E: 'static,
    {
        let key = ListenerKey::unique();
        self.on_keyed(name, key, handler);
        let observers = Rc::downgrade(&self.observers);
        Subscription::new(move || {
            if let Some(observers) = observers.upgrade() {
                remove_key::<E>(&observers, name, key);
            }
        })
    }

    /// Register a handler under an explicit removal key. Several handlers may
    /// share a key; `off` removes all of them.
    pub fn on_keyed(&self, name: E::Name, key: ListenerKey, handler: impl Fn(&E) + 'static) {
        self.observers
            .borrow_mut()
            .entry(name)
            .or_default()
            .push(Observer {
                key,
                handler: Rc::new(handler),
            });
    }

    /// Remove every handler registered for `name` under `key`.
    pub fn off(&self, name: E::Name, key: ListenerKey) {
        remove_key::<E>(&self.observers, name, key);
    }

    /// Dispatch an event to every handler registered for its name.
    pub fn emit(&self, event: &E) {
        let snapshot: Vec<Observer<E>> = self
            .observers
            .borrow()
            .get(&event.name())
            .cloned()
            .unwrap_or_default();
        for o in snapshot {
            (o.handler)(event);
        }
    }

    /// Number of handlers currently registered for `name`.
    pub fn listener_count(&self, name: E::Name) -> usize {
        self.observers.borrow().get(&name).map_or(0, Vec::len)
    }

    /// A weak handle, for handlers that must not keep the emitter alive.
    pub fn downgrade(&self) -> WeakEmitter<E> {
        WeakEmitter {
            observers: Rc::downgrade(&self.observers),
        }
    }
}

/// Remove handlers matching a key from a handler table.
fn remove_key<E: Event>(observers: &RefCell<Observers<E>>, name: E::Name, key: ListenerKey) {
    // Removed handlers are dropped after the table borrow ends, since a
    // handler may own subscriptions on this same emitter.
    let removed: Vec<Observer<E>> = {
        let mut observers = observers.borrow_mut();
        let Some(list) = observers.get_mut(&name) else {
            return;
        };
        let (removed, kept): (Vec<_>, Vec<_>) =
            mem::take(list).into_iter().partition(|o| o.key == key);
        if kept.is_empty() {
            observers.remove(&name);
        } else {
            *list = kept;
        }
        removed
    };
    drop(removed);
}

/// A non-owning emitter handle.
pub struct WeakEmitter<E: Event> {
    /// Weak handler table.
    observers: Weak<RefCell<Observers<E>>>,
}

impl<E: Event> Clone for WeakEmitter<E> {
    fn clone(&self) -> Self {
        Self {
            observers: self.observers.clone(),
        }
    }
}

impl<E: Event> WeakEmitter<E> {
    /// Recover a strong handle if the emitter is still alive.
    pub fn upgrade(&self) -> Option<Emitter<E>> {
        self.observers.upgrade().map(|observers| Emitter { observers })
    }
}

/// Handle to a registered handler.
///
/// Releasing the subscription (explicitly, or by dropping it) unregisters
/// the handler. Call [`Subscription::detach`] to leave the handler in place
/// for the lifetime of the emitter.
#[must_use = "dropping the subscription removes the handler"]
pub struct Subscription {
    /// Deregistration closure, taken on release.
    release: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    /// Wrap a deregistration closure.
    pub fn new(release: impl FnOnce() + 'static) -> Self {
        Self {
            release: Some(Box::new(release)),
        }
    }

    /// Unregister the handler now.
    pub fn release(mut self) {
        if let Some(f) = self.release.take() {
            f();
        }
    }

    /// Keep the handler registered for as long as the emitter lives.
    pub fn detach(mut self) {
        self.release = None;
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(f) = self.release.take() {
            f();
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.release.is_some())
            .finish()
    }
}

/// A bag of subscriptions released together.
#[derive(Debug, Default)]
pub struct Subscriptions {
    /// Held subscriptions.
    subs: RefCell<Vec<Subscription>>,
}

impl Subscriptions {
    /// Construct an empty bag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Hold a subscription.
    pub fn push(&self, sub: Subscription) {
        self.subs.borrow_mut().push(sub);
    }

    /// Take over every subscription held by another bag.
    pub fn absorb(&self, other: Self) {
        let taken = mem::take(&mut *other.subs.borrow_mut());
        self.subs.borrow_mut().extend(taken);
    }

    /// Release every held subscription.
    pub fn release_all(&self) {
        let subs = mem::take(&mut *self.subs.borrow_mut());
        for s in subs {
            s.release();
        }
    }

    /// Number of held subscriptions.
    pub fn len(&self) -> usize {
        self.subs.borrow().len()
    }

    /// True if nothing is held.
    pub fn is_empty(&self) -> bool {
        self.subs.borrow().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    enum Name {
        Ping,
        Pong,
    }

    #[derive(Debug)]
    enum Ev {
        Ping(u32),
        Pong,
    }

    impl Event for Ev {
        type Name = Name;
        fn name(&self) -> Name {
            match self {
                Self::Ping(_) => Name::Ping,
                Self::Pong => Name::Pong,
            }
        }
    }

    #[test]
    fn emits_in_registration_order() {
        let e: Emitter<Ev> = Emitter::new();
        let log = Rc::new(RefCell::new(vec![]));
        let l1 = log.clone();
        let l2 = log.clone();
        let _a = e.on(Name::Ping, move |ev| {
            if let Ev::Ping(n) = ev {
                l1.borrow_mut().push(("a", *n));
            }
        });
        let _b = e.on(Name::Ping, move |ev| {
            if let Ev::Ping(n) = ev {
                l2.borrow_mut().push(("b", *n));
            }
        });
        e.emit(&Ev::Ping(3));
        e.emit(&Ev::Pong);
        assert_eq!(*log.borrow(), vec![("a", 3), ("b", 3)]);
    }

    #[test]
    fn subscription_release_and_drop() {
        let e: Emitter<Ev> = Emitter::new();
        let count = Rc::new(Cell::new(0));
        let c = count.clone();
        let sub = e.on(Name::Pong, move |_| c.set(c.get() + 1));
        e.emit(&Ev::Pong);
        sub.release();
        e.emit(&Ev::Pong);
        assert_eq!(count.get(), 1);

        let c = count.clone();
        {
            let _sub = e.on(Name::Pong, move |_| c.set(c.get() + 1));
            e.emit(&Ev::Pong);
        }
        e.emit(&Ev::Pong);
        assert_eq!(count.get(), 2);

        let c = count.clone();
        e.on(Name::Pong, move |_| c.set(c.get() + 1)).detach();
        e.emit(&Ev::Pong);
        assert_eq!(count.get(), 3);
        assert_eq!(e.listener_count(Name::Pong), 1);
    }

    #[test]
    fn keyed_handlers_removed_together() {
        let e: Emitter<Ev> = Emitter::new();
        let key = ListenerKey::unique();
        let count = Rc::new(Cell::new(0));
        for _ in 0..3 {
            let c = count.clone();
            e.on_keyed(Name::Pong, key, move |_| c.set(c.get() + 1));
        }
        let c = count.clone();
        let _other = e.on(Name::Pong, move |_| c.set(c.get() + 10));
        e.emit(&Ev::Pong);
        assert_eq!(count.get(), 13);
        e.off(Name::Pong, key);
        e.emit(&Ev::Pong);
        assert_eq!(count.get(), 23);
    }

    #[test]
    fn reentrant_on_off_does_not_panic() {
        let e: Emitter<Ev> = Emitter::new();
        let weak = e.downgrade();
        let key = ListenerKey::unique();
        e.on_keyed(Name::Ping, key, move |_| {
            if let Some(e) = weak.upgrade() {
                e.off(Name::Ping, key);
                e.on(Name::Pong, |_| {}).detach();
                e.emit(&Ev::Pong);
            }
        });
        e.emit(&Ev::Ping(1));
        e.emit(&Ev::Ping(2));
        assert_eq!(e.listener_count(Name::Ping), 0);
        assert_eq!(e.listener_count(Name::Pong), 1);
    }

    #[test]
    fn subscription_outliving_emitter_is_harmless() {
        let e: Emitter<Ev> = Emitter::new();
        let sub = e.on(Name::Pong, |_| {});
        drop(e);
        sub.release();
    }
}
