//! Values glued to bindings.
//!
//! An [`InputBindingValue`] pushes UI edits out to the bound object and
//! pulls external changes in on `fetch`. A [`MonitorBindingValue`] samples
//! a read-only binding into a fixed-size history on every tick.

use std::{
    cell::{Cell, RefCell},
    rc::{Rc, Weak},
};

use scopeguard::defer;
use tracing::{trace, warn};

use super::{
    binding::{ReadWriteBinding, ReadonlyBinding},
    emitter::{Emitter, Subscription, Subscriptions},
    error::Result,
    ticker::{Ticker, TickerEventName},
    value::{
        ComplexValue, Value, ValueChange, ValueChangeOptions, ValueEvent, ValueEventName, ValueRef,
    },
};

/// A value coupled to a writable binding.
///
/// Calling [`Value::set_raw_value`] marks the change as internal and, if it
/// took effect, writes the new value out through the binding. Values read
/// in by [`InputBindingValue::fetch`] are never written back.
pub struct InputBindingValue<T> {
    /// The wrapped value.
    value: ValueRef<T>,
    /// The binding.
    binding: ReadWriteBinding<T>,
    /// Re-emitted value events, tagged with the change origin.
    emitter: Emitter<ValueEvent<T>>,
    /// True while an internal set is in progress.
    internal: Cell<bool>,
    /// Subscriptions on the wrapped value.
    subs: Subscriptions,
}

impl<T: Clone + 'static> InputBindingValue<T> {
    /// Couple a value with a binding.
    pub fn new(value: ValueRef<T>, binding: ReadWriteBinding<T>) -> Rc<Self> {
        Rc::new_cyclic(|weak: &Weak<Self>| {
            let subs = Subscriptions::new();
            let w = weak.clone();
            subs.push(value.emitter().on(ValueEventName::BeforeChange, move |ev| {
                if let Some(me) = w.upgrade() {
                    me.emitter.emit(ev);
                }
            }));
            let w = weak.clone();
            subs.push(value.emitter().on(ValueEventName::Change, move |ev| {
                if let (Some(me), ValueEvent::Change(c)) = (w.upgrade(), ev) {
                    me.on_value_change(c);
                }
            }));
            Self {
                value,
                binding,
                emitter: Emitter::new(),
                internal: Cell::new(false),
                subs,
            }
        })
    }

    /// The binding.
    pub fn binding(&self) -> &ReadWriteBinding<T> {
        &self.binding
    }

    /// The wrapped value.
    pub fn value(&self) -> &ValueRef<T> {
        &self.value
    }

    /// Re-read the bound property and store it as an external change.
    pub fn fetch(&self) -> Result<()> {
        let v = self.binding.read()?;
        self.value.set_raw_value(v, ValueChangeOptions::default());
        Ok(())
    }

    /// Write the current value out through the binding.
    pub fn push(&self) -> Result<()> {
        trace!(key = self.binding.target.key(), "push");
        self.binding.write(&self.value.raw_value())
    }

    /// Release subscriptions on the wrapped value.
    pub fn dispose(&self) {
        self.subs.release_all();
    }

    /// Tag, push and re-emit a change of the wrapped value.
    fn on_value_change(&self, c: &ValueChange<T>) {
        let internal = self.internal.get();
        if internal && let Err(e) = self.push() {
            warn!(key = self.binding.target.key(), error = %e, "write to bound object failed");
        }
        self.emitter.emit(&ValueEvent::Change(ValueChange {
            is_internal_change: Some(internal),
            ..c.clone()
        }));
    }
}

impl<T: Clone + 'static> Value<T> for InputBindingValue<T> {
    fn emitter(&self) -> &Emitter<ValueEvent<T>> {
        &self.emitter
    }

    fn raw_value(&self) -> T {
        self.value.raw_value()
    }

    fn set_raw_value(&self, raw_value: T, options: ValueChangeOptions) {
        let prev = self.internal.replace(true);
        defer! { self.internal.set(prev); }
        self.value.set_raw_value(raw_value, options);
    }
}

/// A fixed-size sample history. `None` marks slots not yet filled.
pub type Buffer<T> = Vec<Option<T>>;

/// An empty history of `size` slots.
pub fn initialize_buffer<T: Clone>(size: usize) -> Buffer<T> {
    vec![None; size]
}

/// Append a sample after the first `filled` slots, evicting the oldest
/// once the history is full. A `None` sample marks a failed read and still
/// takes a slot.
pub fn create_pushed_buffer<T: Clone>(buffer: &[Option<T>], filled: usize, sample: Option<T>) -> Buffer<T> {
    let mut next: Buffer<T> = buffer[..filled.min(buffer.len())].to_vec();
    next.push(sample);
    if next.len() > buffer.len() {
        let excess = next.len() - buffer.len();
        next.drain(..excess);
    } else {
        next.resize(buffer.len(), None);
    }
    next
}

/// A value sampling a read-only binding on every tick of a ticker.
pub struct MonitorBindingValue<T> {
    /// The history buffer.
    value: Rc<ComplexValue<Buffer<T>>>,
    /// The binding.
    binding: ReadonlyBinding<T>,
    /// Tick source.
    ticker: Rc<dyn Ticker>,
    /// Slots taken so far, failed reads included.
    filled: Cell<usize>,
    /// Tick subscription.
    tick_sub: RefCell<Option<Subscription>>,
}

impl<T: Clone + 'static> MonitorBindingValue<T> {
    /// Couple a history of `buffer_size` slots with a binding and ticker.
    /// One sample is taken immediately.
    pub fn new(binding: ReadonlyBinding<T>, ticker: Rc<dyn Ticker>, buffer_size: usize) -> Rc<Self> {
        let value = Rc::new(ComplexValue::with_equality(
            initialize_buffer(buffer_size.max(1)),
            None,
            Rc::new(|_: &Buffer<T>, _: &Buffer<T>| false),
        ));
        let me = Rc::new(Self {
            value,
            binding,
            ticker: ticker.clone(),
            filled: Cell::new(0),
            tick_sub: RefCell::new(None),
        });
        let weak = Rc::downgrade(&me);
        let sub = ticker.emitter().on(TickerEventName::Tick, move |_| {
            if let Some(me) = weak.upgrade() {
                me.sample();
            }
        });
        *me.tick_sub.borrow_mut() = Some(sub);
        me.sample();
        me
    }

    /// The history buffer value.
    pub fn value(&self) -> &Rc<ComplexValue<Buffer<T>>> {
        &self.value
    }

    /// The binding.
    pub fn binding(&self) -> &ReadonlyBinding<T> {
        &self.binding
    }

    /// The tick source.
    pub fn ticker(&self) -> &Rc<dyn Ticker> {
        &self.ticker
    }

    /// Number of history slots.
    pub fn buffer_size(&self) -> usize {
        self.value.with_raw(Vec::len)
    }

    /// Read the bound property and append it to the history. A failed read
    /// appends an empty slot and returns the error.
    pub fn fetch(&self) -> Result<()> {
        let read = self.binding.read();
        self.push(read.as_ref().ok().cloned());
        read.map(drop)
    }

    /// Append one slot.
    fn push(&self, sample: Option<T>) {
        let filled = self.filled.get();
        let next = self.value.with_raw(|b| create_pushed_buffer(b, filled, sample));
        self.filled.set((filled + 1).min(next.len()));
        self.value.set(next);
    }

    /// Fetch, logging a failed read.
    fn sample(&self) {
        if let Err(e) = self.fetch() {
            warn!(key = self.binding.target.key(), error = %e, "monitor read failed");
        }
    }

    /// Stop sampling and dispose the ticker.
    pub fn dispose(&self) {
        if let Some(sub) = self.tick_sub.borrow_mut().take() {
            sub.release();
        }
        self.ticker.dispose();
    }
}
