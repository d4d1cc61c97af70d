//! Observable scalar values.

use std::{
    cell::{Cell, RefCell},
    fmt,
    rc::Rc,
};

use scopeguard::defer;

use super::{
    constraint::Constraint,
    emitter::{Emitter, Event, Subscription, Subscriptions},
};

/// Options attached to a raw value change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValueChangeOptions {
    /// Emit a change event even when the value is equal to the current one.
    pub force_emit: bool,
    /// Whether this is the last change of an interaction (eg. the end of a
    /// drag).
    pub last: bool,
}

impl Default for ValueChangeOptions {
    fn default() -> Self {
        Self {
            force_emit: false,
            last: true,
        }
    }
}

impl ValueChangeOptions {
    /// Options for an intermediate change within an interaction.
    pub fn intermediate() -> Self {
        Self {
            force_emit: false,
            last: false,
        }
    }

    /// Options that always emit.
    pub fn forced() -> Self {
        Self {
            force_emit: true,
            last: true,
        }
    }
}

/// Payload of a value `change` event.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueChange<T> {
    /// Options the change was made with.
    pub options: ValueChangeOptions,
    /// Value before the change.
    pub previous_raw_value: T,
    /// Value after the change.
    pub raw_value: T,
    /// For binding values, whether the change came from the UI side (true)
    /// or from a fetch of the bound object (false). `None` for plain values.
    pub is_internal_change: Option<bool>,
}

/// Events emitted by a [`Value`].
#[derive(Debug, Clone, PartialEq)]
pub enum ValueEvent<T> {
    /// Emitted at the start of every `set_raw_value` call.
    BeforeChange,
    /// Emitted after the stored value was replaced.
    Change(ValueChange<T>),
}

/// Names of [`ValueEvent`] variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueEventName {
    /// See [`ValueEvent::BeforeChange`].
    BeforeChange,
    /// See [`ValueEvent::Change`].
    Change,
}

impl<T> Event for ValueEvent<T> {
    type Name = ValueEventName;

    fn name(&self) -> ValueEventName {
        match self {
            Self::BeforeChange => ValueEventName::BeforeChange,
            Self::Change(_) => ValueEventName::Change,
        }
    }
}

/// Equality comparator deciding whether a write is a change.
pub type Equality<T> = Rc<dyn Fn(&T, &T) -> bool>;

/// An observable value. All mutation routes through `set_raw_value`, so
/// `beforechange`/`change` observers are never skipped.
pub trait Value<T> {
    /// The emitter for value events.
    fn emitter(&self) -> &Emitter<ValueEvent<T>>;

    /// A copy of the current value.
    fn raw_value(&self) -> T;

    /// Replace the value.
    fn set_raw_value(&self, raw_value: T, options: ValueChangeOptions);

    /// Replace the value with default options.
    fn set(&self, raw_value: T) {
        self.set_raw_value(raw_value, ValueChangeOptions::default());
    }
}

/// Shared handle to any value implementation.
pub type ValueRef<T> = Rc<dyn Value<T>>;

/// The concrete value store: an optional constraint applied on every write,
/// and a pluggable equality comparator.
pub struct ComplexValue<T> {
    /// Value events.
    emitter: Emitter<ValueEvent<T>>,
    /// Stored value.
    raw: RefCell<T>,
    /// Constraint applied to incoming values.
    constraint: Option<Rc<dyn Constraint<T>>>,
    /// Change detection.
    equals: Equality<T>,
}

impl<T: Clone + fmt::Debug> fmt::Debug for ComplexValue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComplexValue")
            .field("raw", &*self.raw.borrow())
            .field("constrained", &self.constraint.is_some())
            .finish()
    }
}

/// Construction options for [`create_value`].
pub struct ValueConfig<T> {
    /// Constraint applied on every write.
    pub constraint: Option<Rc<dyn Constraint<T>>>,
    /// Equality override; defaults to `PartialEq`.
    pub equals: Option<Equality<T>>,
}

impl<T> Default for ValueConfig<T> {
    fn default() -> Self {
        Self {
            constraint: None,
            equals: None,
        }
    }
}

/// Create a shared value using `PartialEq` unless the config overrides it.
pub fn create_value<T>(initial: T, config: ValueConfig<T>) -> Rc<ComplexValue<T>>
where
    T: Clone + PartialEq + 'static,
{
    let equals = config
        .equals
        .unwrap_or_else(|| Rc::new(|a: &T, b: &T| a == b));
    Rc::new(ComplexValue::with_equality(initial, config.constraint, equals))
}

impl<T: Clone + 'static> ComplexValue<T> {
    /// An unconstrained value compared with `PartialEq`.
    pub fn new(initial: T) -> Self
    where
        T: PartialEq,
    {
        Self::with_equality(initial, None, Rc::new(|a: &T, b: &T| a == b))
    }

    /// A value with an explicit constraint and comparator.
    pub fn with_equality(
        initial: T,
        constraint: Option<Rc<dyn Constraint<T>>>,
        equals: Equality<T>,
    ) -> Self {
        Self {
            emitter: Emitter::new(),
            raw: RefCell::new(initial),
            constraint,
            equals,
        }
    }

    /// The constraint applied to writes, if any.
    pub fn constraint(&self) -> Option<&Rc<dyn Constraint<T>>> {
        self.constraint.as_ref()
    }

    /// Borrow the current value without cloning.
    pub fn with_raw<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.raw.borrow())
    }
}

impl<T: Clone + 'static> Value<T> for ComplexValue<T> {
    fn emitter(&self) -> &Emitter<ValueEvent<T>> {
        &self.emitter
    }

    fn raw_value(&self) -> T {
        self.raw.borrow().clone()
    }

    fn set_raw_value(&self, raw_value: T, options: ValueChangeOptions) {
        self.emitter.emit(&ValueEvent::BeforeChange);

        let constrained = match &self.constraint {
            Some(c) => c.constrain(raw_value),
            None => raw_value,
        };
        let previous = self.raw.borrow().clone();
        if (self.equals)(&previous, &constrained) && !options.force_emit {
            return;
        }
        *self.raw.borrow_mut() = constrained.clone();
        self.emitter.emit(&ValueEvent::Change(ValueChange {
            options,
            previous_raw_value: previous,
            raw_value: constrained,
            is_internal_change: None,
        }));
    }
}

/// A value whose mutation is hidden from external holders.
pub struct ReadonlyValue<T> {
    /// Backing value.
    value: Rc<ComplexValue<T>>,
}

impl<T> Clone for ReadonlyValue<T> {
    fn clone(&self) -> Self {
        Self {
            value: self.value.clone(),
        }
    }
}

impl<T: Clone + 'static> ReadonlyValue<T> {
    /// The emitter for value events.
    pub fn emitter(&self) -> &Emitter<ValueEvent<T>> {
        self.value.emitter()
    }

    /// A copy of the current value.
    pub fn raw_value(&self) -> T {
        self.value.raw_value()
    }
}

/// The paired write half of a [`ReadonlyValue`], kept by the owner.
pub struct RawValueSetter<T> {
    /// Backing value.
    value: Rc<ComplexValue<T>>,
}

impl<T: Clone + 'static> RawValueSetter<T> {
    /// Replace the value.
    pub fn set(&self, raw_value: T, options: ValueChangeOptions) {
        self.value.set_raw_value(raw_value, options);
    }
}

/// Split a value into a read-only view and its setter.
pub fn create_readonly_value<T: Clone + 'static>(
    value: Rc<ComplexValue<T>>,
) -> (ReadonlyValue<T>, RawValueSetter<T>) {
    (
        ReadonlyValue {
            value: value.clone(),
        },
        RawValueSetter { value },
    )
}

/// Apply the current value now and again on every change.
pub fn bind_value<T: Clone + 'static>(
    value: &dyn Value<T>,
    apply: impl Fn(&T) + 'static,
) -> Subscription {
    apply(&value.raw_value());
    value.emitter().on(ValueEventName::Change, move |ev| {
        if let ValueEvent::Change(c) = ev {
            apply(&c.raw_value);
        }
    })
}

/// Keep two values in sync through forward and backward mappings. Feedback
/// from the write each side triggers on the other is suppressed.
pub fn connect_values<P, S>(
    primary: ValueRef<P>,
    secondary: ValueRef<S>,
    forward: impl Fn(&P, &S) -> S + 'static,
    backward: impl Fn(&P, &S) -> P + 'static,
) -> Subscriptions
where
    P: Clone + 'static,
    S: Clone + 'static,
{
    let changing = Rc::new(Cell::new(false));
    let forward = Rc::new(forward);
    let subs = Subscriptions::new();

    let guarded = {
        let changing = changing.clone();
        move |f: &dyn Fn()| {
            if changing.get() {
                return;
            }
            changing.set(true);
            defer! { changing.set(false); }
            f();
        }
    };
    let guarded = Rc::new(guarded);

    {
        let (p, s, fwd, g) = (
            primary.clone(),
            secondary.clone(),
            forward.clone(),
            guarded.clone(),
        );
        subs.push(primary.emitter().on(ValueEventName::Change, move |ev| {
            if let ValueEvent::Change(c) = ev {
                g(&|| s.set_raw_value(fwd(&p.raw_value(), &s.raw_value()), c.options));
            }
        }));
    }
    {
        let (p, s, fwd, g) = (
            primary.clone(),
            secondary.clone(),
            forward.clone(),
            guarded.clone(),
        );
        subs.push(secondary.emitter().on(ValueEventName::Change, move |ev| {
            if let ValueEvent::Change(c) = ev {
                g(&|| p.set_raw_value(backward(&p.raw_value(), &s.raw_value()), c.options));
                g(&|| s.set_raw_value(fwd(&p.raw_value(), &s.raw_value()), c.options));
            }
        }));
    }

    guarded(&|| {
        secondary.set_raw_value(
            forward(&primary.raw_value(), &secondary.raw_value()),
            ValueChangeOptions::default(),
        )
    });
    subs
}
