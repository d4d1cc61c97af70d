//! Observable records with a closed key set.
//!
//! A value map is declared with [`value_map!`](crate::value_map). Each key
//! owns exactly one [`ComplexValue`](crate::value::ComplexValue), exposed as
//! a public field, and every change to any key is re-raised as a single
//! [`ValueMapEvent`] naming the key.

use std::{fmt, hash::Hash};

use super::emitter::Event;

/// Raised when any key of a value map changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValueMapEvent<K> {
    /// The key that changed.
    pub key: K,
}

/// Event names for [`ValueMapEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueMapEventName {
    /// A key changed.
    Change,
}

impl<K: Copy + Eq + Hash + fmt::Debug + 'static> Event for ValueMapEvent<K> {
    type Name = ValueMapEventName;

    fn name(&self) -> ValueMapEventName {
        ValueMapEventName::Change
    }
}

/// Declare a value map struct and its key enum.
///
/// ```
/// use knobs::value::Value;
///
/// knobs::value_map! {
///     /// Label state.
///     pub struct LabelProps: LabelKey {
///         /// Label text.
///         label => Label: Option<String>,
///     }
/// }
/// let props = LabelProps::new(None);
/// props.label.set(Some("x".into()));
/// ```
#[macro_export]
macro_rules! value_map {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident : $key:ident {
            $(
                $(#[$fmeta:meta])*
                $field:ident => $variant:ident : $ty:ty
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        $vis struct $name {
            $(
                $(#[$fmeta])*
                pub $field: ::std::rc::Rc<$crate::value::ComplexValue<$ty>>,
            )*
            /// Key change events.
            emitter: $crate::emitter::Emitter<$crate::value_map::ValueMapEvent<$key>>,
            /// Forwarders from each key's value to the map emitter.
            #[allow(dead_code)]
            forwarders: $crate::emitter::Subscriptions,
        }

        /// Keys of the value map.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        $vis enum $key {
            $(
                $(#[$fmeta])*
                $variant,
            )*
        }

        impl $name {
            /// Construct the map from initial values.
            #[allow(clippy::too_many_arguments)]
            pub fn new($($field: $ty),*) -> Self {
                Self::from_values($(::std::rc::Rc::new($crate::value::ComplexValue::new($field))),*)
            }

            /// Construct the map over existing values. The values stay
            /// shared with whoever else holds them.
            #[allow(clippy::too_many_arguments)]
            pub fn from_values($($field: ::std::rc::Rc<$crate::value::ComplexValue<$ty>>),*) -> Self {
                let emitter = $crate::emitter::Emitter::new();
                let forwarders = $crate::emitter::Subscriptions::new();
                $(
                    {
                        let weak = emitter.downgrade();
                        forwarders.push($crate::value::Value::emitter(&*$field).on(
                            $crate::value::ValueEventName::Change,
                            move |_| {
                                if let Some(e) = weak.upgrade() {
                                    e.emit(&$crate::value_map::ValueMapEvent { key: $key::$variant });
                                }
                            },
                        ));
                    }
                )*
                Self {
                    $($field,)*
                    emitter,
                    forwarders,
                }
            }

            /// Change events for every key.
            pub fn emitter(&self) -> &$crate::emitter::Emitter<$crate::value_map::ValueMapEvent<$key>> {
                &self.emitter
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, rc::Rc};

    use super::*;
    use crate::value::{ComplexValue, Value};

    crate::value_map! {
        /// Test record.
        struct Sample: SampleKey {
            /// A number.
            count => Count: i32,
            /// A name.
            name => Name: String,
        }
    }

    #[test]
    fn change_names_key() {
        let m = Sample::new(0, "a".into());
        let seen = Rc::new(RefCell::new(vec![]));
        let s = seen.clone();
        let _sub = m.emitter().on(ValueMapEventName::Change, move |ev| {
            s.borrow_mut().push(ev.key);
        });
        m.count.set(1);
        m.name.set("a".into());
        m.name.set("b".into());
        assert_eq!(*seen.borrow(), vec![SampleKey::Count, SampleKey::Name]);
        assert_eq!(m.count.raw_value(), 1);
    }

    #[test]
    fn shared_values() {
        let count = Rc::new(ComplexValue::new(3));
        let m = Sample::from_values(count.clone(), Rc::new(ComplexValue::new(String::new())));
        let seen = Rc::new(RefCell::new(vec![]));
        let s = seen.clone();
        let _sub = m.emitter().on(ValueMapEventName::Change, move |ev| {
            s.borrow_mut().push(ev.key);
        });
        count.set(4);
        assert_eq!(m.count.raw_value(), 4);
        assert_eq!(*seen.borrow(), vec![SampleKey::Count]);
    }
}
