use std::{cell::RefCell, rc::Rc};

use crate::emitter::{Emitter, Event, Subscription};

/// Records the events an emitter raises under a set of names, in order.
/// Recording stops when the recorder is dropped.
pub struct Recorder<E: Event> {
    /// Events seen so far.
    events: Rc<RefCell<Vec<E>>>,
    /// One listener per name.
    _subs: Vec<Subscription>,
}

impl<E: Event + Clone + 'static> Recorder<E> {
    /// Start recording `names` on `emitter`.
    pub fn new(emitter: &Emitter<E>, names: &[E::Name]) -> Self {
        let events = Rc::new(RefCell::new(vec![]));
        let subs = names
            .iter()
            .map(|name| {
                let events = events.clone();
                emitter.on(*name, move |ev: &E| events.borrow_mut().push(ev.clone()))
            })
            .collect();
        Self {
            events,
            _subs: subs,
        }
    }

    /// A copy of every recorded event.
    pub fn events(&self) -> Vec<E> {
        self.events.borrow().clone()
    }

    /// Recorded events mapped through `f`, skipping `None`.
    pub fn map<R>(&self, f: impl Fn(&E) -> Option<R>) -> Vec<R> {
        self.events.borrow().iter().filter_map(f).collect()
    }

    /// Number of recorded events.
    pub fn len(&self) -> usize {
        self.events.borrow().len()
    }

    /// True if nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.events.borrow().is_empty()
    }

    /// Forget recorded events.
    pub fn clear(&self) {
        self.events.borrow_mut().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{ComplexValue, Value, ValueEvent, ValueEventName};

    #[test]
    fn records_in_order() {
        let v = ComplexValue::new(0);
        let rec = Recorder::new(v.emitter(), &[ValueEventName::Change]);
        v.set(1);
        v.set(1);
        v.set(2);
        let seen = rec.map(|ev| match ev {
            ValueEvent::Change(c) => Some(c.raw_value),
            ValueEvent::BeforeChange => None,
        });
        assert_eq!(seen, vec![1, 2]);
        rec.clear();
        assert!(rec.is_empty());
    }
}
