//! Identity-preserving cache of API objects.

use std::{
    cell::RefCell,
    collections::HashMap,
    rc::{Rc, Weak},
};

use super::AnyBladeApi;
use crate::id::BladeId;

/// Maps controllers to the API objects built for them, so a host asking
/// twice gets the same object. Entries do not keep APIs alive.
#[derive(Default)]
pub struct BladeApiCache {
    /// Live entries.
    entries: RefCell<HashMap<BladeId, Weak<dyn AnyBladeApi>>>,
}

impl BladeApiCache {
    /// The cached API for a controller, if the host still holds it.
    pub fn get(&self, id: BladeId) -> Option<Rc<dyn AnyBladeApi>> {
        self.entries.borrow().get(&id).and_then(Weak::upgrade)
    }

    /// Record the API built for a controller, dropping dead entries.
    pub fn insert(&self, id: BladeId, api: &Rc<dyn AnyBladeApi>) {
        let mut entries = self.entries.borrow_mut();
        entries.retain(|_, w| w.strong_count() > 0);
        entries.insert(id, Rc::downgrade(api));
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.entries
            .borrow()
            .values()
            .filter(|w| w.strong_count() > 0)
            .count()
    }

    /// True if no entry is live.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        api::BladeApi,
        blade::{Blade, BladeController},
        controllers::SeparatorBody,
        plugins::PluginPool,
        scheduler::Scheduler,
        view_props::ViewProps,
    };

    #[test]
    fn entries_are_weak() {
        let cache = BladeApiCache::default();
        let pool = PluginPool::new(Scheduler::new());
        let bc = BladeController::new(Blade::create(), ViewProps::default(), SeparatorBody);
        let api: Rc<dyn AnyBladeApi> = Rc::new(BladeApi::new(bc.clone(), pool));
        cache.insert(bc.id(), &api);
        assert!(Rc::ptr_eq(&cache.get(bc.id()).unwrap(), &api));
        assert_eq!(cache.len(), 1);
        drop(api);
        assert!(cache.get(bc.id()).is_none());
        assert!(cache.is_empty());
    }
}
