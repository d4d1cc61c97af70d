//! The API of folders.

use std::rc::Rc;

use super::{
    BladeApi,
    blade::blade_api,
    container::Container,
    event::{ApiEvent, forward_rack_changes},
};
use crate::{
    blade::BladeRef,
    controllers::FolderBody,
    emitter::{Emitter, Subscriptions},
    error::Result,
    plugins::PluginPool,
    rack::Rack,
    value::{ComplexValue, Value, ValueEvent, ValueEventName},
};

/// The parts of a folder body its API holds on to.
pub(super) struct FolderParts {
    /// Caption.
    title: Rc<ComplexValue<String>>,
    /// Fold state.
    expanded: Rc<ComplexValue<bool>>,
    /// Children.
    rack: Rack,
}

impl FolderParts {
    /// Collect the parts of a body.
    pub(super) fn of(body: &FolderBody) -> Self {
        Self {
            title: body.title().clone(),
            expanded: body.foldable().expanded.clone(),
            rack: body.children().clone(),
        }
    }
}

/// Host-facing handle to a folder.
///
/// Value changes of every descendant binding are re-raised here as
/// `change` and `internal-change` events.
pub struct FolderApi {
    /// Generic part.
    blade: BladeApi,
    /// Caption.
    title: Rc<ComplexValue<String>>,
    /// Fold state.
    expanded: Rc<ComplexValue<bool>>,
    /// Children.
    rack: Rack,
    /// `fold` events and bubbled value changes.
    emitter: Emitter<ApiEvent>,
    /// Listeners on the body.
    _subs: Subscriptions,
}

blade_api!(FolderApi);

impl FolderApi {
    /// Wrap a folder controller. `None` for other blades.
    pub fn new(controller: BladeRef, pool: Rc<PluginPool>) -> Option<Self> {
        let parts = FolderParts::of(controller.body_as::<FolderBody>()?);
        Some(Self::with_parts(controller, pool, parts))
    }

    /// Wrap a folder controller whose parts were already collected.
    pub(super) fn with_parts(
        controller: BladeRef,
        pool: Rc<PluginPool>,
        parts: FolderParts,
    ) -> Self {
        let FolderParts {
            title,
            expanded,
            rack,
        } = parts;
        let emitter = Emitter::new();
        let subs = Subscriptions::new();
        let weak = emitter.downgrade();
        subs.push(expanded.emitter().on(ValueEventName::Change, move |ev| {
            if let (Some(emitter), ValueEvent::Change(c)) = (weak.upgrade(), ev) {
                emitter.emit(&ApiEvent::Fold {
                    expanded: c.raw_value,
                });
            }
        }));
        subs.push(forward_rack_changes(&rack, &emitter));
        Self {
            blade: BladeApi::new(controller, pool),
            title,
            expanded,
            rack,
            emitter,
            _subs: subs,
        }
    }

    /// `fold`, `change` and `internal-change` events.
    pub fn emitter(&self) -> &Emitter<ApiEvent> {
        &self.emitter
    }

    /// Caption.
    pub fn title(&self) -> String {
        self.title.raw_value()
    }

    /// Replace the caption.
    pub fn set_title(&self, title: impl Into<String>) -> Result<()> {
        self.ensure_live()?;
        self.title.set(title.into());
        Ok(())
    }

    /// True while children are shown.
    pub fn expanded(&self) -> bool {
        self.expanded.raw_value()
    }

    /// Fold or unfold.
    pub fn set_expanded(&self, expanded: bool) -> Result<()> {
        self.ensure_live()?;
        self.expanded.set(expanded);
        Ok(())
    }
}

impl Container for FolderApi {
    fn rack(&self) -> &Rack {
        &self.rack
    }

    fn pool(&self) -> &Rc<PluginPool> {
        self.blade.pool()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use serde_json::json;

    use super::*;
    use crate::{
        api::{AnyBladeApi, event::ApiEventName},
        binding::{BindableRef, bindable},
        scheduler::Scheduler,
        state::record,
    };

    /// A folder and its API.
    fn folder(pool: &Rc<PluginPool>) -> Rc<FolderApi> {
        let bc = pool
            .create_blade(&record(json!({"view": "folder", "title": "F"})))
            .unwrap();
        pool.create_api(&bc)
            .into_any()
            .downcast::<FolderApi>()
            .unwrap()
    }

    #[test]
    fn fold_events() {
        let pool = PluginPool::with_defaults(Scheduler::new());
        let api = folder(&pool);
        let seen = Rc::new(RefCell::new(vec![]));
        let s = seen.clone();
        let _sub = api.emitter().on(ApiEventName::Fold, move |ev| {
            if let ApiEvent::Fold { expanded } = ev {
                s.borrow_mut().push(*expanded);
            }
        });
        assert!(api.expanded());
        api.set_expanded(false).unwrap();
        api.set_expanded(false).unwrap();
        api.set_expanded(true).unwrap();
        assert_eq!(*seen.borrow(), vec![false, true]);
    }

    #[test]
    fn nested_changes_bubble() {
        let pool = PluginPool::with_defaults(Scheduler::new());
        let outer = folder(&pool);
        let inner = outer
            .add_folder(&record(json!({"title": "inner"})))
            .unwrap();
        let obj: BindableRef = bindable(json!({"x": 1}));
        let binding = inner.add_binding(&obj, "x", &record(json!({}))).unwrap();

        let keys = Rc::new(RefCell::new(vec![]));
        let k = keys.clone();
        let _sub = outer.emitter().on(ApiEventName::Change, move |ev| {
            if let ApiEvent::Change(c) = ev {
                k.borrow_mut().push((c.key.clone(), c.value.clone()));
            }
        });
        obj.borrow_mut().write_property("x", json!(2)).unwrap();
        binding.refresh().unwrap();
        assert_eq!(*keys.borrow(), vec![(Some("x".to_string()), json!(2))]);
    }
}
