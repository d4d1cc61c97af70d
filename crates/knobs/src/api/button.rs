//! The API of button blades.

use std::rc::Rc;

use super::{BladeApi, blade::blade_api, event::ApiEvent};
use crate::{
    blade::BladeRef,
    controllers::{
        ButtonBody,
        button::{ClickEvent, ClickEventName},
    },
    emitter::{Emitter, Subscription},
    error::{Error, Result},
    plugins::PluginPool,
    value::{ComplexValue, Value},
};

/// Host-facing handle to a button.
pub struct ButtonApi {
    /// Generic part.
    blade: BladeApi,
    /// Caption.
    title: Rc<ComplexValue<String>>,
    /// Label beside the button.
    label: Rc<ComplexValue<Option<String>>>,
    /// `click` events.
    emitter: Emitter<ApiEvent>,
    /// Listener on the body's clicks.
    _sub: Subscription,
}

blade_api!(ButtonApi);

impl ButtonApi {
    /// Wrap a button controller. `None` for other blades.
    pub fn new(controller: BladeRef, pool: Rc<PluginPool>) -> Option<Self> {
        let body = controller.body_as::<ButtonBody>()?;
        let title = body.title().clone();
        let label = body.label().label.clone();
        let emitter = Emitter::new();
        let weak = emitter.downgrade();
        let sub = body.emitter().on(ClickEventName::Click, move |_: &ClickEvent| {
            if let Some(emitter) = weak.upgrade() {
                emitter.emit(&ApiEvent::Click);
            }
        });
        Some(Self {
            blade: BladeApi::new(controller, pool),
            title,
            label,
            emitter,
            _sub: sub,
        })
    }

    /// `click` events.
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

    /// Label beside the button.
    pub fn label(&self) -> Option<String> {
        self.label.raw_value()
    }

    /// Replace the label.
    pub fn set_label(&self, label: Option<String>) -> Result<()> {
        self.ensure_live()?;
        self.label.set(label);
        Ok(())
    }

    /// Click the button as a user would. Returns false while it is
    /// disabled.
    pub fn fire_click(&self) -> Result<bool> {
        self.ensure_live()?;
        let body = self
            .controller()
            .body_as::<ButtonBody>()
            .ok_or(Error::ShouldNeverHappen)?;
        Ok(body.click())
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::Cell, rc::Weak};

    use serde_json::json;

    use super::*;
    use crate::{
        api::{AnyBladeApi, event::ApiEventName},
        scheduler::Scheduler,
        state::record,
    };

    /// A button and its API.
    fn button() -> Rc<ButtonApi> {
        let pool = PluginPool::with_defaults(Scheduler::new());
        let bc = pool
            .create_blade(&record(json!({"view": "button", "title": "Go", "label": "run"})))
            .unwrap();
        pool.create_api(&bc)
            .into_any()
            .downcast::<ButtonApi>()
            .unwrap()
    }

    #[test]
    fn clicks_reach_the_api() {
        let api = button();
        assert_eq!(api.title(), "Go");
        assert_eq!(api.label().as_deref(), Some("run"));
        let n = Rc::new(Cell::new(0));
        let c = n.clone();
        let _sub = api.emitter().on(ApiEventName::Click, move |_| c.set(c.get() + 1));
        assert!(api.fire_click().unwrap());
        api.set_disabled(true).unwrap();
        assert!(!api.fire_click().unwrap());
        assert_eq!(n.get(), 1);
    }

    #[test]
    fn disposed_button_rejects_edits() {
        let api = button();
        let weak: Weak<ButtonApi> = Rc::downgrade(&api);
        api.set_title("Stop").unwrap();
        assert_eq!(api.title(), "Stop");
        api.dispose().unwrap();
        assert_eq!(api.set_title("x"), Err(Error::AlreadyDisposed));
        assert_eq!(api.fire_click(), Err(Error::AlreadyDisposed));
        drop(api);
        assert!(weak.upgrade().is_none());
    }
}
