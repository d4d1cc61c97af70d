//! The APIs of tabs and tab pages.

use std::rc::Rc;

use super::{
    BladeApi,
    blade::blade_api,
    container::Container,
    event::{ApiEvent, forward_rack_changes},
};
use crate::{
    blade::BladeRef,
    controllers::{Tab, TabBody, TabPageBody},
    emitter::{Emitter, Subscriptions},
    error::{Error, Result},
    plugins::PluginPool,
    rack::Rack,
    value::{ComplexValue, Value, ValueEvent, ValueEventName},
};

/// Host-facing handle to a tab.
pub struct TabApi {
    /// Generic part.
    blade: BladeApi,
    /// Selection model.
    tab: Rc<Tab>,
    /// Pages.
    pages: Rack,
    /// `select` events and bubbled value changes.
    emitter: Emitter<ApiEvent>,
    /// Listeners on the body.
    _subs: Subscriptions,
}

blade_api!(TabApi);

impl TabApi {
    /// Wrap a tab controller. `None` for other blades.
    pub fn new(controller: BladeRef, pool: Rc<PluginPool>) -> Option<Self> {
        let body = controller.body_as::<TabBody>()?;
        let tab = body.tab().clone();
        let pages = body.pages().clone();
        let emitter = Emitter::new();
        let subs = Subscriptions::new();
        let weak = emitter.downgrade();
        subs.push(
            tab.props()
                .selected_index
                .emitter()
                .on(ValueEventName::Change, move |ev| {
                    if let (Some(emitter), ValueEvent::Change(c)) = (weak.upgrade(), ev)
                        && let Some(index) = c.raw_value
                    {
                        emitter.emit(&ApiEvent::Select { index });
                    }
                }),
        );
        subs.push(forward_rack_changes(&pages, &emitter));
        Some(Self {
            blade: BladeApi::new(controller, pool),
            tab,
            pages,
            emitter,
            _subs: subs,
        })
    }

    /// `select`, `change` and `internal-change` events.
    pub fn emitter(&self) -> &Emitter<ApiEvent> {
        &self.emitter
    }

    /// The page APIs, in order.
    pub fn pages(&self) -> Vec<Rc<TabPageApi>> {
        self.pages
            .children()
            .iter()
            .filter_map(|p| {
                self.pool()
                    .create_api(p)
                    .into_any()
                    .downcast::<TabPageApi>()
                    .ok()
            })
            .collect()
    }

    /// Insert a page at `index`, or append it.
    pub fn add_page(
        &self,
        title: impl Into<String>,
        index: Option<usize>,
    ) -> Result<Rc<TabPageApi>> {
        self.ensure_live()?;
        let at = self.pages.add(TabPageBody::create(title), index);
        self.pages()
            .into_iter()
            .nth(at)
            .ok_or(Error::ShouldNeverHappen)
    }

    /// Detach and dispose the page at `index`. Returns false for an
    /// unknown index.
    pub fn remove_page(&self, index: usize) -> Result<bool> {
        self.ensure_live()?;
        match self.pages.children().get(index) {
            Some(page) => {
                page.dispose()?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Index of the selected page. `None` while there are no pages.
    pub fn selected_index(&self) -> Option<usize> {
        self.tab.props().selected_index.raw_value()
    }

    /// Select a page. Returns false for an unknown index.
    pub fn select(&self, index: usize) -> Result<bool> {
        self.ensure_live()?;
        Ok(self.tab.select(index))
    }
}

/// Host-facing handle to a tab page.
pub struct TabPageApi {
    /// Generic part.
    blade: BladeApi,
    /// Caption.
    title: Rc<ComplexValue<String>>,
    /// Selection flag.
    selected: Rc<ComplexValue<bool>>,
    /// Children.
    rack: Rack,
    /// Bubbled value changes.
    emitter: Emitter<ApiEvent>,
    /// Listener on the children.
    _subs: Subscriptions,
}

blade_api!(TabPageApi);

impl TabPageApi {
    /// Wrap a tab page controller. `None` for other blades.
    pub fn new(controller: BladeRef, pool: Rc<PluginPool>) -> Option<Self> {
        let body = controller.body_as::<TabPageBody>()?;
        let title = body.props().title.clone();
        let selected = body.props().selected.clone();
        let rack = body.children().clone();
        let emitter = Emitter::new();
        let subs = Subscriptions::new();
        subs.push(forward_rack_changes(&rack, &emitter));
        Some(Self {
            blade: BladeApi::new(controller, pool),
            title,
            selected,
            rack,
            emitter,
            _subs: subs,
        })
    }

    /// `change` and `internal-change` events.
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

    /// True for the shown page.
    pub fn selected(&self) -> bool {
        self.selected.raw_value()
    }

    /// Show this page. The other pages of the tab are deselected.
    pub fn select(&self) -> Result<()> {
        self.ensure_live()?;
        self.selected.set(true);
        Ok(())
    }
}

impl Container for TabPageApi {
    fn rack(&self) -> &Rack {
        &self.rack
    }

    fn pool(&self) -> &Rc<PluginPool> {
        self.blade.pool()
    }
}
