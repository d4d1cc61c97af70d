//! Tab blades and their pages.
//!
//! A [`Tab`] keeps exactly one page selected while it has any pages.
//! Selecting a page deselects the others; deselecting the only selected
//! page, or removing it, moves the selection to the first page.

use std::{
    any::Any,
    cell::RefCell,
    rc::{Rc, Weak},
    result::Result as StdResult,
};

use serde::Deserialize;
use serde_json::{Value as JsonValue, json};

use crate::{
    blade::{Blade, BladeBody, BladeController, BladeRef},
    emitter::{Subscription, Subscriptions},
    error::{ParseError, Result},
    rack::{Rack, RackEvent, RackEventName},
    state::{BladeState, parse_record, record},
    value::{ComplexValue, Value, ValueEvent, ValueEventName},
    view_props::ViewProps,
};

crate::value_map! {
    /// Selection summary of a tab.
    pub struct TabProps: TabKey {
        /// True when there are no pages.
        empty => Empty: bool,
        /// Index of the selected page.
        selected_index => SelectedIndex: Option<usize>,
    }
}

/// A page's selection flag and the listener the tab holds on it.
struct TabItem {
    /// The flag.
    selected: Rc<ComplexValue<bool>>,
    /// Listener on the flag.
    _sub: Subscription,
}

/// The selection model of a tab.
pub struct Tab {
    /// Selection summary.
    props: TabProps,
    /// Page flags, in page order.
    items: RefCell<Vec<TabItem>>,
}

impl Tab {
    /// An empty tab.
    pub fn new() -> Rc<Self> {
        Rc::new(Self {
            props: TabProps::new(true, None),
            items: RefCell::new(vec![]),
        })
    }

    /// Selection summary.
    pub fn props(&self) -> &TabProps {
        &self.props
    }

    /// Number of pages.
    pub fn len(&self) -> usize {
        self.items.borrow().len()
    }

    /// True when there are no pages.
    pub fn is_empty(&self) -> bool {
        self.items.borrow().is_empty()
    }

    /// Track a page's selection flag at `index`.
    pub fn add(self: &Rc<Self>, selected: Rc<ComplexValue<bool>>, index: usize) {
        let weak_tab = Rc::downgrade(self);
        let weak_item = Rc::downgrade(&selected);
        let sub = selected.emitter().on(ValueEventName::Change, move |ev| {
            if let (Some(tab), Some(item), ValueEvent::Change(c)) =
                (weak_tab.upgrade(), weak_item.upgrade(), ev)
            {
                tab.on_item_selected_change(&item, c.raw_value);
            }
        });
        {
            let mut items = self.items.borrow_mut();
            let at = index.min(items.len());
            items.insert(at, TabItem { selected, _sub: sub });
        }
        self.keep_selection();
    }

    /// Stop tracking a page's selection flag.
    pub fn remove(&self, selected: &Rc<ComplexValue<bool>>) {
        let removed = {
            let mut items = self.items.borrow_mut();
            items
                .iter()
                .position(|i| Rc::ptr_eq(&i.selected, selected))
                .map(|i| items.remove(i))
        };
        if removed.is_some() {
            self.keep_selection();
        }
    }

    /// Select a page by index. Returns false for an unknown index.
    pub fn select(&self, index: usize) -> bool {
        match self.flags().get(index) {
            Some(f) => {
                f.set(true);
                true
            }
            None => false,
        }
    }

    /// A snapshot of the page flags.
    fn flags(&self) -> Vec<Rc<ComplexValue<bool>>> {
        self.items
            .borrow()
            .iter()
            .map(|i| i.selected.clone())
            .collect()
    }

    /// React to a page flag flipping.
    fn on_item_selected_change(&self, item: &Rc<ComplexValue<bool>>, selected: bool) {
        if !selected {
            self.keep_selection();
            return;
        }
        let flags = self.flags();
        let Some(index) = flags.iter().position(|f| Rc::ptr_eq(f, item)) else {
            return;
        };
        for (i, f) in flags.iter().enumerate() {
            f.set(i == index);
        }
        self.props.selected_index.set(Some(index));
    }

    /// Restore the one-selected-page invariant.
    fn keep_selection(&self) {
        let flags = self.flags();
        if flags.is_empty() {
            self.props.selected_index.set(None);
            self.props.empty.set(true);
            return;
        }
        let index = flags.iter().position(|f| f.raw_value()).unwrap_or(0);
        for (i, f) in flags.iter().enumerate() {
            f.set(i == index);
        }
        self.props.selected_index.set(Some(index));
        self.props.empty.set(false);
    }
}

crate::value_map! {
    /// State of a tab page.
    pub struct TabPageProps: TabPageKey {
        /// True for the shown page.
        selected => Selected: bool,
        /// Caption.
        title => Title: String,
    }
}

/// Tab page fields accepted on import.
#[derive(Debug, Deserialize)]
struct TabPageState {
    /// Selection flag.
    selected: bool,
    /// Caption.
    title: String,
    /// One record per child, in render order.
    children: Vec<BladeState>,
}

/// The body of a tab page: a titled container.
pub struct TabPageBody {
    /// Page state.
    props: TabPageProps,
    /// Children.
    rack: Rack,
}

impl TabPageBody {
    /// Construct a page body. Children cascade from `view_props`, which
    /// must be the page controller's own.
    pub fn new(title: impl Into<String>, view_props: &ViewProps) -> Self {
        Self {
            props: TabPageProps::new(false, title.into()),
            rack: Rack::new(view_props.clone()),
        }
    }

    /// A page controller.
    pub fn create(title: impl Into<String>) -> BladeRef {
        let vp = ViewProps::default();
        let body = Self::new(title, &vp);
        BladeController::new(Blade::create(), vp, body)
    }

    /// Page state.
    pub fn props(&self) -> &TabPageProps {
        &self.props
    }

    /// Children.
    pub fn children(&self) -> &Rack {
        &self.rack
    }
}

impl BladeBody for TabPageBody {
    fn validate_state(&self, state: &BladeState) -> StdResult<(), ParseError> {
        parse_record::<TabPageState>(state).map(|_| ())
    }

    fn apply_state(&self, state: &BladeState) -> Result<()> {
        let s: TabPageState = parse_record(state)?;
        self.props.title.set(s.title);
        self.props.selected.set(s.selected);
        self.rack.import_children(&s.children)
    }

    fn export_state(&self) -> BladeState {
        record(json!({
            "selected": self.props.selected.raw_value(),
            "title": self.props.title.raw_value(),
            "children": JsonValue::Array(self.rack.export_children()),
        }))
    }

    fn rack(&self) -> Option<&Rack> {
        Some(&self.rack)
    }

    fn refresh(&self) {
        self.rack.refresh_children();
    }

    fn dispose(&self) {
        self.rack.dispose_children();
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Tab fields accepted on import.
#[derive(Debug, Deserialize)]
struct TabState {
    /// One record per page, in page order.
    pages: Vec<BladeState>,
}

/// The body of a tab blade. Its rack holds the pages.
pub struct TabBody {
    /// Selection model.
    tab: Rc<Tab>,
    /// Pages.
    rack: Rack,
    /// Listeners on the page rack.
    subs: Subscriptions,
}

impl TabBody {
    /// Construct a tab body. Pages cascade from `view_props`, which must be
    /// the tab controller's own.
    pub fn new(view_props: &ViewProps) -> Self {
        let tab = Tab::new();
        let rack = Rack::new(view_props.clone());
        let subs = Subscriptions::new();
        let weak: Weak<Tab> = Rc::downgrade(&tab);
        subs.push(rack.emitter().on(RackEventName::Add, move |ev| {
            if let (Some(tab), RackEvent::Add { blade, index, root: true }) = (weak.upgrade(), ev)
                && let Some(page) = blade.body_as::<TabPageBody>()
            {
                tab.add(page.props.selected.clone(), *index);
            }
        }));
        let weak: Weak<Tab> = Rc::downgrade(&tab);
        subs.push(rack.emitter().on(RackEventName::Remove, move |ev| {
            if let (Some(tab), RackEvent::Remove { blade, root: true }) = (weak.upgrade(), ev)
                && let Some(page) = blade.body_as::<TabPageBody>()
            {
                tab.remove(&page.props.selected);
            }
        }));
        Self { tab, rack, subs }
    }

    /// Selection model.
    pub fn tab(&self) -> &Rc<Tab> {
        &self.tab
    }

    /// Pages.
    pub fn pages(&self) -> &Rack {
        &self.rack
    }
}

impl BladeBody for TabBody {
    fn validate_state(&self, state: &BladeState) -> StdResult<(), ParseError> {
        parse_record::<TabState>(state).map(|_| ())
    }

    fn apply_state(&self, state: &BladeState) -> Result<()> {
        let s: TabState = parse_record(state)?;
        self.rack.import_children(&s.pages)
    }

    fn export_state(&self) -> BladeState {
        record(json!({"pages": JsonValue::Array(self.rack.export_children())}))
    }

    fn rack(&self) -> Option<&Rack> {
        Some(&self.rack)
    }

    fn refresh(&self) {
        self.rack.refresh_children();
    }

    fn dispose(&self) {
        self.rack.dispose_children();
        self.subs.release_all();
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A tab controller.
    fn tab() -> BladeRef {
        let vp = ViewProps::default();
        let body = TabBody::new(&vp);
        BladeController::new(Blade::create(), vp, body)
    }

    /// Selection flags of every page.
    fn selection(tab: &BladeRef) -> Vec<bool> {
        tab.rack()
            .unwrap()
            .children()
            .iter()
            .map(|p| p.body_as::<TabPageBody>().unwrap().props().selected.raw_value())
            .collect()
    }

    #[test]
    fn first_page_is_selected() {
        let t = tab();
        let model = t.body_as::<TabBody>().unwrap().tab().clone();
        assert!(model.props().empty.raw_value());
        t.rack().unwrap().add(TabPageBody::create("a"), None);
        t.rack().unwrap().add(TabPageBody::create("b"), None);
        assert_eq!(selection(&t), vec![true, false]);
        assert_eq!(model.props().selected_index.raw_value(), Some(0));
        assert!(!model.props().empty.raw_value());
    }

    #[test]
    fn selecting_deselects_others() {
        let t = tab();
        let model = t.body_as::<TabBody>().unwrap().tab().clone();
        for title in ["a", "b", "c"] {
            t.rack().unwrap().add(TabPageBody::create(title), None);
        }
        assert!(model.select(2));
        assert_eq!(selection(&t), vec![false, false, true]);
        assert_eq!(model.props().selected_index.raw_value(), Some(2));
        let pages = t.rack().unwrap().children();
        pages[2]
            .body_as::<TabPageBody>()
            .unwrap()
            .props()
            .selected
            .set(false);
        assert_eq!(selection(&t), vec![true, false, false]);
    }

    #[test]
    fn removing_selected_moves_selection() {
        let t = tab();
        let model = t.body_as::<TabBody>().unwrap().tab().clone();
        for title in ["a", "b"] {
            t.rack().unwrap().add(TabPageBody::create(title), None);
        }
        model.select(1);
        let pages = t.rack().unwrap().children();
        t.rack().unwrap().remove(&pages[1]);
        assert_eq!(selection(&t), vec![true]);
        t.rack().unwrap().remove(&pages[0]);
        assert_eq!(model.props().selected_index.raw_value(), None);
        assert!(model.props().empty.raw_value());
    }

    #[test]
    fn state_round_trip() {
        let t = tab();
        t.rack().unwrap().add(TabPageBody::create("a"), None);
        t.rack().unwrap().add(TabPageBody::create("b"), None);
        t.body_as::<TabBody>().unwrap().tab().select(1);
        let s = t.export_state().unwrap();
        assert_eq!(
            s["pages"],
            json!([
                {"disabled": false, "hidden": false, "selected": false, "title": "a", "children": []},
                {"disabled": false, "hidden": false, "selected": true, "title": "b", "children": []},
            ])
        );
        t.body_as::<TabBody>().unwrap().tab().select(0);
        t.import_state(&s).unwrap();
        assert_eq!(selection(&t), vec![false, true]);
    }
}
