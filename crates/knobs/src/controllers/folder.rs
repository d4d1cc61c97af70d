//! Folder blades: a titled, collapsible container.

use std::{any::Any, rc::Rc, result::Result as StdResult};

use serde::Deserialize;
use serde_json::{Value as JsonValue, json};

use crate::{
    blade::BladeBody,
    error::{ParseError, Result},
    rack::Rack,
    state::{BladeState, parse_record, record},
    value::{ComplexValue, Value},
    view_props::ViewProps,
};

crate::value_map! {
    /// Fold state of a collapsible container.
    pub struct Foldable: FoldableKey {
        /// True while children are shown.
        expanded => Expanded: bool,
    }
}

/// Folder fields accepted on import.
#[derive(Debug, Deserialize)]
struct FolderState {
    /// Fold state.
    expanded: bool,
    /// Caption.
    title: Option<String>,
    /// One record per child, in render order.
    children: Vec<BladeState>,
}

/// The body of a folder blade.
pub struct FolderBody {
    /// Caption.
    title: Rc<ComplexValue<String>>,
    /// Fold state.
    foldable: Foldable,
    /// Children.
    rack: Rack,
}

impl FolderBody {
    /// Construct a folder body. Children cascade from `view_props`, which
    /// must be the folder controller's own.
    pub fn new(title: impl Into<String>, expanded: bool, view_props: &ViewProps) -> Self {
        Self {
            title: Rc::new(ComplexValue::new(title.into())),
            foldable: Foldable::new(expanded),
            rack: Rack::new(view_props.clone()),
        }
    }

    /// Caption.
    pub fn title(&self) -> &Rc<ComplexValue<String>> {
        &self.title
    }

    /// Fold state.
    pub fn foldable(&self) -> &Foldable {
        &self.foldable
    }

    /// Children.
    pub fn children(&self) -> &Rack {
        &self.rack
    }

    /// Flip the fold state.
    pub fn toggle(&self) {
        self.foldable
            .expanded
            .set(!self.foldable.expanded.raw_value());
    }
}

impl BladeBody for FolderBody {
    fn validate_state(&self, state: &BladeState) -> StdResult<(), ParseError> {
        parse_record::<FolderState>(state).map(|_| ())
    }

    fn apply_state(&self, state: &BladeState) -> Result<()> {
        let s: FolderState = parse_record(state)?;
        if let Some(title) = s.title {
            self.title.set(title);
        }
        self.foldable.expanded.set(s.expanded);
        self.rack.import_children(&s.children)
    }

    fn export_state(&self) -> BladeState {
        record(json!({
            "title": self.title.raw_value(),
            "expanded": self.foldable.expanded.raw_value(),
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
