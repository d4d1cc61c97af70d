//! Button blades.

use std::{any::Any, rc::Rc, result::Result as StdResult};

use serde::Deserialize;
use serde_json::Value as JsonValue;

use super::label::LabelProps;
use crate::{
    blade::BladeBody,
    emitter::{Emitter, Event},
    error::{ParseError, Result},
    state::{BladeState, merge_state, parse_record},
    value::{ComplexValue, Value},
    view_props::ViewProps,
};

/// Raised when a button is clicked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClickEvent;

/// Event names for [`ClickEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClickEventName {
    /// A click.
    Click,
}

impl Event for ClickEvent {
    type Name = ClickEventName;

    fn name(&self) -> ClickEventName {
        ClickEventName::Click
    }
}

/// Button fields accepted on import.
#[derive(Debug, Deserialize)]
struct ButtonState {
    /// Caption.
    title: String,
}

/// The body of a button blade.
pub struct ButtonBody {
    /// Caption.
    title: Rc<ComplexValue<String>>,
    /// Label beside the button.
    label: LabelProps,
    /// Click events.
    emitter: Emitter<ClickEvent>,
    /// View state.
    view_props: ViewProps,
}

impl ButtonBody {
    /// Construct a button body.
    pub fn new(title: impl Into<String>, label: Option<String>, view_props: ViewProps) -> Self {
        Self {
            title: Rc::new(ComplexValue::new(title.into())),
            label: LabelProps::new(label),
            emitter: Emitter::new(),
            view_props,
        }
    }

    /// Caption.
    pub fn title(&self) -> &Rc<ComplexValue<String>> {
        &self.title
    }

    /// Label state.
    pub fn label(&self) -> &LabelProps {
        &self.label
    }

    /// Click events.
    pub fn emitter(&self) -> &Emitter<ClickEvent> {
        &self.emitter
    }

    /// Click the button. Returns false if it is disabled.
    pub fn click(&self) -> bool {
        if self.view_props.is_globally_disabled() {
            return false;
        }
        self.emitter.emit(&ClickEvent);
        true
    }
}

impl BladeBody for ButtonBody {
    fn validate_state(&self, state: &BladeState) -> StdResult<(), ParseError> {
        LabelProps::validate_state(state)?;
        parse_record::<ButtonState>(state).map(|_| ())
    }

    fn apply_state(&self, state: &BladeState) -> Result<()> {
        self.label.import_state(state)?;
        let s: ButtonState = parse_record(state)?;
        self.title.set(s.title);
        Ok(())
    }

    fn export_state(&self) -> BladeState {
        let mut own = BladeState::new();
        own.insert("title".into(), JsonValue::String(self.title.raw_value()));
        merge_state([own, self.label.export_state()])
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
