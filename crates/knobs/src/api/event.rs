//! Events raised by API objects.

use serde_json::Value as JsonValue;
use tracing::warn;

use crate::{
    blade::BladeRef,
    emitter::{Emitter, Event, Subscription},
    rack::{Rack, RackEvent, RackEventName},
    value::ValueChangeOptions,
};

/// A blade value changed.
#[derive(Debug, Clone)]
pub struct ChangeEvent {
    /// The blade.
    pub controller: BladeRef,
    /// The bound key. `None` for value blades, which bind nothing.
    pub key: Option<String>,
    /// The externally visible value after the change.
    pub value: JsonValue,
    /// False while an interaction is still in progress.
    pub last: bool,
}

impl ChangeEvent {
    /// Describe a value change of a blade. `None` for blades without a
    /// value, or when the bound object can no longer be read.
    pub fn of(controller: &BladeRef, options: ValueChangeOptions) -> Option<Self> {
        let (key, value) = controller.body().change_value()?;
        match value {
            Ok(value) => Some(Self {
                controller: controller.clone(),
                key: key.map(str::to_string),
                value,
                last: options.last,
            }),
            Err(e) => {
                warn!(key = key.unwrap_or_default(), error = %e, "change read failed");
                None
            }
        }
    }
}

/// Events raised by API objects.
#[derive(Debug, Clone)]
pub enum ApiEvent {
    /// A bound value changed, from any source.
    Change(ChangeEvent),
    /// A bound value was changed through a controller.
    InternalChange(ChangeEvent),
    /// A folder was folded or unfolded.
    Fold {
        /// The new fold state.
        expanded: bool,
    },
    /// A tab page was selected.
    Select {
        /// Index of the selected page.
        index: usize,
    },
    /// A button was clicked.
    Click,
}

/// Names of [`ApiEvent`] variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiEventName {
    /// See [`ApiEvent::Change`].
    Change,
    /// See [`ApiEvent::InternalChange`].
    InternalChange,
    /// See [`ApiEvent::Fold`].
    Fold,
    /// See [`ApiEvent::Select`].
    Select,
    /// See [`ApiEvent::Click`].
    Click,
}

impl Event for ApiEvent {
    type Name = ApiEventName;

    fn name(&self) -> ApiEventName {
        match self {
            Self::Change(_) => ApiEventName::Change,
            Self::InternalChange(_) => ApiEventName::InternalChange,
            Self::Fold { .. } => ApiEventName::Fold,
            Self::Select { .. } => ApiEventName::Select,
            Self::Click => ApiEventName::Click,
        }
    }
}

/// Emit `change`, and `internal-change` for internal changes.
pub(super) fn emit_change(
    emitter: &Emitter<ApiEvent>,
    controller: &BladeRef,
    options: ValueChangeOptions,
    internal: bool,
) {
    let Some(ev) = ChangeEvent::of(controller, options) else {
        return;
    };
    emitter.emit(&ApiEvent::Change(ev.clone()));
    if internal {
        emitter.emit(&ApiEvent::InternalChange(ev));
    }
}

/// Re-raise value changes of every descendant of a rack.
pub(super) fn forward_rack_changes(rack: &Rack, emitter: &Emitter<ApiEvent>) -> Subscription {
    let emitter = emitter.downgrade();
    rack.emitter().on(RackEventName::ValueChange, move |ev| {
        if let (
            Some(emitter),
            RackEvent::ValueChange {
                blade,
                options,
                internal,
            },
        ) = (emitter.upgrade(), ev)
        {
            emit_change(&emitter, blade, *options, *internal);
        }
    })
}
