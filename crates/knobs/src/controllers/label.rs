use std::result::Result as StdResult;

use serde::Deserialize;
use serde_json::Value as JsonValue;

use crate::{
    error::ParseError,
    state::{BladeState, parse_record},
    value::Value,
};

crate::value_map! {
    /// Label state of a value blade.
    pub struct LabelProps: LabelKey {
        /// Label text. `None` renders no label.
        label => Label: Option<String>,
    }
}

/// Label fields accepted on import.
#[derive(Debug, Deserialize)]
struct LabelState {
    /// Label text.
    label: Option<String>,
}

impl LabelProps {
    /// Export the label, when there is one.
    pub fn export_state(&self) -> BladeState {
        let mut s = BladeState::new();
        if let Some(l) = self.label.raw_value() {
            s.insert("label".into(), JsonValue::String(l));
        }
        s
    }

    /// Check the label field.
    pub fn validate_state(state: &BladeState) -> StdResult<(), ParseError> {
        parse_record::<LabelState>(state).map(|_| ())
    }

    /// Apply the label field, when present.
    pub fn import_state(&self, state: &BladeState) -> StdResult<(), ParseError> {
        let s: LabelState = parse_record(state)?;
        if let Some(l) = s.label {
            self.label.set(Some(l));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::state::record;

    #[test]
    fn absent_label_is_not_exported() {
        let p = LabelProps::new(None);
        assert!(p.export_state().is_empty());
        p.import_state(&record(json!({"label": "speed"}))).unwrap();
        assert_eq!(p.export_state(), record(json!({"label": "speed"})));
        assert!(LabelProps::validate_state(&record(json!({"label": 3}))).is_err());
    }
}
