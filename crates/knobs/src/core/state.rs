//! Exported controller state and its permissive parser.
//!
//! A state object is a flat JSON record. Each state layer declares a
//! `Deserialize` schema: unknown fields are ignored, missing optional fields
//! default, and a wrongly typed or missing required field rejects the whole
//! record.

use std::sync::LazyLock;

use regex::Regex;
use serde::de::DeserializeOwned;
use serde_json::{Map as JsonMap, Value as JsonValue};

use super::error::ParseError;

/// An exported state record.
pub type BladeState = JsonMap<String, JsonValue>;

/// Matches serde's "missing field" message.
static MISSING_FIELD: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"missing field `([^`]+)`").ok());

/// Extract the field name from a serde "missing field" message.
fn missing_field(message: &str) -> Option<String> {
    MISSING_FIELD
        .as_ref()?
        .captures(message)
        .map(|c| c[1].to_string())
}

/// Parse a record against a schema, identifying the offending field on
/// failure.
pub fn parse_record<S: DeserializeOwned>(record: &BladeState) -> Result<S, ParseError> {
    let err = match serde_json::from_value::<S>(JsonValue::Object(record.clone())) {
        Ok(s) => return Ok(s),
        Err(e) => e.to_string(),
    };
    // Probe each field on its own. Only a type failure on the probed field
    // survives; missing siblings are reported as "missing field".
    for (k, v) in record {
        let mut single = JsonMap::new();
        single.insert(k.clone(), v.clone());
        if let Err(e) = serde_json::from_value::<S>(JsonValue::Object(single)) {
            let msg = e.to_string();
            if missing_field(&msg).is_none() {
                return Err(ParseError::with_field(k.clone(), msg));
            }
        }
    }
    match missing_field(&err) {
        Some(field) => Err(ParseError::with_field(field, err)),
        None => Err(ParseError::new(err)),
    }
}

/// Merge state layers, base first. Later layers override earlier keys.
pub fn merge_state(layers: impl IntoIterator<Item = BladeState>) -> BladeState {
    let mut out = BladeState::new();
    for layer in layers {
        out.extend(layer);
    }
    out
}

/// Shorthand for building a state record from a `json!` object literal.
/// Non-object values produce an empty record.
pub fn record(value: JsonValue) -> BladeState {
    match value {
        JsonValue::Object(m) => m,
        _ => BladeState::new(),
    }
}
