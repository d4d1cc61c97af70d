//! Conversions between bound JSON properties and internal values.
//!
//! Readers are lenient: a property of the wrong shape reads as a neutral
//! value rather than failing, so a host mutating its object cannot break a
//! binding.

use serde_json::{Number, Value as JsonValue};

use crate::{binding::BindingTarget, error::Result};

/// Names of point axes, in order.
pub const POINT_AXES: [&str; 4] = ["x", "y", "z", "w"];

/// Read a number. Numeric strings are parsed; anything else reads as zero.
pub fn number_from_json(v: &JsonValue) -> f64 {
    match v {
        JsonValue::Number(n) => n.as_f64().unwrap_or_default(),
        JsonValue::String(s) => s.trim().parse().unwrap_or_default(),
        _ => 0.0,
    }
}

/// Encode a number. Integral values encode as integers; non-finite values
/// encode as null.
pub fn number_to_json(v: f64) -> JsonValue {
    if v.fract() == 0.0 && v.abs() < 9.0e15 {
        JsonValue::from(v as i64)
    } else {
        Number::from_f64(v).map_or(JsonValue::Null, JsonValue::Number)
    }
}

/// Read a string. Non-strings read as their JSON text.
pub fn string_from_json(v: &JsonValue) -> String {
    match v {
        JsonValue::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Read a boolean by truthiness. The string `"false"` reads as false.
pub fn bool_from_json(v: &JsonValue) -> bool {
    match v {
        JsonValue::Null => false,
        JsonValue::Bool(b) => *b,
        JsonValue::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        JsonValue::String(s) => !s.is_empty() && s != "false",
        JsonValue::Array(_) | JsonValue::Object(_) => true,
    }
}

/// Read the first `dimensions` axes of a point record. Missing axes read
/// as zero.
pub fn point_from_json(v: &JsonValue, dimensions: usize) -> Vec<f64> {
    POINT_AXES
        .iter()
        .take(dimensions)
        .map(|k| v.get(*k).map(number_from_json).unwrap_or_default())
        .collect()
}

/// True if `v` is a record with a numeric field for each of the first
/// `dimensions` axes.
pub fn is_point_record(v: &JsonValue, dimensions: usize) -> bool {
    v.is_object()
        && POINT_AXES
            .iter()
            .take(dimensions)
            .all(|k| v.get(*k).is_some_and(JsonValue::is_number))
}

/// Write a number.
pub fn write_number(target: &BindingTarget, v: &f64) -> Result<()> {
    target.write(number_to_json(*v))
}

/// Write each axis of a point into the bound record, leaving its other
/// fields alone.
pub fn write_point(target: &BindingTarget, v: &[f64]) -> Result<()> {
    for (k, c) in POINT_AXES.iter().zip(v) {
        target.write_property(k, number_to_json(*c))?;
    }
    Ok(())
}
