//! Color values and their controller.
//!
//! Colors are kept as RGB components in `[0, 255]` plus an alpha in
//! `[0, 1]`. Conversions to other color spaces belong to views.

use std::any::Any;

use serde_json::Value as JsonValue;

use super::ValueController;
use crate::{
    value::{Value, ValueRef},
    view_props::ViewProps,
};

/// An RGBA color.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    /// Red, `[0, 255]`.
    pub r: f64,
    /// Green, `[0, 255]`.
    pub g: f64,
    /// Blue, `[0, 255]`.
    pub b: f64,
    /// Alpha, `[0, 1]`.
    pub a: f64,
}

impl Default for Color {
    fn default() -> Self {
        Self::rgba(0.0, 0.0, 0.0, 1.0)
    }
}

impl Color {
    /// A color with every component given. Components are clamped.
    pub fn rgba(r: f64, g: f64, b: f64, a: f64) -> Self {
        let c = |v: f64| if v.is_nan() { 0.0 } else { v.clamp(0.0, 255.0) };
        Self {
            r: c(r),
            g: c(g),
            b: c(b),
            a: if a.is_nan() { 1.0 } else { a.clamp(0.0, 1.0) },
        }
    }

    /// An opaque color.
    pub fn rgb(r: f64, g: f64, b: f64) -> Self {
        Self::rgba(r, g, b, 1.0)
    }

    /// Decode `0xRRGGBB`, or `0xRRGGBBAA` when `alpha` is set.
    pub fn from_int(n: u32, alpha: bool) -> Self {
        let byte = |shift: u32| f64::from((n >> shift) & 0xff);
        if alpha {
            Self::rgba(byte(24), byte(16), byte(8), byte(0) / 255.0)
        } else {
            Self::rgb(byte(16), byte(8), byte(0))
        }
    }

    /// Encode as `0xRRGGBB`, or `0xRRGGBBAA` when `alpha` is set.
    pub fn to_int(&self, alpha: bool) -> u32 {
        let byte = |v: f64| v.round().clamp(0.0, 255.0) as u32;
        let rgb = (byte(self.r) << 16) | (byte(self.g) << 8) | byte(self.b);
        if alpha {
            (rgb << 8) | byte(self.a * 255.0)
        } else {
            rgb
        }
    }

    /// Read a color record with `r`, `g`, `b` and optional `a` fields.
    /// Missing or non-numeric components read as zero, a missing alpha as
    /// opaque.
    pub fn from_json(v: &JsonValue) -> Self {
        let comp = |k: &str| v.get(k).and_then(JsonValue::as_f64);
        Self::rgba(
            comp("r").unwrap_or_default(),
            comp("g").unwrap_or_default(),
            comp("b").unwrap_or_default(),
            comp("a").unwrap_or(1.0),
        )
    }

    /// True if `v` is a record with numeric `r`, `g` and `b` fields.
    pub fn is_color_record(v: &JsonValue) -> bool {
        ["r", "g", "b"]
            .iter()
            .all(|k| v.get(*k).is_some_and(JsonValue::is_number))
    }

    /// Lowercase `#rrggbb`, or `#rrggbbaa` when `alpha` is set.
    pub fn hex(&self, alpha: bool) -> String {
        if alpha {
            format!("#{:08x}", self.to_int(true))
        } else {
            format!("#{:06x}", self.to_int(false))
        }
    }
}

/// Edits a color.
pub struct ColorController {
    /// The edited value.
    value: ValueRef<Color>,
    /// True if alpha is editable.
    alpha: bool,
    /// View state.
    view_props: ViewProps,
}

impl ColorController {
    /// Construct a controller.
    pub fn new(value: ValueRef<Color>, alpha: bool, view_props: ViewProps) -> Self {
        Self {
            value,
            alpha,
            view_props,
        }
    }

    /// The edited value.
    pub fn value(&self) -> &ValueRef<Color> {
        &self.value
    }

    /// True if alpha is editable.
    pub fn supports_alpha(&self) -> bool {
        self.alpha
    }

    /// The current color.
    pub fn color(&self) -> Color {
        self.value.raw_value()
    }

    /// The current color in hex notation.
    pub fn hex(&self) -> String {
        self.color().hex(self.alpha)
    }

    /// Replace the color. Alpha is forced opaque when not editable.
    /// Returns false if the blade is disabled.
    pub fn set_color(&self, color: Color) -> bool {
        if self.view_props.is_globally_disabled() {
            return false;
        }
        let a = if self.alpha { color.a } else { 1.0 };
        self.value.set(Color::rgba(color.r, color.g, color.b, a));
        true
    }
}

impl ValueController for ColorController {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use serde_json::json;

    use super::*;
    use crate::value::ComplexValue;

    #[test]
    fn int_codec() {
        let c = Color::from_int(0xff8000, false);
        assert_eq!(c, Color::rgb(255.0, 128.0, 0.0));
        assert_eq!(c.to_int(false), 0xff8000);
        assert_eq!(c.hex(false), "#ff8000");
        let c = Color::from_int(0x11223380, true);
        assert_eq!(c.to_int(true), 0x11223380);
    }

    #[test]
    fn json_records() {
        let v = json!({"r": 10, "g": 20, "b": 30});
        assert!(Color::is_color_record(&v));
        assert_eq!(Color::from_json(&v), Color::rgb(10.0, 20.0, 30.0));
        assert!(!Color::is_color_record(&json!({"r": 1, "g": 2})));
    }

    #[test]
    fn opaque_controller_drops_alpha() {
        let value: ValueRef<Color> = Rc::new(ComplexValue::new(Color::default()));
        let c = ColorController::new(value.clone(), false, ViewProps::default());
        assert!(c.set_color(Color::rgba(1.0, 2.0, 3.0, 0.5)));
        assert_eq!(value.raw_value().a, 1.0);
        assert_eq!(c.hex(), "#010203");
    }
}
