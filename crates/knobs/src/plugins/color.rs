//! Color inputs, bound either to `{r, g, b[, a]}` records or to packed
//! integers.

use std::rc::Rc;

use serde::Deserialize;
use serde_json::Value as JsonValue;

use super::{
    convert::{number_from_json, number_to_json},
    params::{Params, parse_params, view_of},
    plugin::{BindingArgs, InputControllerArgs, InputPlugin},
};
use crate::{
    binding::{BindingReader, BindingTarget, BindingWriter},
    controllers::{Color, ColorController, ValueController},
    error::Result,
};

/// The `color` option.
#[derive(Debug, Clone, Default, Deserialize)]
struct ColorOptions {
    /// Edit alpha.
    alpha: Option<bool>,
}

/// Options of color inputs.
#[derive(Debug, Clone, Default, Deserialize)]
struct ColorInputOptions {
    /// Color options.
    color: Option<ColorOptions>,
}

impl ColorInputOptions {
    /// True if alpha was requested.
    fn alpha(&self) -> bool {
        self.color.as_ref().and_then(|c| c.alpha).unwrap_or(false)
    }
}

/// Binds color records. Alpha is edited when the record has an `a` field
/// or the params ask for it.
#[derive(Debug, Clone, Copy, Default)]
pub struct ColorObjectInputPlugin;

impl InputPlugin for ColorObjectInputPlugin {
    type Value = Color;
    type Params = bool;

    fn id(&self) -> &str {
        "input-color-object"
    }

    fn accept(&self, value: &JsonValue, params: &Params) -> Result<Option<bool>> {
        if !Color::is_color_record(value) {
            return Ok(None);
        }
        let o: ColorInputOptions = parse_params(params)?;
        Ok(Some(value.get("a").is_some() || o.alpha()))
    }

    fn reader(&self, _args: &BindingArgs<'_, bool>) -> BindingReader<Color> {
        Rc::new(Color::from_json)
    }

    fn writer(&self, args: &BindingArgs<'_, bool>) -> BindingWriter<Color> {
        let alpha = *args.params;
        Rc::new(move |target: &BindingTarget, c: &Color| {
            target.write_property("r", number_to_json(c.r))?;
            target.write_property("g", number_to_json(c.g))?;
            target.write_property("b", number_to_json(c.b))?;
            if alpha {
                target.write_property("a", number_to_json(c.a))?;
            }
            Ok(())
        })
    }

    fn controller(&self, args: InputControllerArgs<'_, Color, bool>) -> Box<dyn ValueController> {
        Box::new(ColorController::new(
            args.value,
            *args.params,
            args.view_props,
        ))
    }
}

/// Binds numbers holding `0xRRGGBB` (or `0xRRGGBBAA` with alpha) when the
/// view is `color`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ColorNumberInputPlugin;

impl InputPlugin for ColorNumberInputPlugin {
    type Value = Color;
    type Params = bool;

    fn id(&self) -> &str {
        "input-color-number"
    }

    fn accept(&self, value: &JsonValue, params: &Params) -> Result<Option<bool>> {
        if !value.is_number() || view_of(params) != Some("color") {
            return Ok(None);
        }
        let o: ColorInputOptions = parse_params(params)?;
        Ok(Some(o.alpha()))
    }

    fn reader(&self, args: &BindingArgs<'_, bool>) -> BindingReader<Color> {
        let alpha = *args.params;
        Rc::new(move |v: &JsonValue| {
            let n = number_from_json(v).clamp(0.0, f64::from(u32::MAX));
            Color::from_int(n as u32, alpha)
        })
    }

    fn writer(&self, args: &BindingArgs<'_, bool>) -> BindingWriter<Color> {
        let alpha = *args.params;
        Rc::new(move |target: &BindingTarget, c: &Color| {
            target.write(JsonValue::from(c.to_int(alpha)))
        })
    }

    fn controller(&self, args: InputControllerArgs<'_, Color, bool>) -> Box<dyn ValueController> {
        Box::new(ColorController::new(
            args.value,
            *args.params,
            args.view_props,
        ))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::{
        binding::{BindableRef, bindable},
        blade::BladeRef,
        controllers::BindingController,
        plugins::PluginPool,
        scheduler::Scheduler,
        state::record,
    };

    /// The color controller of a binding blade.
    fn color_of(bc: &BladeRef) -> &ColorController {
        bc.body_as::<BindingController>()
            .and_then(BindingController::controller_as::<ColorController>)
            .unwrap()
    }

    #[test]
    fn object_colors() {
        let pool = PluginPool::with_defaults(Scheduler::new());
        let obj: BindableRef = bindable(json!({
            "c": {"r": 255, "g": 0, "b": 0},
            "ca": {"r": 0, "g": 0, "b": 255, "a": 0.5},
        }));
        let bc = pool.create_binding(&obj, "c", &Params::new()).unwrap();
        let cc = color_of(&bc);
        assert!(!cc.supports_alpha());
        assert_eq!(cc.hex(), "#ff0000");
        assert!(cc.set_color(Color::rgb(0.0, 128.0, 0.0)));
        assert_eq!(
            obj.borrow().read_property("c"),
            Some(json!({"r": 0, "g": 128, "b": 0}))
        );

        let bc = pool.create_binding(&obj, "ca", &Params::new()).unwrap();
        assert!(color_of(&bc).supports_alpha());
        assert_eq!(color_of(&bc).hex(), "#0000ff80");
    }

    #[test]
    fn number_colors() {
        let pool = PluginPool::with_defaults(Scheduler::new());
        let obj: BindableRef = bindable(json!({"c": 0x00ff88}));
        let bc = pool
            .create_binding(&obj, "c", &record(json!({"view": "color"})))
            .unwrap();
        let cc = color_of(&bc);
        assert_eq!(cc.hex(), "#00ff88");
        assert!(cc.set_color(Color::rgb(1.0, 2.0, 3.0)));
        assert_eq!(obj.borrow().read_property("c"), Some(json!(0x010203)));

        let plain = pool.create_binding(&obj, "c", &Params::new()).unwrap();
        assert!(
            plain
                .body_as::<BindingController>()
                .and_then(BindingController::controller_as::<ColorController>)
                .is_none()
        );
    }
}
