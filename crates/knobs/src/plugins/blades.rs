//! Plugins for blades that carry no bound value.

use std::rc::Rc;

use serde::{Deserialize, de::DeserializeOwned};
use serde_json::Value as JsonValue;

use super::{
    convert::{number_to_json, string_from_json},
    params::{ListOptions, Params, parse_params, view_of},
    plugin::{BladeArgs, BladePlugin},
    pool::PluginPool,
};
use crate::{
    api::{
        AnyBladeApi, ButtonApi, FolderApi, ListBladeApi, SliderBladeApi, TabApi, TabPageApi,
        TextBladeApi,
    },
    blade::{BladeController, BladeRef},
    constraint::{Constraint, ConstraintRef, DefiniteRangeConstraint, ListConstraint, ListItem},
    controllers::{
        ButtonBody, FolderBody, ListController, SeparatorBody, SliderController, SliderProps,
        TabBody, TabPageBody, TextController, ValueBladeBody,
        text::{Parser, parse_number, suitable_decimal_digits},
    },
    error::{Error, Result},
    value::{Value, ValueConfig, create_value},
};

/// Parse a blade's own options when the view matches.
fn accept_view<S: DeserializeOwned>(params: &Params, view: &str) -> Result<Option<S>> {
    if view_of(params) != Some(view) {
        return Ok(None);
    }
    parse_params(params).map(Some)
}

/// Button options.
#[derive(Debug, Clone, Deserialize)]
pub struct ButtonParams {
    /// Caption.
    pub title: String,
    /// Label beside the button.
    pub label: Option<String>,
}

/// Builds buttons for `view: "button"`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ButtonPlugin;

impl BladePlugin for ButtonPlugin {
    type Params = ButtonParams;

    fn id(&self) -> &str {
        "button"
    }

    fn accept(&self, params: &Params) -> Result<Option<ButtonParams>> {
        accept_view(params, "button")
    }

    fn controller(&self, args: BladeArgs<ButtonParams>) -> BladeRef {
        let body = ButtonBody::new(args.params.title, args.params.label, args.view_props.clone());
        BladeController::new(args.blade, args.view_props, body)
    }

    fn api(&self, controller: &BladeRef, pool: &Rc<PluginPool>) -> Option<Rc<dyn AnyBladeApi>> {
        let api = ButtonApi::new(controller.clone(), pool.clone())?;
        Some(Rc::new(api))
    }
}

/// Folder options.
#[derive(Debug, Clone, Deserialize)]
pub struct FolderParams {
    /// Caption.
    pub title: String,
    /// Initial fold state. Defaults to expanded.
    pub expanded: Option<bool>,
}

/// Builds folders for `view: "folder"`.
#[derive(Debug, Clone, Copy, Default)]
pub struct FolderPlugin;

impl BladePlugin for FolderPlugin {
    type Params = FolderParams;

    fn id(&self) -> &str {
        "folder"
    }

    fn accept(&self, params: &Params) -> Result<Option<FolderParams>> {
        accept_view(params, "folder")
    }

    fn controller(&self, args: BladeArgs<FolderParams>) -> BladeRef {
        let body = FolderBody::new(
            args.params.title,
            args.params.expanded.unwrap_or(true),
            &args.view_props,
        );
        BladeController::new(args.blade, args.view_props, body)
    }

    fn api(&self, controller: &BladeRef, pool: &Rc<PluginPool>) -> Option<Rc<dyn AnyBladeApi>> {
        let api = FolderApi::new(controller.clone(), pool.clone())?;
        Some(Rc::new(api))
    }
}

/// One page of a tab.
#[derive(Debug, Clone, Deserialize)]
pub struct TabPageParams {
    /// Caption.
    pub title: String,
}

/// Tab options.
#[derive(Debug, Clone, Deserialize)]
pub struct TabParams {
    /// Pages, in order.
    pub pages: Vec<TabPageParams>,
}

/// Builds tabs for `view: "tab"`. The API covers both tabs and their
/// pages.
#[derive(Debug, Clone, Copy, Default)]
pub struct TabPlugin;

impl BladePlugin for TabPlugin {
    type Params = TabParams;

    fn id(&self) -> &str {
        "tab"
    }

    fn accept(&self, params: &Params) -> Result<Option<TabParams>> {
        accept_view(params, "tab")
    }

    fn controller(&self, args: BladeArgs<TabParams>) -> BladeRef {
        let body = TabBody::new(&args.view_props);
        let controller = BladeController::new(args.blade, args.view_props, body);
        if let Some(rack) = controller.rack() {
            for page in args.params.pages {
                rack.add(TabPageBody::create(page.title), None);
            }
        }
        controller
    }

    fn api(&self, controller: &BladeRef, pool: &Rc<PluginPool>) -> Option<Rc<dyn AnyBladeApi>> {
        if let Some(api) = TabApi::new(controller.clone(), pool.clone()) {
            return Some(Rc::new(api));
        }
        let api = TabPageApi::new(controller.clone(), pool.clone())?;
        Some(Rc::new(api))
    }
}

/// Builds separators for `view: "separator"`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SeparatorPlugin;

impl BladePlugin for SeparatorPlugin {
    type Params = ();

    fn id(&self) -> &str {
        "separator"
    }

    fn accept(&self, params: &Params) -> Result<Option<()>> {
        Ok((view_of(params) == Some("separator")).then_some(()))
    }

    fn controller(&self, args: BladeArgs<()>) -> BladeRef {
        BladeController::new(args.blade, args.view_props, SeparatorBody)
    }
}

/// List blade options as supplied.
#[derive(Debug, Clone, Deserialize)]
struct ListBladeOptions {
    /// Choices.
    options: ListOptions<JsonValue>,
    /// Initial value.
    value: JsonValue,
    /// Label.
    label: Option<String>,
}

/// List blade options.
#[derive(Debug, Clone)]
pub struct ListBladeParams {
    /// Choices, in display order.
    pub options: Vec<ListItem<JsonValue>>,
    /// Initial value. A value that is not a choice becomes the first one.
    pub value: JsonValue,
    /// Label.
    pub label: Option<String>,
}

/// Builds labelled choice lists for `view: "list"`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ListBladePlugin;

impl BladePlugin for ListBladePlugin {
    type Params = ListBladeParams;

    fn id(&self) -> &str {
        "list"
    }

    fn accept(&self, params: &Params) -> Result<Option<ListBladeParams>> {
        let Some(o) = accept_view::<ListBladeOptions>(params, "list")? else {
            return Ok(None);
        };
        Ok(Some(ListBladeParams {
            options: o.options.into_items()?,
            value: o.value,
            label: o.label,
        }))
    }

    fn controller(&self, args: BladeArgs<ListBladeParams>) -> BladeRef {
        let ListBladeParams {
            options,
            value,
            label,
        } = args.params;
        let list = Rc::new(ListConstraint::new(options));
        let constraint: ConstraintRef<JsonValue> = list.clone();
        let value = create_value(
            list.constrain(value),
            ValueConfig {
                constraint: Some(constraint),
                equals: None,
            },
        );
        let controller = ListController::new(
            value.clone(),
            list.options().clone(),
            args.view_props.clone(),
        );
        let body = ValueBladeBody::new(label, value, Box::new(controller));
        BladeController::new(args.blade, args.view_props, body)
    }

    fn api(&self, controller: &BladeRef, pool: &Rc<PluginPool>) -> Option<Rc<dyn AnyBladeApi>> {
        let api = ListBladeApi::new(controller.clone(), pool.clone())?;
        Some(Rc::new(api))
    }
}

/// Slider blade options.
#[derive(Debug, Clone, Deserialize)]
pub struct SliderBladeParams {
    /// Value at the left end.
    pub min: f64,
    /// Value at the right end.
    pub max: f64,
    /// Initial value, clamped into the range. Defaults to zero.
    pub value: Option<f64>,
    /// Label.
    pub label: Option<String>,
}

/// Builds labelled sliders for `view: "slider"`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SliderBladePlugin;

impl BladePlugin for SliderBladePlugin {
    type Params = SliderBladeParams;

    fn id(&self) -> &str {
        "slider"
    }

    fn accept(&self, params: &Params) -> Result<Option<SliderBladeParams>> {
        accept_view(params, "slider")
    }

    fn controller(&self, args: BladeArgs<SliderBladeParams>) -> BladeRef {
        let p = args.params;
        let range = Rc::new(DefiniteRangeConstraint::new(p.min, p.max));
        let constraint: ConstraintRef<f64> = range.clone();
        let value = create_value(
            range.constrain(p.value.unwrap_or(0.0)),
            ValueConfig {
                constraint: Some(constraint.clone()),
                equals: None,
            },
        );
        let digits = suitable_decimal_digits(Some(constraint.as_ref()), value.raw_value());
        let props = SliderProps::from_values(range.min().clone(), range.max().clone());
        let controller =
            SliderController::new(value.clone(), props, digits, args.view_props.clone());
        let body = ValueBladeBody::new(p.label, value, Box::new(controller));
        BladeController::new(args.blade, args.view_props, body)
    }

    fn api(&self, controller: &BladeRef, pool: &Rc<PluginPool>) -> Option<Rc<dyn AnyBladeApi>> {
        let api = SliderBladeApi::new(controller.clone(), pool.clone())?;
        Some(Rc::new(api))
    }
}

/// Text blade options.
#[derive(Debug, Clone, Deserialize)]
pub struct TextBladeParams {
    /// Initial value: a number, a string or a boolean. Entered text is
    /// parsed back into the same kind.
    pub value: JsonValue,
    /// Label.
    pub label: Option<String>,
}

/// Parses entered text into a primitive of the same kind as `sample`.
fn primitive_parser(sample: &JsonValue) -> Parser<JsonValue> {
    match sample {
        JsonValue::Number(_) => Rc::new(|s: &str| parse_number(s).map(number_to_json)),
        JsonValue::Bool(_) => Rc::new(|s: &str| s.trim().parse().ok().map(JsonValue::Bool)),
        _ => Rc::new(|s: &str| Some(JsonValue::String(s.to_string()))),
    }
}

/// Builds labelled text fields for `view: "text"`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextBladePlugin;

impl BladePlugin for TextBladePlugin {
    type Params = TextBladeParams;

    fn id(&self) -> &str {
        "text"
    }

    fn accept(&self, params: &Params) -> Result<Option<TextBladeParams>> {
        let Some(p) = accept_view::<TextBladeParams>(params, "text")? else {
            return Ok(None);
        };
        match p.value {
            JsonValue::Number(_) | JsonValue::Bool(_) | JsonValue::String(_) => Ok(Some(p)),
            _ => Err(Error::invalid_params("value")),
        }
    }

    fn controller(&self, args: BladeArgs<TextBladeParams>) -> BladeRef {
        let p = args.params;
        let parser = primitive_parser(&p.value);
        let value = create_value(p.value, ValueConfig::default());
        let controller = TextController::new(
            value.clone(),
            parser,
            Rc::new(string_from_json),
            args.view_props.clone(),
        );
        let body = ValueBladeBody::new(p.label, value, Box::new(controller));
        BladeController::new(args.blade, args.view_props, body)
    }

    fn api(&self, controller: &BladeRef, pool: &Rc<PluginPool>) -> Option<Rc<dyn AnyBladeApi>> {
        let api = TextBladeApi::new(controller.clone(), pool.clone())?;
        Some(Rc::new(api))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::{error::Error, scheduler::Scheduler, state::record, value::Value};

    #[test]
    fn builds_blades() {
        let pool = PluginPool::with_defaults(Scheduler::new());
        let bc = pool
            .create_blade(&record(json!({"view": "folder", "title": "F", "expanded": false})))
            .unwrap();
        let folder = bc.body_as::<FolderBody>().unwrap();
        assert!(!folder.foldable().expanded.raw_value());

        let bc = pool
            .create_blade(&record(json!({"view": "tab", "pages": [{"title": "a"}, {"title": "b"}]})))
            .unwrap();
        assert_eq!(bc.rack().unwrap().len(), 2);

        let bc = pool
            .create_blade(&record(json!({"view": "separator", "hidden": true})))
            .unwrap();
        assert!(bc.body_as::<SeparatorBody>().is_some());
        assert!(bc.view_props().hidden());
    }

    #[test]
    fn button_requires_title() {
        let pool = PluginPool::with_defaults(Scheduler::new());
        assert_eq!(
            pool.create_blade(&record(json!({"view": "button"})))
                .unwrap_err(),
            Error::invalid_params("title")
        );
    }

    #[test]
    fn builds_value_blades() {
        let pool = PluginPool::with_defaults(Scheduler::new());
        let bc = pool
            .create_blade(&record(json!({"view": "slider", "min": 0, "max": 1, "value": 3})))
            .unwrap();
        let body = bc.body_as::<ValueBladeBody<f64>>().unwrap();
        assert_eq!(body.value().raw_value(), 1.0);

        let bc = pool
            .create_blade(&record(json!({
                "view": "list",
                "options": {"one": 1, "two": "two"},
                "value": "two",
            })))
            .unwrap();
        let body = bc.body_as::<ValueBladeBody<JsonValue>>().unwrap();
        let list = body.controller_as::<ListController<JsonValue>>().unwrap();
        assert_eq!(list.selected_index(), Some(1));

        let bc = pool
            .create_blade(&record(json!({"view": "text", "value": true, "label": "on"})))
            .unwrap();
        let body = bc.body_as::<ValueBladeBody<JsonValue>>().unwrap();
        let text = body.controller_as::<TextController<JsonValue>>().unwrap();
        assert!(!text.input_text("yes"));
        assert!(text.input_text("false"));
        assert_eq!(body.value().raw_value(), json!(false));
    }

    #[test]
    fn value_blade_options_are_checked() {
        let pool = PluginPool::with_defaults(Scheduler::new());
        assert_eq!(
            pool.create_blade(&record(json!({"view": "slider", "max": 1})))
                .unwrap_err(),
            Error::invalid_params("min")
        );
        assert_eq!(
            pool.create_blade(&record(json!({"view": "text", "value": [1]})))
                .unwrap_err(),
            Error::invalid_params("value")
        );
        assert_eq!(
            pool.create_blade(&record(json!({"view": "list", "value": 1})))
                .unwrap_err(),
            Error::invalid_params("options")
        );
    }
}
