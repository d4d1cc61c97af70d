//! Boolean inputs and monitors.

use std::rc::Rc;

use serde::Deserialize;
use serde_json::Value as JsonValue;

use super::{
    convert::bool_from_json,
    params::{ListOptions, LogParams, Params, parse_params},
    plugin::{
        BindingArgs, InputControllerArgs, InputPlugin, MonitorControllerArgs, MonitorPlugin,
    },
    pool::PluginPool,
};
use crate::{
    api::{AnyBladeApi, ListBindingApi},
    blade::BladeRef,
    binding::{BindingReader, BindingWriter, write_primitive},
    constraint::{ConstraintRef, ListConstraint, ListItem},
    controllers::{
        CheckboxController, ListController, LogController, ValueController, list_options,
    },
    error::Result,
};

/// Options of boolean inputs.
#[derive(Debug, Clone, Default, Deserialize)]
struct BoolInputOptions {
    /// Choices.
    options: Option<ListOptions<bool>>,
}

/// Binds booleans to a checkbox, or to a list when choices are given.
#[derive(Debug, Clone, Copy, Default)]
pub struct BoolInputPlugin;

impl InputPlugin for BoolInputPlugin {
    type Value = bool;
    type Params = Option<Vec<ListItem<bool>>>;

    fn id(&self) -> &str {
        "input-bool"
    }

    fn accept(&self, value: &JsonValue, params: &Params) -> Result<Option<Self::Params>> {
        if !value.is_boolean() {
            return Ok(None);
        }
        let o: BoolInputOptions = parse_params(params)?;
        Ok(Some(o.options.map(ListOptions::into_items).transpose()?))
    }

    fn reader(&self, _args: &BindingArgs<'_, Self::Params>) -> BindingReader<bool> {
        Rc::new(bool_from_json)
    }

    fn constraint(&self, args: &BindingArgs<'_, Self::Params>) -> Option<ConstraintRef<bool>> {
        let items = args.params.clone()?;
        Some(Rc::new(ListConstraint::new(items)))
    }

    fn writer(&self, _args: &BindingArgs<'_, Self::Params>) -> BindingWriter<bool> {
        Rc::new(write_primitive::<bool>)
    }

    fn controller(
        &self,
        args: InputControllerArgs<'_, bool, Self::Params>,
    ) -> Box<dyn ValueController> {
        match args.params {
            Some(items) => Box::new(ListController::new(
                args.value,
                list_options(args.constraint.as_deref(), items),
                args.view_props,
            )),
            None => Box::new(CheckboxController::new(args.value, args.view_props)),
        }
    }

    fn api(&self, controller: &BladeRef, pool: &Rc<PluginPool>) -> Option<Rc<dyn AnyBladeApi>> {
        let api = ListBindingApi::<bool>::new(controller.clone(), pool.clone())?;
        Some(Rc::new(api))
    }
}

/// Monitors booleans as text.
#[derive(Debug, Clone, Copy, Default)]
pub struct BoolMonitorPlugin;

impl MonitorPlugin for BoolMonitorPlugin {
    type Value = bool;
    type Params = Option<usize>;

    fn id(&self) -> &str {
        "monitor-bool"
    }

    fn accept(&self, value: &JsonValue, params: &Params) -> Result<Option<Self::Params>> {
        if !value.is_boolean() {
            return Ok(None);
        }
        let o: LogParams = parse_params(params)?;
        Ok(Some(o.rows()))
    }

    fn reader(&self, _args: &BindingArgs<'_, Self::Params>) -> BindingReader<bool> {
        Rc::new(bool_from_json)
    }

    fn default_buffer_size(&self, rows: &Self::Params) -> usize {
        rows.unwrap_or(1)
    }

    fn controller(
        &self,
        args: MonitorControllerArgs<'_, bool, Self::Params>,
    ) -> Box<dyn ValueController> {
        let formatter = Rc::new(|b: &bool| b.to_string());
        match *args.params {
            Some(rows) => Box::new(LogController::multiline(args.value, formatter, rows)),
            None => Box::new(LogController::single(args.value, formatter)),
        }
    }
}
