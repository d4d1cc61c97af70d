//! String inputs and monitors.

use std::rc::Rc;

use serde::Deserialize;
use serde_json::Value as JsonValue;

use super::{
    convert::string_from_json,
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
    controllers::{ListController, LogController, TextController, ValueController, list_options},
    error::Result,
};

/// Options of string inputs.
#[derive(Debug, Clone, Default, Deserialize)]
struct StringInputOptions {
    /// Choices.
    options: Option<ListOptions<String>>,
}

/// Binds strings to a text field, or to a list when choices are given.
#[derive(Debug, Clone, Copy, Default)]
pub struct StringInputPlugin;

impl InputPlugin for StringInputPlugin {
    type Value = String;
    type Params = Option<Vec<ListItem<String>>>;

    fn id(&self) -> &str {
        "input-string"
    }

    fn accept(&self, value: &JsonValue, params: &Params) -> Result<Option<Self::Params>> {
        if !value.is_string() {
            return Ok(None);
        }
        let o: StringInputOptions = parse_params(params)?;
        Ok(Some(o.options.map(ListOptions::into_items).transpose()?))
    }

    fn reader(&self, _args: &BindingArgs<'_, Self::Params>) -> BindingReader<String> {
        Rc::new(string_from_json)
    }

    fn constraint(&self, args: &BindingArgs<'_, Self::Params>) -> Option<ConstraintRef<String>> {
        let items = args.params.clone()?;
        Some(Rc::new(ListConstraint::new(items)))
    }

    fn writer(&self, _args: &BindingArgs<'_, Self::Params>) -> BindingWriter<String> {
        Rc::new(write_primitive::<String>)
    }

    fn controller(
        &self,
        args: InputControllerArgs<'_, String, Self::Params>,
    ) -> Box<dyn ValueController> {
        match args.params {
            Some(items) => Box::new(ListController::new(
                args.value,
                list_options(args.constraint.as_deref(), items),
                args.view_props,
            )),
            None => Box::new(TextController::new(
                args.value,
                Rc::new(|s: &str| Some(s.to_string())),
                Rc::new(String::clone),
                args.view_props,
            )),
        }
    }

    fn api(&self, controller: &BladeRef, pool: &Rc<PluginPool>) -> Option<Rc<dyn AnyBladeApi>> {
        let api = ListBindingApi::<String>::new(controller.clone(), pool.clone())?;
        Some(Rc::new(api))
    }
}

/// Monitors strings as text.
#[derive(Debug, Clone, Copy, Default)]
pub struct StringMonitorPlugin;

impl MonitorPlugin for StringMonitorPlugin {
    type Value = String;
    type Params = Option<usize>;

    fn id(&self) -> &str {
        "monitor-string"
    }

    fn accept(&self, value: &JsonValue, params: &Params) -> Result<Option<Self::Params>> {
        if !value.is_string() {
            return Ok(None);
        }
        let o: LogParams = parse_params(params)?;
        Ok(Some(o.rows()))
    }

    fn reader(&self, _args: &BindingArgs<'_, Self::Params>) -> BindingReader<String> {
        Rc::new(string_from_json)
    }

    fn default_buffer_size(&self, rows: &Self::Params) -> usize {
        rows.unwrap_or(1)
    }

    fn controller(
        &self,
        args: MonitorControllerArgs<'_, String, Self::Params>,
    ) -> Box<dyn ValueController> {
        let formatter = Rc::new(String::clone);
        match *args.params {
            Some(rows) => Box::new(LogController::multiline(args.value, formatter, rows)),
            None => Box::new(LogController::single(args.value, formatter)),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::{
        binding::{BindableRef, bindable},
        controllers::BindingController,
        plugins::PluginPool,
        scheduler::Scheduler,
        state::record,
    };

    #[test]
    fn text_edits_write_through() {
        let pool = PluginPool::with_defaults(Scheduler::new());
        let obj: BindableRef = bindable(json!({"s": "hello"}));
        let bc = pool.create_binding(&obj, "s", &Params::new()).unwrap();
        let body = bc.body_as::<BindingController>().unwrap();
        let text = body.controller_as::<TextController<String>>().unwrap();
        assert_eq!(text.text(), "hello");
        assert!(text.input_text("world"));
        assert_eq!(obj.borrow().read_property("s"), Some(json!("world")));
    }

    #[test]
    fn multiline_monitor_keeps_rows() {
        let pool = PluginPool::with_defaults(Scheduler::new());
        let obj: BindableRef = bindable(json!({"s": "a"}));
        let bc = pool
            .create_binding(
                &obj,
                "s",
                &record(json!({"readonly": true, "multiline": true, "interval": 0})),
            )
            .unwrap();
        let body = bc.body_as::<BindingController>().unwrap();
        obj.borrow_mut().write_property("s", json!("b")).unwrap();
        bc.refresh().unwrap();
        let log = body.controller_as::<LogController<String>>().unwrap();
        assert_eq!(log.rows(), Some(3));
        assert_eq!(log.text(), "a\nb");
    }
}
