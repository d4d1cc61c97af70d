//! Number inputs and monitors.

use std::rc::Rc;

use serde::Deserialize;
use serde_json::Value as JsonValue;

use super::{
    convert::{number_from_json, write_number},
    params::{ListOptions, LogParams, Params, parse_params},
    plugin::{
        BindingArgs, InputControllerArgs, InputPlugin, MonitorControllerArgs, MonitorPlugin,
    },
    pool::PluginPool,
};
use crate::{
    api::{AnyBladeApi, GraphBindingApi, ListBindingApi, SliderBindingApi},
    blade::BladeRef,
    binding::{BindingReader, BindingWriter},
    constraint::{
        ConstraintRef, DefiniteRangeConstraint, NumberConstraintParams, create_number_constraint,
        find_constraint,
    },
    controllers::{
        GraphController, ListController, LogController, SliderController, TextController,
        SliderProps, ValueController, list_options,
        text::{number_formatter, parse_number, suitable_decimal_digits},
    },
    error::Result,
    value::Value,
};

/// History length of a graph monitor.
pub const GRAPH_BUFFER_SIZE: usize = 64;

/// Default vertical range of a graph monitor.
pub const GRAPH_RANGE: (f64, f64) = (0.0, 100.0);

/// Decimal digits shown by number monitors.
const MONITOR_DIGITS: usize = 2;

/// Options of number inputs.
#[derive(Debug, Clone, Default, Deserialize)]
struct NumberInputOptions {
    /// Lower bound.
    min: Option<f64>,
    /// Upper bound.
    max: Option<f64>,
    /// Step size.
    step: Option<f64>,
    /// Choices.
    options: Option<ListOptions<f64>>,
}

/// Binds numbers. Choices give a list, a bounded range gives a slider, and
/// anything else a text field.
#[derive(Debug, Clone, Copy, Default)]
pub struct NumberInputPlugin;

impl InputPlugin for NumberInputPlugin {
    type Value = f64;
    type Params = NumberConstraintParams;

    fn id(&self) -> &str {
        "input-number"
    }

    fn accept(&self, value: &JsonValue, params: &Params) -> Result<Option<Self::Params>> {
        if !value.is_number() {
            return Ok(None);
        }
        let o: NumberInputOptions = parse_params(params)?;
        Ok(Some(NumberConstraintParams {
            step: o.step,
            min: o.min,
            max: o.max,
            options: o.options.map(ListOptions::into_items).transpose()?,
        }))
    }

    fn reader(&self, _args: &BindingArgs<'_, Self::Params>) -> BindingReader<f64> {
        Rc::new(number_from_json)
    }

    fn constraint(&self, args: &BindingArgs<'_, Self::Params>) -> Option<ConstraintRef<f64>> {
        create_number_constraint(args.params, number_from_json(args.initial))
    }

    fn writer(&self, _args: &BindingArgs<'_, Self::Params>) -> BindingWriter<f64> {
        Rc::new(write_number)
    }

    fn controller(
        &self,
        args: InputControllerArgs<'_, f64, Self::Params>,
    ) -> Box<dyn ValueController> {
        let InputControllerArgs {
            value,
            constraint,
            params,
            view_props,
        } = args;
        if let Some(items) = &params.options {
            let options = list_options(constraint.as_deref(), items);
            return Box::new(ListController::new(value, options, view_props));
        }
        let digits = suitable_decimal_digits(constraint.as_deref(), value.raw_value());
        if let (Some(min), Some(max)) = (params.min, params.max) {
            let props = match constraint
                .as_deref()
                .and_then(find_constraint::<DefiniteRangeConstraint, f64>)
            {
                Some(range) => SliderProps::from_values(range.min().clone(), range.max().clone()),
                None => SliderProps::new(min, max),
            };
            return Box::new(SliderController::new(value, props, digits, view_props));
        }
        Box::new(TextController::new(
            value,
            Rc::new(parse_number),
            number_formatter(digits),
            view_props,
        ))
    }

    fn api(&self, controller: &BladeRef, pool: &Rc<PluginPool>) -> Option<Rc<dyn AnyBladeApi>> {
        if let Some(api) = SliderBindingApi::new(controller.clone(), pool.clone()) {
            return Some(Rc::new(api));
        }
        let api = ListBindingApi::<f64>::new(controller.clone(), pool.clone())?;
        Some(Rc::new(api))
    }
}

/// Options of number monitors.
#[derive(Debug, Clone, Default, Deserialize)]
struct NumberMonitorOptions {
    /// View hint.
    view: Option<String>,
    /// Graph bottom.
    min: Option<f64>,
    /// Graph top.
    max: Option<f64>,
    /// Row options.
    #[serde(flatten)]
    log: LogParams,
}

/// How a number monitor shows its history.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NumberMonitorView {
    /// A plot over `[min, max]`.
    Graph {
        /// Plot bottom.
        min: f64,
        /// Plot top.
        max: f64,
    },
    /// Text, over `rows` rows when multiline.
    Log {
        /// Visible rows when multiline.
        rows: Option<usize>,
    },
}

/// Monitors numbers as text or as a graph.
#[derive(Debug, Clone, Copy, Default)]
pub struct NumberMonitorPlugin;

impl MonitorPlugin for NumberMonitorPlugin {
    type Value = f64;
    type Params = NumberMonitorView;

    fn id(&self) -> &str {
        "monitor-number"
    }

    fn accept(&self, value: &JsonValue, params: &Params) -> Result<Option<Self::Params>> {
        if !value.is_number() {
            return Ok(None);
        }
        let o: NumberMonitorOptions = parse_params(params)?;
        Ok(Some(if o.view.as_deref() == Some("graph") {
            NumberMonitorView::Graph {
                min: o.min.unwrap_or(GRAPH_RANGE.0),
                max: o.max.unwrap_or(GRAPH_RANGE.1),
            }
        } else {
            NumberMonitorView::Log { rows: o.log.rows() }
        }))
    }

    fn reader(&self, _args: &BindingArgs<'_, Self::Params>) -> BindingReader<f64> {
        Rc::new(number_from_json)
    }

    fn default_buffer_size(&self, params: &Self::Params) -> usize {
        match params {
            NumberMonitorView::Graph { .. } => GRAPH_BUFFER_SIZE,
            NumberMonitorView::Log { rows } => rows.unwrap_or(1),
        }
    }

    fn controller(
        &self,
        args: MonitorControllerArgs<'_, f64, Self::Params>,
    ) -> Box<dyn ValueController> {
        match *args.params {
            NumberMonitorView::Graph { min, max } => {
                Box::new(GraphController::new(args.value, min, max))
            }
            NumberMonitorView::Log { rows: Some(rows) } => Box::new(LogController::multiline(
                args.value,
                number_formatter(MONITOR_DIGITS),
                rows,
            )),
            NumberMonitorView::Log { rows: None } => Box::new(LogController::single(
                args.value,
                number_formatter(MONITOR_DIGITS),
            )),
        }
    }

    fn api(&self, controller: &BladeRef, pool: &Rc<PluginPool>) -> Option<Rc<dyn AnyBladeApi>> {
        let api = GraphBindingApi::new(controller.clone(), pool.clone())?;
        Some(Rc::new(api))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::{
        binding::{BindableRef, bindable},
        controllers::BindingController,
        error::Error,
        plugins::PluginPool,
        scheduler::Scheduler,
        state::record,
    };

    #[test]
    fn slider_clamps_and_snaps() {
        let pool = PluginPool::with_defaults(Scheduler::new());
        let obj: BindableRef = bindable(json!({"x": 5}));
        let bc = pool
            .create_binding(&obj, "x", &record(json!({"min": 0, "max": 10, "step": 0.5})))
            .unwrap();
        let body = bc.body_as::<BindingController>().unwrap();
        let slider = body.controller_as::<SliderController>().unwrap();
        assert_eq!(slider.text().text(), "5.0");
        assert!(slider.set_ratio(0.76, true));
        assert_eq!(body.input_value::<f64>().unwrap().raw_value(), 7.5);
        assert_eq!(obj.borrow().read_property("x"), Some(json!(7.5)));
        slider.value().set(40.0);
        assert_eq!(obj.borrow().read_property("x"), Some(json!(10)));
    }

    #[test]
    fn options_give_a_list() {
        let pool = PluginPool::with_defaults(Scheduler::new());
        let obj: BindableRef = bindable(json!({"x": 2}));
        let bc = pool
            .create_binding(
                &obj,
                "x",
                &record(json!({"options": [{"text": "one", "value": 1}, {"text": "two", "value": 2}]})),
            )
            .unwrap();
        let body = bc.body_as::<BindingController>().unwrap();
        let list = body.controller_as::<ListController<f64>>().unwrap();
        assert_eq!(list.selected_index(), Some(1));
        assert!(list.select_index(0));
        assert_eq!(obj.borrow().read_property("x"), Some(json!(1)));
    }

    #[test]
    fn malformed_options() {
        let pool = PluginPool::with_defaults(Scheduler::new());
        let obj: BindableRef = bindable(json!({"x": 2}));
        assert_eq!(
            pool.create_binding(&obj, "x", &record(json!({"min": "low"})))
                .unwrap_err(),
            Error::invalid_params("min")
        );
    }

    #[test]
    fn graph_monitor() {
        let pool = PluginPool::with_defaults(Scheduler::new());
        let obj: BindableRef = bindable(json!({"x": 2}));
        let bc = pool
            .create_binding(
                &obj,
                "x",
                &record(json!({"readonly": true, "view": "graph", "interval": 0})),
            )
            .unwrap();
        let body = bc.body_as::<BindingController>().unwrap();
        let graph = body.controller_as::<GraphController>().unwrap();
        assert_eq!(graph.props().max.raw_value(), 100.0);
        assert_eq!(body.monitor_value::<f64>().unwrap().buffer_size(), 64);
        assert_eq!(graph.value().raw_value().last(), Some(&Some(2.0)));
    }

    #[test]
    fn log_monitor_formats() {
        let pool = PluginPool::with_defaults(Scheduler::new());
        let obj: BindableRef = bindable(json!({"x": 2}));
        let bc = pool
            .create_binding(&obj, "x", &record(json!({"readonly": true, "interval": 0})))
            .unwrap();
        let body = bc.body_as::<BindingController>().unwrap();
        let log = body.controller_as::<LogController<f64>>().unwrap();
        assert_eq!(log.text(), "2.00");
    }
}
