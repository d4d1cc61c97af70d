//! Point inputs of two to four dimensions.

use std::rc::Rc;

use serde::Deserialize;
use serde_json::Value as JsonValue;

use super::{
    convert::{POINT_AXES, is_point_record, point_from_json, write_point},
    params::{Params, parse_params},
    plugin::{BindingArgs, InputControllerArgs, InputPlugin},
};
use crate::{
    binding::{BindingReader, BindingTarget, BindingWriter},
    constraint::{
        ConstraintRef, NumberConstraintParams, PointNdConstraint, create_number_constraint,
        find_constraint,
    },
    controllers::{PointController, ValueController},
    error::{Error, Result},
};

/// Per-axis options.
#[derive(Debug, Clone, Default, Deserialize)]
struct AxisOptions {
    /// Lower bound.
    min: Option<f64>,
    /// Upper bound.
    max: Option<f64>,
    /// Step size.
    step: Option<f64>,
}

impl From<AxisOptions> for NumberConstraintParams {
    fn from(o: AxisOptions) -> Self {
        Self {
            step: o.step,
            min: o.min,
            max: o.max,
            options: None,
        }
    }
}

/// Binds `{x, y[, z[, w]]}` records. Each dimension is its own plugin, so
/// a record with more axes is claimed by the plugin of matching size.
#[derive(Debug, Clone)]
pub struct PointInputPlugin {
    /// Plugin identifier.
    id: String,
    /// Number of axes.
    dimensions: usize,
}

impl PointInputPlugin {
    /// A plugin for points of `dimensions` axes, clamped to `[2, 4]`.
    pub fn new(dimensions: usize) -> Self {
        let dimensions = dimensions.clamp(2, POINT_AXES.len());
        Self {
            id: format!("input-point{dimensions}d"),
            dimensions,
        }
    }

    /// Number of axes.
    pub fn dimensions(&self) -> usize {
        self.dimensions
    }
}

impl InputPlugin for PointInputPlugin {
    type Value = Vec<f64>;
    type Params = Vec<NumberConstraintParams>;

    fn id(&self) -> &str {
        &self.id
    }

    fn accept(&self, value: &JsonValue, params: &Params) -> Result<Option<Self::Params>> {
        if !is_point_record(value, self.dimensions) {
            return Ok(None);
        }
        POINT_AXES
            .iter()
            .take(self.dimensions)
            .map(|axis| match params.get(*axis) {
                None | Some(JsonValue::Null) => Ok(NumberConstraintParams::default()),
                Some(JsonValue::Object(o)) => parse_params::<AxisOptions>(o).map(Into::into),
                Some(_) => Err(Error::invalid_params(*axis)),
            })
            .collect::<Result<Vec<_>>>()
            .map(Some)
    }

    fn reader(&self, _args: &BindingArgs<'_, Self::Params>) -> BindingReader<Vec<f64>> {
        let dimensions = self.dimensions;
        Rc::new(move |v: &JsonValue| point_from_json(v, dimensions))
    }

    fn constraint(&self, args: &BindingArgs<'_, Self::Params>) -> Option<ConstraintRef<Vec<f64>>> {
        let initial = point_from_json(args.initial, self.dimensions);
        let components: Vec<_> = args
            .params
            .iter()
            .zip(initial)
            .map(|(p, v)| create_number_constraint(p, v))
            .collect();
        if components.iter().all(Option::is_none) {
            return None;
        }
        Some(Rc::new(PointNdConstraint::new(components)))
    }

    fn writer(&self, _args: &BindingArgs<'_, Self::Params>) -> BindingWriter<Vec<f64>> {
        Rc::new(|target: &BindingTarget, v: &Vec<f64>| write_point(target, v))
    }

    fn controller(
        &self,
        args: InputControllerArgs<'_, Vec<f64>, Self::Params>,
    ) -> Box<dyn ValueController> {
        let point = args
            .constraint
            .as_deref()
            .and_then(find_constraint::<PointNdConstraint, Vec<f64>>);
        Box::new(PointController::new(
            args.value,
            point,
            self.dimensions,
            args.view_props,
        ))
    }
}
