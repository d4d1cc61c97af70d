//! The APIs of list, slider and text blades.

use std::rc::{Rc, Weak};

use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value as JsonValue;

use super::{
    BladeApi,
    blade::{blade_api, extended_api},
    event::{ApiEvent, emit_change},
};
use crate::{
    blade::BladeRef,
    constraint::ListItem,
    controllers::{
        ListController, ListOptionsRef, SliderController, TextController, ValueBladeBody,
    },
    emitter::{Emitter, Subscription},
    error::Result,
    plugins::PluginPool,
    value::{ComplexValue, Value},
};

/// Host-facing handle to a blade owning a value of type `T`.
pub struct ValueBladeApi<T> {
    /// Generic part.
    blade: BladeApi,
    /// The owned value.
    value: Rc<ComplexValue<T>>,
    /// Label text.
    label: Rc<ComplexValue<Option<String>>>,
    /// `change` events.
    emitter: Emitter<ApiEvent>,
    /// Listener on the value.
    _sub: Option<Subscription>,
}

blade_api!(ValueBladeApi<T>);

impl<T> ValueBladeApi<T>
where
    T: Clone + PartialEq + Serialize + DeserializeOwned + 'static,
{
    /// Wrap a value blade over `T`. `None` for other blades.
    pub fn new(controller: BladeRef, pool: Rc<PluginPool>) -> Option<Self> {
        let body = controller.body_as::<ValueBladeBody<T>>()?;
        let value = body.value().clone();
        let label = body.label().label.clone();
        let emitter = Emitter::new();
        let weak_emitter = emitter.downgrade();
        let weak_controller: Weak<_> = Rc::downgrade(&controller);
        let sub = controller.body().on_value_change(Rc::new(move |options, internal| {
            if let (Some(emitter), Some(controller)) =
                (weak_emitter.upgrade(), weak_controller.upgrade())
            {
                emit_change(&emitter, &controller, options, internal);
            }
        }));
        Some(Self {
            blade: BladeApi::new(controller, pool),
            value,
            label,
            emitter,
            _sub: sub,
        })
    }

    /// `change` events.
    pub fn emitter(&self) -> &Emitter<ApiEvent> {
        &self.emitter
    }

    /// The value.
    pub fn value(&self) -> T {
        self.value.raw_value()
    }

    /// Replace the value. The blade's constraint applies.
    pub fn set_value(&self, value: T) -> Result<()> {
        self.ensure_live()?;
        self.value.set(value);
        Ok(())
    }

    /// The label.
    pub fn label(&self) -> Option<String> {
        self.label.raw_value()
    }

    /// Replace the label.
    pub fn set_label(&self, label: Option<String>) -> Result<()> {
        self.ensure_live()?;
        self.label.set(label);
        Ok(())
    }
}

/// Host-facing handle to a `list` blade.
pub struct ListBladeApi {
    /// The value blade API it extends.
    base: Rc<ValueBladeApi<JsonValue>>,
    /// The choices.
    options: ListOptionsRef<JsonValue>,
}

extended_api!(ListBladeApi => ValueBladeApi<JsonValue>);

impl ListBladeApi {
    /// Wrap a list blade. `None` for other blades.
    pub fn new(controller: BladeRef, pool: Rc<PluginPool>) -> Option<Self> {
        let options = controller
            .body_as::<ValueBladeBody<JsonValue>>()?
            .controller_as::<ListController<JsonValue>>()?
            .options()
            .clone();
        Some(Self {
            base: Rc::new(ValueBladeApi::new(controller, pool)?),
            options,
        })
    }

    /// The choices, in display order.
    pub fn options(&self) -> Vec<ListItem<JsonValue>> {
        self.options.raw_value()
    }

    /// Replace the choices. A value that is no longer a choice becomes the
    /// first one.
    pub fn set_options(&self, options: Vec<ListItem<JsonValue>>) -> Result<()> {
        self.ensure_live()?;
        self.options.set(options);
        Ok(())
    }
}

/// Host-facing handle to a `slider` blade.
pub struct SliderBladeApi {
    /// The value blade API it extends.
    base: Rc<ValueBladeApi<f64>>,
    /// Left end of the range.
    min: Rc<ComplexValue<f64>>,
    /// Right end of the range.
    max: Rc<ComplexValue<f64>>,
}

extended_api!(SliderBladeApi => ValueBladeApi<f64>);

impl SliderBladeApi {
    /// Wrap a slider blade. `None` for other blades.
    pub fn new(controller: BladeRef, pool: Rc<PluginPool>) -> Option<Self> {
        let props = controller
            .body_as::<ValueBladeBody<f64>>()?
            .controller_as::<SliderController>()?
            .props();
        let (min, max) = (props.min.clone(), props.max.clone());
        Some(Self {
            base: Rc::new(ValueBladeApi::new(controller, pool)?),
            min,
            max,
        })
    }

    /// Left end of the range.
    pub fn min(&self) -> f64 {
        self.min.raw_value()
    }

    /// Move the left end. The value is clamped into the new range.
    pub fn set_min(&self, min: f64) -> Result<()> {
        self.ensure_live()?;
        self.min.set(min);
        Ok(())
    }

    /// Right end of the range.
    pub fn max(&self) -> f64 {
        self.max.raw_value()
    }

    /// Move the right end. The value is clamped into the new range.
    pub fn set_max(&self, max: f64) -> Result<()> {
        self.ensure_live()?;
        self.max.set(max);
        Ok(())
    }
}

/// Host-facing handle to a `text` blade.
pub struct TextBladeApi {
    /// The value blade API it extends.
    base: Rc<ValueBladeApi<JsonValue>>,
}

extended_api!(TextBladeApi => ValueBladeApi<JsonValue>);

impl TextBladeApi {
    /// Wrap a text blade. `None` for other blades.
    pub fn new(controller: BladeRef, pool: Rc<PluginPool>) -> Option<Self> {
        controller
            .body_as::<ValueBladeBody<JsonValue>>()?
            .controller_as::<TextController<JsonValue>>()?;
        Some(Self {
            base: Rc::new(ValueBladeApi::new(controller, pool)?),
        })
    }

    /// The text controller.
    fn text_controller(&self) -> Option<&TextController<JsonValue>> {
        self.controller()
            .body_as::<ValueBladeBody<JsonValue>>()?
            .controller_as::<TextController<JsonValue>>()
    }

    /// The value as the text field shows it.
    pub fn text(&self) -> String {
        self.text_controller()
            .map(TextController::text)
            .unwrap_or_default()
    }

    /// Commit text as a user would. Returns false if the text was rejected
    /// or the blade is disabled.
    pub fn input_text(&self, text: &str) -> Result<bool> {
        self.ensure_live()?;
        Ok(self.text_controller().is_some_and(|c| c.input_text(text)))
    }
}
