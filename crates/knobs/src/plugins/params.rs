//! Plugin options.
//!
//! Options arrive as a JSON record. The pool parses the shared base options
//! once; each plugin parses its own fields from the same record. Unknown
//! keys are ignored and a wrongly typed key fails with
//! [`Error::InvalidParams`].

use std::time::Duration;

use serde::{Deserialize, de::DeserializeOwned};
use serde_json::{Map as JsonMap, Value as JsonValue};

use crate::{
    constraint::ListItem,
    error::{Error, Result},
    state::parse_record,
    view_props::ViewProps,
};

/// Plugin options as supplied by the host.
pub type Params = JsonMap<String, JsonValue>;

/// Default monitor polling period, in milliseconds.
pub const DEFAULT_INTERVAL_MS: f64 = 200.0;

/// Default visible rows of a multiline monitor.
pub const DEFAULT_ROWS: usize = 3;

/// Options shared by every binding.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BindingParams {
    /// Initial own disabled flag.
    pub disabled: Option<bool>,
    /// Initial own hidden flag.
    pub hidden: Option<bool>,
    /// Raw insertion index in the enclosing container.
    pub index: Option<usize>,
    /// Label. Defaults to the bound key.
    pub label: Option<String>,
    /// Host tag.
    pub tag: Option<String>,
    /// View hint.
    pub view: Option<String>,
    /// Bind as a monitor.
    pub readonly: Option<bool>,
    /// Monitor history length.
    pub buffer_size: Option<usize>,
    /// Monitor polling period in milliseconds. Zero disables polling.
    pub interval: Option<f64>,
}

impl BindingParams {
    /// Fresh view props carrying the initial flags.
    pub fn view_props(&self) -> ViewProps {
        ViewProps::create(
            self.disabled.unwrap_or(false),
            self.hidden.unwrap_or(false),
        )
    }

    /// The label for a binding of `key`.
    pub fn label_for(&self, key: &str) -> String {
        self.label.clone().unwrap_or_else(|| key.to_string())
    }

    /// The monitor polling period.
    pub fn interval(&self) -> Duration {
        let ms = self.interval.unwrap_or(DEFAULT_INTERVAL_MS);
        Duration::try_from_secs_f64(ms / 1000.0).unwrap_or(Duration::ZERO)
    }

    /// True if the view hint is `view`.
    pub fn is_view(&self, view: &str) -> bool {
        self.view.as_deref() == Some(view)
    }
}

/// Options shared by every blade.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BladeParams {
    /// Initial own disabled flag.
    pub disabled: Option<bool>,
    /// Initial own hidden flag.
    pub hidden: Option<bool>,
    /// Raw insertion index in the enclosing container.
    pub index: Option<usize>,
    /// The blade kind.
    pub view: Option<String>,
}

impl BladeParams {
    /// Fresh view props carrying the initial flags.
    pub fn view_props(&self) -> ViewProps {
        ViewProps::create(
            self.disabled.unwrap_or(false),
            self.hidden.unwrap_or(false),
        )
    }
}

/// Choices, either as `[{text, value}]` or as `{text: value}`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ListOptions<T> {
    /// Labelled items in order.
    Items(Vec<ListItem<T>>),
    /// Text to value, in insertion order.
    Map(JsonMap<String, JsonValue>),
}

impl<T: DeserializeOwned> ListOptions<T> {
    /// Normalize to labelled items.
    pub fn into_items(self) -> Result<Vec<ListItem<T>>> {
        match self {
            Self::Items(items) => Ok(items),
            Self::Map(map) => map
                .into_iter()
                .map(|(text, v)| {
                    serde_json::from_value(v)
                        .map(|value| ListItem { text, value })
                        .map_err(|_| Error::invalid_params("options"))
                })
                .collect(),
        }
    }
}

/// Parse a plugin's option schema from the host's params.
pub fn parse_params<S: DeserializeOwned>(params: &Params) -> Result<S> {
    Ok(parse_record(params)?)
}

/// The `view` option, when it is a string.
pub fn view_of(params: &Params) -> Option<&str> {
    params.get("view").and_then(JsonValue::as_str)
}

/// Visible-row options of log monitors.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LogParams {
    /// Show the whole history instead of the latest sample.
    pub multiline: Option<bool>,
    /// Visible rows when multiline.
    pub rows: Option<usize>,
}

impl LogParams {
    /// Visible rows, when multiline.
    pub fn rows(&self) -> Option<usize> {
        self.multiline
            .unwrap_or(false)
            .then(|| self.rows.unwrap_or(DEFAULT_ROWS))
    }
}
