use std::result::Result as StdResult;

use serde_json::{Map as JsonMap, Value as JsonValue};
use thiserror::Error;

/// Result type for knobs operations.
pub type Result<T> = StdResult<T, Error>;

/// Failure to parse a state or params record against a schema.
#[derive(PartialEq, Eq, Error, Debug, Clone)]
#[error("{message}")]
pub struct ParseError {
    /// The offending field, when one could be identified.
    field: Option<String>,
    /// Parse error message.
    message: String,
}

impl ParseError {
    /// Construct a parse error from a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            field: None,
            message: message.into(),
        }
    }

    /// Construct a parse error attributed to a field.
    pub fn with_field(field: impl Into<String>, message: impl Into<String>) -> Self {
        let field = field.into();
        let message = message.into();
        Self {
            message: format!("{field}: {message}"),
            field: Some(field),
        }
    }

    /// The field that failed to parse, if known.
    pub fn field(&self) -> Option<&str> {
        self.field.as_deref()
    }
}

/// Core error type.
#[derive(PartialEq, Error, Debug, Clone)]
pub enum Error {
    /// A disposed controller or API was mutated.
    #[error("already disposed")]
    AlreadyDisposed,

    /// Plugin options were malformed.
    #[error("invalid parameters: {name}")]
    InvalidParams {
        /// Name of the offending option.
        name: String,
    },

    /// No input or monitor plugin accepted the bound value.
    #[error("no matching controller for key: {key}")]
    NoMatchingController {
        /// The bound key.
        key: String,
    },

    /// No blade plugin accepted the params.
    #[error("no matching view for params: {}", JsonValue::Object(.params.clone()))]
    NoMatchingView {
        /// The params that were offered.
        params: JsonMap<String, JsonValue>,
    },

    /// The binding target is not a bindable record.
    #[error("target is not bindable")]
    NotBindable,

    /// A plugin was built against an incompatible core version.
    #[error("plugin {bundle}/{id} is not compatible with core {}", crate::core::semver::Semver::core())]
    NotCompatible {
        /// Bundle the plugin was registered under.
        bundle: String,
        /// Plugin identifier.
        id: String,
    },

    /// The bound key does not exist on the target.
    #[error("property not found: {name}")]
    PropertyNotFound {
        /// The missing property name.
        name: String,
    },

    /// An internal invariant was violated.
    #[error("internal invariant violated")]
    ShouldNeverHappen,
}

impl Error {
    /// Build an invalid-params error for a field.
    pub fn invalid_params(name: impl Into<String>) -> Self {
        Self::InvalidParams { name: name.into() }
    }
}

impl From<ParseError> for Error {
    fn from(e: ParseError) -> Self {
        Self::InvalidParams {
            name: e.field.unwrap_or(e.message),
        }
    }
}
