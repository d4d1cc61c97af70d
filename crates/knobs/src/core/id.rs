use std::{cell::Cell, fmt, str::FromStr};

use crate::{error, error::Result};

thread_local! {
    /// Counter for blade identifiers.
    static NEXT_BLADE: Cell<u64> = const { Cell::new(1) };
}

/// Opaque identifier for a blade controller, unique within a thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BladeId(u64);

impl BladeId {
    /// Allocate a fresh identifier.
    pub fn next() -> Self {
        NEXT_BLADE.with(|n| {
            let id = n.get();
            n.set(id + 1);
            Self(id)
        })
    }
}

impl fmt::Display for BladeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "blade-{}", self.0)
    }
}

/// Return true if the character is valid in a plugin id.
pub fn valid_plugin_id_char(c: char) -> bool {
    c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-'
}

/// Return true if the full id is valid.
pub fn valid_plugin_id(id: &str) -> bool {
    !id.is_empty() && !id.starts_with('-') && id.chars().all(valid_plugin_id_char)
}

/// A plugin id, which consists of lowercase ASCII alphanumeric characters
/// and dashes, eg. `input-number`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PluginId {
    /// Stored id string.
    id: String,
}

impl PluginId {
    /// Create a plugin id, returning an error if it contains invalid
    /// characters.
    pub fn new(id: &str) -> Result<Self> {
        if !valid_plugin_id(id) {
            return Err(error::Error::invalid_params(format!("id: {id}")));
        }
        Ok(Self { id: id.to_string() })
    }

    /// The id string.
    pub fn as_str(&self) -> &str {
        &self.id
    }
}

impl FromStr for PluginId {
    type Err = error::Error;
    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl TryFrom<&str> for PluginId {
    type Error = error::Error;
    fn try_from(id: &str) -> Result<Self> {
        Self::new(id)
    }
}

impl fmt::Display for PluginId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id)
    }
}

impl PartialEq<&str> for PluginId {
    fn eq(&self, other: &&str) -> bool {
        self.id == *other
    }
}
