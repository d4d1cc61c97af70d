//! Core version tags for plugin compatibility checks.

use std::{fmt, str::FromStr, sync::LazyLock};

use regex::Regex;

use super::error::ParseError;

/// Matches `major.minor.patch[-prerelease]`.
static SEMVER: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^(\d+)\.(\d+)\.(\d+)(?:-([0-9A-Za-z.-]+))?$").ok());

/// A semantic version.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Semver {
    /// Major version.
    pub major: u64,
    /// Minor version.
    pub minor: u64,
    /// Patch version.
    pub patch: u64,
    /// Pre-release tag.
    pub pre_release: Option<String>,
}

impl Semver {
    /// Construct a release version.
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
            pre_release: None,
        }
    }

    /// The version of this crate.
    pub fn core() -> Self {
        env!("CARGO_PKG_VERSION").parse().unwrap_or_default()
    }

    /// True if a plugin built against `self` can run on `core`.
    pub fn is_compatible_with(&self, core: &Self) -> bool {
        self.major == core.major
    }
}

impl FromStr for Semver {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, ParseError> {
        let invalid = || ParseError::with_field("core", format!("invalid version: {s}"));
        let caps = SEMVER.as_ref().and_then(|re| re.captures(s)).ok_or_else(invalid)?;
        let num = |i: usize| caps[i].parse::<u64>().map_err(|_| invalid());
        Ok(Self {
            major: num(1)?,
            minor: num(2)?,
            patch: num(3)?,
            pre_release: caps.get(4).map(|m| m.as_str().to_string()),
        })
    }
}

impl fmt::Display for Semver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;
        if let Some(pre) = &self.pre_release {
            write!(f, "-{pre}")?;
        }
        Ok(())
    }
}
