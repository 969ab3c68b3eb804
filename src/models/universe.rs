//! Universes: versioned namespaces partitioning the inventory into
//! isolated generations.
//!
//! A universe is identified by `(namespace, version)`. The version is a
//! three-part `major.minor.patch` value, each part in `0..=99`, encoded into a
//! single integer so stores can compare it for equality:
//!
//! ```text
//! major * 100^2 + minor * 100 + patch
//! ```
//!
//! # Example
//!
//! ```rust
//! use asset_inventory::models::UniverseVersion;
//!
//! let version: UniverseVersion = "1.2.3".parse().unwrap();
//! assert_eq!(version.as_int(), 10_203);
//! assert_eq!(UniverseVersion::from_int(10_203).unwrap(), version);
//! ```

use super::graph::ElementId;
use crate::{Error, Result};
use std::fmt;
use std::str::FromStr;

const VERSION_BASE: i64 = 100;
const VERSION_SHAPE_ERROR: &str =
    "the version must have the following shape: xx.xx.xx where x is a digit";

/// Namespace of the universe used when none is configured.
pub const DEFAULT_NAMESPACE: &str = "asset-inventory";

/// Version of the universe used when none is configured.
pub const DEFAULT_VERSION: UniverseVersion = UniverseVersion {
    major: 0,
    minor: 0,
    patch: 1,
};

/// Three-part universe version, each part in `0..=99`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UniverseVersion {
    major: u8,
    minor: u8,
    patch: u8,
}

impl UniverseVersion {
    /// Creates a version from its parts.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if any part exceeds 99.
    pub fn new(major: u8, minor: u8, patch: u8) -> Result<Self> {
        if major > 99 || minor > 99 || patch > 99 {
            return Err(Error::InvalidInput(VERSION_SHAPE_ERROR.to_string()));
        }
        Ok(Self {
            major,
            minor,
            patch,
        })
    }

    /// Major part.
    #[must_use]
    pub const fn major(self) -> u8 {
        self.major
    }

    /// Minor part.
    #[must_use]
    pub const fn minor(self) -> u8 {
        self.minor
    }

    /// Patch part.
    #[must_use]
    pub const fn patch(self) -> u8 {
        self.patch
    }

    /// Integer encoding persisted on the universe vertex.
    #[must_use]
    pub fn as_int(self) -> i64 {
        i64::from(self.major) * VERSION_BASE * VERSION_BASE
            + i64::from(self.minor) * VERSION_BASE
            + i64::from(self.patch)
    }

    /// Decodes the integer encoding.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if `value` is outside `0..=999_999`.
    pub fn from_int(value: i64) -> Result<Self> {
        if !(0..VERSION_BASE.pow(3)).contains(&value) {
            return Err(Error::InvalidInput(format!(
                "universe version {value} out of range"
            )));
        }
        let part = |v: i64| {
            u8::try_from(v % VERSION_BASE).map_err(|e| Error::InvalidInput(e.to_string()))
        };
        Self::new(
            part(value / (VERSION_BASE * VERSION_BASE))?,
            part(value / VERSION_BASE)?,
            part(value)?,
        )
    }
}

impl FromStr for UniverseVersion {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let shape_error = || Error::InvalidInput(VERSION_SHAPE_ERROR.to_string());
        let parts: Vec<&str> = s.split('.').collect();
        if parts.len() != 3 {
            return Err(shape_error());
        }
        let mut numbers = [0_u8; 3];
        for (slot, part) in numbers.iter_mut().zip(&parts) {
            if part.is_empty() || part.len() > 2 || !part.bytes().all(|b| b.is_ascii_digit()) {
                return Err(shape_error());
            }
            *slot = part.parse().map_err(|_| shape_error())?;
        }
        Self::new(numbers[0], numbers[1], numbers[2])
    }
}

impl fmt::Display for UniverseVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// A universe generation: `(namespace, version)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Universe {
    /// Namespace shared by all generations of one inventory.
    pub namespace: String,
    /// Generation version.
    pub version: UniverseVersion,
}

impl Universe {
    /// Creates a universe.
    #[must_use]
    pub fn new(namespace: impl Into<String>, version: UniverseVersion) -> Self {
        Self {
            namespace: namespace.into(),
            version,
        }
    }

    /// The universe the inventory writes to unless configured otherwise.
    #[must_use]
    pub fn current() -> Self {
        Self::new(DEFAULT_NAMESPACE, DEFAULT_VERSION)
    }
}

impl Default for Universe {
    fn default() -> Self {
        Self::current()
    }
}

impl fmt::Display for Universe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.namespace, self.version)
    }
}

/// A persisted universe vertex.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbUniverse {
    /// Internal vertex id.
    pub vid: ElementId,
    /// The universe it marks.
    pub universe: Universe,
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("0.0.1", 1 ; "patch only")]
    #[test_case("1.2.3", 10_203 ; "all parts")]
    #[test_case("99.99.99", 999_999 ; "maximum")]
    #[test_case("01.2.03", 10_203 ; "leading zeros")]
    fn test_parse_and_encode(input: &str, encoded: i64) {
        let version: UniverseVersion = input.parse().unwrap();
        assert_eq!(version.as_int(), encoded);
        assert_eq!(UniverseVersion::from_int(encoded).unwrap(), version);
    }

    #[test_case("" ; "empty")]
    #[test_case("1.2" ; "two parts")]
    #[test_case("1.2.3.4" ; "four parts")]
    #[test_case("100.0.0" ; "three digits")]
    #[test_case("1..3" ; "empty part")]
    #[test_case("a.b.c" ; "letters")]
    #[test_case("1.2.-3" ; "sign")]
    fn test_parse_rejects(input: &str) {
        let err = input.parse::<UniverseVersion>().unwrap_err();
        assert!(err.to_string().contains("xx.xx.xx"));
    }

    #[test]
    fn test_from_int_rejects_out_of_range() {
        assert!(UniverseVersion::from_int(-1).is_err());
        assert!(UniverseVersion::from_int(1_000_000).is_err());
    }

    #[test]
    fn test_new_rejects_large_parts() {
        assert!(UniverseVersion::new(100, 0, 0).is_err());
        assert!(UniverseVersion::new(0, 0, 100).is_err());
    }

    #[test]
    fn test_display() {
        let version = UniverseVersion::new(1, 20, 3).unwrap();
        assert_eq!(version.to_string(), "1.20.3");
        assert_eq!(Universe::current().to_string(), "asset-inventory@0.0.1");
    }
}
