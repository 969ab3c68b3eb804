//! Asset identity and persisted asset records.

use super::graph::ElementId;
use super::temporal::TimeAttr;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Natural key of an asset.
///
/// Immutable once created; equality and hashing use `(type, identifier)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AssetId {
    /// Asset type, e.g. `"hostname"` or `"AWSAccount"`.
    #[serde(rename = "type")]
    pub asset_type: String,
    /// Identifier, unique within the type.
    pub identifier: String,
}

impl AssetId {
    /// Creates an asset id.
    #[must_use]
    pub fn new(asset_type: impl Into<String>, identifier: impl Into<String>) -> Self {
        Self {
            asset_type: asset_type.into(),
            identifier: identifier.into(),
        }
    }

    /// Rejects empty components.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if the type or the identifier is empty.
    pub fn validate(&self) -> Result<()> {
        if self.asset_type.is_empty() {
            return Err(Error::InvalidInput("asset type is empty".to_string()));
        }
        if self.identifier.is_empty() {
            return Err(Error::InvalidInput("asset identifier is empty".to_string()));
        }
        Ok(())
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.asset_type, self.identifier)
    }
}

/// An asset as supplied by a caller.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Asset {
    /// Natural key.
    pub asset_id: AssetId,
}

impl Asset {
    /// Creates an asset.
    #[must_use]
    pub const fn new(asset_id: AssetId) -> Self {
        Self { asset_id }
    }
}

impl From<AssetId> for Asset {
    fn from(asset_id: AssetId) -> Self {
        Self::new(asset_id)
    }
}

/// A persisted asset vertex.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbAsset {
    /// Internal vertex id.
    pub vid: ElementId,
    /// Natural key.
    pub asset_id: AssetId,
    /// Observed validity window.
    pub time: TimeAttr,
}
