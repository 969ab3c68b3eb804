//! Bulk payload readers.
//!
//! Two formats feed [`BulkIngestion`](crate::services::BulkIngestion):
//!
//! | Format | Shape |
//! |--------|-------|
//! | JSON | `{"assets": [...]}`, the body of `POST /v1/assets/bulk` |
//! | CSV | load-generator rows, one asset and at most one parent per row |

pub mod csv;

use crate::services::BulkAsset;
use crate::{Error, Result};
use serde::Deserialize;
use std::fmt;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;

/// Supported bulk payload formats.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ImportFormat {
    /// Bulk request JSON.
    #[default]
    Json,
    /// Load-generator CSV.
    Csv,
}

impl ImportFormat {
    /// Detects format from file extension.
    ///
    /// # Errors
    ///
    /// Returns an error if the extension is not recognized.
    pub fn from_path(path: &Path) -> Result<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .ok_or_else(|| {
                Error::InvalidInput(format!("cannot detect format of {}", path.display()))
            })?
            .parse()
    }
}

impl FromStr for ImportFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "csv" => Ok(Self::Csv),
            other => Err(Error::InvalidInput(format!("unknown import format: {other}"))),
        }
    }
}

impl fmt::Display for ImportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json => write!(f, "json"),
            Self::Csv => write!(f, "csv"),
        }
    }
}

#[derive(Deserialize)]
struct BulkPayload {
    assets: Vec<BulkAsset>,
}

/// Reads a whole bulk payload.
///
/// # Errors
///
/// Returns [`Error::InvalidInput`] for a malformed payload.
pub fn read_bulk<R: Read>(format: ImportFormat, reader: R) -> Result<Vec<BulkAsset>> {
    match format {
        ImportFormat::Json => serde_json::from_reader::<_, BulkPayload>(reader)
            .map(|payload| payload.assets)
            .map_err(|e| Error::InvalidInput(format!("invalid bulk JSON: {e}"))),
        ImportFormat::Csv => csv::read_assets(reader),
    }
}
