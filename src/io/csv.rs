//! Load-generator CSV.
//!
//! Rows have no header and nine columns:
//!
//! ```text
//! seq,type,identifier,timestamp,expiration,parent_type,parent_identifier,parent_of_timestamp,parent_of_expiration
//! ```
//!
//! Times are Unix seconds. The parent columns are empty for assets without a
//! parent.

use crate::models::AssetId;
use crate::services::{BulkAsset, BulkParent};
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use std::io::Read;

const COLUMNS: usize = 9;

/// Reads every row into a bulk asset.
///
/// # Errors
///
/// Returns [`Error::InvalidInput`] naming the line of a malformed row.
pub fn read_assets<R: Read>(reader: R) -> Result<Vec<BulkAsset>> {
    let mut reader = ::csv::ReaderBuilder::new()
        .has_headers(false)
        .trim(::csv::Trim::All)
        .from_reader(reader);

    let mut assets = Vec::new();
    for (index, record) in reader.records().enumerate() {
        let line = index + 1;
        let record =
            record.map_err(|e| Error::InvalidInput(format!("line {line}: {e}")))?;
        assets.push(parse_record(&record).map_err(|e| match e {
            Error::InvalidInput(msg) => Error::InvalidInput(format!("line {line}: {msg}")),
            other => other,
        })?);
    }
    Ok(assets)
}

fn parse_record(record: &::csv::StringRecord) -> Result<BulkAsset> {
    if record.len() != COLUMNS {
        return Err(Error::InvalidInput(format!(
            "expected {COLUMNS} columns, found {}",
            record.len()
        )));
    }
    let field = |i: usize| record.get(i).unwrap_or_default();

    let parent_type = field(5);
    let parent_identifier = field(6);
    let parents = if parent_type.is_empty() || parent_identifier.is_empty() {
        Vec::new()
    } else {
        vec![BulkParent {
            asset_id: AssetId::new(parent_type, parent_identifier),
            timestamp: Some(unix_seconds("parent_of_timestamp", field(7))?),
            expiration: unix_seconds("parent_of_expiration", field(8))?,
        }]
    };

    Ok(BulkAsset {
        asset_id: AssetId::new(field(1), field(2)),
        timestamp: Some(unix_seconds("timestamp", field(3))?),
        expiration: unix_seconds("expiration", field(4))?,
        parents,
    })
}

fn unix_seconds(column: &str, value: &str) -> Result<DateTime<Utc>> {
    value
        .parse::<i64>()
        .ok()
        .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0))
        .ok_or_else(|| Error::InvalidInput(format!("invalid {column}: {value:?}")))
}
