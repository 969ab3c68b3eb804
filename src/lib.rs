//! # Asset Inventory
//!
//! A time-bounded inventory of assets, the teams that own them, and the
//! parent/child relationships between them, all scoped to a versioned
//! universe namespace.
//!
//! ## Features
//!
//! - Temporal upsert engine: every observation widens an entity's
//!   `first_seen`/`last_seen`/`expiration` window instead of overwriting it
//! - Universe generations that coexist in one store without sharing vertices
//! - Bulk ingestion with a request-scoped identity cache
//! - Pluggable graph stores (in-memory, `SQLite`)
//! - REST API over axum (feature `http`, on by default)
//!
//! ## Example
//!
//! ```rust
//! use asset_inventory::models::{Asset, AssetId, Universe};
//! use asset_inventory::services::InventoryService;
//! use asset_inventory::storage::InMemoryGraphStore;
//!
//! let inventory = InventoryService::new(InMemoryGraphStore::new());
//! let universe = Universe::current();
//! let now = asset_inventory::current_timestamp();
//! let expiration = now + chrono::Duration::days(7);
//!
//! let (asset, existed) = inventory
//!     .set_asset(&Asset::new(AssetId::new("host", "h1")), expiration, Some(now), &universe)
//!     .unwrap();
//! assert!(!existed);
//! assert_eq!(asset.time.first_seen, asset.time.last_seen);
//! ```

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(missing_docs)]
#![forbid(unsafe_code)]
// multiple_crate_versions is inherently crate-level (detects duplicate transitive dependencies).
#![allow(clippy::multiple_crate_versions)]

use chrono::{DateTime, SubsecRound, Utc};
use thiserror::Error as ThisError;

// Module declarations
#[cfg(feature = "http")]
pub mod api;
pub mod config;
pub mod io;
pub mod models;
pub mod observability;
pub mod services;
pub mod storage;

// Re-exports for convenience
pub use config::InventoryConfig;
pub use models::{
    Asset, AssetFilter, AssetId, DbAsset, DbOwns, DbParentOf, DbTeam, DbUniverse, Owns, OwnsTime,
    PageRequest, ParentOf, Team, TimeAttr, Universe, UniverseVersion,
};
pub use services::{BulkAsset, BulkIngestion, BulkParent, BulkReport, InventoryService};
pub use storage::{GraphStore, InMemoryGraphStore, SqliteGraphStore};

/// Error type for inventory operations.
///
/// # Variant Selection Guide
///
/// | Scenario | Variant |
/// |----------|---------|
/// | Malformed input caught before the store is touched | `InvalidInput` |
/// | Entity or relationship missing (or missing in the universe) | `NotFound` |
/// | Strict create found an existing entity in the universe | `Conflict` |
/// | Store returned duplicates for a uniqueness-assumed query | `InconsistentState` |
/// | Store, filesystem or transport failure | `OperationFailed` |
///
/// Store failures are never translated into the domain variants: they reach
/// the caller as `OperationFailed`, and nothing in the crate retries them.
#[derive(Debug, ThisError)]
pub enum Error {
    /// Invalid input was provided.
    ///
    /// Raised when:
    /// - An asset type, asset identifier, team identifier or team name is empty
    /// - `expiration` precedes the observation `timestamp`
    /// - `end_time` precedes `start_time` on an ownership
    /// - A `parent_of` relationship would point an asset at itself
    /// - A universe version does not have the `xx.xx.xx` shape
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The referenced entity or relationship does not exist.
    ///
    /// Carries the offending identity (internal id or natural key).
    #[error("not found: {0}")]
    NotFound(String),

    /// A strict create found the entity already present in the universe.
    #[error("conflict: {0}")]
    Conflict(String),

    /// The store returned more than one result where at most one may exist.
    ///
    /// Always a bug or external data corruption; never retried.
    #[error("inconsistent state: {0}")]
    InconsistentState(String),

    /// An operation failed.
    ///
    /// Raised when:
    /// - `SQLite` database operations fail
    /// - A lock guarding the in-memory store is poisoned
    /// - Configuration or import files cannot be read or parsed
    /// - The HTTP listener cannot be bound
    #[error("operation '{operation}' failed: {cause}")]
    OperationFailed {
        /// The operation that failed.
        operation: String,
        /// The underlying cause.
        cause: String,
    },
}

impl Error {
    /// Builds a `NotFound` error naming `name`.
    pub fn not_found(name: impl std::fmt::Display) -> Self {
        Self::NotFound(name.to_string())
    }

    /// Builds a `Conflict` error naming `name`.
    pub fn conflict(name: impl std::fmt::Display) -> Self {
        Self::Conflict(name.to_string())
    }

    /// Builds an `OperationFailed` error.
    pub fn operation_failed(operation: &str, cause: impl std::fmt::Display) -> Self {
        Self::OperationFailed {
            operation: operation.to_string(),
            cause: cause.to_string(),
        }
    }
}

/// Result type alias for inventory operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Returns the current UTC time at the precision the stores persist
/// (microseconds).
///
/// # Examples
///
/// ```rust
/// use asset_inventory::current_timestamp;
///
/// let ts = current_timestamp();
/// assert_eq!(ts.timestamp_subsec_nanos() % 1_000, 0);
/// ```
#[must_use]
pub fn current_timestamp() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}
