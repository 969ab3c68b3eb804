//! Storage layer abstraction.
//!
//! The inventory persists a small property graph through the [`GraphStore`]
//! contract. Which store backs a process is decided by configuration; see
//! [`AnyGraphStore`].

// Allow significant_drop_tightening - holding the store lock for a whole
// atomic step is the point of the step.
#![allow(clippy::significant_drop_tightening)]

pub mod graph;
pub mod traits;

pub use graph::{InMemoryGraphStore, SqliteGraphStore};
pub use traits::{GraphStats, GraphStore, GraphTxn};

use crate::Result;
use crate::config::{InventoryConfig, StoreKind};

/// A store selected at runtime.
pub enum AnyGraphStore {
    /// Ephemeral in-process store.
    Memory(InMemoryGraphStore),
    /// Persistent `SQLite` store.
    Sqlite(SqliteGraphStore),
}

impl AnyGraphStore {
    /// Opens the store selected by `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the `SQLite` database cannot be opened.
    pub fn open(config: &InventoryConfig) -> Result<Self> {
        match config.store {
            StoreKind::Memory => Ok(Self::Memory(InMemoryGraphStore::new())),
            StoreKind::Sqlite => Ok(Self::Sqlite(SqliteGraphStore::new(config.db_path.clone())?)),
        }
    }

    /// Short name for logs.
    #[must_use]
    pub const fn kind(&self) -> StoreKind {
        match self {
            Self::Memory(_) => StoreKind::Memory,
            Self::Sqlite(_) => StoreKind::Sqlite,
        }
    }
}

impl GraphStore for AnyGraphStore {
    fn atomically<R, F>(&self, operation: &str, f: F) -> Result<R>
    where
        F: FnOnce(&mut dyn GraphTxn) -> Result<R>,
    {
        match self {
            Self::Memory(store) => store.atomically(operation, f),
            Self::Sqlite(store) => store.atomically(operation, f),
        }
    }

    fn stats(&self) -> Result<GraphStats> {
        match self {
            Self::Memory(store) => store.stats(),
            Self::Sqlite(store) => store.stats(),
        }
    }
}
