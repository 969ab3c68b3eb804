//! Graph store implementations.
//!
//! # Available Stores
//!
//! | Store | Use Case | Persistence |
//! |-------|----------|-------------|
//! | [`SqliteGraphStore`] | Default; embedded | File (WAL) |
//! | [`InMemoryGraphStore`] | Testing, benchmarks | None |
//!
//! # Example
//!
//! ```rust,ignore
//! use asset_inventory::storage::graph::SqliteGraphStore;
//! use asset_inventory::storage::traits::GraphStore;
//!
//! let store = SqliteGraphStore::new("inventory.db")?;
//! let stats = store.stats()?;
//! println!("{} vertices", stats.vertex_count);
//! ```

mod memory;
mod sqlite;

pub use memory::InMemoryGraphStore;
pub use sqlite::SqliteGraphStore;

// Re-export trait for convenience
pub use crate::storage::traits::graph::{GraphStats, GraphStore};
