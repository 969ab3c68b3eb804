//! Business logic services.
//!
//! Services orchestrate a [`GraphStore`](crate::storage::GraphStore) and
//! provide the inventory's high-level operations.

mod bulk;
pub(crate) mod inventory;
pub mod universe;

pub use bulk::{BulkAsset, BulkIngestion, BulkParent, BulkReport};
pub use inventory::InventoryService;
