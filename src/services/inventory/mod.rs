//! Temporal upsert engine and query layer.
//!
//! [`InventoryService`] is the single entry point for reading and writing the
//! inventory. Every public operation runs as one atomic step on the
//! underlying [`GraphStore`]: lookups, existence checks and writes that
//! decide between "create" and "merge" are never split across steps, so
//! concurrent upserts of the same identity cannot both create.
//!
//! # Operations
//!
//! | Entity | Strict create | Upsert | By internal id | Listing |
//! |--------|---------------|--------|----------------|---------|
//! | Team | `add_team` | `set_team` | `team`, `update_team`, `drop_team` | `teams` |
//! | Asset | `add_asset` | `set_asset` | `asset`, `update_asset`, `drop_asset` | `assets` |
//! | `parent_of` | | `set_parent_of` | `parent_of`, `drop_parent_of` | `parents`, `children` |
//! | `owns` | | `set_owns` | `owns`, `drop_owns` | `owners` |
//!
//! # Identity and Universes
//!
//! Natural keys (asset id, team identifier) are looked up store-wide; the
//! result is then narrowed to the vertex linked to the caller's universe. A
//! vertex found only in another universe is never reused or mutated: the
//! write creates a fresh vertex in the caller's universe instead.
//!
//! The service holds no state between calls and never logs; it only opens
//! tracing spans.

pub(crate) mod codec;
mod assets;
mod owners;
mod parents;
mod teams;

use crate::models::{ElementId, VertexLabel};
use crate::services::universe;
use crate::storage::traits::{GraphStore, GraphTxn, Vertex, VertexQuery};
use crate::{Error, Result};
use std::fmt::Display;
use std::sync::Arc;

/// High-level service for inventory operations.
///
/// # Thread Safety
///
/// The service is cheap to clone and thread-safe when the store is. Both
/// [`SqliteGraphStore`](crate::storage::SqliteGraphStore) and
/// [`InMemoryGraphStore`](crate::storage::InMemoryGraphStore) are.
pub struct InventoryService<S: GraphStore> {
    store: Arc<S>,
}

impl<S: GraphStore> Clone for InventoryService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: GraphStore> InventoryService<S> {
    /// Creates a new service over the given store.
    pub fn new(store: S) -> Self {
        Self {
            store: Arc::new(store),
        }
    }

    /// Returns a reference to the underlying store.
    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }
}

/// Loads a vertex that must exist with `label`; anything else is `NotFound(vid)`.
pub(crate) fn vertex_with_label(
    txn: &mut dyn GraphTxn,
    vid: &ElementId,
    label: VertexLabel,
) -> Result<Vertex> {
    match txn.vertex(vid)? {
        Some(vertex) if vertex.label == label => Ok(vertex),
        _ => Err(Error::not_found(vid)),
    }
}

/// Store-wide natural-key lookup narrowed to the vertex linked to `universe_vid`.
///
/// `what` names the key in the `InconsistentState` raised when the universe
/// holds more than one match.
pub(crate) fn find_linked(
    txn: &mut dyn GraphTxn,
    query: &VertexQuery,
    universe_vid: &ElementId,
    what: &dyn Display,
) -> Result<Option<Vertex>> {
    let mut linked = Vec::new();
    for vertex in txn.find_vertices(query)? {
        if universe::is_linked_in(txn, &vertex.id, universe_vid)? {
            linked.push(vertex);
        }
    }
    match linked.len() {
        0 | 1 => Ok(linked.pop()),
        n => Err(Error::InconsistentState(format!(
            "{n} {} vertices for {what} in one universe",
            query.label
        ))),
    }
}
