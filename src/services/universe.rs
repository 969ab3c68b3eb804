//! Universe manager.
//!
//! A universe vertex marks one generation of the inventory. Every team and
//! asset vertex is linked to exactly one universe at creation time through a
//! `universe_of` edge (universe → entity) that is never retargeted.
//!
//! The `*_in` helpers operate inside an atomic step so that the upsert engine
//! can resolve, create and link in one indivisible store operation. The
//! public operations on [`InventoryService`] wrap them in their own step.

use super::InventoryService;
use super::inventory::codec::{self, keys};
use crate::models::{DbUniverse, EdgeLabel, ElementId, Universe, VertexLabel};
use crate::storage::traits::{EdgeQuery, GraphStore, GraphTxn, Predicate, Properties, VertexQuery};
use crate::{Error, Result};
use tracing::instrument;

fn universe_query(universe: &Universe) -> VertexQuery {
    VertexQuery::new(VertexLabel::Universe)
        .with(Predicate::equals(keys::NAMESPACE, universe.namespace.as_str()))
        .with(Predicate::equals(keys::VERSION, universe.version.as_int()))
}

/// Looks up the universe vertex without creating it.
pub(crate) fn find_in(txn: &mut dyn GraphTxn, universe: &Universe) -> Result<Option<ElementId>> {
    let mut found = txn.find_vertices(&universe_query(universe))?;
    match found.len() {
        0 => Ok(None),
        1 => Ok(found.pop().map(|v| v.id)),
        n => Err(Error::InconsistentState(format!(
            "{n} universe vertices for {universe}"
        ))),
    }
}

/// Find-or-create of the universe vertex.
pub(crate) fn ensure_in(txn: &mut dyn GraphTxn, universe: &Universe) -> Result<ElementId> {
    if let Some(vid) = find_in(txn, universe)? {
        return Ok(vid);
    }
    let mut properties = Properties::new();
    properties.insert(keys::NAMESPACE.to_string(), universe.namespace.as_str().into());
    properties.insert(keys::VERSION.to_string(), universe.version.as_int().into());
    Ok(txn.create_vertex(VertexLabel::Universe, properties)?.id)
}

/// Whether `entity_vid` hangs off the universe vertex `universe_vid`.
pub(crate) fn is_linked_in(
    txn: &mut dyn GraphTxn,
    entity_vid: &ElementId,
    universe_vid: &ElementId,
) -> Result<bool> {
    let edges = txn.find_edges(
        &EdgeQuery::new(EdgeLabel::UniverseOf)
            .source(universe_vid.clone())
            .target(entity_vid.clone()),
    )?;
    Ok(!edges.is_empty())
}

/// Links a freshly created entity to its universe.
pub(crate) fn link_in(
    txn: &mut dyn GraphTxn,
    universe_vid: &ElementId,
    entity_vid: &ElementId,
) -> Result<()> {
    txn.create_edge(
        EdgeLabel::UniverseOf,
        universe_vid,
        entity_vid,
        Properties::new(),
    )?;
    Ok(())
}

/// Resolves the universe an entity is linked to.
pub(crate) fn linked_universe_in(
    txn: &mut dyn GraphTxn,
    entity_vid: &ElementId,
) -> Result<DbUniverse> {
    if txn.vertex(entity_vid)?.is_none() {
        return Err(Error::not_found(entity_vid));
    }
    let mut links =
        txn.find_edges(&EdgeQuery::new(EdgeLabel::UniverseOf).target(entity_vid.clone()))?;
    let link = match links.len() {
        0 => return Err(Error::not_found(entity_vid)),
        1 => links.pop(),
        n => {
            return Err(Error::InconsistentState(format!(
                "{entity_vid} is linked to {n} universes"
            )));
        },
    };
    let universe_vid = link
        .map(|edge| edge.from)
        .ok_or_else(|| Error::not_found(entity_vid))?;
    let vertex = txn
        .vertex(&universe_vid)?
        .ok_or_else(|| Error::InconsistentState(format!("dangling universe link to {universe_vid}")))?;
    codec::universe_from_vertex(&vertex)
}

impl<S: GraphStore> InventoryService<S> {
    /// Returns the id of the universe vertex, creating it if needed.
    ///
    /// Idempotent, and safe for concurrent callers converging on the same
    /// universe: the lookup and the create form one atomic step.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InconsistentState`] if several vertices mark the same
    /// universe, or a store error.
    #[instrument(skip(self), fields(universe = %universe))]
    pub fn ensure_universe(&self, universe: &Universe) -> Result<ElementId> {
        self.store()
            .atomically("ensure_universe", |txn| ensure_in(txn, universe))
    }

    /// Whether `entity_vid` is linked to `universe`.
    ///
    /// Returns `false` when the universe vertex does not exist yet.
    ///
    /// # Errors
    ///
    /// Returns a store error.
    pub fn is_linked(&self, entity_vid: &ElementId, universe: &Universe) -> Result<bool> {
        self.store().atomically("is_linked", |txn| {
            match find_in(txn, universe)? {
                Some(universe_vid) => is_linked_in(txn, entity_vid, &universe_vid),
                None => Ok(false),
            }
        })
    }

    /// Resolves the universe linked to an entity.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the entity does not exist or is not
    /// linked to any universe.
    pub fn linked_universe(&self, entity_vid: &ElementId) -> Result<DbUniverse> {
        self.store()
            .atomically("linked_universe", |txn| linked_universe_in(txn, entity_vid))
    }

    /// Returns the persisted vertex of `universe`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] until something has been written to the
    /// universe (or it was ensured explicitly).
    pub fn current_universe(&self, universe: &Universe) -> Result<DbUniverse> {
        self.store().atomically("current_universe", |txn| {
            let vid = find_in(txn, universe)?.ok_or_else(|| Error::not_found(universe))?;
            Ok(DbUniverse {
                vid,
                universe: universe.clone(),
            })
        })
    }
}
