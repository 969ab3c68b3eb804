//! `parent_of` upserts and hierarchy listings.

use super::{InventoryService, codec, vertex_with_label};
use crate::models::{
    DbParentOf, EdgeLabel, ElementId, Observation, PageRequest, ParentOf, TimeAttr, VertexLabel,
};
use crate::storage::traits::{Edge, EdgeQuery, GraphStore, GraphTxn};
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use tracing::instrument;

/// The edge between the exact ordered `(parent, child)` pair, if any.
fn edge_between(
    txn: &mut dyn GraphTxn,
    parent_vid: &ElementId,
    child_vid: &ElementId,
) -> Result<Option<Edge>> {
    let mut edges = txn.find_edges(
        &EdgeQuery::new(EdgeLabel::ParentOf)
            .source(parent_vid.clone())
            .target(child_vid.clone()),
    )?;
    match edges.len() {
        0 | 1 => Ok(edges.pop()),
        n => Err(Error::InconsistentState(format!(
            "{n} parent_of edges from {parent_vid} to {child_vid}"
        ))),
    }
}

fn edge_with_label(txn: &mut dyn GraphTxn, eid: &ElementId, label: EdgeLabel) -> Result<Edge> {
    match txn.edge(eid)? {
        Some(edge) if edge.label == label => Ok(edge),
        _ => Err(Error::not_found(eid)),
    }
}

impl<S: GraphStore> InventoryService<S> {
    /// Records an observation of `parent_of` between two assets.
    ///
    /// Merges into the existing edge between the ordered pair, or creates one
    /// whose window starts and ends at `timestamp`. Returns the edge and
    /// whether it already existed.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidInput`] for a self-loop, or when `expiration` precedes
    ///   `timestamp`
    /// - [`Error::NotFound`] naming the child, then the parent, when either is
    ///   not an asset
    #[instrument(skip(self, parent_of), fields(parent = %parent_of.parent_vid, child = %parent_of.child_vid))]
    pub fn set_parent_of(
        &self,
        parent_of: &ParentOf,
        expiration: DateTime<Utc>,
        timestamp: Option<DateTime<Utc>>,
    ) -> Result<(DbParentOf, bool)> {
        parent_of.validate()?;
        let observation = Observation::new(expiration, timestamp)?;
        self.store().atomically("set_parent_of", |txn| {
            vertex_with_label(txn, &parent_of.child_vid, VertexLabel::Asset)?;
            vertex_with_label(txn, &parent_of.parent_vid, VertexLabel::Asset)?;
            match edge_between(txn, &parent_of.parent_vid, &parent_of.child_vid)? {
                Some(edge) => {
                    let mut stored = codec::parent_of_from_edge(&edge)?;
                    if stored.time.merge(&observation) {
                        txn.update_edge_properties(&stored.eid, &codec::time_updates(&stored.time))?
                            .ok_or_else(|| Error::not_found(&stored.eid))?;
                    }
                    Ok((stored, true))
                },
                None => {
                    let time = TimeAttr::from_observation(&observation);
                    let edge = txn.create_edge(
                        EdgeLabel::ParentOf,
                        &parent_of.parent_vid,
                        &parent_of.child_vid,
                        codec::time_properties(&time),
                    )?;
                    Ok((codec::parent_of_from_edge(&edge)?, false))
                },
            }
        })
    }

    /// Returns the `parent_of` edge stored at `eid`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if `eid` is not a `parent_of` edge.
    pub fn parent_of(&self, eid: &ElementId) -> Result<DbParentOf> {
        self.store().atomically("parent_of", |txn| {
            codec::parent_of_from_edge(&edge_with_label(txn, eid, EdgeLabel::ParentOf)?)
        })
    }

    /// Returns the edge from `parent_vid` to `child_vid`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] naming the pair when no such edge exists.
    pub fn parent_of_between(
        &self,
        parent_vid: &ElementId,
        child_vid: &ElementId,
    ) -> Result<DbParentOf> {
        self.store().atomically("parent_of_between", |txn| {
            let edge = edge_between(txn, parent_vid, child_vid)?
                .ok_or_else(|| Error::not_found(format!("{parent_vid} parent_of {child_vid}")))?;
            codec::parent_of_from_edge(&edge)
        })
    }

    /// Deletes the `parent_of` edge stored at `eid`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if `eid` is not a `parent_of` edge.
    #[instrument(skip(self), fields(eid = %eid))]
    pub fn drop_parent_of(&self, eid: &ElementId) -> Result<()> {
        self.store().atomically("drop_parent_of", |txn| {
            edge_with_label(txn, eid, EdgeLabel::ParentOf)?;
            match txn.delete_edge(eid)? {
                0 => Err(Error::not_found(eid)),
                _ => Ok(()),
            }
        })
    }

    /// Lists the edges pointing at `child_vid`, ordered by edge id.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if `child_vid` is not an asset, even when it
    /// would have no parents.
    pub fn parents(
        &self,
        child_vid: &ElementId,
        page: Option<PageRequest>,
    ) -> Result<Vec<DbParentOf>> {
        self.store().atomically("parents", |txn| {
            vertex_with_label(txn, child_vid, VertexLabel::Asset)?;
            let query = EdgeQuery::new(EdgeLabel::ParentOf)
                .target(child_vid.clone())
                .page(page);
            txn.find_edges(&query)?
                .iter()
                .map(codec::parent_of_from_edge)
                .collect()
        })
    }

    /// Lists the edges leaving `parent_vid`, ordered by edge id.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if `parent_vid` is not an asset.
    pub fn children(
        &self,
        parent_vid: &ElementId,
        page: Option<PageRequest>,
    ) -> Result<Vec<DbParentOf>> {
        self.store().atomically("children", |txn| {
            vertex_with_label(txn, parent_vid, VertexLabel::Asset)?;
            let query = EdgeQuery::new(EdgeLabel::ParentOf)
                .source(parent_vid.clone())
                .page(page);
            txn.find_edges(&query)?
                .iter()
                .map(codec::parent_of_from_edge)
                .collect()
        })
    }
}
