//! `owns` upserts and ownership listings.
//!
//! Ownership intervals are authoritative snapshots: an upsert overwrites both
//! ends, and a missing `end_time` clears any stored one.

use super::{InventoryService, codec, vertex_with_label};
use crate::models::{DbOwns, EdgeLabel, ElementId, Owns, OwnsTime, PageRequest, VertexLabel};
use crate::storage::traits::{Edge, EdgeQuery, GraphStore, GraphTxn};
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use tracing::instrument;

fn edge_between(
    txn: &mut dyn GraphTxn,
    team_vid: &ElementId,
    asset_vid: &ElementId,
) -> Result<Option<Edge>> {
    let mut edges = txn.find_edges(
        &EdgeQuery::new(EdgeLabel::Owns)
            .source(team_vid.clone())
            .target(asset_vid.clone()),
    )?;
    match edges.len() {
        0 | 1 => Ok(edges.pop()),
        n => Err(Error::InconsistentState(format!(
            "{n} owns edges from {team_vid} to {asset_vid}"
        ))),
    }
}

fn owns_edge(txn: &mut dyn GraphTxn, eid: &ElementId) -> Result<Edge> {
    match txn.edge(eid)? {
        Some(edge) if edge.label == EdgeLabel::Owns => Ok(edge),
        _ => Err(Error::not_found(eid)),
    }
}

impl<S: GraphStore> InventoryService<S> {
    /// Sets the ownership interval of a team over an asset.
    ///
    /// Returns the edge and whether it already existed.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidInput`] when `end_time` precedes `start_time`
    /// - [`Error::NotFound`] naming the team, then the asset, when either is
    ///   missing
    #[instrument(skip(self, owns), fields(team = %owns.team_vid, asset = %owns.asset_vid))]
    pub fn set_owns(
        &self,
        owns: &Owns,
        start_time: DateTime<Utc>,
        end_time: Option<DateTime<Utc>>,
    ) -> Result<(DbOwns, bool)> {
        let time = OwnsTime::new(start_time, end_time)?;
        self.store().atomically("set_owns", |txn| {
            vertex_with_label(txn, &owns.team_vid, VertexLabel::Team)?;
            vertex_with_label(txn, &owns.asset_vid, VertexLabel::Asset)?;
            match edge_between(txn, &owns.team_vid, &owns.asset_vid)? {
                Some(edge) => {
                    let updated = txn
                        .update_edge_properties(&edge.id, &codec::owns_time_updates(&time))?
                        .ok_or_else(|| Error::not_found(&edge.id))?;
                    Ok((codec::owns_from_edge(&updated)?, true))
                },
                None => {
                    let edge = txn.create_edge(
                        EdgeLabel::Owns,
                        &owns.team_vid,
                        &owns.asset_vid,
                        codec::owns_properties(&time),
                    )?;
                    Ok((codec::owns_from_edge(&edge)?, false))
                },
            }
        })
    }

    /// Returns the `owns` edge stored at `eid`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if `eid` is not an `owns` edge.
    pub fn owns(&self, eid: &ElementId) -> Result<DbOwns> {
        self.store()
            .atomically("owns", |txn| codec::owns_from_edge(&owns_edge(txn, eid)?))
    }

    /// Returns the ownership of `asset_vid` by `team_vid`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] naming the pair when no such edge exists.
    pub fn owns_between(&self, team_vid: &ElementId, asset_vid: &ElementId) -> Result<DbOwns> {
        self.store().atomically("owns_between", |txn| {
            let edge = edge_between(txn, team_vid, asset_vid)?
                .ok_or_else(|| Error::not_found(format!("{team_vid} owns {asset_vid}")))?;
            codec::owns_from_edge(&edge)
        })
    }

    /// Deletes the `owns` edge stored at `eid`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if `eid` is not an `owns` edge.
    #[instrument(skip(self), fields(eid = %eid))]
    pub fn drop_owns(&self, eid: &ElementId) -> Result<()> {
        self.store().atomically("drop_owns", |txn| {
            owns_edge(txn, eid)?;
            match txn.delete_edge(eid)? {
                0 => Err(Error::not_found(eid)),
                _ => Ok(()),
            }
        })
    }

    /// Lists the ownerships of `asset_vid`, ordered by edge id.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if `asset_vid` is not an asset.
    pub fn owners(&self, asset_vid: &ElementId, page: Option<PageRequest>) -> Result<Vec<DbOwns>> {
        self.store().atomically("owners", |txn| {
            vertex_with_label(txn, asset_vid, VertexLabel::Asset)?;
            let query = EdgeQuery::new(EdgeLabel::Owns)
                .target(asset_vid.clone())
                .page(page);
            txn.find_edges(&query)?
                .iter()
                .map(codec::owns_from_edge)
                .collect()
        })
    }
}
