//! Asset upserts, lookups and time-filtered listings.

use super::{InventoryService, codec, find_linked, vertex_with_label};
use crate::models::{
    Asset, AssetFilter, AssetId, DbAsset, EdgeLabel, ElementId, Observation, PageRequest,
    TimeAttr, Universe, VertexLabel,
};
use crate::services::universe;
use crate::storage::traits::{GraphStore, GraphTxn, Predicate, Vertex, VertexQuery};
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use tracing::instrument;

fn asset_query(asset_id: &AssetId) -> VertexQuery {
    VertexQuery::new(VertexLabel::Asset)
        .with(Predicate::equals(codec::keys::TYPE, asset_id.asset_type.as_str()))
        .with(Predicate::equals(codec::keys::IDENTIFIER, asset_id.identifier.as_str()))
}

fn linked_asset(
    txn: &mut dyn GraphTxn,
    asset_id: &AssetId,
    universe_vid: &ElementId,
) -> Result<Option<Vertex>> {
    find_linked(txn, &asset_query(asset_id), universe_vid, asset_id)
}

fn create_asset(
    txn: &mut dyn GraphTxn,
    asset_id: &AssetId,
    observation: &Observation,
    universe_vid: &ElementId,
) -> Result<DbAsset> {
    let time = TimeAttr::from_observation(observation);
    let vertex = txn.create_vertex(VertexLabel::Asset, codec::asset_properties(asset_id, &time))?;
    universe::link_in(txn, universe_vid, &vertex.id)?;
    codec::asset_from_vertex(&vertex)
}

/// Applies the merge rule to a stored asset, writing only when the window moved.
fn merge_asset(
    txn: &mut dyn GraphTxn,
    vertex: &Vertex,
    observation: &Observation,
) -> Result<DbAsset> {
    let mut asset = codec::asset_from_vertex(vertex)?;
    if asset.time.merge(observation) {
        txn.update_vertex_properties(&asset.vid, &codec::time_updates(&asset.time))?
            .ok_or_else(|| Error::not_found(&asset.vid))?;
    }
    Ok(asset)
}

/// Predicates of an asset listing, excluding the universe link.
fn filter_predicates(filter: &AssetFilter) -> Vec<Predicate> {
    let mut predicates = Vec::new();
    if let Some(asset_type) = &filter.asset_type {
        predicates.push(Predicate::equals(codec::keys::TYPE, asset_type.as_str()));
    }
    if let Some(identifier) = &filter.identifier {
        predicates.push(Predicate::equals(codec::keys::IDENTIFIER, identifier.as_str()));
    }
    if let Some(at) = filter.valid_at {
        predicates.push(Predicate::at_most(codec::keys::FIRST_SEEN, at));
        predicates.push(Predicate::at_least(codec::keys::EXPIRATION, at));
    }
    predicates
}

impl<S: GraphStore> InventoryService<S> {
    /// Creates an asset in `universe`.
    ///
    /// The initial window is `first_seen = last_seen = timestamp` (now when
    /// absent) and `expiration`.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidInput`] for an empty type or identifier, or when
    ///   `expiration` precedes `timestamp`
    /// - [`Error::Conflict`] if the asset already exists in the universe
    #[instrument(skip(self, asset), fields(asset_id = %asset.asset_id, universe = %universe))]
    pub fn add_asset(
        &self,
        asset: &Asset,
        expiration: DateTime<Utc>,
        timestamp: Option<DateTime<Utc>>,
        universe: &Universe,
    ) -> Result<DbAsset> {
        asset.asset_id.validate()?;
        let observation = Observation::new(expiration, timestamp)?;
        self.store().atomically("add_asset", |txn| {
            let universe_vid = universe::ensure_in(txn, universe)?;
            if linked_asset(txn, &asset.asset_id, &universe_vid)?.is_some() {
                return Err(Error::conflict(&asset.asset_id));
            }
            create_asset(txn, &asset.asset_id, &observation, &universe_vid)
        })
    }

    /// Records an observation of an asset in `universe`.
    ///
    /// Merges into the asset linked to the universe when there is one;
    /// otherwise creates a fresh vertex, even if other universes hold the same
    /// asset id. Returns the asset and whether it already existed in the
    /// universe.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] for an empty type or identifier, or when
    /// `expiration` precedes `timestamp`.
    #[instrument(skip(self, asset), fields(asset_id = %asset.asset_id, universe = %universe))]
    pub fn set_asset(
        &self,
        asset: &Asset,
        expiration: DateTime<Utc>,
        timestamp: Option<DateTime<Utc>>,
        universe: &Universe,
    ) -> Result<(DbAsset, bool)> {
        asset.asset_id.validate()?;
        let observation = Observation::new(expiration, timestamp)?;
        self.store().atomically("set_asset", |txn| {
            let universe_vid = universe::ensure_in(txn, universe)?;
            match linked_asset(txn, &asset.asset_id, &universe_vid)? {
                Some(vertex) => Ok((merge_asset(txn, &vertex, &observation)?, true)),
                None => Ok((
                    create_asset(txn, &asset.asset_id, &observation, &universe_vid)?,
                    false,
                )),
            }
        })
    }

    /// Records an observation of the asset stored at `vid`.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidInput`] when `expiration` precedes `timestamp`
    /// - [`Error::NotFound`] if `vid` is not an asset or holds a different
    ///   asset id
    #[instrument(skip(self, asset), fields(vid = %vid, asset_id = %asset.asset_id))]
    pub fn update_asset(
        &self,
        vid: &ElementId,
        asset: &Asset,
        expiration: DateTime<Utc>,
        timestamp: Option<DateTime<Utc>>,
    ) -> Result<DbAsset> {
        let observation = Observation::new(expiration, timestamp)?;
        self.store().atomically("update_asset", |txn| {
            let vertex = vertex_with_label(txn, vid, VertexLabel::Asset)?;
            if codec::asset_from_vertex(&vertex)?.asset_id != asset.asset_id {
                return Err(Error::not_found(vid));
            }
            merge_asset(txn, &vertex, &observation)
        })
    }

    /// Deletes the asset stored at `vid` along with its edges.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if `vid` is not an asset.
    #[instrument(skip(self), fields(vid = %vid))]
    pub fn drop_asset(&self, vid: &ElementId) -> Result<()> {
        self.store().atomically("drop_asset", |txn| {
            vertex_with_label(txn, vid, VertexLabel::Asset)?;
            match txn.delete_vertex(vid)? {
                0 => Err(Error::not_found(vid)),
                _ => Ok(()),
            }
        })
    }

    /// Returns the asset stored at `vid`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if `vid` is not an asset.
    pub fn asset(&self, vid: &ElementId) -> Result<DbAsset> {
        self.store().atomically("asset", |txn| {
            codec::asset_from_vertex(&vertex_with_label(txn, vid, VertexLabel::Asset)?)
        })
    }

    /// Returns the asset with `asset_id` in `universe`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] naming the asset id if the universe holds
    /// no such asset, including when another universe does.
    pub fn asset_by_id(&self, asset_id: &AssetId, universe: &Universe) -> Result<DbAsset> {
        self.store().atomically("asset_by_id", |txn| {
            let Some(universe_vid) = universe::find_in(txn, universe)? else {
                return Err(Error::not_found(asset_id));
            };
            let vertex = linked_asset(txn, asset_id, &universe_vid)?
                .ok_or_else(|| Error::not_found(asset_id))?;
            codec::asset_from_vertex(&vertex)
        })
    }

    /// Lists the assets of `universe` matching `filter`, ordered by internal id.
    ///
    /// With `page` absent the whole filtered set is returned.
    ///
    /// # Errors
    ///
    /// Returns a store error.
    #[instrument(skip(self, filter), fields(universe = %universe))]
    pub fn assets(
        &self,
        universe: &Universe,
        filter: &AssetFilter,
        page: Option<PageRequest>,
    ) -> Result<Vec<DbAsset>> {
        self.store().atomically("assets", |txn| {
            let Some(universe_vid) = universe::find_in(txn, universe)? else {
                return Ok(Vec::new());
            };
            let mut query = VertexQuery::new(VertexLabel::Asset)
                .linked_from(EdgeLabel::UniverseOf, universe_vid)
                .page(page);
            query.predicates = filter_predicates(filter);
            txn.find_vertices(&query)?
                .iter()
                .map(codec::asset_from_vertex)
                .collect()
        })
    }
}
