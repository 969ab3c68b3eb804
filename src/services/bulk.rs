//! Bulk ingestion of assets and their `parent_of` relationships.
//!
//! A batch is applied in two sequential passes:
//!
//! 1. every asset descriptor is upserted with
//!    [`InventoryService::set_asset`] and its internal id cached;
//! 2. every parent descriptor is resolved, from the cache or else from the
//!    store, and the relationship upserted with
//!    [`InventoryService::set_parent_of`].
//!
//! Parents referenced before their own descriptor appears in the batch
//! therefore resolve without a lookup. A parent found neither in the cache nor
//! in the universe aborts the rest of the batch with [`Error::NotFound`]
//! naming its asset id. Work done before the failure is kept: there is no
//! batch-wide transaction, and since every step is an upsert the same batch
//! can be resubmitted safely.
//!
//! [`Error::NotFound`]: crate::Error::NotFound

use crate::models::{Asset, AssetId, ElementId, ParentOf, Universe};
use crate::services::InventoryService;
use crate::storage::GraphStore;
use crate::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::instrument;

/// One asset of a bulk batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkAsset {
    /// Natural key.
    #[serde(flatten)]
    pub asset_id: AssetId,
    /// Expiration of this observation.
    pub expiration: DateTime<Utc>,
    /// Observation time; now when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    /// Parents observed alongside the asset.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parents: Vec<BulkParent>,
}

/// A parent of a bulk asset, with the observation of the relationship.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkParent {
    /// Natural key of the parent asset.
    #[serde(flatten)]
    pub asset_id: AssetId,
    /// Expiration of the relationship observation.
    pub expiration: DateTime<Utc>,
    /// Observation time; now when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

/// Outcome counts of a completed batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BulkReport {
    /// Assets created in the universe.
    pub assets_created: usize,
    /// Assets merged into existing vertices.
    pub assets_merged: usize,
    /// `parent_of` edges created.
    pub parents_created: usize,
    /// `parent_of` edges merged.
    pub parents_merged: usize,
    /// Parent ids resolved from the store instead of the cache.
    pub parent_lookups: usize,
}

/// Request-scoped bulk ingestion.
///
/// The identity cache lives exactly as long as the ingestion; create one per
/// batch.
pub struct BulkIngestion<'a, S: GraphStore> {
    inventory: &'a InventoryService<S>,
    universe: &'a Universe,
    cache: HashMap<AssetId, ElementId>,
}

impl<'a, S: GraphStore> BulkIngestion<'a, S> {
    /// Creates an ingestion writing into `universe`.
    #[must_use]
    pub fn new(inventory: &'a InventoryService<S>, universe: &'a Universe) -> Self {
        Self {
            inventory,
            universe,
            cache: HashMap::new(),
        }
    }

    /// Applies a batch.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidInput`](crate::Error::InvalidInput) for an invalid
    ///   descriptor
    /// - [`Error::NotFound`](crate::Error::NotFound) naming a parent that is
    ///   neither in the batch nor in the universe
    ///
    /// Either error stops the batch; earlier work is kept.
    #[instrument(skip(self, assets), fields(assets = assets.len(), universe = %self.universe))]
    pub fn ingest(&mut self, assets: &[BulkAsset]) -> Result<BulkReport> {
        let mut report = BulkReport::default();

        for bulk in assets {
            let (stored, existed) = self.inventory.set_asset(
                &Asset::new(bulk.asset_id.clone()),
                bulk.expiration,
                bulk.timestamp,
                self.universe,
            )?;
            if existed {
                report.assets_merged += 1;
            } else {
                report.assets_created += 1;
            }
            metrics::counter!("inventory_bulk_assets_total").increment(1);
            self.cache.insert(bulk.asset_id.clone(), stored.vid);
        }

        for bulk in assets.iter().filter(|a| !a.parents.is_empty()) {
            let child_vid = self.resolve(&bulk.asset_id, &mut report)?;
            for parent in &bulk.parents {
                let parent_vid = self.resolve(&parent.asset_id, &mut report)?;
                let (_, existed) = self.inventory.set_parent_of(
                    &ParentOf::new(parent_vid, child_vid.clone()),
                    parent.expiration,
                    parent.timestamp,
                )?;
                if existed {
                    report.parents_merged += 1;
                } else {
                    report.parents_created += 1;
                }
            }
        }

        Ok(report)
    }

    fn resolve(&mut self, asset_id: &AssetId, report: &mut BulkReport) -> Result<ElementId> {
        if let Some(vid) = self.cache.get(asset_id) {
            return Ok(vid.clone());
        }
        let stored = self.inventory.asset_by_id(asset_id, self.universe)?;
        report.parent_lookups += 1;
        self.cache.insert(asset_id.clone(), stored.vid.clone());
        Ok(stored.vid)
    }
}
