//! Property-based tests for the temporal upsert rules.
//!
//! Uses proptest to verify invariants across random observation sequences:
//! - A window only ever widens and stays ordered
//! - The final window does not depend on arrival order
//! - Replaying an observation changes nothing
//! - Self-loops are always rejected
//! - Replaying a bulk batch leaves the graph unchanged
//! - Universe version encoding preserves order

// Property tests use expect/unwrap for simplicity - panics are acceptable in tests
#![allow(clippy::expect_used, clippy::unwrap_used)]

use asset_inventory::models::temporal::Observation;
use asset_inventory::models::{ElementId, ParentOf};
use asset_inventory::{
    Asset, AssetId, BulkAsset, BulkIngestion, BulkParent, Error, GraphStore, InMemoryGraphStore,
    InventoryService, TimeAttr, Universe, UniverseVersion,
};
use chrono::{DateTime, Duration, TimeZone, Utc};
use proptest::prelude::*;
use std::collections::BTreeMap;

fn base() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2021, 7, 1, 0, 0, 0).unwrap()
}

/// An observation as `(timestamp offset, validity)` in seconds.
fn observation_strategy() -> impl Strategy<Value = (i64, i64)> {
    (0i64..1_000_000, 0i64..1_000_000)
}

fn observation((offset, validity): (i64, i64)) -> Observation {
    let ts = base() + Duration::seconds(offset);
    Observation::new(ts + Duration::seconds(validity), Some(ts)).unwrap()
}

/// Observations with pairwise distinct timestamps, so the expected window is
/// unambiguous.
fn distinct_observations() -> impl Strategy<Value = Vec<(i64, i64)>> {
    prop::collection::btree_map(0i64..1_000_000, 0i64..1_000_000, 1..20)
        .prop_map(|map: BTreeMap<i64, i64>| map.into_iter().collect())
}

// ============================================================================
// Window merge
// ============================================================================

proptest! {
    /// Property: merging never narrows the window and keeps it ordered.
    #[test]
    fn prop_merge_only_widens(
        first in observation_strategy(),
        rest in prop::collection::vec(observation_strategy(), 0..30),
    ) {
        let mut window = TimeAttr::from_observation(&observation(first));
        for raw in rest {
            let before = window;
            let obs = observation(raw);
            let changed = window.merge(&obs);

            prop_assert!(window.first_seen <= before.first_seen);
            prop_assert!(window.last_seen >= before.last_seen);
            prop_assert!(window.first_seen <= window.last_seen);
            prop_assert!(window.last_seen <= window.expiration);
            prop_assert_eq!(changed, window != before);
            prop_assert!(window.first_seen <= obs.timestamp && obs.timestamp <= window.last_seen);
        }
    }

    /// Property: the final window depends only on the set of observations.
    #[test]
    fn prop_merge_order_independent(
        observations in distinct_observations().prop_shuffle(),
    ) {
        let mut window = TimeAttr::from_observation(&observation(observations[0]));
        for raw in &observations[1..] {
            window.merge(&observation(*raw));
        }

        let earliest = observations.iter().map(|(ts, _)| *ts).min().unwrap();
        let latest = *observations.iter().max_by_key(|(ts, _)| *ts).unwrap();
        prop_assert_eq!(window.first_seen, base() + Duration::seconds(earliest));
        prop_assert_eq!(window.last_seen, base() + Duration::seconds(latest.0));
        prop_assert_eq!(window.expiration, base() + Duration::seconds(latest.0 + latest.1));
    }
}

// ============================================================================
// Upserts
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Property: replaying the last observation of an asset is a no-op.
    #[test]
    fn prop_set_asset_idempotent(
        identifier in "[a-z0-9-]{1,16}",
        observations in prop::collection::vec(observation_strategy(), 1..10),
    ) {
        let inventory = InventoryService::new(InMemoryGraphStore::new());
        let universe = Universe::current();
        let asset = Asset::new(AssetId::new("host", identifier));

        let mut last = None;
        for raw in &observations {
            let obs = observation(*raw);
            last = Some(
                inventory
                    .set_asset(&asset, obs.expiration, Some(obs.timestamp), &universe)
                    .unwrap()
                    .0,
            );
        }
        let last = last.unwrap();
        let obs = observation(*observations.last().unwrap());
        let (replayed, existed) = inventory
            .set_asset(&asset, obs.expiration, Some(obs.timestamp), &universe)
            .unwrap();

        prop_assert!(existed);
        prop_assert_eq!(replayed, last);
    }

    /// Property: an asset can never be its own parent.
    #[test]
    fn prop_self_parent_rejected(vid in "[a-z0-9]{1,32}", raw in observation_strategy()) {
        let inventory = InventoryService::new(InMemoryGraphStore::new());
        let obs = observation(raw);
        let vid = ElementId::new(vid);

        let result = inventory.set_parent_of(
            &ParentOf::new(vid.clone(), vid),
            obs.expiration,
            Some(obs.timestamp),
        );
        prop_assert!(matches!(result, Err(Error::InvalidInput(_))));
        prop_assert_eq!(inventory.store().stats().unwrap().vertex_count, 0);
    }

    /// Property: ingesting the same batch twice leaves the graph unchanged.
    #[test]
    fn prop_bulk_retry_is_idempotent(
        edges in prop::collection::vec((0usize..6, 0usize..6), 0..12),
        raw in observation_strategy(),
    ) {
        let obs = observation(raw);
        let assets: Vec<BulkAsset> = (0..6)
            .map(|i| BulkAsset {
                asset_id: AssetId::new("host", format!("h{i}")),
                expiration: obs.expiration,
                timestamp: Some(obs.timestamp),
                parents: edges
                    .iter()
                    .filter(|(child, parent)| *child == i && child != parent)
                    .map(|(_, parent)| BulkParent {
                        asset_id: AssetId::new("host", format!("h{parent}")),
                        expiration: obs.expiration,
                        timestamp: Some(obs.timestamp),
                    })
                    .collect(),
            })
            .collect();

        let inventory = InventoryService::new(InMemoryGraphStore::new());
        let universe = Universe::current();
        BulkIngestion::new(&inventory, &universe).ingest(&assets).unwrap();
        let first = inventory.store().stats().unwrap();

        let report = BulkIngestion::new(&inventory, &universe).ingest(&assets).unwrap();
        prop_assert_eq!(report.assets_created, 0);
        prop_assert_eq!(report.parents_created, 0);
        prop_assert_eq!(inventory.store().stats().unwrap(), first);
    }
}

// ============================================================================
// Universe versions
// ============================================================================

proptest! {
    /// Property: the integer encoding orders versions like the versions do.
    #[test]
    fn prop_version_encoding_preserves_order(
        a in (0u8..100, 0u8..100, 0u8..100),
        b in (0u8..100, 0u8..100, 0u8..100),
    ) {
        let va = UniverseVersion::new(a.0, a.1, a.2).unwrap();
        let vb = UniverseVersion::new(b.0, b.1, b.2).unwrap();
        prop_assert_eq!(va.cmp(&vb), va.as_int().cmp(&vb.as_int()));
        prop_assert_eq!(UniverseVersion::from_int(va.as_int()).unwrap(), va);
        prop_assert_eq!(va.to_string().parse::<UniverseVersion>().unwrap(), va);
    }

    /// Property: a version part above 99 is rejected.
    #[test]
    fn prop_version_part_out_of_range(part in 100u8..=255, position in 0usize..3) {
        let mut parts = [0u8; 3];
        parts[position] = part;
        prop_assert!(UniverseVersion::new(parts[0], parts[1], parts[2]).is_err());
    }
}
