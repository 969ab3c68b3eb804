//! Inventory integration tests.
//!
//! Every scenario runs against both graph stores: the in-memory store and a
//! `SQLite` file in a temporary directory.

// Integration tests use expect/unwrap for simplicity - panics are acceptable in tests
#![allow(clippy::expect_used, clippy::unwrap_used)]

use asset_inventory::models::{
    Asset, AssetFilter, AssetId, ElementId, Owns, PageRequest, ParentOf, Team, Universe,
    UniverseVersion,
};
use asset_inventory::{Error, GraphStore, InMemoryGraphStore, InventoryService, SqliteGraphStore};
use chrono::{DateTime, Duration, TimeZone, Utc};
use tempfile::TempDir;

fn at(month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2021, month, day, 0, 0, 0).unwrap()
}

fn host(identifier: &str) -> Asset {
    Asset::new(AssetId::new("host", identifier))
}

/// Generates one test per store for a scenario.
macro_rules! both_stores {
    ($name:ident, $body:ident) => {
        mod $name {
            use super::*;

            #[test]
            fn memory() {
                $body(InventoryService::new(InMemoryGraphStore::new()));
            }

            #[test]
            fn sqlite() {
                let dir = TempDir::new().expect("Failed to create temp dir");
                let store = SqliteGraphStore::new(dir.path().join("inventory.db"))
                    .expect("Failed to create graph store");
                $body(InventoryService::new(store));
            }
        }
    };
}

// ============================================================================
// Temporal upserts
// ============================================================================

fn asset_window_scenarios<S: GraphStore>(inventory: InventoryService<S>) {
    let universe = Universe::current();
    let h1 = host("h1");

    let (asset, existed) = inventory
        .set_asset(&h1, at(7, 7), Some(at(7, 1)), &universe)
        .unwrap();
    assert!(!existed);
    assert_eq!(asset.time.first_seen, at(7, 1));
    assert_eq!(asset.time.last_seen, at(7, 1));
    assert_eq!(asset.time.expiration, at(7, 7));

    let (asset, existed) = inventory
        .set_asset(&h1, at(7, 20), Some(at(7, 10)), &universe)
        .unwrap();
    assert!(existed);
    assert_eq!(asset.time.first_seen, at(7, 1));
    assert_eq!(asset.time.last_seen, at(7, 10));
    assert_eq!(asset.time.expiration, at(7, 20));

    let (asset, existed) = inventory
        .set_asset(&h1, at(7, 20), Some(at(6, 1)), &universe)
        .unwrap();
    assert!(existed);
    assert_eq!(asset.time.first_seen, at(6, 1));
    assert_eq!(asset.time.last_seen, at(7, 10));
    assert_eq!(asset.time.expiration, at(7, 20));

    // An observation inside the window changes nothing.
    let (inside, _) = inventory
        .set_asset(&h1, at(12, 31), Some(at(7, 5)), &universe)
        .unwrap();
    assert_eq!(inside, asset);
    assert_eq!(inventory.asset(&asset.vid).unwrap(), asset);
}
both_stores!(asset_windows, asset_window_scenarios);

fn sub_second_times_scenario<S: GraphStore>(inventory: InventoryService<S>) {
    let universe = Universe::current();
    let ts = at(7, 1) + Duration::nanoseconds(1_234_567);
    let (asset, _) = inventory
        .set_asset(&host("h1"), at(7, 7), Some(ts), &universe)
        .unwrap();
    assert_eq!(asset.time.first_seen, at(7, 1) + Duration::microseconds(1_234));
    assert_eq!(inventory.asset(&asset.vid).unwrap(), asset);
}
both_stores!(sub_second_times, sub_second_times_scenario);

fn parent_of_scenario<S: GraphStore>(inventory: InventoryService<S>) {
    let universe = Universe::current();
    let (parent, _) = inventory
        .set_asset(&host("p"), at(7, 30), Some(at(7, 1)), &universe)
        .unwrap();
    let (child, _) = inventory
        .set_asset(&host("c"), at(7, 30), Some(at(7, 1)), &universe)
        .unwrap();

    let err = inventory
        .set_parent_of(&ParentOf::new(parent.vid.clone(), parent.vid.clone()), at(7, 7), Some(at(7, 1)))
        .unwrap_err();
    assert!(matches!(err, Error::InvalidInput(ref msg) if msg.contains("same")));

    let link = ParentOf::new(parent.vid.clone(), child.vid.clone());
    let (edge, existed) = inventory.set_parent_of(&link, at(7, 7), Some(at(7, 2))).unwrap();
    assert!(!existed);
    let (edge_again, existed) = inventory.set_parent_of(&link, at(7, 8), Some(at(7, 1))).unwrap();
    assert!(existed);
    assert_eq!(edge_again.eid, edge.eid);
    assert_eq!(edge_again.time.first_seen, at(7, 1));
    assert_eq!(edge_again.time.last_seen, at(7, 2));
    assert_eq!(edge_again.time.expiration, at(7, 7));

    assert_eq!(inventory.parents(&child.vid, None).unwrap(), vec![edge_again.clone()]);
    assert_eq!(inventory.children(&parent.vid, None).unwrap(), vec![edge_again]);
    assert!(matches!(
        inventory.parents(&ElementId::new("nope"), None),
        Err(Error::NotFound(_))
    ));
}
both_stores!(parent_of, parent_of_scenario);

fn owns_scenario<S: GraphStore>(inventory: InventoryService<S>) {
    let universe = Universe::current();
    let team = inventory.add_team(&Team::new("sre", "Site Reliability"), &universe).unwrap();
    let (asset, _) = inventory
        .set_asset(&host("h1"), at(7, 30), Some(at(7, 1)), &universe)
        .unwrap();
    let owns = Owns::new(team.vid.clone(), asset.vid.clone());

    let (edge, existed) = inventory.set_owns(&owns, at(7, 1), Some(at(8, 1))).unwrap();
    assert!(!existed);
    assert_eq!(edge.time.end_time, Some(at(8, 1)));

    let (edge, existed) = inventory.set_owns(&owns, at(7, 2), None).unwrap();
    assert!(existed);
    assert_eq!(edge.time.start_time, at(7, 2));
    assert_eq!(edge.time.end_time, None);
    assert_eq!(inventory.owns(&edge.eid).unwrap().time.end_time, None);

    assert_eq!(inventory.owners(&asset.vid, None).unwrap().len(), 1);
    inventory.drop_owns(&edge.eid).unwrap();
    assert!(inventory.owners(&asset.vid, None).unwrap().is_empty());
}
both_stores!(owns, owns_scenario);

// ============================================================================
// Teams
// ============================================================================

fn team_scenario<S: GraphStore>(inventory: InventoryService<S>) {
    let universe = Universe::current();
    let team = inventory.add_team(&Team::new("sre", "SRE"), &universe).unwrap();
    assert!(matches!(
        inventory.add_team(&Team::new("sre", "Other"), &universe),
        Err(Error::Conflict(_))
    ));

    let (renamed, existed) = inventory
        .set_team(&Team::new("sre", "Site Reliability"), &universe)
        .unwrap();
    assert!(existed);
    assert_eq!(renamed.vid, team.vid);
    assert_eq!(renamed.name, "Site Reliability");

    // The identifier is immutable.
    assert!(matches!(
        inventory.update_team(&team.vid, &Team::new("ops", "Ops")),
        Err(Error::NotFound(_))
    ));
    let updated = inventory.update_team(&team.vid, &Team::new("sre", "SRE")).unwrap();
    assert_eq!(updated.name, "SRE");
    assert_eq!(inventory.team_by_identifier("sre", &universe).unwrap(), updated);

    inventory.drop_team(&team.vid).unwrap();
    assert!(matches!(inventory.team(&team.vid), Err(Error::NotFound(_))));
    assert!(matches!(inventory.drop_team(&team.vid), Err(Error::NotFound(_))));
}
both_stores!(teams, team_scenario);

// ============================================================================
// Universes
// ============================================================================

fn universe_isolation_scenario<S: GraphStore>(inventory: InventoryService<S>) {
    let old = Universe::current();
    let new = Universe::new("asset-inventory", UniverseVersion::new(0, 0, 2).unwrap());

    let (first, _) = inventory.set_asset(&host("h1"), at(7, 7), Some(at(7, 1)), &old).unwrap();
    assert!(matches!(
        inventory.asset_by_id(&AssetId::new("host", "h1"), &new),
        Err(Error::NotFound(ref name)) if name == "host-h1"
    ));

    // Writing in the new generation creates a fresh vertex and leaves the old one alone.
    let (second, existed) = inventory
        .set_asset(&host("h1"), at(9, 9), Some(at(9, 1)), &new)
        .unwrap();
    assert!(!existed);
    assert_ne!(second.vid, first.vid);
    assert_eq!(inventory.asset(&first.vid).unwrap(), first);
    assert!(inventory.is_linked(&first.vid, &old).unwrap());
    assert!(!inventory.is_linked(&first.vid, &new).unwrap());
    assert_eq!(inventory.linked_universe(&second.vid).unwrap().universe, new);

    assert_eq!(inventory.assets(&old, &AssetFilter::new(), None).unwrap(), vec![first]);
    assert_eq!(inventory.assets(&new, &AssetFilter::new(), None).unwrap(), vec![second]);

    let team = inventory.add_team(&Team::new("sre", "SRE"), &old).unwrap();
    assert!(inventory.teams(&new, None).unwrap().is_empty());
    assert_eq!(inventory.teams(&old, None).unwrap(), vec![team]);
}
both_stores!(universe_isolation, universe_isolation_scenario);

fn current_universe_scenario<S: GraphStore>(inventory: InventoryService<S>) {
    let universe = Universe::current();
    assert!(matches!(inventory.current_universe(&universe), Err(Error::NotFound(_))));
    // Reads never create the universe.
    assert!(inventory.teams(&universe, None).unwrap().is_empty());
    assert!(matches!(inventory.current_universe(&universe), Err(Error::NotFound(_))));

    let vid = inventory.ensure_universe(&universe).unwrap();
    assert_eq!(inventory.ensure_universe(&universe).unwrap(), vid);
    let current = inventory.current_universe(&universe).unwrap();
    assert_eq!(current.vid, vid);
    assert_eq!(current.universe, universe);
}
both_stores!(current_universe, current_universe_scenario);

// ============================================================================
// Listings
// ============================================================================

fn listing_scenario<S: GraphStore>(inventory: InventoryService<S>) {
    let universe = Universe::current();
    for i in 0..7 {
        inventory
            .set_asset(&host(&format!("h{i}")), at(7, 10 + i), Some(at(7, 1 + i)), &universe)
            .unwrap();
    }

    let all = inventory.assets(&universe, &AssetFilter::new(), None).unwrap();
    assert_eq!(all.len(), 7);
    let mut ids: Vec<_> = all.iter().map(|a| a.vid.clone()).collect();
    ids.sort();
    assert_eq!(ids, all.iter().map(|a| a.vid.clone()).collect::<Vec<_>>());

    let pages: Vec<_> = (0..3)
        .map(|page| {
            inventory
                .assets(&universe, &AssetFilter::new(), Some(PageRequest::new(page, 3)))
                .unwrap()
        })
        .collect();
    assert_eq!(pages[0].len(), 3);
    assert_eq!(pages[2].len(), 1);
    assert_eq!(pages.concat(), all);

    // first_seen <= 07-04 and expiration >= 07-04 holds for h0..h3.
    let valid = inventory
        .assets(&universe, &AssetFilter::new().valid_at(at(7, 4)), None)
        .unwrap();
    assert_eq!(valid.len(), 4);

    // The store-side filter agrees with the window check at every boundary.
    for day in 1..=20 {
        let instant = at(7, day);
        let filtered = inventory
            .assets(&universe, &AssetFilter::new().valid_at(instant), None)
            .unwrap();
        let expected: Vec<_> = all.iter().filter(|a| a.time.is_valid_at(instant)).cloned().collect();
        assert_eq!(filtered, expected, "valid_at {instant}");
    }

    let none = inventory
        .assets(&universe, &AssetFilter::new().with_type("ip"), None)
        .unwrap();
    assert!(none.is_empty());
}
both_stores!(listings, listing_scenario);

#[test]
fn test_sqlite_store_persists_across_reopen() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let path = dir.path().join("inventory.db");
    let universe = Universe::current();

    let vid = {
        let inventory = InventoryService::new(SqliteGraphStore::new(&path).unwrap());
        inventory
            .set_asset(&host("h1"), at(7, 7), Some(at(7, 1)), &universe)
            .unwrap()
            .0
            .vid
    };

    let inventory = InventoryService::new(SqliteGraphStore::new(&path).unwrap());
    let asset = inventory.asset_by_id(&AssetId::new("host", "h1"), &universe).unwrap();
    assert_eq!(asset.vid, vid);
}
