//! Concurrent upsert tests.
//!
//! Concurrent writers of the same identity must converge on a single vertex,
//! whichever store backs the service.

// Integration tests use expect/unwrap for simplicity - panics are acceptable in tests
#![allow(clippy::expect_used, clippy::unwrap_used)]

use asset_inventory::models::{AssetFilter, ElementId, Owns, ParentOf, VertexLabel};
use asset_inventory::{
    Asset, AssetId, GraphStore, InMemoryGraphStore, InventoryService, SqliteGraphStore, Team,
    Universe,
};
use chrono::{DateTime, Duration, TimeZone, Utc};
use std::collections::HashSet;
use std::sync::{Arc, Barrier};
use std::thread;
use tempfile::TempDir;

const WRITERS: usize = 8;

fn base() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2021, 7, 1, 0, 0, 0).unwrap()
}

fn sqlite_service(dir: &TempDir) -> InventoryService<SqliteGraphStore> {
    let store = SqliteGraphStore::new(dir.path().join("inventory.db"))
        .expect("Failed to create graph store");
    InventoryService::new(store)
}

/// Spawns `WRITERS` threads released together, each running `f` with its index.
fn race<S, T, F>(inventory: &InventoryService<S>, f: F) -> Vec<T>
where
    S: GraphStore + 'static,
    T: Send + 'static,
    F: Fn(&InventoryService<S>, usize) -> T + Send + Sync + 'static,
{
    let barrier = Arc::new(Barrier::new(WRITERS));
    let f = Arc::new(f);
    let handles: Vec<_> = (0..WRITERS)
        .map(|i| {
            let inventory = inventory.clone();
            let barrier = Arc::clone(&barrier);
            let f = Arc::clone(&f);
            thread::spawn(move || {
                barrier.wait();
                f(&inventory, i)
            })
        })
        .collect();
    handles
        .into_iter()
        .map(|handle| handle.join().expect("writer thread panicked"))
        .collect()
}

fn assert_single_asset<S: GraphStore + 'static>(inventory: &InventoryService<S>) {
    let universe = Universe::current();
    let results = race(inventory, |inventory, i| {
        let ts = base() + Duration::hours(i64::try_from(i).unwrap());
        inventory
            .set_asset(
                &Asset::new(AssetId::new("host", "h1")),
                ts + Duration::days(7),
                Some(ts),
                &Universe::current(),
            )
            .unwrap()
            .0
    });

    let vids: HashSet<ElementId> = results.into_iter().map(|asset| asset.vid).collect();
    assert_eq!(vids.len(), 1);

    let assets = inventory.assets(&universe, &AssetFilter::new(), None).unwrap();
    assert_eq!(assets.len(), 1);
    // Every observation was folded in regardless of arrival order.
    assert_eq!(assets[0].time.first_seen, base());
    assert_eq!(
        assets[0].time.last_seen,
        base() + Duration::hours(i64::try_from(WRITERS - 1).unwrap())
    );

    let stats = inventory.store().stats().unwrap();
    assert_eq!(stats.vertices_by_label.get(&VertexLabel::Universe), Some(&1));
    assert_eq!(stats.vertices_by_label.get(&VertexLabel::Asset), Some(&1));
}

#[test]
fn test_concurrent_set_asset_memory() {
    assert_single_asset(&InventoryService::new(InMemoryGraphStore::new()));
}

#[test]
fn test_concurrent_set_asset_sqlite() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    assert_single_asset(&sqlite_service(&dir));
}

fn assert_single_team<S: GraphStore + 'static>(inventory: &InventoryService<S>) {
    let results = race(inventory, |inventory, i| {
        inventory
            .set_team(&Team::new("sre", format!("SRE {i}")), &Universe::current())
            .unwrap()
    });
    assert_eq!(results.iter().filter(|(_, existed)| !existed).count(), 1);
    let teams = inventory.teams(&Universe::current(), None).unwrap();
    assert_eq!(teams.len(), 1);
}

#[test]
fn test_concurrent_set_team_memory() {
    assert_single_team(&InventoryService::new(InMemoryGraphStore::new()));
}

#[test]
fn test_concurrent_set_team_sqlite() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    assert_single_team(&sqlite_service(&dir));
}

fn assert_single_edges<S: GraphStore + 'static>(inventory: &InventoryService<S>) {
    let universe = Universe::current();
    let exp = base() + Duration::days(30);
    let (parent, _) = inventory
        .set_asset(&Asset::new(AssetId::new("host", "p")), exp, Some(base()), &universe)
        .unwrap();
    let (child, _) = inventory
        .set_asset(&Asset::new(AssetId::new("host", "c")), exp, Some(base()), &universe)
        .unwrap();
    let team = inventory.add_team(&Team::new("sre", "SRE"), &universe).unwrap();

    let link = ParentOf::new(parent.vid.clone(), child.vid.clone());
    let owns = Owns::new(team.vid.clone(), child.vid.clone());
    race(inventory, move |inventory, i| {
        let ts = base() + Duration::minutes(i64::try_from(i).unwrap());
        inventory.set_parent_of(&link, exp, Some(ts)).unwrap();
        inventory.set_owns(&owns, ts, None).unwrap();
    });

    assert_eq!(inventory.parents(&child.vid, None).unwrap().len(), 1);
    assert_eq!(inventory.owners(&child.vid, None).unwrap().len(), 1);
}

#[test]
fn test_concurrent_relationships_memory() {
    assert_single_edges(&InventoryService::new(InMemoryGraphStore::new()));
}

#[test]
fn test_concurrent_relationships_sqlite() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    assert_single_edges(&sqlite_service(&dir));
}

#[test]
fn test_concurrent_set_asset_sqlite_separate_connections() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let path = dir.path().join("inventory.db");
    // Create the schema once so writers only race on data.
    drop(SqliteGraphStore::new(&path).expect("Failed to create graph store"));

    let barrier = Arc::new(Barrier::new(WRITERS));
    let handles: Vec<_> = (0..WRITERS)
        .map(|i| {
            let path = path.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                let inventory = InventoryService::new(
                    SqliteGraphStore::new(&path).expect("Failed to open graph store"),
                );
                let ts = base() + Duration::hours(i64::try_from(i).unwrap());
                barrier.wait();
                inventory
                    .set_asset(
                        &Asset::new(AssetId::new("host", "h1")),
                        ts + Duration::days(7),
                        Some(ts),
                        &Universe::current(),
                    )
                    .map(|(asset, _)| asset.vid)
            })
        })
        .collect();

    let vids: HashSet<ElementId> = handles
        .into_iter()
        .map(|handle| {
            handle
                .join()
                .expect("writer thread panicked")
                .expect("set_asset failed")
        })
        .collect();
    assert_eq!(vids.len(), 1);

    let stats = SqliteGraphStore::new(&path).unwrap().stats().unwrap();
    assert_eq!(stats.vertices_by_label.get(&VertexLabel::Asset), Some(&1));
    assert_eq!(stats.vertices_by_label.get(&VertexLabel::Universe), Some(&1));
}
