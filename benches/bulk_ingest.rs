//! Benchmarks for bulk ingestion and single-asset upserts.
//!
//! Batches mimic the load generator: every asset has one parent drawn from a
//! small pool of accounts listed at the end of the batch.

// Criterion macros generate items without docs - this is expected for benchmarks
// Benchmarks use expect/unwrap for simplicity - panics are acceptable in benchmarks
#![allow(missing_docs)]
#![allow(clippy::expect_used, clippy::unwrap_used)]

use asset_inventory::{
    Asset, AssetId, BulkAsset, BulkIngestion, BulkParent, GraphStore, InMemoryGraphStore,
    InventoryService, SqliteGraphStore, Universe,
};
use chrono::{Duration as TimeDelta, TimeZone, Utc};
use criterion::{BatchSize, BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use std::hint::black_box;
use std::time::Duration;
use tempfile::TempDir;

const ACCOUNTS: usize = 10;

/// Builds a batch of `count` hosts parented by `ACCOUNTS` accounts.
fn batch(count: usize) -> Vec<BulkAsset> {
    let ts = Utc.with_ymd_and_hms(2021, 7, 1, 0, 0, 0).unwrap();
    let expiration = ts + TimeDelta::days(7);
    let mut assets: Vec<BulkAsset> = (0..count)
        .map(|i| BulkAsset {
            asset_id: AssetId::new("host", format!("host-{i}")),
            expiration,
            timestamp: Some(ts),
            parents: vec![BulkParent {
                asset_id: AssetId::new("account", format!("account-{}", i % ACCOUNTS)),
                expiration,
                timestamp: Some(ts),
            }],
        })
        .collect();
    assets.extend((0..ACCOUNTS).map(|i| BulkAsset {
        asset_id: AssetId::new("account", format!("account-{i}")),
        expiration,
        timestamp: Some(ts),
        parents: Vec::new(),
    }));
    assets
}

fn ingest<S: GraphStore>(inventory: &InventoryService<S>, assets: &[BulkAsset]) {
    let universe = Universe::current();
    BulkIngestion::new(inventory, &universe)
        .ingest(assets)
        .expect("Ingestion should succeed");
}

// ============================================================================
// Bulk Benchmarks
// ============================================================================

fn bench_bulk_memory(c: &mut Criterion) {
    let mut group = c.benchmark_group("bulk_ingest_memory");
    for count in [100, 1_000] {
        let assets = batch(count);
        group.throughput(Throughput::Elements(assets.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), &assets, |b, assets| {
            b.iter_batched(
                || InventoryService::new(InMemoryGraphStore::new()),
                |inventory| ingest(&inventory, black_box(assets)),
                BatchSize::SmallInput,
            );
        });
    }
    group.finish();
}

fn bench_bulk_sqlite(c: &mut Criterion) {
    let mut group = c.benchmark_group("bulk_ingest_sqlite");
    group.sample_size(10);
    group.measurement_time(Duration::from_secs(15));
    for count in [100, 1_000] {
        let assets = batch(count);
        group.throughput(Throughput::Elements(assets.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), &assets, |b, assets| {
            b.iter_batched(
                || {
                    let dir = TempDir::new().expect("Failed to create temp dir");
                    let store = SqliteGraphStore::new(dir.path().join("inventory.db"))
                        .expect("Failed to create graph store");
                    (dir, InventoryService::new(store))
                },
                |(_dir, inventory)| ingest(&inventory, black_box(assets)),
                BatchSize::PerIteration,
            );
        });
    }
    group.finish();
}

// ============================================================================
// Upsert Benchmarks
// ============================================================================

fn bench_set_asset_merge(c: &mut Criterion) {
    let inventory = InventoryService::new(InMemoryGraphStore::new());
    let universe = Universe::current();
    let asset = Asset::new(AssetId::new("host", "hot"));
    let ts = Utc.with_ymd_and_hms(2021, 7, 1, 0, 0, 0).unwrap();
    ingest(&inventory, &batch(1_000));

    let mut group = c.benchmark_group("set_asset");
    group.bench_function("merge_existing", |b| {
        let mut offset = 0_i64;
        b.iter(|| {
            offset += 1;
            let seen = ts + TimeDelta::seconds(offset);
            inventory
                .set_asset(&asset, seen + TimeDelta::days(7), Some(seen), &universe)
                .expect("Upsert should succeed")
        });
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_bulk_memory,
    bench_bulk_sqlite,
    bench_set_asset_merge
);
criterion_main!(benches);
