//! Command handlers.
//!
//! Every command opens the store selected by the configuration and works in
//! the configured universe.

use anyhow::{Context, Result};
use asset_inventory::io::{self, ImportFormat};
use asset_inventory::models::{EdgeLabel, VertexLabel};
use asset_inventory::storage::AnyGraphStore;
use asset_inventory::{BulkIngestion, GraphStore, InventoryConfig, InventoryService};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

fn open_service(config: &InventoryConfig) -> Result<InventoryService<AnyGraphStore>> {
    let store = AnyGraphStore::open(config)
        .with_context(|| format!("opening {} store", config.store))?;
    tracing::debug!(store = %store.kind(), "Store opened");
    Ok(InventoryService::new(store))
}

/// Serve command.
#[cfg(feature = "http")]
pub async fn cmd_serve(config: &InventoryConfig) -> Result<()> {
    use asset_inventory::api::{self, AppState};

    let inventory = open_service(config)?;
    let state = AppState::new(inventory, config.universe.clone());
    tracing::info!(%config, "Starting asset inventory");
    api::serve(state, config.listen, shutdown_signal()).await?;
    tracing::info!("Shut down");
    Ok(())
}

#[cfg(feature = "http")]
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Cannot listen for Ctrl-C; shutting down");
    }
}

/// Import command.
pub fn cmd_import(
    config: &InventoryConfig,
    format: Option<ImportFormat>,
    input: Option<&Path>,
) -> Result<()> {
    let (format, reader): (ImportFormat, Box<dyn Read>) = match input {
        Some(path) if path != Path::new("-") => {
            let format = match format {
                Some(format) => format,
                None => ImportFormat::from_path(path)?,
            };
            let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
            (format, Box::new(BufReader::new(file)))
        },
        _ => (format.unwrap_or_default(), Box::new(std::io::stdin().lock())),
    };

    let assets = io::read_bulk(format, reader)?;
    let inventory = open_service(config)?;
    let report = BulkIngestion::new(&inventory, &config.universe).ingest(&assets)?;

    println!("Imported {} assets into {}", assets.len(), config.universe);
    println!(
        "  assets:  {} created, {} merged",
        report.assets_created, report.assets_merged
    );
    println!(
        "  parents: {} created, {} merged ({} looked up)",
        report.parents_created, report.parents_merged, report.parent_lookups
    );
    Ok(())
}

/// Universe command.
pub fn cmd_universe(config: &InventoryConfig) -> Result<()> {
    let inventory = open_service(config)?;
    let vid = inventory.ensure_universe(&config.universe)?;
    let universe = inventory.current_universe(&config.universe)?;
    println!("Universe: {}", universe.universe);
    println!("  id:      {vid}");
    println!("  version: {} ({})", universe.universe.version, universe.universe.version.as_int());
    Ok(())
}

/// Stats command.
pub fn cmd_stats(config: &InventoryConfig) -> Result<()> {
    let inventory = open_service(config)?;
    let stats = inventory.store().stats()?;

    println!("Store: {}", config.store);
    println!("Vertices: {}", stats.vertex_count);
    for label in VertexLabel::all() {
        let count = stats.vertices_by_label.get(label).copied().unwrap_or(0);
        println!("  {label}: {count}");
    }
    println!("Edges: {}", stats.edge_count);
    for label in EdgeLabel::all() {
        let count = stats.edges_by_label.get(label).copied().unwrap_or(0);
        println!("  {label}: {count}");
    }
    Ok(())
}
