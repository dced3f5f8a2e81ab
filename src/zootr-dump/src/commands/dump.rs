//! Dump command handler

use crate::config::Config;
use anyhow::{bail, Context, Result};
use ootr_data::{DumpSummary, SourceTree};
use std::path::{Path, PathBuf};
use tracing::info;

/// Pick the engine checkout: explicit argument (or `ZOOTR_PATH`), then config
pub fn resolve_zootr(zootr: Option<PathBuf>, config: &Config) -> Result<PathBuf> {
    if let Some(path) = zootr {
        return Ok(path);
    }
    match config.zootr() {
        Some(path) => Ok(path.to_path_buf()),
        None => bail!(
            "No OOT-Randomizer checkout given. Use --zootr, set ZOOTR_PATH, \
             or run `zootr-dump configure --zootr PATH`"
        ),
    }
}

/// Handle the dump command
pub fn handle(zootr: Option<PathBuf>, output: &Path) -> Result<()> {
    let config = Config::load()?;
    let zootr = resolve_zootr(zootr, &config)?;
    run(&zootr, output)?;
    Ok(())
}

pub fn run(zootr: &Path, output: &Path) -> Result<DumpSummary> {
    let engine = SourceTree::open(zootr)
        .with_context(|| format!("Failed to read OOT-Randomizer at {}", zootr.display()))?;

    let summary = ootr_data::dump_all(&engine, output)
        .with_context(|| format!("Failed to dump into {}", output.display()))?;

    info!(
        items = summary.items,
        locations = summary.locations,
        logic_files = summary.logic_files,
        "Dumped OOT-Randomizer v{} to {}",
        summary.version,
        output.display()
    );
    info!("items.json sha256: {}", summary.items_sha256);
    info!("locations.json sha256: {}", summary.locations_sha256);

    Ok(summary)
}
