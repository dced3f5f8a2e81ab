//! Configuration command handlers
//!
//! Handles the `configure` subcommand for setting up zootr-dump defaults.

use crate::config::Config;
use anyhow::Result;
use std::path::{Path, PathBuf};

/// Handle the configure command
pub fn handle(zootr: Option<PathBuf>, show: bool) -> Result<()> {
    let mut config = Config::load()?;

    if show {
        show_config(&config);
        return Ok(());
    }

    if let Some(path) = zootr {
        let config_path = Config::config_path()?;
        set_zootr(&mut config, path, &config_path)?;
    } else {
        show_usage();
    }

    Ok(())
}

fn show_config(config: &Config) {
    if let Some(path) = config.zootr() {
        println!("OOT-Randomizer: {}", path.display());
    } else {
        println!("No OOT-Randomizer checkout configured");
    }

    if let Ok(path) = Config::config_path() {
        println!("Config file: {}", path.display());
    }
}

fn set_zootr(config: &mut Config, path: PathBuf, config_path: &Path) -> Result<()> {
    // Stored as given; relative paths resolve against the directory `dump` runs in
    println!("OOT-Randomizer configured: {}", path.display());
    config.set_zootr(path);
    config.save_to(config_path)?;

    println!("Config saved to: {}", config_path.display());
    Ok(())
}

fn show_usage() {
    println!("Usage: zootr-dump configure --zootr PATH_TO_OOT_RANDOMIZER");
    println!("   or: zootr-dump configure --show");
    println!();
    println!("Note: --zootr on the dump command and ZOOTR_PATH both take");
    println!("      precedence over the configured checkout.");
}
