//! Core CLI definitions

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "zootr-dump")]
#[command(about = "Dump OOT-Randomizer data into a portable layout", long_about = None)]
pub struct Cli {
    /// Show debug output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Dump items, locations and logic files from an engine checkout
    #[command(visible_alias = "d")]
    Dump {
        /// Path to the OOT-Randomizer checkout (uses configured default if not provided)
        #[arg(short = 'Z', long, env = "ZOOTR_PATH")]
        zootr: Option<PathBuf>,

        /// Output directory, removed and recreated on every run
        #[arg(short = 'O', long)]
        output: PathBuf,
    },

    /// Configure default settings
    #[command(visible_alias = "c")]
    Configure {
        /// Set default OOT-Randomizer checkout
        #[arg(long)]
        zootr: Option<PathBuf>,

        /// Show current configuration
        #[arg(long)]
        show: bool,
    },
}
