//! CLI argument definitions for zootr-dump

mod core;

pub use core::{Cli, Commands};
