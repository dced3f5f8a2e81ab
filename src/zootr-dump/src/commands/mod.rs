//! Command handlers for zootr-dump
//!
//! Each subcommand has its own module with handler functions.

pub mod configure;
pub mod dump;
