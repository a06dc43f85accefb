//! Command-line driver for the stowage planner.
//!
//! This crate provides:
//! - Snapshot file parsing and writing
//! - TOML planner configuration
//! - One command per planner entry point, with optional commit

pub mod commands;
pub mod config;
pub mod logger;
pub mod parser;

pub use commands::{Horizon, Outcome, Session};
pub use config::{load_config, ConfigFile};
pub use parser::{parse_file, CliError, SnapshotFile};
