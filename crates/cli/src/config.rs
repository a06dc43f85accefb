//! TOML configuration file.
//!
//! ```toml
//! [planner]
//! tolerance = 1e-9
//! orientation = "upright"
//! max_rearrangement_moves = 5
//! user_id = "astro_01"
//! ```

use crate::parser::CliError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use stowage::Config;

/// Contents of a configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    /// Planner settings.
    #[serde(default)]
    pub planner: Config,
}

impl ConfigFile {
    /// Parses a configuration from a TOML string.
    pub fn parse(content: &str) -> Result<Self, CliError> {
        Ok(toml::from_str(content)?)
    }
}

/// Loads the planner configuration, falling back to defaults without a
/// file, and validates it.
pub fn load_config(path: Option<&Path>) -> Result<Config, CliError> {
    let config = match path {
        Some(path) => ConfigFile::parse(&fs::read_to_string(path)?)?.planner,
        None => Config::default(),
    };
    config.validate()?;
    Ok(config)
}
