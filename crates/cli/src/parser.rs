//! Snapshot file parser.
//!
//! A snapshot file is a JSON document holding the containers, the items,
//! the per-container versions and the current simulated date.

use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use stowage::core::{Container, ContainerId, Item, Snapshot};
use thiserror::Error;

/// Errors raised by the command-line driver.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("Failed to read file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Failed to parse TOML: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Stowage(#[from] stowage::Error),

    #[error("Invalid arguments: {0}")]
    InvalidArgs(String),
}

/// On-disk form of a snapshot.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SnapshotFile {
    /// Current simulated date.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_date: Option<NaiveDate>,
    /// Every container.
    #[serde(default)]
    pub containers: Vec<Container>,
    /// Every item.
    #[serde(default)]
    pub items: Vec<Item>,
    /// Container versions; missing entries start at 0.
    #[serde(default)]
    pub versions: BTreeMap<ContainerId, u64>,
}

impl SnapshotFile {
    /// Reads a snapshot file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CliError> {
        parse_file(path)
    }

    /// Writes the file as pretty-printed JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), CliError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Builds the validated in-memory snapshot.
    pub fn to_snapshot(&self) -> Result<Snapshot, CliError> {
        let snapshot = Snapshot::new(self.containers.clone(), self.items.clone())?;
        Ok(snapshot.with_versions(self.versions.clone()))
    }

    /// Captures a snapshot for writing back.
    pub fn from_snapshot(snapshot: &Snapshot, current_date: Option<NaiveDate>) -> Self {
        Self {
            current_date,
            containers: snapshot.containers().cloned().collect(),
            items: snapshot.items().cloned().collect(),
            versions: snapshot.versions().clone(),
        }
    }
}

/// Parses any JSON input file.
pub fn parse_file<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<T, CliError> {
    let content = fs::read_to_string(path)?;
    parse_json(&content)
}

/// Parses a JSON string.
pub fn parse_json<T: DeserializeOwned>(json: &str) -> Result<T, CliError> {
    Ok(serde_json::from_str(json)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "current_date": "2025-03-01",
        "containers": [
            {"id": "contA", "zone": "Crew Quarters",
             "dimensions": {"width": 100.0, "depth": 85.0, "height": 200.0}}
        ],
        "items": [
            {"id": "i1", "name": "Food Packet",
             "dimensions": {"width": 10.0, "depth": 10.0, "height": 20.0},
             "priority": 80, "expiry_date": "2025-05-20",
             "placement": {"container_id": "contA", "position": [0.0, 0.0, 0.0]}},
            {"id": "i2", "name": "Water Bottle",
             "dimensions": {"width": 10.0, "depth": 10.0, "height": 20.0},
             "usage_limit": 30}
        ]
    }"#;

    #[test]
    fn test_parse_snapshot_file() {
        let file: SnapshotFile = parse_json(SAMPLE).unwrap();
        assert_eq!(file.current_date, NaiveDate::from_ymd_opt(2025, 3, 1));
        assert_eq!(file.containers.len(), 1);

        let snapshot = file.to_snapshot().unwrap();
        let i1 = snapshot.item("i1").unwrap();
        assert_eq!(i1.priority(), 80);
        assert_eq!(i1.container_id(), Some("contA"));
        assert_eq!(snapshot.item("i2").unwrap().remaining_uses(), Some(30));
        assert_eq!(snapshot.version("contA"), 0);
    }

    #[test]
    fn test_round_trip_through_disk() {
        let file: SnapshotFile = parse_json(SAMPLE).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snapshot.json");

        let snapshot = file.to_snapshot().unwrap();
        SnapshotFile::from_snapshot(&snapshot, file.current_date)
            .save(&path)
            .unwrap();

        let reloaded = SnapshotFile::load(&path).unwrap().to_snapshot().unwrap();
        assert_eq!(reloaded.item("i1"), snapshot.item("i1"));
    }

    #[test]
    fn test_inconsistent_file() {
        let json = r#"{
            "containers": [],
            "items": [{"id": "x", "name": "X",
                       "dimensions": {"width": 1.0, "depth": 1.0, "height": 1.0},
                       "placement": {"container_id": "ghost", "position": [0.0, 0.0, 0.0]}}]
        }"#;
        let file: SnapshotFile = parse_json(json).unwrap();
        assert!(matches!(
            file.to_snapshot(),
            Err(CliError::Stowage(stowage::Error::InconsistentSnapshot(_)))
        ));
    }
}
