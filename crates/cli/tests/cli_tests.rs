//! End-to-end tests for the stowctl binary.

use std::fs;
use std::path::Path;
use std::process::Command;

const SNAPSHOT: &str = r#"{
    "current_date": "2025-03-01",
    "containers": [
        {"id": "contA", "zone": "Crew Quarters",
         "dimensions": {"width": 100.0, "depth": 85.0, "height": 200.0}}
    ],
    "items": [
        {"id": "i1", "name": "Food Packet",
         "dimensions": {"width": 10.0, "depth": 10.0, "height": 20.0},
         "priority": 80, "usage_limit": 1,
         "placement": {"container_id": "contA", "position": [0.0, 0.0, 0.0]}}
    ]
}"#;

fn stowctl(snapshot: &Path, args: &[&str]) -> serde_json::Value {
    let output = Command::new(env!("CARGO_BIN_EXE_stowctl"))
        .arg("--snapshot")
        .arg(snapshot)
        .args(args)
        .output()
        .unwrap();
    assert!(
        output.status.success(),
        "stowctl failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).unwrap()
}

#[test]
fn test_place_and_write() {
    let dir = tempfile::tempdir().unwrap();
    let snapshot = dir.path().join("snapshot.json");
    let items = dir.path().join("items.json");
    fs::write(&snapshot, SNAPSHOT).unwrap();
    fs::write(
        &items,
        r#"[{"id": "i2", "name": "Water Bottle",
             "dimensions": {"width": 10.0, "depth": 10.0, "height": 20.0},
             "priority": 50}]"#,
    )
    .unwrap();

    let report = stowctl(&snapshot, &["place", items.to_str().unwrap(), "--write"]);
    let placement = &report["placements"][0];
    assert_eq!(placement["outcome"], "placed");
    assert_eq!(placement["item_id"], "i2");

    let written: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&snapshot).unwrap()).unwrap();
    assert_eq!(written["items"].as_array().map(Vec::len), Some(2));
    assert_eq!(written["versions"]["contA"], 1);
}

#[test]
fn test_retrieve_then_identify() {
    let dir = tempfile::tempdir().unwrap();
    let snapshot = dir.path().join("snapshot.json");
    fs::write(&snapshot, SNAPSHOT).unwrap();

    let report = stowctl(&snapshot, &["retrieve", "Food Packet", "--write"]);
    assert_eq!(report["retrieval"]["item_id"], "i1");
    assert_eq!(report["usage"]["remaining"], 0);

    // The last use already moved the item to waste.
    let report = stowctl(&snapshot, &["waste", "identify"]);
    assert_eq!(report["waste"][0]["status"], "waste_depleted");

    // The loose item still leaves with the undocking container.
    let report = stowctl(
        &snapshot,
        &["waste", "undock", "--container", "contA", "--max-mass", "100", "--write"],
    );
    assert_eq!(report["undocking"]["return_plan"]["selected"][0], "i1");
    let written: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&snapshot).unwrap()).unwrap();
    assert_eq!(written["items"][0]["status"], "disposed");
}

#[test]
fn test_unknown_item_fails() {
    let dir = tempfile::tempdir().unwrap();
    let snapshot = dir.path().join("snapshot.json");
    fs::write(&snapshot, SNAPSHOT).unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_stowctl"))
        .arg("--snapshot")
        .arg(&snapshot)
        .args(["search", "nothing"])
        .output()
        .unwrap();
    assert!(!output.status.success());
}
