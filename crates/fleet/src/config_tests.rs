// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn test_config(cabs: &[&str]) -> FleetConfig {
    FleetConfig {
        cabs: cabs.iter().map(|s| (*s).to_owned()).collect(),
        floor_travel_ms: 100,
        door_dwell_ms: 250,
        traffic_ms: 1000,
        snapshot_ms: 1000,
        seed: Some(7),
    }
}

#[test]
fn parses_cab_definitions() -> anyhow::Result<()> {
    let config = test_config(&["A:0:10", "B:-2:5"]);
    let specs = config.cab_specs()?;

    assert_eq!(specs.len(), 2);
    assert_eq!(specs[0].name, "A");
    assert_eq!(specs[0].min_floor, 0);
    assert_eq!(specs[0].max_floor, 10);
    assert_eq!(specs[1].name, "B");
    assert_eq!(specs[1].min_floor, -2);
    assert_eq!(specs[1].max_floor, 5);
    Ok(())
}

#[test]
fn specs_inherit_shared_timings() -> anyhow::Result<()> {
    let config = test_config(&["A:0:10"]);
    let specs = config.cab_specs()?;

    assert_eq!(specs[0].floor_travel, std::time::Duration::from_millis(100));
    assert_eq!(specs[0].door_dwell, std::time::Duration::from_millis(250));
    Ok(())
}

#[test]
fn rejects_malformed_definitions() {
    for raw in ["A", "A:0", "A:x:10", "A:0:y", ""] {
        let config = test_config(&[raw]);
        assert_eq!(config.cab_specs(), Err(FleetError::InvalidConfig), "input {raw:?}");
    }
}

#[test]
fn duration_accessors_convert_millis() {
    let config = test_config(&[]);
    assert_eq!(config.floor_travel().as_millis(), 100);
    assert_eq!(config.door_dwell().as_millis(), 250);
    assert_eq!(config.traffic_interval().as_millis(), 1000);
    assert_eq!(config.snapshot_interval().as_millis(), 1000);
}
