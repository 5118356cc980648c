// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::cab::CabSpec;
use crate::error::FleetError;

/// Configuration for the cabmux demo driver.
#[derive(Debug, Clone, clap::Parser)]
pub struct FleetConfig {
    /// Cab definition as NAME:MIN:MAX; repeat for more cabs.
    #[arg(
        long = "cab",
        value_name = "NAME:MIN:MAX",
        default_values_t = ["A:0:10".to_owned(), "B:0:10".to_owned(), "C:5:15".to_owned()]
    )]
    pub cabs: Vec<String>,

    /// Travel time per floor in milliseconds.
    #[arg(long, default_value_t = 1000, env = "CABMUX_FLOOR_TRAVEL_MS")]
    pub floor_travel_ms: u64,

    /// Door dwell time per stop in milliseconds.
    #[arg(long, default_value_t = 2000, env = "CABMUX_DOOR_DWELL_MS")]
    pub door_dwell_ms: u64,

    /// Interval between generated demo requests in milliseconds.
    #[arg(long, default_value_t = 3000, env = "CABMUX_TRAFFIC_MS")]
    pub traffic_ms: u64,

    /// Interval between fleet snapshot logs in milliseconds.
    #[arg(long, default_value_t = 5000, env = "CABMUX_SNAPSHOT_MS")]
    pub snapshot_ms: u64,

    /// Seed for the dispatch tie-break and traffic RNGs. Random if unset.
    #[arg(long, env = "CABMUX_SEED")]
    pub seed: Option<u64>,
}

impl FleetConfig {
    pub fn floor_travel(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.floor_travel_ms)
    }

    pub fn door_dwell(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.door_dwell_ms)
    }

    pub fn traffic_interval(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.traffic_ms)
    }

    pub fn snapshot_interval(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.snapshot_ms)
    }

    /// Parse the `--cab` definitions into specs, applying the shared timing
    /// settings. Range validity itself is checked again at cab construction.
    pub fn cab_specs(&self) -> Result<Vec<CabSpec>, FleetError> {
        self.cabs.iter().map(|raw| self.parse_cab(raw)).collect()
    }

    fn parse_cab(&self, raw: &str) -> Result<CabSpec, FleetError> {
        let mut parts = raw.splitn(3, ':');
        let (Some(name), Some(min), Some(max)) = (parts.next(), parts.next(), parts.next()) else {
            return Err(FleetError::InvalidConfig);
        };
        let min_floor: i32 = min.parse().map_err(|_| FleetError::InvalidConfig)?;
        let max_floor: i32 = max.parse().map_err(|_| FleetError::InvalidConfig)?;
        Ok(CabSpec {
            name: name.to_owned(),
            min_floor,
            max_floor,
            floor_travel: self.floor_travel(),
            door_dwell: self.door_dwell(),
        })
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
