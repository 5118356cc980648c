// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Direction-partitioned pending-stop store, shared between a cab's service
//! task and external requesters.

use std::collections::BTreeMap;
use std::fmt;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

// -- Direction ----------------------------------------------------------------

/// Travel direction of a cab or a request.
///
/// `Idle` means no pending work and no committed sweep direction; requests
/// themselves are always `Up` or `Down`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
    Idle,
}

impl Direction {
    /// Direction implied by a pickup/destination pair. Callers reject
    /// `from == to` before this.
    pub fn of(from: i32, to: i32) -> Direction {
        if to > from {
            Direction::Up
        } else {
            Direction::Down
        }
    }

    pub fn opposite(&self) -> Direction {
        match self {
            Self::Up => Self::Down,
            Self::Down => Self::Up,
            Self::Idle => Self::Idle,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Up => "up",
            Self::Down => "down",
            Self::Idle => "idle",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// -- DirectionBook ------------------------------------------------------------

/// One direction's stops: floor -> destinations declared by the passengers
/// boarding there. A key with an empty list is a pure drop-off. Key ordering
/// is load-bearing: sweep target selection walks floors in order.
type Lane = BTreeMap<i32, Vec<i32>>;

#[derive(Debug, Default)]
struct Lanes {
    up: Lane,
    down: Lane,
}

impl Lanes {
    fn lane(&self, dir: Direction) -> Option<&Lane> {
        match dir {
            Direction::Up => Some(&self.up),
            Direction::Down => Some(&self.down),
            Direction::Idle => None,
        }
    }

    fn lane_mut(&mut self, dir: Direction) -> Option<&mut Lane> {
        match dir {
            Direction::Up => Some(&mut self.up),
            Direction::Down => Some(&mut self.down),
            Direction::Idle => None,
        }
    }
}

/// Pending stops for one cab, partitioned by travel direction.
///
/// All mutators take the write lock, readers the read lock; the lock is never
/// held across a suspension point. Duplicate `(from, to)` pairs are stored
/// as-is: two passengers making the same trip are two entries.
#[derive(Debug, Default)]
pub struct DirectionBook {
    lanes: RwLock<Lanes>,
}

impl DirectionBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that a passenger waiting at `from` wants to reach `to`.
    pub fn append(&self, dir: Direction, from: i32, to: i32) {
        let mut lanes = self.lanes.write();
        if let Some(lane) = lanes.lane_mut(dir) {
            lane.entry(from).or_default().push(to);
        }
    }

    /// Board the passengers waiting at `floor`: every destination they
    /// declared becomes a pending stop in the same lane, then the key is
    /// removed. Destinations already present as stops are left untouched.
    pub fn flush(&self, dir: Direction, floor: i32) {
        let mut lanes = self.lanes.write();
        let Some(lane) = lanes.lane_mut(dir) else {
            return;
        };
        let Some(dests) = lane.remove(&floor) else {
            return;
        };
        for dest in dests {
            lane.entry(dest).or_default();
        }
    }

    /// Remove a key without promoting its destinations. Only used to shed a
    /// stop that turned out to violate the owning cab's range.
    pub fn drop_stop(&self, dir: Direction, floor: i32) {
        let mut lanes = self.lanes.write();
        if let Some(lane) = lanes.lane_mut(dir) {
            lane.remove(&floor);
        }
    }

    /// Whether `to` is recorded as a destination under `dir[from]`.
    pub fn contains(&self, dir: Direction, from: i32, to: i32) -> bool {
        let lanes = self.lanes.read();
        lanes
            .lane(dir)
            .and_then(|lane| lane.get(&from))
            .is_some_and(|dests| dests.contains(&to))
    }

    /// Whether the cab still has to stop at `floor` while sweeping in `dir`.
    pub fn has_stop(&self, dir: Direction, floor: i32) -> bool {
        let lanes = self.lanes.read();
        lanes.lane(dir).is_some_and(|lane| lane.contains_key(&floor))
    }

    /// Next floor the cab should head for while sweeping in `dir` from
    /// `current`: the nearest stop at or beyond the current floor, falling
    /// back to the extremal behind stop (the reversal point) when every
    /// remaining stop is behind the cab. `None` when the lane is empty.
    pub fn next_target(&self, dir: Direction, current: i32) -> Option<i32> {
        let lanes = self.lanes.read();
        let lane = lanes.lane(dir)?;
        let entry = match dir {
            Direction::Up => lane.range(current..).next().or_else(|| lane.iter().next()),
            Direction::Down => lane
                .range(..=current)
                .next_back()
                .or_else(|| lane.iter().next_back()),
            Direction::Idle => None,
        };
        entry.map(|(floor, _)| *floor)
    }

    /// Number of pending stop floors in one lane.
    pub fn lane_len(&self, dir: Direction) -> usize {
        let lanes = self.lanes.read();
        lanes.lane(dir).map_or(0, |lane| lane.len())
    }

    pub fn up_len(&self) -> usize {
        self.lane_len(Direction::Up)
    }

    pub fn down_len(&self) -> usize {
        self.lane_len(Direction::Down)
    }

    /// Total pending stop floors across both lanes; the dispatcher's load
    /// proxy.
    pub fn total_len(&self) -> usize {
        let lanes = self.lanes.read();
        lanes.up.len() + lanes.down.len()
    }

    pub fn is_empty(&self) -> bool {
        let lanes = self.lanes.read();
        lanes.up.is_empty() && lanes.down.is_empty()
    }
}

#[cfg(test)]
#[path = "book_tests.rs"]
mod tests;
