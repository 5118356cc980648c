// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! A single elevator cab and its SCAN/LOOK service task.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::book::{Direction, DirectionBook};
use crate::error::FleetError;
use crate::events::{EventHub, FleetEvent};

// -- Construction & observation types -----------------------------------------

/// Construction parameters for a cab. Travel and dwell times are fixed for
/// the cab's lifetime; tests inject sub-millisecond values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CabSpec {
    pub name: String,
    pub min_floor: i32,
    pub max_floor: i32,
    /// Travel time per floor.
    pub floor_travel: Duration,
    /// How long the doors stay open at a stop.
    pub door_dwell: Duration,
}

/// Observable state of a cab at one instant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CabSnapshot {
    pub name: String,
    pub min_floor: i32,
    pub max_floor: i32,
    pub current_floor: i32,
    pub direction: Direction,
    pub doors_open: bool,
    pub pending_up: usize,
    pub pending_down: usize,
}

/// Capability surface the dispatcher selects against.
///
/// [`Cab`] is the production implementation; dispatcher tests substitute
/// deterministic fakes with pinned floors and directions.
pub trait CabService: Send + Sync {
    fn name(&self) -> &str;
    fn in_range(&self, from: i32, to: i32) -> bool;
    fn current_floor(&self) -> i32;
    fn direction(&self) -> Direction;
    fn up_len(&self) -> usize;
    fn down_len(&self) -> usize;
    fn pending_count(&self) -> usize;
    fn contains(&self, dir: Direction, from: i32, to: i32) -> bool;
    fn accept_request(&self, dir: Direction, from: i32, to: i32);
    fn snapshot(&self) -> CabSnapshot;
}

// -- Cab ----------------------------------------------------------------------

/// Mutable scalars guarded together. Lock order when the book is touched in
/// the same logical step: scalars before book.
#[derive(Debug)]
struct Scalars {
    current_floor: i32,
    direction: Direction,
    doors_open: bool,
}

/// One elevator cab.
///
/// The spawned service task owns all movement; requesters and observers go
/// through the lock-guarded scalars and the direction book. Neither lock is
/// ever held across a suspension point.
#[derive(Debug)]
pub struct Cab {
    name: String,
    min_floor: i32,
    max_floor: i32,
    floor_travel: Duration,
    door_dwell: Duration,
    scalars: RwLock<Scalars>,
    book: DirectionBook,
    wake_tx: mpsc::Sender<()>,
    events: EventHub,
}

impl Cab {
    /// Validate `spec`, construct the cab, and spawn its service task.
    ///
    /// Must be called within a tokio runtime. The task runs until `cancel`
    /// fires, then exits at its next suspension point, discarding whatever
    /// work is still pending.
    pub fn spawn(
        spec: CabSpec,
        events: EventHub,
        cancel: CancellationToken,
    ) -> Result<Arc<Cab>, FleetError> {
        if spec.name.is_empty() || spec.min_floor >= spec.max_floor {
            return Err(FleetError::InvalidConfig);
        }
        let start = if spec.min_floor <= 0 && 0 <= spec.max_floor {
            0
        } else {
            spec.min_floor
        };

        // Capacity 1: a parked loop needs at most one pending nudge, extra
        // wakes collapse into it.
        let (wake_tx, wake_rx) = mpsc::channel(1);
        let cab = Arc::new(Cab {
            name: spec.name,
            min_floor: spec.min_floor,
            max_floor: spec.max_floor,
            floor_travel: spec.floor_travel,
            door_dwell: spec.door_dwell,
            scalars: RwLock::new(Scalars {
                current_floor: start,
                direction: Direction::Idle,
                doors_open: false,
            }),
            book: DirectionBook::new(),
            wake_tx,
            events,
        });
        tokio::spawn(Arc::clone(&cab).service_loop(wake_rx, cancel));
        Ok(cab)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn min_floor(&self) -> i32 {
        self.min_floor
    }

    pub fn max_floor(&self) -> i32 {
        self.max_floor
    }

    /// Whether both endpoints lie within this cab's floor range.
    pub fn in_range(&self, from: i32, to: i32) -> bool {
        let covers = |floor| self.min_floor <= floor && floor <= self.max_floor;
        covers(from) && covers(to)
    }

    pub fn current_floor(&self) -> i32 {
        self.scalars.read().current_floor
    }

    pub fn direction(&self) -> Direction {
        self.scalars.read().direction
    }

    pub fn doors_open(&self) -> bool {
        self.scalars.read().doors_open
    }

    /// Pending stop floors across both lanes.
    pub fn pending_count(&self) -> usize {
        self.book.total_len()
    }

    /// Whether `(from, to)` is already queued under `dir`.
    pub fn contains(&self, dir: Direction, from: i32, to: i32) -> bool {
        self.book.contains(dir, from, to)
    }

    /// Queue a request on this cab and nudge the service task.
    ///
    /// Callers are responsible for range-checking via [`Cab::in_range`]; the
    /// dispatcher only routes feasible requests here. An idle cab commits to
    /// the request's direction immediately so concurrent dispatches observe
    /// it as busy.
    pub fn accept_request(&self, dir: Direction, from: i32, to: i32) {
        {
            let mut scalars = self.scalars.write();
            if scalars.direction == Direction::Idle {
                scalars.direction = dir;
            }
        }
        self.book.append(dir, from, to);
        // Full means a wake is already queued; Closed means the task is gone
        // after shutdown. Both are fine to drop.
        let _ = self.wake_tx.try_send(());
        tracing::debug!(cab = %self.name, from, to, dir = %dir, "request accepted");
    }

    pub fn snapshot(&self) -> CabSnapshot {
        let scalars = self.scalars.read();
        CabSnapshot {
            name: self.name.clone(),
            min_floor: self.min_floor,
            max_floor: self.max_floor,
            current_floor: scalars.current_floor,
            direction: scalars.direction,
            doors_open: scalars.doors_open,
            pending_up: self.book.up_len(),
            pending_down: self.book.down_len(),
        }
    }

    // -- Service loop ---------------------------------------------------------

    async fn service_loop(
        self: Arc<Self>,
        mut wake_rx: mpsc::Receiver<()>,
        cancel: CancellationToken,
    ) {
        tracing::debug!(cab = %self.name, "service loop started");
        loop {
            let dir = match self.plan_sweep() {
                Some(dir) => dir,
                None => {
                    // Parked. A request queued between the emptiness check
                    // and this point left a buffered wake, so no signal is
                    // lost.
                    tokio::select! {
                        _ = cancel.cancelled() => break,
                        msg = wake_rx.recv() => {
                            if msg.is_none() {
                                break;
                            }
                        }
                    }
                    continue;
                }
            };
            if !self.sweep(dir, &cancel).await {
                break;
            }
        }
        tracing::debug!(cab = %self.name, "service loop stopped");
    }

    /// Decide the next sweep direction, or park the cab as idle.
    ///
    /// Keeps the committed direction while its lane has work, else turns
    /// around if the other lane has work, else goes idle.
    fn plan_sweep(&self) -> Option<Direction> {
        let mut scalars = self.scalars.write();
        let committed = scalars.direction;
        let pick = [committed, committed.opposite(), Direction::Up, Direction::Down]
            .into_iter()
            .find(|d| *d != Direction::Idle && self.book.lane_len(*d) > 0);
        scalars.direction = pick.unwrap_or(Direction::Idle);
        let floor = scalars.current_floor;
        drop(scalars);

        if pick.is_none() && committed != Direction::Idle {
            tracing::debug!(cab = %self.name, floor, "parked");
            self.events.emit(FleetEvent::Parked { cab: self.name.clone(), floor });
        }
        pick
    }

    /// One monotonic sweep in `dir`: service stops and advance one floor at a
    /// time toward the next target until the lane drains. When the lane only
    /// holds stops behind the cab, the target is the reversal point and the
    /// cab travels there the same way. Returns `false` when cancelled.
    async fn sweep(&self, dir: Direction, cancel: &CancellationToken) -> bool {
        loop {
            let current = self.current_floor();
            if self.book.has_stop(dir, current) {
                if !self.service_stop(dir, current, cancel).await {
                    return false;
                }
                continue;
            }
            let Some(target) = self.book.next_target(dir, current) else {
                return true;
            };
            if target < self.min_floor || target > self.max_floor {
                // Unreachable as long as every accepted request passed
                // in_range; surfaced instead of crashing the task.
                tracing::error!(cab = %self.name, floor = target, "stop outside cab range, shedding");
                self.book.drop_stop(dir, target);
                continue;
            }
            let next = if target > current { current + 1 } else { current - 1 };
            tokio::select! {
                _ = cancel.cancelled() => return false,
                _ = tokio::time::sleep(self.floor_travel) => {}
            }
            self.scalars.write().current_floor = next;
            tracing::debug!(cab = %self.name, floor = next, dir = %dir, "arrived");
            self.events.emit(FleetEvent::Arrived { cab: self.name.clone(), floor: next });
        }
    }

    /// Doors open, passengers board during the dwell, their destinations
    /// become stops, doors close.
    async fn service_stop(&self, dir: Direction, floor: i32, cancel: &CancellationToken) -> bool {
        self.scalars.write().doors_open = true;
        tracing::debug!(cab = %self.name, floor, "doors open");
        self.events.emit(FleetEvent::DoorsOpened { cab: self.name.clone(), floor });
        tokio::select! {
            _ = cancel.cancelled() => return false,
            _ = tokio::time::sleep(self.door_dwell) => {}
        }
        self.book.flush(dir, floor);
        self.scalars.write().doors_open = false;
        tracing::debug!(cab = %self.name, floor, "doors closed");
        self.events.emit(FleetEvent::DoorsClosed { cab: self.name.clone(), floor });
        true
    }
}

impl CabService for Cab {
    fn name(&self) -> &str {
        Cab::name(self)
    }

    fn in_range(&self, from: i32, to: i32) -> bool {
        Cab::in_range(self, from, to)
    }

    fn current_floor(&self) -> i32 {
        Cab::current_floor(self)
    }

    fn direction(&self) -> Direction {
        Cab::direction(self)
    }

    fn up_len(&self) -> usize {
        self.book.up_len()
    }

    fn down_len(&self) -> usize {
        self.book.down_len()
    }

    fn pending_count(&self) -> usize {
        Cab::pending_count(self)
    }

    fn contains(&self, dir: Direction, from: i32, to: i32) -> bool {
        Cab::contains(self, dir, from, to)
    }

    fn accept_request(&self, dir: Direction, from: i32, to: i32) {
        Cab::accept_request(self, dir, from, to)
    }

    fn snapshot(&self) -> CabSnapshot {
        Cab::snapshot(self)
    }
}

#[cfg(test)]
#[path = "cab_tests.rs"]
mod tests;
