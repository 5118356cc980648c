// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fleet dispatcher: routes each incoming request to the best cab.
//!
//! Selection runs in phases over the feasible set (cabs whose range covers
//! both endpoints):
//!
//!   A. idle cabs: nearest to the pickup, ties broken at random;
//!   B. same-direction cabs that have not yet passed the pickup: nearest;
//!   C. same-direction cabs exist but all passed: least-loaded feasible cab;
//!   D/E. only opposite-direction cabs: the one with the fewest stops to
//!        clear before it can reverse;
//!   fallback: first feasible non-idle cab in registration order.
//!
//! Phase ties beyond A resolve by registration order, so repeated runs with a
//! fixed RNG seed are fully deterministic.

use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use tokio_util::sync::CancellationToken;

use crate::book::Direction;
use crate::cab::{Cab, CabService, CabSnapshot, CabSpec};
use crate::error::FleetError;
use crate::events::{EventHub, FleetEvent};

/// Routes requests across a fleet of cabs.
///
/// Generic over the cab capability surface so the selection logic is
/// testable against deterministic fakes; [`Cab`] is the production
/// implementation.
pub struct Dispatcher<C = Cab> {
    cabs: RwLock<Vec<Arc<C>>>,
    rng: Mutex<SmallRng>,
    shutdown: CancellationToken,
    events: EventHub,
}

impl<C: CabService> Dispatcher<C> {
    /// `seed` drives the idle tie-break RNG; fix it for deterministic tests.
    /// `shutdown` is the root token; each cab's service task runs under a
    /// child of it.
    pub fn new(seed: u64, shutdown: CancellationToken) -> Self {
        Self {
            cabs: RwLock::new(Vec::new()),
            rng: Mutex::new(SmallRng::seed_from_u64(seed)),
            shutdown,
            events: EventHub::new(),
        }
    }

    /// The hub carrying fleet events; subscribe for live observation.
    pub fn events(&self) -> &EventHub {
        &self.events
    }

    /// Add a cab to the fleet. Names must be unique within the fleet.
    pub fn register(&self, cab: Arc<C>) -> Result<(), FleetError> {
        let mut cabs = self.cabs.write();
        if cabs.iter().any(|c| c.name() == cab.name()) {
            return Err(FleetError::InvalidConfig);
        }
        tracing::info!(cab = cab.name(), "cab registered");
        let snap = cab.snapshot();
        self.events.emit(FleetEvent::Registered {
            cab: snap.name,
            min_floor: snap.min_floor,
            max_floor: snap.max_floor,
        });
        cabs.push(cab);
        Ok(())
    }

    /// Observable state of every cab, in registration order.
    pub fn fleet_snapshot(&self) -> Vec<CabSnapshot> {
        self.cabs.read().iter().map(|c| c.snapshot()).collect()
    }

    /// Route `(from, to)` to exactly one cab, queue it there, and return the
    /// cab handle.
    pub fn dispatch(&self, from: i32, to: i32) -> Result<Arc<C>, FleetError> {
        if from == to {
            return Err(FleetError::SameFloor);
        }
        let req_dir = Direction::of(from, to);

        // Snapshot the fleet under the read lock and release it before
        // interrogating cabs.
        let cabs: Vec<Arc<C>> = self.cabs.read().iter().map(Arc::clone).collect();
        if cabs.is_empty() {
            return Err(FleetError::NoCab);
        }

        // A caller retrying an already-queued request gets the same cab back
        // instead of amplifying load.
        if let Some(cab) = cabs.iter().find(|c| c.contains(req_dir, from, to)) {
            tracing::debug!(cab = cab.name(), from, to, "dispatch: already queued");
            return Ok(Arc::clone(cab));
        }

        let feasible: Vec<&Arc<C>> = cabs.iter().filter(|c| c.in_range(from, to)).collect();
        if feasible.is_empty() {
            return Err(FleetError::OutOfRange);
        }

        let cab = self.select(req_dir, from, &feasible);
        if !cab.in_range(from, to) {
            // Selection must stay inside the feasible set.
            return Err(FleetError::Internal);
        }
        cab.accept_request(req_dir, from, to);
        tracing::debug!(cab = cab.name(), from, to, dir = %req_dir, "dispatched");
        self.events.emit(FleetEvent::Dispatched {
            cab: cab.name().to_owned(),
            from,
            to,
            direction: req_dir,
        });
        Ok(Arc::clone(cab))
    }

    fn select<'a>(&self, req_dir: Direction, from: i32, feasible: &[&'a Arc<C>]) -> &'a Arc<C> {
        // Phase A: idle cabs, nearest to the pickup.
        let idle: Vec<&'a Arc<C>> = feasible
            .iter()
            .copied()
            .filter(|c| c.direction() == Direction::Idle)
            .collect();
        if let Some(nearest) = idle.iter().map(|c| (c.current_floor() - from).abs()).min() {
            let tied: Vec<&'a Arc<C>> = idle
                .into_iter()
                .filter(|c| (c.current_floor() - from).abs() == nearest)
                .collect();
            let idx = if tied.len() > 1 {
                self.rng.lock().random_range(0..tied.len())
            } else {
                0
            };
            return tied[idx];
        }

        // Phase B: same-direction cabs that have not yet passed the pickup.
        let same: Vec<&'a Arc<C>> = feasible
            .iter()
            .copied()
            .filter(|c| c.direction() == req_dir)
            .collect();
        let approaching = same.iter().copied().filter(|c| match req_dir {
            Direction::Up => c.current_floor() < from,
            Direction::Down => c.current_floor() > from,
            Direction::Idle => false,
        });
        if let Some(cab) = approaching.min_by_key(|c| (c.current_floor() - from).abs()) {
            return cab;
        }

        // Phase C: every same-direction cab has already passed the pickup;
        // fall back to the least-loaded cab across the whole feasible set.
        if !same.is_empty() {
            if let Some(cab) = feasible.iter().copied().min_by_key(|c| c.pending_count()) {
                return cab;
            }
        }

        // Phases D/E: only opposite-direction cabs remain. With several,
        // prefer the one with the fewest stops left in its own travel
        // direction, i.e. the quickest to reverse.
        let opposite: Vec<&'a Arc<C>> = feasible
            .iter()
            .copied()
            .filter(|c| c.direction() == req_dir.opposite())
            .collect();
        if opposite.len() == 1 {
            return opposite[0];
        }
        let blocking_stops = |c: &&'a Arc<C>| match req_dir {
            Direction::Up => c.down_len(),
            Direction::Down => c.up_len(),
            Direction::Idle => 0,
        };
        if let Some(cab) = opposite.into_iter().min_by_key(blocking_stops) {
            return cab;
        }

        // Unreachable with a three-valued direction, kept total: first
        // feasible non-idle cab in registration order.
        feasible
            .iter()
            .copied()
            .find(|c| c.direction() != Direction::Idle)
            .unwrap_or(feasible[0])
    }
}

impl Dispatcher<Cab> {
    /// Construct a cab from `spec`, spawn its service task under a child of
    /// the dispatcher's shutdown token, and register it.
    pub fn add_cab(&self, spec: CabSpec) -> Result<Arc<Cab>, FleetError> {
        let cancel = self.shutdown.child_token();
        let cab = Cab::spawn(spec, self.events.clone(), cancel.clone())?;
        if let Err(e) = self.register(Arc::clone(&cab)) {
            // Name collision: stop the freshly spawned service task again.
            cancel.cancel();
            return Err(e);
        }
        Ok(cab)
    }
}

#[cfg(test)]
#[path = "dispatch_tests.rs"]
mod tests;
