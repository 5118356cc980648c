// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fleet event types and the broadcast hub observers subscribe to.
//!
//! Snapshots answer "what does the fleet look like now"; events answer "what
//! just happened". An adapter that wants live updates subscribes here instead
//! of polling [`crate::dispatch::Dispatcher::fleet_snapshot`].

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::book::Direction;

// -- Event types --------------------------------------------------------------

/// Events emitted by cabs and the dispatcher, tagged with the cab name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FleetEvent {
    /// A cab joined the fleet.
    Registered { cab: String, min_floor: i32, max_floor: i32 },
    /// A request was routed to a cab.
    Dispatched { cab: String, from: i32, to: i32, direction: Direction },
    /// A cab arrived at a floor while sweeping.
    Arrived { cab: String, floor: i32 },
    /// Doors opened for boarding at a stop.
    DoorsOpened { cab: String, floor: i32 },
    /// Doors closed after the dwell.
    DoorsClosed { cab: String, floor: i32 },
    /// A cab ran out of work and parked.
    Parked { cab: String, floor: i32 },
}

impl FleetEvent {
    /// The cab this event concerns.
    pub fn cab(&self) -> &str {
        match self {
            Self::Registered { cab, .. }
            | Self::Dispatched { cab, .. }
            | Self::Arrived { cab, .. }
            | Self::DoorsOpened { cab, .. }
            | Self::DoorsClosed { cab, .. }
            | Self::Parked { cab, .. } => cab,
        }
    }
}

// -- Hub ----------------------------------------------------------------------

/// Broadcast hub fanning fleet events out to observers.
///
/// Emitters never block: with no active subscribers the event is discarded,
/// and a lagging subscriber sees `Lagged` from the broadcast channel instead
/// of applying backpressure to a cab's service task.
#[derive(Debug, Clone)]
pub struct EventHub {
    event_tx: broadcast::Sender<FleetEvent>,
}

impl EventHub {
    pub fn new() -> Self {
        let (event_tx, _) = broadcast::channel(256);
        Self { event_tx }
    }

    /// Subscribe to events emitted after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<FleetEvent> {
        self.event_tx.subscribe()
    }

    pub(crate) fn emit(&self, event: FleetEvent) {
        let _ = self.event_tx.send(event);
    }
}

impl Default for EventHub {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "events_tests.rs"]
mod tests;
