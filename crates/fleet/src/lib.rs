// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cabmux: elevator fleet dispatch with per-cab SCAN/LOOK scheduling.

pub mod book;
pub mod cab;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod events;

use std::sync::Arc;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use crate::cab::Cab;
use crate::config::FleetConfig;
use crate::dispatch::Dispatcher;
use crate::events::FleetEvent;

/// Run the demo driver until Ctrl-C: build the fleet, generate seeded random
/// traffic, log periodic fleet snapshots, and trace fleet events.
pub async fn run(config: FleetConfig) -> anyhow::Result<()> {
    let shutdown = CancellationToken::new();
    let seed = config.seed.unwrap_or_else(rand::random);
    let dispatcher = Arc::new(Dispatcher::new(seed, shutdown.clone()));
    // Subscribe before the fleet is built so registration events are traced.
    spawn_event_log(dispatcher.events().subscribe(), shutdown.clone());

    let specs = config.cab_specs()?;
    if specs.is_empty() {
        anyhow::bail!("no cabs configured");
    }
    let mut lowest = i32::MAX;
    let mut highest = i32::MIN;
    for spec in specs {
        lowest = lowest.min(spec.min_floor);
        highest = highest.max(spec.max_floor);
        dispatcher.add_cab(spec)?;
    }
    tracing::info!(
        cabs = dispatcher.fleet_snapshot().len(),
        floors = %format!("{lowest}..{highest}"),
        seed,
        "fleet ready"
    );

    spawn_traffic(
        Arc::clone(&dispatcher),
        lowest,
        highest,
        config.traffic_interval(),
        seed,
        shutdown.clone(),
    );
    spawn_observer(Arc::clone(&dispatcher), config.snapshot_interval(), shutdown.clone());

    tokio::signal::ctrl_c().await?;
    tracing::info!("shutting down");
    shutdown.cancel();
    Ok(())
}

/// Spawn a task generating a random request within the fleet's floor union
/// every interval. Requests no single cab can cover are expected and logged
/// as rejections.
fn spawn_traffic(
    dispatcher: Arc<Dispatcher<Cab>>,
    lowest: i32,
    highest: i32,
    interval: std::time::Duration,
    seed: u64,
    cancel: CancellationToken,
) {
    tokio::spawn(async move {
        let mut rng = SmallRng::seed_from_u64(seed);
        let mut timer = tokio::time::interval(interval);
        timer.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = timer.tick() => {}
            }

            let from = rng.random_range(lowest..=highest);
            let mut to = rng.random_range(lowest..=highest);
            while to == from {
                to = rng.random_range(lowest..=highest);
            }
            match dispatcher.dispatch(from, to) {
                Ok(cab) => tracing::info!(cab = cab.name(), from, to, "request dispatched"),
                Err(e) => tracing::warn!(err = %e, from, to, "request rejected"),
            }
        }
    });
}

/// Spawn a task logging the full fleet snapshot as JSON every interval.
fn spawn_observer(
    dispatcher: Arc<Dispatcher<Cab>>,
    interval: std::time::Duration,
    cancel: CancellationToken,
) {
    tokio::spawn(async move {
        let mut timer = tokio::time::interval(interval);
        timer.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = timer.tick() => {}
            }

            match serde_json::to_string(&dispatcher.fleet_snapshot()) {
                Ok(json) => tracing::info!(fleet = %json, "fleet snapshot"),
                Err(e) => tracing::warn!(err = %e, "snapshot serialization failed"),
            }
        }
    });
}

/// Spawn a task tracing every fleet event as it happens.
fn spawn_event_log(mut events: broadcast::Receiver<FleetEvent>, cancel: CancellationToken) {
    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                event = events.recv() => match event {
                    Ok(event) => tracing::debug!(cab = event.cab(), event = ?event, "fleet event"),
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "event log fell behind");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                },
            }
        }
    });
}
