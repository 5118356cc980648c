// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn spec(name: &str, min: i32, max: i32) -> CabSpec {
    CabSpec {
        name: name.to_owned(),
        min_floor: min,
        max_floor: max,
        floor_travel: Duration::from_millis(10),
        door_dwell: Duration::from_millis(20),
    }
}

/// Poll `cond` under the paused clock until it holds or `timeout` elapses.
async fn wait_until(timeout: Duration, cond: impl Fn() -> bool) -> bool {
    let end = tokio::time::Instant::now() + timeout;
    loop {
        if cond() {
            return true;
        }
        if tokio::time::Instant::now() >= end {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(1)).await;
    }
}

// ── Construction ──────────────────────────────────────────────────────

#[tokio::test]
async fn rejects_empty_name() {
    let err = Cab::spawn(spec("", 0, 10), EventHub::new(), CancellationToken::new());
    assert_eq!(err.err(), Some(FleetError::InvalidConfig));
}

#[tokio::test]
async fn rejects_inverted_or_degenerate_range() {
    for (min, max) in [(10, 0), (5, 5)] {
        let err = Cab::spawn(spec("A", min, max), EventHub::new(), CancellationToken::new());
        assert_eq!(err.err(), Some(FleetError::InvalidConfig), "range {min}..{max}");
    }
}

#[tokio::test]
async fn starts_at_zero_when_range_covers_it() -> anyhow::Result<()> {
    let cab = Cab::spawn(spec("A", -3, 10), EventHub::new(), CancellationToken::new())?;
    assert_eq!(cab.current_floor(), 0);
    assert_eq!(cab.direction(), Direction::Idle);
    assert!(!cab.doors_open());
    Ok(())
}

#[tokio::test]
async fn starts_at_min_floor_otherwise() -> anyhow::Result<()> {
    let high = Cab::spawn(spec("H", 5, 12), EventHub::new(), CancellationToken::new())?;
    assert_eq!(high.current_floor(), 5);

    let basement = Cab::spawn(spec("B", -10, -2), EventHub::new(), CancellationToken::new())?;
    assert_eq!(basement.current_floor(), -10);
    Ok(())
}

#[tokio::test]
async fn in_range_covers_both_endpoints() -> anyhow::Result<()> {
    let cab = Cab::spawn(spec("A", 2, 8), EventHub::new(), CancellationToken::new())?;
    assert!(cab.in_range(2, 8));
    assert!(cab.in_range(5, 3));
    assert!(!cab.in_range(1, 5));
    assert!(!cab.in_range(5, 9));
    Ok(())
}

// ── Request intake ────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn accept_commits_direction_immediately() -> anyhow::Result<()> {
    let cab = Cab::spawn(spec("A", 0, 10), EventHub::new(), CancellationToken::new())?;

    cab.accept_request(Direction::Up, 2, 5);

    // Visible before the service task has run at all.
    assert_eq!(cab.direction(), Direction::Up);
    assert!(cab.contains(Direction::Up, 2, 5));
    assert_eq!(cab.pending_count(), 1);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn opposite_request_does_not_flip_direction() -> anyhow::Result<()> {
    let cab = Cab::spawn(spec("A", 0, 10), EventHub::new(), CancellationToken::new())?;

    cab.accept_request(Direction::Up, 1, 9);
    cab.accept_request(Direction::Down, 8, 2);

    assert_eq!(cab.direction(), Direction::Up);
    assert!(cab.contains(Direction::Down, 8, 2));
    Ok(())
}

// ── Service loop ──────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn services_simple_up_run() -> anyhow::Result<()> {
    let cab = Cab::spawn(spec("A", 0, 10), EventHub::new(), CancellationToken::new())?;
    let started = tokio::time::Instant::now();

    cab.accept_request(Direction::Up, 1, 5);

    let done = wait_until(Duration::from_secs(2), || {
        cab.direction() == Direction::Idle && cab.current_floor() == 5
    })
    .await;
    assert!(done, "cab never settled at floor 5");
    assert_eq!(cab.pending_count(), 0);
    assert!(!cab.doors_open());

    // Five floors of travel plus two stops, measured on the paused clock.
    let elapsed = started.elapsed();
    let expected = 5 * Duration::from_millis(10) + 2 * Duration::from_millis(20);
    assert!(
        elapsed >= expected && elapsed <= expected + Duration::from_millis(10),
        "elapsed {elapsed:?}, expected about {expected:?}"
    );
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn pickup_at_current_floor_served_without_travel() -> anyhow::Result<()> {
    let cab = Cab::spawn(spec("A", 0, 10), EventHub::new(), CancellationToken::new())?;

    cab.accept_request(Direction::Up, 0, 3);

    let done = wait_until(Duration::from_secs(2), || {
        cab.direction() == Direction::Idle && cab.current_floor() == 3
    })
    .await;
    assert!(done, "cab never reached floor 3");
    assert_eq!(cab.pending_count(), 0);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn sweeps_up_before_turning_down() -> anyhow::Result<()> {
    let cab = Cab::spawn(spec("A", 0, 10), EventHub::new(), CancellationToken::new())?;

    cab.accept_request(Direction::Up, 1, 2);
    cab.accept_request(Direction::Down, 9, 4);

    let done = wait_until(Duration::from_secs(5), || {
        cab.direction() == Direction::Idle && cab.current_floor() == 4
    })
    .await;
    assert!(done, "cab never finished the down sweep at floor 4");
    assert_eq!(cab.pending_count(), 0);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn floor_stays_inside_range_throughout() -> anyhow::Result<()> {
    let cab = Cab::spawn(spec("A", 2, 8), EventHub::new(), CancellationToken::new())?;
    assert_eq!(cab.current_floor(), 2);

    cab.accept_request(Direction::Up, 3, 8);
    cab.accept_request(Direction::Down, 7, 2);

    let end = tokio::time::Instant::now() + Duration::from_secs(2);
    while tokio::time::Instant::now() < end {
        let floor = cab.current_floor();
        assert!((2..=8).contains(&floor), "cab left its range at {floor}");
        tokio::time::sleep(Duration::from_millis(1)).await;
    }
    assert_eq!(cab.direction(), Direction::Idle);
    assert_eq!(cab.pending_count(), 0);
    Ok(())
}

// ── Shutdown ──────────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn cancellation_stops_service() -> anyhow::Result<()> {
    let cancel = CancellationToken::new();
    let cab = Cab::spawn(spec("A", 0, 10), EventHub::new(), cancel.clone())?;

    cancel.cancel();
    tokio::time::sleep(Duration::from_millis(5)).await;

    // The loop is gone; new work is recorded but never serviced.
    cab.accept_request(Direction::Up, 1, 5);
    tokio::time::sleep(Duration::from_secs(2)).await;
    assert_eq!(cab.current_floor(), 0);
    assert!(cab.contains(Direction::Up, 1, 5));
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn cancellation_mid_sweep_discards_pending_work() -> anyhow::Result<()> {
    let cancel = CancellationToken::new();
    let cab = Cab::spawn(spec("A", 0, 10), EventHub::new(), cancel.clone())?;

    cab.accept_request(Direction::Up, 9, 10);
    let moving = wait_until(Duration::from_secs(1), || cab.current_floor() >= 2).await;
    assert!(moving, "cab never started moving");

    cancel.cancel();
    tokio::time::sleep(Duration::from_secs(10)).await;

    // Ten virtual seconds is ample time to finish the sweep; the stop at 9
    // still being booked means the loop exited and discarded it.
    assert!(cab.pending_count() > 0, "pending work was serviced after shutdown");
    assert!((0..=10).contains(&cab.current_floor()));
    Ok(())
}

// ── Snapshot ──────────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn snapshot_reflects_state() -> anyhow::Result<()> {
    let cab = Cab::spawn(spec("A", 0, 10), EventHub::new(), CancellationToken::new())?;
    cab.accept_request(Direction::Up, 2, 5);
    cab.accept_request(Direction::Down, 8, 1);

    let snap = cab.snapshot();
    assert_eq!(snap.name, "A");
    assert_eq!(snap.min_floor, 0);
    assert_eq!(snap.max_floor, 10);
    assert_eq!(snap.current_floor, 0);
    assert_eq!(snap.direction, Direction::Up);
    assert!(!snap.doors_open);
    assert_eq!(snap.pending_up, 1);
    assert_eq!(snap.pending_down, 1);
    Ok(())
}
