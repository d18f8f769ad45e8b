//! Concurrency stress tests.
//!
//! Runs large events on a multi-threaded runtime with real time and random
//! arrival jitter, so admissions into the same room genuinely race.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::time::Duration;

use hall_controller::orchestrator::Orchestrator;
use hall_controller::participant::ParticipantState;
use hc_test_utils::{assert_event_invariants, misconfigured_assignment, TestEvent};
use tokio_util::sync::CancellationToken;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_ten_thousand_participants_with_jitter() {
    // Jitter spans warm-up and session, so arrivals land before the gate
    // opens, during the session, and after it ended.
    let config = TestEvent::new(10_000, 50)
        .with_warmup(Duration::from_millis(100))
        .with_session(Duration::from_millis(200))
        .with_jitter(Duration::from_millis(500))
        .build();

    let report = Orchestrator::new(config)
        .run(CancellationToken::new())
        .await
        .unwrap();

    assert_event_invariants(&report);
    assert_eq!(report.summary.rooms.len(), 200);
    assert!(report.summary.rooms.iter().all(|r| r.count == 50));
    assert_eq!(report.metrics.departed, 10_000);

    let opened_at = report.opened_at.unwrap();
    let ended_at = report.ended_at.unwrap();
    let arrivals: Vec<_> = report
        .participants
        .iter()
        .filter_map(|p| p.entered(ParticipantState::AwaitingGate))
        .collect();
    assert!(arrivals.iter().any(|&t| t < opened_at));
    assert!(arrivals.iter().any(|&t| t > opened_at && t < ended_at));
    assert!(arrivals.iter().any(|&t| t > ended_at));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_contended_over_capacity_room() {
    // All 2_000 participants race into room 0 of 40 rooms.
    let config = TestEvent::new(2_000, 50)
        .with_warmup(Duration::from_millis(100))
        .with_session(Duration::from_millis(200))
        .with_jitter(Duration::from_millis(50))
        .build();

    let report = Orchestrator::with_assignment(config, misconfigured_assignment(2_000))
        .run(CancellationToken::new())
        .await
        .unwrap();

    assert_event_invariants(&report);
    let room = report.summary.rooms.first().unwrap();
    assert_eq!(room.count, 2_000);
    assert_eq!(room.over_by(), 1_950);
    assert_eq!(report.metrics.over_capacity, 1_950);
}
