//! Invariant checks over a completed event.
//!
//! Each helper panics with a descriptive message when its invariant does
//! not hold.

use common::types::{ParticipantId, RoomId};
use hall_controller::orchestrator::EventReport;
use hall_controller::participant::ParticipantState;

/// Every participant was counted exactly once.
pub fn assert_conserved(report: &EventReport) {
    let summary = &report.summary;
    assert_eq!(
        summary.total_attended, summary.population,
        "sum of final counts must equal the population"
    );
    let per_room: u32 = summary.rooms.iter().map(|r| r.count).sum();
    assert_eq!(per_room, summary.total_attended);
}

/// The registry ledger holds each (participant, room) pair of the
/// assignment exactly once.
pub fn assert_ledger_matches_assignment(report: &EventReport) {
    let mut ledger: Vec<(ParticipantId, RoomId)> = report.ledger.clone();
    ledger.sort_unstable();

    let expected: Vec<(ParticipantId, RoomId)> = report
        .assignment
        .participants()
        .map(|p| (p.id, p.assigned_room))
        .collect();

    assert_eq!(
        ledger.len(),
        expected.len(),
        "ledger must have one entry per participant"
    );
    assert_eq!(ledger, expected, "ledger must match the assignment exactly");
}

/// A room is reported over capacity if and only if its count exceeds it,
/// and the per-admission flags agree with the final counts.
pub fn assert_over_capacity_consistent(report: &EventReport) {
    for room in &report.summary.rooms {
        assert_eq!(room.over_capacity(), room.count > room.capacity);

        let flagged = report
            .participants
            .iter()
            .filter_map(|p| p.admission)
            .filter(|a| a.room == room.room && a.over_capacity)
            .count();
        assert_eq!(
            flagged,
            room.over_by() as usize,
            "room {} should flag exactly the admissions past capacity",
            room.room
        );
    }
}

/// No admission happened before the gate opened and no departure before
/// the session end was signalled.
pub fn assert_phase_ordering(report: &EventReport) {
    for participant in &report.participants {
        let id = participant.participant.id;

        if let Some(admitted) = participant.entered(ParticipantState::Admitting) {
            let opened_at = report
                .opened_at
                .unwrap_or_else(|| unreachable!("participant {id} admitted but gate never opened"));
            assert!(
                admitted > opened_at,
                "participant {id} admitted at {admitted} before gate opened at {opened_at}"
            );
        }

        if let Some(departed) = participant.entered(ParticipantState::Departed) {
            let ended_at = report
                .ended_at
                .unwrap_or_else(|| unreachable!("participant {id} departed but session never ended"));
            assert!(
                departed > ended_at,
                "participant {id} departed at {departed} before session ended at {ended_at}"
            );
        }
    }
}

/// Every participant reached `Departed`.
pub fn assert_all_departed(report: &EventReport) {
    for participant in &report.participants {
        assert!(
            participant.departed(),
            "participant {} ended {:?}",
            participant.participant.id,
            participant.outcome
        );
        assert_eq!(participant.final_state(), Some(ParticipantState::Departed));
    }
}

/// All invariants of a fully completed event.
pub fn assert_event_invariants(report: &EventReport) {
    assert_all_departed(report);
    assert_conserved(report);
    assert_ledger_matches_assignment(report);
    assert_over_capacity_consistent(report);
    assert_phase_ordering(report);
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::fixtures::TestEvent;
    use hall_controller::orchestrator::Orchestrator;
    use tokio_util::sync::CancellationToken;

    #[tokio::test(start_paused = true)]
    async fn test_invariants_hold_for_small_event() {
        let report = Orchestrator::new(TestEvent::new(25, 10).build())
            .run(CancellationToken::new())
            .await
            .unwrap();

        assert_event_invariants(&report);
    }

    #[tokio::test(start_paused = true)]
    #[should_panic(expected = "sum of final counts must equal the population")]
    async fn test_conservation_detects_missing_attendance() {
        let mut report = Orchestrator::new(TestEvent::new(5, 5).build())
            .run(CancellationToken::new())
            .await
            .unwrap();

        report.summary.total_attended -= 1;
        assert_conserved(&report);
    }
}
