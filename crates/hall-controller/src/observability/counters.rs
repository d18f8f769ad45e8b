//! Live participant counters for an event in progress.
//!
//! Shared between every participant task (which updates values) and the
//! orchestrator (which reads snapshots for logging). All fields are atomic
//! for lock-free concurrent access. Each update also feeds the matching
//! Prometheus gauge or counter.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use super::metrics::{record_admission, record_participant_failure, set_participants_in_phase};

/// Counters describing where participants currently are.
#[derive(Debug, Default)]
pub struct EventMetrics {
    awaiting_gate: AtomicU32,
    in_session: AtomicU32,
    admitted: AtomicU32,
    departed: AtomicU32,
    over_capacity: AtomicU32,
    failed: AtomicU32,
}

/// Snapshot of event metrics at a point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EventMetricsSnapshot {
    /// Participants parked at the admission gate.
    pub awaiting_gate: u32,
    /// Participants admitted and waiting for the session to end.
    pub in_session: u32,
    /// Total admissions so far.
    pub admitted: u32,
    /// Participants that have left.
    pub departed: u32,
    /// Admissions that took a room over capacity.
    pub over_capacity: u32,
    /// Participants that ended cancelled, failed, or panicked.
    pub failed: u32,
}

impl EventMetrics {
    /// Create a new shared metrics instance.
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// A participant arrived at the gate.
    pub fn gate_waiter_arrived(&self) {
        let waiting = self.awaiting_gate.fetch_add(1, Ordering::SeqCst) + 1;
        set_participants_in_phase("awaiting_gate", waiting);
    }

    /// A participant left the gate, with or without a permit.
    pub fn gate_waiter_left(&self) {
        let waiting = self.awaiting_gate.fetch_sub(1, Ordering::SeqCst).saturating_sub(1);
        set_participants_in_phase("awaiting_gate", waiting);
    }

    /// A participant was admitted into its room.
    pub fn participant_admitted(&self, over_capacity: bool) {
        self.admitted.fetch_add(1, Ordering::SeqCst);
        if over_capacity {
            self.over_capacity.fetch_add(1, Ordering::SeqCst);
        }
        let in_session = self.in_session.fetch_add(1, Ordering::SeqCst) + 1;
        record_admission(over_capacity);
        set_participants_in_phase("in_session", in_session);
    }

    /// An admitted participant left the session normally.
    pub fn participant_departed(&self) {
        let in_session = self.in_session.fetch_sub(1, Ordering::SeqCst).saturating_sub(1);
        let departed = self.departed.fetch_add(1, Ordering::SeqCst) + 1;
        set_participants_in_phase("in_session", in_session);
        set_participants_in_phase("departed", departed);
    }

    /// A participant ended without departing. `was_admitted` releases its
    /// in-session slot.
    pub fn participant_failed(&self, reason: &'static str, was_admitted: bool) {
        self.failed.fetch_add(1, Ordering::SeqCst);
        if was_admitted {
            let in_session = self.in_session.fetch_sub(1, Ordering::SeqCst).saturating_sub(1);
            set_participants_in_phase("in_session", in_session);
        }
        record_participant_failure(reason);
    }

    /// Take a snapshot of current metrics.
    #[must_use]
    pub fn snapshot(&self) -> EventMetricsSnapshot {
        EventMetricsSnapshot {
            awaiting_gate: self.awaiting_gate.load(Ordering::SeqCst),
            in_session: self.in_session.load(Ordering::SeqCst),
            admitted: self.admitted.load(Ordering::SeqCst),
            departed: self.departed.load(Ordering::SeqCst),
            over_capacity: self.over_capacity.load(Ordering::SeqCst),
            failed: self.failed.load(Ordering::SeqCst),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_full_participant_lifecycle() {
        let metrics = EventMetrics::new();

        metrics.gate_waiter_arrived();
        metrics.gate_waiter_arrived();
        assert_eq!(metrics.snapshot().awaiting_gate, 2);

        metrics.gate_waiter_left();
        metrics.participant_admitted(false);
        metrics.gate_waiter_left();
        metrics.participant_admitted(true);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.awaiting_gate, 0);
        assert_eq!(snapshot.in_session, 2);
        assert_eq!(snapshot.admitted, 2);
        assert_eq!(snapshot.over_capacity, 1);

        metrics.participant_departed();
        metrics.participant_departed();

        assert_eq!(
            metrics.snapshot(),
            EventMetricsSnapshot {
                awaiting_gate: 0,
                in_session: 0,
                admitted: 2,
                departed: 2,
                over_capacity: 1,
                failed: 0,
            }
        );
    }

    #[test]
    fn test_failure_releases_session_slot_only_when_admitted() {
        let metrics = EventMetrics::new();

        metrics.participant_admitted(false);
        metrics.participant_failed("cancelled", true);
        metrics.participant_failed("cancelled", false);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.in_session, 0);
        assert_eq!(snapshot.failed, 2);
        assert_eq!(snapshot.departed, 0);
    }
}
