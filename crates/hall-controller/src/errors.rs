//! Hall Controller error types.
//!
//! Capacity overruns are deliberately absent here: a room going over capacity
//! is reported on the [`Admission`](crate::registry::Admission) and in the
//! summary, and never fails an admission.

use common::types::{ParticipantId, RoomId};
use thiserror::Error;

use crate::config::ConfigError;

/// Hall Controller error type.
#[derive(Debug, Error)]
pub enum HcError {
    /// Invalid startup parameters or an inconsistent room assignment.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A participant was routed to a room the registry does not hold.
    #[error("Unknown room: {0}")]
    UnknownRoom(RoomId),

    /// A gate, barrier, or registry contract was violated.
    #[error("Synchronization misuse: {0}")]
    Misuse(#[from] SyncMisuse),

    /// The event was cancelled while the caller was waiting.
    #[error("Cancelled")]
    Cancelled,

    /// A participant task panicked instead of returning a report.
    #[error("Participant {0} panicked")]
    ParticipantPanicked(ParticipantId),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Violations of the one-shot synchronization contracts.
///
/// Each of these corrupts an invariant the rest of the event depends on,
/// so they are surfaced to the caller rather than tolerated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyncMisuse {
    /// `AdmissionGate::open` called more than once.
    #[error("gate opened more than once")]
    GateReopened,

    /// More permits were granted than the gate was opened with.
    #[error("gate granted {granted} permits but was opened with {limit}")]
    PermitOverdraw { granted: u32, limit: u32 },

    /// `SessionBarrier::signal_end` called more than once.
    #[error("session end signalled more than once")]
    SessionReended,

    /// A participant tried to admit a second time.
    #[error("participant {participant} already admitted to room {room}")]
    DuplicateAdmission {
        participant: ParticipantId,
        room: RoomId,
    },
}

impl HcError {
    /// Whether this error must abort the event rather than being recorded
    /// against a single participant.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        match self {
            HcError::Config(_) | HcError::Internal(_) => true,
            HcError::Misuse(misuse) => !matches!(misuse, SyncMisuse::DuplicateAdmission { .. }),
            HcError::UnknownRoom(_) | HcError::Cancelled | HcError::ParticipantPanicked(_) => {
                false
            }
        }
    }
}

impl From<ConfigError> for HcError {
    fn from(err: ConfigError) -> Self {
        HcError::Config(err.to_string())
    }
}
