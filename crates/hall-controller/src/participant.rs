//! Participant task: one per participant.
//!
//! ```text
//! Created ──► AwaitingGate ──► Admitting ──► InSession ──► AwaitingEnd ──► Departed
//!                  │                │                           │
//!                  └── Cancelled ◄──┼───────────────────────────┘
//!                                   └──► Failed
//! ```
//!
//! The only suspension points are the gate and the session barrier. Every
//! transition is stamped with a logical-clock tick so tests can check phase
//! ordering against the orchestrator's open and end ticks.
//!
//! Errors inside the task body never escape it: they end the task in
//! `Failed` or `Cancelled` and are returned in the [`ParticipantReport`].

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::assignment::Participant;
use crate::errors::HcError;
use crate::observability::EventMetrics;
use crate::registry::{Admission, RoomRegistry};
use crate::sync::{AdmissionGate, LogicalClock, SessionBarrier, Tick};

/// Participant lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParticipantState {
    Created,
    AwaitingGate,
    Admitting,
    InSession,
    AwaitingEnd,
    Departed,
    /// Ended early because the event was cancelled.
    Cancelled,
    /// Ended early on an error.
    Failed,
}

impl ParticipantState {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            ParticipantState::Created => "created",
            ParticipantState::AwaitingGate => "awaiting_gate",
            ParticipantState::Admitting => "admitting",
            ParticipantState::InSession => "in_session",
            ParticipantState::AwaitingEnd => "awaiting_end",
            ParticipantState::Departed => "departed",
            ParticipantState::Cancelled => "cancelled",
            ParticipantState::Failed => "failed",
        }
    }

    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(
            self,
            ParticipantState::Departed | ParticipantState::Cancelled | ParticipantState::Failed
        )
    }

    /// Whether `next` is a legal successor of this state.
    #[must_use]
    pub const fn can_transition_to(&self, next: ParticipantState) -> bool {
        use ParticipantState::{
            Admitting, AwaitingEnd, AwaitingGate, Cancelled, Created, Departed, Failed, InSession,
        };
        match (self, next) {
            (Created, AwaitingGate | Cancelled)
            | (AwaitingGate, Admitting | Cancelled | Failed)
            | (Admitting, InSession | Failed)
            | (InSession, AwaitingEnd)
            | (AwaitingEnd, Departed | Cancelled | Failed) => true,
            _ => false,
        }
    }
}

/// A state entered at a logical time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub state: ParticipantState,
    pub at: Tick,
}

/// How a participant task ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParticipantOutcome {
    Departed,
    Cancelled,
    Failed(String),
}

/// Everything a participant task did, returned when it terminates.
#[derive(Debug, Clone)]
pub struct ParticipantReport {
    pub participant: Participant,
    pub trace: Vec<Transition>,
    pub admission: Option<Admission>,
    pub outcome: ParticipantOutcome,
}

impl ParticipantReport {
    /// Report for a task that panicked and returned nothing.
    #[must_use]
    pub fn panicked(participant: Participant) -> Self {
        Self {
            participant,
            trace: Vec::new(),
            admission: None,
            outcome: ParticipantOutcome::Failed(
                HcError::ParticipantPanicked(participant.id).to_string(),
            ),
        }
    }

    /// Last state the task reached.
    #[must_use]
    pub fn final_state(&self) -> Option<ParticipantState> {
        self.trace.last().map(|t| t.state)
    }

    /// Tick at which the task entered `state`, if it did.
    #[must_use]
    pub fn entered(&self, state: ParticipantState) -> Option<Tick> {
        self.trace.iter().find(|t| t.state == state).map(|t| t.at)
    }

    #[must_use]
    pub fn departed(&self) -> bool {
        self.outcome == ParticipantOutcome::Departed
    }
}

/// State shared by the orchestrator and every participant task.
#[derive(Debug)]
pub struct EventContext {
    pub gate: AdmissionGate,
    pub barrier: SessionBarrier,
    pub registry: RoomRegistry,
    pub clock: LogicalClock,
    pub metrics: Arc<EventMetrics>,
    pub cancel: CancellationToken,
}

impl EventContext {
    /// Fresh gate, barrier, and clock around `registry`.
    #[must_use]
    pub fn new(
        registry: RoomRegistry,
        metrics: Arc<EventMetrics>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            gate: AdmissionGate::new(),
            barrier: SessionBarrier::new(),
            registry,
            clock: LogicalClock::new(),
            metrics,
            cancel,
        }
    }
}

/// A single participant's run through the event.
pub struct ParticipantTask {
    participant: Participant,
    ctx: Arc<EventContext>,
    arrival_delay: Duration,
    state: ParticipantState,
    trace: Vec<Transition>,
    admission: Option<Admission>,
}

impl ParticipantTask {
    /// Create a task in the `Created` state.
    ///
    /// `arrival_delay` is how long the participant takes to reach the gate.
    #[must_use]
    pub fn new(participant: Participant, ctx: Arc<EventContext>, arrival_delay: Duration) -> Self {
        let created = Transition {
            state: ParticipantState::Created,
            at: ctx.clock.tick(),
        };
        Self {
            participant,
            ctx,
            arrival_delay,
            state: ParticipantState::Created,
            trace: vec![created],
            admission: None,
        }
    }

    /// Run the task to a terminal state.
    #[instrument(
        skip_all,
        name = "hc.participant",
        fields(participant = %self.participant.id, room = %self.participant.assigned_room)
    )]
    pub async fn run(mut self) -> ParticipantReport {
        let outcome = match self.attend().await {
            Ok(()) => ParticipantOutcome::Departed,
            Err(HcError::Cancelled) => {
                self.transition(ParticipantState::Cancelled);
                self.ctx
                    .metrics
                    .participant_failed("cancelled", self.admission.is_some());
                debug!(target: "hc.participant", "Participant cancelled");
                ParticipantOutcome::Cancelled
            }
            Err(e) => {
                self.transition(ParticipantState::Failed);
                self.ctx
                    .metrics
                    .participant_failed("error", self.admission.is_some());
                warn!(target: "hc.participant", error = %e, "Participant failed");
                ParticipantOutcome::Failed(e.to_string())
            }
        };

        ParticipantReport {
            participant: self.participant,
            trace: self.trace,
            admission: self.admission,
            outcome,
        }
    }

    async fn attend(&mut self) -> Result<(), HcError> {
        let cancel = self.ctx.cancel.clone();

        if !self.arrival_delay.is_zero() {
            tokio::select! {
                biased;
                () = cancel.cancelled() => return Err(HcError::Cancelled),
                () = tokio::time::sleep(self.arrival_delay) => {}
            }
        }

        self.transition(ParticipantState::AwaitingGate);
        self.ctx.metrics.gate_waiter_arrived();
        let pass = self.ctx.gate.await_open(&cancel).await;
        self.ctx.metrics.gate_waiter_left();
        let pass = pass?;

        self.transition(ParticipantState::Admitting);
        let admission = self
            .ctx
            .registry
            .admit(self.participant.assigned_room, self.participant.id)?;
        self.admission = Some(admission);
        self.ctx.metrics.participant_admitted(admission.over_capacity);

        info!(
            target: "hc.participant",
            participant = %admission.participant,
            room = %admission.room,
            count = admission.count,
            gate_order = pass.order,
            "Participant entered room"
        );
        if admission.over_capacity {
            warn!(
                target: "hc.participant",
                room = %admission.room,
                count = admission.count,
                capacity = admission.capacity,
                over_by = admission.over_by(),
                "Room over capacity"
            );
        }

        self.transition(ParticipantState::InSession);
        self.transition(ParticipantState::AwaitingEnd);
        self.ctx.barrier.await_end(&cancel).await?;

        self.transition(ParticipantState::Departed);
        self.ctx.metrics.participant_departed();
        info!(
            target: "hc.participant",
            participant = %admission.participant,
            room = %admission.room,
            "Participant left room"
        );

        Ok(())
    }

    fn transition(&mut self, next: ParticipantState) {
        let legal = check_transition(self.state, next);
        debug_assert!(legal, "illegal transition {:?} -> {:?}", self.state, next);
        self.state = next;
        self.trace.push(Transition {
            state: next,
            at: self.ctx.clock.tick(),
        });
    }
}

/// Whether `from -> to` is in the transition table. Illegal transitions are
/// logged; the caller still records them.
fn check_transition(from: ParticipantState, to: ParticipantState) -> bool {
    let legal = from.can_transition_to(to);
    if !legal {
        warn!(
            target: "hc.participant",
            from = from.as_str(),
            to = to.as_str(),
            "Illegal participant state transition"
        );
    }
    legal
}
