//! Orchestrator: drives the event timeline.
//!
//! 1. Obtain and validate the participant to room mapping
//! 2. Spawn one task per participant (all park at the gate)
//! 3. Wait the warm-up delay, then open the gate with N permits
//! 4. Hold for the session duration, then signal the session end
//! 5. Join every task, then read final counts for the summary
//!
//! Final counts are only read after step 5, once no task can still write.
//!
//! # Cancellation
//!
//! If the cancellation token fires during warm-up or the session hold, the
//! timeline stops where it is. Waiting tasks end as `Cancelled`, every task
//! is still joined, and the report is marked cancelled.

use common::types::{ParticipantId, RoomId};
use rand::Rng;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument, warn};

use crate::assignment::{Assignment, AssignmentSource, BlockAssignment, Participant};
use crate::config::Config;
use crate::errors::HcError;
use crate::observability::{record_phase_duration, EventMetrics, EventMetricsSnapshot};
use crate::participant::{EventContext, ParticipantReport, ParticipantTask};
use crate::registry::RoomRegistry;
use crate::summary::EventSummary;
use crate::sync::Tick;

/// Everything observed during one event.
#[derive(Debug, Clone)]
pub struct EventReport {
    pub summary: EventSummary,
    pub assignment: Assignment,
    /// One report per participant, in participant id order.
    pub participants: Vec<ParticipantReport>,
    /// Every admission recorded by the registry, grouped by room.
    pub ledger: Vec<(ParticipantId, RoomId)>,
    /// Tick taken immediately before the gate opened.
    pub opened_at: Option<Tick>,
    /// Tick taken immediately before the session end was signalled.
    pub ended_at: Option<Tick>,
    pub metrics: EventMetricsSnapshot,
}

/// Where the timeline got to.
#[derive(Debug, Clone, Copy, Default)]
struct Timeline {
    opened_at: Option<Tick>,
    ended_at: Option<Tick>,
    cancelled: bool,
}

/// Owns the event configuration and assignment source.
///
/// Each call to [`Orchestrator::run`] is an independent event with its own
/// registry, gate, barrier and metrics.
pub struct Orchestrator {
    config: Config,
    source: Box<dyn AssignmentSource>,
}

impl Orchestrator {
    /// Orchestrator using contiguous block assignment.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self::with_assignment(config, BlockAssignment::new())
    }

    /// Orchestrator using a custom assignment source.
    #[must_use]
    pub fn with_assignment(config: Config, source: impl AssignmentSource + 'static) -> Self {
        Self {
            config,
            source: Box::new(source),
        }
    }

    /// Run the event to completion.
    ///
    /// # Errors
    ///
    /// - `Config` if the configuration or the assignment is invalid; raised
    ///   before any task is spawned
    /// - `Misuse` if a gate or barrier contract is violated; remaining tasks
    ///   are cancelled and joined first
    /// - `Internal` if the registry cannot be read
    ///
    /// Per-participant failures are not errors; they appear in the report.
    #[instrument(
        skip_all,
        name = "hc.orchestrator",
        fields(
            participants = self.config.participant_count,
            capacity = self.config.room_capacity
        )
    )]
    pub async fn run(&self, cancel: CancellationToken) -> Result<EventReport, HcError> {
        self.config.validate()?;
        let population = self.config.participant_count;
        let capacity = self.config.room_capacity;
        let room_count = self.config.room_count();

        let assignment = self.source.assign(population, capacity)?;
        assignment.validate(population, room_count)?;

        let ctx = Arc::new(EventContext::new(
            RoomRegistry::new(room_count, capacity, population),
            EventMetrics::new(),
            cancel.child_token(),
        ));

        let handles = self.spawn_participants(&assignment, &ctx);
        info!(
            target: "hc.orchestrator",
            participants = population,
            rooms = room_count,
            warmup_ms = self.config.warmup_delay.as_millis(),
            "Participants spawned, holding at gate"
        );

        let timeline = match self.drive_timeline(&ctx, population).await {
            Ok(timeline) => timeline,
            Err(e) => {
                error!(target: "hc.orchestrator", error = %e, "Event aborted");
                ctx.cancel.cancel();
                join_participants(handles, &ctx.metrics).await;
                return Err(e);
            }
        };

        let drain_started = Instant::now();
        let participants = join_participants(handles, &ctx.metrics).await;
        record_phase_duration("drain", drain_started.elapsed());

        let failures = u32::try_from(participants.iter().filter(|r| !r.departed()).count())
            .unwrap_or(u32::MAX);
        let summary =
            EventSummary::from_registry(&ctx.registry, population, failures, timeline.cancelled)?;

        let mut ledger = Vec::with_capacity(population as usize);
        for room in ctx.registry.rooms() {
            ledger.extend(
                ctx.registry
                    .admitted(room.id)?
                    .into_iter()
                    .map(|participant| (participant, room.id)),
            );
        }

        for room in summary.over_capacity_rooms() {
            warn!(
                target: "hc.orchestrator",
                room = %room.room,
                count = room.count,
                capacity = room.capacity,
                over_by = room.over_by(),
                "Room ended over capacity"
            );
        }
        info!(
            target: "hc.orchestrator",
            attended = summary.total_attended,
            population,
            failures,
            cancelled = timeline.cancelled,
            "Event complete"
        );

        Ok(EventReport {
            summary,
            assignment,
            participants,
            ledger,
            opened_at: timeline.opened_at,
            ended_at: timeline.ended_at,
            metrics: ctx.metrics.snapshot(),
        })
    }

    fn spawn_participants(
        &self,
        assignment: &Assignment,
        ctx: &Arc<EventContext>,
    ) -> Vec<(Participant, JoinHandle<ParticipantReport>)> {
        let jitter_us = u64::try_from(self.config.arrival_jitter.as_micros()).unwrap_or(u64::MAX);
        let mut rng = rand::thread_rng();

        assignment
            .participants()
            .map(|participant| {
                let arrival_delay = if jitter_us == 0 {
                    Duration::ZERO
                } else {
                    Duration::from_micros(rng.gen_range(0..=jitter_us))
                };
                let task = ParticipantTask::new(participant, Arc::clone(ctx), arrival_delay);
                (participant, tokio::spawn(task.run()))
            })
            .collect()
    }

    async fn drive_timeline(
        &self,
        ctx: &EventContext,
        population: u32,
    ) -> Result<Timeline, HcError> {
        let mut timeline = Timeline::default();

        let warmup_started = Instant::now();
        if !sleep_unless_cancelled(self.config.warmup_delay, &ctx.cancel).await {
            warn!(target: "hc.orchestrator", "Event cancelled during warm-up, gate never opened");
            timeline.cancelled = true;
            return Ok(timeline);
        }
        record_phase_duration("warmup", warmup_started.elapsed());

        let opened_at = ctx.clock.tick();
        ctx.gate.open(population)?;
        timeline.opened_at = Some(opened_at);
        info!(
            target: "hc.orchestrator",
            tick = %opened_at,
            waiting = ctx.metrics.snapshot().awaiting_gate,
            session_ms = self.config.session_duration.as_millis(),
            "Event started"
        );

        let session_started = Instant::now();
        if !sleep_unless_cancelled(self.config.session_duration, &ctx.cancel).await {
            warn!(target: "hc.orchestrator", "Event cancelled during session");
            timeline.cancelled = true;
            return Ok(timeline);
        }
        record_phase_duration("session", session_started.elapsed());

        let ended_at = ctx.clock.tick();
        ctx.barrier.signal_end()?;
        timeline.ended_at = Some(ended_at);
        info!(
            target: "hc.orchestrator",
            tick = %ended_at,
            in_session = ctx.metrics.snapshot().in_session,
            "Event ended"
        );

        Ok(timeline)
    }
}

/// Sleep for `duration`; returns false if `cancel` fired first.
async fn sleep_unless_cancelled(duration: Duration, cancel: &CancellationToken) -> bool {
    tokio::select! {
        biased;
        () = cancel.cancelled() => false,
        () = tokio::time::sleep(duration) => true,
    }
}

/// Join every participant task in id order.
///
/// A panicked task is recorded as failed; it never aborts the join.
async fn join_participants(
    handles: Vec<(Participant, JoinHandle<ParticipantReport>)>,
    metrics: &EventMetrics,
) -> Vec<ParticipantReport> {
    let mut reports = Vec::with_capacity(handles.len());
    for (participant, handle) in handles {
        match handle.await {
            Ok(report) => reports.push(report),
            Err(e) => {
                error!(
                    target: "hc.orchestrator",
                    participant = %participant.id,
                    error = %e,
                    "Participant task panicked"
                );
                metrics.participant_failed("panic", false);
                reports.push(ParticipantReport::panicked(participant));
            }
        }
    }
    reports
}
