//! Pre-configured test data fixtures for Hall Controller testing.
//!
//! Provides builders and test data for:
//! - Event configurations with test-friendly timings
//! - Assignment sources, including misconfigured ones

use common::config::ObservabilityConfig;
use common::types::RoomId;
use hall_controller::assignment::{Assignment, AssignmentSource, BlockAssignment};
use hall_controller::config::Config;
use hall_controller::errors::HcError;
use std::time::Duration;

/// Warm-up used by test events unless overridden.
pub const TEST_WARMUP: Duration = Duration::from_millis(100);

/// Session duration used by test events unless overridden.
pub const TEST_SESSION: Duration = Duration::from_millis(500);

/// Test event fixture.
#[derive(Debug, Clone)]
pub struct TestEvent {
    /// Number of participants.
    pub participants: u32,
    /// Seats per room.
    pub capacity: u32,
    /// Delay before the gate opens.
    pub warmup: Duration,
    /// Session hold time.
    pub session: Duration,
    /// Maximum arrival delay per participant.
    pub jitter: Duration,
}

impl TestEvent {
    /// Create a test event with short timings and no jitter.
    #[must_use]
    pub fn new(participants: u32, capacity: u32) -> Self {
        Self {
            participants,
            capacity,
            warmup: TEST_WARMUP,
            session: TEST_SESSION,
            jitter: Duration::ZERO,
        }
    }

    /// Set the warm-up delay.
    #[must_use]
    pub fn with_warmup(mut self, warmup: Duration) -> Self {
        self.warmup = warmup;
        self
    }

    /// Set the session duration.
    #[must_use]
    pub fn with_session(mut self, session: Duration) -> Self {
        self.session = session;
        self
    }

    /// Set the maximum arrival jitter.
    #[must_use]
    pub fn with_jitter(mut self, jitter: Duration) -> Self {
        self.jitter = jitter;
        self
    }

    /// Build the event configuration.
    ///
    /// Fields are set directly so tests can also build configurations that
    /// fail validation.
    #[must_use]
    pub fn build(&self) -> Config {
        Config {
            participant_count: self.participants,
            room_capacity: self.capacity,
            warmup_delay: self.warmup,
            session_duration: self.session,
            arrival_jitter: self.jitter,
            observability: ObservabilityConfig::default(),
        }
    }
}

/// Assignment source that ignores capacity and packs participants into
/// blocks of a fixed size.
#[must_use]
pub fn misconfigured_assignment(block_size: u32) -> BlockAssignment {
    BlockAssignment::with_block_size(block_size)
}

/// Assignment source that returns a fixed, pre-computed mapping, as if it
/// had been delivered from another process.
#[derive(Debug, Clone)]
pub struct FixedAssignment {
    rooms: Vec<RoomId>,
}

impl FixedAssignment {
    /// `rooms[i]` is the room of participant `i`.
    #[must_use]
    pub fn new(rooms: Vec<RoomId>) -> Self {
        Self { rooms }
    }

    /// Put every participant in the same room.
    #[must_use]
    pub fn single_room(participants: u32, room: RoomId) -> Self {
        Self::new(vec![room; participants as usize])
    }
}

impl AssignmentSource for FixedAssignment {
    fn assign(&self, _participants: u32, _capacity: u32) -> Result<Assignment, HcError> {
        Ok(Assignment::from_rooms(self.rooms.clone()))
    }
}
