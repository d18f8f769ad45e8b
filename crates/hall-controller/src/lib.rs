//! Hall Controller Library
//!
//! Runs a timed, capacity-bounded admission event: a fixed population of
//! participants is split into fixed-capacity rooms, held at a gate until the
//! event starts, seated for the session, and released together when the
//! session ends.
//!
//! # Architecture
//!
//! ```text
//! Orchestrator (one per event)
//! ├── owns EventContext
//! │   ├── AdmissionGate   (counting release, opened once with N permits)
//! │   ├── SessionBarrier  (persisted one-shot broadcast)
//! │   ├── RoomRegistry    (per-room attendance counters)
//! │   └── LogicalClock    (orders phase transitions)
//! └── spawns N ParticipantTasks
//!     └── gate ─► admit ─► barrier ─► depart
//! ```
//!
//! # Key Design Decisions
//!
//! - **Permissive capacity**: admission never blocks or rejects on a full
//!   room; overruns are flagged on the admission and in the summary
//! - **Per-room exclusion**: each room's counter has its own lock
//! - **Join before read**: the summary is built only after every task joined
//! - **Isolated failures**: a failing participant is recorded, never
//!   propagated to its siblings
//!
//! # Modules
//!
//! - [`assignment`] - Participant to room mapping
//! - [`config`] - Configuration from environment
//! - [`errors`] - Error types
//! - [`observability`] - Live counters and Prometheus metrics
//! - [`orchestrator`] - Event timeline
//! - [`participant`] - Participant task state machine
//! - [`registry`] - Room attendance counters
//! - [`summary`] - End-of-event summary
//! - [`sync`] - Gate, barrier, and logical clock

pub mod assignment;
pub mod config;
pub mod errors;
pub mod observability;
pub mod orchestrator;
pub mod participant;
pub mod registry;
pub mod summary;
pub mod sync;
