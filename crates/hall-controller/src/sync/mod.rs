//! Synchronization primitives for the two event phases.
//!
//! ```text
//! spawn ──► AdmissionGate::await_open ──► admit ──► SessionBarrier::await_end ──► depart
//!                     ▲                                       ▲
//!          orchestrator: open(N)                 orchestrator: signal_end()
//! ```
//!
//! # Modules
//!
//! - [`gate`] - counting release of exactly N admissions
//! - [`barrier`] - persisted one-shot broadcast for session end
//! - [`clock`] - logical clock used to order phase transitions

pub mod barrier;
pub mod clock;
pub mod gate;

pub use barrier::SessionBarrier;
pub use clock::{LogicalClock, Tick};
pub use gate::{AdmissionGate, GatePass};
