//! # HC Test Utilities
//!
//! Shared test utilities for the Hall Controller.
//!
//! ## Modules
//!
//! - `fixtures` - Event configurations and assignment sources (including
//!   deliberately misconfigured ones)
//! - `assertions` - Invariant checks over an `EventReport`
//!
//! ## Usage
//!
//! ```rust,ignore
//! use hc_test_utils::*;
//!
//! #[tokio::test(start_paused = true)]
//! async fn test_example() {
//!     let config = TestEvent::new(300, 30).build();
//!     let report = Orchestrator::new(config)
//!         .run(CancellationToken::new())
//!         .await
//!         .unwrap();
//!
//!     assert_event_invariants(&report);
//! }
//! ```

pub mod assertions;
pub mod fixtures;

// Re-export commonly used items
pub use assertions::*;
pub use fixtures::*;
