//! Observability for the Hall Controller.
//!
//! # Metrics
//!
//! | Metric | Type | Labels | Purpose |
//! |--------|------|--------|---------|
//! | `hc_admissions_total` | Counter | `outcome` | Admissions, split by capacity outcome |
//! | `hc_participants` | Gauge | `phase` | Participants currently waiting at the gate or in session |
//! | `hc_participant_failures_total` | Counter | `reason` | Participants that ended without departing |
//! | `hc_phase_duration_seconds` | Histogram | `phase` | Measured warm-up and session durations |
//!
//! Labels are bounded: `outcome` has 2 values, `phase` and `reason` 3 each.

pub mod counters;
pub mod metrics;

pub use counters::{EventMetrics, EventMetricsSnapshot};
pub use metrics::{
    init_metrics_recorder, record_admission, record_participant_failure, record_phase_duration,
    set_participants_in_phase,
};
