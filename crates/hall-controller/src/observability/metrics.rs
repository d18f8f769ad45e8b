//! Prometheus metric definitions.
//!
//! All metrics follow Prometheus naming conventions:
//! - `hc_` prefix for Hall Controller
//! - `_total` suffix for counters
//! - `_seconds` suffix for duration histograms

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::time::Duration;

/// Install the Prometheus recorder and return the handle used to render
/// the exposition text.
///
/// Must be called before any metrics are recorded.
///
/// # Errors
///
/// Returns error if the recorder fails to install (e.g., already installed).
pub fn init_metrics_recorder() -> Result<PrometheusHandle, String> {
    PrometheusBuilder::new()
        // Warm-up and session phases run from milliseconds to minutes
        .set_buckets_for_metric(
            Matcher::Prefix("hc_phase".to_string()),
            &[0.010, 0.050, 0.100, 0.500, 1.000, 2.500, 5.000, 10.000, 30.000, 60.000],
        )
        .map_err(|e| format!("Failed to set phase duration buckets: {e}"))?
        .install_recorder()
        .map_err(|e| format!("Failed to install Prometheus metrics recorder: {e}"))
}

/// Record one admission.
///
/// Metric: `hc_admissions_total`
/// Labels: `outcome` (`within_capacity`, `over_capacity`)
pub fn record_admission(over_capacity: bool) {
    let outcome = if over_capacity {
        "over_capacity"
    } else {
        "within_capacity"
    };
    counter!("hc_admissions_total", "outcome" => outcome).increment(1);
}

/// Set how many participants are currently in `phase`.
///
/// Metric: `hc_participants`
/// Labels: `phase` (`awaiting_gate`, `in_session`, `departed`)
pub fn set_participants_in_phase(phase: &'static str, count: u32) {
    gauge!("hc_participants", "phase" => phase).set(f64::from(count));
}

/// Record a participant that ended without departing normally.
///
/// Metric: `hc_participant_failures_total`
/// Labels: `reason` (`cancelled`, `error`, `panic`)
pub fn record_participant_failure(reason: &'static str) {
    counter!("hc_participant_failures_total", "reason" => reason).increment(1);
}

/// Record how long an orchestrator phase actually lasted.
///
/// Metric: `hc_phase_duration_seconds`
/// Labels: `phase` (`warmup`, `session`, `drain`)
pub fn record_phase_duration(phase: &'static str, duration: Duration) {
    histogram!("hc_phase_duration_seconds", "phase" => phase).record(duration.as_secs_f64());
}
