//! Common configuration types for Hall Controller components.

use serde::{Deserialize, Serialize};

/// Default tracing filter directive when `RUST_LOG` is unset.
pub const DEFAULT_LOG_LEVEL: &str = "hall_controller=info";

/// Observability configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ObservabilityConfig {
    /// Tracing filter directive (e.g. "`hall_controller=debug`")
    pub log_level: String,
    /// Enable JSON-formatted logs
    pub json_logs: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            json_logs: false,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_human_readable_info() {
        let config = ObservabilityConfig::default();
        assert_eq!(config.log_level, DEFAULT_LOG_LEVEL);
        assert!(!config.json_logs);
    }

    #[test]
    fn test_deserializes_from_json() {
        let config: ObservabilityConfig =
            serde_json::from_str(r#"{"log_level":"debug","json_logs":true}"#).unwrap();
        assert_eq!(config.log_level, "debug");
        assert!(config.json_logs);
    }
}
