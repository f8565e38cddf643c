/*!
 * Gate Configuration
 *
 * Per-instance settings for a reader-writer gate
 */

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Gate configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GateConfig {
    /// Name attached to every log event, for telling gates apart
    pub name: String,
    /// Maintain admission counters (see [`super::GateStats`])
    pub track_stats: bool,
    /// Critical sections held longer than this are logged at warn level
    #[serde(with = "crate::core::serde::duration_millis")]
    pub slow_hold_threshold: Duration,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            name: "gate".to_string(),
            track_stats: true,
            slow_hold_threshold: Duration::from_secs(1),
        }
    }
}

impl GateConfig {
    /// Default configuration under a specific name
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Configuration for hot paths: no counters
    pub fn lean() -> Self {
        Self {
            track_stats: false,
            ..Self::default()
        }
    }

    pub fn with_slow_hold_threshold(mut self, threshold: Duration) -> Self {
        self.slow_hold_threshold = threshold;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_named_keeps_defaults() {
        let config = GateConfig::named("documents");
        assert_eq!(config.name, "documents");
        assert!(config.track_stats);
        assert_eq!(config.slow_hold_threshold, Duration::from_secs(1));
    }

    #[test]
    fn test_deserialize_partial() {
        let config: GateConfig =
            serde_json::from_str(r#"{"name":"cache","slow_hold_threshold":250}"#).unwrap();
        assert_eq!(config.name, "cache");
        assert!(config.track_stats);
        assert_eq!(config.slow_hold_threshold, Duration::from_millis(250));
    }
}
