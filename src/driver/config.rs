/*!
 * Driver Configuration
 *
 * Worker counts and pacing for the demo driver, loaded from the environment.
 */

use crate::core::errors::{DriverError, DriverResult};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;

/// Demo driver configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverConfig {
    /// Number of reader workers (default: 5)
    pub readers: usize,

    /// Number of writer workers (default: 3)
    pub writers: usize,

    /// Shortest simulated read/write (default: 100ms)
    #[serde(with = "crate::core::serde::duration_millis")]
    pub work_min: Duration,

    /// Longest simulated read/write (default: 500ms)
    #[serde(with = "crate::core::serde::duration_millis")]
    pub work_max: Duration,

    /// Shortest pause between cycles (default: 100ms)
    #[serde(with = "crate::core::serde::duration_millis")]
    pub pause_min: Duration,

    /// Longest pause between cycles (default: 500ms)
    #[serde(with = "crate::core::serde::duration_millis")]
    pub pause_max: Duration,

    /// Stop after this long; `None` runs until Ctrl-C
    #[serde(
        with = "crate::core::serde::optional_duration_millis",
        skip_serializing_if = "crate::core::serde::is_none"
    )]
    pub run_for: Option<Duration>,

    /// Writers waiting longer than this are reported as starving (default: 2s)
    #[serde(with = "crate::core::serde::duration_millis")]
    pub starvation_warn: Duration,

    /// Seed for the pacing RNG; `None` seeds from entropy
    #[serde(skip_serializing_if = "crate::core::serde::is_none")]
    pub seed: Option<u64>,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            readers: 5,
            writers: 3,
            work_min: Duration::from_millis(100),
            work_max: Duration::from_millis(500),
            pause_min: Duration::from_millis(100),
            pause_max: Duration::from_millis(500),
            run_for: None,
            starvation_warn: Duration::from_secs(2),
            seed: None,
        }
    }
}

impl DriverConfig {
    /// Fast pacing for tests and benchmarks
    pub fn quick() -> Self {
        Self {
            work_min: Duration::from_millis(1),
            work_max: Duration::from_millis(5),
            pause_min: Duration::from_millis(1),
            pause_max: Duration::from_millis(5),
            run_for: Some(Duration::from_millis(300)),
            starvation_warn: Duration::from_millis(500),
            ..Self::default()
        }
    }

    /// Load configuration from environment variables over the defaults
    ///
    /// - RWGATE_READERS, RWGATE_WRITERS: worker counts
    /// - RWGATE_WORK_MIN_MS, RWGATE_WORK_MAX_MS: simulated work range
    /// - RWGATE_PAUSE_MIN_MS, RWGATE_PAUSE_MAX_MS: pause range
    /// - RWGATE_RUN_SECS: stop after this many seconds
    /// - RWGATE_STARVATION_WARN_MS: starvation report threshold
    /// - RWGATE_SEED: RNG seed
    pub fn from_env() -> DriverResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with a custom variable source
    pub fn from_lookup<F>(lookup: F) -> DriverResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(v) = parse_var::<usize, _>(&lookup, "RWGATE_READERS")? {
            config.readers = v;
        }
        if let Some(v) = parse_var::<usize, _>(&lookup, "RWGATE_WRITERS")? {
            config.writers = v;
        }
        if let Some(v) = parse_var::<u64, _>(&lookup, "RWGATE_WORK_MIN_MS")? {
            config.work_min = Duration::from_millis(v);
        }
        if let Some(v) = parse_var::<u64, _>(&lookup, "RWGATE_WORK_MAX_MS")? {
            config.work_max = Duration::from_millis(v);
        }
        if let Some(v) = parse_var::<u64, _>(&lookup, "RWGATE_PAUSE_MIN_MS")? {
            config.pause_min = Duration::from_millis(v);
        }
        if let Some(v) = parse_var::<u64, _>(&lookup, "RWGATE_PAUSE_MAX_MS")? {
            config.pause_max = Duration::from_millis(v);
        }
        if let Some(v) = parse_var::<u64, _>(&lookup, "RWGATE_RUN_SECS")? {
            config.run_for = Some(Duration::from_secs(v));
        }
        if let Some(v) = parse_var::<u64, _>(&lookup, "RWGATE_STARVATION_WARN_MS")? {
            config.starvation_warn = Duration::from_millis(v);
        }
        config.seed = parse_var::<u64, _>(&lookup, "RWGATE_SEED")?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> DriverResult<()> {
        if self.readers == 0 && self.writers == 0 {
            return Err(DriverError::InvalidConfig(
                "at least one reader or writer is required".to_string(),
            ));
        }
        if self.work_min > self.work_max {
            return Err(DriverError::InvalidConfig(format!(
                "work_min ({}ms) exceeds work_max ({}ms)",
                self.work_min.as_millis(),
                self.work_max.as_millis()
            )));
        }
        if self.pause_min > self.pause_max {
            return Err(DriverError::InvalidConfig(format!(
                "pause_min ({}ms) exceeds pause_max ({}ms)",
                self.pause_min.as_millis(),
                self.pause_max.as_millis()
            )));
        }
        Ok(())
    }
}

fn parse_var<T, F>(lookup: &F, key: &str) -> DriverResult<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| DriverError::InvalidConfig(format!("{key}={raw:?}: {e}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults_match_reference_program() {
        let config = DriverConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config, DriverConfig::default());
        assert_eq!(config.readers, 5);
        assert_eq!(config.writers, 3);
    }

    #[test]
    fn test_overrides() {
        let config = DriverConfig::from_lookup(lookup_from(&[
            ("RWGATE_READERS", "2"),
            ("RWGATE_WRITERS", " 1 "),
            ("RWGATE_WORK_MIN_MS", "10"),
            ("RWGATE_WORK_MAX_MS", "20"),
            ("RWGATE_RUN_SECS", "3"),
            ("RWGATE_SEED", "42"),
        ]))
        .unwrap();

        assert_eq!(config.readers, 2);
        assert_eq!(config.writers, 1);
        assert_eq!(config.work_min, Duration::from_millis(10));
        assert_eq!(config.work_max, Duration::from_millis(20));
        assert_eq!(config.run_for, Some(Duration::from_secs(3)));
        assert_eq!(config.seed, Some(42));
    }

    #[test]
    fn test_invalid_number() {
        let err = DriverConfig::from_lookup(lookup_from(&[("RWGATE_READERS", "many")]))
            .unwrap_err();
        assert!(matches!(err, DriverError::InvalidConfig(msg) if msg.starts_with("RWGATE_READERS")));
    }

    #[test]
    fn test_inverted_range_rejected() {
        let err = DriverConfig::from_lookup(lookup_from(&[
            ("RWGATE_PAUSE_MIN_MS", "900"),
            ("RWGATE_PAUSE_MAX_MS", "100"),
        ]))
        .unwrap_err();
        assert!(matches!(err, DriverError::InvalidConfig(_)));
    }

    #[test]
    fn test_no_workers_rejected() {
        let config = DriverConfig {
            readers: 0,
            writers: 0,
            ..DriverConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
