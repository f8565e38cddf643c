/*!
 * Structured Tracing
 * Subscriber setup and critical-section spans using the tracing crate
 *
 * Features:
 * - JSON-formatted logs for structured parsing
 * - Per critical section spans carrying gate, role and caller
 * - Hold-time measurement with slow-hold warnings
 */

use crate::core::types::{CallerId, Role};
use std::time::{Duration, Instant};
use tracing::{debug, info, span, warn, Level};
use tracing_subscriber::{
    fmt::format::FmtSpan, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter,
};

/// Initialize structured tracing
///
/// Environment variables:
/// - RUST_LOG: Set log level (default: info)
/// - RWGATE_TRACE_JSON: Enable JSON output (default: false)
///
/// Safe to call more than once; only the first call installs a subscriber.
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let use_json = std::env::var("RWGATE_TRACE_JSON")
        .map(|v| v == "1" || v == "true")
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(env_filter);

    if use_json {
        // JSON output for production/parsing
        let installed = registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_thread_names(true)
                    .with_current_span(true)
                    .with_span_list(true)
                    .with_span_events(FmtSpan::CLOSE),
            )
            .try_init()
            .is_ok();
        if installed {
            info!("Structured tracing initialized with JSON output");
        }
    } else {
        // Human-readable output for development
        let installed = registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .with_thread_names(true)
                    .compact(),
            )
            .try_init()
            .is_ok();
        if installed {
            info!("Structured tracing initialized");
        }
    }
}

/// Span covering one critical section, from admission to release
///
/// Logs the hold time when dropped; holds above the threshold are reported
/// at warn level.
pub struct CriticalSectionSpan {
    span: tracing::Span,
    start: Instant,
    role: Role,
    caller: CallerId,
    slow_threshold: Duration,
}

impl CriticalSectionSpan {
    pub fn new(gate: &str, role: Role, caller: CallerId, slow_threshold: Duration) -> Self {
        let span = span!(
            Level::TRACE,
            "critical_section",
            gate = gate,
            role = role.as_str(),
            caller = %caller,
            hold_us = tracing::field::Empty,
        );

        Self {
            span,
            start: Instant::now(),
            role,
            caller,
            slow_threshold,
        }
    }

    /// Time spent inside the critical section so far
    #[inline]
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

impl Drop for CriticalSectionSpan {
    fn drop(&mut self) {
        let held = self.start.elapsed();
        self.span.record("hold_us", held.as_micros() as u64);
        let _entered = self.span.enter();

        if held > self.slow_threshold {
            warn!(
                role = self.role.as_str(),
                caller = %self.caller,
                hold_ms = held.as_millis() as u64,
                slow = true,
                "long critical section"
            );
        } else {
            debug!(
                role = self.role.as_str(),
                caller = %self.caller,
                hold_us = held.as_micros() as u64,
                "critical section completed"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_measures_hold() {
        let span = CriticalSectionSpan::new(
            "test",
            Role::Reader,
            CallerId::new(1),
            Duration::from_secs(1),
        );
        std::thread::sleep(Duration::from_millis(5));
        assert!(span.elapsed() >= Duration::from_millis(5));
    }

    #[test]
    fn test_init_tracing_twice() {
        init_tracing();
        init_tracing();
    }
}
