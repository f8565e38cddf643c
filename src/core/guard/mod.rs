/*!
 * RAII Access Guards
 *
 * Observable, scoped guards with automatic release.
 *
 * ## Design Principles
 *
 * 1. **Scoped**: Dropping a guard ends the critical section, on every exit path
 * 2. **Observable**: Guards emit tracing events for creation and release
 * 3. **Explicit release**: A guard may be released early, exactly once
 *
 * The concrete guards for the reader-writer gate live in
 * [`crate::core::sync`]; this module only holds the shared abstractions.
 */

mod traits;

pub use traits::{Guard, GuardDrop, Observable};

use crate::core::types::CallerId;

/// Result type for guard operations
pub type GuardResult<T> = Result<T, GuardError>;

/// Errors that can occur during guard operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GuardError {
    #[error("Resource already released")]
    AlreadyReleased,
}

/// Guard metadata for observability
#[derive(Debug, Clone)]
pub struct GuardMetadata {
    pub resource_type: &'static str,
    pub creation_time: std::time::Instant,
    pub caller: Option<CallerId>,
}

impl GuardMetadata {
    #[inline]
    pub fn new(resource_type: &'static str) -> Self {
        Self {
            resource_type,
            creation_time: std::time::Instant::now(),
            caller: None,
        }
    }

    #[inline]
    pub fn with_caller(mut self, caller: CallerId) -> Self {
        self.caller = Some(caller);
        self
    }

    #[inline]
    pub fn lifetime_micros(&self) -> u64 {
        self.creation_time.elapsed().as_micros() as u64
    }
}
