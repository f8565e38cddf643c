/*!
 * Error Types
 * Centralized error handling with thiserror, miette, and serde support
 */

use super::types::{CallerId, Role};
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type for gate operations
pub type GateResult<T> = Result<T, GateError>;

/// Result type for the demo driver
pub type DriverResult<T> = Result<T, DriverError>;

/// Gate errors with serialization support
///
/// The blocking admission paths never fail. These errors come from misuse of
/// the raw `end_*` calls and from the non-blocking / timed admission variants.
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Diagnostic)]
#[serde(tag = "error_type", content = "details", rename_all = "snake_case")]
pub enum GateError {
    #[error("Caller {caller} ended a read but no reader is active")]
    #[diagnostic(
        code(gate::read_not_held),
        help("Every end_read must be matched by exactly one prior begin_read. Prefer the scoped read guard.")
    )]
    ReadNotHeld { caller: CallerId },

    #[error("Caller {caller} ended a write but no writer is active")]
    #[diagnostic(
        code(gate::write_not_held),
        help("Every end_write must be matched by exactly one prior begin_write. Prefer the scoped write guard.")
    )]
    WriteNotHeld { caller: CallerId },

    #[error("{role} {caller} was not admitted within {waited_ms}ms")]
    #[diagnostic(
        code(gate::timeout),
        help("The gate does not queue writers ahead of readers; a steady stream of readers can hold writers off indefinitely.")
    )]
    Timeout {
        caller: CallerId,
        role: Role,
        waited_ms: u64,
    },

    #[error("{role} {caller} could not be admitted without blocking")]
    #[diagnostic(code(gate::would_block))]
    WouldBlock { caller: CallerId, role: Role },
}

impl GateError {
    /// Role of the caller the error was raised for
    pub fn role(&self) -> Role {
        match self {
            GateError::ReadNotHeld { .. } => Role::Reader,
            GateError::WriteNotHeld { .. } => Role::Writer,
            GateError::Timeout { role, .. } | GateError::WouldBlock { role, .. } => *role,
        }
    }

    /// True for errors caused by calling the raw API out of order
    pub fn is_misuse(&self) -> bool {
        matches!(
            self,
            GateError::ReadNotHeld { .. } | GateError::WriteNotHeld { .. }
        )
    }
}

/// Demo driver errors
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Diagnostic)]
#[serde(tag = "error_type", content = "details", rename_all = "snake_case")]
pub enum DriverError {
    #[error("Invalid driver configuration: {0}")]
    #[diagnostic(
        code(driver::invalid_config),
        help("Check the RWGATE_* environment variables. Durations are in milliseconds and min must not exceed max.")
    )]
    InvalidConfig(String),

    #[error("{role} worker {index} panicked: {message}")]
    #[diagnostic(code(driver::worker_panicked))]
    WorkerPanicked {
        role: Role,
        index: usize,
        message: String,
    },

    #[error("Worker task could not be joined: {0}")]
    #[diagnostic(code(driver::join))]
    Join(String),

    #[error("Shared document found inconsistent by reader {reader}: {detail}")]
    #[diagnostic(
        code(driver::inconsistent_read),
        help("A reader observed a half-applied write. Mutual exclusion between readers and writers was violated.")
    )]
    InconsistentRead { reader: usize, detail: String },
}
