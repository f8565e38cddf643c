/*!
 * Worker Role State
 *
 * Per-worker state machine shared between a worker thread and the supervisor:
 *
 * - Reader: `Idle → WaitingForAdmission → Reading → Idle`
 * - Writer: `Idle → WaitingForExclusive → Writing → Idle`
 *
 * There is no terminal state; a worker cycles until told to stop.
 */

use crate::core::types::Role;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Phase of one begin/end cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkerState {
    Idle,
    /// Blocked in `begin_read` / `begin_write`
    Waiting,
    /// Inside the critical section
    Active,
}

impl WorkerState {
    /// The only legal successor
    #[inline]
    pub const fn next(self) -> Self {
        match self {
            WorkerState::Idle => WorkerState::Waiting,
            WorkerState::Waiting => WorkerState::Active,
            WorkerState::Active => WorkerState::Idle,
        }
    }

    /// Role-specific name of the state
    pub const fn label(self, role: Role) -> &'static str {
        match (self, role) {
            (WorkerState::Idle, _) => "idle",
            (WorkerState::Waiting, Role::Reader) => "waiting_for_admission",
            (WorkerState::Waiting, Role::Writer) => "waiting_for_exclusive",
            (WorkerState::Active, Role::Reader) => "reading",
            (WorkerState::Active, Role::Writer) => "writing",
        }
    }
}

/// Live status of a single worker
pub struct WorkerStatus {
    role: Role,
    index: usize,
    state: Mutex<(WorkerState, Instant)>,
    cycles: AtomicU64,
}

impl WorkerStatus {
    pub fn new(role: Role, index: usize) -> Self {
        Self {
            role,
            index,
            state: Mutex::new((WorkerState::Idle, Instant::now())),
            cycles: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn role(&self) -> Role {
        self.role
    }

    #[inline]
    pub fn index(&self) -> usize {
        self.index
    }

    /// Move to the next state of the cycle
    ///
    /// Completing `Active → Idle` counts one cycle.
    pub fn advance(&self) -> WorkerState {
        let mut state = self.state.lock();
        let next = state.0.next();
        *state = (next, Instant::now());
        drop(state);

        if next == WorkerState::Idle {
            self.cycles.fetch_add(1, Ordering::Relaxed);
        }
        next
    }

    pub fn state(&self) -> WorkerState {
        self.state.lock().0
    }

    /// Current state and how long the worker has been in it
    pub fn state_for(&self) -> (WorkerState, Duration) {
        let state = self.state.lock();
        (state.0, state.1.elapsed())
    }

    pub fn cycles(&self) -> u64 {
        self.cycles.load(Ordering::Relaxed)
    }
}

impl fmt::Display for WorkerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.role, self.index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycle_transitions() {
        let status = WorkerStatus::new(Role::Writer, 0);
        assert_eq!(status.state(), WorkerState::Idle);

        assert_eq!(status.advance(), WorkerState::Waiting);
        assert_eq!(status.state().label(Role::Writer), "waiting_for_exclusive");
        assert_eq!(status.advance(), WorkerState::Active);
        assert_eq!(status.cycles(), 0);
        assert_eq!(status.advance(), WorkerState::Idle);
        assert_eq!(status.cycles(), 1);
    }

    #[test]
    fn test_labels() {
        assert_eq!(WorkerState::Active.label(Role::Reader), "reading");
        assert_eq!(WorkerState::Waiting.label(Role::Reader), "waiting_for_admission");
        assert_eq!(WorkerState::Idle.label(Role::Writer), "idle");
    }

    #[test]
    fn test_display() {
        assert_eq!(WorkerStatus::new(Role::Reader, 3).to_string(), "Reader 3");
    }
}
