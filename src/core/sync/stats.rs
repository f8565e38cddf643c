/*!
 * Lock-Free Gate Statistics
 * Atomic counters updated on admission paths without extra locking
 */

use super::semaphore::Acquisition;
use crate::core::types::Role;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// Point-in-time copy of the gate counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateStatsSnapshot {
    pub reads_admitted: u64,
    pub writes_admitted: u64,
    /// Times the first reader of a batch took the write permit for the group
    pub reader_group_acquisitions: u64,
    /// Reader-group acquisitions that had to wait for a writer
    pub reader_permit_waits: u64,
    /// Writer admissions that had to wait for the reader group or another writer
    pub writer_permit_waits: u64,
    pub read_timeouts: u64,
    pub write_timeouts: u64,
    pub peak_concurrent_readers: usize,
}

/// Atomic gate statistics
///
/// # Note
/// Counter values may not be perfectly consistent with each other due to
/// concurrent updates, but each individual value is accurate.
#[repr(C, align(64))]
#[derive(Debug)]
pub struct GateStats {
    enabled: bool,
    reads_admitted: AtomicU64,
    writes_admitted: AtomicU64,
    reader_group_acquisitions: AtomicU64,
    reader_permit_waits: AtomicU64,
    writer_permit_waits: AtomicU64,
    read_timeouts: AtomicU64,
    write_timeouts: AtomicU64,
    peak_concurrent_readers: AtomicUsize,
}

impl GateStats {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            reads_admitted: AtomicU64::new(0),
            writes_admitted: AtomicU64::new(0),
            reader_group_acquisitions: AtomicU64::new(0),
            reader_permit_waits: AtomicU64::new(0),
            writer_permit_waits: AtomicU64::new(0),
            read_timeouts: AtomicU64::new(0),
            write_timeouts: AtomicU64::new(0),
            peak_concurrent_readers: AtomicUsize::new(0),
        }
    }

    /// Record a write permit acquisition for either class
    #[inline(always)]
    pub fn record_permit(&self, role: Role, acquisition: Acquisition) {
        if !self.enabled {
            return;
        }
        match role {
            Role::Reader => {
                self.reader_group_acquisitions.fetch_add(1, Ordering::Relaxed);
                if acquisition.was_contended() {
                    self.reader_permit_waits.fetch_add(1, Ordering::Relaxed);
                }
            }
            Role::Writer => {
                if acquisition.was_contended() {
                    self.writer_permit_waits.fetch_add(1, Ordering::Relaxed);
                }
            }
        }
    }

    /// Record a reader admission; `active` is the count including this reader
    #[inline(always)]
    pub fn record_read(&self, active: usize) {
        if !self.enabled {
            return;
        }
        self.reads_admitted.fetch_add(1, Ordering::Relaxed);
        self.peak_concurrent_readers
            .fetch_max(active, Ordering::Relaxed);
    }

    #[inline(always)]
    pub fn record_write(&self) {
        if self.enabled {
            self.writes_admitted.fetch_add(1, Ordering::Relaxed);
        }
    }

    #[inline]
    pub fn record_timeout(&self, role: Role) {
        if !self.enabled {
            return;
        }
        match role {
            Role::Reader => self.read_timeouts.fetch_add(1, Ordering::Relaxed),
            Role::Writer => self.write_timeouts.fetch_add(1, Ordering::Relaxed),
        };
    }

    pub fn snapshot(&self) -> GateStatsSnapshot {
        GateStatsSnapshot {
            reads_admitted: self.reads_admitted.load(Ordering::Relaxed),
            writes_admitted: self.writes_admitted.load(Ordering::Relaxed),
            reader_group_acquisitions: self.reader_group_acquisitions.load(Ordering::Relaxed),
            reader_permit_waits: self.reader_permit_waits.load(Ordering::Relaxed),
            writer_permit_waits: self.writer_permit_waits.load(Ordering::Relaxed),
            read_timeouts: self.read_timeouts.load(Ordering::Relaxed),
            write_timeouts: self.write_timeouts.load(Ordering::Relaxed),
            peak_concurrent_readers: self.peak_concurrent_readers.load(Ordering::Relaxed),
        }
    }
}
