/*!
 * Reader-Writer Gate
 *
 * Admits any number of concurrent readers or a single writer.
 *
 * # Protocol
 *
 * Two exclusion tokens:
 * - `write_permit`: held either by the writer currently writing, or by the
 *   reader group as a whole. The first reader of a batch takes it on behalf of
 *   the group and the last reader out gives it back.
 * - `count_guard`: serialises changes to the active reader count together
 *   with the group's take/give of `write_permit`. Held only for bookkeeping,
 *   never while a reader is reading.
 *
 * # Fairness
 *
 * There is no queueing between writers and the reader group. While at least
 * one reader is active, newly arriving readers are admitted immediately, so a
 * continuous stream of overlapping readers keeps the permit away from a
 * waiting writer indefinitely (writer starvation). Use the timed admission
 * variants if a writer must give up after a bound.
 */

use super::access::{ReadGuard, WriteGuard};
use super::config::GateConfig;
use super::semaphore::{Acquisition, BinarySemaphore};
use super::stats::{GateStats, GateStatsSnapshot};
use crate::core::errors::{GateError, GateResult};
use crate::core::types::{CallerId, Role};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::{Duration, Instant};
use tracing::{error, trace, warn};

/// Readers-writer coordination primitive
///
/// Share it between callers with `Arc`. Every successful `begin_*` must be
/// matched by exactly one `end_*`; the guard-returning methods
/// ([`read`](Self::read), [`write`](Self::write)) and the closure helpers
/// ([`with_read`](Self::with_read), [`with_write`](Self::with_write))
/// guarantee this on every exit path, including panics.
///
/// # Examples
///
/// ```
/// use rw_gate::{CallerId, ReaderWriterGate};
///
/// let gate = ReaderWriterGate::new();
///
/// {
///     let _a = gate.read(CallerId::new(1));
///     let _b = gate.read(CallerId::new(2));
///     assert_eq!(gate.active_readers(), 2);
/// }
///
/// let total = gate.with_write(CallerId::new(3), || 40 + 2);
/// assert_eq!(total, 42);
/// assert!(!gate.is_write_locked());
/// ```
pub struct ReaderWriterGate {
    config: GateConfig,
    count_guard: Mutex<()>,
    /// Mutated only while `count_guard` is held; read lock-free for introspection
    active_reader_count: AtomicUsize,
    write_permit: BinarySemaphore,
    writer_active: AtomicBool,
    stats: GateStats,
}

impl ReaderWriterGate {
    /// Create a gate with default configuration
    pub fn new() -> Self {
        Self::with_config(GateConfig::default())
    }

    pub fn with_config(config: GateConfig) -> Self {
        let stats = GateStats::new(config.track_stats);
        Self {
            config,
            count_guard: Mutex::new(()),
            active_reader_count: AtomicUsize::new(0),
            write_permit: BinarySemaphore::new(),
            writer_active: AtomicBool::new(false),
            stats,
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.config.name
    }

    #[inline]
    pub fn config(&self) -> &GateConfig {
        &self.config
    }

    // ------------------------------------------------------------------
    // Raw protocol
    // ------------------------------------------------------------------

    /// Block until `caller` may read
    ///
    /// Blocks on the write permit only when no other reader is active.
    pub fn begin_read(&self, caller: CallerId) {
        trace!(gate = %self.config.name, caller = %caller, "reader waiting for admission");

        let _count = self.count_guard.lock();
        if self.active_reader_count.load(Ordering::Acquire) == 0 {
            let acquisition = self.write_permit.acquire();
            self.group_took_permit(caller, acquisition);
        }
        self.admit_reader(caller);
    }

    /// End a read started with [`begin_read`](Self::begin_read)
    ///
    /// The last active reader hands the write permit back. Calling this with
    /// no active reader is rejected without touching the gate state.
    pub fn end_read(&self, caller: CallerId) -> GateResult<()> {
        let _count = self.count_guard.lock();

        let active = self.active_reader_count.load(Ordering::Acquire);
        if active == 0 {
            warn!(gate = %self.config.name, caller = %caller, "end_read without matching begin_read");
            return Err(GateError::ReadNotHeld { caller });
        }

        let remaining = active - 1;
        self.active_reader_count.store(remaining, Ordering::Release);
        trace!(gate = %self.config.name, caller = %caller, active_readers = remaining, "reader left");

        if remaining == 0 {
            if !self.write_permit.release() {
                error!(gate = %self.config.name, caller = %caller, "reader group released a write permit it did not hold");
            }
            trace!(gate = %self.config.name, caller = %caller, "last reader released write permit");
        }
        Ok(())
    }

    /// Block until `caller` has exclusive access
    pub fn begin_write(&self, caller: CallerId) {
        trace!(gate = %self.config.name, caller = %caller, "writer waiting for exclusive access");

        let acquisition = self.write_permit.acquire();
        self.admit_writer(caller, acquisition);
    }

    /// End a write started with [`begin_write`](Self::begin_write)
    ///
    /// Calling this while no writer is inside is rejected, including while
    /// the permit is held by the reader group.
    pub fn end_write(&self, caller: CallerId) -> GateResult<()> {
        if self
            .writer_active
            .compare_exchange(true, false, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            warn!(gate = %self.config.name, caller = %caller, "end_write without matching begin_write");
            return Err(GateError::WriteNotHeld { caller });
        }

        if !self.write_permit.release() {
            error!(gate = %self.config.name, caller = %caller, "writer released a write permit it did not hold");
        }
        trace!(gate = %self.config.name, caller = %caller, "writer released write permit");
        Ok(())
    }

    // ------------------------------------------------------------------
    // Non-blocking and timed admission
    // ------------------------------------------------------------------

    /// Admit a reader only if that needs no waiting
    ///
    /// Fails with [`GateError::WouldBlock`] while a writer holds the permit
    /// or while another caller is doing reader bookkeeping.
    pub fn try_begin_read(&self, caller: CallerId) -> GateResult<()> {
        let Some(_count) = self.count_guard.try_lock() else {
            return Err(GateError::WouldBlock { caller, role: Role::Reader });
        };

        if self.active_reader_count.load(Ordering::Acquire) == 0 {
            if !self.write_permit.try_acquire() {
                return Err(GateError::WouldBlock { caller, role: Role::Reader });
            }
            self.group_took_permit(caller, Acquisition::Immediate);
        }
        self.admit_reader(caller);
        Ok(())
    }

    /// Admit a writer only if the permit is free right now
    pub fn try_begin_write(&self, caller: CallerId) -> GateResult<()> {
        if !self.write_permit.try_acquire() {
            return Err(GateError::WouldBlock { caller, role: Role::Writer });
        }
        self.admit_writer(caller, Acquisition::Immediate);
        Ok(())
    }

    /// Like [`begin_read`](Self::begin_read) but gives up after `timeout`
    ///
    /// A reader that times out leaves no trace in the gate state.
    pub fn begin_read_timeout(&self, caller: CallerId, timeout: Duration) -> GateResult<()> {
        let start = Instant::now();
        let Some(deadline) = start.checked_add(timeout) else {
            self.begin_read(caller);
            return Ok(());
        };

        let Some(_count) = self.count_guard.try_lock_until(deadline) else {
            return Err(self.timed_out(caller, Role::Reader, start));
        };

        if self.active_reader_count.load(Ordering::Acquire) == 0 {
            match self.write_permit.acquire_until(deadline) {
                Some(acquisition) => self.group_took_permit(caller, acquisition),
                None => return Err(self.timed_out(caller, Role::Reader, start)),
            }
        }
        self.admit_reader(caller);
        Ok(())
    }

    /// Like [`begin_write`](Self::begin_write) but gives up after `timeout`
    pub fn begin_write_timeout(&self, caller: CallerId, timeout: Duration) -> GateResult<()> {
        let start = Instant::now();
        let Some(deadline) = start.checked_add(timeout) else {
            self.begin_write(caller);
            return Ok(());
        };

        match self.write_permit.acquire_until(deadline) {
            Some(acquisition) => {
                self.admit_writer(caller, acquisition);
                Ok(())
            }
            None => Err(self.timed_out(caller, Role::Writer, start)),
        }
    }

    // ------------------------------------------------------------------
    // Scoped acquisition
    // ------------------------------------------------------------------

    /// Enter a read critical section that ends when the guard drops
    pub fn read(&self, caller: CallerId) -> ReadGuard<'_> {
        self.begin_read(caller);
        ReadGuard::new(self, caller)
    }

    /// Enter a write critical section that ends when the guard drops
    pub fn write(&self, caller: CallerId) -> WriteGuard<'_> {
        self.begin_write(caller);
        WriteGuard::new(self, caller)
    }

    pub fn try_read(&self, caller: CallerId) -> GateResult<ReadGuard<'_>> {
        self.try_begin_read(caller)?;
        Ok(ReadGuard::new(self, caller))
    }

    pub fn try_write(&self, caller: CallerId) -> GateResult<WriteGuard<'_>> {
        self.try_begin_write(caller)?;
        Ok(WriteGuard::new(self, caller))
    }

    pub fn read_timeout(&self, caller: CallerId, timeout: Duration) -> GateResult<ReadGuard<'_>> {
        self.begin_read_timeout(caller, timeout)?;
        Ok(ReadGuard::new(self, caller))
    }

    pub fn write_timeout(
        &self,
        caller: CallerId,
        timeout: Duration,
    ) -> GateResult<WriteGuard<'_>> {
        self.begin_write_timeout(caller, timeout)?;
        Ok(WriteGuard::new(self, caller))
    }

    /// Run `f` as a reader
    ///
    /// Whatever `f` returns (including an `Err`) is handed back after the
    /// read has ended; a panic in `f` ends the read during unwinding.
    pub fn with_read<F, R>(&self, caller: CallerId, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        let _guard = self.read(caller);
        f()
    }

    /// Run `f` as the exclusive writer
    pub fn with_write<F, R>(&self, caller: CallerId, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        let _guard = self.write(caller);
        f()
    }

    // ------------------------------------------------------------------
    // Introspection
    // ------------------------------------------------------------------

    /// Readers currently between `begin_read` and `end_read`
    #[inline]
    pub fn active_readers(&self) -> usize {
        self.active_reader_count.load(Ordering::Acquire)
    }

    /// Whether a writer is currently inside its critical section
    #[inline]
    pub fn writer_active(&self) -> bool {
        self.writer_active.load(Ordering::Acquire)
    }

    /// Whether the write permit is taken, by a writer or by the reader group
    #[inline]
    pub fn is_write_locked(&self) -> bool {
        self.write_permit.is_held()
    }

    pub fn stats(&self) -> GateStatsSnapshot {
        self.stats.snapshot()
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    /// Caller must hold `count_guard`
    #[inline]
    fn group_took_permit(&self, caller: CallerId, acquisition: Acquisition) {
        self.stats.record_permit(Role::Reader, acquisition);
        trace!(
            gate = %self.config.name,
            caller = %caller,
            waited = acquisition.was_contended(),
            "first reader took write permit for the group"
        );
    }

    /// Caller must hold `count_guard`
    #[inline]
    fn admit_reader(&self, caller: CallerId) {
        let active = self.active_reader_count.load(Ordering::Acquire) + 1;
        self.active_reader_count.store(active, Ordering::Release);
        self.stats.record_read(active);
        trace!(gate = %self.config.name, caller = %caller, active_readers = active, "reader admitted");
    }

    #[inline]
    fn admit_writer(&self, caller: CallerId, acquisition: Acquisition) {
        self.writer_active.store(true, Ordering::Release);
        self.stats.record_permit(Role::Writer, acquisition);
        self.stats.record_write();
        trace!(
            gate = %self.config.name,
            caller = %caller,
            waited = acquisition.was_contended(),
            "writer admitted"
        );
    }

    fn timed_out(&self, caller: CallerId, role: Role, start: Instant) -> GateError {
        self.stats.record_timeout(role);
        let waited_ms = start.elapsed().as_millis() as u64;
        trace!(gate = %self.config.name, caller = %caller, role = role.as_str(), waited_ms, "admission timed out");
        GateError::Timeout {
            caller,
            role,
            waited_ms,
        }
    }
}

impl Default for ReaderWriterGate {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ReaderWriterGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReaderWriterGate")
            .field("name", &self.config.name)
            .field("active_readers", &self.active_readers())
            .field("writer_active", &self.writer_active())
            .field("write_permit", &self.write_permit)
            .finish()
    }
}
