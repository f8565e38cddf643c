/*!
 * Synchronization Primitives
 *
 * Readers-writer coordination composed from plain exclusion tokens:
 * - `BinarySemaphore` for the write permit (releasable from any thread)
 * - `ReaderWriterGate` implementing the first-reader-locks / last-reader-unlocks protocol
 * - Scoped access guards and a `GatedCell<T>` wrapper for data
 *
 * # Architecture
 *
 * The gate is built from `parking_lot` primitives rather than wrapping a
 * library `RwLock`, so the admission policy stays visible and testable. In
 * particular, readers are preferred: writers can starve under a continuous
 * reader load. See [`ReaderWriterGate`] for details.
 */

mod access;
mod cell;
mod config;
mod gate;
mod semaphore;
mod stats;

pub use access::{AccessGuard, AccessMode, Exclusive, ReadGuard, Shared, WriteGuard};
pub use cell::{CellReadGuard, CellWriteGuard, GatedCell};
pub use config::GateConfig;
pub use gate::ReaderWriterGate;
pub use semaphore::{Acquisition, BinarySemaphore};
pub use stats::{GateStats, GateStatsSnapshot};
