/*!
 * Reader-Writer Gate Library
 * Reader-preferring readers-writer coordination with a small demo driver
 */

pub mod core;
pub mod driver;
pub mod monitoring;

// Re-exports
pub use crate::core::errors::*;
pub use crate::core::sync::{
    AccessGuard, CellReadGuard, CellWriteGuard, Exclusive, GateConfig, GateStatsSnapshot,
    GatedCell, ReadGuard, ReaderWriterGate, Shared, WriteGuard,
};
pub use crate::core::types::{CallerId, Role};
pub use crate::driver::{DriverConfig, RunReport, Supervisor};
pub use crate::monitoring::init_tracing;
