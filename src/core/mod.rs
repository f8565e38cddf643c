/*!
 * Core Module
 * Fundamental types, error handling and the synchronization primitives
 */

pub mod errors;
pub mod guard;
pub mod serde;
pub mod sync;
pub mod types;

// Re-export for convenience
pub use errors::*;
pub use guard::{Guard, GuardDrop, GuardError, GuardMetadata, GuardResult, Observable};
pub use types::*;
