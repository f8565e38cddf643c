/*!
 * Guard Traits
 *
 * Core abstractions for RAII access guards
 */

use super::{GuardError, GuardMetadata, GuardResult};

/// Core guard trait
///
/// All guards must implement this to provide:
/// - Resource type identification
/// - Metadata access
/// - Manual release capability
pub trait Guard: Send {
    /// Resource type name for logging/debugging
    fn resource_type(&self) -> &'static str;

    /// Get guard metadata
    fn metadata(&self) -> &GuardMetadata;

    /// Check if guard still holds its resource
    fn is_active(&self) -> bool;

    /// Manually release the resource before the guard is dropped
    ///
    /// Returns `Err` if already released
    fn release(&mut self) -> GuardResult<()>;
}

/// Guards that can be dropped with custom cleanup
///
/// Separates Drop logic for better testability and observability
pub trait GuardDrop: Guard {
    /// Perform cleanup on drop
    ///
    /// # Panics
    ///
    /// Should NOT panic. Drop may run during unwinding.
    fn on_drop(&mut self);
}

/// Guards with observable lifecycle
pub trait Observable: Guard {
    /// Emit creation event
    fn emit_created(&self);

    /// Emit cleanup event
    fn emit_dropped(&self);

    /// Emit error event
    fn emit_error(&self, error: &GuardError);
}
