/*!
 * Access Guards with Type-State Pattern
 *
 * Scoped read/write admission to a [`ReaderWriterGate`]. The access mode is
 * encoded in the guard type, so a read guard can never end a write.
 */

use super::gate::ReaderWriterGate;
use crate::core::errors::GateResult;
use crate::core::guard::{Guard, GuardDrop, GuardError, GuardMetadata, GuardResult, Observable};
use crate::core::types::{CallerId, Role};
use crate::monitoring::CriticalSectionSpan;
use std::marker::PhantomData;
use tracing::{error, trace};

/// Access mode marker trait
pub trait AccessMode: Send + Sync + 'static {
    const ROLE: Role;
    const RESOURCE_TYPE: &'static str;

    /// Matching `end_*` call on the gate
    fn end(gate: &ReaderWriterGate, caller: CallerId) -> GateResult<()>;
}

/// Type marker for shared (reader) access
pub struct Shared;

impl AccessMode for Shared {
    const ROLE: Role = Role::Reader;
    const RESOURCE_TYPE: &'static str = "read_access";

    #[inline]
    fn end(gate: &ReaderWriterGate, caller: CallerId) -> GateResult<()> {
        gate.end_read(caller)
    }
}

/// Type marker for exclusive (writer) access
pub struct Exclusive;

impl AccessMode for Exclusive {
    const ROLE: Role = Role::Writer;
    const RESOURCE_TYPE: &'static str = "write_access";

    #[inline]
    fn end(gate: &ReaderWriterGate, caller: CallerId) -> GateResult<()> {
        gate.end_write(caller)
    }
}

/// Guard for an admitted reader
pub type ReadGuard<'a> = AccessGuard<'a, Shared>;

/// Guard for the admitted writer
pub type WriteGuard<'a> = AccessGuard<'a, Exclusive>;

/// Proof of admission to a gate
///
/// Ends the critical section exactly once: either through
/// [`Guard::release`] or when dropped (also during unwinding).
#[must_use = "the critical section ends as soon as the guard is dropped"]
pub struct AccessGuard<'a, M: AccessMode> {
    gate: &'a ReaderWriterGate,
    caller: CallerId,
    metadata: GuardMetadata,
    span: Option<CriticalSectionSpan>,
    active: bool,
    _mode: PhantomData<M>,
}

impl<'a, M: AccessMode> AccessGuard<'a, M> {
    /// Wrap an admission that already happened on `gate`
    pub(super) fn new(gate: &'a ReaderWriterGate, caller: CallerId) -> Self {
        let config = gate.config();
        let guard = Self {
            gate,
            caller,
            metadata: GuardMetadata::new(M::RESOURCE_TYPE).with_caller(caller),
            span: Some(CriticalSectionSpan::new(
                &config.name,
                M::ROLE,
                caller,
                config.slow_hold_threshold,
            )),
            active: true,
            _mode: PhantomData,
        };

        guard.emit_created();
        guard
    }

    #[inline]
    pub fn caller(&self) -> CallerId {
        self.caller
    }

    #[inline]
    pub fn role(&self) -> Role {
        M::ROLE
    }

    /// Gate this guard was admitted to
    #[inline]
    pub fn gate(&self) -> &'a ReaderWriterGate {
        self.gate
    }

    fn finish(&mut self) -> GuardResult<()> {
        if !self.active {
            return Err(GuardError::AlreadyReleased);
        }
        self.active = false;

        // Close the span first so the hold time excludes the release itself
        self.span.take();

        if let Err(err) = M::end(self.gate, self.caller) {
            // Only reachable if someone ended this admission through the raw API
            error!(gate = %self.gate.name(), caller = %self.caller, error = %err, "guard release rejected by gate");
        }
        self.emit_dropped();
        Ok(())
    }
}

impl<'a, M: AccessMode> Guard for AccessGuard<'a, M> {
    fn resource_type(&self) -> &'static str {
        M::RESOURCE_TYPE
    }

    fn metadata(&self) -> &GuardMetadata {
        &self.metadata
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn release(&mut self) -> GuardResult<()> {
        let result = self.finish();
        if let Err(err) = &result {
            self.emit_error(err);
        }
        result
    }
}

impl<'a, M: AccessMode> GuardDrop for AccessGuard<'a, M> {
    fn on_drop(&mut self) {
        if self.active {
            let _ = self.finish();
        }
    }
}

impl<'a, M: AccessMode> Observable for AccessGuard<'a, M> {
    fn emit_created(&self) {
        trace!(
            gate = %self.gate.name(),
            resource_type = M::RESOURCE_TYPE,
            caller = %self.caller,
            "guard created"
        );
    }

    fn emit_dropped(&self) {
        trace!(
            gate = %self.gate.name(),
            resource_type = M::RESOURCE_TYPE,
            caller = %self.caller,
            lifetime_us = self.metadata.lifetime_micros(),
            "guard released"
        );
    }

    fn emit_error(&self, error: &GuardError) {
        tracing::warn!(
            gate = %self.gate.name(),
            resource_type = M::RESOURCE_TYPE,
            caller = %self.caller,
            error = %error,
            "guard error"
        );
    }
}

impl<'a, M: AccessMode> Drop for AccessGuard<'a, M> {
    fn drop(&mut self) {
        self.on_drop();
    }
}

impl<'a, M: AccessMode> std::fmt::Debug for AccessGuard<'a, M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessGuard")
            .field("role", &M::ROLE)
            .field("caller", &self.caller)
            .field("active", &self.active)
            .finish()
    }
}
