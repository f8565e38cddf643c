/*!
 * Gated Cell
 *
 * A value protected by its own reader-writer gate. Readers get `&T`, the
 * writer gets `&mut T`, and the gate decides who is admitted.
 */

use super::access::{ReadGuard, WriteGuard};
use super::config::GateConfig;
use super::gate::ReaderWriterGate;
use crate::core::errors::GateResult;
use crate::core::types::CallerId;
use std::cell::UnsafeCell;
use std::ops::{Deref, DerefMut};
use std::time::Duration;

/// Value shared between readers and a writer through a [`ReaderWriterGate`]
///
/// # Example
/// ```
/// use rw_gate::{CallerId, GatedCell};
///
/// let cell = GatedCell::new(vec![1, 2, 3]);
/// cell.write(CallerId::new(1)).push(4);
/// assert_eq!(cell.read(CallerId::new(2)).len(), 4);
/// ```
pub struct GatedCell<T> {
    gate: ReaderWriterGate,
    value: UnsafeCell<T>,
}

// Safety: the gate admits either any number of readers (sharing `&T` across
// threads, hence `T: Sync`) or a single writer (`&mut T`, hence `T: Send`).
unsafe impl<T: Send + Sync> Sync for GatedCell<T> {}

impl<T> GatedCell<T> {
    pub fn new(value: T) -> Self {
        Self::with_config(value, GateConfig::default())
    }

    pub fn with_config(value: T, config: GateConfig) -> Self {
        Self {
            gate: ReaderWriterGate::with_config(config),
            value: UnsafeCell::new(value),
        }
    }

    /// Gate guarding the value, for introspection and statistics
    #[inline]
    pub fn gate(&self) -> &ReaderWriterGate {
        &self.gate
    }

    pub fn read(&self, caller: CallerId) -> CellReadGuard<'_, T> {
        CellReadGuard {
            access: self.gate.read(caller),
            cell: self,
        }
    }

    pub fn write(&self, caller: CallerId) -> CellWriteGuard<'_, T> {
        CellWriteGuard {
            access: self.gate.write(caller),
            cell: self,
        }
    }

    pub fn try_read(&self, caller: CallerId) -> GateResult<CellReadGuard<'_, T>> {
        Ok(CellReadGuard {
            access: self.gate.try_read(caller)?,
            cell: self,
        })
    }

    pub fn try_write(&self, caller: CallerId) -> GateResult<CellWriteGuard<'_, T>> {
        Ok(CellWriteGuard {
            access: self.gate.try_write(caller)?,
            cell: self,
        })
    }

    pub fn read_timeout(
        &self,
        caller: CallerId,
        timeout: Duration,
    ) -> GateResult<CellReadGuard<'_, T>> {
        Ok(CellReadGuard {
            access: self.gate.read_timeout(caller, timeout)?,
            cell: self,
        })
    }

    pub fn write_timeout(
        &self,
        caller: CallerId,
        timeout: Duration,
    ) -> GateResult<CellWriteGuard<'_, T>> {
        Ok(CellWriteGuard {
            access: self.gate.write_timeout(caller, timeout)?,
            cell: self,
        })
    }

    /// Run `f` against a shared reference while admitted as a reader
    pub fn with_read<F, R>(&self, caller: CallerId, f: F) -> R
    where
        F: FnOnce(&T) -> R,
    {
        let guard = self.read(caller);
        f(&*guard)
    }

    /// Run `f` against an exclusive reference while admitted as the writer
    pub fn with_write<F, R>(&self, caller: CallerId, f: F) -> R
    where
        F: FnOnce(&mut T) -> R,
    {
        let mut guard = self.write(caller);
        f(&mut *guard)
    }

    /// Direct access; `&mut self` already proves exclusivity
    pub fn get_mut(&mut self) -> &mut T {
        self.value.get_mut()
    }

    pub fn into_inner(self) -> T {
        self.value.into_inner()
    }
}

impl<T: Default> Default for GatedCell<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T> std::fmt::Debug for GatedCell<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatedCell").field("gate", &self.gate).finish()
    }
}

/// Shared access to a [`GatedCell`] value
pub struct CellReadGuard<'a, T> {
    access: ReadGuard<'a>,
    cell: &'a GatedCell<T>,
}

impl<'a, T> CellReadGuard<'a, T> {
    #[inline]
    pub fn caller(&self) -> CallerId {
        self.access.caller()
    }
}

impl<'a, T> Deref for CellReadGuard<'a, T> {
    type Target = T;

    fn deref(&self) -> &T {
        // Safety: `access` keeps this reader admitted, so no writer holds `&mut T`.
        unsafe { &*self.cell.value.get() }
    }
}

/// Exclusive access to a [`GatedCell`] value
pub struct CellWriteGuard<'a, T> {
    access: WriteGuard<'a>,
    cell: &'a GatedCell<T>,
}

impl<'a, T> CellWriteGuard<'a, T> {
    #[inline]
    pub fn caller(&self) -> CallerId {
        self.access.caller()
    }
}

impl<'a, T> Deref for CellWriteGuard<'a, T> {
    type Target = T;

    fn deref(&self) -> &T {
        // Safety: `access` keeps this writer admitted exclusively.
        unsafe { &*self.cell.value.get() }
    }
}

impl<'a, T> DerefMut for CellWriteGuard<'a, T> {
    fn deref_mut(&mut self) -> &mut T {
        // Safety: `access` keeps this writer admitted exclusively.
        unsafe { &mut *self.cell.value.get() }
    }
}
