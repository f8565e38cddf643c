/*!
 * Binary Semaphore
 *
 * Exclusion token built on parking_lot::Mutex + Condvar.
 *
 * Unlike a mutex guard, the token is not tied to the thread that took it:
 * any thread may release it. The reader group relies on this, since the
 * first reader in a batch acquires the token and the last one releases it.
 */

use parking_lot::{Condvar, Mutex};
use std::time::Instant;

/// How an acquisition was satisfied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Acquisition {
    /// The token was free on arrival
    Immediate,
    /// The caller had to park until the token was released
    Contended,
}

impl Acquisition {
    #[inline(always)]
    pub fn was_contended(self) -> bool {
        matches!(self, Acquisition::Contended)
    }
}

/// Binary semaphore (a single exclusion token)
///
/// # Waking
///
/// `release` wakes at most one parked thread. Waiters re-check the token in
/// a loop, so spurious wake-ups are harmless. There is no FIFO guarantee
/// among waiters.
pub struct BinarySemaphore {
    available: Mutex<bool>,
    released: Condvar,
}

impl BinarySemaphore {
    /// Create a semaphore whose token is free
    pub fn new() -> Self {
        Self {
            available: Mutex::new(true),
            released: Condvar::new(),
        }
    }

    /// Block until the token is taken
    pub fn acquire(&self) -> Acquisition {
        let mut available = self.available.lock();
        if *available {
            *available = false;
            return Acquisition::Immediate;
        }

        while !*available {
            self.released.wait(&mut available);
        }
        *available = false;
        Acquisition::Contended
    }

    /// Take the token if it is free, never blocks
    pub fn try_acquire(&self) -> bool {
        let mut available = self.available.lock();
        if *available {
            *available = false;
            true
        } else {
            false
        }
    }

    /// Block until the token is taken or `deadline` passes
    ///
    /// Returns `None` on timeout, in which case the token was not taken.
    pub fn acquire_until(&self, deadline: Instant) -> Option<Acquisition> {
        let mut available = self.available.lock();
        if *available {
            *available = false;
            return Some(Acquisition::Immediate);
        }

        while !*available {
            if self.released.wait_until(&mut available, deadline).timed_out() {
                // Released right at the deadline still counts
                if *available {
                    break;
                }
                return None;
            }
        }
        *available = false;
        Some(Acquisition::Contended)
    }

    /// Return the token and wake one waiter
    ///
    /// Returns `false` if the token was already free (double release), in
    /// which case nothing changes.
    pub fn release(&self) -> bool {
        let mut available = self.available.lock();
        if *available {
            return false;
        }
        *available = true;
        drop(available);

        self.released.notify_one();
        true
    }

    /// Whether someone currently holds the token
    #[inline]
    pub fn is_held(&self) -> bool {
        !*self.available.lock()
    }
}

impl Default for BinarySemaphore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for BinarySemaphore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BinarySemaphore")
            .field("held", &self.is_held())
            .finish()
    }
}
