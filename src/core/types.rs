/*!
 * Core Types
 * Common types shared by the gate, its guards and the demo driver
 */

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque caller identity
///
/// Only ever used for observability. Two callers with the same id are
/// treated no differently by the gate than two callers with distinct ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CallerId(u64);

impl CallerId {
    /// Id used by callers that don't care about reporting
    pub const ANONYMOUS: CallerId = CallerId(u64::MAX);

    #[inline]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    #[inline]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl From<u64> for CallerId {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

impl From<u32> for CallerId {
    fn from(raw: u32) -> Self {
        Self(raw as u64)
    }
}

impl From<usize> for CallerId {
    fn from(raw: usize) -> Self {
        Self(raw as u64)
    }
}

impl fmt::Display for CallerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if *self == Self::ANONYMOUS {
            f.write_str("anonymous")
        } else {
            write!(f, "{}", self.0)
        }
    }
}

/// Class of caller competing for the write permit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Reader,
    Writer,
}

impl Role {
    #[inline]
    pub const fn as_str(self) -> &'static str {
        match self {
            Role::Reader => "reader",
            Role::Writer => "writer",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Reader => f.write_str("Reader"),
            Role::Writer => f.write_str("Writer"),
        }
    }
}
