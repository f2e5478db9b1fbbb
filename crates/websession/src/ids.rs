//! Identifiers for sessions and execution hosts.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Process-unique identifier of a [`Session`](crate::Session).
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct SessionId(u64);

impl SessionId {
    /// Returns the raw numeric identifier.
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "session-{}", self.0)
    }
}

/// Identifier of an execution host (for example the VM running a server).
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct HostId(pub u32);

impl fmt::Display for HostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "host-{}", self.0)
    }
}

impl From<u32> for HostId {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

/// Hands out strictly increasing [`SessionId`]s.
///
/// A single allocator is meant to be shared (by reference or `Arc`) between
/// every component that creates sessions. Allocation is a single atomic
/// increment, so concurrent callers never observe the same id.
#[derive(Debug)]
pub struct SessionIdAllocator {
    next: AtomicU64,
}

impl SessionIdAllocator {
    /// Creates an allocator whose first id is `first`.
    pub fn starting_at(first: u64) -> Self {
        Self {
            next: AtomicU64::new(first),
        }
    }

    /// Allocates the next id.
    ///
    /// # Panics
    /// Panics if the id space is exhausted.
    pub fn allocate(&self) -> SessionId {
        let id = self.next.fetch_add(1, Ordering::Relaxed);
        assert!(id != u64::MAX, "session id space exhausted");
        SessionId(id)
    }
}

impl Default for SessionIdAllocator {
    fn default() -> Self {
        Self::starting_at(1)
    }
}
