//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with freshness tracking.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

// == Cache Entry ==
/// A stored payload plus the time it was stored and how long it stays fresh.
///
/// Entries are immutable once stored; a re-store replaces the whole entry.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// Serialized payload, shared so lookups don't copy it
    pub payload: Arc<[u8]>,
    /// When the entry was stored
    pub stored_at: Instant,
    /// Freshness duration
    pub ttl: Duration,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates a new entry stamped with the current time.
    pub fn new(payload: Arc<[u8]>, ttl: Duration) -> Self {
        Self {
            payload,
            stored_at: Instant::now(),
            ttl,
        }
    }

    // == Is Fresh ==
    /// Returns true while `now < stored_at + ttl`.
    ///
    /// Boundary condition: once the TTL has fully elapsed the entry is stale,
    /// so a zero TTL is never fresh.
    pub fn is_fresh(&self) -> bool {
        self.is_fresh_at(Instant::now())
    }

    /// Freshness evaluated against an explicit instant.
    pub fn is_fresh_at(&self, now: Instant) -> bool {
        match self.stored_at.checked_add(self.ttl) {
            Some(deadline) => now < deadline,
            // TTL too large to represent: treat as never expiring
            None => true,
        }
    }
}
