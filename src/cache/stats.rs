//! Cache Statistics Module
//!
//! Tracks store and coordinator counters with atomics so concurrent callers
//! never serialize on a stats lock.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

// == Store Counters ==
/// Live counters owned by the Cache Store.
#[derive(Debug, Default)]
pub struct StoreCounters {
    hits: AtomicU64,
    misses: AtomicU64,
    expirations: AtomicU64,
    evictions: AtomicU64,
}

impl StoreCounters {
    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    /// Entries dropped because they went stale (lazy or swept).
    pub fn record_expirations(&self, count: u64) {
        self.expirations.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_eviction(&self) {
        self.evictions.fetch_add(1, Ordering::Relaxed);
    }

    /// Takes a point-in-time snapshot.
    pub fn snapshot(&self, total_entries: usize) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            expirations: self.expirations.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            total_entries,
        }
    }
}

// == Cache Stats ==
/// Snapshot of Cache Store performance metrics.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CacheStats {
    /// Lookups that returned a fresh entry
    pub hits: u64,
    /// Lookups on absent or stale keys
    pub misses: u64,
    /// Entries removed because they went stale
    pub expirations: u64,
    /// Entries evicted to make room
    pub evictions: u64,
    /// Current number of entries in the store
    pub total_entries: usize,
}

impl CacheStats {
    // == Hit Rate ==
    /// Calculates the cache hit rate.
    ///
    /// Returns hits / (hits + misses), or 0.0 if no lookups have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

// == Coordinator Counters ==
/// Live counters owned by the read-through coordinator.
#[derive(Debug, Default)]
pub struct CoordinatorCounters {
    computations: AtomicU64,
    coalesced: AtomicU64,
    failures: AtomicU64,
}

impl CoordinatorCounters {
    pub fn record_computation(&self) {
        self.computations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_coalesced(&self) {
        self.coalesced.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failure(&self) {
        self.failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self, in_flight: usize) -> CoordinatorStats {
        CoordinatorStats {
            computations: self.computations.load(Ordering::Relaxed),
            coalesced: self.coalesced.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
            in_flight,
        }
    }
}

/// Snapshot of coordinator activity.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CoordinatorStats {
    /// Fallback computations started by a leader
    pub computations: u64,
    /// Calls that waited on another caller's computation
    pub coalesced: u64,
    /// Computations that ended in an error
    pub failures: u64,
    /// Keys with a computation currently running
    pub in_flight: usize,
}
