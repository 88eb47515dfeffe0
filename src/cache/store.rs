//! Cache Store Module
//!
//! Expiring key to payload storage. Entries live in a sharded concurrent map,
//! so operations on different keys never wait on each other, and operations on
//! the same key are linearizable through that key's shard lock.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::time::Instant;
use tracing::debug;

use crate::cache::stats::StoreCounters;
use crate::cache::{CacheEntry, CacheStats, MAX_KEY_LENGTH, MAX_PAYLOAD_SIZE};
use crate::error::{CacheError, Result};

// == Payload Store Trait ==
/// Storage operations the read-through coordinator depends on.
pub trait PayloadStore: Send + Sync + 'static {
    /// Returns the payload only if an entry exists and is still fresh.
    fn lookup(&self, key: &str) -> Result<Option<Arc<[u8]>>>;

    /// Inserts or replaces the entry for `key`, resetting its stored time.
    fn store(&self, key: &str, payload: Arc<[u8]>, ttl: Duration) -> Result<()>;

    /// Removes the entry for `key`. Returns whether one was present.
    fn delete(&self, key: &str) -> Result<bool>;
}

enum Probe {
    Hit(Arc<[u8]>),
    Stale,
    Absent,
}

// == Memory Store ==
/// In-process cache storage with lazy expiry and a capacity bound.
#[derive(Debug)]
pub struct MemoryStore {
    /// Key to entry storage
    entries: DashMap<String, CacheEntry>,
    /// Performance counters
    counters: StoreCounters,
    /// Maximum number of entries allowed
    max_entries: usize,
}

impl MemoryStore {
    // == Constructor ==
    /// Creates a new store holding at most `max_entries` entries.
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: DashMap::new(),
            counters: StoreCounters::default(),
            max_entries,
        }
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        self.counters.snapshot(self.entries.len())
    }

    // == Cleanup Expired ==
    /// Removes all stale entries. Returns the number removed.
    pub fn cleanup_expired(&self) -> usize {
        let now = Instant::now();
        let mut removed = 0;
        self.entries.retain(|_, entry| {
            let keep = entry.is_fresh_at(now);
            if !keep {
                removed += 1;
            }
            keep
        });
        self.counters.record_expirations(removed as u64);
        removed
    }

    // == Length ==
    /// Returns the current number of entries, stale ones included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    // == Is Empty ==
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Frees room for one new entry: stale entries go first, then the entry
    /// stored longest ago.
    ///
    /// The bound is soft under concurrent inserts of distinct new keys, since
    /// the length check and the insert are not one atomic step.
    fn make_room(&self) -> Result<()> {
        if self.max_entries == 0 {
            return Err(CacheError::StoreFault(
                "Cache has no capacity configured".to_string(),
            ));
        }

        if self.cleanup_expired() > 0 && self.entries.len() < self.max_entries {
            return Ok(());
        }

        let oldest = self
            .entries
            .iter()
            .min_by_key(|entry| entry.value().stored_at)
            .map(|entry| entry.key().clone());

        match oldest {
            Some(key) => {
                if self.entries.remove(&key).is_some() {
                    self.counters.record_eviction();
                    debug!(key = %key, "Evicted oldest cache entry");
                }
                Ok(())
            }
            None => Ok(()),
        }
    }
}

impl PayloadStore for MemoryStore {
    // == Lookup ==
    /// A stale entry counts as a miss and is dropped on the spot.
    fn lookup(&self, key: &str) -> Result<Option<Arc<[u8]>>> {
        let probe = match self.entries.get(key) {
            Some(entry) if entry.is_fresh() => Probe::Hit(entry.payload.clone()),
            Some(_) => Probe::Stale,
            None => Probe::Absent,
        };

        match probe {
            Probe::Hit(payload) => {
                self.counters.record_hit();
                Ok(Some(payload))
            }
            Probe::Stale => {
                // A concurrent store may already have replaced the stale entry
                if self
                    .entries
                    .remove_if(key, |_, entry| !entry.is_fresh())
                    .is_some()
                {
                    self.counters.record_expirations(1);
                }
                self.counters.record_miss();
                Ok(None)
            }
            Probe::Absent => {
                self.counters.record_miss();
                Ok(None)
            }
        }
    }

    // == Store ==
    /// Stores a payload under `key` for `ttl`.
    ///
    /// If the key already exists the entry is replaced wholesale. If the store
    /// is at capacity and the key is new, room is made first.
    fn store(&self, key: &str, payload: Arc<[u8]>, ttl: Duration) -> Result<()> {
        if key.is_empty() {
            return Err(CacheError::InvalidRequest("Key cannot be empty".to_string()));
        }

        if key.len() > MAX_KEY_LENGTH {
            return Err(CacheError::InvalidRequest(format!(
                "Key exceeds maximum length of {} bytes",
                MAX_KEY_LENGTH
            )));
        }

        if payload.len() > MAX_PAYLOAD_SIZE {
            return Err(CacheError::InvalidRequest(format!(
                "Payload exceeds maximum size of {} bytes",
                MAX_PAYLOAD_SIZE
            )));
        }

        if !self.entries.contains_key(key) && self.entries.len() >= self.max_entries {
            self.make_room()?;
        }

        self.entries
            .insert(key.to_string(), CacheEntry::new(payload, ttl));

        Ok(())
    }

    // == Delete ==
    fn delete(&self, key: &str) -> Result<bool> {
        Ok(self.entries.remove(key).is_some())
    }
}
