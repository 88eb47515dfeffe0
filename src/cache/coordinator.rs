//! Read-Through Coordinator
//!
//! Serves a fresh cached payload when one exists, otherwise runs the fallback
//! computation exactly once per key, no matter how many callers miss at the
//! same time, and writes the result back for `ttl`.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, warn};

use crate::cache::codec;
use crate::cache::slot::{Claim, SlotGuard, SlotTable};
use crate::cache::stats::{CoordinatorCounters, CoordinatorStats};
use crate::cache::{MemoryStore, PayloadStore};
use crate::error::{CacheError, Result};

// == Read Through ==
/// Cloneable handle coordinating cache lookups and coalesced computations.
pub struct ReadThrough<S: PayloadStore = MemoryStore> {
    store: Arc<S>,
    slots: Arc<SlotTable>,
    counters: Arc<CoordinatorCounters>,
    compute_timeout: Option<Duration>,
}

impl<S: PayloadStore> Clone for ReadThrough<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            slots: Arc::clone(&self.slots),
            counters: Arc::clone(&self.counters),
            compute_timeout: self.compute_timeout,
        }
    }
}

impl ReadThrough<MemoryStore> {
    /// Coordinator over a fresh in-memory store.
    pub fn in_memory(max_entries: usize) -> Self {
        Self::new(Arc::new(MemoryStore::new(max_entries)))
    }
}

impl<S: PayloadStore> ReadThrough<S> {
    // == Constructor ==
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            slots: Arc::new(SlotTable::new()),
            counters: Arc::new(CoordinatorCounters::default()),
            compute_timeout: None,
        }
    }

    /// Bounds every leader computation by `timeout`.
    pub fn with_compute_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.compute_timeout = timeout;
        self
    }

    /// The underlying store.
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Coordinator activity counters.
    pub fn stats(&self) -> CoordinatorStats {
        self.counters.snapshot(self.slots.in_flight())
    }

    // == Get Or Compute ==
    /// Hydrates `target` from the cache, or from `compute` on a miss.
    ///
    /// `compute` does not fill `target` in place: it produces a fresh value,
    /// which is stored and then replaces `target`. Waiters coalesced onto the
    /// same computation get a decoded copy of that value. `target` is only
    /// written when the call succeeds; on any error it keeps its previous
    /// contents.
    pub async fn get_or_compute<T, F, Fut>(
        &self,
        key: &str,
        ttl: Duration,
        target: &mut T,
        compute: F,
    ) -> Result<()>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = anyhow::Result<T>>,
    {
        *target = self.fetch(key, ttl, compute).await?;
        Ok(())
    }

    // == Fetch ==
    /// Like [`get_or_compute`](Self::get_or_compute) but returns the value.
    ///
    /// A payload that fails to decode on a hit is reported as
    /// [`CacheError::Serialization`]; it is not recomputed.
    pub async fn fetch<T, F, Fut>(&self, key: &str, ttl: Duration, compute: F) -> Result<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = anyhow::Result<T>>,
    {
        if key.is_empty() {
            return Err(CacheError::InvalidRequest(
                "Cache key cannot be empty".to_string(),
            ));
        }

        if let Some(payload) = self.lookup(key) {
            debug!(key, "Cache hit");
            return codec::decode(&payload);
        }

        match self.slots.claim(key) {
            Claim::Waiter(waiter) => {
                self.counters.record_coalesced();
                debug!(key, "Waiting on in-flight computation");
                match waiter.wait().await {
                    Some(Ok(payload)) => codec::decode(&payload),
                    Some(Err(err)) => Err(err),
                    None => Err(CacheError::Cancelled(format!(
                        "computation for '{}' was abandoned",
                        key
                    ))),
                }
            }
            Claim::Leader(guard) => self.lead(guard, key, ttl, compute).await,
        }
    }

    // == Invalidate ==
    /// Drops any stored entry for `key`. Returns whether one existed.
    pub fn invalidate(&self, key: &str) -> Result<bool> {
        self.store.delete(key)
    }

    async fn lead<T, F, Fut>(
        &self,
        guard: SlotGuard<'_>,
        key: &str,
        ttl: Duration,
        compute: F,
    ) -> Result<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = anyhow::Result<T>>,
    {
        // The previous leader may have written back between our miss and our claim
        if let Some(payload) = self.lookup(key) {
            debug!(key, "Entry stored while claiming slot");
            let value = codec::decode(&payload);
            guard.resolve(Ok(payload));
            return value;
        }

        debug!(key, "Cache miss, computing");
        self.counters.record_computation();

        let outcome = self
            .run(key, compute)
            .await
            .and_then(|value| codec::encode(&value).map(|payload| (value, payload)));

        match outcome {
            Ok((value, payload)) => {
                let payload: Arc<[u8]> = payload.into();
                match self.store.store(key, Arc::clone(&payload), ttl) {
                    Ok(()) => debug!(key, ttl_secs = ttl.as_secs(), "Stored computed result"),
                    Err(err) => {
                        warn!(key, error = %err, "Could not write result back to cache")
                    }
                }
                guard.resolve(Ok(payload));
                Ok(value)
            }
            Err(err) => {
                self.counters.record_failure();
                warn!(key, error = %err, "Computation failed, nothing cached");
                guard.resolve(Err(err.clone()));
                Err(err)
            }
        }
    }

    async fn run<T, F, Fut>(&self, key: &str, compute: F) -> Result<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = anyhow::Result<T>>,
    {
        let computation = compute();
        match self.compute_timeout {
            Some(after) => match tokio::time::timeout(after, computation).await {
                Ok(result) => result.map_err(CacheError::compute),
                Err(_) => Err(CacheError::ComputeTimeout {
                    key: key.to_string(),
                    after,
                }),
            },
            None => computation.await.map_err(CacheError::compute),
        }
    }

    /// Store faults are downgraded to a miss so an unavailable cache never
    /// takes the feature down with it.
    fn lookup(&self, key: &str) -> Option<Arc<[u8]>> {
        match self.store.lookup(key) {
            Ok(payload) => payload,
            Err(err) => {
                warn!(key, error = %err, "Cache lookup failed, treating as miss");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use serde::Deserialize;
    use tokio::sync::{oneshot, Barrier};
    use tokio_test::{assert_err, assert_ok};

    const TTL: Duration = Duration::from_secs(30 * 60);

    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    struct Hits {
        items: Vec<String>,
    }

    fn hits(items: &[&str]) -> Hits {
        Hits {
            items: items.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Store that fails every operation.
    struct BrokenStore;

    impl PayloadStore for BrokenStore {
        fn lookup(&self, _key: &str) -> Result<Option<Arc<[u8]>>> {
            Err(CacheError::StoreFault("backend down".into()))
        }

        fn store(&self, _key: &str, _payload: Arc<[u8]>, _ttl: Duration) -> Result<()> {
            Err(CacheError::StoreFault("backend down".into()))
        }

        fn delete(&self, _key: &str) -> Result<bool> {
            Err(CacheError::StoreFault("backend down".into()))
        }
    }

    #[tokio::test]
    async fn test_miss_then_hit() {
        let cache = ReadThrough::in_memory(100);
        let calls = AtomicUsize::new(0);

        for _ in 0..3 {
            let mut target = Hits::default();
            cache
                .get_or_compute("k", TTL, &mut target, || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(hits(&["a", "b"]))
                })
                .await
                .unwrap();
            assert_eq!(target, hits(&["a", "b"]));
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.stats().computations, 1);
        assert_eq!(cache.store().stats().hits, 2);
    }

    #[tokio::test]
    async fn test_empty_key_rejected_without_compute() {
        let cache = ReadThrough::in_memory(100);
        let calls = AtomicUsize::new(0);

        let result: Result<Hits> = cache
            .fetch("", TTL, || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(Hits::default())
            })
            .await;

        assert!(matches!(result, Err(CacheError::InvalidRequest(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(cache.store().is_empty());
    }

    #[tokio::test]
    async fn test_failure_is_not_cached() {
        let cache = ReadThrough::in_memory(100);
        let mut target = hits(&["previous"]);

        let result = cache
            .get_or_compute("k", TTL, &mut target, || async {
                Err(anyhow::anyhow!("database unavailable"))
            })
            .await;

        assert!(matches!(result, Err(CacheError::ComputeFailure(_))));
        assert_eq!(target, hits(&["previous"]), "Target must be left untouched");
        assert!(cache.store().is_empty());
        assert_eq!(cache.stats().failures, 1);

        // The next call retries the computation
        let value: Hits = cache.fetch("k", TTL, || async { Ok(hits(&["x"])) }).await.unwrap();
        assert_eq!(value, hits(&["x"]));
        assert_eq!(cache.stats().computations, 2);
    }

    #[tokio::test]
    async fn test_decode_failure_is_loud() {
        let cache = ReadThrough::in_memory(100);
        cache
            .store()
            .store("k", Arc::from(&b"{\"unexpected\":true"[..]), TTL)
            .unwrap();

        let calls = AtomicUsize::new(0);
        let result: Result<Hits> = cache
            .fetch("k", TTL, || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(Hits::default())
            })
            .await;

        assert!(matches!(result, Err(CacheError::Serialization(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_store_fault_falls_through_to_compute() {
        let cache = ReadThrough::new(Arc::new(BrokenStore));
        let calls = AtomicUsize::new(0);

        for _ in 0..2 {
            let value: Hits = assert_ok!(
                cache
                    .fetch("k", TTL, || async {
                        calls.fetch_add(1, Ordering::SeqCst);
                        Ok(hits(&["fresh"]))
                    })
                    .await
            );
            assert_eq!(value, hits(&["fresh"]));
        }

        // Nothing could be stored, so every call computes
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_err!(cache.invalidate("k"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_misses_compute_once() {
        const CALLERS: usize = 16;
        let cache = ReadThrough::in_memory(100);
        let calls = Arc::new(AtomicUsize::new(0));
        let barrier = Arc::new(Barrier::new(CALLERS));

        let mut handles = Vec::new();
        for _ in 0..CALLERS {
            let cache = cache.clone();
            let calls = Arc::clone(&calls);
            let barrier = Arc::clone(&barrier);
            handles.push(tokio::spawn(async move {
                barrier.wait().await;
                cache
                    .fetch("popular", TTL, || async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(100)).await;
                        Ok(hits(&["one"]))
                    })
                    .await
            }));
        }

        for handle in handles {
            let value: Hits = handle.await.unwrap().unwrap();
            assert_eq!(value, hits(&["one"]));
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.stats().computations, 1);
        assert_eq!(cache.stats().in_flight, 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_failure_broadcast_to_waiters() {
        const CALLERS: usize = 8;
        let cache = ReadThrough::in_memory(100);
        let calls = Arc::new(AtomicUsize::new(0));
        let barrier = Arc::new(Barrier::new(CALLERS));

        let mut handles = Vec::new();
        for _ in 0..CALLERS {
            let cache = cache.clone();
            let calls = Arc::clone(&calls);
            let barrier = Arc::clone(&barrier);
            handles.push(tokio::spawn(async move {
                barrier.wait().await;
                cache
                    .fetch::<Hits, _, _>("flaky", TTL, || async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(100)).await;
                        Err(anyhow::anyhow!("search backend exploded"))
                    })
                    .await
            }));
        }

        let mut failures = Vec::new();
        for handle in handles {
            match handle.await.unwrap() {
                Err(CacheError::ComputeFailure(err)) => failures.push(err),
                other => panic!("expected compute failure, got {:?}", other),
            }
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(failures.iter().all(|err| Arc::ptr_eq(err, &failures[0])));
        assert!(cache.store().is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_distinct_keys_do_not_block() {
        let cache = ReadThrough::in_memory(100);
        let (tx, rx) = oneshot::channel::<()>();

        // Key "a" cannot finish until key "b" has computed
        let slow = {
            let cache = cache.clone();
            tokio::spawn(async move {
                cache
                    .fetch("a", TTL, || async move {
                        rx.await?;
                        Ok(hits(&["a"]))
                    })
                    .await
            })
        };

        while cache.stats().in_flight == 0 {
            tokio::task::yield_now().await;
        }

        let b: Hits = cache
            .fetch("b", TTL, || async move {
                let _ = tx.send(());
                Ok(hits(&["b"]))
            })
            .await
            .unwrap();
        assert_eq!(b, hits(&["b"]));

        let a: Hits = tokio::time::timeout(Duration::from_secs(5), slow)
            .await
            .expect("key a should not be blocked")
            .unwrap()
            .unwrap();
        assert_eq!(a, hits(&["a"]));
        assert_eq!(cache.stats().computations, 2);
    }

    #[tokio::test]
    async fn test_cancelled_leader_releases_waiters() {
        let cache = ReadThrough::in_memory(100);

        let leader = {
            let cache = cache.clone();
            tokio::spawn(async move {
                cache
                    .fetch("stuck", TTL, || async {
                        std::future::pending::<()>().await;
                        Ok(Hits::default())
                    })
                    .await
            })
        };

        while cache.stats().in_flight == 0 {
            tokio::task::yield_now().await;
        }

        let waiter = {
            let cache = cache.clone();
            tokio::spawn(async move {
                cache
                    .fetch("stuck", TTL, || async { Ok(hits(&["unused"])) })
                    .await
            })
        };

        while cache.stats().coalesced == 0 {
            tokio::task::yield_now().await;
        }

        leader.abort();

        let result = waiter.await.unwrap();
        assert!(matches!(result, Err(CacheError::Cancelled(_))));
        assert_eq!(cache.stats().in_flight, 0);
        assert!(cache.store().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_compute_timeout() {
        let cache =
            ReadThrough::in_memory(100).with_compute_timeout(Some(Duration::from_secs(2)));

        let result: Result<Hits> = cache
            .fetch("slow", TTL, || async {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Ok(Hits::default())
            })
            .await;

        assert!(matches!(result, Err(CacheError::ComputeTimeout { .. })));
        assert!(cache.store().is_empty());
        assert_eq!(cache.stats().failures, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_compute_timeout_reaches_waiters() {
        const WAITERS: usize = 3;
        let cache =
            ReadThrough::in_memory(100).with_compute_timeout(Some(Duration::from_secs(2)));

        let spawn_fetch = |cache: ReadThrough| {
            tokio::spawn(async move {
                cache
                    .fetch("slow", TTL, || async {
                        tokio::time::sleep(Duration::from_secs(60)).await;
                        Ok(Hits::default())
                    })
                    .await
            })
        };

        let leader = spawn_fetch(cache.clone());
        while cache.stats().in_flight == 0 {
            tokio::task::yield_now().await;
        }

        let waiters: Vec<_> = (0..WAITERS).map(|_| spawn_fetch(cache.clone())).collect();
        while cache.stats().coalesced < WAITERS as u64 {
            tokio::task::yield_now().await;
        }

        let result: Result<Hits> = leader.await.unwrap();
        assert!(matches!(result, Err(CacheError::ComputeTimeout { .. })));
        for waiter in waiters {
            let result: Result<Hits> = waiter.await.unwrap();
            assert!(matches!(result, Err(CacheError::ComputeTimeout { .. })));
        }

        let stats = cache.stats();
        assert_eq!(stats.computations, 1);
        assert_eq!(stats.failures, 1);
        assert_eq!(stats.in_flight, 0);
        assert!(cache.store().is_empty());
    }

    #[tokio::test]
    async fn test_write_back_fault_still_serves_waiters() {
        const WAITERS: usize = 4;
        let cache = ReadThrough::new(Arc::new(BrokenStore));
        let calls = Arc::new(AtomicUsize::new(0));
        let (tx, rx) = oneshot::channel::<()>();

        let leader = {
            let cache = cache.clone();
            let calls = Arc::clone(&calls);
            tokio::spawn(async move {
                cache
                    .fetch("k", TTL, || async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        rx.await?;
                        Ok(hits(&["fresh"]))
                    })
                    .await
            })
        };
        while cache.stats().in_flight == 0 {
            tokio::task::yield_now().await;
        }

        let waiters: Vec<_> = (0..WAITERS)
            .map(|_| {
                let cache = cache.clone();
                let calls = Arc::clone(&calls);
                tokio::spawn(async move {
                    cache
                        .fetch("k", TTL, || async move {
                            calls.fetch_add(1, Ordering::SeqCst);
                            Ok(hits(&["unused"]))
                        })
                        .await
                })
            })
            .collect();
        while cache.stats().coalesced < WAITERS as u64 {
            tokio::task::yield_now().await;
        }
        tx.send(()).unwrap();

        let value: Hits = assert_ok!(leader.await.unwrap());
        assert_eq!(value, hits(&["fresh"]));
        for waiter in waiters {
            let value: Hits = assert_ok!(waiter.await.unwrap());
            assert_eq!(value, hits(&["fresh"]));
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_err!(cache.store().lookup("k"));
        assert_eq!(cache.stats().failures, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_entry_expires_after_ttl() {
        let cache = ReadThrough::in_memory(100);
        let calls = AtomicUsize::new(0);
        let compute = || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(hits(&["v"]))
        };

        let _: Hits = cache.fetch("k", TTL, compute).await.unwrap();
        tokio::time::advance(TTL - Duration::from_secs(1)).await;
        let _: Hits = cache.fetch("k", TTL, compute).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        tokio::time::advance(Duration::from_secs(2)).await;
        let _: Hits = cache.fetch("k", TTL, compute).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_invalidate_forces_recompute() {
        let cache = ReadThrough::in_memory(100);
        let _: Hits = cache.fetch("k", TTL, || async { Ok(hits(&["old"])) }).await.unwrap();

        assert!(cache.invalidate("k").unwrap());
        assert!(!cache.invalidate("k").unwrap());

        let value: Hits = cache.fetch("k", TTL, || async { Ok(hits(&["new"])) }).await.unwrap();
        assert_eq!(value, hits(&["new"]));
    }
}
