//! Computation Slots
//!
//! Per-key in-flight markers. The first caller to claim a key becomes its
//! leader; later callers attach to the same slot and receive the leader's
//! outcome when it resolves. Slot creation and removal both go through the
//! key's shard lock in the slot map.

use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tokio::sync::watch;

use crate::error::Result;

/// What a resolved slot hands to its waiters: the stored payload or the
/// leader's failure.
pub(crate) type SlotOutcome = Result<Arc<[u8]>>;

type SlotSignal = watch::Receiver<Option<SlotOutcome>>;

// == Slot Table ==
#[derive(Debug, Default)]
pub(crate) struct SlotTable {
    slots: DashMap<String, SlotSignal>,
}

/// Result of trying to claim a key.
pub(crate) enum Claim<'a> {
    Leader(SlotGuard<'a>),
    Waiter(SlotWaiter),
}

impl SlotTable {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Atomically joins the existing slot for `key` or creates one.
    pub(crate) fn claim(&self, key: &str) -> Claim<'_> {
        match self.slots.entry(key.to_string()) {
            Entry::Occupied(slot) => Claim::Waiter(SlotWaiter {
                signal: slot.get().clone(),
            }),
            Entry::Vacant(vacant) => {
                let (tx, rx) = watch::channel(None);
                vacant.insert(rx);
                Claim::Leader(SlotGuard {
                    table: self,
                    key: key.to_string(),
                    tx: Some(tx),
                })
            }
        }
    }

    /// Number of keys with a computation in flight.
    pub(crate) fn in_flight(&self) -> usize {
        self.slots.len()
    }

    fn release(&self, key: &str) {
        self.slots.remove(key);
    }
}

// == Slot Guard ==
/// Held by the leader. Dropping it without resolving (the leader's future was
/// cancelled) frees the slot and wakes waiters with no outcome.
pub(crate) struct SlotGuard<'a> {
    table: &'a SlotTable,
    key: String,
    tx: Option<watch::Sender<Option<SlotOutcome>>>,
}

impl SlotGuard<'_> {
    /// Frees the slot and broadcasts `outcome` to every attached waiter.
    pub(crate) fn resolve(mut self, outcome: SlotOutcome) {
        if let Some(tx) = self.tx.take() {
            self.table.release(&self.key);
            tx.send_replace(Some(outcome));
        }
    }
}

impl Drop for SlotGuard<'_> {
    fn drop(&mut self) {
        if self.tx.take().is_some() {
            self.table.release(&self.key);
        }
    }
}

// == Slot Waiter ==
pub(crate) struct SlotWaiter {
    signal: SlotSignal,
}

impl SlotWaiter {
    /// Waits for the leader. `None` means the leader went away without an
    /// outcome.
    pub(crate) async fn wait(mut self) -> Option<SlotOutcome> {
        let outcome = match self.signal.wait_for(Option::is_some).await {
            Ok(outcome) => outcome.clone(),
            Err(_) => None,
        };
        outcome
    }
}
