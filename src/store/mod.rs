//! View-state store.
//!
//! Holds the latest [`Snapshot`] and pushes every new one to its
//! subscribers. Delivery is synchronous and in subscription order; a
//! subscriber that panics is logged and skipped, and the rest still
//! receive the snapshot.

use crate::orchestrator::Snapshot;
use dashmap::DashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock, Weak};

type SnapshotCallback = Arc<dyn Fn(&Snapshot) + Send + Sync>;

/// Latest snapshot plus the set of subscribers to notify on change.
///
/// Readers only: publication is reserved to the orchestrator.
///
/// ```compile_fail
/// use oiwatch::orchestrator::Snapshot;
/// use oiwatch::store::Store;
///
/// Store::new().publish(Snapshot::empty());
/// ```
pub struct Store {
    current: RwLock<Arc<Snapshot>>,
    subscribers: DashMap<u64, SnapshotCallback>,
    next_id: AtomicU64,
    /// Serializes deliveries so every subscriber sees versions in order
    delivery: Mutex<()>,
}

impl Store {
    pub fn new() -> Self {
        Self::with_snapshot(Snapshot::empty())
    }

    pub fn with_snapshot(snapshot: Snapshot) -> Self {
        Self {
            current: RwLock::new(Arc::new(snapshot)),
            subscribers: DashMap::new(),
            next_id: AtomicU64::new(1),
            delivery: Mutex::new(()),
        }
    }

    /// Return the current snapshot.
    pub fn get(&self) -> Arc<Snapshot> {
        let current = self.current.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&current)
    }

    /// Register a callback for snapshot changes.
    ///
    /// The callback receives the current snapshot before this returns, then
    /// every later one. Delivery runs on the publishing poller's task while
    /// the orchestrator holds its slot lock, so the callback must not call
    /// `subscribe` or [`Orchestrator::register`](crate::orchestrator::Orchestrator::register);
    /// either would deadlock.
    pub fn subscribe<F>(self: &Arc<Self>, callback: F) -> Subscription
    where
        F: Fn(&Snapshot) + Send + Sync + 'static,
    {
        let _delivery = self.delivery.lock().unwrap_or_else(PoisonError::into_inner);

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let callback: SnapshotCallback = Arc::new(callback);
        self.subscribers.insert(id, Arc::clone(&callback));

        let snapshot = self.get();
        deliver(id, &callback, &snapshot);

        tracing::debug!(subscriber_id = id, version = snapshot.version, "Subscriber added");

        Subscription {
            id,
            store: Arc::downgrade(self),
        }
    }

    /// Replace the current snapshot and notify every subscriber.
    ///
    /// Only the orchestrator's hub publishes, so versions stay monotonic.
    pub(crate) fn publish(&self, snapshot: Snapshot) -> Arc<Snapshot> {
        let _delivery = self.delivery.lock().unwrap_or_else(PoisonError::into_inner);

        let snapshot = Arc::new(snapshot);
        {
            let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
            *current = Arc::clone(&snapshot);
        }

        let mut targets: Vec<(u64, SnapshotCallback)> = self
            .subscribers
            .iter()
            .map(|entry| (*entry.key(), Arc::clone(entry.value())))
            .collect();
        targets.sort_by_key(|(id, _)| *id);

        for (id, callback) in &targets {
            // Skip anyone who unsubscribed during this round
            if self.subscribers.contains_key(id) {
                deliver(*id, callback, &snapshot);
            }
        }

        tracing::trace!(
            version = snapshot.version,
            subscribers = targets.len(),
            "Snapshot published"
        );

        snapshot
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    fn unsubscribe(&self, id: u64) {
        if self.subscribers.remove(&id).is_some() {
            tracing::debug!(subscriber_id = id, "Subscriber removed");
        }
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

fn deliver(id: u64, callback: &SnapshotCallback, snapshot: &Snapshot) {
    if panic::catch_unwind(AssertUnwindSafe(|| callback(snapshot))).is_err() {
        tracing::error!(
            subscriber_id = id,
            version = snapshot.version,
            "Subscriber panicked during delivery"
        );
    }
}

/// Active subscription; unsubscribes when dropped.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    id: u64,
    store: Weak<Store>,
}

impl Subscription {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Stop receiving snapshots. Idempotent.
    pub fn unsubscribe(&self) {
        if let Some(store) = self.store.upgrade() {
            store.unsubscribe(self.id);
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}
