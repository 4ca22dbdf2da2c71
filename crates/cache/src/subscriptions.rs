//! Subscription registry and the scoped subscription handle.
//!
//! Each subscriber owns an unbounded channel. Notifying enqueues the new
//! snapshot on every channel of the key, in subscription order, while the
//! store lock is held, so per-key ordering matches transition order and a
//! subscriber leaving mid-dispatch cannot disturb the others.

use std::collections::HashMap;
use std::fmt;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Instant;

use futures_core::Stream;
use stockroom_core::cache::CacheKey;
use tokio::sync::mpsc;

use crate::entry::Snapshot;
use crate::store::{lock, SharedStore};

/// Identifies one subscription for its whole life.
pub type SubscriptionId = u64;

#[derive(Debug)]
struct Observer {
    id: SubscriptionId,
    tx: mpsc::UnboundedSender<Snapshot>,
}

/// Tracks which observers watch which key.
#[derive(Debug, Default)]
pub(crate) struct SubscriptionRegistry {
    next_id: SubscriptionId,
    observers: HashMap<CacheKey, Vec<Observer>>,
}

impl SubscriptionRegistry {
    /// Registers an observer of `key` and hands it `current` as its first snapshot.
    pub fn subscribe(
        &mut self,
        key: &CacheKey,
        current: Snapshot,
    ) -> (SubscriptionId, mpsc::UnboundedReceiver<Snapshot>) {
        self.next_id += 1;
        let id = self.next_id;
        let (tx, rx) = mpsc::unbounded_channel();
        // The receiver is alive, so this cannot fail.
        let _ = tx.send(current);
        self.observers
            .entry(key.clone())
            .or_default()
            .push(Observer { id, tx });
        (id, rx)
    }

    /// Removes an observer. Returns false if it was not registered.
    pub fn unsubscribe(&mut self, key: &CacheKey, id: SubscriptionId) -> bool {
        let Some(observers) = self.observers.get_mut(key) else {
            return false;
        };
        let before = observers.len();
        observers.retain(|o| o.id != id);
        let removed = observers.len() != before;
        if observers.is_empty() {
            self.observers.remove(key);
        }
        removed
    }

    /// Delivers `snapshot` to every observer of `key`. Returns how many received it.
    pub fn notify(&self, key: &CacheKey, snapshot: &Snapshot) -> usize {
        let Some(observers) = self.observers.get(key) else {
            return 0;
        };
        observers
            .iter()
            .filter(|o| o.tx.send(snapshot.clone()).is_ok())
            .count()
    }

    pub fn observer_count(&self, key: &CacheKey) -> usize {
        self.observers.get(key).map_or(0, Vec::len)
    }

    pub fn remove_key(&mut self, key: &CacheKey) {
        self.observers.remove(key);
    }
}

/// A live interest in one cache key.
///
/// Yields a snapshot on every transition of the entry, starting with its
/// state at subscription time. Dropping the handle unsubscribes.
pub struct Subscription {
    store: SharedStore,
    key: CacheKey,
    id: SubscriptionId,
    rx: mpsc::UnboundedReceiver<Snapshot>,
}

impl Subscription {
    pub(crate) fn new(
        store: SharedStore,
        key: CacheKey,
        id: SubscriptionId,
        rx: mpsc::UnboundedReceiver<Snapshot>,
    ) -> Self {
        Self { store, key, id, rx }
    }

    pub fn key(&self) -> &CacheKey {
        &self.key
    }

    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Waits for the next snapshot.
    pub async fn next(&mut self) -> Option<Snapshot> {
        self.rx.recv().await
    }

    /// Returns the next snapshot if one is already queued.
    pub fn try_next(&mut self) -> Option<Snapshot> {
        self.rx.try_recv().ok()
    }

    /// Stops observing the key.
    pub fn unsubscribe(self) {
        drop(self);
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        lock(&self.store).unsubscribe(&self.key, self.id, Instant::now());
    }
}

impl Stream for Subscription {
    type Item = Snapshot;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Snapshot>> {
        self.rx.poll_recv(cx)
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("key", &self.key)
            .field("id", &self.id)
            .finish()
    }
}
