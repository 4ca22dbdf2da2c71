//! Entry store: cache entries, the tag index and the subscription registry.
//!
//! All three live behind one mutex so an entry's status, its tag index rows
//! and the notifications for a transition change in a single critical
//! section. Nothing in here awaits.

use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use serde_json::Value;
use stockroom_core::cache::{CacheError, CacheKey, Result, Status, TagSet, TransportError};
use tokio::sync::{mpsc, watch};

use crate::entry::{CacheEntry, InFlight, PendingFetch, Snapshot};
use crate::policy::QueryPolicy;
use crate::query::QueryDef;
use crate::subscriptions::{SubscriptionId, SubscriptionRegistry};
use crate::tag_index::TagIndex;

pub(crate) type SharedStore = Arc<Mutex<EntryStore>>;

/// Locks the store, recovering from a poisoned mutex.
pub(crate) fn lock(store: &SharedStore) -> MutexGuard<'_, EntryStore> {
    store.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Data carried by a transition.
#[derive(Debug)]
pub(crate) enum Payload {
    None,
    Value { value: Value, tags: TagSet },
    Error(TransportError),
}

/// Owns every cache entry and the structures derived from them.
#[derive(Debug)]
pub struct EntryStore {
    entries: HashMap<CacheKey, CacheEntry>,
    tags: TagIndex,
    subscribers: SubscriptionRegistry,
    next_token: u64,
}

impl EntryStore {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
            tags: TagIndex::new(),
            subscribers: SubscriptionRegistry::default(),
            next_token: 0,
        }
    }

    pub fn get(&self, key: &CacheKey) -> Option<&CacheEntry> {
        self.entries.get(key)
    }

    pub fn tags(&self) -> &TagIndex {
        &self.tags
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn observer_count(&self, key: &CacheKey) -> usize {
        self.subscribers.observer_count(key)
    }

    /// Keys affected by invalidating `tags`.
    pub fn keys_tagged(&self, tags: &TagSet) -> BTreeSet<CacheKey> {
        self.tags.lookup(tags)
    }

    /// Returns the entry for `query`, creating it `uninitialized` if absent.
    pub(crate) fn get_or_create(
        &mut self,
        query: &QueryDef,
        policy: QueryPolicy,
        now: Instant,
    ) -> &mut CacheEntry {
        self.entries.entry(query.key().clone()).or_insert_with(|| {
            tracing::trace!(key = %query.key(), "Cache entry created");
            CacheEntry::new(query.clone(), policy, now)
        })
    }

    /// Applies a transition and notifies the key's subscribers.
    pub(crate) fn transition(
        &mut self,
        key: &CacheKey,
        to: Status,
        payload: Payload,
    ) -> Result<Snapshot> {
        self.apply(key, to, payload, true)
    }

    fn apply(
        &mut self,
        key: &CacheKey,
        to: Status,
        payload: Payload,
        notify: bool,
    ) -> Result<Snapshot> {
        let Some(entry) = self.entries.get_mut(key) else {
            return Err(invalid(key, Status::Uninitialized, to));
        };
        let from = entry.status;
        let legal = from.can_transition_to(to)
            && match (to, &payload) {
                (Status::Success, Payload::Value { .. }) => true,
                (Status::Success, _) => false,
                (Status::Error, Payload::Error(_)) => true,
                (Status::Error, _) => false,
                (Status::Stale, _) => entry.value.is_some(),
                _ => true,
            };
        if !legal {
            return Err(invalid(key, from, to));
        }

        match (to, payload) {
            (Status::Success, Payload::Value { value, tags }) => {
                self.tags.replace(key, &entry.tags, &tags);
                entry.tags = tags;
                entry.value = Some(value);
                entry.error = None;
                entry.fetched_at = Some(Instant::now());
                entry.in_flight = None;
            }
            (Status::Error, Payload::Error(error)) => {
                entry.error = Some(error);
                entry.value = None;
                entry.in_flight = None;
            }
            (Status::Stale, _) => {
                entry.in_flight = None;
            }
            _ => {
                entry.error = None;
            }
        }
        entry.status = to;
        let snapshot = entry.snapshot();

        tracing::trace!(%key, %from, %to, "Cache entry transition");
        if notify {
            self.subscribers.notify(key, &snapshot);
        }
        Ok(snapshot)
    }

    /// Stamps a new fetch for `key` and moves it to `loading`.
    ///
    /// An entry that is already loading only gets a new token, which makes
    /// the running fetch obsolete. Revalidating a stale entry in the
    /// background is not announced: subscribers keep the last good value
    /// until the refetch lands.
    pub(crate) fn begin_fetch(&mut self, key: &CacheKey, background: bool) -> Result<PendingFetch> {
        let from = match self.entries.get(key) {
            Some(entry) => entry.status,
            None => return Err(invalid(key, Status::Uninitialized, Status::Loading)),
        };
        if from != Status::Loading {
            let notify = !(from == Status::Stale && background);
            self.apply(key, Status::Loading, Payload::None, notify)?;
        }

        self.next_token += 1;
        let token = self.next_token;
        let (tx, rx) = watch::channel(None);
        let entry = self
            .entries
            .get_mut(key)
            .ok_or_else(|| invalid(key, Status::Uninitialized, Status::Loading))?;
        entry.in_flight = Some(InFlight {
            token,
            background,
            done: rx.clone(),
        });

        Ok(PendingFetch {
            key: key.clone(),
            token,
            query: entry.query.clone(),
            tx,
            rx,
        })
    }

    /// Drops the running fetch of `key` without starting another, so its
    /// response is discarded. A kept value goes back to `stale`.
    pub(crate) fn abandon_fetch(&mut self, key: &CacheKey) -> Result<()> {
        let Some(entry) = self.entries.get_mut(key) else {
            return Ok(());
        };
        entry.in_flight = None;
        if entry.status == Status::Loading && entry.value.is_some() {
            self.transition(key, Status::Stale, Payload::None)?;
        }
        Ok(())
    }

    /// Counts a holder of `key` that does not observe transitions.
    pub(crate) fn acquire(&mut self, key: &CacheKey) {
        if let Some(entry) = self.entries.get_mut(key) {
            entry.subscriber_count += 1;
            entry.last_unsubscribed_at = None;
        }
    }

    /// Releases a holder of `key`. Entries with zero retention go at once.
    pub(crate) fn release(&mut self, key: &CacheKey, now: Instant) {
        let Some(entry) = self.entries.get_mut(key) else {
            return;
        };
        entry.subscriber_count = entry.subscriber_count.saturating_sub(1);
        if entry.subscriber_count > 0 {
            return;
        }
        entry.last_unsubscribed_at = Some(now);
        if entry.policy.retention.is_zero() {
            self.remove(key);
        }
    }

    /// Registers an observer of `query`, counting it as a subscriber.
    pub(crate) fn subscribe(
        &mut self,
        query: &QueryDef,
        policy: QueryPolicy,
        now: Instant,
    ) -> (SubscriptionId, mpsc::UnboundedReceiver<Snapshot>) {
        let current = self.get_or_create(query, policy, now).snapshot();
        self.acquire(query.key());
        self.subscribers.subscribe(query.key(), current)
    }

    pub(crate) fn unsubscribe(&mut self, key: &CacheKey, id: SubscriptionId, now: Instant) {
        if self.subscribers.unsubscribe(key, id) {
            self.release(key, now);
        }
    }

    /// Deletes an entry and every index row pointing at it.
    ///
    /// Entries that still have subscribers are never removed.
    pub fn remove(&mut self, key: &CacheKey) -> Option<CacheEntry> {
        if self.entries.get(key)?.subscriber_count > 0 {
            tracing::warn!(%key, "Refusing to remove an entry with subscribers");
            return None;
        }
        let entry = self.entries.remove(key)?;
        self.tags.remove_key(key, &entry.tags);
        self.subscribers.remove_key(key);
        tracing::debug!(%key, "Cache entry removed");
        Some(entry)
    }

    /// Removes every entry whose retention window has elapsed at `now`.
    pub fn sweep(&mut self, now: Instant) -> Vec<CacheKey> {
        let expired: Vec<CacheKey> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired(now))
            .map(|(key, _)| key.clone())
            .collect();
        for key in &expired {
            self.remove(key);
        }
        expired
    }
}

impl Default for EntryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn invalid(key: &CacheKey, from: Status, to: Status) -> CacheError {
    tracing::error!(%key, %from, %to, "Invalid cache entry transition");
    CacheError::InvalidTransition {
        key: key.clone(),
        from,
        to,
    }
}
