//! Request coordinator: serves cached values, joins in-flight fetches and
//! starts new ones, with at most one fetch in flight per key.

use std::sync::{Arc, Mutex};
use std::time::Instant;

use serde_json::Value;
use stockroom_core::cache::{
    CacheError, CacheKey, Result, Status, TagSet, Transport, TransportError,
};

use crate::config::CacheConfig;
use crate::entry::{FetchOutcome, OutcomeReceiver, PendingFetch, Snapshot};
use crate::policy::QueryPolicy;
use crate::query::QueryDef;
use crate::store::{lock, EntryStore, Payload, SharedStore};
use crate::subscriptions::Subscription;

/// What a caller does after consulting the store.
enum Plan {
    Ready(Value),
    Wait(OutcomeReceiver),
    Fail(TransportError),
}

/// The tagged query cache.
///
/// Cheap to clone; every clone shares the same entries. Fetches run on the
/// tokio runtime the cache is used from.
pub struct QueryCache<T: ?Sized> {
    pub(crate) store: SharedStore,
    pub(crate) transport: Arc<T>,
    pub(crate) config: CacheConfig,
}

impl<T: ?Sized> Clone for QueryCache<T> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            transport: Arc::clone(&self.transport),
            config: self.config.clone(),
        }
    }
}

impl<T> QueryCache<T>
where
    T: Transport + ?Sized + 'static,
{
    /// Creates an empty cache over `transport`.
    pub fn new(transport: Arc<T>, config: CacheConfig) -> Self {
        Self {
            store: Arc::new(Mutex::new(EntryStore::new())),
            transport,
            config,
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// The policy used when a caller doesn't bring one.
    pub fn default_policy(&self) -> QueryPolicy {
        self.config.default_policy()
    }

    pub fn transport(&self) -> &Arc<T> {
        &self.transport
    }

    /// Current state of `key`, if it has an entry.
    pub fn snapshot(&self, key: &CacheKey) -> Option<Snapshot> {
        lock(&self.store).get(key).map(|entry| entry.snapshot())
    }

    /// Tags the latest successful fetch of `key` provided.
    pub fn entry_tags(&self, key: &CacheKey) -> Option<TagSet> {
        lock(&self.store).get(key).map(|entry| entry.tags().clone())
    }

    pub fn subscriber_count(&self, key: &CacheKey) -> usize {
        lock(&self.store)
            .get(key)
            .map_or(0, |entry| entry.subscriber_count())
    }

    pub fn len(&self) -> usize {
        lock(&self.store).len()
    }

    pub fn is_empty(&self) -> bool {
        lock(&self.store).is_empty()
    }

    /// Resolves `query` once.
    ///
    /// Serves a fresh value without touching the network, joins a fetch that
    /// is already running, or starts one. When a servable value exists and
    /// the policy allows it, that value is returned at once and the entry is
    /// revalidated in the background. The entry counts this call as a
    /// subscriber until it returns.
    pub async fn query(&self, query: &QueryDef, policy: QueryPolicy) -> Result<Value> {
        let key = query.key().clone();
        let (mut plan, pending) = {
            let mut store = lock(&self.store);
            let planned = plan_query(&mut store, query, policy, Instant::now())?;
            store.acquire(&key);
            planned
        };
        let _hold = Hold {
            store: Arc::clone(&self.store),
            key: key.clone(),
        };
        if let Some(pending) = pending {
            self.spawn_fetch(pending);
        }

        loop {
            match plan {
                Plan::Ready(value) => return Ok(value),
                Plan::Fail(error) => return Err(CacheError::Transport(error)),
                Plan::Wait(rx) => match wait_for_outcome(rx).await {
                    FetchOutcome::Completed(Ok(value)) => return Ok(value),
                    FetchOutcome::Completed(Err(error)) => {
                        return Err(CacheError::Transport(error))
                    }
                    FetchOutcome::Superseded => {
                        tracing::trace!(%key, "Joined fetch was superseded, following the newer one");
                        let (next, pending) = {
                            let mut store = lock(&self.store);
                            plan_follow(&mut store, query, policy, Instant::now())?
                        };
                        if let Some(pending) = pending {
                            self.spawn_fetch(pending);
                        }
                        plan = next;
                    }
                },
            }
        }
    }

    /// Starts observing `query`.
    ///
    /// The subscription first yields the entry's current state, then every
    /// transition. A fetch is started if the entry has no fresh value and
    /// none is in flight.
    pub fn subscribe(&self, query: QueryDef, policy: QueryPolicy) -> Result<Subscription> {
        let key = query.key().clone();
        let (id, rx, planned) = {
            let mut store = lock(&self.store);
            let (id, rx) = store.subscribe(&query, policy, Instant::now());
            let planned = plan_query(&mut store, &query, policy, Instant::now());
            (id, rx, planned)
        };
        // Built outside the lock: dropping it on the error path unsubscribes.
        let subscription = Subscription::new(Arc::clone(&self.store), key.clone(), id, rx);
        let (_, pending) = planned?;
        if let Some(pending) = pending {
            self.spawn_fetch(pending);
        }
        tracing::debug!(%key, id = subscription.id(), "Subscribed");
        Ok(subscription)
    }

    /// Forces a foreground refetch of `key` unless one is already running.
    ///
    /// Returns false if the key has no entry.
    pub fn refetch(&self, key: &CacheKey) -> Result<bool> {
        let pending = {
            let mut store = lock(&self.store);
            match store.get(key).map(|entry| entry.status()) {
                None => return Ok(false),
                Some(Status::Loading) => None,
                Some(_) => Some(store.begin_fetch(key, false)?),
            }
        };
        if let Some(pending) = pending {
            self.spawn_fetch(pending);
        }
        Ok(true)
    }

    /// Runs a stamped fetch on the runtime. The fetch is never cancelled;
    /// its result lands only if its token is still current.
    pub(crate) fn spawn_fetch(&self, pending: PendingFetch) {
        let cache = self.clone();
        tokio::spawn(async move {
            let PendingFetch {
                key,
                token,
                query,
                tx,
                rx: _,
            } = pending;
            tracing::debug!(%key, token, "Fetch started");
            let result = cache
                .transport
                .fetch(query.endpoint(), query.args())
                .await;
            let outcome = cache.complete_fetch(&key, token, &query, result);
            // Nobody waiting is fine.
            let _ = tx.send(Some(outcome));
        });
    }

    /// Applies a finished fetch to its entry under the store lock.
    fn complete_fetch(
        &self,
        key: &CacheKey,
        token: u64,
        query: &QueryDef,
        result: std::result::Result<Value, TransportError>,
    ) -> FetchOutcome {
        let mut store = lock(&self.store);
        let Some(entry) = store.get(key) else {
            tracing::debug!(%key, token, "Entry evicted before fetch completed, result discarded");
            return FetchOutcome::Completed(result);
        };
        let Some(in_flight) = entry
            .in_flight
            .as_ref()
            .filter(|in_flight| in_flight.token == token)
        else {
            tracing::warn!(
                %key,
                token,
                current = ?entry.in_flight_token(),
                "Superseded fetch completed, result discarded"
            );
            return FetchOutcome::Superseded;
        };
        let keep_stale = in_flight.background && entry.value.is_some();

        match result {
            Ok(value) => {
                let tags = query.tags_for(&value);
                tracing::debug!(%key, token, tags = ?tags, "Fetch succeeded");
                let payload = Payload::Value {
                    value: value.clone(),
                    tags,
                };
                if let Err(err) = store.transition(key, Status::Success, payload) {
                    tracing::error!(%key, error = %err, "Failed to store fetched value");
                }
                FetchOutcome::Completed(Ok(value))
            }
            Err(error) if keep_stale => {
                let err = CacheError::StaleServedWithBackgroundError {
                    key: key.clone(),
                    source: error.clone(),
                };
                tracing::warn!(%key, token, error = %err, "Background refetch failed");
                if let Err(err) = store.transition(key, Status::Stale, Payload::None) {
                    tracing::error!(%key, error = %err, "Failed to keep stale value");
                }
                FetchOutcome::Completed(Err(error))
            }
            Err(error) => {
                tracing::debug!(%key, token, error = %error, "Fetch failed");
                if let Err(err) =
                    store.transition(key, Status::Error, Payload::Error(error.clone()))
                {
                    tracing::error!(%key, error = %err, "Failed to record fetch error");
                }
                FetchOutcome::Completed(Err(error))
            }
        }
    }
}

/// Keeps an entry counted as held for the duration of a one-shot query.
struct Hold {
    store: SharedStore,
    key: CacheKey,
}

impl Drop for Hold {
    fn drop(&mut self) {
        lock(&self.store).release(&self.key, Instant::now());
    }
}

/// Decides how to serve `query`, revalidating anything that isn't fresh.
fn plan_query(
    store: &mut EntryStore,
    query: &QueryDef,
    policy: QueryPolicy,
    now: Instant,
) -> Result<(Plan, Option<PendingFetch>)> {
    let key = query.key();
    let entry = store.get_or_create(query, policy, now);
    entry.policy = policy;

    if entry.is_fresh(now) {
        tracing::trace!(%key, "Cache hit");
        return Ok((Plan::Ready(entry.value.clone().unwrap_or_default()), None));
    }

    let serve_stale = policy.serve_stale_on_error;
    match (entry.status, entry.value.clone()) {
        (Status::Loading, kept) => match entry.in_flight.as_ref() {
            Some(in_flight) if !in_flight.is_abandoned() => {
                let rx = in_flight.done.clone();
                match kept {
                    Some(value) if serve_stale && in_flight.background => {
                        tracing::trace!(%key, "Serving stale value while revalidating");
                        Ok((Plan::Ready(value), None))
                    }
                    _ => {
                        tracing::trace!(%key, "Joining in-flight fetch");
                        Ok((Plan::Wait(rx), None))
                    }
                }
            }
            _ => {
                let background = serve_stale && kept.is_some();
                let pending = store.begin_fetch(key, background)?;
                let plan = match kept {
                    Some(value) if background => Plan::Ready(value),
                    _ => Plan::Wait(pending.rx.clone()),
                };
                Ok((plan, Some(pending)))
            }
        },
        (status @ (Status::Success | Status::Stale), Some(value)) if serve_stale => {
            tracing::trace!(%key, "Serving stale value, revalidating in background");
            if status == Status::Success {
                store.transition(key, Status::Stale, Payload::None)?;
            }
            let pending = store.begin_fetch(key, true)?;
            Ok((Plan::Ready(value), Some(pending)))
        }
        _ => {
            tracing::trace!(%key, "Cache miss");
            let pending = store.begin_fetch(key, false)?;
            let rx = pending.rx.clone();
            Ok((Plan::Wait(rx), Some(pending)))
        }
    }
}

/// Decides how to continue after the fetch a caller joined was superseded:
/// take whatever the entry holds now instead of revalidating again.
fn plan_follow(
    store: &mut EntryStore,
    query: &QueryDef,
    policy: QueryPolicy,
    now: Instant,
) -> Result<(Plan, Option<PendingFetch>)> {
    let Some(entry) = store.get(query.key()) else {
        return plan_query(store, query, policy, now);
    };
    match entry.status() {
        Status::Success | Status::Stale => {
            let value = entry.value.clone().unwrap_or_default();
            Ok((Plan::Ready(value), None))
        }
        Status::Error => {
            let error = entry
                .error
                .clone()
                .unwrap_or_else(|| TransportError::new("fetch failed"));
            Ok((Plan::Fail(error), None))
        }
        Status::Loading | Status::Uninitialized => plan_query(store, query, policy, now),
    }
}

/// Waits until the fetch behind `rx` reports. A fetch whose task vanished
/// counts as superseded so the caller re-reads the entry.
async fn wait_for_outcome(mut rx: OutcomeReceiver) -> FetchOutcome {
    let outcome = match rx.wait_for(Option::is_some).await {
        Ok(outcome) => outcome.clone(),
        Err(_) => None,
    };
    outcome.unwrap_or(FetchOutcome::Superseded)
}
