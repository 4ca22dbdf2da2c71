//! Invalidation engine and mutations.

use serde_json::Value;
use stockroom_core::cache::{CacheKey, Result, Status, TagSet, Transport};

use crate::coordinator::QueryCache;
use crate::entry::PendingFetch;
use crate::query::Mutation;
use crate::store::{lock, EntryStore, Payload};

impl<T> QueryCache<T>
where
    T: Transport + ?Sized + 'static,
{
    /// Marks every entry providing one of `tags` stale and refetches the
    /// ones somebody is subscribed to.
    ///
    /// Returns how many entries were affected. Tags matching nothing are a
    /// no-op.
    pub fn invalidate(&self, tags: &TagSet) -> usize {
        if tags.is_empty() {
            return 0;
        }
        let (affected, pending) = {
            let mut store = lock(&self.store);
            let keys = store.keys_tagged(tags);
            let mut pending = Vec::new();
            for key in &keys {
                match invalidate_entry(&mut store, key) {
                    Ok(Some(fetch)) => pending.push(fetch),
                    Ok(None) => {}
                    Err(err) => {
                        tracing::error!(%key, error = %err, "Failed to invalidate entry");
                    }
                }
            }
            (keys.len(), pending)
        };
        tracing::debug!(
            tags = ?tags,
            affected,
            refetching = pending.len(),
            "Invalidated tags"
        );
        for fetch in pending {
            self.spawn_fetch(fetch);
        }
        affected
    }

    /// Performs a write, then invalidates the tags it declares.
    ///
    /// Invalidation happens only after the transport acknowledged the
    /// write. A failed write invalidates nothing.
    pub async fn mutate(&self, mutation: &Mutation) -> Result<Value> {
        let value = self
            .transport
            .mutate(mutation.endpoint(), mutation.args(), mutation.body())
            .await
            .map_err(|error| {
                tracing::debug!(endpoint = mutation.endpoint(), error = %error, "Mutation failed");
                error
            })?;
        tracing::debug!(endpoint = mutation.endpoint(), "Mutation acknowledged");
        self.invalidate(mutation.invalidated_tags());
        Ok(value)
    }
}

/// Applies an invalidation to one entry, returning the refetch to run, if any.
///
/// A loading entry never keeps the response it is waiting for, which may
/// predate the write: observed entries are restamped, others drop the fetch
/// and wait for the next query.
fn invalidate_entry(store: &mut EntryStore, key: &CacheKey) -> Result<Option<PendingFetch>> {
    let Some(entry) = store.get(key) else {
        return Ok(None);
    };
    let status = entry.status();
    let subscribed = entry.subscriber_count() > 0;
    let background = entry.policy().serve_stale_on_error && entry.value.is_some();

    match status {
        Status::Success => {
            store.transition(key, Status::Stale, Payload::None)?;
            if subscribed {
                return store.begin_fetch(key, background).map(Some);
            }
            Ok(None)
        }
        Status::Stale | Status::Error if subscribed => {
            store.begin_fetch(key, background).map(Some)
        }
        Status::Loading if subscribed => store.begin_fetch(key, background).map(Some),
        Status::Loading => {
            store.abandon_fetch(key)?;
            Ok(None)
        }
        Status::Stale | Status::Error | Status::Uninitialized => Ok(None),
    }
}
