//! Cache entries and the snapshots subscribers see.

use std::time::Instant;

use serde_json::Value;
use stockroom_core::cache::{CacheKey, Status, TagSet, TransportError};
use tokio::sync::watch;

use crate::policy::QueryPolicy;
use crate::query::QueryDef;

/// What a subscriber observes on every transition of an entry.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub status: Status,
    /// Present only in `success` and `stale`.
    pub value: Option<Value>,
    /// Present only in `error`.
    pub error: Option<TransportError>,
}

impl Snapshot {
    pub fn uninitialized() -> Self {
        Self {
            status: Status::Uninitialized,
            value: None,
            error: None,
        }
    }
}

/// Result of a fetch attempt as seen by callers waiting on it.
#[derive(Debug, Clone)]
pub(crate) enum FetchOutcome {
    Completed(Result<Value, TransportError>),
    /// A newer fetch replaced this one; its result was discarded.
    Superseded,
}

pub(crate) type OutcomeReceiver = watch::Receiver<Option<FetchOutcome>>;
pub(crate) type OutcomeSender = watch::Sender<Option<FetchOutcome>>;

/// The fetch currently allowed to complete an entry.
#[derive(Debug)]
pub(crate) struct InFlight {
    pub token: u64,
    /// Started while a servable value was kept for subscribers.
    pub background: bool,
    pub done: OutcomeReceiver,
}

impl InFlight {
    /// True if the task driving this fetch went away without reporting.
    pub fn is_abandoned(&self) -> bool {
        self.done.has_changed().is_err()
    }
}

/// A fetch that was stamped under the store lock and must now be run.
pub(crate) struct PendingFetch {
    pub key: CacheKey,
    pub token: u64,
    pub query: QueryDef,
    pub tx: OutcomeSender,
    pub rx: OutcomeReceiver,
}

/// One cached query result and its lifecycle state.
#[derive(Debug)]
pub struct CacheEntry {
    pub(crate) query: QueryDef,
    pub(crate) status: Status,
    /// Last good value. Kept while a background revalidation runs.
    pub(crate) value: Option<Value>,
    pub(crate) error: Option<TransportError>,
    pub(crate) tags: TagSet,
    pub(crate) subscriber_count: usize,
    pub(crate) last_unsubscribed_at: Option<Instant>,
    pub(crate) fetched_at: Option<Instant>,
    pub(crate) in_flight: Option<InFlight>,
    pub(crate) policy: QueryPolicy,
}

impl CacheEntry {
    pub(crate) fn new(query: QueryDef, policy: QueryPolicy, now: Instant) -> Self {
        Self {
            query,
            status: Status::Uninitialized,
            value: None,
            error: None,
            tags: TagSet::new(),
            subscriber_count: 0,
            last_unsubscribed_at: Some(now),
            fetched_at: None,
            in_flight: None,
            policy,
        }
    }

    pub fn key(&self) -> &CacheKey {
        self.query.key()
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn tags(&self) -> &TagSet {
        &self.tags
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscriber_count
    }

    pub fn last_unsubscribed_at(&self) -> Option<Instant> {
        self.last_unsubscribed_at
    }

    pub fn in_flight_token(&self) -> Option<u64> {
        self.in_flight.as_ref().map(|f| f.token)
    }

    pub fn policy(&self) -> QueryPolicy {
        self.policy
    }

    /// True while a background refetch runs behind a servable value.
    pub fn is_revalidating(&self) -> bool {
        self.status == Status::Loading
            && self.value.is_some()
            && self.in_flight.as_ref().is_some_and(|f| f.background)
    }

    /// True if a successful value is younger than the stale time.
    pub fn is_fresh(&self, now: Instant) -> bool {
        self.status == Status::Success
            && self
                .fetched_at
                .is_some_and(|at| now.saturating_duration_since(at) < self.policy.stale_time)
    }

    /// True if the entry may be reclaimed at `now`.
    pub fn is_expired(&self, now: Instant) -> bool {
        self.subscriber_count == 0
            && self
                .last_unsubscribed_at
                .is_some_and(|at| now.saturating_duration_since(at) >= self.policy.retention)
    }

    /// What subscribers see. A background revalidation keeps showing the
    /// last good value as `stale` until the refetch lands.
    pub fn snapshot(&self) -> Snapshot {
        if self.is_revalidating() {
            return Snapshot {
                status: Status::Stale,
                value: self.value.clone(),
                error: None,
            };
        }
        Snapshot {
            status: self.status,
            value: if self.status.has_value() {
                self.value.clone()
            } else {
                None
            },
            error: if self.status == Status::Error {
                self.error.clone()
            } else {
                None
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;

    fn entry(policy: QueryPolicy, now: Instant) -> CacheEntry {
        CacheEntry::new(QueryDef::new("/dashboard", None), policy, now)
    }

    #[test]
    fn test_new_entry_is_uninitialized() {
        let now = Instant::now();
        let entry = entry(QueryPolicy::default(), now);

        assert_eq!(entry.status(), Status::Uninitialized);
        assert_eq!(entry.snapshot(), Snapshot::uninitialized());
        assert_eq!(entry.subscriber_count(), 0);
        assert_eq!(entry.last_unsubscribed_at(), Some(now));
        assert!(entry.in_flight_token().is_none());
    }

    #[test]
    fn test_snapshot_hides_value_while_loading() {
        let mut entry = entry(QueryPolicy::default(), Instant::now());
        entry.value = Some(json!({ "kept": true }));

        entry.status = Status::Loading;
        assert_eq!(entry.snapshot().value, None);

        entry.status = Status::Stale;
        assert_eq!(entry.snapshot().value, Some(json!({ "kept": true })));
    }

    #[test]
    fn test_background_revalidation_shows_last_value() {
        let mut entry = entry(QueryPolicy::default(), Instant::now());
        entry.value = Some(json!(["v1"]));
        entry.status = Status::Loading;
        let (_tx, rx) = watch::channel(None);
        entry.in_flight = Some(InFlight {
            token: 1,
            background: true,
            done: rx.clone(),
        });

        let snapshot = entry.snapshot();
        assert_eq!(snapshot.status, Status::Stale);
        assert_eq!(snapshot.value, Some(json!(["v1"])));
        assert!(entry.is_revalidating());

        entry.in_flight = Some(InFlight {
            token: 2,
            background: false,
            done: rx,
        });
        assert_eq!(entry.snapshot().status, Status::Loading);
        assert_eq!(entry.snapshot().value, None);
    }

    #[test]
    fn test_freshness_follows_stale_time() {
        let now = Instant::now();
        let policy = QueryPolicy::default().with_stale_time(Duration::from_secs(10));
        let mut entry = entry(policy, now);
        entry.status = Status::Success;
        entry.fetched_at = Some(now);

        assert!(entry.is_fresh(now + Duration::from_secs(9)));
        assert!(!entry.is_fresh(now + Duration::from_secs(10)));
    }

    #[test]
    fn test_zero_stale_time_is_never_fresh() {
        let now = Instant::now();
        let mut entry = entry(QueryPolicy::default(), now);
        entry.status = Status::Success;
        entry.fetched_at = Some(now);

        assert!(!entry.is_fresh(now));
    }

    #[test]
    fn test_expiry_needs_zero_subscribers() {
        let now = Instant::now();
        let policy = QueryPolicy::default().with_retention(Duration::from_secs(60));
        let mut entry = entry(policy, now);

        assert!(!entry.is_expired(now + Duration::from_secs(59)));
        assert!(entry.is_expired(now + Duration::from_secs(60)));

        entry.subscriber_count = 1;
        entry.last_unsubscribed_at = None;
        assert!(!entry.is_expired(now + Duration::from_secs(3600)));
    }
}
