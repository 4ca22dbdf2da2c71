//! In-memory tagged query cache.
//!
//! [`QueryCache`] deduplicates concurrent reads of the same request, keeps
//! each result together with the tags it provides, and refetches whatever a
//! mutation's tags invalidate while somebody still observes it. Unobserved
//! entries are dropped once their retention window has passed.
//!
//! ```ignore
//! let cache = QueryCache::new(transport, CacheConfig::from_env());
//! let products = QueryDef::new("/products", None).provides(tag_set(["Products"]));
//! let value = cache.query(&products, cache.default_policy()).await?;
//! ```

mod config;
mod coordinator;
mod entry;
mod gc;
mod invalidation;
mod policy;
mod query;
mod store;
mod subscriptions;
mod tag_index;

#[cfg(test)]
mod testing;

pub use config::CacheConfig;
pub use coordinator::QueryCache;
pub use entry::{CacheEntry, Snapshot};
pub use gc::CollectorHandle;
pub use policy::{QueryPolicy, DEFAULT_RETENTION};
pub use query::{Mutation, ProvidesTags, QueryDef, TagProvider};
pub use store::EntryStore;
pub use subscriptions::{Subscription, SubscriptionId};
pub use tag_index::TagIndex;

pub use stockroom_core::cache::{
    key_for, tag_set, CacheError, CacheKey, Result, Status, Tag, TagSet, Transport,
    TransportError,
};
