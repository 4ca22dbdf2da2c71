//! Scripted transport for exercising the cache.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use stockroom_core::cache::{Transport, TransportError};
use tokio::sync::oneshot;

use crate::config::CacheConfig;
use crate::coordinator::QueryCache;

type Reply = Result<Value, TransportError>;

/// A recorded mutation call.
#[derive(Debug, Clone, PartialEq)]
pub struct MutationCall {
    pub endpoint: String,
    pub args: Option<Value>,
    pub body: Option<Value>,
}

/// Answers fetches from per-endpoint replies.
///
/// A gated reply is consumed by the next fetch of its endpoint, which then
/// waits until the test releases it. Otherwise the endpoint's standing
/// reply is returned.
#[derive(Default)]
pub struct FakeTransport {
    fetches: AtomicUsize,
    replies: Mutex<HashMap<String, Reply>>,
    gates: Mutex<HashMap<String, VecDeque<oneshot::Receiver<Reply>>>>,
    mutation_reply: Mutex<Option<Reply>>,
    mutations: Mutex<Vec<MutationCall>>,
}

impl FakeTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn reply(&self, endpoint: &str, reply: Reply) {
        self.replies
            .lock()
            .unwrap()
            .insert(endpoint.to_string(), reply);
    }

    /// Makes the next fetch of `endpoint` wait for the returned sender.
    pub fn gate(&self, endpoint: &str) -> oneshot::Sender<Reply> {
        let (tx, rx) = oneshot::channel();
        self.gates
            .lock()
            .unwrap()
            .entry(endpoint.to_string())
            .or_default()
            .push_back(rx);
        tx
    }

    pub fn reply_to_mutations(&self, reply: Reply) {
        *self.mutation_reply.lock().unwrap() = Some(reply);
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    pub fn mutations(&self) -> Vec<MutationCall> {
        self.mutations.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn fetch(&self, endpoint: &str, _args: Option<&Value>) -> Result<Value, TransportError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let gate = self
            .gates
            .lock()
            .unwrap()
            .get_mut(endpoint)
            .and_then(VecDeque::pop_front);
        if let Some(gate) = gate {
            return gate
                .await
                .unwrap_or_else(|_| Err(TransportError::new("gate dropped")));
        }
        self.replies
            .lock()
            .unwrap()
            .get(endpoint)
            .cloned()
            .unwrap_or_else(|| Err(TransportError::with_status(404, "no reply scripted")))
    }

    async fn mutate(
        &self,
        endpoint: &str,
        args: Option<&Value>,
        body: Option<&Value>,
    ) -> Result<Value, TransportError> {
        self.mutations.lock().unwrap().push(MutationCall {
            endpoint: endpoint.to_string(),
            args: args.cloned(),
            body: body.cloned(),
        });
        self.mutation_reply
            .lock()
            .unwrap()
            .clone()
            .unwrap_or_else(|| Ok(body.cloned().unwrap_or(Value::Null)))
    }
}

pub fn cache_over(transport: &Arc<FakeTransport>) -> QueryCache<FakeTransport> {
    QueryCache::new(Arc::clone(transport), CacheConfig::defaults())
}

/// Polls `condition` until it holds, failing the test after two seconds.
pub async fn eventually<F>(condition: F)
where
    F: Fn() -> bool,
{
    let waited = tokio::time::timeout(Duration::from_secs(2), async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
    })
    .await;
    assert!(waited.is_ok(), "condition not reached in time");
}
