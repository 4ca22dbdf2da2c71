//! Garbage collection of unobserved entries.

use std::time::Instant;

use stockroom_core::cache::Transport;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::coordinator::QueryCache;
use crate::store::lock;

/// Handle to a running collector task.
///
/// Dropping the handle stops the collector.
#[derive(Debug)]
pub struct CollectorHandle {
    cancel_tx: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl CollectorHandle {
    /// Stops the collector and waits for its task to finish.
    pub async fn shutdown(mut self) {
        if let Some(cancel_tx) = self.cancel_tx.take() {
            let _ = cancel_tx.send(());
        }
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                tracing::error!("Cache collector task failed: {}", e);
            }
        }
    }
}

impl Drop for CollectorHandle {
    fn drop(&mut self) {
        if let Some(cancel_tx) = self.cancel_tx.take() {
            let _ = cancel_tx.send(());
        }
    }
}

impl<T> QueryCache<T>
where
    T: Transport + ?Sized + 'static,
{
    /// Removes every unobserved entry whose retention window has passed
    /// at `now`. Returns how many entries were removed.
    pub fn collect_garbage(&self, now: Instant) -> usize {
        let removed = lock(&self.store).sweep(now);
        if !removed.is_empty() {
            tracing::debug!(count = removed.len(), keys = ?removed, "Collected cache entries");
        }
        removed.len()
    }

    /// Runs [`collect_garbage`](Self::collect_garbage) every
    /// `gc_interval_seconds` until the returned handle is shut down or dropped.
    pub fn spawn_collector(&self) -> CollectorHandle {
        let cache = self.clone();
        let period = self.config.gc_interval();
        let (cancel_tx, mut cancel_rx) = oneshot::channel::<()>();

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            // The first tick completes immediately.
            ticker.tick().await;
            tracing::debug!(period_secs = period.as_secs(), "Cache collector started");

            loop {
                tokio::select! {
                    _ = &mut cancel_rx => {
                        tracing::debug!("Cache collector stopped");
                        break;
                    }
                    _ = ticker.tick() => {
                        cache.collect_garbage(Instant::now());
                    }
                }
            }
        });

        CollectorHandle {
            cancel_tx: Some(cancel_tx),
            task: Some(task),
        }
    }
}
