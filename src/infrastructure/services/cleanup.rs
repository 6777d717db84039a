//! Detached cache cleanup after product deletion
//!
//! Deletes return as soon as the store row is gone. Removing the cache entry
//! and index memberships is queued here and runs on a background worker.
//! Each job gets its own task bounded by a fixed timeout. The queue is
//! unbounded because the cache has no expiry: a dropped job would leave the
//! deleted product cached forever.

use std::sync::Mutex;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, info, warn};

use super::best_effort_cache::BestEffortCache;
use crate::domain::product::{Product, ProductId};

/// Configuration for the cleanup worker
#[derive(Debug, Clone)]
pub struct CleanupConfig {
    /// Upper bound for a single cleanup job
    pub timeout: Duration,
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(5000),
        }
    }
}

/// Cache state to remove for a deleted product
#[derive(Debug, Clone)]
pub struct CleanupJob {
    pub id: ProductId,
    /// Last known product, used to locate its name and category indices
    pub known: Option<Product>,
}

#[derive(Debug)]
pub struct CacheCleanupWorker {
    sender: Mutex<Option<mpsc::UnboundedSender<CleanupJob>>>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl CacheCleanupWorker {
    /// Starts the worker on the current tokio runtime
    pub fn spawn(cache: BestEffortCache, config: CleanupConfig) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        let handle = tokio::spawn(run_worker(receiver, cache, config.timeout));

        Self {
            sender: Mutex::new(Some(sender)),
            handle: Mutex::new(Some(handle)),
        }
    }

    /// Queues a job without waiting. Returns false only once the worker
    /// has been shut down.
    pub fn submit(&self, job: CleanupJob) -> bool {
        let sender = self.sender.lock().ok().and_then(|guard| guard.clone());

        let Some(sender) = sender else {
            warn!(product_id = %job.id, "Cache cleanup worker stopped, job dropped");
            return false;
        };

        match sender.send(job) {
            Ok(()) => true,
            Err(mpsc::error::SendError(job)) => {
                warn!(product_id = %job.id, "Cache cleanup worker stopped, job dropped");
                false
            }
        }
    }

    /// Stops accepting jobs and waits for queued and running ones to finish
    pub async fn shutdown(&self) {
        if let Ok(mut sender) = self.sender.lock() {
            sender.take();
        }

        let handle = self.handle.lock().ok().and_then(|mut guard| guard.take());

        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                warn!(error = %e, "Cache cleanup worker terminated abnormally");
            }
        }
    }
}

async fn run_worker(
    mut receiver: mpsc::UnboundedReceiver<CleanupJob>,
    cache: BestEffortCache,
    timeout: Duration,
) {
    let mut tasks = JoinSet::new();

    loop {
        tokio::select! {
            job = receiver.recv() => match job {
                Some(job) => {
                    tasks.spawn(run_job(cache.clone(), job, timeout));
                }
                None => break,
            },
            Some(_) = tasks.join_next(), if !tasks.is_empty() => {}
        }
    }

    while tasks.join_next().await.is_some() {}
    info!("Cache cleanup worker stopped");
}

async fn run_job(cache: BestEffortCache, job: CleanupJob, timeout: Duration) {
    let CleanupJob { id, known } = job;

    match tokio::time::timeout(timeout, cache.remove_product(&id, known.as_ref())).await {
        Ok(()) => debug!(product_id = %id, "Cache cleanup finished"),
        Err(_) => warn!(
            product_id = %id,
            timeout_ms = timeout.as_millis() as u64,
            "Cache cleanup timed out"
        ),
    }
}
