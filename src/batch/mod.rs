//! Bounded-concurrency batch processing
//!
//! A shared claim queue feeds a fixed pool of workers. Each worker loops
//! claim-or-exit: it pops the next item, marks it processing, runs the
//! per-item work, and records the outcome on the item itself. One item's
//! failure never aborts the batch or touches a sibling; callers derive
//! progress by reading item statuses between await points.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::OffsetDateTime;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::observability::Metrics;
use crate::service::{Artifact, ServiceError, SourcePayload};

#[derive(Debug, Error)]
pub enum WorkError {
    #[error(transparent)]
    Service(#[from] ServiceError),

    #[error("source unreadable: {0}")]
    Source(String),
}

/// Lifecycle of one batch item.
///
/// Completed and Failed are terminal for a run; a Failed item becomes
/// eligible again on the next run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemStatus {
    Queued,
    Processing,
    Completed,
    Failed,
}

/// One unit of independent batch work.
#[derive(Debug, Clone)]
pub struct WorkItem {
    pub id: Uuid,
    /// Caller-facing name, usually the source file name.
    pub label: String,
    pub source: SourcePayload,
    pub status: ItemStatus,
    /// Ordered artifacts; empty unless status is Completed.
    pub artifacts: Vec<Artifact>,
    pub enqueued_at: OffsetDateTime,
    pub finished_at: Option<OffsetDateTime>,
}

impl WorkItem {
    pub fn new(label: impl Into<String>, source: SourcePayload) -> Self {
        Self {
            id: Uuid::new_v4(),
            label: label.into(),
            source,
            status: ItemStatus::Queued,
            artifacts: Vec::new(),
            enqueued_at: OffsetDateTime::now_utc(),
            finished_at: None,
        }
    }

    /// Wrap the item for shared mutation across workers.
    pub fn into_shared(self) -> SharedItem {
        Arc::new(RwLock::new(self))
    }
}

/// Items are shared between the caller (reads) and the claiming worker
/// (exclusive writes while claimed).
pub type SharedItem = Arc<RwLock<WorkItem>>;

/// Per-item work: turn a claimed item into its artifacts.
///
/// Implementations typically fan out several retryable sub-requests and
/// collect the results positionally. An error here fails the whole item;
/// partial artifact sets are never kept.
#[async_trait]
pub trait ItemWorker: Send + Sync {
    async fn process(&self, item: &WorkItem) -> Result<Vec<Artifact>, WorkError>;
}

/// Status counts across a batch at one instant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ProgressSnapshot {
    pub total: usize,
    pub queued: usize,
    pub processing: usize,
    pub completed: usize,
    pub failed: usize,
}

impl ProgressSnapshot {
    /// Finished share of the batch in [0.0, 1.0]; failed items count as
    /// finished, matching how the batch reports overall progress.
    pub fn ratio(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        (self.completed + self.failed) as f64 / self.total as f64
    }
}

/// Snapshot current statuses. Safe to call while a run is in flight.
pub async fn progress(items: &[SharedItem]) -> ProgressSnapshot {
    let mut snapshot = ProgressSnapshot {
        total: items.len(),
        ..Default::default()
    };
    for item in items {
        match item.read().await.status {
            ItemStatus::Queued => snapshot.queued += 1,
            ItemStatus::Processing => snapshot.processing += 1,
            ItemStatus::Completed => snapshot.completed += 1,
            ItemStatus::Failed => snapshot.failed += 1,
        }
    }
    snapshot
}

pub const DEFAULT_CONCURRENCY: usize = 4;

/// Fixed-size worker pool over a shared claim queue.
pub struct BatchProcessor {
    concurrency: usize,
    metrics: Arc<Metrics>,
}

impl BatchProcessor {
    pub fn new(concurrency: usize) -> Self {
        Self {
            concurrency: concurrency.max(1),
            metrics: Arc::new(Metrics::new()),
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn metrics(&self) -> &Arc<Metrics> {
        &self.metrics
    }

    /// Process every eligible item, mutating statuses and artifacts in
    /// place. Returns once all workers have drained the queue.
    ///
    /// Queued and Failed items are seeded into the claim queue; Completed
    /// items from an earlier run are left untouched. There is no global
    /// success or failure — callers aggregate per-item outcomes.
    pub async fn process_all<W>(&self, items: &[SharedItem], work: Arc<W>)
    where
        W: ItemWorker + 'static,
    {
        let mut eligible = VecDeque::new();
        for item in items {
            let status = item.read().await.status;
            if matches!(status, ItemStatus::Queued | ItemStatus::Failed) {
                eligible.push_back(item.clone());
            }
        }

        if eligible.is_empty() {
            debug!("no eligible items, nothing to process");
            return;
        }

        info!(
            items = eligible.len(),
            concurrency = self.concurrency,
            "batch run started"
        );

        let workers = self.concurrency.min(eligible.len());
        let queue = Arc::new(Mutex::new(eligible));

        let mut handles = Vec::with_capacity(workers);
        for worker_id in 0..workers {
            let queue = queue.clone();
            let work = work.clone();
            let metrics = self.metrics.clone();
            handles.push(tokio::spawn(async move {
                worker_loop(worker_id, queue, work, metrics).await;
            }));
        }

        for handle in handles {
            if let Err(err) = handle.await {
                error!(error = %err, "batch worker panicked");
            }
        }

        info!("batch run finished");
    }
}

impl Default for BatchProcessor {
    fn default() -> Self {
        Self::new(DEFAULT_CONCURRENCY)
    }
}

/// Claim-or-exit loop run by each pool worker.
async fn worker_loop<W>(
    worker_id: usize,
    queue: Arc<Mutex<VecDeque<SharedItem>>>,
    work: Arc<W>,
    metrics: Arc<Metrics>,
) where
    W: ItemWorker,
{
    loop {
        // Atomic claim: the lock guard is dropped before processing so
        // other workers can claim concurrently.
        let item = { queue.lock().await.pop_front() };
        let Some(item) = item else {
            debug!(worker_id, "queue drained, worker exiting");
            return;
        };

        // Claim the item; a re-run of a failed item starts clean.
        let snapshot = {
            let mut claimed = item.write().await;
            claimed.status = ItemStatus::Processing;
            claimed.artifacts.clear();
            claimed.finished_at = None;
            claimed.clone()
        };

        debug!(worker_id, item = %snapshot.id, label = %snapshot.label, "item claimed");

        match work.process(&snapshot).await {
            Ok(artifacts) => {
                let mut finished = item.write().await;
                finished.artifacts = artifacts;
                finished.status = ItemStatus::Completed;
                finished.finished_at = Some(OffsetDateTime::now_utc());
                metrics.item_completed();
                info!(
                    worker_id,
                    item = %finished.id,
                    label = %finished.label,
                    artifacts = finished.artifacts.len(),
                    "item completed"
                );
            }
            Err(err) => {
                let mut finished = item.write().await;
                // Discard partial output; a failed item keeps nothing.
                finished.artifacts.clear();
                finished.status = ItemStatus::Failed;
                finished.finished_at = Some(OffsetDateTime::now_utc());
                metrics.item_failed();
                warn!(
                    worker_id,
                    item = %finished.id,
                    label = %finished.label,
                    error = %err,
                    "item failed"
                );
            }
        }
    }
}
