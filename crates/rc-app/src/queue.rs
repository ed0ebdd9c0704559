//! Durable FIFO of mutations waiting for the shared store.

use std::collections::VecDeque;
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, info_span, warn, Instrument};

use rc_core::ids::{CanonicalId, OperationId};
use rc_core::ports::{ClockPort, PendingOperationStorePort};
use rc_core::{OperationType, PendingOperation, RetryPolicy, SyncError};

/// Performs one queued operation against the shared store.
#[async_trait]
pub trait OperationExecutor: Send + Sync {
    async fn execute(&self, operation: &PendingOperation) -> Result<(), SyncError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnqueueOutcome {
    Appended,
    /// An operation with the same target and type was updated in place.
    Superseded,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrainOutcome {
    /// Queue is empty.
    Drained,
    /// Head operation failed and stays at the head.
    Failed {
        operation: PendingOperation,
        error: SyncError,
    },
    /// Head operation is waiting for its backoff to expire.
    Deferred { until: i64 },
    /// Connection lost mid-drain. The head is untouched: no attempt counted,
    /// no backoff scheduled.
    Offline,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DrainReport {
    /// Operations acknowledged by the shared store, in execution order.
    pub completed: Vec<PendingOperation>,
    pub outcome: DrainOutcome,
}

/// Offline operation queue
///
/// Strict FIFO. Every mutation is persisted through the operation store
/// before it becomes visible in memory, so a crash never leaves the durable
/// queue behind the in-memory one.
pub struct OfflineOperationQueue {
    items: Mutex<VecDeque<PendingOperation>>,
    store: Arc<dyn PendingOperationStorePort>,
    clock: Arc<dyn ClockPort>,
    retry: RetryPolicy,
}

impl OfflineOperationQueue {
    pub fn new(
        store: Arc<dyn PendingOperationStorePort>,
        clock: Arc<dyn ClockPort>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            items: Mutex::new(VecDeque::new()),
            store,
            clock,
            retry,
        }
    }

    /// Restore the persisted queue.
    pub async fn load(
        store: Arc<dyn PendingOperationStorePort>,
        clock: Arc<dyn ClockPort>,
        retry: RetryPolicy,
    ) -> Result<Self> {
        let restored = store
            .load_all()
            .await
            .context("failed to load pending operations")?;
        info!(count = restored.len(), "Restored offline operation queue");

        let queue = Self::new(store, clock, retry);
        *queue.items.lock().await = restored.into();
        Ok(queue)
    }

    pub async fn len(&self) -> usize {
        self.items.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.items.lock().await.is_empty()
    }

    pub async fn snapshot(&self) -> Vec<PendingOperation> {
        self.items.lock().await.iter().cloned().collect()
    }

    /// Operations still waiting for the given record.
    pub async fn pending_for(&self, canonical_id: &CanonicalId) -> Vec<PendingOperation> {
        self.items
            .lock()
            .await
            .iter()
            .filter(|op| op.target.as_ref() == Some(canonical_id))
            .cloned()
            .collect()
    }

    #[tracing::instrument(
        name = "usecase.queue.enqueue",
        skip(self, operation),
        fields(op_type = %operation.op_type.as_str(), target = ?operation.target.as_ref().map(|t| t.as_str()))
    )]
    pub async fn enqueue(&self, operation: PendingOperation) -> Result<EnqueueOutcome> {
        let mut items = self.items.lock().await;
        let mut next = items.clone();

        let outcome = match next.iter_mut().find(|existing| operation.supersedes(existing)) {
            Some(existing) => {
                // Keeps its id and queue slot, takes the newest payload.
                existing.payload = operation.payload;
                existing.attempts = 0;
                existing.next_attempt_at = None;
                existing.last_error = None;
                EnqueueOutcome::Superseded
            }
            None => {
                next.push_back(operation);
                EnqueueOutcome::Appended
            }
        };

        self.persist(&next).await?;
        *items = next;
        debug!(?outcome, len = items.len(), "Operation enqueued");
        Ok(outcome)
    }

    /// Drop queued operations of `op_type` for a record whose local change lost
    /// a conflict. Returns how many were removed.
    pub async fn discard(&self, canonical_id: &CanonicalId, op_type: OperationType) -> Result<usize> {
        let mut items = self.items.lock().await;
        let next: VecDeque<PendingOperation> = items
            .iter()
            .filter(|op| !(op.op_type == op_type && op.target.as_ref() == Some(canonical_id)))
            .cloned()
            .collect();
        let removed = items.len() - next.len();
        if removed == 0 {
            return Ok(0);
        }

        self.persist(&next).await?;
        *items = next;
        Ok(removed)
    }

    /// Make every operation due now. Used when connectivity comes back.
    pub async fn clear_backoff(&self) -> Result<()> {
        let mut items = self.items.lock().await;
        if items.iter().all(|op| op.next_attempt_at.is_none()) {
            return Ok(());
        }

        let mut next = items.clone();
        for op in next.iter_mut() {
            op.next_attempt_at = None;
        }
        self.persist(&next).await?;
        *items = next;
        Ok(())
    }

    /// Execute operations in FIFO order until the queue is empty, an operation
    /// fails, the head is still backing off, the connection drops, or `cancel`
    /// fires.
    pub async fn drain(
        &self,
        executor: &dyn OperationExecutor,
        cancel: &CancellationToken,
    ) -> Result<DrainReport> {
        let span = info_span!("usecase.queue.drain");
        async move {
            let mut items = self.items.lock().await;
            let mut completed = Vec::new();

            let outcome = loop {
                if cancel.is_cancelled() {
                    break DrainOutcome::Cancelled;
                }

                let Some(head) = items.front().cloned() else {
                    break DrainOutcome::Drained;
                };

                let now = self.clock.now_ms();
                if head.is_deferred(now) {
                    let until = head.next_attempt_at.unwrap_or(now);
                    debug!(operation_id = %head.id, until, "Head operation deferred");
                    break DrainOutcome::Deferred { until };
                }

                match executor.execute(&head).await {
                    Err(SyncError::NotConnected) => {
                        info!(operation_id = %head.id, "Connection lost; operation stays queued");
                        break DrainOutcome::Offline;
                    }
                    Ok(()) => {
                        let mut next = items.clone();
                        next.pop_front();
                        self.persist(&next).await?;
                        *items = next;
                        debug!(operation_id = %head.id, "Operation acknowledged");
                        completed.push(head);
                    }
                    Err(error) => {
                        let failed = self.schedule_retry(head, &error);
                        let mut next = items.clone();
                        if let Some(front) = next.front_mut() {
                            *front = failed.clone();
                        }
                        self.persist(&next).await?;
                        *items = next;
                        warn!(
                            operation_id = %failed.id,
                            attempts = failed.attempts,
                            next_attempt_at = ?failed.next_attempt_at,
                            error = %error,
                            "Operation failed; left at head of queue"
                        );
                        break DrainOutcome::Failed {
                            operation: failed,
                            error,
                        };
                    }
                }
            };

            info!(completed = completed.len(), remaining = items.len(), "Queue drain finished");
            Ok(DrainReport { completed, outcome })
        }
        .instrument(span)
        .await
    }

    pub async fn remove(&self, operation_id: &OperationId) -> Result<bool> {
        let mut items = self.items.lock().await;
        let Some(position) = items.iter().position(|op| &op.id == operation_id) else {
            return Ok(false);
        };
        let mut next = items.clone();
        next.remove(position);
        self.persist(&next).await?;
        *items = next;
        Ok(true)
    }

    fn schedule_retry(&self, mut operation: PendingOperation, error: &SyncError) -> PendingOperation {
        operation.attempts = operation.attempts.saturating_add(1);
        let delay = self.retry.delay_for(operation.attempts);
        let delay_ms = i64::try_from(delay.as_millis()).unwrap_or(i64::MAX);
        operation.next_attempt_at = Some(self.clock.now_ms().saturating_add(delay_ms));
        operation.last_error = Some(error.to_string());
        operation
    }

    async fn persist(&self, items: &VecDeque<PendingOperation>) -> Result<()> {
        let ordered: Vec<PendingOperation> = items.iter().cloned().collect();
        self.store
            .replace_all(&ordered)
            .await
            .context("failed to persist pending operations")
    }
}
