use anyhow::Result;
use async_trait::async_trait;

use crate::operation::PendingOperation;

/// Durable backing for the offline operation queue.
#[async_trait]
pub trait PendingOperationStorePort: Send + Sync {
    /// Operations in queue order.
    async fn load_all(&self) -> Result<Vec<PendingOperation>>;

    /// Replace the persisted queue atomically with `operations` (in order).
    async fn replace_all(&self, operations: &[PendingOperation]) -> Result<()>;
}
