use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::watch;
use tracing::debug;

use rc_core::ports::{SharedStoreError, SharedStorePort};
use rc_core::{OperationType, PendingOperation, SyncError};

use crate::queue::OperationExecutor;

/// Maps queued operations onto shared-store calls.
pub struct SharedStoreExecutor {
    shared: Arc<dyn SharedStorePort>,
    online: watch::Receiver<bool>,
}

impl SharedStoreExecutor {
    pub fn new(shared: Arc<dyn SharedStorePort>, online: watch::Receiver<bool>) -> Self {
        Self { shared, online }
    }
}

#[async_trait]
impl OperationExecutor for SharedStoreExecutor {
    async fn execute(&self, operation: &PendingOperation) -> Result<(), SyncError> {
        // Checked per item so a disconnect mid-drain stops the drain.
        if !*self.online.borrow() {
            return Err(SyncError::NotConnected);
        }

        let result = match operation.op_type {
            OperationType::Push => self.shared.push(&operation.payload).await,
            OperationType::Update => self.shared.update(&operation.payload).await,
            OperationType::Delete => {
                let target = operation
                    .target
                    .as_ref()
                    .unwrap_or(&operation.payload.canonical_id);
                match self.shared.delete(target).await {
                    Err(SharedStoreError::NotFound) => {
                        debug!(canonical_id = %target, "Delete target already gone");
                        Ok(())
                    }
                    other => other,
                }
            }
        };
        result.map_err(SyncError::from)
    }
}
