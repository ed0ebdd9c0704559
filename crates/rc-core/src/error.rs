use thiserror::Error;

use crate::ids::CanonicalId;
use crate::ports::{RecordStoreError, SharedStoreError};

/// Failure taxonomy of the sync core.
///
/// None of these reach UI code: the orchestrator turns them into a `failed`
/// sync state plus a retained pending operation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SyncError {
    /// Attempted while offline. Callers enqueue instead of failing the user.
    #[error("shared store is not reachable")]
    NotConnected,

    /// Idempotent success for deletes, a miss for pulls.
    #[error("record not found in shared store")]
    RemoteNotFound,

    #[error("transient shared store failure: {0}")]
    TransientStoreFailure(String),

    #[error("shared store denied access: {0}")]
    PermissionDenied(String),

    /// Not a failure: resolution falls back to minting a new ID.
    #[error("correlation did not complete inside the window")]
    CorrelationTimeout,

    #[error("conflict on {canonical_id} could not be resolved")]
    IrreconcilableConflict { canonical_id: CanonicalId },

    #[error("local store failure: {0}")]
    LocalStore(String),
}

impl SyncError {
    /// Whether the triggering operation should stay queued for another attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            SyncError::NotConnected
                | SyncError::TransientStoreFailure(_)
                | SyncError::PermissionDenied(_)
                | SyncError::LocalStore(_)
        )
    }
}

impl From<SharedStoreError> for SyncError {
    fn from(err: SharedStoreError) -> Self {
        match err {
            SharedStoreError::NotConnected => SyncError::NotConnected,
            SharedStoreError::NotFound => SyncError::RemoteNotFound,
            SharedStoreError::PermissionDenied(msg) => SyncError::PermissionDenied(msg),
            SharedStoreError::Transient(msg) => SyncError::TransientStoreFailure(msg),
        }
    }
}

impl From<RecordStoreError> for SyncError {
    fn from(err: RecordStoreError) -> Self {
        SyncError::LocalStore(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_shared_store_errors() {
        assert_eq!(SyncError::from(SharedStoreError::NotFound), SyncError::RemoteNotFound);
        assert_eq!(
            SyncError::from(SharedStoreError::Transient("timeout".into())),
            SyncError::TransientStoreFailure("timeout".into())
        );
    }

    #[test]
    fn correlation_timeout_is_not_retried() {
        assert!(!SyncError::CorrelationTimeout.is_retryable());
        assert!(SyncError::NotConnected.is_retryable());
    }
}
