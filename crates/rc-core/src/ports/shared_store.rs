use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::ids::CanonicalId;
use crate::ports::errors::SharedStoreError;
use crate::record::ClipboardRecord;

/// Push notification from the shared store that something changed remotely.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteChangeNotice {
    pub canonical_id: Option<CanonicalId>,
    pub changed_at: i64,
}

/// Records returned by a pull plus the position to resume from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PullBatch {
    pub records: Vec<ClipboardRecord>,
    /// The store's latest change stamp at read time. Pass it as `since` on the
    /// next incremental pull; `None` while the store has never been written.
    pub cursor: Option<i64>,
}

impl PullBatch {
    pub fn new(records: Vec<ClipboardRecord>, cursor: Option<i64>) -> Self {
        Self { records, cursor }
    }
}

impl From<Vec<ClipboardRecord>> for PullBatch {
    fn from(records: Vec<ClipboardRecord>) -> Self {
        Self::new(records, None)
    }
}

/// Client for the cloud database shared by all devices of a sync domain.
///
/// Every call is atomic per record. The store stamps each accepted push,
/// update and delete with its own change time, strictly increasing across
/// the store; `pull` filters on that stamp, never on the writer's
/// `last_modified`, so a write that reaches the store late is still seen by
/// the next incremental pull.
#[async_trait]
pub trait SharedStorePort: Send + Sync {
    /// Create a record. Only the relay calls this.
    async fn push(&self, record: &ClipboardRecord) -> Result<(), SharedStoreError>;

    /// Overwrite an existing record (edits and tombstones).
    async fn update(&self, record: &ClipboardRecord) -> Result<(), SharedStoreError>;

    /// Records whose store change stamp is at or after `since_ms`; `None`
    /// pulls everything.
    async fn pull(&self, since_ms: Option<i64>) -> Result<PullBatch, SharedStoreError>;

    /// Tombstone a record so later pulls observe the delete. A missing record
    /// yields `SharedStoreError::NotFound`.
    async fn delete(&self, id: &CanonicalId) -> Result<(), SharedStoreError>;

    async fn subscribe_changes(&self) -> Result<mpsc::Receiver<RemoteChangeNotice>, SharedStoreError>;
}
