use async_trait::async_trait;

use crate::fingerprint::ContentFingerprint;
use crate::ids::CanonicalId;
use crate::ports::errors::RecordStoreError;
use crate::record::ClipboardRecord;

/// Persistent local record store (CRUD plus predicate queries).
#[async_trait]
pub trait LocalRecordStorePort: Send + Sync {
    async fn get_by_id(&self, id: &CanonicalId) -> Result<Option<ClipboardRecord>, RecordStoreError>;

    /// Insert or overwrite by canonical ID.
    async fn upsert(&self, record: &ClipboardRecord) -> Result<(), RecordStoreError>;

    /// Physical removal. Normal deletes are tombstones written with `upsert`.
    async fn delete(&self, id: &CanonicalId) -> Result<(), RecordStoreError>;

    /// Records (tombstones included) with `last_modified >= since_ms`.
    async fn query_modified_since(&self, since_ms: i64) -> Result<Vec<ClipboardRecord>, RecordStoreError>;

    /// Non-deleted records carrying the given fingerprint.
    async fn find_live_by_fingerprint(
        &self,
        fingerprint: &ContentFingerprint,
    ) -> Result<Vec<ClipboardRecord>, RecordStoreError>;
}
