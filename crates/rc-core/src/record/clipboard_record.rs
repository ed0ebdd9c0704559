use serde::{Deserialize, Serialize};

use super::{ClipboardContent, ContentType, SyncState};
use crate::device::DeviceRole;
use crate::fingerprint::ContentFingerprint;
use crate::ids::{CanonicalId, DeviceId};

/// A logical clipboard entry as seen by one device.
///
/// Timestamps are epoch milliseconds. `last_modified` moves on every field
/// change; `last_synced_at` is the last point both this device and the shared
/// store agreed on the record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClipboardRecord {
    pub canonical_id: CanonicalId,
    pub content: ClipboardContent,
    pub fingerprint: ContentFingerprint,
    pub created_at: i64,
    pub last_modified: i64,
    pub origin_device: DeviceId,
    pub relayed_by: Option<DeviceId>,
    pub modified_by_role: DeviceRole,
    pub sync_state: SyncState,
    pub last_synced_at: Option<i64>,
    pub deleted: bool,
    pub deleted_at: Option<i64>,
}

impl ClipboardRecord {
    pub fn new(
        canonical_id: CanonicalId,
        content: ClipboardContent,
        fingerprint: ContentFingerprint,
        origin_device: DeviceId,
        role: DeviceRole,
        now_ms: i64,
    ) -> Self {
        Self {
            canonical_id,
            content,
            fingerprint,
            created_at: now_ms,
            last_modified: now_ms,
            origin_device,
            relayed_by: None,
            modified_by_role: role,
            sync_state: SyncState::Local,
            last_synced_at: None,
            deleted: false,
            deleted_at: None,
        }
    }

    pub fn content_type(&self) -> ContentType {
        self.content.content_type()
    }

    /// Not tombstoned.
    pub fn is_live(&self) -> bool {
        !self.deleted
    }

    /// Replace the content as the result of a user edit.
    pub fn edit(
        &mut self,
        content: ClipboardContent,
        fingerprint: ContentFingerprint,
        role: DeviceRole,
        now_ms: i64,
    ) {
        self.content = content;
        self.fingerprint = fingerprint;
        self.modified_by_role = role;
        self.touch(now_ms);
    }

    /// Soft-delete. Physical removal is left to the tombstone TTL sweeper.
    pub fn tombstone(&mut self, role: DeviceRole, now_ms: i64) {
        if self.deleted {
            return;
        }
        self.deleted = true;
        self.deleted_at = Some(now_ms);
        self.modified_by_role = role;
        self.touch(now_ms);
    }

    /// Note the relay that carried this item into the shared store. Returns
    /// false when it was already recorded.
    pub fn note_relayed_by(&mut self, relay: DeviceId, role: DeviceRole, now_ms: i64) -> bool {
        if self.relayed_by.as_ref() == Some(&relay) {
            return false;
        }
        self.relayed_by = Some(relay);
        self.modified_by_role = role;
        self.touch(now_ms);
        true
    }

    /// Whether this (remote) version changed after the given local sync point.
    pub fn modified_after(&self, sync_point: Option<i64>) -> bool {
        match sync_point {
            Some(ts) => self.last_modified > ts,
            None => true,
        }
    }

    /// Stamp the record as agreeing with the shared store.
    pub fn mark_synced_at(&mut self, now_ms: i64) {
        self.sync_state = SyncState::Synced;
        self.last_synced_at = Some(now_ms.max(self.last_modified));
    }

    fn touch(&mut self, now_ms: i64) {
        // Never move backwards; clocks across devices are not monotonic.
        self.last_modified = now_ms.max(self.last_modified);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fingerprint::HashAlgorithm;

    fn fp(byte: u8) -> ContentFingerprint {
        ContentFingerprint::new(HashAlgorithm::Blake3V1, [byte; 32])
    }

    fn record() -> ClipboardRecord {
        ClipboardRecord::new(
            CanonicalId::from("c-1"),
            ClipboardContent::text("hello"),
            fp(1),
            DeviceId::new("dev-a"),
            DeviceRole::Client,
            1_000,
        )
    }

    #[test]
    fn new_record_is_local_and_live() {
        let r = record();
        assert_eq!(r.sync_state, SyncState::Local);
        assert!(r.is_live());
        assert_eq!(r.created_at, r.last_modified);
    }

    #[test]
    fn edit_updates_last_modified_and_role() {
        let mut r = record();
        r.edit(ClipboardContent::text("bye"), fp(2), DeviceRole::Relay, 2_000);
        assert_eq!(r.last_modified, 2_000);
        assert_eq!(r.modified_by_role, DeviceRole::Relay);
        assert_eq!(r.fingerprint, fp(2));
    }

    #[test]
    fn tombstone_is_idempotent() {
        let mut r = record();
        r.tombstone(DeviceRole::Client, 3_000);
        r.tombstone(DeviceRole::Client, 9_000);
        assert!(r.deleted);
        assert_eq!(r.deleted_at, Some(3_000));
        assert_eq!(r.last_modified, 3_000);
    }

    #[test]
    fn noting_the_relay_counts_as_a_change_once() {
        let mut r = record();
        assert!(r.note_relayed_by(DeviceId::new("relay-1"), DeviceRole::Relay, 4_000));
        assert_eq!(r.relayed_by, Some(DeviceId::new("relay-1")));
        assert_eq!(r.last_modified, 4_000);

        assert!(!r.note_relayed_by(DeviceId::new("relay-1"), DeviceRole::Relay, 5_000));
        assert_eq!(r.last_modified, 4_000);
    }

    #[test]
    fn modified_after_sync_point() {
        let r = record();
        assert!(r.modified_after(None));
        assert!(r.modified_after(Some(999)));
        assert!(!r.modified_after(Some(1_000)));
    }

    #[test]
    fn last_modified_never_moves_backwards() {
        let mut r = record();
        r.edit(ClipboardContent::text("x"), fp(3), DeviceRole::Client, 500);
        assert_eq!(r.last_modified, 1_000);
    }
}
