use anyhow::{anyhow, Context, Result};

use rc_core::ids::{CanonicalId, DeviceId};
use rc_core::{ClipboardContent, ClipboardRecord, ContentFingerprint, DeviceRole, SyncState};

use crate::db::models::ClipboardRecordRow;
use crate::db::ports::{InsertMapper, RowMapper};

pub struct ClipboardRecordRowMapper;

impl InsertMapper<ClipboardRecord, ClipboardRecordRow> for ClipboardRecordRowMapper {
    fn to_row(&self, domain: &ClipboardRecord) -> Result<ClipboardRecordRow> {
        Ok(ClipboardRecordRow {
            canonical_id: domain.canonical_id.as_str().to_string(),
            content_type: domain.content_type().as_str().to_string(),
            content_json: serde_json::to_string(&domain.content)
                .context("failed to serialize clipboard content")?,
            fingerprint: domain.fingerprint.to_string(),
            created_at: domain.created_at,
            last_modified: domain.last_modified,
            origin_device: domain.origin_device.as_str().to_string(),
            relayed_by: domain.relayed_by.as_ref().map(|d| d.as_str().to_string()),
            modified_by_role: domain.modified_by_role.as_str().to_string(),
            sync_state: domain.sync_state.as_str().to_string(),
            last_synced_at: domain.last_synced_at,
            deleted: domain.deleted,
            deleted_at: domain.deleted_at,
        })
    }
}

impl RowMapper<ClipboardRecordRow, ClipboardRecord> for ClipboardRecordRowMapper {
    fn to_domain(&self, row: &ClipboardRecordRow) -> Result<ClipboardRecord> {
        let content: ClipboardContent = serde_json::from_str(&row.content_json)
            .with_context(|| format!("corrupt content for record {}", row.canonical_id))?;
        let fingerprint: ContentFingerprint = row
            .fingerprint
            .parse()
            .with_context(|| format!("corrupt fingerprint for record {}", row.canonical_id))?;
        let modified_by_role: DeviceRole = row
            .modified_by_role
            .parse()
            .map_err(|e: String| anyhow!("corrupt role for record {}: {e}", row.canonical_id))?;

        Ok(ClipboardRecord {
            canonical_id: CanonicalId::from(row.canonical_id.as_str()),
            content,
            fingerprint,
            created_at: row.created_at,
            last_modified: row.last_modified,
            origin_device: DeviceId::new(row.origin_device.as_str()),
            relayed_by: row.relayed_by.as_deref().map(DeviceId::new),
            modified_by_role,
            sync_state: SyncState::from(row.sync_state.as_str()),
            last_synced_at: row.last_synced_at,
            deleted: row.deleted,
            deleted_at: row.deleted_at,
        })
    }
}
