use anyhow::{anyhow, Context, Result};

use rc_core::ids::{CanonicalId, OperationId};
use rc_core::{ClipboardRecord, OperationType, PendingOperation};

use crate::db::models::PendingOperationRow;
use crate::db::ports::{InsertMapper, RowMapper};

/// `position` is left at 0; the repository assigns queue order.
pub struct PendingOperationRowMapper;

impl InsertMapper<PendingOperation, PendingOperationRow> for PendingOperationRowMapper {
    fn to_row(&self, domain: &PendingOperation) -> Result<PendingOperationRow> {
        Ok(PendingOperationRow {
            id: domain.id.as_str().to_string(),
            position: 0,
            op_type: domain.op_type.as_str().to_string(),
            target: domain.target.as_ref().map(|t| t.as_str().to_string()),
            payload_json: serde_json::to_string(&domain.payload)
                .context("failed to serialize operation payload")?,
            enqueued_at: domain.enqueued_at,
            attempts: i32::try_from(domain.attempts).unwrap_or(i32::MAX),
            next_attempt_at: domain.next_attempt_at,
            last_error: domain.last_error.clone(),
        })
    }
}

impl RowMapper<PendingOperationRow, PendingOperation> for PendingOperationRowMapper {
    fn to_domain(&self, row: &PendingOperationRow) -> Result<PendingOperation> {
        let op_type = OperationType::try_from(row.op_type.as_str()).map_err(|e| anyhow!(e))?;
        let payload: ClipboardRecord = serde_json::from_str(&row.payload_json)
            .with_context(|| format!("corrupt payload for operation {}", row.id))?;

        Ok(PendingOperation {
            id: OperationId::from(row.id.as_str()),
            op_type,
            target: row.target.as_deref().map(CanonicalId::from),
            payload,
            enqueued_at: row.enqueued_at,
            attempts: u32::try_from(row.attempts).unwrap_or(0),
            next_attempt_at: row.next_attempt_at,
            last_error: row.last_error.clone(),
        })
    }
}
