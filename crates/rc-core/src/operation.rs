//! Pending mutations awaiting shared-store connectivity.

use serde::{Deserialize, Serialize};

use crate::ids::{CanonicalId, OperationId};
use crate::record::ClipboardRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationType {
    Push,
    Update,
    Delete,
}

impl OperationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationType::Push => "push",
            OperationType::Update => "update",
            OperationType::Delete => "delete",
        }
    }
}

impl TryFrom<&str> for OperationType {
    type Error = String;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        match s {
            "push" => Ok(OperationType::Push),
            "update" => Ok(OperationType::Update),
            "delete" => Ok(OperationType::Delete),
            other => Err(format!("unknown operation type: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingOperation {
    pub id: OperationId,
    pub op_type: OperationType,
    /// `None` for a push of an item whose canonical ID is not resolved yet.
    pub target: Option<CanonicalId>,
    /// Record state at enqueue time.
    pub payload: ClipboardRecord,
    pub enqueued_at: i64,
    pub attempts: u32,
    pub next_attempt_at: Option<i64>,
    pub last_error: Option<String>,
}

impl PendingOperation {
    pub fn new(op_type: OperationType, payload: ClipboardRecord, now_ms: i64) -> Self {
        Self {
            id: OperationId::new(),
            op_type,
            target: Some(payload.canonical_id.clone()),
            payload,
            enqueued_at: now_ms,
            attempts: 0,
            next_attempt_at: None,
            last_error: None,
        }
    }

    pub fn push(payload: ClipboardRecord, now_ms: i64) -> Self {
        Self::new(OperationType::Push, payload, now_ms)
    }

    pub fn update(payload: ClipboardRecord, now_ms: i64) -> Self {
        Self::new(OperationType::Update, payload, now_ms)
    }

    pub fn delete(payload: ClipboardRecord, now_ms: i64) -> Self {
        Self::new(OperationType::Delete, payload, now_ms)
    }

    /// Same target and same type: the newer operation replaces the older.
    pub fn supersedes(&self, other: &PendingOperation) -> bool {
        self.op_type == other.op_type && self.target.is_some() && self.target == other.target
    }

    /// Not yet due because of backoff.
    pub fn is_deferred(&self, now_ms: i64) -> bool {
        self.next_attempt_at.is_some_and(|at| at > now_ms)
    }
}
