use serde::{Deserialize, Serialize};

/// Per-record synchronization state.
///
/// Transitions are owned by the reconciliation engine; the helpers here only
/// validate them.
///
/// ```text
/// Local ──→ Pending ──→ Synced
///              │  ▲        │
///              ▼  │        ▼
///            Failed     Conflicted ──→ Synced | Pending
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SyncState {
    /// Exists only on this device and is not scheduled for upload.
    #[default]
    Local,

    /// A mutation for this record is queued for the shared store.
    Pending,

    /// Matches the shared store as of `last_synced_at`.
    Synced,

    /// Reconciliation could not pick a winner.
    Conflicted,

    /// The last attempt to reach the shared store failed; a retry is scheduled.
    Failed,
}

impl SyncState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncState::Local => "local",
            SyncState::Pending => "pending",
            SyncState::Synced => "synced",
            SyncState::Conflicted => "conflicted",
            SyncState::Failed => "failed",
        }
    }

    /// Whether the local copy carries changes the shared store has not seen.
    pub fn has_local_changes(self) -> bool {
        !matches!(self, SyncState::Synced)
    }

    /// Queue a mutation.
    pub fn on_enqueued(self) -> Self {
        SyncState::Pending
    }

    /// Shared store acknowledged the pending mutation.
    pub fn on_acknowledged(self) -> Option<Self> {
        match self {
            SyncState::Pending | SyncState::Failed | SyncState::Conflicted => {
                Some(SyncState::Synced)
            }
            _ => None,
        }
    }

    /// Shared store call failed.
    pub fn on_failed(self) -> Option<Self> {
        match self {
            SyncState::Pending | SyncState::Failed => Some(SyncState::Failed),
            _ => None,
        }
    }
}

impl From<&str> for SyncState {
    /// Unknown values are treated as `Local` so they get re-examined.
    fn from(s: &str) -> Self {
        match s {
            "pending" => SyncState::Pending,
            "synced" => SyncState::Synced,
            "conflicted" => SyncState::Conflicted,
            "failed" => SyncState::Failed,
            _ => SyncState::Local,
        }
    }
}
