use crate::error::SyncError;
use crate::ids::CanonicalId;
use crate::record::SyncState;
use crate::sync::{OrchestratorPhase, ReconciliationResult};

/// Read-only fan-out of sync progress to the UI layer.
///
/// Implementations must not block; the orchestrator calls them inline.
pub trait SyncObserverPort: Send + Sync {
    fn on_sync_state_changed(&self, canonical_id: &CanonicalId, state: SyncState);

    fn on_reconciled(&self, result: &ReconciliationResult);

    fn on_phase_changed(&self, _phase: OrchestratorPhase) {}

    /// `alias` was retired in favour of `survivor`; migrate dependent metadata.
    fn on_canonical_merged(&self, _alias: &CanonicalId, _survivor: &CanonicalId) {}

    fn on_sync_error(&self, _canonical_id: Option<&CanonicalId>, _error: &SyncError) {}
}
