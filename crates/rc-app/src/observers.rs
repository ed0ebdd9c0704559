use std::sync::Arc;

use rc_core::ids::CanonicalId;
use rc_core::ports::SyncObserverPort;
use rc_core::{OrchestratorPhase, ReconciliationResult, SyncError, SyncState};

/// Fan-out over the registered UI observers.
#[derive(Clone, Default)]
pub struct SyncObservers {
    observers: Vec<Arc<dyn SyncObserverPort>>,
}

impl SyncObservers {
    pub fn new(observers: Vec<Arc<dyn SyncObserverPort>>) -> Self {
        Self { observers }
    }

    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }

    pub fn sync_state_changed(&self, canonical_id: &CanonicalId, state: SyncState) {
        for observer in &self.observers {
            observer.on_sync_state_changed(canonical_id, state);
        }
    }

    pub fn reconciled(&self, result: &ReconciliationResult) {
        for observer in &self.observers {
            observer.on_reconciled(result);
        }
    }

    pub fn phase_changed(&self, phase: OrchestratorPhase) {
        for observer in &self.observers {
            observer.on_phase_changed(phase);
        }
    }

    pub fn canonical_merged(&self, alias: &CanonicalId, survivor: &CanonicalId) {
        for observer in &self.observers {
            observer.on_canonical_merged(alias, survivor);
        }
    }

    pub fn sync_error(&self, canonical_id: Option<&CanonicalId>, error: &SyncError) {
        for observer in &self.observers {
            observer.on_sync_error(canonical_id, error);
        }
    }
}
