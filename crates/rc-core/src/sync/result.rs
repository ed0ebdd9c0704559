use crate::canonical::CanonicalAlias;
use crate::conflict::{ConflictOutcome, ConflictRule};
use crate::ids::CanonicalId;
use crate::record::ClipboardRecord;

/// Which remote changes a reconcile pass is allowed to apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReconcileMode {
    #[default]
    Full,
    /// Relay pulls: only tombstones are applied, the relay owns live content.
    DeletesOnly,
}

/// Outcome of one true conflict (both sides modified since last sync).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConflictReport {
    pub canonical_id: CanonicalId,
    pub outcome: ConflictOutcome,
    pub rule: ConflictRule,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReconciliationResult {
    pub inserted: usize,
    pub overwritten: usize,
    pub deleted: usize,
    pub kept_local: usize,
    pub merged: usize,
    pub skipped: usize,
    pub conflicts: Vec<ConflictReport>,
    /// Records that won locally and need an `update` enqueued.
    pub requeue: Vec<CanonicalId>,
    /// Records whose pending local change was replaced by the remote version.
    pub overridden: Vec<CanonicalId>,
    /// Duplicates retired during this pass.
    pub aliases: Vec<CanonicalAlias>,
    /// Tombstoned losers of a duplicate merge; the shared copy must be deleted.
    pub retired: Vec<ClipboardRecord>,
}

impl ReconciliationResult {
    pub fn total_applied(&self) -> usize {
        self.inserted + self.overwritten + self.deleted + self.merged
    }

    pub fn has_conflicts(&self) -> bool {
        !self.conflicts.is_empty()
    }
}
