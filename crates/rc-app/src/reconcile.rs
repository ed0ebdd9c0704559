//! Reconciliation engine.
//!
//! Applies a snapshot pulled from the shared store to the local record store.
//! This is the only component that writes `sync_state`.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, info, info_span, warn, Instrument};

use rc_core::conflict::{self, ConflictOutcome};
use rc_core::ids::CanonicalId;
use rc_core::ports::{ClockPort, LocalRecordStorePort};
use rc_core::{
    ClipboardRecord, ConflictReport, ReconcileMode, ReconciliationResult, SyncError, SyncState,
};

use crate::observers::SyncObservers;
use crate::resolver::CanonicalIdResolver;

pub struct ReconciliationEngine {
    records: Arc<dyn LocalRecordStorePort>,
    resolver: Arc<CanonicalIdResolver>,
    clock: Arc<dyn ClockPort>,
    observers: SyncObservers,
    conflict_window_ms: i64,
}

impl ReconciliationEngine {
    pub fn new(
        records: Arc<dyn LocalRecordStorePort>,
        resolver: Arc<CanonicalIdResolver>,
        clock: Arc<dyn ClockPort>,
        observers: SyncObservers,
        conflict_window_ms: i64,
    ) -> Self {
        Self {
            records,
            resolver,
            clock,
            observers,
            conflict_window_ms,
        }
    }

    /// Merge a pulled snapshot into the local store.
    pub async fn reconcile(
        &self,
        snapshot: Vec<ClipboardRecord>,
        mode: ReconcileMode,
    ) -> Result<ReconciliationResult> {
        let span = info_span!("usecase.reconcile.apply", records = snapshot.len(), ?mode);
        async move {
            let mut result = ReconciliationResult::default();
            for remote in snapshot {
                let id = remote.canonical_id.clone();
                self.apply_one(remote, mode, &mut result)
                    .await
                    .with_context(|| format!("failed to reconcile record {id}"))?;
            }

            info!(
                inserted = result.inserted,
                overwritten = result.overwritten,
                deleted = result.deleted,
                kept_local = result.kept_local,
                merged = result.merged,
                conflicts = result.conflicts.len(),
                "Reconciliation finished"
            );
            self.observers.reconciled(&result);
            Ok(result)
        }
        .instrument(span)
        .await
    }

    async fn apply_one(
        &self,
        mut remote: ClipboardRecord,
        mode: ReconcileMode,
        result: &mut ReconciliationResult,
    ) -> Result<()> {
        let target = self.resolver.resolve_alias(&remote.canonical_id).await?;
        if target != remote.canonical_id {
            if remote.deleted {
                // The retired copy going away says nothing about the survivor.
                result.skipped += 1;
                return Ok(());
            }
            debug!(alias = %remote.canonical_id, survivor = %target, "Re-targeting aliased remote record");
            remote.canonical_id = target;
        }

        if mode == ReconcileMode::DeletesOnly && !remote.deleted {
            result.skipped += 1;
            return Ok(());
        }

        let local = self
            .records
            .get_by_id(&remote.canonical_id)
            .await
            .map_err(SyncError::from)?;

        match local {
            None => self.apply_unknown(remote, result).await,
            Some(local) if remote.deleted => self.apply_remote_tombstone(local, remote, result).await,
            Some(local) if local.deleted => {
                // Deletes are monotonic: a stale live copy never resurrects.
                if local.sync_state == SyncState::Synced {
                    result.requeue.push(local.canonical_id.clone());
                }
                result.kept_local += 1;
                Ok(())
            }
            Some(local) => self.apply_remote_edit(local, remote, result).await,
        }
    }

    async fn apply_unknown(&self, remote: ClipboardRecord, result: &mut ReconciliationResult) -> Result<()> {
        let now = self.clock.now_ms();

        if remote.deleted {
            self.store_synced(remote, now).await?;
            result.skipped += 1;
            return Ok(());
        }

        if let Some(duplicate) = self.find_duplicate(&remote).await? {
            let mut incoming = remote;
            incoming.mark_synced_at(now);
            let merge = if duplicate.last_synced_at.is_none() {
                self.resolver.adopt_shared(&duplicate, &incoming).await?
            } else {
                self.resolver.merge_duplicates(&duplicate, &incoming).await?
            };
            if merge.survivor == incoming.canonical_id {
                self.store_synced(incoming, now).await?;
            }
            result.merged += 1;
            result.aliases.push(merge.alias);
            // Only IDs the shared store knows need a remote tombstone.
            if merge.retired.last_synced_at.is_some() {
                result.retired.push(merge.retired);
            }
            return Ok(());
        }

        self.store_synced(remote, now).await?;
        result.inserted += 1;
        Ok(())
    }

    /// A live local record with the same fingerprint inside the correlation window.
    async fn find_duplicate(&self, remote: &ClipboardRecord) -> Result<Option<ClipboardRecord>> {
        let window = self.resolver.window_ms();
        let mut candidates: Vec<ClipboardRecord> = self
            .records
            .find_live_by_fingerprint(&remote.fingerprint)
            .await
            .map_err(SyncError::from)?
            .into_iter()
            .filter(|r| {
                r.canonical_id != remote.canonical_id
                    && (r.last_modified - remote.last_modified).abs() <= window
            })
            .collect();
        candidates.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.canonical_id.cmp(&b.canonical_id))
        });
        Ok(candidates.into_iter().next())
    }

    async fn apply_remote_tombstone(
        &self,
        local: ClipboardRecord,
        remote: ClipboardRecord,
        result: &mut ReconciliationResult,
    ) -> Result<()> {
        if local.deleted {
            result.skipped += 1;
            return Ok(());
        }

        let had_local_changes = local.sync_state.has_local_changes();
        let mut next = local;
        next.deleted = true;
        next.deleted_at = remote.deleted_at.or(Some(remote.last_modified));
        next.last_modified = next.last_modified.max(remote.last_modified);
        next.modified_by_role = remote.modified_by_role;

        let id = next.canonical_id.clone();
        self.store_synced(next, self.clock.now_ms()).await?;
        if had_local_changes {
            result.overridden.push(id);
        }
        result.deleted += 1;
        Ok(())
    }

    async fn apply_remote_edit(
        &self,
        local: ClipboardRecord,
        remote: ClipboardRecord,
        result: &mut ReconciliationResult,
    ) -> Result<()> {
        let now = self.clock.now_ms();

        if !local.sync_state.has_local_changes() {
            if local.fingerprint == remote.fingerprint && local.last_modified >= remote.last_modified {
                result.skipped += 1;
            } else {
                self.store_synced(remote, now).await?;
                result.overwritten += 1;
            }
            return Ok(());
        }

        if !remote.modified_after(local.last_synced_at) {
            result.kept_local += 1;
            return Ok(());
        }

        let decision = conflict::resolve(&local, &remote, self.conflict_window_ms);
        let id = local.canonical_id.clone();
        debug!(canonical_id = %id, outcome = ?decision.outcome, rule = ?decision.rule, "Conflict resolved");
        result.conflicts.push(ConflictReport {
            canonical_id: id.clone(),
            outcome: decision.outcome,
            rule: decision.rule,
        });

        match decision.outcome {
            ConflictOutcome::Merged => {
                let mut next = local;
                next.last_modified = next.last_modified.max(remote.last_modified);
                self.store_synced(next, now).await?;
                result.merged += 1;
                result.overridden.push(id);
            }
            ConflictOutcome::CloudWins => {
                self.store_synced(remote, now).await?;
                result.overwritten += 1;
                result.overridden.push(id);
            }
            ConflictOutcome::LocalWins => {
                let mut next = local;
                next.sync_state = SyncState::Pending;
                // The remote version has been seen; only newer remote edits conflict again.
                next.last_synced_at = Some(remote.last_modified);
                self.store(&next).await?;
                self.observers.sync_state_changed(&id, SyncState::Pending);
                result.requeue.push(id);
                result.kept_local += 1;
            }
            ConflictOutcome::ConflictUnresolved => {
                let mut next = local;
                next.sync_state = SyncState::Conflicted;
                self.store(&next).await?;
                warn!(canonical_id = %id, "Conflict could not be resolved");
                self.observers.sync_state_changed(&id, SyncState::Conflicted);
                self.observers.sync_error(
                    Some(&id),
                    &SyncError::IrreconcilableConflict {
                        canonical_id: id.clone(),
                    },
                );
            }
        }
        Ok(())
    }

    /// Flag a record as having a mutation in the queue.
    pub async fn mark_pending(&self, id: &CanonicalId) -> Result<Option<ClipboardRecord>> {
        self.transition(id, |record, _| {
            record.sync_state = record.sync_state.on_enqueued();
        })
        .await
    }

    /// The shared store acknowledged the last queued mutation.
    pub async fn mark_synced(&self, id: &CanonicalId) -> Result<Option<ClipboardRecord>> {
        self.transition(id, |record, now| record.mark_synced_at(now)).await
    }

    pub async fn mark_failed(&self, id: &CanonicalId) -> Result<Option<ClipboardRecord>> {
        self.transition(id, |record, _| {
            record.sync_state = record.sync_state.on_failed().unwrap_or(SyncState::Failed);
        })
        .await
    }

    async fn transition(
        &self,
        id: &CanonicalId,
        apply: impl FnOnce(&mut ClipboardRecord, i64),
    ) -> Result<Option<ClipboardRecord>> {
        let Some(mut record) = self
            .records
            .get_by_id(id)
            .await
            .map_err(SyncError::from)
            .context("failed to load record for state transition")?
        else {
            debug!(canonical_id = %id, "State transition for unknown record ignored");
            return Ok(None);
        };

        let before = record.sync_state;
        apply(&mut record, self.clock.now_ms());
        self.store(&record).await?;
        if record.sync_state != before {
            self.observers.sync_state_changed(id, record.sync_state);
        }
        Ok(Some(record))
    }

    async fn store_synced(&self, mut record: ClipboardRecord, now: i64) -> Result<()> {
        record.mark_synced_at(now);
        self.store(&record).await?;
        self.observers
            .sync_state_changed(&record.canonical_id, SyncState::Synced);
        Ok(())
    }

    async fn store(&self, record: &ClipboardRecord) -> Result<()> {
        self.records
            .upsert(record)
            .await
            .map_err(SyncError::from)
            .context("failed to write local record")
    }
}
