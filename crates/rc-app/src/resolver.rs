use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{debug, info, info_span, warn, Instrument};

use rc_core::canonical::pick_survivor;
use rc_core::correlation::correlate;
use rc_core::ids::{CanonicalId, DeviceId};
use rc_core::ports::{
    CanonicalAliasPort, ClockPort, DeviceIdentityPort, LocalRecordStorePort, SharedStorePort,
};
use rc_core::{
    CanonicalAlias, ClipboardRecord, CorrelationCandidate, MatchResult, SourceHint, SyncError,
};

use crate::observers::SyncObservers;

/// Upper bound on alias hops followed by `resolve_alias`.
const MAX_ALIAS_HOPS: usize = 32;

/// Identity assigned to a captured candidate.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub canonical_id: CanonicalId,
    pub origin_device: DeviceId,
    pub relayed_by: Option<DeviceId>,
    pub matched: MatchResult,
    /// The matched record as found locally or in the shared store.
    pub existing: Option<ClipboardRecord>,
}

impl Resolution {
    pub fn is_new(&self) -> bool {
        !self.matched.is_match()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MergeOutcome {
    pub survivor: CanonicalId,
    pub alias: CanonicalAlias,
    /// The retired record, already tombstoned locally.
    pub retired: ClipboardRecord,
}

/// Canonical ID resolver
///
/// Assigns every captured clipboard item a cross-device identity: either an
/// existing record it correlates with, or a freshly minted UUID.
pub struct CanonicalIdResolver {
    records: Arc<dyn LocalRecordStorePort>,
    shared: Arc<dyn SharedStorePort>,
    aliases: Arc<dyn CanonicalAliasPort>,
    identity: Arc<dyn DeviceIdentityPort>,
    clock: Arc<dyn ClockPort>,
    observers: SyncObservers,
    window_ms: i64,
    remote_timeout: Duration,
}

impl CanonicalIdResolver {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        records: Arc<dyn LocalRecordStorePort>,
        shared: Arc<dyn SharedStorePort>,
        aliases: Arc<dyn CanonicalAliasPort>,
        identity: Arc<dyn DeviceIdentityPort>,
        clock: Arc<dyn ClockPort>,
        observers: SyncObservers,
        window_ms: i64,
    ) -> Self {
        Self {
            records,
            shared,
            aliases,
            identity,
            clock,
            observers,
            window_ms,
            remote_timeout: Duration::from_millis(window_ms.max(0) as u64),
        }
    }

    /// Bound the shared-store lookup more tightly than the correlation window.
    pub fn with_remote_timeout(mut self, timeout: Duration) -> Self {
        self.remote_timeout = timeout;
        self
    }

    pub fn window_ms(&self) -> i64 {
        self.window_ms
    }

    pub async fn resolve(&self, candidate: &CorrelationCandidate) -> Result<Resolution> {
        let span = info_span!(
            "usecase.resolver.resolve",
            source = ?candidate.source,
            fingerprint = %candidate.fingerprint,
        );
        async move {
            let window_records = self.gather_window(candidate).await?;
            let matched = correlate(candidate, &window_records, self.window_ms);
            let current = self.identity.current_device_id();
            let is_relay = self.identity.role().is_relay();

            let resolution = match matched.canonical_id().cloned() {
                Some(canonical_id) => {
                    let existing = window_records
                        .into_iter()
                        .find(|r| r.canonical_id == canonical_id);
                    let origin_device = existing
                        .as_ref()
                        .map(|r| r.origin_device.clone())
                        .unwrap_or_else(|| current.clone());
                    let relayed_by = if is_relay && origin_device != current {
                        Some(current.clone())
                    } else {
                        existing.as_ref().and_then(|r| r.relayed_by.clone())
                    };
                    debug!(canonical_id = %canonical_id, "Candidate correlated with existing record");
                    Resolution {
                        canonical_id,
                        origin_device,
                        relayed_by,
                        matched,
                        existing,
                    }
                }
                None => {
                    let origin_device = match (candidate.source, &candidate.source_device) {
                        (SourceHint::HandoffReceive, Some(sender)) => sender.clone(),
                        _ => current.clone(),
                    };
                    let relayed_by = (is_relay && origin_device != current).then(|| current.clone());
                    let canonical_id = CanonicalId::new();
                    debug!(canonical_id = %canonical_id, "Minted new canonical id");
                    Resolution {
                        canonical_id,
                        origin_device,
                        relayed_by,
                        matched,
                        existing: None,
                    }
                }
            };
            Ok(resolution)
        }
        .instrument(span)
        .await
    }

    /// Local records in the window plus whatever the shared store returns in time.
    async fn gather_window(&self, candidate: &CorrelationCandidate) -> Result<Vec<ClipboardRecord>> {
        let since = candidate.received_at.saturating_sub(self.window_ms);

        let local = self
            .records
            .query_modified_since(since)
            .await
            .map_err(SyncError::from)
            .context("failed to query local window records")?;

        let remote = match tokio::time::timeout(self.remote_timeout, self.shared.pull(Some(since))).await {
            Ok(Ok(batch)) => batch.records,
            Ok(Err(err)) => {
                debug!(error = %err, reason = %SyncError::CorrelationTimeout, "Shared store unavailable; using local records only");
                Vec::new()
            }
            Err(_) => {
                debug!(reason = %SyncError::CorrelationTimeout, "Shared store lookup timed out; using local records only");
                Vec::new()
            }
        };

        // Local copies take precedence over their remote versions.
        let mut by_id: HashMap<CanonicalId, ClipboardRecord> = HashMap::new();
        for record in remote {
            by_id.insert(record.canonical_id.clone(), record);
        }
        for record in local {
            by_id.insert(record.canonical_id.clone(), record);
        }

        let mut merged: Vec<ClipboardRecord> = by_id.into_values().collect();
        merged.sort_by(|a, b| a.canonical_id.cmp(&b.canonical_id));
        Ok(merged)
    }

    /// Retire one of two records that turned out to be the same item.
    ///
    /// The alias is persisted before the loser is tombstoned so that a crash in
    /// between still lets `resolve_alias` redirect the loser's ID.
    #[tracing::instrument(
        name = "usecase.resolver.merge_duplicates",
        skip(self, a, b),
        fields(a = %a.canonical_id, b = %b.canonical_id)
    )]
    pub async fn merge_duplicates(&self, a: &ClipboardRecord, b: &ClipboardRecord) -> Result<MergeOutcome> {
        let choice = pick_survivor(a, b);
        self.retire_into(choice.loser, choice.survivor).await
    }

    /// Fold a record that never reached the shared store into the shared copy
    /// of the same item. The shared ID always survives.
    #[tracing::instrument(
        name = "usecase.resolver.adopt_shared",
        skip(self, local_only, shared),
        fields(local = %local_only.canonical_id, shared = %shared.canonical_id)
    )]
    pub async fn adopt_shared(
        &self,
        local_only: &ClipboardRecord,
        shared: &ClipboardRecord,
    ) -> Result<MergeOutcome> {
        self.retire_into(local_only, shared).await
    }

    async fn retire_into(&self, loser: &ClipboardRecord, survivor: &ClipboardRecord) -> Result<MergeOutcome> {
        let survivor = survivor.canonical_id.clone();
        let now = self.clock.now_ms();

        let alias = CanonicalAlias {
            alias_id: loser.canonical_id.clone(),
            surviving_id: survivor.clone(),
            created_at: now,
        };
        self.aliases
            .record_alias(&alias)
            .await
            .context("failed to persist canonical alias")?;

        let mut retired = loser.clone();
        retired.tombstone(self.identity.role(), now);
        self.records
            .upsert(&retired)
            .await
            .map_err(SyncError::from)
            .context("failed to tombstone merged duplicate")?;

        info!(alias = %alias.alias_id, survivor = %survivor, "Merged duplicate canonical ids");
        self.observers.canonical_merged(&alias.alias_id, &survivor);

        Ok(MergeOutcome {
            survivor,
            alias,
            retired,
        })
    }

    /// Follow alias links to the surviving ID. Non-aliased IDs map to themselves.
    pub async fn resolve_alias(&self, id: &CanonicalId) -> Result<CanonicalId> {
        let mut current = id.clone();
        let mut seen = HashSet::new();

        for _ in 0..MAX_ALIAS_HOPS {
            if !seen.insert(current.clone()) {
                warn!(canonical_id = %id, "Alias cycle detected");
                break;
            }
            match self
                .aliases
                .find_survivor(&current)
                .await
                .context("failed to look up canonical alias")?
            {
                Some(next) => current = next,
                None => break,
            }
        }
        Ok(current)
    }
}
