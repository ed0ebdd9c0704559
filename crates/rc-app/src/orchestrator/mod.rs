//! Relay router / sync orchestrator.
//!
//! One control loop per device owns every sync cycle. Clipboard captures,
//! user edits, connectivity transitions, shared-store notifications and the
//! poll timer all arrive as messages into that loop, so at most one cycle is
//! ever active.
//!
//! ```text
//! relay:  Idle ──→ Pushing ──→ Idle            (captures are pushed at once)
//! client: Idle ──→ Pulling ──→ Reconciling ──→ Idle
//! ```

mod executor;
mod handle;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, info_span, warn, Instrument};

use rc_core::config::SyncConfig;
use rc_core::fingerprint::{fingerprint, ContentFingerprint};
use rc_core::ids::CanonicalId;
use rc_core::ports::RemoteChangeNotice;
use rc_core::{
    ClipboardContent, ClipboardRecord, CorrelationCandidate, DeviceRole, HandoffPayload,
    MatchResult, OperationType, OrchestratorPhase, PendingOperation, ReconcileMode,
    ReconciliationResult, RetryPolicy, SyncError,
};

use crate::deps::SyncDeps;
use crate::observers::SyncObservers;
use crate::queue::{DrainOutcome, DrainReport, OfflineOperationQueue};
use crate::reconcile::ReconciliationEngine;
use crate::resolver::CanonicalIdResolver;

pub use executor::SharedStoreExecutor;
pub use handle::SyncHandle;
use handle::SyncCommand;

const COMMAND_CHANNEL_CAPACITY: usize = 64;

/// What happened to a captured clipboard item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureOutcome {
    /// New canonical record.
    Created(CanonicalId),
    /// Same item as an existing record; nothing new to share.
    Matched(CanonicalId),
    /// Similar content on the relay: recorded as a revision of the existing record.
    Revised(CanonicalId),
    /// Our own write-back to the clipboard.
    EchoSuppressed(CanonicalId),
}

impl CaptureOutcome {
    pub fn canonical_id(&self) -> &CanonicalId {
        match self {
            CaptureOutcome::Created(id)
            | CaptureOutcome::Matched(id)
            | CaptureOutcome::Revised(id)
            | CaptureOutcome::EchoSuppressed(id) => id,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrchestratorSettings {
    pub poll_interval: Duration,
    pub handoff_window_ms: i64,
    pub local_echo_window_ms: i64,
    pub conflict_window_ms: i64,
    pub retry: RetryPolicy,
    /// Bound on the shared-store lookup during correlation.
    pub remote_lookup_timeout: Duration,
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self::from_config(&SyncConfig::default())
    }
}

impl OrchestratorSettings {
    pub fn from_config(config: &SyncConfig) -> Self {
        let handoff_window_ms = config.handoff_window_ms();
        Self {
            poll_interval: config.poll_interval(),
            handoff_window_ms,
            local_echo_window_ms: config.local_echo_window_ms(),
            conflict_window_ms: config.conflict_window_ms(),
            retry: config.retry_policy(),
            remote_lookup_timeout: Duration::from_millis(handoff_window_ms.max(0) as u64),
        }
    }
}

pub struct SyncOrchestrator {
    deps: SyncDeps,
    settings: OrchestratorSettings,
    role: DeviceRole,
    queue: Arc<OfflineOperationQueue>,
    resolver: Arc<CanonicalIdResolver>,
    engine: ReconciliationEngine,
    executor: SharedStoreExecutor,
    observers: SyncObservers,
    commands: mpsc::Receiver<SyncCommand>,
    connectivity: watch::Receiver<bool>,
    shutdown: CancellationToken,
    phase: OrchestratorPhase,
    online: bool,
    foreground: bool,
    /// Shared-store change stamp returned by the last applied pull.
    pull_cursor: Option<i64>,
}

impl SyncOrchestrator {
    /// Wire the use cases and restore the persisted queue.
    pub async fn new(
        deps: SyncDeps,
        settings: OrchestratorSettings,
        observers: SyncObservers,
    ) -> Result<(Self, SyncHandle)> {
        let queue = OfflineOperationQueue::load(deps.operations.clone(), deps.clock.clone(), settings.retry)
            .await
            .context("failed to restore offline queue")?;

        let resolver = Arc::new(
            CanonicalIdResolver::new(
                deps.records.clone(),
                deps.shared.clone(),
                deps.aliases.clone(),
                deps.identity.clone(),
                deps.clock.clone(),
                observers.clone(),
                settings.handoff_window_ms,
            )
            .with_remote_timeout(settings.remote_lookup_timeout),
        );
        let engine = ReconciliationEngine::new(
            deps.records.clone(),
            resolver.clone(),
            deps.clock.clone(),
            observers.clone(),
            settings.conflict_window_ms,
        );

        let connectivity = deps.connectivity.subscribe();
        let online = *connectivity.borrow();
        let executor = SharedStoreExecutor::new(deps.shared.clone(), connectivity.clone());

        let (tx, rx) = mpsc::channel(COMMAND_CHANNEL_CAPACITY);
        let shutdown = CancellationToken::new();
        let handle = SyncHandle::new(tx, shutdown.clone());

        let orchestrator = Self {
            role: deps.identity.role(),
            deps,
            settings,
            queue: Arc::new(queue),
            resolver,
            engine,
            executor,
            observers,
            commands: rx,
            connectivity,
            shutdown,
            phase: OrchestratorPhase::Idle,
            online,
            foreground: true,
            pull_cursor: None,
        };
        Ok((orchestrator, handle))
    }

    /// Build and run on the current tokio runtime.
    pub async fn spawn(
        deps: SyncDeps,
        settings: OrchestratorSettings,
        observers: SyncObservers,
    ) -> Result<(SyncHandle, JoinHandle<()>)> {
        let (orchestrator, handle) = Self::new(deps, settings, observers).await?;
        let join = tokio::spawn(orchestrator.run());
        Ok((handle, join))
    }

    pub fn queue(&self) -> Arc<OfflineOperationQueue> {
        self.queue.clone()
    }

    pub async fn run(mut self) {
        let span = info_span!("usecase.orchestrator.run", role = %self.role);
        async move {
            info!(online = self.online, "Sync orchestrator started");

            let mut notices = match self.deps.shared.subscribe_changes().await {
                Ok(rx) => Some(rx),
                Err(err) => {
                    warn!(error = %err, "Shared store change notifications unavailable; relying on polling");
                    None
                }
            };
            let mut connectivity_open = true;

            let mut ticker = tokio::time::interval(self.settings.poll_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            ticker.tick().await;

            if self.online {
                self.reconnect_sequence().await;
            }

            loop {
                tokio::select! {
                    biased;

                    _ = self.shutdown.cancelled() => {
                        info!("Shutdown requested");
                        break;
                    }
                    changed = self.connectivity.changed(), if connectivity_open => {
                        match changed {
                            Ok(()) => {
                                let online = *self.connectivity.borrow_and_update();
                                self.on_connectivity(online).await;
                            }
                            Err(_) => {
                                warn!("Connectivity source closed");
                                connectivity_open = false;
                            }
                        }
                    }
                    command = self.commands.recv() => {
                        match command {
                            Some(command) => self.handle_command(command).await,
                            None => {
                                info!("All sync handles dropped");
                                break;
                            }
                        }
                    }
                    notice = next_notice(&mut notices) => {
                        match notice {
                            Some(notice) => self.on_remote_change(notice).await,
                            None => {
                                debug!("Shared store notification channel closed");
                                notices = None;
                            }
                        }
                    }
                    _ = ticker.tick() => {
                        self.on_tick().await;
                    }
                }
            }

            if self.phase.is_active() {
                self.set_phase(self.phase.abort());
            }
            info!("Sync orchestrator stopped");
        }
        .instrument(span)
        .await
    }

    async fn handle_command(&mut self, command: SyncCommand) {
        match command {
            SyncCommand::LocalCopy { content, reply } => {
                let result = self.record_local_copy(content).await;
                let _ = reply.send(result);
            }
            SyncCommand::Handoff { payload, reply } => {
                let result = self.receive_handoff(payload).await;
                let _ = reply.send(result);
            }
            SyncCommand::Edit {
                canonical_id,
                content,
                reply,
            } => {
                let result = self.edit(canonical_id, content).await;
                let _ = reply.send(result);
            }
            SyncCommand::Delete { canonical_id, reply } => {
                let result = self.delete(canonical_id).await;
                let _ = reply.send(result);
            }
            SyncCommand::SetForeground { foreground, reply } => {
                debug!(foreground, "Foreground state changed");
                self.foreground = foreground;
                let _ = reply.send(Ok(()));
            }
            SyncCommand::AppActivated { reply } => {
                self.foreground = true;
                self.sync_cycle().await;
                let _ = reply.send(Ok(()));
            }
            SyncCommand::RequestSync { reply } => {
                self.sync_cycle().await;
                let _ = reply.send(Ok(()));
            }
        }
    }

    // ----- captures -------------------------------------------------------

    async fn record_local_copy(&mut self, content: ClipboardContent) -> Result<CaptureOutcome> {
        let fingerprint = fingerprint(self.deps.hash.as_ref(), &content)?;
        let now = self.deps.clock.now_ms();

        if let Some(id) = self.recent_echo(&fingerprint, now).await? {
            debug!(canonical_id = %id, "Ignoring clipboard write-back");
            return Ok(CaptureOutcome::EchoSuppressed(id));
        }

        let candidate = CorrelationCandidate::local_copy(content, fingerprint, now);
        self.capture(candidate).await
    }

    async fn receive_handoff(&mut self, payload: HandoffPayload) -> Result<CaptureOutcome> {
        let fingerprint = fingerprint(self.deps.hash.as_ref(), &payload.content)?;
        let candidate = CorrelationCandidate::from_handoff(payload, fingerprint);
        self.capture(candidate).await
    }

    /// A live record with this fingerprint was written or synced within the
    /// local-echo window.
    async fn recent_echo(&self, fingerprint: &ContentFingerprint, now: i64) -> Result<Option<CanonicalId>> {
        let horizon = now.saturating_sub(self.settings.local_echo_window_ms);
        let matches = self
            .deps
            .records
            .find_live_by_fingerprint(fingerprint)
            .await
            .map_err(SyncError::from)?;
        Ok(matches
            .into_iter()
            .find(|r| r.last_modified.max(r.last_synced_at.unwrap_or(i64::MIN)) >= horizon)
            .map(|r| r.canonical_id))
    }

    async fn capture(&mut self, candidate: CorrelationCandidate) -> Result<CaptureOutcome> {
        let resolution = self.resolver.resolve(&candidate).await?;
        let now = self.deps.clock.now_ms();
        let id = resolution.canonical_id.clone();

        let local = self
            .deps
            .records
            .get_by_id(&id)
            .await
            .map_err(SyncError::from)?;

        match resolution.matched {
            MatchResult::NoMatch => {
                let mut record = ClipboardRecord::new(
                    id.clone(),
                    candidate.content,
                    candidate.fingerprint,
                    resolution.origin_device,
                    self.role,
                    now,
                );
                record.relayed_by = resolution.relayed_by;
                self.store(&record).await?;
                info!(canonical_id = %id, source = ?candidate.source, "Captured new clipboard item");

                if self.role.is_relay() {
                    self.enqueue(PendingOperation::push(record, now)).await?;
                    self.push_cycle().await;
                }
                Ok(CaptureOutcome::Created(id))
            }
            MatchResult::Similar { .. } if self.role.is_relay() => {
                let mut record = local
                    .or(resolution.existing)
                    .ok_or_else(|| anyhow!("matched record {id} disappeared"))?;
                record.edit(candidate.content, candidate.fingerprint, self.role, now);
                if resolution.relayed_by.is_some() {
                    record.relayed_by = resolution.relayed_by;
                }
                self.store(&record).await?;
                self.enqueue_change(&record).await?;
                self.push_cycle().await;
                Ok(CaptureOutcome::Revised(id))
            }
            MatchResult::Exact { .. } | MatchResult::Similar { .. } => {
                let known_locally = local.is_some();
                let matched = local.or_else(|| {
                    // Known only to the shared store so far.
                    resolution.existing.map(|mut remote| {
                        remote.mark_synced_at(now);
                        remote
                    })
                });
                let Some(mut record) = matched else {
                    debug!(canonical_id = %id, "Capture matched a record no longer on hand");
                    return Ok(CaptureOutcome::Matched(id));
                };

                let relay_noted = match resolution.relayed_by {
                    Some(relay) if self.role.is_relay() => record.note_relayed_by(relay, self.role, now),
                    _ => false,
                };
                if relay_noted || !known_locally {
                    self.store(&record).await?;
                }
                if relay_noted && self.is_shared(&record) {
                    self.enqueue_change(&record).await?;
                    self.push_cycle().await;
                }
                debug!(canonical_id = %id, relay_noted, "Capture matched existing record");
                Ok(CaptureOutcome::Matched(id))
            }
        }
    }

    // ----- user mutations -------------------------------------------------

    #[tracing::instrument(name = "usecase.orchestrator.edit", skip(self, content), fields(canonical_id = %canonical_id))]
    async fn edit(&mut self, canonical_id: CanonicalId, content: ClipboardContent) -> Result<()> {
        let id = self.resolver.resolve_alias(&canonical_id).await?;
        let mut record = self.load(&id).await?;
        if record.deleted {
            bail!("record {id} has been deleted");
        }

        let fingerprint = fingerprint(self.deps.hash.as_ref(), &content)?;
        record.edit(content, fingerprint, self.role, self.deps.clock.now_ms());
        self.store(&record).await?;

        if self.is_shared(&record) {
            self.enqueue_change(&record).await?;
            self.push_cycle().await;
        }
        Ok(())
    }

    #[tracing::instrument(name = "usecase.orchestrator.delete", skip(self), fields(canonical_id = %canonical_id))]
    async fn delete(&mut self, canonical_id: CanonicalId) -> Result<()> {
        let id = self.resolver.resolve_alias(&canonical_id).await?;
        let mut record = self.load(&id).await?;
        if record.deleted {
            debug!("Record already deleted");
            return Ok(());
        }

        record.tombstone(self.role, self.deps.clock.now_ms());
        self.store(&record).await?;

        if self.is_shared(&record) {
            self.enqueue_change(&record).await?;
            self.push_cycle().await;
        }
        Ok(())
    }

    /// Whether the shared store has, or will have, a copy of this record.
    fn is_shared(&self, record: &ClipboardRecord) -> bool {
        self.role.is_relay() || record.last_synced_at.is_some()
    }

    /// Queue the record's current state, folding into a not-yet-sent push.
    async fn enqueue_change(&self, record: &ClipboardRecord) -> Result<()> {
        let now = self.deps.clock.now_ms();
        let id = &record.canonical_id;

        let operation = if record.deleted {
            PendingOperation::delete(record.clone(), now)
        } else if self
            .queue
            .pending_for(id)
            .await
            .iter()
            .any(|op| op.op_type == OperationType::Push)
        {
            PendingOperation::push(record.clone(), now)
        } else {
            PendingOperation::update(record.clone(), now)
        };
        self.enqueue(operation).await
    }

    async fn enqueue(&self, operation: PendingOperation) -> Result<()> {
        let target = operation.target.clone();
        self.queue.enqueue(operation).await?;
        if let Some(id) = target {
            self.engine.mark_pending(&id).await?;
        }
        Ok(())
    }

    // ----- cycles ---------------------------------------------------------

    async fn on_connectivity(&mut self, online: bool) {
        let was_online = self.online;
        self.online = online;
        match (was_online, online) {
            (false, true) => {
                info!("Connectivity restored");
                self.reconnect_sequence().await;
            }
            (true, false) => info!("Connectivity lost"),
            (true, true) => {
                // The watch only wakes on transitions, so an unchanged value
                // means the link dropped and came back before we looked.
                info!("Connectivity lost and restored");
                self.reconnect_sequence().await;
            }
            (false, false) => debug!("Connectivity flapped while offline"),
        }
    }

    /// Drain, then one full pull, then resume normal operation. Abandoned as
    /// soon as connectivity drops again.
    async fn reconnect_sequence(&mut self) {
        if let Err(err) = self.queue.clear_backoff().await {
            error!(error = %err, "Failed to reset queue backoff");
        }

        self.push_cycle().await;
        if !self.connected_now() {
            info!("Went offline during reconnect; abandoning sequence");
            return;
        }

        self.pull_cycle(None).await;
    }

    async fn on_remote_change(&mut self, notice: RemoteChangeNotice) {
        debug!(canonical_id = ?notice.canonical_id.as_ref().map(|id| id.as_str()), "Shared store changed");
        if self.online {
            self.pull_cycle(self.incremental_since()).await;
        }
    }

    async fn on_tick(&mut self) {
        if !self.online {
            return;
        }
        if self.role == DeviceRole::Client && !self.foreground {
            return;
        }
        self.sync_cycle().await;
    }

    async fn sync_cycle(&mut self) {
        if !self.connected_now() {
            debug!("Offline; sync cycle skipped");
            return;
        }
        self.push_cycle().await;
        if self.connected_now() {
            self.pull_cycle(self.incremental_since()).await;
        }
    }

    async fn push_cycle(&mut self) {
        if !self.connected_now() {
            debug!("Offline; queued operations stay queued");
            return;
        }
        if !self.set_phase_checked(self.phase.start_pushing()) {
            return;
        }

        let cancel = self.shutdown.child_token();
        match self.queue.drain(&self.executor, &cancel).await {
            Ok(report) => self.apply_drain_report(report).await,
            Err(err) => error!(error = %err, "Queue drain failed"),
        }

        self.set_phase_checked(self.phase.finish());
    }

    async fn apply_drain_report(&self, report: DrainReport) {
        for operation in report.completed {
            let Some(id) = operation.target else { continue };
            // A newer mutation for the same record is still queued.
            if !self.queue.pending_for(&id).await.is_empty() {
                continue;
            }
            if let Err(err) = self.engine.mark_synced(&id).await {
                error!(canonical_id = %id, error = %err, "Failed to mark record synced");
            }
        }

        match report.outcome {
            DrainOutcome::Failed { operation, error } => {
                if let Some(id) = operation.target.as_ref() {
                    if let Err(err) = self.engine.mark_failed(id).await {
                        error!(canonical_id = %id, error = %err, "Failed to mark record failed");
                    }
                }
                self.observers.sync_error(operation.target.as_ref(), &error);
            }
            DrainOutcome::Deferred { until } => debug!(until, "Queue head backing off"),
            DrainOutcome::Cancelled => info!("Queue drain cancelled"),
            DrainOutcome::Offline => info!("Connection lost during drain; operations stay queued"),
            DrainOutcome::Drained => {}
        }
    }

    async fn pull_cycle(&mut self, since: Option<i64>) {
        if !self.connected_now() {
            return;
        }
        if !self.set_phase_checked(self.phase.start_pulling()) {
            return;
        }

        let mode = if self.role.is_relay() {
            ReconcileMode::DeletesOnly
        } else {
            ReconcileMode::Full
        };

        let batch = match self.deps.shared.pull(since).await {
            Ok(batch) => batch,
            Err(err) => {
                let err = SyncError::from(err);
                warn!(error = %err, "Pull failed");
                self.observers.sync_error(None, &err);
                self.set_phase(self.phase.abort());
                return;
            }
        };

        if self.shutdown.is_cancelled() || !self.connected_now() {
            info!("Pull abandoned before reconciliation");
            self.set_phase(self.phase.abort());
            return;
        }
        if !self.set_phase_checked(self.phase.on_pulled()) {
            return;
        }

        let cursor = batch.cursor;
        let follow_up = match self.engine.reconcile(batch.records, mode).await {
            Ok(result) => {
                if cursor.is_some() {
                    self.pull_cursor = cursor;
                }
                match self.apply_reconcile_result(result).await {
                    Ok(enqueued) => enqueued,
                    Err(err) => {
                        error!(error = %err, "Failed to queue reconciliation follow-ups");
                        false
                    }
                }
            }
            Err(err) => {
                error!(error = %err, "Reconciliation failed");
                false
            }
        };

        self.set_phase_checked(self.phase.finish());

        if follow_up {
            self.push_cycle().await;
        }
    }

    /// Queue the shared-store writes a reconcile pass asked for. Returns
    /// whether anything was enqueued.
    async fn apply_reconcile_result(&self, result: ReconciliationResult) -> Result<bool> {
        for id in &result.overridden {
            let dropped = self.queue.discard(id, OperationType::Update).await?;
            if dropped > 0 {
                debug!(canonical_id = %id, dropped, "Discarded superseded local updates");
            }
        }

        let now = self.deps.clock.now_ms();
        let mut enqueued = false;

        for id in &result.requeue {
            let Some(record) = self
                .deps
                .records
                .get_by_id(id)
                .await
                .map_err(SyncError::from)?
            else {
                continue;
            };
            self.enqueue(PendingOperation::update(record, now)).await?;
            enqueued = true;
        }

        for retired in result.retired {
            self.enqueue(PendingOperation::delete(retired, now)).await?;
            enqueued = true;
        }

        Ok(enqueued)
    }

    /// Resume from the store's own change stamp. Writes that reach the store
    /// late still get a stamp past the cursor, whatever their record times say.
    fn incremental_since(&self) -> Option<i64> {
        self.pull_cursor
    }

    /// Latest connectivity value, including changes the loop has not yet seen.
    fn connected_now(&self) -> bool {
        self.online && *self.connectivity.borrow()
    }

    fn set_phase_checked(&mut self, next: Option<OrchestratorPhase>) -> bool {
        match next {
            Some(phase) => {
                self.set_phase(phase);
                true
            }
            None => {
                warn!(phase = %self.phase, "Rejected phase transition");
                false
            }
        }
    }

    fn set_phase(&mut self, phase: OrchestratorPhase) {
        if self.phase != phase {
            debug!(from = %self.phase, to = %phase, "Phase changed");
            self.phase = phase;
            self.observers.phase_changed(phase);
        }
    }

    async fn load(&self, id: &CanonicalId) -> Result<ClipboardRecord> {
        self.deps
            .records
            .get_by_id(id)
            .await
            .map_err(SyncError::from)?
            .ok_or_else(|| anyhow!("record {id} not found"))
    }

    async fn store(&self, record: &ClipboardRecord) -> Result<()> {
        self.deps
            .records
            .upsert(record)
            .await
            .map_err(SyncError::from)
            .context("failed to write local record")
    }
}

async fn next_notice(notices: &mut Option<mpsc::Receiver<RemoteChangeNotice>>) -> Option<RemoteChangeNotice> {
    match notices {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}
