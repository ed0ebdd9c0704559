//! Hand-written port fakes shared by the unit tests of this crate.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use mockall::mock;
use tokio::sync::mpsc;

use rc_core::fingerprint::{fingerprint, ContentFingerprint};
use rc_core::ids::{CanonicalId, DeviceId};
use rc_core::ports::*;
use rc_core::{
    CanonicalAlias, ClipboardContent, ClipboardRecord, DeviceRole, OrchestratorPhase,
    PendingOperation, ReconciliationResult, SyncError, SyncState,
};
use rc_infra::hash::Blake3Hasher;

pub fn hasher() -> Arc<dyn ContentHashPort> {
    Arc::new(Blake3Hasher)
}

pub fn fp(content: &ClipboardContent) -> ContentFingerprint {
    fingerprint(&Blake3Hasher, content).unwrap()
}

/// A relay-authored text record created at `at`.
pub fn record(id: &str, text: &str, at: i64) -> ClipboardRecord {
    let content = ClipboardContent::text(text);
    let fingerprint = fp(&content);
    ClipboardRecord::new(
        CanonicalId::from(id),
        content,
        fingerprint,
        DeviceId::new("relay-1"),
        DeviceRole::Relay,
        at,
    )
}

pub struct FixedClock {
    now: AtomicI64,
}

impl FixedClock {
    pub fn new(now_ms: i64) -> Self {
        Self {
            now: AtomicI64::new(now_ms),
        }
    }

    pub fn set(&self, now_ms: i64) {
        self.now.store(now_ms, Ordering::SeqCst);
    }

    pub fn advance(&self, by: Duration) {
        self.now.fetch_add(by.as_millis() as i64, Ordering::SeqCst);
    }
}

impl ClockPort for FixedClock {
    fn now_ms(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }
}

pub struct FixedIdentity {
    pub device_id: DeviceId,
    pub role: DeviceRole,
}

impl FixedIdentity {
    pub fn relay() -> Self {
        Self {
            device_id: DeviceId::new("relay-1"),
            role: DeviceRole::Relay,
        }
    }

    pub fn client(id: &str) -> Self {
        Self {
            device_id: DeviceId::new(id),
            role: DeviceRole::Client,
        }
    }
}

impl DeviceIdentityPort for FixedIdentity {
    fn current_device_id(&self) -> DeviceId {
        self.device_id.clone()
    }

    fn role(&self) -> DeviceRole {
        self.role
    }
}

#[derive(Default)]
pub struct MemoryRecordStore {
    records: Mutex<HashMap<CanonicalId, ClipboardRecord>>,
}

impl MemoryRecordStore {
    pub fn with(records: Vec<ClipboardRecord>) -> Self {
        let store = Self::default();
        {
            let mut map = store.records.lock().unwrap();
            for record in records {
                map.insert(record.canonical_id.clone(), record);
            }
        }
        store
    }

    pub fn get(&self, id: &str) -> Option<ClipboardRecord> {
        self.records.lock().unwrap().get(&CanonicalId::from(id)).cloned()
    }

    pub fn all(&self) -> Vec<ClipboardRecord> {
        self.records.lock().unwrap().values().cloned().collect()
    }
}

#[async_trait]
impl LocalRecordStorePort for MemoryRecordStore {
    async fn get_by_id(&self, id: &CanonicalId) -> Result<Option<ClipboardRecord>, RecordStoreError> {
        Ok(self.records.lock().unwrap().get(id).cloned())
    }

    async fn upsert(&self, record: &ClipboardRecord) -> Result<(), RecordStoreError> {
        self.records
            .lock()
            .unwrap()
            .insert(record.canonical_id.clone(), record.clone());
        Ok(())
    }

    async fn delete(&self, id: &CanonicalId) -> Result<(), RecordStoreError> {
        self.records
            .lock()
            .unwrap()
            .remove(id)
            .map(|_| ())
            .ok_or(RecordStoreError::NotFound)
    }

    async fn query_modified_since(&self, since_ms: i64) -> Result<Vec<ClipboardRecord>, RecordStoreError> {
        Ok(self
            .records
            .lock()
            .unwrap()
            .values()
            .filter(|r| r.last_modified >= since_ms)
            .cloned()
            .collect())
    }

    async fn find_live_by_fingerprint(
        &self,
        fingerprint: &ContentFingerprint,
    ) -> Result<Vec<ClipboardRecord>, RecordStoreError> {
        Ok(self
            .records
            .lock()
            .unwrap()
            .values()
            .filter(|r| r.is_live() && &r.fingerprint == fingerprint)
            .cloned()
            .collect())
    }
}

#[derive(Default)]
pub struct MemoryOperationStore {
    saved: Mutex<Vec<PendingOperation>>,
    fail_writes: AtomicBool,
}

impl MemoryOperationStore {
    pub fn saved(&self) -> Vec<PendingOperation> {
        self.saved.lock().unwrap().clone()
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl PendingOperationStorePort for MemoryOperationStore {
    async fn load_all(&self) -> anyhow::Result<Vec<PendingOperation>> {
        Ok(self.saved())
    }

    async fn replace_all(&self, operations: &[PendingOperation]) -> anyhow::Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            anyhow::bail!("disk full");
        }
        *self.saved.lock().unwrap() = operations.to_vec();
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryAliasStore {
    aliases: Mutex<Vec<CanonicalAlias>>,
}

#[async_trait]
impl CanonicalAliasPort for MemoryAliasStore {
    async fn record_alias(&self, alias: &CanonicalAlias) -> anyhow::Result<()> {
        self.aliases.lock().unwrap().push(alias.clone());
        Ok(())
    }

    async fn find_survivor(&self, id: &CanonicalId) -> anyhow::Result<Option<CanonicalId>> {
        Ok(self
            .aliases
            .lock()
            .unwrap()
            .iter()
            .find(|a| &a.alias_id == id)
            .map(|a| a.surviving_id.clone()))
    }

    async fn list_aliases(&self) -> anyhow::Result<Vec<CanonicalAlias>> {
        Ok(self.aliases.lock().unwrap().clone())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Observed {
    State(CanonicalId, SyncState),
    Reconciled(ReconciliationResult),
    Phase(OrchestratorPhase),
    Merged { alias: CanonicalId, survivor: CanonicalId },
    Error(Option<CanonicalId>, SyncError),
}

#[derive(Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<Observed>>,
}

impl RecordingObserver {
    pub fn events(&self) -> Vec<Observed> {
        self.events.lock().unwrap().clone()
    }
}

impl SyncObserverPort for RecordingObserver {
    fn on_sync_state_changed(&self, canonical_id: &CanonicalId, state: SyncState) {
        self.events
            .lock()
            .unwrap()
            .push(Observed::State(canonical_id.clone(), state));
    }

    fn on_reconciled(&self, result: &ReconciliationResult) {
        self.events.lock().unwrap().push(Observed::Reconciled(result.clone()));
    }

    fn on_phase_changed(&self, phase: OrchestratorPhase) {
        self.events.lock().unwrap().push(Observed::Phase(phase));
    }

    fn on_canonical_merged(&self, alias: &CanonicalId, survivor: &CanonicalId) {
        self.events.lock().unwrap().push(Observed::Merged {
            alias: alias.clone(),
            survivor: survivor.clone(),
        });
    }

    fn on_sync_error(&self, canonical_id: Option<&CanonicalId>, error: &SyncError) {
        self.events
            .lock()
            .unwrap()
            .push(Observed::Error(canonical_id.cloned(), error.clone()));
    }
}

mock! {
    pub SharedStore {}

    #[async_trait]
    impl SharedStorePort for SharedStore {
        async fn push(&self, record: &ClipboardRecord) -> Result<(), SharedStoreError>;
        async fn update(&self, record: &ClipboardRecord) -> Result<(), SharedStoreError>;
        async fn pull(&self, since_ms: Option<i64>) -> Result<PullBatch, SharedStoreError>;
        async fn delete(&self, id: &CanonicalId) -> Result<(), SharedStoreError>;
        async fn subscribe_changes(&self) -> Result<mpsc::Receiver<RemoteChangeNotice>, SharedStoreError>;
    }
}
