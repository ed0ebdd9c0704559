//! Multi-device harness: real SQLite repositories per device, one shared
//! in-memory store, and a manually driven wall clock.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::{Arc, Mutex, Once};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use rc_app::{OfflineOperationQueue, OrchestratorSettings, SyncDeps, SyncHandle, SyncObservers, SyncOrchestrator};
use rc_core::ids::{CanonicalId, DeviceId};
use rc_core::ports::*;
use rc_core::{
    ClipboardContent, ClipboardRecord, DeviceRole, OrchestratorPhase, ReconciliationResult,
    RetryPolicy, SyncError, SyncState,
};
use rc_infra::db::mappers::{CanonicalAliasRowMapper, ClipboardRecordRowMapper, PendingOperationRowMapper};
use rc_infra::db::repositories::{
    DieselCanonicalAliasRepository, DieselClipboardRecordRepository, DieselPendingOperationRepository,
};
use rc_infra::db::{init_db_pool, DieselSqliteExecutor};
use rc_infra::{Blake3Hasher, WatchConnectivity};

/// 2023-11-14T22:13:20Z
pub const T0: i64 = 1_700_000_000_000;

static TRACE_INIT: Once = Once::new();

/// `RUST_LOG=rc_app=debug cargo test` shows the orchestrator's spans.
pub fn init_tracing() {
    TRACE_INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Poll until the condition holds, or fail the test after ~2 s.
#[allow(unused_macros)]
macro_rules! eventually {
    ($what:expr, $cond:expr) => {{
        let mut satisfied = false;
        for _ in 0..200 {
            if $cond {
                satisfied = true;
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        assert!(satisfied, "condition never held: {}", $what);
    }};
}

pub struct ManualClock {
    now: AtomicI64,
}

impl ManualClock {
    pub fn new(now_ms: i64) -> Arc<Self> {
        Arc::new(Self {
            now: AtomicI64::new(now_ms),
        })
    }

    pub fn set(&self, now_ms: i64) {
        self.now.store(now_ms, Ordering::SeqCst);
    }

    pub fn advance_ms(&self, ms: i64) {
        self.now.fetch_add(ms, Ordering::SeqCst);
    }
}

impl ClockPort for ManualClock {
    fn now_ms(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }
}

pub struct StaticIdentity {
    device_id: DeviceId,
    role: DeviceRole,
}

impl StaticIdentity {
    pub fn new(id: &str, role: DeviceRole) -> Arc<Self> {
        Arc::new(Self {
            device_id: DeviceId::new(id),
            role,
        })
    }
}

impl DeviceIdentityPort for StaticIdentity {
    fn current_device_id(&self) -> DeviceId {
        self.device_id.clone()
    }

    fn role(&self) -> DeviceRole {
        self.role
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    State(CanonicalId, SyncState),
    Reconciled(ReconciliationResult),
    Phase(OrchestratorPhase),
    Merged { alias: CanonicalId, survivor: CanonicalId },
    Error(Option<CanonicalId>, String),
}

#[derive(Default)]
pub struct EventLog {
    events: Mutex<Vec<Event>>,
}

impl EventLog {
    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    pub fn phases(&self) -> Vec<OrchestratorPhase> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Phase(p) => Some(p),
                _ => None,
            })
            .collect()
    }

    fn push(&self, event: Event) {
        self.events.lock().unwrap().push(event);
    }
}

impl SyncObserverPort for EventLog {
    fn on_sync_state_changed(&self, canonical_id: &CanonicalId, state: SyncState) {
        self.push(Event::State(canonical_id.clone(), state));
    }

    fn on_reconciled(&self, result: &ReconciliationResult) {
        self.push(Event::Reconciled(result.clone()));
    }

    fn on_phase_changed(&self, phase: OrchestratorPhase) {
        self.push(Event::Phase(phase));
    }

    fn on_canonical_merged(&self, alias: &CanonicalId, survivor: &CanonicalId) {
        self.push(Event::Merged {
            alias: alias.clone(),
            survivor: survivor.clone(),
        });
    }

    fn on_sync_error(&self, canonical_id: Option<&CanonicalId>, error: &SyncError) {
        self.push(Event::Error(canonical_id.cloned(), error.to_string()));
    }
}

/// Passes everything through to the real store, but can be told to reject
/// updates (as a flaky network path would for one device only).
pub struct GatedSharedStore {
    inner: Arc<dyn SharedStorePort>,
    reject_updates: AtomicBool,
}

impl GatedSharedStore {
    pub fn new(inner: Arc<dyn SharedStorePort>) -> Arc<Self> {
        Arc::new(Self {
            inner,
            reject_updates: AtomicBool::new(false),
        })
    }

    pub fn reject_updates(&self, reject: bool) {
        self.reject_updates.store(reject, Ordering::SeqCst);
    }
}

#[async_trait]
impl SharedStorePort for GatedSharedStore {
    async fn push(&self, record: &ClipboardRecord) -> Result<(), SharedStoreError> {
        self.inner.push(record).await
    }

    async fn update(&self, record: &ClipboardRecord) -> Result<(), SharedStoreError> {
        if self.reject_updates.load(Ordering::SeqCst) {
            return Err(SharedStoreError::Transient("gateway timeout".to_string()));
        }
        self.inner.update(record).await
    }

    async fn pull(&self, since_ms: Option<i64>) -> Result<PullBatch, SharedStoreError> {
        self.inner.pull(since_ms).await
    }

    async fn delete(&self, id: &CanonicalId) -> Result<(), SharedStoreError> {
        self.inner.delete(id).await
    }

    async fn subscribe_changes(&self) -> Result<mpsc::Receiver<RemoteChangeNotice>, SharedStoreError> {
        self.inner.subscribe_changes().await
    }
}

pub fn test_settings() -> OrchestratorSettings {
    OrchestratorSettings {
        // Ticks never fire during a test; cycles are driven explicitly.
        poll_interval: Duration::from_secs(3_600),
        handoff_window_ms: 15_000,
        local_echo_window_ms: 2_000,
        conflict_window_ms: 10_000,
        retry: RetryPolicy::new(Duration::from_millis(1_000), Duration::from_secs(60)),
        remote_lookup_timeout: Duration::from_secs(1),
    }
}

pub fn text(s: &str) -> ClipboardContent {
    ClipboardContent::text(s)
}

pub struct LocalStores {
    pub records: Arc<dyn LocalRecordStorePort>,
    pub operations: Arc<dyn PendingOperationStorePort>,
    pub aliases: Arc<dyn CanonicalAliasPort>,
}

/// The three SQLite repositories of one device, sharing a single pool.
pub fn open_local_stores(database_url: &str) -> LocalStores {
    let pool = init_db_pool(database_url).expect("Failed to init db");
    let executor = DieselSqliteExecutor::new(pool);

    LocalStores {
        records: Arc::new(DieselClipboardRecordRepository::new(
            executor.clone(),
            ClipboardRecordRowMapper,
        )),
        operations: Arc::new(DieselPendingOperationRepository::new(
            executor.clone(),
            PendingOperationRowMapper,
        )),
        aliases: Arc::new(DieselCanonicalAliasRepository::new(
            executor,
            CanonicalAliasRowMapper,
        )),
    }
}

pub struct TestDevice {
    pub handle: SyncHandle,
    pub join: JoinHandle<()>,
    pub records: Arc<dyn LocalRecordStorePort>,
    pub aliases: Arc<dyn CanonicalAliasPort>,
    pub queue: Arc<OfflineOperationQueue>,
    pub connectivity: Arc<WatchConnectivity>,
    pub events: Arc<EventLog>,
}

impl TestDevice {
    pub async fn record(&self, id: &CanonicalId) -> Option<ClipboardRecord> {
        self.records.get_by_id(id).await.unwrap()
    }

    pub async fn live_records(&self) -> Vec<ClipboardRecord> {
        self.records
            .query_modified_since(i64::MIN)
            .await
            .unwrap()
            .into_iter()
            .filter(|r| r.is_live())
            .collect()
    }

    pub async fn stop(self) {
        self.handle.shutdown();
        self.join.await.unwrap();
    }
}

pub async fn start_device(
    id: &str,
    role: DeviceRole,
    shared: Arc<dyn SharedStorePort>,
    clock: Arc<ManualClock>,
    online: bool,
) -> TestDevice {
    start_device_with_db(id, role, shared, clock, online, ":memory:").await
}

pub async fn start_device_with_db(
    id: &str,
    role: DeviceRole,
    shared: Arc<dyn SharedStorePort>,
    clock: Arc<ManualClock>,
    online: bool,
    database_url: &str,
) -> TestDevice {
    init_tracing();
    let LocalStores {
        records,
        operations,
        aliases,
    } = open_local_stores(database_url);
    let connectivity = Arc::new(WatchConnectivity::new(online));
    let events = Arc::new(EventLog::default());

    let deps = SyncDeps {
        records: records.clone(),
        operations,
        aliases: aliases.clone(),
        shared,
        connectivity: connectivity.clone(),
        identity: StaticIdentity::new(id, role),
        clock,
        hash: Arc::new(Blake3Hasher),
    };
    let observers = SyncObservers::new(vec![events.clone() as Arc<dyn SyncObserverPort>]);

    let (orchestrator, handle) = SyncOrchestrator::new(deps, test_settings(), observers)
        .await
        .expect("Failed to build orchestrator");
    let queue = orchestrator.queue();
    let join = tokio::spawn(orchestrator.run());

    TestDevice {
        handle,
        join,
        records,
        aliases,
        queue,
        connectivity,
        events,
    }
}
