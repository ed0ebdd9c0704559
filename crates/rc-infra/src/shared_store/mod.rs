//! In-process shared store.
//!
//! Stands in for the cloud database in tests and single-host setups. Several
//! orchestrators may share one instance through an `Arc`.

use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, trace};

use rc_core::ids::CanonicalId;
use rc_core::ports::{ClockPort, PullBatch, RemoteChangeNotice, SharedStoreError, SharedStorePort};
use rc_core::ClipboardRecord;

const NOTICE_BUFFER: usize = 64;

struct StoredRecord {
    record: ClipboardRecord,
    /// Store clock at the last accepted write.
    changed_at: i64,
}

#[derive(Default)]
struct StoreState {
    records: BTreeMap<CanonicalId, StoredRecord>,
    subscribers: Vec<mpsc::Sender<RemoteChangeNotice>>,
    scripted_failures: VecDeque<SharedStoreError>,
    last_change: Option<i64>,
}

impl StoreState {
    /// Next change stamp: the store clock, bumped past the previous stamp.
    fn stamp(&mut self, now: i64) -> i64 {
        let stamp = match self.last_change {
            Some(last) if now <= last => last.saturating_add(1),
            _ => now,
        };
        self.last_change = Some(stamp);
        stamp
    }

    fn put(&mut self, record: ClipboardRecord, now: i64) {
        let changed_at = self.stamp(now);
        let id = record.canonical_id.clone();
        self.records.insert(id.clone(), StoredRecord { record, changed_at });
        self.notify(&id, changed_at);
    }

    fn notify(&mut self, canonical_id: &CanonicalId, changed_at: i64) {
        self.subscribers.retain(|tx| !tx.is_closed());
        for tx in &self.subscribers {
            // A full buffer already guarantees a pending wake-up.
            let _ = tx.try_send(RemoteChangeNotice {
                canonical_id: Some(canonical_id.clone()),
                changed_at,
            });
        }
    }
}

pub struct InMemorySharedStore {
    state: Mutex<StoreState>,
    online: AtomicBool,
    clock: Arc<dyn ClockPort>,
}

impl InMemorySharedStore {
    pub fn new(clock: Arc<dyn ClockPort>) -> Self {
        Self {
            state: Mutex::new(StoreState::default()),
            online: AtomicBool::new(true),
            clock,
        }
    }

    /// Simulate a store-wide outage. Offline calls fail with `NotConnected`.
    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }

    /// Fail the next call (of any kind) with `error`.
    pub async fn fail_next(&self, error: SharedStoreError) {
        self.state.lock().await.scripted_failures.push_back(error);
    }

    pub async fn get(&self, id: &CanonicalId) -> Option<ClipboardRecord> {
        self.state.lock().await.records.get(id).map(|s| s.record.clone())
    }

    /// Store change stamp of a record, if present.
    pub async fn changed_at(&self, id: &CanonicalId) -> Option<i64> {
        self.state.lock().await.records.get(id).map(|s| s.changed_at)
    }

    /// Every stored record, tombstones included, ordered by canonical ID.
    pub async fn snapshot(&self) -> Vec<ClipboardRecord> {
        self.state
            .lock()
            .await
            .records
            .values()
            .map(|s| s.record.clone())
            .collect()
    }

    pub async fn live_count(&self) -> usize {
        self.state
            .lock()
            .await
            .records
            .values()
            .filter(|s| s.record.is_live())
            .count()
    }

    /// Write a record directly, as another writer of the store would.
    pub async fn insert(&self, record: ClipboardRecord) {
        let now = self.clock.now_ms();
        self.state.lock().await.put(record, now);
    }

    fn check_online(&self) -> Result<(), SharedStoreError> {
        if self.online.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(SharedStoreError::NotConnected)
        }
    }

    /// Store `incoming` unless it would resurrect a tombstone.
    fn write(&self, state: &mut StoreState, incoming: &ClipboardRecord) {
        if let Some(existing) = state.records.get(&incoming.canonical_id) {
            if existing.record.deleted && incoming.is_live() {
                debug!(canonical_id = %incoming.canonical_id, "Ignoring write that would resurrect a tombstone");
                return;
            }
        }
        state.put(incoming.clone(), self.clock.now_ms());
    }
}

#[async_trait]
impl SharedStorePort for InMemorySharedStore {
    async fn push(&self, record: &ClipboardRecord) -> Result<(), SharedStoreError> {
        self.check_online()?;
        let mut state = self.state.lock().await;
        if let Some(err) = state.scripted_failures.pop_front() {
            return Err(err);
        }
        trace!(canonical_id = %record.canonical_id, "push");
        self.write(&mut state, record);
        Ok(())
    }

    async fn update(&self, record: &ClipboardRecord) -> Result<(), SharedStoreError> {
        self.check_online()?;
        let mut state = self.state.lock().await;
        if let Some(err) = state.scripted_failures.pop_front() {
            return Err(err);
        }
        if !state.records.contains_key(&record.canonical_id) {
            return Err(SharedStoreError::NotFound);
        }
        trace!(canonical_id = %record.canonical_id, "update");
        self.write(&mut state, record);
        Ok(())
    }

    async fn pull(&self, since_ms: Option<i64>) -> Result<PullBatch, SharedStoreError> {
        self.check_online()?;
        let mut state = self.state.lock().await;
        if let Some(err) = state.scripted_failures.pop_front() {
            return Err(err);
        }
        let records = state
            .records
            .values()
            .filter(|s| since_ms.map_or(true, |since| s.changed_at >= since))
            .map(|s| s.record.clone())
            .collect();
        Ok(PullBatch::new(records, state.last_change))
    }

    async fn delete(&self, id: &CanonicalId) -> Result<(), SharedStoreError> {
        self.check_online()?;
        let mut state = self.state.lock().await;
        if let Some(err) = state.scripted_failures.pop_front() {
            return Err(err);
        }
        let now = self.clock.now_ms();
        let mut tombstone = match state.records.get(id) {
            None => return Err(SharedStoreError::NotFound),
            Some(existing) if existing.record.deleted => return Ok(()),
            Some(existing) => existing.record.clone(),
        };
        let role = tombstone.modified_by_role;
        tombstone.tombstone(role, now);
        trace!(canonical_id = %id, "delete");
        state.put(tombstone, now);
        Ok(())
    }

    async fn subscribe_changes(
        &self,
    ) -> Result<mpsc::Receiver<RemoteChangeNotice>, SharedStoreError> {
        self.check_online()?;
        let (tx, rx) = mpsc::channel(NOTICE_BUFFER);
        self.state.lock().await.subscribers.push(tx);
        Ok(rx)
    }
}
