#[macro_use]
mod common;

use std::sync::Arc;

use common::*;
use rc_core::ports::SharedStorePort;
use rc_core::{DeviceRole, OperationType, SyncState};
use rc_infra::InMemorySharedStore;
use tempfile::TempDir;

#[tokio::test]
async fn offline_push_then_delete_drain_in_enqueue_order() {
    let clock = ManualClock::new(T0);
    let shared = Arc::new(InMemorySharedStore::new(clock.clone()));
    let relay = start_device("relay-1", DeviceRole::Relay, shared.clone(), clock.clone(), false).await;
    let mut notices = shared.subscribe_changes().await.unwrap();

    let id = relay
        .handle
        .record_local_copy(text("wifi password"))
        .await
        .unwrap()
        .canonical_id()
        .clone();
    clock.advance_ms(1_000);
    relay.handle.delete(id.clone()).await.unwrap();

    let queued: Vec<OperationType> = relay
        .queue
        .snapshot()
        .await
        .into_iter()
        .map(|op| op.op_type)
        .collect();
    assert_eq!(queued, vec![OperationType::Push, OperationType::Delete]);
    assert!(shared.get(&id).await.is_none());

    relay.connectivity.set_online(true);
    eventually!("queue drained", relay.queue.is_empty().await);

    // Stamped by the store when the drain reached it, not when queued.
    let first = notices.recv().await.unwrap();
    let second = notices.recv().await.unwrap();
    assert_eq!(first.canonical_id.as_ref(), Some(&id));
    assert_eq!(first.changed_at, T0 + 1_000);
    assert_eq!(second.canonical_id.as_ref(), Some(&id));
    assert_eq!(second.changed_at, T0 + 1_001);

    assert!(shared.get(&id).await.unwrap().deleted);
    assert_eq!(shared.live_count().await, 0);
}

#[tokio::test]
async fn offline_edits_fold_into_the_pending_push() {
    let clock = ManualClock::new(T0);
    let shared = Arc::new(InMemorySharedStore::new(clock.clone()));
    let relay = start_device("relay-1", DeviceRole::Relay, shared.clone(), clock.clone(), false).await;

    let id = relay
        .handle
        .record_local_copy(text("draft v1"))
        .await
        .unwrap()
        .canonical_id()
        .clone();
    clock.advance_ms(1_000);
    relay.handle.edit(id.clone(), text("draft v2")).await.unwrap();
    clock.advance_ms(1_000);
    relay.handle.edit(id.clone(), text("draft v3")).await.unwrap();

    let queued = relay.queue.snapshot().await;
    assert_eq!(queued.len(), 1);
    assert_eq!(queued[0].op_type, OperationType::Push);
    assert_eq!(queued[0].payload.content.as_text(), Some("draft v3"));
    assert_eq!(relay.record(&id).await.unwrap().sync_state, SyncState::Pending);

    relay.connectivity.set_online(true);
    eventually!("queue drained", relay.queue.is_empty().await);

    let remote = shared.get(&id).await.unwrap();
    assert_eq!(remote.content.as_text(), Some("draft v3"));
    eventually!(
        "record synced",
        relay.record(&id).await.unwrap().sync_state == SyncState::Synced
    );
}

#[tokio::test]
async fn delete_made_offline_is_pushed_before_the_reconnect_pull() {
    let clock = ManualClock::new(T0);
    let shared = Arc::new(InMemorySharedStore::new(clock.clone()));
    let relay = start_device("relay-1", DeviceRole::Relay, shared.clone(), clock.clone(), true).await;
    let client = start_device("laptop-1", DeviceRole::Client, shared.clone(), clock.clone(), true).await;

    let id = relay
        .handle
        .record_local_copy(text("item Y"))
        .await
        .unwrap()
        .canonical_id()
        .clone();
    client.handle.request_sync().await.unwrap();
    assert!(client.record(&id).await.unwrap().is_live());

    client.connectivity.set_online(false);
    clock.advance_ms(1_000);
    client.handle.delete(id.clone()).await.unwrap();

    assert_eq!(client.queue.len().await, 1);
    assert!(shared.get(&id).await.unwrap().is_live());

    client.connectivity.set_online(true);
    eventually!("client queue drained", client.queue.is_empty().await);

    // The reconnect pull saw the remote tombstone, not the stale live copy.
    assert!(shared.get(&id).await.unwrap().deleted);
    let local = client.record(&id).await.unwrap();
    assert!(local.deleted);
    eventually!(
        "client tombstone synced",
        client.record(&id).await.unwrap().sync_state == SyncState::Synced
    );
    eventually!(
        "relay observed the delete",
        relay.record(&id).await.unwrap().deleted
    );
    assert_eq!(shared.live_count().await, 0);
}

#[tokio::test]
async fn queued_work_survives_restart() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let db_path = dir.path().join("relay.db");
    let db_url = db_path.to_str().unwrap().to_string();

    let clock = ManualClock::new(T0);
    let shared = Arc::new(InMemorySharedStore::new(clock.clone()));

    let relay = start_device_with_db(
        "relay-1",
        DeviceRole::Relay,
        shared.clone(),
        clock.clone(),
        false,
        &db_url,
    )
    .await;
    let id = relay
        .handle
        .record_local_copy(text("survives restart"))
        .await
        .unwrap()
        .canonical_id()
        .clone();
    assert_eq!(relay.queue.len().await, 1);
    relay.stop().await;

    let restarted = start_device_with_db(
        "relay-1",
        DeviceRole::Relay,
        shared.clone(),
        clock.clone(),
        true,
        &db_url,
    )
    .await;

    eventually!("restored queue drained", restarted.queue.is_empty().await);
    let remote = shared.get(&id).await.unwrap();
    assert_eq!(remote.content.as_text(), Some("survives restart"));
}

#[tokio::test]
async fn failed_update_backs_off_and_recovers() {
    let clock = ManualClock::new(T0);
    let store = Arc::new(InMemorySharedStore::new(clock.clone()));
    let gate = GatedSharedStore::new(store.clone());
    let relay = start_device("relay-1", DeviceRole::Relay, gate.clone(), clock.clone(), true).await;

    let id = relay
        .handle
        .record_local_copy(text("v1"))
        .await
        .unwrap()
        .canonical_id()
        .clone();

    gate.reject_updates(true);
    clock.set(T0 + 1_000);
    relay.handle.edit(id.clone(), text("v2")).await.unwrap();

    let head = relay.queue.snapshot().await.remove(0);
    assert_eq!(head.attempts, 1);
    assert_eq!(head.next_attempt_at, Some(T0 + 2_000));
    assert_eq!(relay.record(&id).await.unwrap().sync_state, SyncState::Failed);
    assert!(relay
        .events
        .events()
        .iter()
        .any(|e| matches!(e, Event::Error(Some(failed), _) if failed == &id)));

    // Still inside the backoff window: nothing is attempted.
    relay.handle.request_sync().await.unwrap();
    assert_eq!(relay.queue.snapshot().await[0].attempts, 1);

    clock.set(T0 + 2_000);
    relay.handle.request_sync().await.unwrap();
    let head = relay.queue.snapshot().await.remove(0);
    assert_eq!(head.attempts, 2);
    assert_eq!(head.next_attempt_at, Some(T0 + 4_000));

    gate.reject_updates(false);
    clock.set(T0 + 4_000);
    relay.handle.request_sync().await.unwrap();

    assert!(relay.queue.is_empty().await);
    assert_eq!(store.get(&id).await.unwrap().content.as_text(), Some("v2"));
    assert_eq!(relay.record(&id).await.unwrap().sync_state, SyncState::Synced);
}

#[tokio::test]
async fn incremental_pull_picks_up_writes_that_reach_the_store_late() {
    let clock = ManualClock::new(T0);
    let shared = Arc::new(InMemorySharedStore::new(clock.clone()));
    let relay = start_device("relay-1", DeviceRole::Relay, shared.clone(), clock.clone(), true).await;
    let client = start_device("laptop-1", DeviceRole::Client, shared.clone(), clock.clone(), true).await;

    relay.handle.record_local_copy(text("meeting at 3pm")).await.unwrap();
    client.handle.request_sync().await.unwrap();
    assert_eq!(client.live_records().await.len(), 1);

    relay.connectivity.set_online(false);
    clock.set(T0 + 1_000);
    let late = relay
        .handle
        .record_local_copy(text("door code 4821"))
        .await
        .unwrap()
        .canonical_id()
        .clone();
    assert_eq!(relay.queue.len().await, 1);

    clock.set(T0 + 30_000);
    client.handle.request_sync().await.unwrap();
    assert!(client.record(&late).await.is_none());

    clock.set(T0 + 60_000);
    relay.connectivity.set_online(true);
    eventually!("relay queue drained", relay.queue.is_empty().await);
    assert_eq!(shared.changed_at(&late).await, Some(T0 + 60_000));
    assert_eq!(shared.get(&late).await.unwrap().created_at, T0 + 1_000);

    client.handle.request_sync().await.unwrap();
    eventually!("client received the late write", client.record(&late).await.is_some());
    let received = client.record(&late).await.unwrap();
    assert_eq!(received.content.as_text(), Some("door code 4821"));
    assert_eq!(received.sync_state, SyncState::Synced);
}

#[tokio::test]
async fn store_outage_mid_drain_leaves_the_queue_untouched() {
    let clock = ManualClock::new(T0);
    let shared = Arc::new(InMemorySharedStore::new(clock.clone()));
    let relay = start_device("relay-1", DeviceRole::Relay, shared.clone(), clock.clone(), true).await;
    relay.handle.request_sync().await.unwrap();

    shared.set_online(false);
    let id = relay
        .handle
        .record_local_copy(text("unsent"))
        .await
        .unwrap()
        .canonical_id()
        .clone();

    let head = relay.queue.snapshot().await.remove(0);
    assert_eq!(head.attempts, 0);
    assert_eq!(head.next_attempt_at, None);
    assert_eq!(head.last_error, None);
    assert_eq!(relay.record(&id).await.unwrap().sync_state, SyncState::Pending);
    assert!(!relay
        .events
        .events()
        .iter()
        .any(|e| matches!(e, Event::Error(Some(failed), _) if failed == &id)));

    shared.set_online(true);
    relay.handle.request_sync().await.unwrap();

    assert!(relay.queue.is_empty().await);
    assert!(shared.get(&id).await.is_some());
    assert_eq!(relay.record(&id).await.unwrap().sync_state, SyncState::Synced);
}

#[tokio::test]
async fn reconnect_between_loop_wakeups_still_clears_backoff() {
    let clock = ManualClock::new(T0);
    let store = Arc::new(InMemorySharedStore::new(clock.clone()));
    let gate = GatedSharedStore::new(store.clone());
    let relay = start_device("relay-1", DeviceRole::Relay, gate.clone(), clock.clone(), true).await;

    let id = relay
        .handle
        .record_local_copy(text("v1"))
        .await
        .unwrap()
        .canonical_id()
        .clone();

    gate.reject_updates(true);
    clock.set(T0 + 1_000);
    relay.handle.edit(id.clone(), text("v2")).await.unwrap();
    assert_eq!(relay.queue.snapshot().await[0].next_attempt_at, Some(T0 + 2_000));
    gate.reject_updates(false);

    // Both transitions land before the loop runs again.
    relay.connectivity.set_online(false);
    relay.connectivity.set_online(true);

    eventually!("queue drained without waiting out the backoff", relay.queue.is_empty().await);
    assert_eq!(store.get(&id).await.unwrap().content.as_text(), Some("v2"));
}
