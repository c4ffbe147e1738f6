// tests/presence_tests.rs

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::mpsc;

use fogon_common::traits::TypingRepository;
use fogon_core::ChatConfig;
use fogon_core::services::TypingPresenceTracker;
use fogon_core::test_utils::{MemoryStore, init_test_tracing};

fn tracker(store: &Arc<MemoryStore>, config: &ChatConfig) -> TypingPresenceTracker {
    TypingPresenceTracker::new(store.clone(), store.clone(), config)
}

async fn next_update(rx: &mut mpsc::UnboundedReceiver<Vec<String>>) -> Vec<String> {
    tokio::time::timeout(Duration::from_secs(2), rx.recv())
        .await
        .expect("timed out waiting for a presence update")
        .expect("presence channel closed")
}

#[tokio::test]
async fn stale_heartbeats_are_excluded_from_the_presence_set() {
    init_test_tracing();
    let store = Arc::new(MemoryStore::new());
    let alice = store.add_author("alice@fogon.app", "member");
    let bob = store.add_author("bob@fogon.app", "member");
    let now = Utc::now();
    // Window is 3 s: alice is fresh, bob expired two seconds ago.
    store.seed_heartbeat(alice, now - chrono::Duration::milliseconds(500));
    store.seed_heartbeat(bob, now - chrono::Duration::milliseconds(5000));

    let (tx, mut rx) = mpsc::unbounded_channel();
    let subscription = tracker(&store, &ChatConfig::default())
        .subscribe(move |handles| {
            let _ = tx.send(handles);
        })
        .await
        .expect("subscribe");

    // The immediate first tick computes the initial set.
    let handles = next_update(&mut rx).await;
    assert_eq!(handles, vec!["alice@fogon.app".to_string()]);

    subscription.unsubscribe();
}

#[tokio::test]
async fn heartbeat_writes_trigger_a_recompute() {
    let store = Arc::new(MemoryStore::new());
    let alice = store.add_author("alice@fogon.app", "member");

    let config = ChatConfig {
        // Slow tick so this test exercises the change-feed trigger.
        presence_tick_ms: 60_000,
        ..ChatConfig::default()
    };
    let (tx, mut rx) = mpsc::unbounded_channel();
    let subscription = tracker(&store, &config)
        .subscribe(move |handles| {
            let _ = tx.send(handles);
        })
        .await
        .expect("subscribe");

    assert!(next_update(&mut rx).await.is_empty());

    store
        .upsert_heartbeat(alice, Utc::now())
        .await
        .expect("upsert");

    let handles = next_update(&mut rx).await;
    assert_eq!(handles, vec!["alice@fogon.app".to_string()]);

    subscription.unsubscribe();
}

#[tokio::test]
async fn presence_expires_without_any_further_write() {
    let store = Arc::new(MemoryStore::new());
    let alice = store.add_author("alice@fogon.app", "member");
    store.seed_heartbeat(alice, Utc::now());

    let config = ChatConfig {
        typing_stale_ms: 300,
        presence_tick_ms: 100,
        ..ChatConfig::default()
    };
    let (tx, mut rx) = mpsc::unbounded_channel();
    let subscription = tracker(&store, &config)
        .subscribe(move |handles| {
            let _ = tx.send(handles);
        })
        .await
        .expect("subscribe");

    assert_eq!(next_update(&mut rx).await, vec!["alice@fogon.app".to_string()]);

    // No write happens; the tick alone must age alice out.
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    loop {
        let handles = next_update(&mut rx).await;
        if handles.is_empty() {
            break;
        }
        assert!(
            tokio::time::Instant::now() < deadline,
            "presence set never drained: {handles:?}"
        );
    }

    subscription.unsubscribe();
}

#[tokio::test]
async fn duplicate_and_empty_handles_are_dropped() {
    let store = Arc::new(MemoryStore::new());
    let alice = store.add_author("alice@fogon.app", "member");
    // The same handle can back two author rows; presence reports it once.
    let alice_phone = store.add_author("alice@fogon.app", "member");
    let now = Utc::now();
    store.seed_heartbeat(alice, now - chrono::Duration::milliseconds(200));
    store.seed_heartbeat(alice_phone, now - chrono::Duration::milliseconds(100));
    // A heartbeat row with no matching author joins to an empty handle.
    store.seed_heartbeat(uuid::Uuid::new_v4(), now);

    let (tx, mut rx) = mpsc::unbounded_channel();
    let subscription = tracker(&store, &ChatConfig::default())
        .subscribe(move |handles| {
            let _ = tx.send(handles);
        })
        .await
        .expect("subscribe");

    assert_eq!(next_update(&mut rx).await, vec!["alice@fogon.app".to_string()]);

    subscription.unsubscribe();
}

#[tokio::test]
async fn query_failure_degrades_to_an_empty_set() {
    let store = Arc::new(MemoryStore::new());
    let alice = store.add_author("alice@fogon.app", "member");
    store.seed_heartbeat(alice, Utc::now());
    store.set_fail_reads(true);

    let (tx, mut rx) = mpsc::unbounded_channel();
    let subscription = tracker(&store, &ChatConfig::default())
        .subscribe(move |handles| {
            let _ = tx.send(handles);
        })
        .await
        .expect("subscribe");

    assert!(next_update(&mut rx).await.is_empty());

    subscription.unsubscribe();
}

#[tokio::test]
async fn unsubscribe_stops_presence_updates() {
    let store = Arc::new(MemoryStore::new());
    let alice = store.add_author("alice@fogon.app", "member");

    let config = ChatConfig {
        presence_tick_ms: 50,
        ..ChatConfig::default()
    };
    let (tx, mut rx) = mpsc::unbounded_channel();
    let subscription = tracker(&store, &config)
        .subscribe(move |handles| {
            let _ = tx.send(handles);
        })
        .await
        .expect("subscribe");

    let _ = next_update(&mut rx).await;
    subscription.unsubscribe();
    subscription.unsubscribe();

    // Drain whatever was already queued, then expect silence.
    while let Ok(Some(_)) = tokio::time::timeout(Duration::from_millis(200), rx.recv()).await {}

    store
        .upsert_heartbeat(alice, Utc::now())
        .await
        .expect("upsert");
    let silent = tokio::time::timeout(Duration::from_millis(300), rx.recv()).await;
    assert!(silent.is_err() || silent.unwrap().is_none());
}
