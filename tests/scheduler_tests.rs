//! Debounced and periodic flushing driven by the registry's own task.

use std::sync::Arc;
use std::time::Duration;

use factionkeep::application::Registry;
use factionkeep::testkit::config::{fast_registry, safety_net_registry};
use factionkeep::testkit::domain::{gang, police};
use factionkeep::testkit::members::RecordingMembers;
use factionkeep::testkit::store::FaultyStore;
use factionkeep::testkit::wait_until;
use rust_decimal_macros::dec;

fn started(config: factionkeep::application::RegistryConfig) -> (Registry, Arc<FaultyStore>) {
    let store = Arc::new(FaultyStore::new());
    let registry = Registry::new(config, store.clone(), Arc::new(RecordingMembers::new()));
    registry.start().unwrap();
    (registry, store)
}

#[tokio::test]
async fn burst_of_changes_is_flushed_once() {
    let (registry, store) = started(fast_registry());
    let pd = registry.create(police()).unwrap();
    let mafia = registry.create(gang("mafia", dec!(100))).unwrap();

    for _ in 0..50 {
        pd.deposit(dec!(1));
        mafia.withdraw(dec!(1));
    }
    assert!(registry.flush_pending());
    assert!(store.batches().is_empty());

    assert!(wait_until(Duration::from_secs(5), || !store.batches().is_empty()).await);
    assert!(wait_until(Duration::from_secs(5), || !registry.flush_pending()).await);

    let batches = store.batches();
    assert_eq!(batches, vec![vec!["mafia".to_string(), "pd".to_string()]]);
    assert!(registry.modified_ids().is_empty());
    assert!(store.body("pd").unwrap().contains("\"50\""));

    registry.shutdown().await.unwrap();
}

#[tokio::test]
async fn each_quiet_window_gets_its_own_flush() {
    let (registry, store) = started(fast_registry());
    let pd = registry.create(police()).unwrap();

    assert!(wait_until(Duration::from_secs(5), || store.batches().len() == 1).await);
    assert!(wait_until(Duration::from_secs(5), || !registry.flush_pending()).await);

    pd.set_name("Police Force");
    assert!(registry.flush_pending());
    assert!(wait_until(Duration::from_secs(5), || store.batches().len() == 2).await);
    assert!(store.body("pd").unwrap().contains("Police Force"));

    registry.shutdown().await.unwrap();
}

#[tokio::test]
async fn backend_failure_waits_for_safety_flush() {
    let (registry, store) = started(safety_net_registry());
    registry.create(police()).unwrap();

    store.fail_batches(true);
    assert!(wait_until(Duration::from_secs(5), || store.batches().len() == 1).await);
    assert!(wait_until(Duration::from_secs(5), || !registry.flush_pending()).await);
    assert!(registry.is_modified("pd"));

    // No new marks arrived, so the failure does not open a new window.
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(store.batches().len(), 1);

    store.fail_batches(false);
    assert!(wait_until(Duration::from_secs(5), || store.body("pd").is_some()).await);
    assert!(wait_until(Duration::from_secs(5), || !registry.is_modified("pd")).await);

    registry.shutdown().await.unwrap();
}

#[tokio::test]
async fn shutdown_cancels_pending_window_and_saves() {
    let mut config = fast_registry();
    config.debounce_ms = 60_000;
    let (registry, store) = started(config);

    let pd = registry.create(police()).unwrap();
    pd.deposit(dec!(3));
    assert!(registry.is_running());

    let written = tokio::time::timeout(Duration::from_secs(5), registry.shutdown())
        .await
        .expect("shutdown should not wait for the debounce window")
        .unwrap();

    assert_eq!(written, 1);
    assert!(!registry.is_running());
    assert!(store.body("pd").is_some());
}

#[tokio::test]
async fn start_is_idempotent() {
    let (registry, _) = started(fast_registry());
    registry.start().unwrap();
    assert!(registry.is_running());
    registry.shutdown().await.unwrap();
}
