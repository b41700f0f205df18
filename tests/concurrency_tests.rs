//! Registry and faction behavior under concurrent callers.

use std::sync::Arc;
use std::time::Duration;

use factionkeep::application::{NewFaction, Registry};
use factionkeep::testkit::config::fast_registry;
use factionkeep::testkit::domain::gang;
use factionkeep::testkit::members::RecordingMembers;
use factionkeep::testkit::store::FaultyStore;
use factionkeep::testkit::wait_until;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tokio::sync::Barrier;

fn registry() -> (Registry, Arc<FaultyStore>) {
    let store = Arc::new(FaultyStore::new());
    let registry = Registry::new(fast_registry(), store.clone(), Arc::new(RecordingMembers::new()));
    (registry, store)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_withdrawals_never_overdraw() {
    let (registry, _) = registry();
    let mafia = registry.create(gang("mafia", dec!(100))).unwrap();

    let tasks = 40;
    let barrier = Arc::new(Barrier::new(tasks));
    let mut handles = Vec::with_capacity(tasks);
    for _ in 0..tasks {
        let barrier = barrier.clone();
        let mafia = mafia.clone();
        handles.push(tokio::spawn(async move {
            barrier.wait().await;
            (0..5).filter(|_| mafia.withdraw(dec!(1))).count()
        }));
    }

    let mut succeeded = 0;
    for handle in handles {
        succeeded += handle.await.unwrap();
    }

    assert_eq!(succeeded, 100, "exactly the funded withdrawals succeed");
    assert_eq!(mafia.balance(), Decimal::ZERO);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_creates_of_one_id_admit_a_single_winner() {
    let (registry, _) = registry();

    let tasks = 16;
    let barrier = Arc::new(Barrier::new(tasks));
    let mut handles = Vec::with_capacity(tasks);
    for n in 0..tasks {
        let barrier = barrier.clone();
        let registry = registry.clone();
        handles.push(tokio::spawn(async move {
            barrier.wait().await;
            // Mixed case maps to the same id.
            let id = if n % 2 == 0 { "Ballas" } else { "ballas" };
            registry.create(NewFaction::new(id, format!("Ballas {n}"))).is_ok()
        }));
    }

    let mut winners = 0;
    for handle in handles {
        if handle.await.unwrap() {
            winners += 1;
        }
    }

    assert_eq!(winners, 1);
    assert_eq!(registry.len(), 1);
    assert_eq!(registry.modified_ids().len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_marks_and_flushes_lose_nothing() {
    let (registry, store) = registry();
    let ids: Vec<String> = (0..8).map(|n| format!("crew{n}")).collect();
    for id in &ids {
        registry.create(gang(id, dec!(0))).unwrap();
    }
    registry.save_modified().await;

    let barrier = Arc::new(Barrier::new(ids.len() + 1));
    let mut writers = Vec::new();
    for id in &ids {
        let barrier = barrier.clone();
        let faction = registry.get(id).unwrap();
        writers.push(tokio::spawn(async move {
            barrier.wait().await;
            for _ in 0..50 {
                faction.deposit(dec!(1));
                tokio::task::yield_now().await;
            }
        }));
    }

    let flusher = {
        let registry = registry.clone();
        let barrier = barrier.clone();
        tokio::spawn(async move {
            barrier.wait().await;
            for _ in 0..20 {
                registry.save_modified().await;
                tokio::task::yield_now().await;
            }
        })
    };

    for writer in writers {
        writer.await.unwrap();
    }
    flusher.await.unwrap();

    // Whatever the interleaving, a final flush leaves the store current.
    registry.save_modified().await;
    assert!(registry.modified_ids().is_empty());
    for id in &ids {
        let body = store.body(id).unwrap();
        assert!(body.contains("\"50\""), "{id} stored a stale balance: {body}");
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn started_registry_converges_under_load() {
    let (registry, store) = registry();
    registry.start().unwrap();
    let faction = registry.create(gang("vagos", dec!(0))).unwrap();

    let mut handles = Vec::new();
    for _ in 0..4 {
        let faction = faction.clone();
        handles.push(tokio::spawn(async move {
            for _ in 0..25 {
                faction.deposit(dec!(1));
                tokio::time::sleep(Duration::from_millis(2)).await;
            }
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let converged = wait_until(Duration::from_secs(5), || {
        !registry.flush_pending()
            && store
                .body("vagos")
                .is_some_and(|body| body.contains("\"100\""))
    })
    .await;
    assert!(converged, "debounced flushes never caught up with the last deposit");
    assert!(registry.modified_ids().is_empty());

    registry.shutdown().await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn deposits_accepted_during_shutdown_are_saved() {
    for _ in 0..50 {
        let (registry, store) = registry();
        let faction = registry.create(gang("vagos", dec!(0))).unwrap();

        let barrier = Arc::new(std::sync::Barrier::new(2));
        let depositor = {
            let faction = faction.clone();
            let barrier = barrier.clone();
            tokio::task::spawn_blocking(move || {
                barrier.wait();
                let mut accepted = 0u32;
                while faction.deposit(dec!(1)) {
                    accepted += 1;
                }
                accepted
            })
        };

        barrier.wait();
        registry.shutdown().await.unwrap();
        let accepted = depositor.await.unwrap();

        let body = store.body("vagos").unwrap();
        let record: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(record["balance"], accepted.to_string());
        assert_eq!(faction.balance(), Decimal::from(accepted));
    }
}
