//! Save and load paths across every backend, including failure handling.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use factionkeep::adapter::outbound::sqlite::database::connection::{create_pool, run_migrations};
use factionkeep::adapter::outbound::{DirectoryStore, MemoryStore, SqliteStore};
use factionkeep::application::Registry;
use factionkeep::domain::{FactionId, ItemStack, Rank, RankId, RankSpec};
use factionkeep::error::{Error, Result};
use factionkeep::port::outbound::{BatchOutcome, FactionStore, StoredRecord};
use factionkeep::testkit::config::fast_registry;
use factionkeep::testkit::domain::{gang, police, record, record_without_entry_rank};
use factionkeep::testkit::members::RecordingMembers;
use factionkeep::testkit::store::FaultyStore;
use factionkeep::testkit::within;
use rust_decimal_macros::dec;
use tokio::sync::Notify;

fn registry_on(store: Arc<dyn FactionStore>) -> Registry {
    Registry::new(fast_registry(), store, Arc::new(RecordingMembers::new()))
}

/// Populate a registry with factions exercising every persisted field.
fn populate(registry: &Registry) {
    let pd = registry.create(police()).unwrap();
    pd.deposit(dec!(1250.75));

    let mut cadet = pd.rank(RankId::ENTRY).unwrap();
    cadet.set_display_name("Cadet");
    pd.update_rank(cadet);
    pd.add_rank(Rank::new(
        RankSpec::new(4, "Detective")
            .salary(dec!(80.5))
            .permissions(["faction.warehouse.open"]),
    ));
    pd.set_warehouse_slot(2, Some(ItemStack::new("IRON_INGOT", 16).named("Evidence")));

    registry.create(gang("mafia", dec!(99.99))).unwrap();
}

async fn assert_round_trip(store: Arc<dyn FactionStore>) {
    let first = registry_on(store.clone());
    populate(&first);
    assert_eq!(first.save_all().await.unwrap(), 2);
    assert!(first.modified_ids().is_empty());

    let second = registry_on(store);
    let report = second.load_all().await.unwrap();
    assert_eq!(report.loaded, 2);
    assert_eq!(report.skipped, 0);
    assert_eq!(report.repaired, 0);
    assert!(second.modified_ids().is_empty());

    for id in ["pd", "mafia"] {
        let before = first.get(id).unwrap().snapshot();
        let after = second.get(id).unwrap().snapshot();
        assert_eq!(before, after, "faction {id} changed across save/load");
    }

    let pd = second.get("pd").unwrap();
    let cadet = pd.rank(RankId::ENTRY).unwrap();
    assert_eq!(cadet.display_name(), "Cadet");
    assert!(cadet.has_custom_display_name());
    assert_eq!(
        pd.warehouse_contents()[2].as_ref().map(|s| s.material.as_str()),
        Some("IRON_INGOT")
    );
}

#[tokio::test]
async fn round_trip_memory() {
    assert_round_trip(Arc::new(MemoryStore::new())).await;
}

#[tokio::test]
async fn round_trip_sqlite() {
    let dir = tempfile::tempdir().unwrap();
    let pool = create_pool(&dir.path().join("factions.db").to_string_lossy()).unwrap();
    run_migrations(&pool).unwrap();
    assert_round_trip(Arc::new(SqliteStore::new(pool))).await;
}

#[tokio::test]
async fn round_trip_directory() {
    let dir = tempfile::tempdir().unwrap();
    let store = DirectoryStore::open(dir.path().join("factions")).unwrap();
    assert_round_trip(Arc::new(store)).await;
    assert!(dir.path().join("factions").join("pd.json").is_file());
}

#[tokio::test]
async fn save_modified_writes_only_dirty_factions_in_one_batch() {
    let store = Arc::new(FaultyStore::new());
    let registry = registry_on(store.clone());
    populate(&registry);
    registry.create(gang("triad", dec!(0))).unwrap();
    registry.save_modified().await;

    registry.get("mafia").unwrap().deposit(dec!(1));
    registry.get("triad").unwrap().set_prefix("[T]");

    assert_eq!(registry.save_modified().await, 2);
    let batches = store.batches();
    assert_eq!(batches.len(), 2);
    assert_eq!(batches[1], vec!["mafia".to_string(), "triad".to_string()]);
    assert!(registry.modified_ids().is_empty());
}

#[tokio::test]
async fn failed_batch_requeues_every_id() {
    let store = Arc::new(FaultyStore::new());
    let registry = registry_on(store.clone());
    populate(&registry);

    store.fail_batches(true);
    assert_eq!(registry.save_modified().await, 0);
    assert_eq!(registry.modified_ids(), vec![FactionId::new("mafia"), FactionId::new("pd")]);
    assert_eq!(registry.stats().write_failures, 2);

    store.fail_batches(false);
    assert_eq!(registry.save_modified().await, 2);
    assert!(registry.modified_ids().is_empty());
}

#[tokio::test]
async fn failed_record_requeues_only_that_id() {
    let store = Arc::new(FaultyStore::new());
    let registry = registry_on(store.clone());
    populate(&registry);

    store.fail_key("pd");
    assert_eq!(registry.save_modified().await, 1);
    assert_eq!(registry.modified_ids(), vec![FactionId::new("pd")]);
    assert!(store.body("mafia").is_some());
    assert!(store.body("pd").is_none());

    store.heal_key("pd");
    assert_eq!(registry.save_modified().await, 1);
    assert!(store.body("pd").is_some());
}

#[tokio::test]
async fn save_all_reports_partial_failure() {
    let store = Arc::new(FaultyStore::new());
    let registry = registry_on(store.clone());
    populate(&registry);

    store.fail_key("mafia");
    let err = registry.save_all().await.unwrap_err();
    assert!(matches!(err, Error::PartialWrite { failed: 1 }));
    assert_eq!(registry.modified_ids(), vec![FactionId::new("mafia")]);

    store.fail_batches(true);
    assert!(registry.save_all().await.is_err());
    assert_eq!(registry.modified_ids().len(), 2);
}

#[tokio::test]
async fn malformed_records_are_skipped() {
    let store = Arc::new(MemoryStore::with_records([
        record("pd", "Police", dec!(10)),
        StoredRecord::new("broken", "{ not json"),
        StoredRecord::new("no name", "{}"),
    ]));
    let registry = registry_on(store);

    let report = registry.load_all().await.unwrap();
    assert_eq!(report.loaded, 1);
    assert_eq!(report.skipped, 2);
    assert_eq!(registry.ids(), vec![FactionId::new("pd")]);
}

#[tokio::test]
async fn missing_entry_rank_is_repaired_and_rewritten() {
    let store = Arc::new(MemoryStore::with_records([record_without_entry_rank("old")]));
    let registry = registry_on(store.clone());

    let report = registry.load_all().await.unwrap();
    assert_eq!(report.repaired, 1);
    assert!(registry.is_modified("old"));

    let faction = registry.get("old").unwrap();
    assert_eq!(
        faction.entry_rank().unwrap().default_name(),
        registry.config().entry_rank_name
    );

    registry.save_modified().await;
    let body = store.body("old").unwrap();
    let value: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert!(value["ranks"]["1"].is_object());
}

#[tokio::test]
async fn reload_discards_unflushed_changes_and_detaches_handles() {
    let store = Arc::new(MemoryStore::with_records([record("pd", "Police", dec!(10))]));
    let registry = registry_on(store);
    registry.load_all().await.unwrap();

    let stale = registry.get("pd").unwrap();
    assert!(stale.deposit(dec!(5)));

    let report = registry.reload().await.unwrap();
    assert_eq!(report.discarded, 1);
    assert!(registry.modified_ids().is_empty());

    let fresh = registry.get("pd").unwrap();
    assert_eq!(fresh.balance(), dec!(10));

    assert!(!stale.deposit(dec!(1)));
    assert!(fresh.deposit(dec!(1)));
    assert!(registry.is_modified("pd"));
}

#[tokio::test]
async fn load_failure_keeps_current_factions() {
    struct Unreadable;

    #[async_trait]
    impl FactionStore for Unreadable {
        fn name(&self) -> &'static str {
            "unreadable"
        }
        async fn read_all(&self) -> Result<Vec<StoredRecord>> {
            Err(Error::Database("disk on fire".into()))
        }
        async fn write_batch(&self, records: Vec<StoredRecord>) -> Result<BatchOutcome> {
            Ok(BatchOutcome::all_written(
                records.into_iter().map(|r| r.key).collect(),
            ))
        }
        async fn delete(&self, _id: &FactionId) -> Result<bool> {
            Ok(false)
        }
        async fn flush(&self) -> Result<()> {
            Ok(())
        }
    }

    let registry = registry_on(Arc::new(Unreadable));
    registry.create(police()).unwrap();

    assert!(registry.reload().await.is_err());
    assert!(registry.contains("pd"));
    assert!(registry.is_modified("pd"));
}

/// Store whose first batch blocks until released.
struct GatedStore {
    inner: MemoryStore,
    entered: Notify,
    release: Notify,
}

#[async_trait]
impl FactionStore for GatedStore {
    fn name(&self) -> &'static str {
        "gated"
    }
    async fn read_all(&self) -> Result<Vec<StoredRecord>> {
        self.inner.read_all().await
    }
    async fn write_batch(&self, records: Vec<StoredRecord>) -> Result<BatchOutcome> {
        self.entered.notify_one();
        self.release.notified().await;
        self.inner.write_batch(records).await
    }
    async fn delete(&self, id: &FactionId) -> Result<bool> {
        self.inner.delete(id).await
    }
    async fn flush(&self) -> Result<()> {
        Ok(())
    }
}

#[tokio::test]
async fn marks_during_a_flush_survive_it() {
    let store = Arc::new(GatedStore {
        inner: MemoryStore::new(),
        entered: Notify::new(),
        release: Notify::new(),
    });
    let registry = registry_on(store.clone());
    let pd = registry.create(police()).unwrap();
    let mafia = registry.create(gang("mafia", dec!(0))).unwrap();

    let flushing = {
        let registry = registry.clone();
        tokio::spawn(async move { registry.save_modified().await })
    };
    within(Duration::from_secs(5), store.entered.notified()).await;

    // The dirty set was taken before the batch started.
    assert!(registry.modified_ids().is_empty());
    pd.deposit(dec!(7));

    store.release.notify_one();
    let written = within(Duration::from_secs(5), flushing).await.unwrap();
    assert_eq!(written, 2);

    assert_eq!(registry.modified_ids(), vec![FactionId::new("pd")]);
    assert!(!registry.is_modified(mafia.id().as_str()));
}
