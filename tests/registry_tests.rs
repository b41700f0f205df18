//! Registry behavior: creation, dirty tracking, deletion and shutdown.

use std::sync::Arc;

use factionkeep::adapter::outbound::MemoryStore;
use factionkeep::application::{NewFaction, Registry, RegistryConfig};
use factionkeep::domain::{FactionId, FactionKind, RankId};
use factionkeep::error::RegistryError;
use factionkeep::testkit::config::fast_registry;
use factionkeep::testkit::domain::{gang, police};
use factionkeep::testkit::members::RecordingMembers;
use factionkeep::testkit::store::FaultyStore;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn registry() -> (Registry, Arc<FaultyStore>, Arc<RecordingMembers>) {
    let store = Arc::new(FaultyStore::new());
    let members = Arc::new(RecordingMembers::new());
    let registry = Registry::new(fast_registry(), store.clone(), members.clone());
    (registry, store, members)
}

#[test]
fn create_builds_entry_and_leader_ranks() {
    let (registry, _, _) = registry();
    let config = registry.config().clone();

    let faction = registry.create(police()).unwrap();

    let ranks = faction.ranks();
    assert_eq!(ranks.len(), 2);
    assert_eq!(faction.entry_rank().unwrap().default_name(), config.entry_rank_name);

    let leader = faction.leader_rank().unwrap();
    assert_eq!(leader.id(), RankId::new(config.leader_rank_id));
    assert_eq!(leader.default_name(), config.leader_rank_name);
    for permission in &config.leader_permissions {
        assert!(leader.has_permission(permission), "missing {permission}");
    }

    assert_eq!(faction.kind(), FactionKind::State);
    assert_eq!(faction.warehouse_size(), 9);
    assert_eq!(faction.warehouse_contents().len(), 9);
    assert_eq!(faction.balance(), Decimal::ZERO);
    assert!(registry.is_modified("pd"));
}

#[test]
fn leader_rank_never_replaces_entry_rank() {
    let config = RegistryConfig {
        leader_rank_id: 1,
        ..fast_registry()
    };
    let registry = Registry::new(
        config,
        Arc::new(MemoryStore::new()),
        Arc::new(RecordingMembers::new()),
    );

    let faction = registry.create(police()).unwrap();

    assert_eq!(faction.ranks().len(), 2);
    assert_eq!(faction.entry_rank().unwrap().default_name(), "Recruit");
    assert_eq!(faction.leader_rank().unwrap().id(), RankId::new(2));
}

#[test]
fn create_uses_defaults_for_missing_fields() {
    let (registry, _, _) = registry();

    let faction = registry
        .create(NewFaction::new("civ", "Civilians").warehouse_size(0))
        .unwrap();

    assert_eq!(faction.kind(), FactionKind::Other);
    assert_eq!(faction.color(), "#FFFFFF");
    assert_eq!(faction.prefix(), "");
    assert_eq!(faction.warehouse_size(), registry.config().default_warehouse_size);
}

#[test]
fn duplicate_ids_are_rejected_case_insensitively() {
    let (registry, _, _) = registry();
    registry.create(police()).unwrap();

    let err = registry
        .create(NewFaction::new("PD", "Another Police"))
        .unwrap_err();
    assert_eq!(err, RegistryError::DuplicateId("pd".into()));
    assert_eq!(registry.len(), 1);
    assert_eq!(registry.get("Pd").unwrap().name(), "Police Department");
}

#[test]
fn invalid_ids_are_rejected() {
    let (registry, _, _) = registry();

    for raw in ["", "   ", "two words", "pd!"] {
        let err = registry.create(NewFaction::new(raw, "Bad")).unwrap_err();
        assert!(matches!(err, RegistryError::InvalidId(_)), "{raw:?}");
    }
    assert!(registry.is_empty());
}

#[test]
fn marking_an_unknown_id_changes_nothing() {
    let (registry, _, _) = registry();
    registry.create(police()).unwrap();
    let before = registry.modified_ids();

    assert!(!registry.mark_modified("ghost"));
    assert_eq!(registry.modified_ids(), before);
}

#[test]
fn mark_modified_is_idempotent() {
    let (registry, _, _) = registry();
    registry.create(police()).unwrap();

    assert!(registry.mark_modified("pd"));
    assert!(registry.mark_modified("PD"));
    assert_eq!(registry.modified_ids(), vec![FactionId::new("pd")]);
    assert!(registry.flush_pending());
}

#[tokio::test]
async fn treasury_scenario_through_registry() {
    let (registry, _, _) = registry();
    let pd = registry.create(police()).unwrap();
    registry.save_modified().await;
    assert!(!registry.is_modified("pd"));

    assert!(pd.deposit(dec!(500)));
    assert_eq!(pd.balance(), dec!(500));
    assert!(registry.is_modified("pd"));

    assert!(!pd.withdraw(dec!(600)));
    assert_eq!(pd.balance(), dec!(500));

    assert!(pd.withdraw(dec!(500)));
    assert_eq!(pd.balance(), dec!(0));
}

#[tokio::test]
async fn rank_rename_marks_faction_dirty() {
    let (registry, _, _) = registry();
    let pd = registry.create(police()).unwrap();
    registry.save_modified().await;
    assert!(!registry.is_modified("pd"));

    let mut rank = pd.rank(RankId::ENTRY).unwrap();
    rank.set_display_name("Cadet");
    assert!(!registry.is_modified("pd"));

    assert!(pd.update_rank(rank.clone()));
    assert!(registry.is_modified("pd"));
    assert_eq!(pd.rank(RankId::ENTRY).unwrap().display_name(), "Cadet");

    rank.reset_display_name();
    assert_eq!(rank.display_name(), rank.default_name());
}

#[tokio::test]
async fn delete_clears_members_once_and_removes_record() {
    let (registry, store, members) = registry();
    registry.create(police()).unwrap();
    registry.create(gang("mafia", dec!(10))).unwrap();
    registry.save_modified().await;
    assert!(store.body("pd").is_some());

    members.bind_players("pd", 3);
    members.bind_players("mafia", 1);

    let cleared = registry.delete("PD").await.unwrap();

    assert_eq!(cleared, 3);
    assert_eq!(members.clear_calls(), vec![FactionId::new("pd")]);
    assert!(registry.get("pd").is_none());
    assert!(!registry.is_modified("pd"));
    assert!(store.body("pd").is_none());
    assert_eq!(members.index().members_of(&"mafia".into()).len(), 1);
}

#[tokio::test]
async fn delete_of_dirty_faction_drops_pending_write() {
    let (registry, store, _) = registry();
    let pd = registry.create(police()).unwrap();
    pd.deposit(dec!(5));
    assert!(registry.is_modified("pd"));

    registry.delete("pd").await.unwrap();
    assert_eq!(registry.save_modified().await, 0);
    assert!(store.body("pd").is_none());
}

#[tokio::test]
async fn deleting_an_unknown_faction_is_reported() {
    let (registry, store, members) = registry();

    let err = registry.delete("ghost").await.unwrap_err();
    assert_eq!(err, RegistryError::UnknownFaction("ghost".into()));
    assert!(members.clear_calls().is_empty());
    assert!(store.deletes().is_empty());
}

#[tokio::test]
async fn failed_store_delete_is_retried_by_next_flush() {
    let (registry, store, _) = registry();
    registry.create(police()).unwrap();
    registry.save_modified().await;

    store.fail_deletes(true);
    registry.delete("pd").await.unwrap();
    assert!(registry.get("pd").is_none());
    assert!(registry.is_modified("pd"));
    assert!(store.body("pd").is_some());

    store.fail_deletes(false);
    assert_eq!(registry.save_modified().await, 0);
    assert!(store.body("pd").is_none());
    assert!(!registry.is_modified("pd"));
    assert_eq!(registry.stats().stale_deleted, 1);
}

#[tokio::test]
async fn shutdown_saves_everything_and_rejects_changes() {
    let store = Arc::new(MemoryStore::new());
    let members = Arc::new(RecordingMembers::new());
    let registry = Registry::new(fast_registry(), store.clone(), members);
    registry.start().unwrap();

    let pd = registry.create(police()).unwrap();
    pd.deposit(dec!(42));

    let written = registry.shutdown().await.unwrap();
    assert_eq!(written, 1);
    assert!(store.body("pd").unwrap().contains("\"42\""));
    assert!(!registry.is_running());

    assert!(!pd.deposit(dec!(1)));
    assert_eq!(pd.balance(), dec!(42));
    assert!(!registry.mark_modified("pd"));
    assert_eq!(
        registry.create(gang("late", dec!(0))).unwrap_err(),
        RegistryError::ShuttingDown
    );
    assert_eq!(registry.start().unwrap_err(), RegistryError::ShuttingDown);
    assert_eq!(
        registry.delete("pd").await.unwrap_err(),
        RegistryError::ShuttingDown
    );
    assert!(registry.contains("pd"));
    assert!(store.body("pd").is_some());
    assert_eq!(registry.shutdown().await.unwrap(), 0);
}

#[test]
fn queries_return_sorted_views() {
    let (registry, _, _) = registry();
    registry.create(gang("zeta", dec!(0))).unwrap();
    registry.create(gang("alpha", dec!(0))).unwrap();
    registry.create(police()).unwrap();

    let ids: Vec<String> = registry.ids().into_iter().map(String::from).collect();
    assert_eq!(ids, vec!["alpha", "pd", "zeta"]);
    assert_eq!(registry.factions()[1].id().as_str(), "pd");
    assert!(registry.contains("ZETA"));

    let stats = registry.stats();
    assert_eq!(stats.factions, 3);
    assert_eq!(stats.dirty, 3);
}
