//! Integration tests for persistence
//!
//! The engine hands every commit to a `StoreWriter` that drains them into a
//! `JsonFileStore` on a blocking task. Reopening the file must reproduce the
//! engine's state and audit trail exactly.

use chrono::NaiveDate;
use std::path::Path;

use hivekeep::core::clock::FixedClock;
use hivekeep::core::config::{EngineConfig, RemovalPolicy};
use hivekeep::core::error::HivekeepError;
use hivekeep::engine::PlacementEngine;
use hivekeep::entity::{
    HiveSpec, NewApiary, NewUser, NewWorkLog, NucleusSpec, PromotionTarget, QueenOrigin, Role,
    TaskType, User, UserStatus,
};
use hivekeep::placement::MoveRequest;
use hivekeep::state::{Loader, Snapshot, Yard};
use hivekeep::store::{JsonFileStore, StoreError, StoreWriter};

fn clock() -> FixedClock {
    FixedClock::on(NaiveDate::from_ymd_opt(2025, 9, 22).unwrap())
}

fn config() -> EngineConfig {
    EngineConfig {
        removal_policy: RemovalPolicy::MarkDead,
        ..EngineConfig::default()
    }
}

fn open(path: &Path) -> hivekeep::Result<JsonFileStore> {
    let loader = Loader::new(&config(), &clock());
    JsonFileStore::open(path, &loader)
}

#[tokio::test]
async fn test_engine_changes_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("inventory.json");

    let seed = JsonFileStore::from_snapshot(
        path.clone(),
        Snapshot {
            yard: Yard::new().with_users(vec![User::new("marta", "Marta", Role::Admin)]),
            ..Snapshot::default()
        },
    );
    seed.save().unwrap();

    let store = open(&path).unwrap();
    let yard = store.yard().clone();
    let writer = StoreWriter::spawn(store);

    let mut engine = PlacementEngine::new(yard, config())
        .unwrap()
        .with_clock(clock())
        .with_sink(writer.sink());
    engine.sign_in("MARTA").unwrap();

    let luis = engine
        .create_user(NewUser::new("luis", "Luis Pérez", Role::Beekeeper))
        .unwrap();
    engine.set_user_status(luis, UserStatus::Disabled).unwrap();

    let apiary = engine.create_apiary(NewApiary::named("El Romeral")).unwrap();
    let p1 = engine.create_pallet(apiary, Some(2)).unwrap();
    let p2 = engine.create_pallet(apiary, Some(3)).unwrap();
    let a = engine.add_hive(p1, HiveSpec::default()).unwrap();
    let b = engine.add_hive(p2, HiveSpec::default().with_chambers(2)).unwrap();
    engine.move_hive(MoveRequest::to_slot(a, p2, 0)).unwrap();
    engine.remove_hive(b).unwrap();

    let nucleus = engine.add_nucleus(apiary, NucleusSpec::default()).unwrap();
    let promoted = engine
        .promote_nucleus(nucleus, PromotionTarget { pallet_id: p1, chamber_count: 1 })
        .unwrap();

    let mut log = NewWorkLog::new(apiary, TaskType::Inspection);
    log.hive_ids = vec![a, promoted];
    let log = engine.add_work_log(log).unwrap();
    engine.complete_work_log(log).unwrap();

    // Rejected operations never reach the store
    assert!(engine.add_hive(p1, HiveSpec::default()).is_ok());
    assert!(engine.add_hive(p1, HiveSpec::default()).is_err());

    let expected_yard = engine.yard().clone();
    let expected_audit = engine.audit_log().entries().to_vec();
    drop(engine);

    let store = writer.shutdown().await.unwrap();
    assert_eq!(store.yard(), &expected_yard);
    assert_eq!(store.audit(), expected_audit.as_slice());

    let reopened = open(&path).unwrap();
    assert_eq!(reopened.yard(), &expected_yard);
    assert_eq!(reopened.audit(), expected_audit.as_slice());
    assert_eq!(reopened.yard().users().len(), 2);
    assert_eq!(
        reopened.yard().find_user("luis").unwrap().status,
        UserStatus::Disabled
    );
    assert!(reopened.yard().check_invariants().is_empty());

    let hive = reopened.yard().hive(promoted).unwrap();
    assert_eq!(hive.queen.origin, QueenOrigin::Nucleus);
    assert_eq!(hive.updated_by, "Marta");
}

#[tokio::test]
async fn test_hand_written_seed_is_normalized() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("seed.json");
    std::fs::write(
        &path,
        r#"{
            "apiaries": [
                {"id": "0b7e4a52-3f0e-4c1a-9d55-000000000001", "name": "Lo Vásquez"}
            ],
            "pallets": [
                {"id": "0b7e4a52-3f0e-4c1a-9d55-000000000010",
                 "apiaryId": "0b7e4a52-3f0e-4c1a-9d55-000000000001",
                 "code": "P-001", "capacity": 0}
            ],
            "hives": [
                {"id": "0b7e4a52-3f0e-4c1a-9d55-000000000100",
                 "palletId": "0b7e4a52-3f0e-4c1a-9d55-000000000010"},
                {"id": "0b7e4a52-3f0e-4c1a-9d55-000000000101",
                 "palletId": "0b7e4a52-3f0e-4c1a-9d55-000000000010",
                 "queenOrigin": "Carniolan breeder"}
            ]
        }"#,
    )
    .unwrap();

    let store = open(&path).unwrap();
    let yard = store.yard().clone();
    let pallet = yard.pallets()[0].id;
    assert_eq!(yard.pallets()[0].capacity, 4);
    let positions: Vec<_> = yard.hives().iter().map(|h| h.position).collect();
    assert_eq!(positions, vec![0, 1]);
    assert_eq!(
        yard.hives()[1].queen.origin,
        QueenOrigin::Named("Carniolan breeder".into())
    );

    let writer = StoreWriter::spawn(store);
    let mut engine = PlacementEngine::new(yard, config())
        .unwrap()
        .with_clock(clock())
        .with_sink(writer.sink());
    let hive = engine.add_hive(pallet, HiveSpec::default()).unwrap();
    assert_eq!(engine.yard().hive(hive).unwrap().position, 2);
    drop(engine);

    let store = writer.shutdown().await.unwrap();
    assert_eq!(store.yard().hives().len(), 3);
    assert_eq!(store.audit().len(), 1);
    assert_eq!(store.audit()[0].performed_by, "System");
}

#[test]
fn test_newer_snapshot_version_is_refused() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.json");
    std::fs::write(&path, r#"{"version": 7, "apiaries": []}"#).unwrap();

    let err = open(&path).unwrap_err();
    assert!(matches!(
        err,
        HivekeepError::Store(StoreError::Version { found: 7, expected: 1 })
    ));
}

#[test]
fn test_missing_file_starts_empty() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("fresh.json");

    let store = open(&path).unwrap();
    assert!(store.yard().apiaries().is_empty());
    assert!(store.yard().users().is_empty());
    assert!(!path.exists());
}
