//! Integration tests for nuclei, work logs and apiary administration
//!
//! Covers the flows around the placement core:
//! - Nucleus promotion commits the new hive and the nucleus removal together
//! - Work logs reference existing records and complete under the actor's name
//! - Role and account checks on apiary administration

use chrono::NaiveDate;

use hivekeep::audit::ActionType;
use hivekeep::core::clock::FixedClock;
use hivekeep::core::config::EngineConfig;
use hivekeep::core::error::HivekeepError;
use hivekeep::core::types::{ApiaryId, EntityType};
use hivekeep::engine::PlacementEngine;
use hivekeep::entity::{
    ApiaryStatus, ApiaryUpdate, HiveSpec, HiveStatus, NewApiary, NewWorkLog, NucleusSpec,
    PromotionTarget, QueenOrigin, QueenStatus, Role, TaskStatus, TaskType, User, UserStatus,
};
use hivekeep::state::Yard;

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, 12).unwrap()
}

fn engine() -> PlacementEngine {
    PlacementEngine::new(Yard::new(), EngineConfig::default())
        .unwrap()
        .with_clock(FixedClock::on(today()))
}

fn engine_with_apiary(name: &str) -> (PlacementEngine, ApiaryId) {
    let mut engine = engine();
    let apiary = engine.create_apiary(NewApiary::named(name)).unwrap();
    (engine, apiary)
}

// ============================================================================
// Promotion
// ============================================================================

#[test]
fn test_promotion_creates_hive_and_removes_nucleus() {
    let (mut engine, apiary) = engine_with_apiary("Los Boldos");
    let pallet = engine.create_pallet(apiary, Some(3)).unwrap();
    engine.add_hive(pallet, HiveSpec::default()).unwrap();
    let nucleus = engine.add_nucleus(apiary, NucleusSpec::default()).unwrap();
    let audit_len = engine.audit_log().len();

    let hive_id = engine
        .promote_nucleus(nucleus, PromotionTarget { pallet_id: pallet, chamber_count: 3 })
        .unwrap();

    assert!(engine.yard().nucleus(nucleus).is_none());
    let hive = engine.yard().hive(hive_id).unwrap();
    assert_eq!(hive.pallet_id, pallet);
    assert_eq!(hive.position, 1);
    assert_eq!(hive.chamber_count, 3);
    assert_eq!(hive.status, HiveStatus::Good);
    assert_eq!(hive.queen.status, QueenStatus::Alive);
    assert_eq!(hive.queen.origin, QueenOrigin::Nucleus);
    assert_eq!(hive.queen.install_date, Some(today()));

    // One entry for the whole promotion
    assert_eq!(engine.audit_log().len(), audit_len + 1);
    let entry = engine.audit_log().last().unwrap();
    assert_eq!(entry.action, ActionType::Promote);
    assert_eq!(entry.entity_type, EntityType::Nucleus);
    assert!(entry.details.contains(&nucleus.short()));
    assert!(entry.details.contains(&hive_id.short()));
    assert!(entry.details.contains("P-001"));
}

#[test]
fn test_promotion_onto_full_pallet_changes_nothing() {
    let (mut engine, apiary) = engine_with_apiary("Los Boldos");
    let pallet = engine.create_pallet(apiary, Some(1)).unwrap();
    engine.add_hive(pallet, HiveSpec::default()).unwrap();
    let nucleus = engine.add_nucleus(apiary, NucleusSpec::default()).unwrap();
    let before = engine.yard().clone();
    let audit_len = engine.audit_log().len();

    let err = engine
        .promote_nucleus(nucleus, PromotionTarget { pallet_id: pallet, chamber_count: 1 })
        .unwrap_err();
    assert!(matches!(err, HivekeepError::CapacityExceeded { .. }));

    assert_eq!(engine.yard(), &before);
    assert_eq!(engine.audit_log().len(), audit_len);
}

#[test]
fn test_promotion_with_too_many_chambers_is_rejected() {
    let (mut engine, apiary) = engine_with_apiary("Los Boldos");
    let pallet = engine.create_pallet(apiary, None).unwrap();
    let nucleus = engine.add_nucleus(apiary, NucleusSpec::default()).unwrap();

    let err = engine
        .promote_nucleus(nucleus, PromotionTarget { pallet_id: pallet, chamber_count: 9 })
        .unwrap_err();
    assert!(matches!(err, HivekeepError::InvalidAttribute(_)));
    assert!(engine.yard().nucleus(nucleus).is_some());
    assert!(engine.yard().hives().is_empty());
}

#[test]
fn test_promotion_target_list_skips_full_pallets() {
    let (mut engine, apiary) = engine_with_apiary("Los Boldos");
    let full = engine.create_pallet(apiary, Some(1)).unwrap();
    let open = engine.create_pallet(apiary, Some(2)).unwrap();
    engine.add_hive(full, HiveSpec::default()).unwrap();
    let nucleus = engine.add_nucleus(apiary, NucleusSpec::default()).unwrap();

    let targets: Vec<_> = engine.drop_targets(apiary).iter().map(|p| p.id).collect();
    assert_eq!(targets, vec![open]);

    let hive = engine
        .mark_nucleus_ready(nucleus, Some(PromotionTarget { pallet_id: targets[0], chamber_count: 1 }))
        .unwrap();
    assert!(hive.is_some());
    assert!(engine.drop_targets(apiary).iter().all(|p| p.id == open));
}

// ============================================================================
// Work logs
// ============================================================================

#[test]
fn test_work_log_lifecycle() {
    let (mut engine, apiary) = engine_with_apiary("Los Boldos");
    let pallet = engine.create_pallet(apiary, None).unwrap();
    let hive = engine.add_hive(pallet, HiveSpec::default()).unwrap();
    engine
        .set_actor(Some(User::new("ines", "Inés", Role::Beekeeper)))
        .unwrap();

    let mut new = NewWorkLog::new(apiary, TaskType::Harvest);
    new.pallet_id = Some(pallet);
    new.hive_ids = vec![hive];
    new.harvested_chambers = Some(2);
    let log = engine.add_work_log(new).unwrap();

    assert_eq!(engine.yard().work_logs_in(apiary).count(), 1);
    engine.complete_work_log(log).unwrap();

    let log = engine.yard().work_log(log).unwrap();
    assert_eq!(log.status, TaskStatus::Completed);
    assert_eq!(log.completed_by.as_deref(), Some("Inés"));
    assert_eq!(log.completed_date, Some(today()));

    let entries: Vec<_> = engine.audit_log().for_entity(log.id).collect();
    assert_eq!(entries.len(), 2);
    assert!(entries.iter().all(|e| e.performed_by == "Inés"));
}

#[test]
fn test_varroa_percentage_bounds() {
    let (mut engine, apiary) = engine_with_apiary("Los Boldos");

    let mut at_limit = NewWorkLog::new(apiary, TaskType::VarroaControl);
    at_limit.varroa_percentage = Some(100.0);
    assert!(engine.add_work_log(at_limit).is_ok());

    let mut negative = NewWorkLog::new(apiary, TaskType::VarroaControl);
    negative.varroa_percentage = Some(-0.5);
    assert!(matches!(
        engine.add_work_log(negative),
        Err(HivekeepError::InvalidAttribute(_))
    ));
    assert_eq!(engine.yard().work_logs().len(), 1);
}

// ============================================================================
// Apiary administration
// ============================================================================

#[test]
fn test_beekeeper_cannot_administer_apiaries() {
    let (mut engine, apiary) = engine_with_apiary("Los Boldos");
    engine
        .set_actor(Some(User::new("tomas", "Tomás", Role::Beekeeper)))
        .unwrap();

    assert!(matches!(
        engine.create_apiary(NewApiary::named("Nueva")),
        Err(HivekeepError::PermissionDenied(_))
    ));
    assert!(matches!(
        engine.deactivate_apiary(apiary),
        Err(HivekeepError::PermissionDenied(_))
    ));

    // Day to day work is still allowed
    let pallet = engine.create_pallet(apiary, None).unwrap();
    assert!(engine.add_hive(pallet, HiveSpec::default()).is_ok());
}

#[test]
fn test_admin_deactivates_without_cascade() {
    let (mut engine, apiary) = engine_with_apiary("Los Boldos");
    let pallet = engine.create_pallet(apiary, Some(2)).unwrap();
    engine.add_hive(pallet, HiveSpec::default()).unwrap();
    engine
        .set_actor(Some(User::new("rosa", "Rosa", Role::Admin)))
        .unwrap();

    engine.deactivate_apiary(apiary).unwrap();
    assert_eq!(engine.yard().apiary(apiary).unwrap().status, ApiaryStatus::Inactive);
    assert_eq!(engine.audit_log().last().unwrap().details, "Deactivated apiary");

    // Placement ignores apiary status
    assert!(engine.add_hive(pallet, HiveSpec::default()).is_ok());
    assert_eq!(engine.occupancy(pallet), 2);

    engine
        .update_apiary(
            apiary,
            ApiaryUpdate {
                name: Some("Los Boldos Norte".into()),
                ..ApiaryUpdate::default()
            },
        )
        .unwrap();
    assert_eq!(
        engine.audit_log().last().unwrap().details,
        "Renamed apiary to Los Boldos Norte"
    );
}

#[test]
fn test_disabled_user_cannot_sign_in() {
    let mut engine = engine();
    let mut user = User::new("old", "Old Account", Role::Admin);
    user.status = UserStatus::Disabled;

    assert!(matches!(
        engine.set_actor(Some(user)),
        Err(HivekeepError::PermissionDenied(_))
    ));
    assert!(engine.actor().is_none());
    assert_eq!(engine.actor_name(), "System");
}
