//! Hive operations: add, update, move, remove

use tracing::debug;

use super::{logged, AuditNote, PlacementEngine};
use crate::audit::ActionType;
use crate::core::config::RemovalPolicy;
use crate::core::error::{HivekeepError, Result};
use crate::core::types::{EntityType, HiveId, PalletId};
use crate::entity::{Hive, HiveSpec, HiveStatus, HiveUpdate};
use crate::placement::{self, MoveOutcome, MoveRequest};
use crate::store::StoreOp;

impl PlacementEngine {
    /// Put a new hive on the lowest free slot of a pallet
    pub fn add_hive(&mut self, pallet_id: PalletId, spec: HiveSpec) -> Result<HiveId> {
        logged("add_hive", self.try_add_hive(pallet_id, spec))
    }

    fn try_add_hive(&mut self, pallet_id: PalletId, spec: HiveSpec) -> Result<HiveId> {
        placement::check_chambers(spec.chamber_count, self.config.max_chamber_count)?;
        if !spec.status.is_live() {
            return Err(HivekeepError::InvalidAttribute(
                "a new hive cannot be added as Dead".into(),
            ));
        }
        let (pallet, position) = placement::allocate(&self.yard, pallet_id)?;
        let code = pallet.code.clone();

        let stamp = self.stamp();
        let hive = Hive {
            id: HiveId::new(),
            pallet_id,
            position,
            chamber_count: spec.chamber_count,
            lid_type: spec.lid_type,
            status: spec.status,
            queen: spec.queen,
            last_updated: stamp.on,
            updated_by: stamp.by,
        };
        let id = hive.id;
        let note = AuditNote::new(
            EntityType::Hive,
            id,
            ActionType::Create,
            format!("Added hive to pallet {} at position {}", code, position),
        );
        self.commit(vec![StoreOp::CreateHive(hive)], Some(note))?;
        Ok(id)
    }

    /// Change a hive's attributes
    ///
    /// Bringing a Dead hive back to life claims its old slot again, or the
    /// lowest free one when that slot was reused meanwhile.
    pub fn update_hive(&mut self, id: HiveId, update: HiveUpdate) -> Result<()> {
        logged("update_hive", self.try_update_hive(id, update))
    }

    fn try_update_hive(&mut self, id: HiveId, update: HiveUpdate) -> Result<()> {
        let hive = self
            .yard
            .hive(id)
            .ok_or_else(|| HivekeepError::not_found(EntityType::Hive, id))?;
        if let Some(chambers) = update.chamber_count {
            placement::check_chambers(chambers, self.config.max_chamber_count)?;
        }

        let mut details = update.change_details(hive);
        let stamp = self.stamp();
        let mut ops = Vec::new();

        let revived = !hive.is_live() && update.status.is_some_and(|s| s.is_live());
        if revived {
            let pallet = self
                .yard
                .pallet(hive.pallet_id)
                .ok_or_else(|| HivekeepError::not_found(EntityType::Pallet, hive.pallet_id))?;
            if !placement::has_free_slot(&self.yard, pallet) {
                return Err(placement::occupancy::full(pallet));
            }
            let slot_taken = !pallet.has_slot(hive.position)
                || self.yard.resident(pallet.id, hive.position).is_some();
            if slot_taken {
                let position =
                    placement::lowest_free_position(&self.yard, pallet.id, pallet.capacity, None)
                        .ok_or_else(|| placement::occupancy::full(pallet))?;
                details.push(format!("Position: {} -> {}", hive.position, position));
                ops.push(StoreOp::MoveHive {
                    id,
                    pallet_id: pallet.id,
                    position,
                    stamp: stamp.clone(),
                });
            }
        }

        ops.insert(0, StoreOp::UpdateHive { id, update, stamp });
        let note = (!details.is_empty())
            .then(|| AuditNote::new(EntityType::Hive, id, ActionType::Update, details.join(", ")));
        self.commit(ops, note)
    }

    /// Drop a hive on a pallet or a slot
    ///
    /// Returns what happened; `MoveOutcome::Unchanged` commits nothing.
    pub fn move_hive(&mut self, request: MoveRequest) -> Result<MoveOutcome> {
        logged("move_hive", self.try_move_hive(request))
    }

    fn try_move_hive(&mut self, request: MoveRequest) -> Result<MoveOutcome> {
        let plan = placement::plan_move(&self.yard, &request)?;
        if plan.outcome == MoveOutcome::Unchanged {
            debug!(hive = %request.hive_id, "Move leaves hive in place");
            return Ok(plan.outcome);
        }

        let code_of = |pallet_id: PalletId| {
            self.yard
                .pallet(pallet_id)
                .map(|p| p.code.clone())
                .unwrap_or_else(|| pallet_id.short())
        };
        let to = plan.destination();
        let details = match plan.outcome {
            MoveOutcome::Relocated => {
                format!("Moved to position {} on {}", to.position, code_of(to.pallet_id))
            }
            MoveOutcome::AutoPlaced => {
                format!("Moved to {} (auto position {})", code_of(to.pallet_id), to.position)
            }
            MoveOutcome::SwappedPosition { .. } => format!(
                "Swapped positions {} <-> {} on {}",
                plan.origin.position,
                to.position,
                code_of(to.pallet_id)
            ),
            MoveOutcome::SwappedOccupant { with } => format!(
                "Swapped with hive {}: {} #{} <-> {} #{}",
                with.short(),
                code_of(plan.origin.pallet_id),
                plan.origin.position,
                code_of(to.pallet_id),
                to.position
            ),
            MoveOutcome::Unchanged => String::new(),
        };

        let stamp = self.stamp();
        let ops = plan
            .placements
            .iter()
            .map(|p| StoreOp::MoveHive {
                id: p.hive_id,
                pallet_id: p.pallet_id,
                position: p.position,
                stamp: stamp.clone(),
            })
            .collect();
        let note = AuditNote::new(EntityType::Hive, request.hive_id, ActionType::Move, details);
        self.commit(ops, Some(note))?;
        Ok(plan.outcome)
    }

    /// Take a hive off its pallet per the configured removal policy
    pub fn remove_hive(&mut self, id: HiveId) -> Result<()> {
        logged("remove_hive", self.try_remove_hive(id))
    }

    fn try_remove_hive(&mut self, id: HiveId) -> Result<()> {
        let plan = placement::plan_removal(&self.yard, id, self.config.removal_policy)?;
        let (op, details) = match plan.policy {
            RemovalPolicy::Delete => (
                StoreOp::DeleteHive(id),
                format!("Removed hive from pallet {}", plan.pallet_code),
            ),
            RemovalPolicy::MarkDead => (
                StoreOp::UpdateHive {
                    id,
                    update: HiveUpdate::status(HiveStatus::Dead),
                    stamp: self.stamp(),
                },
                format!("Marked hive dead on pallet {}", plan.pallet_code),
            ),
        };
        let note = AuditNote::new(EntityType::Hive, id, ActionType::Delete, details);
        self.commit(vec![op], Some(note))
    }
}

#[cfg(test)]
mod tests {
    use crate::audit::ActionType;
    use crate::core::clock::FixedClock;
    use crate::core::config::{EngineConfig, RemovalPolicy};
    use crate::core::error::HivekeepError;
    use crate::core::types::{ApiaryId, PalletId};
    use crate::engine::PlacementEngine;
    use crate::entity::{HiveSpec, HiveStatus, HiveUpdate, LidType, NewApiary, QueenStatus};
    use crate::placement::{MoveOutcome, MoveRequest};
    use crate::state::Yard;
    use chrono::NaiveDate;

    fn setup(policy: RemovalPolicy) -> (PlacementEngine, ApiaryId, PalletId, PalletId) {
        let config = EngineConfig {
            removal_policy: policy,
            ..EngineConfig::default()
        };
        let mut engine = PlacementEngine::new(Yard::new(), config)
            .unwrap()
            .with_clock(FixedClock::on(NaiveDate::from_ymd_opt(2024, 10, 1).unwrap()));
        let apiary = engine.create_apiary(NewApiary::named("Colina")).unwrap();
        let p1 = engine.create_pallet(apiary, None).unwrap();
        let p2 = engine.create_pallet(apiary, Some(2)).unwrap();
        (engine, apiary, p1, p2)
    }

    #[test]
    fn test_add_hive_audit_names_slot() {
        let (mut engine, _, p1, _) = setup(RemovalPolicy::Delete);
        let hive = engine.add_hive(p1, HiveSpec::default()).unwrap();

        assert_eq!(engine.yard().hive(hive).unwrap().position, 0);
        let entry = engine.audit_log().last().unwrap();
        assert_eq!(entry.action, ActionType::Create);
        assert_eq!(entry.details, "Added hive to pallet P-001 at position 0");
    }

    #[test]
    fn test_add_hive_validates_attributes() {
        let (mut engine, _, p1, _) = setup(RemovalPolicy::Delete);
        assert!(matches!(
            engine.add_hive(p1, HiveSpec::default().with_chambers(5)),
            Err(HivekeepError::InvalidAttribute(_))
        ));
        assert!(matches!(
            engine.add_hive(p1, HiveSpec::default().with_status(HiveStatus::Dead)),
            Err(HivekeepError::InvalidAttribute(_))
        ));
        assert!(engine.yard().hives().is_empty());
    }

    #[test]
    fn test_update_records_tracked_changes_only() {
        let (mut engine, _, p1, _) = setup(RemovalPolicy::Delete);
        let hive = engine.add_hive(p1, HiveSpec::default()).unwrap();
        let before = engine.audit_log().len();

        engine
            .update_hive(
                hive,
                HiveUpdate {
                    lid_type: Some(LidType::Migratory),
                    ..HiveUpdate::default()
                },
            )
            .unwrap();
        assert_eq!(engine.audit_log().len(), before);
        assert_eq!(engine.yard().hive(hive).unwrap().lid_type, LidType::Migratory);

        engine
            .update_hive(
                hive,
                HiveUpdate {
                    status: Some(HiveStatus::Bad),
                    queen_status: Some(QueenStatus::Virgin),
                    ..HiveUpdate::default()
                },
            )
            .unwrap();
        assert_eq!(
            engine.audit_log().last().unwrap().details,
            "Status: Good -> Bad, Queen: Alive -> Virgin"
        );
    }

    #[test]
    fn test_revive_reclaims_free_slot_or_moves() {
        let (mut engine, _, _, p2) = setup(RemovalPolicy::MarkDead);
        let a = engine.add_hive(p2, HiveSpec::default()).unwrap();
        engine.remove_hive(a).unwrap();
        let b = engine.add_hive(p2, HiveSpec::default()).unwrap();
        assert_eq!(engine.yard().hive(b).unwrap().position, 0);

        engine.update_hive(a, HiveUpdate::status(HiveStatus::Good)).unwrap();
        let revived = engine.yard().hive(a).unwrap();
        assert_eq!(revived.position, 1);
        assert!(engine
            .audit_log()
            .last()
            .unwrap()
            .details
            .contains("Position: 0 -> 1"));
    }

    #[test]
    fn test_revive_on_full_pallet_rejected() {
        let (mut engine, _, _, p2) = setup(RemovalPolicy::MarkDead);
        let a = engine.add_hive(p2, HiveSpec::default()).unwrap();
        engine.remove_hive(a).unwrap();
        engine.add_hive(p2, HiveSpec::default()).unwrap();
        engine.add_hive(p2, HiveSpec::default()).unwrap();

        let err = engine
            .update_hive(a, HiveUpdate::status(HiveStatus::Regular))
            .unwrap_err();
        assert!(matches!(err, HivekeepError::CapacityExceeded { .. }));
        assert_eq!(engine.yard().hive(a).unwrap().status, HiveStatus::Dead);
    }

    #[test]
    fn test_move_audit_details() {
        let (mut engine, _, p1, p2) = setup(RemovalPolicy::Delete);
        let a = engine.add_hive(p1, HiveSpec::default()).unwrap();
        let b = engine.add_hive(p1, HiveSpec::default()).unwrap();

        engine.move_hive(MoveRequest::to_slot(a, p1, 3)).unwrap();
        assert_eq!(engine.audit_log().last().unwrap().details, "Moved to position 3 on P-001");

        engine.move_hive(MoveRequest::to_slot(b, p1, 3)).unwrap();
        assert_eq!(
            engine.audit_log().last().unwrap().details,
            "Swapped positions 1 <-> 3 on P-001"
        );

        engine.move_hive(MoveRequest::to_pallet(a, p2)).unwrap();
        assert_eq!(
            engine.audit_log().last().unwrap().details,
            "Moved to P-002 (auto position 0)"
        );
    }

    #[test]
    fn test_unchanged_move_is_not_audited() {
        let (mut engine, _, p1, _) = setup(RemovalPolicy::Delete);
        let a = engine.add_hive(p1, HiveSpec::default()).unwrap();
        let before = engine.audit_log().len();

        let outcome = engine.move_hive(MoveRequest::to_slot(a, p1, 0)).unwrap();
        assert_eq!(outcome, MoveOutcome::Unchanged);
        assert_eq!(engine.audit_log().len(), before);
    }

    #[test]
    fn test_remove_under_both_policies() {
        let (mut engine, _, p1, _) = setup(RemovalPolicy::Delete);
        let a = engine.add_hive(p1, HiveSpec::default()).unwrap();
        engine.remove_hive(a).unwrap();
        assert!(engine.yard().hive(a).is_none());
        assert_eq!(
            engine.audit_log().last().unwrap().details,
            "Removed hive from pallet P-001"
        );

        let (mut engine, _, p1, _) = setup(RemovalPolicy::MarkDead);
        let a = engine.add_hive(p1, HiveSpec::default()).unwrap();
        engine.remove_hive(a).unwrap();
        assert_eq!(engine.yard().hive(a).unwrap().status, HiveStatus::Dead);
        assert!(matches!(
            engine.remove_hive(a),
            Err(HivekeepError::InvalidTarget(_))
        ));
    }
}
