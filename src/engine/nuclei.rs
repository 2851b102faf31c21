//! Nucleus operations and promotion into hives

use super::{logged, AuditNote, PlacementEngine};
use crate::audit::ActionType;
use crate::core::error::{HivekeepError, Result};
use crate::core::types::{ApiaryId, EntityType, HiveId, NucleusId};
use crate::entity::{
    Hive, HiveStatus, LidType, Nucleus, NucleusSpec, NucleusStatus, NucleusUpdate,
    PromotionTarget, Queen, QueenOrigin, QueenStatus,
};
use crate::placement;
use crate::store::StoreOp;

impl PlacementEngine {
    pub fn add_nucleus(&mut self, apiary_id: ApiaryId, spec: NucleusSpec) -> Result<NucleusId> {
        logged("add_nucleus", self.try_add_nucleus(apiary_id, spec))
    }

    fn try_add_nucleus(&mut self, apiary_id: ApiaryId, spec: NucleusSpec) -> Result<NucleusId> {
        let apiary = self
            .yard
            .apiary(apiary_id)
            .ok_or_else(|| HivekeepError::not_found(EntityType::Apiary, apiary_id))?;
        let details = format!("Added nucleus to {}", apiary.name);

        let stamp = self.stamp();
        let nucleus = Nucleus {
            id: NucleusId::new(),
            apiary_id,
            status: spec.status,
            install_date: spec.install_date.unwrap_or(stamp.on),
            last_updated: stamp.on,
            updated_by: stamp.by,
        };
        let id = nucleus.id;
        let note = AuditNote::new(EntityType::Nucleus, id, ActionType::Create, details);
        self.commit(vec![StoreOp::CreateNucleus(nucleus)], Some(note))?;
        Ok(id)
    }

    /// Change status or install date; only a status change is audited
    pub fn update_nucleus(&mut self, id: NucleusId, update: NucleusUpdate) -> Result<()> {
        logged("update_nucleus", self.try_update_nucleus(id, update))
    }

    fn try_update_nucleus(&mut self, id: NucleusId, update: NucleusUpdate) -> Result<()> {
        let nucleus = self
            .yard
            .nucleus(id)
            .ok_or_else(|| HivekeepError::not_found(EntityType::Nucleus, id))?;
        let note = update
            .status
            .filter(|s| *s != nucleus.status)
            .map(|status| {
                AuditNote::new(
                    EntityType::Nucleus,
                    id,
                    ActionType::Update,
                    format!("Status: {} -> {}", nucleus.status, status),
                )
            });

        let stamp = self.stamp();
        self.commit(vec![StoreOp::UpdateNucleus { id, update, stamp }], note)
    }

    /// Turn a nucleus into a hive on the lowest free slot of a pallet
    ///
    /// The new hive and the nucleus removal commit together, or not at all.
    pub fn promote_nucleus(&mut self, id: NucleusId, target: PromotionTarget) -> Result<HiveId> {
        logged("promote_nucleus", self.try_promote_nucleus(id, target))
    }

    fn try_promote_nucleus(&mut self, id: NucleusId, target: PromotionTarget) -> Result<HiveId> {
        let plan = placement::plan_promotion(
            &self.yard,
            id,
            target,
            self.config.max_chamber_count,
        )?;

        let stamp = self.stamp();
        let hive = Hive {
            id: HiveId::new(),
            pallet_id: plan.pallet.id,
            position: plan.position,
            chamber_count: plan.chamber_count,
            lid_type: LidType::Standard,
            status: HiveStatus::Good,
            queen: Queen {
                status: QueenStatus::Alive,
                origin: QueenOrigin::Nucleus,
                install_date: Some(stamp.on),
            },
            last_updated: stamp.on,
            updated_by: stamp.by,
        };
        let hive_id = hive.id;
        let note = AuditNote::new(
            EntityType::Nucleus,
            id,
            ActionType::Promote,
            format!(
                "Promoted nucleus {} to hive {} on pallet {} at position {}",
                id.short(),
                hive_id.short(),
                plan.pallet.code,
                plan.position
            ),
        );
        self.commit(
            vec![StoreOp::CreateHive(hive), StoreOp::DeleteNucleus(id)],
            Some(note),
        )?;
        Ok(hive_id)
    }

    /// Flag a nucleus as ready, promoting it right away when a target is given
    ///
    /// Returns the new hive when a promotion happened.
    pub fn mark_nucleus_ready(
        &mut self,
        id: NucleusId,
        target: Option<PromotionTarget>,
    ) -> Result<Option<HiveId>> {
        match target {
            Some(target) => self.promote_nucleus(id, target).map(Some),
            None => {
                let update = NucleusUpdate {
                    status: Some(NucleusStatus::Ready),
                    ..NucleusUpdate::default()
                };
                self.update_nucleus(id, update).map(|_| None)
            }
        }
    }
}
