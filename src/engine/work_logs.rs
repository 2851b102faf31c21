//! Work log operations

use super::{logged, AuditNote, PlacementEngine};
use crate::audit::ActionType;
use crate::core::error::{HivekeepError, Result};
use crate::core::types::{ApiaryId, EntityType, HiveId, PalletId, WorkLogId};
use crate::entity::work_log::{infestation_rate, validate_varroa};
use crate::entity::{NewWorkLog, TaskStatus, TaskType, VarroaRisk, WorkLog, WorkLogUpdate};
use crate::store::StoreOp;

/// Outcome of a recorded varroa sample
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VarroaReading {
    pub log_id: WorkLogId,
    pub rate: f64,
    pub risk: VarroaRisk,
}

impl PlacementEngine {
    /// References of a work log must point at existing records of its apiary
    fn check_work_log_refs(
        &self,
        apiary_id: ApiaryId,
        pallet_id: Option<PalletId>,
        hive_ids: &[HiveId],
        varroa: Option<f64>,
    ) -> Result<()> {
        if self.yard.apiary(apiary_id).is_none() {
            return Err(HivekeepError::not_found(EntityType::Apiary, apiary_id));
        }
        if let Some(pallet_id) = pallet_id {
            let pallet = self
                .yard
                .pallet(pallet_id)
                .ok_or_else(|| HivekeepError::not_found(EntityType::Pallet, pallet_id))?;
            if pallet.apiary_id != apiary_id {
                return Err(HivekeepError::InvalidTarget(format!(
                    "pallet {} is not in the work log's apiary",
                    pallet.code
                )));
            }
        }
        if let Some(missing) = hive_ids.iter().find(|id| self.yard.hive(**id).is_none()) {
            return Err(HivekeepError::not_found(EntityType::Hive, missing));
        }
        validate_varroa(varroa).map_err(HivekeepError::InvalidAttribute)
    }

    pub fn add_work_log(&mut self, new: NewWorkLog) -> Result<WorkLogId> {
        logged("add_work_log", self.try_add_work_log(new))
    }

    fn try_add_work_log(&mut self, new: NewWorkLog) -> Result<WorkLogId> {
        self.check_work_log_refs(
            new.apiary_id,
            new.pallet_id,
            &new.hive_ids,
            new.varroa_percentage,
        )?;

        let log = WorkLog {
            id: WorkLogId::new(),
            apiary_id: new.apiary_id,
            pallet_id: new.pallet_id,
            hive_ids: new.hive_ids,
            date: new.date.unwrap_or_else(|| self.clock.today()),
            task_type: new.task_type,
            description: new.description,
            status: TaskStatus::Pending,
            assigned_to: new.assigned_to,
            completed_by: None,
            completed_date: None,
            harvested_chambers: new.harvested_chambers,
            harvested_frames: new.harvested_frames,
            varroa_percentage: new.varroa_percentage,
        };
        let id = log.id;
        let note = AuditNote::new(
            EntityType::WorkLog,
            id,
            ActionType::Create,
            format!("Work log: {}", log.task_type),
        );
        self.commit(vec![StoreOp::CreateWorkLog(log)], Some(note))?;
        Ok(id)
    }

    /// Record a mite count taken today as a completed Varroa Control log
    pub fn record_varroa_check(
        &mut self,
        apiary_id: ApiaryId,
        hive_id: HiveId,
        mites: u32,
        bees: u32,
    ) -> Result<VarroaReading> {
        logged(
            "record_varroa_check",
            self.try_record_varroa_check(apiary_id, hive_id, mites, bees),
        )
    }

    fn try_record_varroa_check(
        &mut self,
        apiary_id: ApiaryId,
        hive_id: HiveId,
        mites: u32,
        bees: u32,
    ) -> Result<VarroaReading> {
        let hive = self
            .yard
            .hive(hive_id)
            .ok_or_else(|| HivekeepError::not_found(EntityType::Hive, hive_id))?;
        if !hive.is_live() {
            return Err(HivekeepError::InvalidTarget(format!(
                "hive {} is dead",
                hive_id.short()
            )));
        }
        let rate = infestation_rate(mites, bees);
        self.check_work_log_refs(apiary_id, Some(hive.pallet_id), &[hive_id], Some(rate))?;

        let stamp = self.stamp();
        let log = WorkLog {
            id: WorkLogId::new(),
            apiary_id,
            pallet_id: Some(hive.pallet_id),
            hive_ids: vec![hive_id],
            date: stamp.on,
            task_type: TaskType::VarroaControl,
            description: format!("Varroa check: {} mites in {} bees sample", mites, bees),
            status: TaskStatus::Completed,
            assigned_to: None,
            completed_by: Some(stamp.by),
            completed_date: Some(stamp.on),
            harvested_chambers: None,
            harvested_frames: None,
            varroa_percentage: Some(rate),
        };
        let log_id = log.id;
        let risk = VarroaRisk::from_rate(rate);
        let note = AuditNote::new(
            EntityType::WorkLog,
            log_id,
            ActionType::Create,
            format!("Work log: {} ({:.2}%, {} risk)", log.task_type, rate, risk),
        );
        self.commit(vec![StoreOp::CreateWorkLog(log)], Some(note))?;
        Ok(VarroaReading { log_id, rate, risk })
    }

    /// Edit a work log; only a status change is audited
    pub fn update_work_log(&mut self, id: WorkLogId, update: WorkLogUpdate) -> Result<()> {
        logged("update_work_log", self.try_update_work_log(id, update))
    }

    fn try_update_work_log(&mut self, id: WorkLogId, update: WorkLogUpdate) -> Result<()> {
        let log = self
            .yard
            .work_log(id)
            .ok_or_else(|| HivekeepError::not_found(EntityType::WorkLog, id))?;

        let hive_ids = update.hive_ids.as_deref().unwrap_or(log.hive_ids.as_slice());
        self.check_work_log_refs(
            log.apiary_id,
            update.pallet_id.or(log.pallet_id),
            hive_ids,
            update.varroa_percentage,
        )?;

        let note = update.status.filter(|s| *s != log.status).map(|status| {
            AuditNote::new(
                EntityType::WorkLog,
                id,
                ActionType::Update,
                format!("Work log status: {}", status),
            )
        });
        self.commit(vec![StoreOp::UpdateWorkLog { id, update }], note)
    }

    /// Mark a pending work log done by the current actor today
    pub fn complete_work_log(&mut self, id: WorkLogId) -> Result<()> {
        let already_done = self
            .yard
            .work_log(id)
            .is_some_and(|log| log.status == TaskStatus::Completed);
        if already_done {
            return logged(
                "complete_work_log",
                Err(HivekeepError::InvalidTarget("work log is already completed".into())),
            );
        }

        let stamp = self.stamp();
        self.update_work_log(
            id,
            WorkLogUpdate {
                status: Some(TaskStatus::Completed),
                completed_by: Some(stamp.by),
                completed_date: Some(stamp.on),
                ..WorkLogUpdate::default()
            },
        )
    }
}
