//! Apiary lifecycle and pallet creation

use super::{logged, AuditNote, PlacementEngine};
use crate::audit::ActionType;
use crate::core::error::{HivekeepError, Result};
use crate::core::types::{ApiaryId, EntityType, PalletId};
use crate::entity::{Apiary, ApiaryStatus, ApiaryUpdate, NewApiary, Pallet};
use crate::store::StoreOp;

fn check_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(HivekeepError::InvalidAttribute(
            "apiary name must not be empty".into(),
        ));
    }
    Ok(())
}

impl PlacementEngine {
    /// Create an active apiary (admin only)
    pub fn create_apiary(&mut self, new: NewApiary) -> Result<ApiaryId> {
        logged("create_apiary", self.try_create_apiary(new))
    }

    fn try_create_apiary(&mut self, new: NewApiary) -> Result<ApiaryId> {
        self.require_admin("create apiaries")?;
        check_name(&new.name)?;

        let apiary = Apiary {
            id: ApiaryId::new(),
            name: new.name.trim().to_string(),
            area: new.area,
            location: new.location,
            status: ApiaryStatus::Active,
        };
        let id = apiary.id;
        let note = AuditNote::new(
            EntityType::Apiary,
            id,
            ActionType::Create,
            format!("Created apiary {}", apiary.name),
        );
        self.commit(vec![StoreOp::CreateApiary(apiary)], Some(note))?;
        Ok(id)
    }

    /// Edit an apiary; changing its status needs the admin role
    ///
    /// Deactivation does not cascade: pallets, hives and nuclei are untouched.
    pub fn update_apiary(&mut self, id: ApiaryId, update: ApiaryUpdate) -> Result<()> {
        logged("update_apiary", self.try_update_apiary(id, update))
    }

    fn try_update_apiary(&mut self, id: ApiaryId, update: ApiaryUpdate) -> Result<()> {
        let apiary = self
            .yard
            .apiary(id)
            .ok_or_else(|| HivekeepError::not_found(EntityType::Apiary, id))?;
        if update.status.is_some_and(|s| s != apiary.status) {
            self.require_admin("change apiary status")?;
        }
        if let Some(name) = &update.name {
            check_name(name)?;
        }

        let details = update.describe(apiary);
        let note = AuditNote::new(EntityType::Apiary, id, ActionType::Update, details);
        self.commit(vec![StoreOp::UpdateApiary { id, update }], Some(note))
    }

    pub fn deactivate_apiary(&mut self, id: ApiaryId) -> Result<()> {
        self.update_apiary(id, ApiaryUpdate::status(ApiaryStatus::Inactive))
    }

    pub fn activate_apiary(&mut self, id: ApiaryId) -> Result<()> {
        self.update_apiary(id, ApiaryUpdate::status(ApiaryStatus::Active))
    }

    /// Append a pallet with the apiary's next sequential code
    ///
    /// Without an explicit capacity the configured default applies.
    pub fn create_pallet(&mut self, apiary_id: ApiaryId, capacity: Option<u32>) -> Result<PalletId> {
        logged("create_pallet", self.try_create_pallet(apiary_id, capacity))
    }

    fn try_create_pallet(&mut self, apiary_id: ApiaryId, capacity: Option<u32>) -> Result<PalletId> {
        let apiary = self
            .yard
            .apiary(apiary_id)
            .ok_or_else(|| HivekeepError::not_found(EntityType::Apiary, apiary_id))?;
        let capacity = capacity.unwrap_or(self.config.default_pallet_capacity);
        if capacity == 0 {
            return Err(HivekeepError::InvalidAttribute(
                "pallet capacity must be at least 1".into(),
            ));
        }

        // Codes loaded from older data may not be contiguous
        let mut ordinal = self.yard.pallets_in(apiary_id).count() + 1;
        let mut code = self.config.pallet_code(ordinal);
        while self.yard.pallet_by_code(apiary_id, &code).is_some() {
            ordinal += 1;
            code = self.config.pallet_code(ordinal);
        }

        let pallet = Pallet {
            id: PalletId::new(),
            apiary_id,
            code,
            capacity,
        };
        let id = pallet.id;
        let note = AuditNote::new(
            EntityType::Pallet,
            id,
            ActionType::Create,
            format!("Created pallet {} in {}", pallet.code, apiary.name),
        );
        self.commit(vec![StoreOp::CreatePallet(pallet)], Some(note))?;
        Ok(id)
    }
}
