//! Hive removal planning

use crate::core::config::RemovalPolicy;
use crate::core::error::{HivekeepError, Result};
use crate::core::types::{EntityType, HiveId};
use crate::entity::Hive;
use crate::state::Yard;

#[derive(Debug, Clone, PartialEq)]
pub struct RemovalPlan {
    pub hive: Hive,
    /// Code of the pallet the hive vacates
    pub pallet_code: String,
    pub policy: RemovalPolicy,
}

pub fn plan_removal(yard: &Yard, hive_id: HiveId, policy: RemovalPolicy) -> Result<RemovalPlan> {
    let hive = yard
        .hive(hive_id)
        .ok_or_else(|| HivekeepError::not_found(EntityType::Hive, hive_id))?;

    if policy == RemovalPolicy::MarkDead && !hive.is_live() {
        return Err(HivekeepError::InvalidTarget(format!(
            "hive {} is already dead",
            hive.id.short()
        )));
    }

    // A hive whose pallet is gone can still be removed
    let pallet_code = yard
        .pallet(hive.pallet_id)
        .map(|p| p.code.clone())
        .unwrap_or_else(|| hive.pallet_id.short());

    Ok(RemovalPlan {
        hive: hive.clone(),
        pallet_code,
        policy,
    })
}
