//! Nucleus promotion planning

use crate::core::error::{HivekeepError, Result};
use crate::core::types::{EntityType, NucleusId, Position};
use crate::entity::{Nucleus, Pallet, PromotionTarget};
use crate::placement::{check_chambers, occupancy};
use crate::state::Yard;

/// A validated promotion: the nucleus to consume and the slot its hive takes
#[derive(Debug, Clone, PartialEq)]
pub struct PromotionPlan {
    pub nucleus: Nucleus,
    pub pallet: Pallet,
    pub position: Position,
    pub chamber_count: u8,
}

pub fn plan_promotion(
    yard: &Yard,
    nucleus_id: NucleusId,
    target: PromotionTarget,
    max_chamber_count: u8,
) -> Result<PromotionPlan> {
    let nucleus = yard
        .nucleus(nucleus_id)
        .ok_or_else(|| HivekeepError::not_found(EntityType::Nucleus, nucleus_id))?;
    check_chambers(target.chamber_count, max_chamber_count)?;

    let pallet = yard
        .pallet(target.pallet_id)
        .ok_or_else(|| HivekeepError::not_found(EntityType::Pallet, target.pallet_id))?;
    if pallet.apiary_id != nucleus.apiary_id {
        return Err(HivekeepError::InvalidTarget(format!(
            "pallet {} is in a different apiary than nucleus {}",
            pallet.code,
            nucleus.id.short()
        )));
    }

    let (pallet, position) = occupancy::allocate(yard, pallet.id)?;

    Ok(PromotionPlan {
        nucleus: nucleus.clone(),
        pallet: pallet.clone(),
        position,
        chamber_count: target.chamber_count,
    })
}
