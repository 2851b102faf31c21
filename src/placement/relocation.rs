//! Drag-and-drop relocation planning
//!
//! A drop either lets the engine pick a slot (general drop) or names one.
//! Naming an occupied slot swaps the two hives; swaps never check capacity
//! since both pallets keep their live count.

use tracing::debug;

use crate::core::error::{HivekeepError, Result};
use crate::core::types::{ApiaryId, EntityType, HiveId, PalletId, Position};
use crate::placement::occupancy;
use crate::state::Yard;

/// A drop gesture
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveRequest {
    pub hive_id: HiveId,
    pub target_pallet_id: PalletId,
    pub target_apiary_id: Option<ApiaryId>,
    pub target_position: Option<Position>,
}

impl MoveRequest {
    /// Drop on a pallet and let the engine choose the slot
    pub fn to_pallet(hive_id: HiveId, target_pallet_id: PalletId) -> Self {
        Self {
            hive_id,
            target_pallet_id,
            target_apiary_id: None,
            target_position: None,
        }
    }

    /// Drop on a specific slot
    pub fn to_slot(hive_id: HiveId, target_pallet_id: PalletId, position: Position) -> Self {
        Self {
            target_position: Some(position),
            ..Self::to_pallet(hive_id, target_pallet_id)
        }
    }

    pub fn in_apiary(mut self, apiary_id: ApiaryId) -> Self {
        self.target_apiary_id = Some(apiary_id);
        self
    }
}

/// Where a hive ends up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub hive_id: HiveId,
    pub pallet_id: PalletId,
    pub position: Position,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    /// Dropped on an empty slot
    Relocated,
    /// General drop, lowest free slot chosen
    AutoPlaced,
    /// Exchanged positions with a hive on the same pallet
    SwappedPosition { with: HiveId },
    /// Exchanged pallet and position with a hive on another pallet
    SwappedOccupant { with: HiveId },
    /// The hive would end where it already is
    Unchanged,
}

impl MoveOutcome {
    pub fn is_swap(&self) -> bool {
        matches!(
            self,
            MoveOutcome::SwappedPosition { .. } | MoveOutcome::SwappedOccupant { .. }
        )
    }
}

/// Validated result of a drop, not yet applied
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MovePlan {
    pub outcome: MoveOutcome,
    /// Slot of the mover before the move
    pub origin: Placement,
    /// New slots, the mover first
    pub placements: Vec<Placement>,
}

impl MovePlan {
    fn unchanged(origin: Placement) -> Self {
        Self {
            outcome: MoveOutcome::Unchanged,
            origin,
            placements: Vec::new(),
        }
    }

    pub fn destination(&self) -> Placement {
        self.placements.first().copied().unwrap_or(self.origin)
    }
}

/// Resolve a drop into the placements it needs
///
/// A general drop on the hive's own pallet counts the hive's current slot as
/// free, so it only moves when a lower slot is open.
pub fn plan_move(yard: &Yard, request: &MoveRequest) -> Result<MovePlan> {
    let hive = yard
        .hive(request.hive_id)
        .ok_or_else(|| HivekeepError::not_found(EntityType::Hive, request.hive_id))?;
    if !hive.is_live() {
        return Err(HivekeepError::InvalidTarget(format!(
            "hive {} is dead and cannot be moved",
            hive.id.short()
        )));
    }

    let target = yard
        .pallet(request.target_pallet_id)
        .ok_or_else(|| HivekeepError::not_found(EntityType::Pallet, request.target_pallet_id))?;
    if let Some(apiary_id) = request.target_apiary_id {
        if apiary_id != target.apiary_id {
            return Err(HivekeepError::InvalidTarget(format!(
                "pallet {} does not belong to apiary {}",
                target.code,
                apiary_id.short()
            )));
        }
    }

    let origin = Placement {
        hive_id: hive.id,
        pallet_id: hive.pallet_id,
        position: hive.position,
    };
    let same_pallet = hive.pallet_id == target.id;

    let Some(position) = request.target_position else {
        // General drop: the mover's own slot counts as free
        let others = occupancy::occupancy_excluding(yard, target.id, Some(hive.id));
        if !same_pallet && others >= target.capacity {
            return Err(occupancy::full(target));
        }
        let position =
            occupancy::lowest_free_position(yard, target.id, target.capacity, Some(hive.id))
                .ok_or_else(|| occupancy::full(target))?;
        if same_pallet && position == hive.position {
            return Ok(MovePlan::unchanged(origin));
        }

        debug!(hive = %hive.id, pallet = %target.code, position, "auto placement");
        return Ok(MovePlan {
            outcome: MoveOutcome::AutoPlaced,
            origin,
            placements: vec![Placement {
                hive_id: hive.id,
                pallet_id: target.id,
                position,
            }],
        });
    };

    if !target.has_slot(position) {
        return Err(HivekeepError::InvalidTarget(format!(
            "position {} is outside pallet {} ({} slots)",
            position, target.code, target.capacity
        )));
    }

    let mover = Placement {
        hive_id: hive.id,
        pallet_id: target.id,
        position,
    };

    match yard.resident(target.id, position).filter(|h| h.id != hive.id) {
        None if same_pallet && position == hive.position => Ok(MovePlan::unchanged(origin)),
        None => Ok(MovePlan {
            outcome: MoveOutcome::Relocated,
            origin,
            placements: vec![mover],
        }),
        Some(resident) => {
            let outcome = if same_pallet {
                MoveOutcome::SwappedPosition { with: resident.id }
            } else {
                MoveOutcome::SwappedOccupant { with: resident.id }
            };
            debug!(hive = %hive.id, with = %resident.id, "swap planned");
            Ok(MovePlan {
                outcome,
                origin,
                placements: vec![
                    mover,
                    Placement {
                        hive_id: resident.id,
                        pallet_id: origin.pallet_id,
                        position: origin.position,
                    },
                ],
            })
        }
    }
}
