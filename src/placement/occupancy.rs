//! Capacity and occupancy accounting
//!
//! Dead hives never count: they hold no slot and are skipped by every
//! computation here.

use ahash::AHashSet;

use crate::core::error::{HivekeepError, Result};
use crate::core::types::{EntityType, HiveId, PalletId, Position};
use crate::entity::Pallet;
use crate::state::Yard;

/// Positions held by live hives on a pallet, optionally ignoring one hive
pub fn taken_positions(yard: &Yard, pallet_id: PalletId, exclude: Option<HiveId>) -> AHashSet<Position> {
    yard.live_hives_on(pallet_id)
        .filter(|h| Some(h.id) != exclude)
        .map(|h| h.position)
        .collect()
}

/// Number of live hives on a pallet
pub fn occupancy(yard: &Yard, pallet_id: PalletId) -> u32 {
    occupancy_excluding(yard, pallet_id, None)
}

pub fn occupancy_excluding(yard: &Yard, pallet_id: PalletId, exclude: Option<HiveId>) -> u32 {
    yard.live_hives_on(pallet_id)
        .filter(|h| Some(h.id) != exclude)
        .count() as u32
}

pub fn has_free_slot(yard: &Yard, pallet: &Pallet) -> bool {
    occupancy(yard, pallet.id) < pallet.capacity
}

/// Slots in `0..capacity` no live hive holds, ascending
pub fn free_positions(
    yard: &Yard,
    pallet_id: PalletId,
    capacity: u32,
    exclude: Option<HiveId>,
) -> Vec<Position> {
    let taken = taken_positions(yard, pallet_id, exclude);
    (0..capacity).filter(|p| !taken.contains(p)).collect()
}

/// First free slot scanning upward from 0
pub fn lowest_free_position(
    yard: &Yard,
    pallet_id: PalletId,
    capacity: u32,
    exclude: Option<HiveId>,
) -> Option<Position> {
    let taken = taken_positions(yard, pallet_id, exclude);
    (0..capacity).find(|p| !taken.contains(p))
}

/// Resolve the slot a new hive gets on a pallet
///
/// Fails with `CapacityExceeded` when the pallet is full.
pub fn allocate(yard: &Yard, pallet_id: PalletId) -> Result<(&Pallet, Position)> {
    let pallet = yard
        .pallet(pallet_id)
        .ok_or_else(|| HivekeepError::not_found(EntityType::Pallet, pallet_id))?;

    let position = if has_free_slot(yard, pallet) {
        lowest_free_position(yard, pallet.id, pallet.capacity, None)
    } else {
        None
    };

    position
        .map(|p| (pallet, p))
        .ok_or_else(|| full(pallet))
}

pub(crate) fn full(pallet: &Pallet) -> HivekeepError {
    HivekeepError::CapacityExceeded {
        pallet: pallet.id,
        code: pallet.code.clone(),
        capacity: pallet.capacity,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::ApiaryId;
    use crate::entity::{Hive, HiveStatus, LidType, Queen};
    use crate::store::DataStore;
    use chrono::NaiveDate;

    fn yard_with(capacity: u32, hives: &[(Position, HiveStatus)]) -> (Yard, Pallet) {
        let mut yard = Yard::new();
        let pallet = Pallet {
            id: PalletId::new(),
            apiary_id: ApiaryId::new(),
            code: "P-001".into(),
            capacity,
        };
        yard.create_pallet(pallet.clone()).unwrap();
        for (position, status) in hives {
            yard.create_hive(Hive {
                id: HiveId::new(),
                pallet_id: pallet.id,
                position: *position,
                chamber_count: 2,
                lid_type: LidType::Standard,
                status: *status,
                queen: Queen::default(),
                last_updated: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                updated_by: "System".into(),
            })
            .unwrap();
        }
        (yard, pallet)
    }

    #[test]
    fn test_lowest_free_fills_gaps() {
        let (yard, pallet) = yard_with(4, &[(0, HiveStatus::Good), (2, HiveStatus::Bad)]);
        assert_eq!(lowest_free_position(&yard, pallet.id, 4, None), Some(1));
        assert_eq!(free_positions(&yard, pallet.id, 4, None), vec![1, 3]);
    }

    #[test]
    fn test_dead_hives_do_not_count() {
        let (yard, pallet) = yard_with(
            3,
            &[(0, HiveStatus::Good), (1, HiveStatus::Good), (2, HiveStatus::Dead)],
        );
        assert_eq!(occupancy(&yard, pallet.id), 2);
        assert!(has_free_slot(&yard, &pallet));
        assert_eq!(allocate(&yard, pallet.id).unwrap().1, 2);
    }

    #[test]
    fn test_exclude_frees_the_movers_slot() {
        let (yard, pallet) = yard_with(2, &[(0, HiveStatus::Good), (1, HiveStatus::Good)]);
        let mover = yard.resident(pallet.id, 0).unwrap().id;

        assert_eq!(occupancy_excluding(&yard, pallet.id, Some(mover)), 1);
        assert_eq!(lowest_free_position(&yard, pallet.id, 2, Some(mover)), Some(0));
        assert_eq!(lowest_free_position(&yard, pallet.id, 2, None), None);
    }

    #[test]
    fn test_allocate_full_pallet() {
        let (yard, pallet) = yard_with(1, &[(0, HiveStatus::Regular)]);
        let err = allocate(&yard, pallet.id).unwrap_err();
        assert!(matches!(err, HivekeepError::CapacityExceeded { capacity: 1, .. }));
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_allocate_unknown_pallet() {
        let (yard, _) = yard_with(1, &[]);
        let err = allocate(&yard, PalletId::new()).unwrap_err();
        assert!(matches!(err, HivekeepError::NotFound { kind: EntityType::Pallet, .. }));
    }
}
