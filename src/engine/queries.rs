//! Read accessors for the presentation layer

use ahash::AHashMap;

use super::PlacementEngine;
use crate::core::error::{HivekeepError, Result};
use crate::core::types::{ApiaryId, EntityType, PalletId, Position};
use crate::entity::{Hive, HiveStatus, Pallet};
use crate::placement;

/// Counts shown on an apiary card
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ApiarySummary {
    pub pallets: usize,
    pub live_hives: usize,
    pub nuclei: usize,
    pub slots: u32,
    pub free_slots: u32,
}

/// Hive counts per status
#[derive(Debug, Clone, Default)]
pub struct HiveCensus {
    counts: AHashMap<HiveStatus, usize>,
}

impl HiveCensus {
    pub fn count(&self, status: HiveStatus) -> usize {
        self.counts.get(&status).copied().unwrap_or(0)
    }

    pub fn live(&self) -> usize {
        HiveStatus::ALL
            .iter()
            .filter(|s| s.is_live())
            .map(|s| self.count(*s))
            .sum()
    }

    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }
}

impl PlacementEngine {
    fn pallet_or_err(&self, pallet_id: PalletId) -> Result<&Pallet> {
        self.yard
            .pallet(pallet_id)
            .ok_or_else(|| HivekeepError::not_found(EntityType::Pallet, pallet_id))
    }

    pub fn occupancy(&self, pallet_id: PalletId) -> u32 {
        placement::occupancy(&self.yard, pallet_id)
    }

    pub fn has_free_slot(&self, pallet_id: PalletId) -> Result<bool> {
        let pallet = self.pallet_or_err(pallet_id)?;
        Ok(placement::has_free_slot(&self.yard, pallet))
    }

    pub fn free_positions(&self, pallet_id: PalletId) -> Result<Vec<Position>> {
        let pallet = self.pallet_or_err(pallet_id)?;
        Ok(placement::free_positions(&self.yard, pallet.id, pallet.capacity, None))
    }

    pub fn lowest_free_position(&self, pallet_id: PalletId) -> Result<Option<Position>> {
        let pallet = self.pallet_or_err(pallet_id)?;
        Ok(placement::lowest_free_position(&self.yard, pallet.id, pallet.capacity, None))
    }

    /// One entry per slot: the live hive there, if any
    pub fn pallet_slots(&self, pallet_id: PalletId) -> Result<Vec<Option<&Hive>>> {
        let pallet = self.pallet_or_err(pallet_id)?;
        Ok(pallet
            .slots()
            .map(|position| self.yard.resident(pallet.id, position))
            .collect())
    }

    /// Pallets of an apiary that can still take a hive
    pub fn drop_targets(&self, apiary_id: ApiaryId) -> Vec<&Pallet> {
        self.yard
            .pallets_in(apiary_id)
            .filter(|p| placement::has_free_slot(&self.yard, p))
            .collect()
    }

    pub fn apiary_summary(&self, apiary_id: ApiaryId) -> Result<ApiarySummary> {
        if self.yard.apiary(apiary_id).is_none() {
            return Err(HivekeepError::not_found(EntityType::Apiary, apiary_id));
        }

        let mut summary = ApiarySummary {
            nuclei: self.yard.nuclei_in(apiary_id).count(),
            ..ApiarySummary::default()
        };
        for pallet in self.yard.pallets_in(apiary_id) {
            let live = placement::occupancy(&self.yard, pallet.id);
            summary.pallets += 1;
            summary.live_hives += live as usize;
            summary.slots += pallet.capacity;
            summary.free_slots += pallet.capacity.saturating_sub(live);
        }
        Ok(summary)
    }

    pub fn hive_census(&self) -> HiveCensus {
        let mut counts = AHashMap::new();
        for hive in self.yard.hives() {
            *counts.entry(hive.status).or_insert(0) += 1;
        }
        HiveCensus { counts }
    }
}
