//! Pallets - fixed-size slot carriers inside an apiary

use serde::{Deserialize, Serialize};
use std::ops::Range;

use crate::core::types::{ApiaryId, PalletId, Position};

/// A pallet with `capacity` slots indexed `0..capacity`
///
/// The apiary and capacity never change after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pallet {
    pub id: PalletId,
    pub apiary_id: ApiaryId,
    pub code: String,
    pub capacity: u32,
}

impl Pallet {
    pub fn slots(&self) -> Range<Position> {
        0..self.capacity
    }

    pub fn has_slot(&self, position: Position) -> bool {
        position < self.capacity
    }
}
