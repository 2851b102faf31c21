//! Nuclei - starter colonies waiting to become hives

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::core::types::{ApiaryId, NucleusId, PalletId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum NucleusStatus {
    Bad,
    #[default]
    Good,
    /// Strong enough to be promoted
    Ready,
}

impl fmt::Display for NucleusStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NucleusStatus::Bad => "Bad",
            NucleusStatus::Good => "Good",
            NucleusStatus::Ready => "Ready",
        };
        f.write_str(name)
    }
}

/// A nucleus belongs to an apiary but holds no pallet slot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Nucleus {
    pub id: NucleusId,
    pub apiary_id: ApiaryId,
    pub status: NucleusStatus,
    pub install_date: NaiveDate,
    pub last_updated: NaiveDate,
    pub updated_by: String,
}

/// Attributes of a new nucleus; the install date defaults to today
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NucleusSpec {
    pub status: NucleusStatus,
    pub install_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NucleusUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<NucleusStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub install_date: Option<NaiveDate>,
}

impl NucleusUpdate {
    pub fn apply_to(&self, nucleus: &mut Nucleus) {
        if let Some(status) = self.status {
            nucleus.status = status;
        }
        if let Some(date) = self.install_date {
            nucleus.install_date = date;
        }
    }
}

/// Where a promoted nucleus should go
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PromotionTarget {
    pub pallet_id: PalletId,
    pub chamber_count: u8,
}
