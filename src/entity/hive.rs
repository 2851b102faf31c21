//! Hives - colonies occupying a pallet slot

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::core::types::{HiveId, PalletId, Position};

/// Health of a colony
///
/// `Dead` is a soft delete: the record stays but the slot is free.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HiveStatus {
    Good,
    Regular,
    Bad,
    Dead,
}

impl HiveStatus {
    pub const ALL: [HiveStatus; 4] = [
        HiveStatus::Good,
        HiveStatus::Regular,
        HiveStatus::Bad,
        HiveStatus::Dead,
    ];

    /// Live hives count toward pallet occupancy
    pub fn is_live(&self) -> bool {
        !matches!(self, HiveStatus::Dead)
    }
}

impl fmt::Display for HiveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            HiveStatus::Good => "Good",
            HiveStatus::Regular => "Regular",
            HiveStatus::Bad => "Bad",
            HiveStatus::Dead => "Dead",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum LidType {
    #[default]
    Standard,
    Telescoping,
    Migratory,
}

impl fmt::Display for LidType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LidType::Standard => "Standard",
            LidType::Telescoping => "Telescoping",
            LidType::Migratory => "Migratory",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum QueenStatus {
    Virgin,
    #[default]
    Alive,
    Dead,
    Rejected,
    /// Capped queen cell, not yet emerged
    Cell,
}

impl fmt::Display for QueenStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            QueenStatus::Virgin => "Virgin",
            QueenStatus::Alive => "Alive",
            QueenStatus::Dead => "Dead",
            QueenStatus::Rejected => "Rejected",
            QueenStatus::Cell => "Cell",
        };
        f.write_str(name)
    }
}

/// Where a queen came from
///
/// Stored as plain text; "Nucleus" and "Local" map to their own variants and
/// anything else is kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum QueenOrigin {
    /// Raised in a nucleus that was promoted into this hive
    Nucleus,
    #[default]
    Local,
    Named(String),
}

impl From<String> for QueenOrigin {
    fn from(value: String) -> Self {
        match value.as_str() {
            "Nucleus" => QueenOrigin::Nucleus,
            "Local" => QueenOrigin::Local,
            _ => QueenOrigin::Named(value),
        }
    }
}

impl From<&str> for QueenOrigin {
    fn from(value: &str) -> Self {
        QueenOrigin::from(value.to_string())
    }
}

impl From<QueenOrigin> for String {
    fn from(origin: QueenOrigin) -> Self {
        origin.to_string()
    }
}

impl fmt::Display for QueenOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueenOrigin::Nucleus => f.write_str("Nucleus"),
            QueenOrigin::Local => f.write_str("Local"),
            QueenOrigin::Named(name) => f.write_str(name),
        }
    }
}

/// Queen details of a hive
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Queen {
    #[serde(rename = "queenStatus", default)]
    pub status: QueenStatus,
    #[serde(rename = "queenOrigin", default)]
    pub origin: QueenOrigin,
    #[serde(rename = "queenInstallDate", default)]
    pub install_date: Option<NaiveDate>,
}

/// A colony placed on a pallet slot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hive {
    pub id: HiveId,
    pub pallet_id: PalletId,
    pub position: Position,
    pub chamber_count: u8,
    pub lid_type: LidType,
    pub status: HiveStatus,
    #[serde(flatten)]
    pub queen: Queen,
    pub last_updated: NaiveDate,
    pub updated_by: String,
}

impl Hive {
    pub fn is_live(&self) -> bool {
        self.status.is_live()
    }

    /// Whether this hive is a live occupant of the given slot
    pub fn occupies(&self, pallet_id: PalletId, position: Position) -> bool {
        self.is_live() && self.pallet_id == pallet_id && self.position == position
    }
}

/// Attributes supplied when adding a hive; placement is decided by the engine
#[derive(Debug, Clone, PartialEq)]
pub struct HiveSpec {
    pub chamber_count: u8,
    pub lid_type: LidType,
    pub status: HiveStatus,
    pub queen: Queen,
}

impl Default for HiveSpec {
    fn default() -> Self {
        Self {
            chamber_count: 1,
            lid_type: LidType::Standard,
            status: HiveStatus::Good,
            queen: Queen::default(),
        }
    }
}

impl HiveSpec {
    pub fn with_chambers(mut self, chamber_count: u8) -> Self {
        self.chamber_count = chamber_count;
        self
    }

    pub fn with_status(mut self, status: HiveStatus) -> Self {
        self.status = status;
        self
    }
}

/// Partial update of a hive's attributes
///
/// Placement is not part of it; slots change only through moves.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HiveUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chamber_count: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lid_type: Option<LidType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<HiveStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub queen_status: Option<QueenStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub queen_origin: Option<QueenOrigin>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub queen_install_date: Option<NaiveDate>,
}

impl HiveUpdate {
    pub fn status(status: HiveStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub fn apply_to(&self, hive: &mut Hive) {
        if let Some(chambers) = self.chamber_count {
            hive.chamber_count = chambers;
        }
        if let Some(lid) = self.lid_type {
            hive.lid_type = lid;
        }
        if let Some(status) = self.status {
            hive.status = status;
        }
        if let Some(queen_status) = self.queen_status {
            hive.queen.status = queen_status;
        }
        if let Some(origin) = &self.queen_origin {
            hive.queen.origin = origin.clone();
        }
        if let Some(date) = self.queen_install_date {
            hive.queen.install_date = Some(date);
        }
    }

    /// "Field: old -> new" for the tracked fields that actually change
    pub fn change_details(&self, hive: &Hive) -> Vec<String> {
        let mut changes = Vec::new();
        if let Some(status) = self.status.filter(|s| *s != hive.status) {
            changes.push(format!("Status: {} -> {}", hive.status, status));
        }
        if let Some(chambers) = self.chamber_count.filter(|c| *c != hive.chamber_count) {
            changes.push(format!("Chambers: {} -> {}", hive.chamber_count, chambers));
        }
        if let Some(queen) = self.queen_status.filter(|q| *q != hive.queen.status) {
            changes.push(format!("Queen: {} -> {}", hive.queen.status, queen));
        }
        changes
    }
}
