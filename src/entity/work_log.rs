//! Work logs - field tasks planned or done at an apiary

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::core::types::{ApiaryId, HiveId, PalletId, WorkLogId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskType {
    Feeding,
    Medication,
    #[serde(rename = "Varroa Control")]
    VarroaControl,
    Harvest,
    #[serde(rename = "Harvest Swap")]
    HarvestSwap,
    Inspection,
    General,
}

impl fmt::Display for TaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TaskType::Feeding => "Feeding",
            TaskType::Medication => "Medication",
            TaskType::VarroaControl => "Varroa Control",
            TaskType::Harvest => "Harvest",
            TaskType::HarvestSwap => "Harvest Swap",
            TaskType::Inspection => "Inspection",
            TaskType::General => "General",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TaskStatus {
    #[default]
    Pending,
    Completed,
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskStatus::Pending => f.write_str("Pending"),
            TaskStatus::Completed => f.write_str("Completed"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkLog {
    pub id: WorkLogId,
    pub apiary_id: ApiaryId,
    #[serde(default)]
    pub pallet_id: Option<PalletId>,
    #[serde(default)]
    pub hive_ids: Vec<HiveId>,
    pub date: NaiveDate,
    #[serde(rename = "type")]
    pub task_type: TaskType,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default)]
    pub assigned_to: Option<String>,
    #[serde(default)]
    pub completed_by: Option<String>,
    #[serde(default)]
    pub completed_date: Option<NaiveDate>,
    #[serde(default)]
    pub harvested_chambers: Option<u32>,
    #[serde(default)]
    pub harvested_frames: Option<u32>,
    #[serde(default)]
    pub varroa_percentage: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewWorkLog {
    pub apiary_id: ApiaryId,
    pub pallet_id: Option<PalletId>,
    pub hive_ids: Vec<HiveId>,
    /// Defaults to today
    pub date: Option<NaiveDate>,
    pub task_type: TaskType,
    pub description: String,
    pub assigned_to: Option<String>,
    pub harvested_chambers: Option<u32>,
    pub harvested_frames: Option<u32>,
    pub varroa_percentage: Option<f64>,
}

impl NewWorkLog {
    pub fn new(apiary_id: ApiaryId, task_type: TaskType) -> Self {
        Self {
            apiary_id,
            pallet_id: None,
            hive_ids: Vec::new(),
            date: None,
            task_type,
            description: String::new(),
            assigned_to: None,
            harvested_chambers: None,
            harvested_frames: None,
            varroa_percentage: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkLogUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pallet_id: Option<PalletId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hive_ids: Option<Vec<HiveId>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_type: Option<TaskType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub harvested_chambers: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub harvested_frames: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub varroa_percentage: Option<f64>,
}

impl WorkLogUpdate {
    pub fn apply_to(&self, log: &mut WorkLog) {
        if let Some(pallet) = self.pallet_id {
            log.pallet_id = Some(pallet);
        }
        if let Some(hives) = &self.hive_ids {
            log.hive_ids = hives.clone();
        }
        if let Some(date) = self.date {
            log.date = date;
        }
        if let Some(task_type) = self.task_type {
            log.task_type = task_type;
        }
        if let Some(description) = &self.description {
            log.description = description.clone();
        }
        if let Some(status) = self.status {
            log.status = status;
        }
        if let Some(assignee) = &self.assigned_to {
            log.assigned_to = Some(assignee.clone());
        }
        if let Some(by) = &self.completed_by {
            log.completed_by = Some(by.clone());
        }
        if let Some(date) = self.completed_date {
            log.completed_date = Some(date);
        }
        if let Some(chambers) = self.harvested_chambers {
            log.harvested_chambers = Some(chambers);
        }
        if let Some(frames) = self.harvested_frames {
            log.harvested_frames = Some(frames);
        }
        if let Some(varroa) = self.varroa_percentage {
            log.varroa_percentage = Some(varroa);
        }
    }
}

/// Varroa counts are a percentage of sampled bees
pub fn validate_varroa(percentage: Option<f64>) -> Result<(), String> {
    match percentage {
        Some(p) if !(0.0..=100.0).contains(&p) => {
            Err(format!("varroa percentage {} is outside 0-100", p))
        }
        _ => Ok(()),
    }
}

/// Mites per hundred sampled bees; an empty sample reads as zero
pub fn infestation_rate(mites: u32, bees: u32) -> f64 {
    if bees == 0 {
        return 0.0;
    }
    f64::from(mites) / f64::from(bees) * 100.0
}

/// Treatment urgency of a varroa infestation rate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VarroaRisk {
    /// Under 1%
    Low,
    /// 1% up to 3%
    Moderate,
    /// 3% and above: treat now
    High,
}

impl VarroaRisk {
    pub fn from_rate(rate: f64) -> Self {
        if rate < 1.0 {
            VarroaRisk::Low
        } else if rate < 3.0 {
            VarroaRisk::Moderate
        } else {
            VarroaRisk::High
        }
    }
}

impl fmt::Display for VarroaRisk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VarroaRisk::Low => f.write_str("Low"),
            VarroaRisk::Moderate => f.write_str("Moderate"),
            VarroaRisk::High => f.write_str("High"),
        }
    }
}
