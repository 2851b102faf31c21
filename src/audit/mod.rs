//! Audit trail of mutations

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::core::types::{AuditId, EntityType};
use crate::store::StoreResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionType {
    Create,
    Update,
    Delete,
    Promote,
    Move,
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ActionType::Create => "Create",
            ActionType::Update => "Update",
            ActionType::Delete => "Delete",
            ActionType::Promote => "Promote",
            ActionType::Move => "Move",
        };
        f.write_str(name)
    }
}

/// One human-readable line about a mutation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntry {
    pub id: AuditId,
    pub entity_type: EntityType,
    pub entity_id: String,
    pub action: ActionType,
    pub details: String,
    pub performed_by: String,
    pub timestamp: DateTime<Utc>,
}

impl AuditEntry {
    pub fn new(
        entity_type: EntityType,
        entity_id: impl ToString,
        action: ActionType,
        details: impl Into<String>,
        performed_by: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id: AuditId::new(),
            entity_type,
            entity_id: entity_id.to_string(),
            action,
            details: details.into(),
            performed_by: performed_by.into(),
            timestamp,
        }
    }
}

impl fmt::Display for AuditEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {} by {}: {}",
            self.timestamp.format("%Y-%m-%d %H:%M"),
            self.action,
            self.entity_type,
            short(&self.entity_id),
            self.performed_by,
            self.details
        )
    }
}

fn short(id: &str) -> &str {
    id.get(..8).unwrap_or(id)
}

/// Append-only sink for audit entries
pub trait AuditRecorder {
    fn record(&mut self, entry: AuditEntry) -> StoreResult<()>;
}

/// In-memory audit trail, oldest first
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AuditLog {
    entries: Vec<AuditEntry>,
}

impl AuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: AuditEntry) {
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[AuditEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn last(&self) -> Option<&AuditEntry> {
        self.entries.last()
    }

    /// Newest first
    pub fn recent(&self, limit: usize) -> impl Iterator<Item = &AuditEntry> {
        self.entries.iter().rev().take(limit)
    }

    pub fn for_entity(&self, entity_id: impl ToString) -> impl Iterator<Item = &AuditEntry> {
        let entity_id = entity_id.to_string();
        self.entries.iter().filter(move |e| e.entity_id == entity_id)
    }
}

impl AuditRecorder for AuditLog {
    fn record(&mut self, entry: AuditEntry) -> StoreResult<()> {
        self.push(entry);
        Ok(())
    }
}

impl From<Vec<AuditEntry>> for AuditLog {
    fn from(entries: Vec<AuditEntry>) -> Self {
        Self { entries }
    }
}
