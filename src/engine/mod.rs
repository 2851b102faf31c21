//! Placement engine
//!
//! The engine owns the [`Yard`] and is its only writer. Every operation
//! validates against the current state, builds the full list of store ops,
//! applies them to a copy of the yard and swaps the copy in. Only then is the
//! audit entry recorded and the commit handed to the persistence sink. A
//! failed operation leaves every collection untouched.

mod apiaries;
mod hives;
mod nuclei;
mod queries;
mod users;
mod work_logs;

pub use queries::{ApiarySummary, HiveCensus};
pub use work_logs::VarroaReading;

use tracing::{info, warn};

use crate::audit::{ActionType, AuditEntry, AuditLog};
use crate::core::clock::{Clock, SystemClock};
use crate::core::config::EngineConfig;
use crate::core::error::{HivekeepError, Result};
use crate::core::types::EntityType;
use crate::entity::{Stamp, User};
use crate::state::Yard;
use crate::store::{Commit, CommitSink, DataStore, NullSink, StoreOp};

/// Audit header of a commit: which record, what kind of change, and the text
struct AuditNote {
    entity_type: EntityType,
    entity_id: String,
    action: ActionType,
    details: String,
}

impl AuditNote {
    fn new(
        entity_type: EntityType,
        entity_id: impl ToString,
        action: ActionType,
        details: impl Into<String>,
    ) -> Self {
        Self {
            entity_type,
            entity_id: entity_id.to_string(),
            action,
            details: details.into(),
        }
    }
}

pub struct PlacementEngine {
    yard: Yard,
    config: EngineConfig,
    clock: Box<dyn Clock>,
    actor: Option<User>,
    audit: AuditLog,
    sink: Box<dyn CommitSink>,
}

impl PlacementEngine {
    pub fn new(yard: Yard, config: EngineConfig) -> Result<Self> {
        config.validate().map_err(HivekeepError::Config)?;
        Ok(Self {
            yard,
            config,
            clock: Box::new(SystemClock),
            actor: None,
            audit: AuditLog::new(),
            sink: Box::new(NullSink),
        })
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn with_sink(mut self, sink: impl CommitSink + 'static) -> Self {
        self.sink = Box::new(sink);
        self
    }

    /// Start from an existing audit trail (oldest first)
    pub fn with_audit(mut self, audit: AuditLog) -> Self {
        self.audit = audit;
        self
    }

    /// Sign a user in, or clear the actor with `None`
    ///
    /// Only active users may act.
    pub fn set_actor(&mut self, user: Option<User>) -> Result<()> {
        if let Some(user) = &user {
            if !user.is_active() {
                return Err(HivekeepError::PermissionDenied(format!(
                    "user {} is {}",
                    user.username, user.status
                )));
            }
        }
        self.actor = user;
        Ok(())
    }

    pub fn actor(&self) -> Option<&User> {
        self.actor.as_ref()
    }

    /// Name recorded on stamps and audit entries
    pub fn actor_name(&self) -> &str {
        self.actor
            .as_ref()
            .map(|u| u.name.as_str())
            .unwrap_or(self.config.system_actor.as_str())
    }

    pub fn yard(&self) -> &Yard {
        &self.yard
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn audit_log(&self) -> &AuditLog {
        &self.audit
    }

    /// Give up the engine and keep its state
    ///
    /// Drops the sink, which lets a store writer shut down.
    pub fn into_yard(self) -> Yard {
        self.yard
    }

    fn stamp(&self) -> Stamp {
        Stamp::new(self.clock.today(), self.actor_name())
    }

    /// Operations that need the admin role; the system actor always passes
    fn require_admin(&self, what: &str) -> Result<()> {
        match &self.actor {
            Some(user) if !user.is_admin() => Err(HivekeepError::PermissionDenied(format!(
                "only admins can {}",
                what
            ))),
            _ => Ok(()),
        }
    }

    /// Apply ops as one unit, then audit and forward them
    fn commit(&mut self, ops: Vec<StoreOp>, note: Option<AuditNote>) -> Result<()> {
        self.yard.apply_ops(&ops)?;

        let entry = note.map(|note| {
            AuditEntry::new(
                note.entity_type,
                note.entity_id,
                note.action,
                note.details,
                self.actor_name(),
                self.clock.now(),
            )
        });

        let commit = match entry {
            Some(entry) => {
                info!(
                    action = %entry.action,
                    entity = %entry.entity_type,
                    id = %entry.entity_id,
                    by = %entry.performed_by,
                    "{}",
                    entry.details
                );
                self.audit.push(entry.clone());
                Commit::new(ops, entry)
            }
            None => {
                info!(ops = ops.len(), "Committed unaudited update");
                Commit::silent(ops)
            }
        };
        self.sink.submit(&commit);
        Ok(())
    }
}

/// Log a rejected operation on its way out
fn logged<T>(operation: &'static str, result: Result<T>) -> Result<T> {
    if let Err(error) = &result {
        warn!(operation, %error, "Operation rejected");
    }
    result
}
