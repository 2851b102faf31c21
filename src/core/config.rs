//! Engine configuration with documented defaults
//!
//! Every tunable of the placement engine lives here. Values can be loaded
//! from a TOML file; any field left out keeps its default.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::core::error::{HivekeepError, Result};

/// What "removing" a hive does to its record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemovalPolicy {
    /// Drop the hive record entirely
    #[default]
    Delete,
    /// Keep the record with status Dead; the slot is freed either way
    MarkDead,
}

/// Configuration for the placement engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    // === PALLETS ===
    /// Slots on a new pallet when the caller does not give a capacity
    ///
    /// Standard pallets carry four hives.
    pub default_pallet_capacity: u32,

    /// Prefix of generated pallet codes ("P-" gives P-001, P-002, ...)
    pub pallet_code_prefix: String,

    /// Zero-padded width of the pallet counter
    pub pallet_code_width: usize,

    // === HIVES ===
    /// Highest accepted chamber count (the lowest is always 1)
    pub max_chamber_count: u8,

    /// Whether removal deletes the record or marks it Dead
    pub removal_policy: RemovalPolicy,

    // === AUDIT ===
    /// Actor recorded on audit entries when nobody is signed in
    pub system_actor: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_pallet_capacity: 4,
            pallet_code_prefix: "P-".into(),
            pallet_code_width: 3,
            max_chamber_count: 4,
            removal_policy: RemovalPolicy::Delete,
            system_actor: "System".into(),
        }
    }
}

impl EngineConfig {
    /// Validate configuration for internal consistency
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.default_pallet_capacity == 0 {
            return Err("default_pallet_capacity must be at least 1".into());
        }

        if self.max_chamber_count == 0 {
            return Err("max_chamber_count must be at least 1".into());
        }

        if self.pallet_code_prefix.trim().is_empty() {
            return Err("pallet_code_prefix must not be empty".into());
        }

        if self.system_actor.trim().is_empty() {
            return Err("system_actor must not be empty".into());
        }

        Ok(())
    }

    /// Format the code of the `ordinal`-th pallet of an apiary (1-based)
    pub fn pallet_code(&self, ordinal: usize) -> String {
        format!(
            "{}{:0width$}",
            self.pallet_code_prefix,
            ordinal,
            width = self.pallet_code_width
        )
    }

    /// Load a config from a TOML file
    pub fn load_from_toml(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse_toml(&content)
            .map_err(|e| HivekeepError::Config(format!("{}: {}", path.display(), e)))
    }

    /// Parse a config from a TOML string and validate it
    pub fn parse_toml(content: &str) -> Result<Self> {
        let config: EngineConfig =
            toml::from_str(content).map_err(|e| HivekeepError::Config(e.to_string()))?;
        config.validate().map_err(HivekeepError::Config)?;
        Ok(config)
    }
}
