use thiserror::Error;

use crate::core::types::{EntityType, PalletId};
use crate::store::StoreError;

#[derive(Error, Debug)]
pub enum HivekeepError {
    #[error("Pallet {code} is full ({capacity} slots)")]
    CapacityExceeded {
        pallet: PalletId,
        code: String,
        capacity: u32,
    },

    #[error("{kind} not found: {id}")]
    NotFound { kind: EntityType, id: String },

    #[error("Invalid target: {0}")]
    InvalidTarget(String),

    #[error("Invalid attribute: {0}")]
    InvalidAttribute(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),
}

impl HivekeepError {
    pub fn not_found(kind: EntityType, id: impl ToString) -> Self {
        HivekeepError::NotFound {
            kind,
            id: id.to_string(),
        }
    }

    /// Whether the caller can retry with a different target
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            HivekeepError::CapacityExceeded { .. } | HivekeepError::InvalidTarget(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, HivekeepError>;
