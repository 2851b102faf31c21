//! Core type definitions used throughout the codebase

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// First eight hex digits, enough to tell records apart on screen
            pub fn short(&self) -> String {
                self.0.simple().to_string()[..8].to_string()
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

entity_id!(
    /// Unique identifier for apiaries
    ApiaryId
);
entity_id!(
    /// Unique identifier for pallets
    PalletId
);
entity_id!(
    /// Unique identifier for hives
    HiveId
);
entity_id!(
    /// Unique identifier for nuclei
    NucleusId
);
entity_id!(
    /// Unique identifier for work log records
    WorkLogId
);
entity_id!(
    /// Unique identifier for users
    UserId
);
entity_id!(
    /// Unique identifier for audit entries
    AuditId
);

/// Slot index within a pallet (0-based)
pub type Position = u32;

/// Kind of record, used by audit entries and lookup errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityType {
    Hive,
    Pallet,
    Nucleus,
    User,
    Apiary,
    WorkLog,
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EntityType::Hive => "Hive",
            EntityType::Pallet => "Pallet",
            EntityType::Nucleus => "Nucleus",
            EntityType::User => "User",
            EntityType::Apiary => "Apiary",
            EntityType::WorkLog => "WorkLog",
        };
        f.write_str(name)
    }
}
