//! Lenient loading of seed and snapshot files
//!
//! Seed files written by hand may leave fields out. Missing values are filled
//! in before the data reaches the engine:
//! - apiaries without a status are Active
//! - hives without a position take the count of hives listed before them on
//!   the same pallet
//! - queens default to Alive with a Local origin

use ahash::AHashMap;
use chrono::NaiveDate;
use serde::Deserialize;
use std::path::Path;
use tracing::{info, warn};

use crate::audit::AuditEntry;
use crate::core::clock::Clock;
use crate::core::config::EngineConfig;
use crate::core::error::Result;
use crate::core::types::{ApiaryId, HiveId, NucleusId, PalletId, Position};
use crate::entity::{
    Apiary, Hive, HiveStatus, LidType, Nucleus, NucleusStatus, Pallet, Queen, QueenOrigin,
    QueenStatus, User, WorkLog,
};
use crate::state::Yard;
use crate::store::StoreError;

/// Snapshot format written by the file store
pub const SNAPSHOT_VERSION: u32 = 1;

/// Everything read from a snapshot file
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub yard: Yard,
    /// Oldest first
    pub audit: Vec<AuditEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSnapshot {
    #[serde(default)]
    version: Option<u32>,
    #[serde(default)]
    apiaries: Vec<Apiary>,
    #[serde(default)]
    pallets: Vec<RawPallet>,
    #[serde(default)]
    hives: Vec<RawHive>,
    #[serde(default)]
    nuclei: Vec<RawNucleus>,
    #[serde(default)]
    work_logs: Vec<WorkLog>,
    #[serde(default)]
    users: Vec<User>,
    #[serde(default)]
    audit_logs: Vec<AuditEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPallet {
    id: PalletId,
    apiary_id: ApiaryId,
    code: String,
    #[serde(default)]
    capacity: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawHive {
    id: HiveId,
    pallet_id: PalletId,
    #[serde(default)]
    position: Option<Position>,
    #[serde(default)]
    chamber_count: Option<u8>,
    #[serde(default)]
    lid_type: Option<LidType>,
    #[serde(default)]
    status: Option<HiveStatus>,
    #[serde(default)]
    queen_status: Option<QueenStatus>,
    #[serde(default)]
    queen_origin: Option<String>,
    #[serde(default)]
    queen_install_date: Option<NaiveDate>,
    #[serde(default)]
    last_updated: Option<NaiveDate>,
    #[serde(default)]
    updated_by: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawNucleus {
    id: NucleusId,
    apiary_id: ApiaryId,
    #[serde(default)]
    status: Option<NucleusStatus>,
    #[serde(default)]
    install_date: Option<NaiveDate>,
    #[serde(default)]
    last_updated: Option<NaiveDate>,
    #[serde(default)]
    updated_by: Option<String>,
}

/// Fills the gaps of raw records
pub struct Loader {
    today: NaiveDate,
    actor: String,
    default_capacity: u32,
}

impl Loader {
    pub fn new(config: &EngineConfig, clock: &dyn Clock) -> Self {
        Self {
            today: clock.today(),
            actor: config.system_actor.clone(),
            default_capacity: config.default_pallet_capacity,
        }
    }

    pub fn load_file(&self, path: &Path) -> Result<Snapshot> {
        let content = std::fs::read_to_string(path)?;
        let snapshot = self.parse(&content)?;
        info!(
            path = %path.display(),
            apiaries = snapshot.yard.apiaries().len(),
            hives = snapshot.yard.hives().len(),
            "Loaded snapshot"
        );
        Ok(snapshot)
    }

    pub fn parse(&self, content: &str) -> Result<Snapshot> {
        let raw: RawSnapshot = serde_json::from_str(content)?;
        if let Some(found) = raw.version.filter(|v| *v > SNAPSHOT_VERSION) {
            return Err(StoreError::Version {
                found,
                expected: SNAPSHOT_VERSION,
            }
            .into());
        }

        let pallets = raw
            .pallets
            .into_iter()
            .map(|p| Pallet {
                id: p.id,
                apiary_id: p.apiary_id,
                code: p.code,
                capacity: p.capacity.filter(|c| *c > 0).unwrap_or(self.default_capacity),
            })
            .collect();

        let mut listed_per_pallet: AHashMap<PalletId, Position> = AHashMap::new();
        let hives = raw
            .hives
            .into_iter()
            .map(|h| {
                let listed = listed_per_pallet.entry(h.pallet_id).or_insert(0);
                let position = h.position.unwrap_or(*listed);
                *listed += 1;
                self.hive(h, position)
            })
            .collect();

        let nuclei = raw.nuclei.into_iter().map(|n| self.nucleus(n)).collect();

        let yard = Yard::from_parts(raw.apiaries, pallets, hives, nuclei, raw.work_logs)
            .with_users(raw.users);
        for violation in yard.check_invariants() {
            warn!(%violation, "Loaded data breaks a placement invariant");
        }

        let mut audit = raw.audit_logs;
        audit.sort_by_key(|e| e.timestamp);

        Ok(Snapshot { yard, audit })
    }

    fn hive(&self, raw: RawHive, position: Position) -> Hive {
        Hive {
            id: raw.id,
            pallet_id: raw.pallet_id,
            position,
            chamber_count: raw.chamber_count.unwrap_or(1),
            lid_type: raw.lid_type.unwrap_or_default(),
            status: raw.status.unwrap_or(HiveStatus::Good),
            queen: Queen {
                status: raw.queen_status.unwrap_or_default(),
                origin: raw
                    .queen_origin
                    .filter(|o| !o.trim().is_empty())
                    .map(QueenOrigin::from)
                    .unwrap_or_default(),
                install_date: raw.queen_install_date,
            },
            last_updated: raw.last_updated.unwrap_or(self.today),
            updated_by: raw.updated_by.unwrap_or_else(|| self.actor.clone()),
        }
    }

    fn nucleus(&self, raw: RawNucleus) -> Nucleus {
        Nucleus {
            id: raw.id,
            apiary_id: raw.apiary_id,
            status: raw.status.unwrap_or_default(),
            install_date: raw.install_date.unwrap_or(self.today),
            last_updated: raw.last_updated.unwrap_or(self.today),
            updated_by: raw.updated_by.unwrap_or_else(|| self.actor.clone()),
        }
    }
}
