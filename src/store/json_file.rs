//! JSON snapshot file backend
//!
//! The whole inventory lives in one versioned JSON document. Each write
//! rewrites it through a temporary file and a rename, so a crash leaves
//! either the old or the new snapshot on disk. Mutations run on a copy of
//! the yard that replaces the in-memory one only once it is on disk.

use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::audit::{AuditEntry, AuditRecorder};
use crate::core::error::Result;
use crate::core::types::{ApiaryId, HiveId, NucleusId, PalletId, Position, UserId, WorkLogId};
use crate::entity::{
    Apiary, ApiaryUpdate, Hive, HiveUpdate, Nucleus, NucleusUpdate, Pallet, Stamp, User,
    UserStatus, WorkLog, WorkLogUpdate,
};
use crate::state::{Loader, Snapshot, Yard, SNAPSHOT_VERSION};
use crate::store::{DataStore, StoreError, StoreOp, StoreResult};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SnapshotFile<'a> {
    version: u32,
    apiaries: &'a [Apiary],
    pallets: &'a [Pallet],
    hives: &'a [Hive],
    nuclei: &'a [Nucleus],
    work_logs: &'a [WorkLog],
    users: &'a [User],
    audit_logs: &'a [AuditEntry],
}

#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    yard: Yard,
    audit: Vec<AuditEntry>,
}

impl JsonFileStore {
    /// Open a snapshot file, starting empty when it does not exist yet
    pub fn open(path: impl Into<PathBuf>, loader: &Loader) -> Result<Self> {
        let path = path.into();
        let snapshot = if path.exists() {
            loader.load_file(&path)?
        } else {
            debug!(path = %path.display(), "Snapshot file missing, starting empty");
            Snapshot::default()
        };
        Ok(Self::from_snapshot(path, snapshot))
    }

    pub fn from_snapshot(path: impl Into<PathBuf>, snapshot: Snapshot) -> Self {
        Self {
            path: path.into(),
            yard: snapshot.yard,
            audit: snapshot.audit,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn yard(&self) -> &Yard {
        &self.yard
    }

    pub fn audit(&self) -> &[AuditEntry] {
        &self.audit
    }

    /// Write the current state to disk
    pub fn save(&self) -> StoreResult<()> {
        self.save_yard(&self.yard)
    }

    fn save_yard(&self, yard: &Yard) -> StoreResult<()> {
        let document = SnapshotFile {
            version: SNAPSHOT_VERSION,
            apiaries: yard.apiaries(),
            pallets: yard.pallets(),
            hives: yard.hives(),
            nuclei: yard.nuclei(),
            work_logs: yard.work_logs(),
            users: yard.users(),
            audit_logs: &self.audit,
        };
        let json = serde_json::to_string_pretty(&document)
            .map_err(|e| StoreError::WriteFailed(e.to_string()))?;

        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json).map_err(|e| StoreError::WriteFailed(e.to_string()))?;
        std::fs::rename(&tmp, &self.path).map_err(|e| StoreError::WriteFailed(e.to_string()))?;
        debug!(path = %self.path.display(), "Snapshot written");
        Ok(())
    }

    /// Run a mutation on a copy of the yard and keep it once it is saved
    ///
    /// A failed mutation or a failed save leaves the previous yard in place.
    fn write<F>(&mut self, mutation: F) -> StoreResult<()>
    where
        F: FnOnce(&mut Yard) -> StoreResult<()>,
    {
        let mut next = self.yard.clone();
        mutation(&mut next)?;
        self.save_yard(&next)?;
        self.yard = next;
        Ok(())
    }
}

impl DataStore for JsonFileStore {
    fn list_apiaries(&self) -> StoreResult<Vec<Apiary>> {
        self.yard.list_apiaries()
    }

    fn list_pallets(&self) -> StoreResult<Vec<Pallet>> {
        self.yard.list_pallets()
    }

    fn list_hives(&self) -> StoreResult<Vec<Hive>> {
        self.yard.list_hives()
    }

    fn list_nuclei(&self) -> StoreResult<Vec<Nucleus>> {
        self.yard.list_nuclei()
    }

    fn list_work_logs(&self) -> StoreResult<Vec<WorkLog>> {
        self.yard.list_work_logs()
    }

    fn list_users(&self) -> StoreResult<Vec<User>> {
        self.yard.list_users()
    }

    fn create_apiary(&mut self, apiary: Apiary) -> StoreResult<()> {
        self.write(|yard| yard.create_apiary(apiary))
    }

    fn update_apiary(&mut self, id: ApiaryId, update: &ApiaryUpdate) -> StoreResult<()> {
        self.write(|yard| yard.update_apiary(id, update))
    }

    fn create_pallet(&mut self, pallet: Pallet) -> StoreResult<()> {
        self.write(|yard| yard.create_pallet(pallet))
    }

    fn create_hive(&mut self, hive: Hive) -> StoreResult<()> {
        self.write(|yard| yard.create_hive(hive))
    }

    fn update_hive(&mut self, id: HiveId, update: &HiveUpdate, stamp: &Stamp) -> StoreResult<()> {
        self.write(|yard| yard.update_hive(id, update, stamp))
    }

    fn delete_hive(&mut self, id: HiveId) -> StoreResult<()> {
        self.write(|yard| yard.delete_hive(id))
    }

    fn move_hive(
        &mut self,
        id: HiveId,
        pallet_id: PalletId,
        position: Position,
        stamp: &Stamp,
    ) -> StoreResult<()> {
        self.write(|yard| yard.move_hive(id, pallet_id, position, stamp))
    }

    fn create_nucleus(&mut self, nucleus: Nucleus) -> StoreResult<()> {
        self.write(|yard| yard.create_nucleus(nucleus))
    }

    fn update_nucleus(
        &mut self,
        id: NucleusId,
        update: &NucleusUpdate,
        stamp: &Stamp,
    ) -> StoreResult<()> {
        self.write(|yard| yard.update_nucleus(id, update, stamp))
    }

    fn delete_nucleus(&mut self, id: NucleusId) -> StoreResult<()> {
        self.write(|yard| yard.delete_nucleus(id))
    }

    fn create_work_log(&mut self, log: WorkLog) -> StoreResult<()> {
        self.write(|yard| yard.create_work_log(log))
    }

    fn update_work_log(&mut self, id: WorkLogId, update: &WorkLogUpdate) -> StoreResult<()> {
        self.write(|yard| yard.update_work_log(id, update))
    }

    fn create_user(&mut self, user: User) -> StoreResult<()> {
        self.write(|yard| yard.create_user(user))
    }

    fn set_user_status(&mut self, id: UserId, status: UserStatus) -> StoreResult<()> {
        self.write(|yard| yard.set_user_status(id, status))
    }

    /// One snapshot write for the whole batch
    fn apply_ops(&mut self, ops: &[StoreOp]) -> StoreResult<()> {
        self.write(|yard| {
            for op in ops {
                op.apply(yard)?;
            }
            Ok(())
        })
    }
}

impl AuditRecorder for JsonFileStore {
    fn record(&mut self, entry: AuditEntry) -> StoreResult<()> {
        self.audit.push(entry);
        if let Err(err) = self.save() {
            self.audit.pop();
            return Err(err);
        }
        Ok(())
    }
}
