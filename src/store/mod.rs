//! Persistence plumbing
//!
//! Every successful engine operation produces one [`Commit`]: the store
//! mutations it performed plus its audit entry. Commits are handed to a
//! [`CommitSink`] and never awaited; in-memory state stays authoritative.

pub mod json_file;
pub mod writer;

pub use json_file::JsonFileStore;
pub use writer::{StoreWriter, WriterSink};

use thiserror::Error;

use crate::audit::{AuditEntry, AuditRecorder};
use crate::core::types::{ApiaryId, HiveId, NucleusId, PalletId, Position, UserId, WorkLogId};
use crate::entity::{
    Apiary, ApiaryUpdate, Hive, HiveUpdate, Nucleus, NucleusUpdate, Pallet, Stamp, User,
    UserStatus, WorkLog, WorkLogUpdate,
};

/// Errors from data store backends
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("record not found: {id}")]
    NotFound { id: String },

    #[error("record already exists: {id}")]
    AlreadyExists { id: String },

    #[error("unsupported snapshot version {found} (expected {expected})")]
    Version { found: u32, expected: u32 },

    #[error("write failed: {0}")]
    WriteFailed(String),

    #[error("read failed: {0}")]
    ReadFailed(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl StoreError {
    pub fn not_found(id: impl ToString) -> Self {
        Self::NotFound { id: id.to_string() }
    }

    pub fn already_exists(id: impl ToString) -> Self {
        Self::AlreadyExists { id: id.to_string() }
    }
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Key-indexed CRUD backend for the inventory collections
pub trait DataStore {
    fn list_apiaries(&self) -> StoreResult<Vec<Apiary>>;
    fn list_pallets(&self) -> StoreResult<Vec<Pallet>>;
    fn list_hives(&self) -> StoreResult<Vec<Hive>>;
    fn list_nuclei(&self) -> StoreResult<Vec<Nucleus>>;
    fn list_work_logs(&self) -> StoreResult<Vec<WorkLog>>;
    fn list_users(&self) -> StoreResult<Vec<User>>;

    fn create_apiary(&mut self, apiary: Apiary) -> StoreResult<()>;
    fn update_apiary(&mut self, id: ApiaryId, update: &ApiaryUpdate) -> StoreResult<()>;
    fn create_pallet(&mut self, pallet: Pallet) -> StoreResult<()>;

    fn create_hive(&mut self, hive: Hive) -> StoreResult<()>;
    fn update_hive(&mut self, id: HiveId, update: &HiveUpdate, stamp: &Stamp) -> StoreResult<()>;
    fn delete_hive(&mut self, id: HiveId) -> StoreResult<()>;
    /// Place a hive at an already resolved slot
    fn move_hive(
        &mut self,
        id: HiveId,
        pallet_id: PalletId,
        position: Position,
        stamp: &Stamp,
    ) -> StoreResult<()>;

    fn create_nucleus(&mut self, nucleus: Nucleus) -> StoreResult<()>;
    fn update_nucleus(
        &mut self,
        id: NucleusId,
        update: &NucleusUpdate,
        stamp: &Stamp,
    ) -> StoreResult<()>;
    fn delete_nucleus(&mut self, id: NucleusId) -> StoreResult<()>;

    fn create_work_log(&mut self, log: WorkLog) -> StoreResult<()>;
    fn update_work_log(&mut self, id: WorkLogId, update: &WorkLogUpdate) -> StoreResult<()>;

    fn create_user(&mut self, user: User) -> StoreResult<()>;
    fn set_user_status(&mut self, id: UserId, status: UserStatus) -> StoreResult<()>;

    /// Apply ops in order as one unit
    ///
    /// Either every op takes effect or none does.
    fn apply_ops(&mut self, ops: &[StoreOp]) -> StoreResult<()>;
}

/// A single data store mutation
#[derive(Debug, Clone, PartialEq)]
pub enum StoreOp {
    CreateApiary(Apiary),
    UpdateApiary {
        id: ApiaryId,
        update: ApiaryUpdate,
    },
    CreatePallet(Pallet),
    CreateHive(Hive),
    UpdateHive {
        id: HiveId,
        update: HiveUpdate,
        stamp: Stamp,
    },
    DeleteHive(HiveId),
    MoveHive {
        id: HiveId,
        pallet_id: PalletId,
        position: Position,
        stamp: Stamp,
    },
    CreateNucleus(Nucleus),
    UpdateNucleus {
        id: NucleusId,
        update: NucleusUpdate,
        stamp: Stamp,
    },
    DeleteNucleus(NucleusId),
    CreateWorkLog(WorkLog),
    UpdateWorkLog {
        id: WorkLogId,
        update: WorkLogUpdate,
    },
    CreateUser(User),
    SetUserStatus {
        id: UserId,
        status: UserStatus,
    },
}

impl StoreOp {
    pub fn apply(&self, store: &mut dyn DataStore) -> StoreResult<()> {
        match self {
            StoreOp::CreateApiary(apiary) => store.create_apiary(apiary.clone()),
            StoreOp::UpdateApiary { id, update } => store.update_apiary(*id, update),
            StoreOp::CreatePallet(pallet) => store.create_pallet(pallet.clone()),
            StoreOp::CreateHive(hive) => store.create_hive(hive.clone()),
            StoreOp::UpdateHive { id, update, stamp } => store.update_hive(*id, update, stamp),
            StoreOp::DeleteHive(id) => store.delete_hive(*id),
            StoreOp::MoveHive {
                id,
                pallet_id,
                position,
                stamp,
            } => store.move_hive(*id, *pallet_id, *position, stamp),
            StoreOp::CreateNucleus(nucleus) => store.create_nucleus(nucleus.clone()),
            StoreOp::UpdateNucleus { id, update, stamp } => {
                store.update_nucleus(*id, update, stamp)
            }
            StoreOp::DeleteNucleus(id) => store.delete_nucleus(*id),
            StoreOp::CreateWorkLog(log) => store.create_work_log(log.clone()),
            StoreOp::UpdateWorkLog { id, update } => store.update_work_log(*id, update),
            StoreOp::CreateUser(user) => store.create_user(user.clone()),
            StoreOp::SetUserStatus { id, status } => store.set_user_status(*id, *status),
        }
    }

    /// Short label for log lines
    pub fn label(&self) -> &'static str {
        match self {
            StoreOp::CreateApiary(_) => "create_apiary",
            StoreOp::UpdateApiary { .. } => "update_apiary",
            StoreOp::CreatePallet(_) => "create_pallet",
            StoreOp::CreateHive(_) => "create_hive",
            StoreOp::UpdateHive { .. } => "update_hive",
            StoreOp::DeleteHive(_) => "delete_hive",
            StoreOp::MoveHive { .. } => "move_hive",
            StoreOp::CreateNucleus(_) => "create_nucleus",
            StoreOp::UpdateNucleus { .. } => "update_nucleus",
            StoreOp::DeleteNucleus(_) => "delete_nucleus",
            StoreOp::CreateWorkLog(_) => "create_work_log",
            StoreOp::UpdateWorkLog { .. } => "update_work_log",
            StoreOp::CreateUser(_) => "create_user",
            StoreOp::SetUserStatus { .. } => "set_user_status",
        }
    }
}

/// The ops and audit entry of one successful operation
///
/// Updates that only touch untracked fields carry no audit entry.
#[derive(Debug, Clone, PartialEq)]
pub struct Commit {
    pub ops: Vec<StoreOp>,
    pub audit: Option<AuditEntry>,
}

impl Commit {
    pub fn new(ops: Vec<StoreOp>, audit: AuditEntry) -> Self {
        Self {
            ops,
            audit: Some(audit),
        }
    }

    pub fn silent(ops: Vec<StoreOp>) -> Self {
        Self { ops, audit: None }
    }

    /// Apply the ops as one unit, then record the audit entry
    ///
    /// A failing op leaves the store as it was and nothing is recorded.
    pub fn apply_to<S>(&self, store: &mut S) -> StoreResult<()>
    where
        S: DataStore + AuditRecorder,
    {
        store.apply_ops(&self.ops)?;
        match &self.audit {
            Some(entry) => store.record(entry.clone()),
            None => Ok(()),
        }
    }
}

/// Receives commits without blocking the engine
pub trait CommitSink: Send {
    fn submit(&self, commit: &Commit);
}

/// Discards commits
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl CommitSink for NullSink {
    fn submit(&self, _commit: &Commit) {}
}
