//! Yard - owner of every inventory collection

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::core::types::{ApiaryId, HiveId, NucleusId, PalletId, Position, UserId, WorkLogId};
use crate::entity::{
    Apiary, ApiaryUpdate, Hive, HiveUpdate, Nucleus, NucleusUpdate, Pallet, Stamp, User,
    UserStatus, WorkLog, WorkLogUpdate,
};
use crate::placement::occupancy;
use crate::store::{DataStore, StoreError, StoreOp, StoreResult};

/// All apiaries, pallets, hives, nuclei, work logs and users
///
/// Collections keep insertion order, which is also display order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Yard {
    apiaries: Vec<Apiary>,
    pallets: Vec<Pallet>,
    hives: Vec<Hive>,
    nuclei: Vec<Nucleus>,
    #[serde(default)]
    work_logs: Vec<WorkLog>,
    #[serde(default)]
    users: Vec<User>,
}

impl Yard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_parts(
        apiaries: Vec<Apiary>,
        pallets: Vec<Pallet>,
        hives: Vec<Hive>,
        nuclei: Vec<Nucleus>,
        work_logs: Vec<WorkLog>,
    ) -> Self {
        Self {
            apiaries,
            pallets,
            hives,
            nuclei,
            work_logs,
            users: Vec::new(),
        }
    }

    pub fn with_users(mut self, users: Vec<User>) -> Self {
        self.users = users;
        self
    }

    pub fn apiaries(&self) -> &[Apiary] {
        &self.apiaries
    }

    pub fn pallets(&self) -> &[Pallet] {
        &self.pallets
    }

    pub fn hives(&self) -> &[Hive] {
        &self.hives
    }

    pub fn nuclei(&self) -> &[Nucleus] {
        &self.nuclei
    }

    pub fn work_logs(&self) -> &[WorkLog] {
        &self.work_logs
    }

    pub fn users(&self) -> &[User] {
        &self.users
    }

    pub fn apiary(&self, id: ApiaryId) -> Option<&Apiary> {
        self.apiaries.iter().find(|a| a.id == id)
    }

    pub fn pallet(&self, id: PalletId) -> Option<&Pallet> {
        self.pallets.iter().find(|p| p.id == id)
    }

    pub fn hive(&self, id: HiveId) -> Option<&Hive> {
        self.hives.iter().find(|h| h.id == id)
    }

    pub fn nucleus(&self, id: NucleusId) -> Option<&Nucleus> {
        self.nuclei.iter().find(|n| n.id == id)
    }

    pub fn work_log(&self, id: WorkLogId) -> Option<&WorkLog> {
        self.work_logs.iter().find(|w| w.id == id)
    }

    pub fn user(&self, id: UserId) -> Option<&User> {
        self.users.iter().find(|u| u.id == id)
    }

    /// Usernames match without regard to ASCII case
    pub fn find_user(&self, username: &str) -> Option<&User> {
        self.users
            .iter()
            .find(|u| u.username.eq_ignore_ascii_case(username))
    }

    pub fn pallets_in(&self, apiary_id: ApiaryId) -> impl Iterator<Item = &Pallet> {
        self.pallets.iter().filter(move |p| p.apiary_id == apiary_id)
    }

    pub fn pallet_by_code(&self, apiary_id: ApiaryId, code: &str) -> Option<&Pallet> {
        self.pallets_in(apiary_id)
            .find(|p| p.code.eq_ignore_ascii_case(code))
    }

    /// Every hive on a pallet, dead ones included
    pub fn hives_on(&self, pallet_id: PalletId) -> impl Iterator<Item = &Hive> {
        self.hives.iter().filter(move |h| h.pallet_id == pallet_id)
    }

    pub fn live_hives_on(&self, pallet_id: PalletId) -> impl Iterator<Item = &Hive> {
        self.hives_on(pallet_id).filter(|h| h.is_live())
    }

    /// The live hive sitting at a slot, if any
    pub fn resident(&self, pallet_id: PalletId, position: Position) -> Option<&Hive> {
        self.hives.iter().find(|h| h.occupies(pallet_id, position))
    }

    pub fn nuclei_in(&self, apiary_id: ApiaryId) -> impl Iterator<Item = &Nucleus> {
        self.nuclei.iter().filter(move |n| n.apiary_id == apiary_id)
    }

    pub fn work_logs_in(&self, apiary_id: ApiaryId) -> impl Iterator<Item = &WorkLog> {
        self.work_logs.iter().filter(move |w| w.apiary_id == apiary_id)
    }

    /// Placement invariants that do not hold in the current data
    pub fn check_invariants(&self) -> Vec<Violation> {
        let mut violations = Vec::new();

        for hive in self.hives.iter().filter(|h| h.is_live()) {
            match self.pallet(hive.pallet_id) {
                None => violations.push(Violation::OrphanHive {
                    hive: hive.id,
                    pallet: hive.pallet_id,
                }),
                Some(pallet) if !pallet.has_slot(hive.position) => {
                    violations.push(Violation::OutOfRange {
                        hive: hive.id,
                        code: pallet.code.clone(),
                        position: hive.position,
                        capacity: pallet.capacity,
                    })
                }
                Some(_) => {}
            }
        }

        for pallet in &self.pallets {
            let occupied = occupancy::occupancy(self, pallet.id);
            if occupied > pallet.capacity {
                violations.push(Violation::OverCapacity {
                    code: pallet.code.clone(),
                    occupancy: occupied,
                    capacity: pallet.capacity,
                });
            }

            let mut positions: Vec<Position> =
                self.live_hives_on(pallet.id).map(|h| h.position).collect();
            positions.sort_unstable();
            let mut duplicates: Vec<Position> = positions
                .windows(2)
                .filter(|pair| pair[0] == pair[1])
                .map(|pair| pair[0])
                .collect();
            duplicates.dedup();
            for position in duplicates {
                violations.push(Violation::SharedPosition {
                    code: pallet.code.clone(),
                    position,
                });
            }
        }

        violations
    }

    fn hive_mut(&mut self, id: HiveId) -> StoreResult<&mut Hive> {
        self.hives
            .iter_mut()
            .find(|h| h.id == id)
            .ok_or_else(|| StoreError::not_found(id))
    }

    fn nucleus_mut(&mut self, id: NucleusId) -> StoreResult<&mut Nucleus> {
        self.nuclei
            .iter_mut()
            .find(|n| n.id == id)
            .ok_or_else(|| StoreError::not_found(id))
    }
}

/// A broken placement invariant found in loaded data
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    OrphanHive {
        hive: HiveId,
        pallet: PalletId,
    },
    OutOfRange {
        hive: HiveId,
        code: String,
        position: Position,
        capacity: u32,
    },
    OverCapacity {
        code: String,
        occupancy: u32,
        capacity: u32,
    },
    SharedPosition {
        code: String,
        position: Position,
    },
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::OrphanHive { hive, pallet } => {
                write!(f, "hive {} references missing pallet {}", hive.short(), pallet)
            }
            Violation::OutOfRange {
                hive,
                code,
                position,
                capacity,
            } => write!(
                f,
                "hive {} sits at position {} of {} which has {} slots",
                hive.short(),
                position,
                code,
                capacity
            ),
            Violation::OverCapacity {
                code,
                occupancy,
                capacity,
            } => write!(f, "{} holds {} live hives but has {} slots", code, occupancy, capacity),
            Violation::SharedPosition { code, position } => {
                write!(f, "several live hives share position {} on {}", position, code)
            }
        }
    }
}

impl DataStore for Yard {
    fn list_apiaries(&self) -> StoreResult<Vec<Apiary>> {
        Ok(self.apiaries.clone())
    }

    fn list_pallets(&self) -> StoreResult<Vec<Pallet>> {
        Ok(self.pallets.clone())
    }

    fn list_hives(&self) -> StoreResult<Vec<Hive>> {
        Ok(self.hives.clone())
    }

    fn list_nuclei(&self) -> StoreResult<Vec<Nucleus>> {
        Ok(self.nuclei.clone())
    }

    fn list_work_logs(&self) -> StoreResult<Vec<WorkLog>> {
        Ok(self.work_logs.clone())
    }

    fn list_users(&self) -> StoreResult<Vec<User>> {
        Ok(self.users.clone())
    }

    fn create_apiary(&mut self, apiary: Apiary) -> StoreResult<()> {
        if self.apiary(apiary.id).is_some() {
            return Err(StoreError::already_exists(apiary.id));
        }
        self.apiaries.push(apiary);
        Ok(())
    }

    fn update_apiary(&mut self, id: ApiaryId, update: &ApiaryUpdate) -> StoreResult<()> {
        let apiary = self
            .apiaries
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or_else(|| StoreError::not_found(id))?;
        update.apply_to(apiary);
        Ok(())
    }

    fn create_pallet(&mut self, pallet: Pallet) -> StoreResult<()> {
        if self.pallet(pallet.id).is_some() {
            return Err(StoreError::already_exists(pallet.id));
        }
        self.pallets.push(pallet);
        Ok(())
    }

    fn create_hive(&mut self, hive: Hive) -> StoreResult<()> {
        if self.hive(hive.id).is_some() {
            return Err(StoreError::already_exists(hive.id));
        }
        self.hives.push(hive);
        Ok(())
    }

    fn update_hive(&mut self, id: HiveId, update: &HiveUpdate, stamp: &Stamp) -> StoreResult<()> {
        let hive = self.hive_mut(id)?;
        update.apply_to(hive);
        hive.last_updated = stamp.on;
        hive.updated_by = stamp.by.clone();
        Ok(())
    }

    fn delete_hive(&mut self, id: HiveId) -> StoreResult<()> {
        let before = self.hives.len();
        self.hives.retain(|h| h.id != id);
        if self.hives.len() == before {
            return Err(StoreError::not_found(id));
        }
        Ok(())
    }

    fn move_hive(
        &mut self,
        id: HiveId,
        pallet_id: PalletId,
        position: Position,
        stamp: &Stamp,
    ) -> StoreResult<()> {
        let hive = self.hive_mut(id)?;
        hive.pallet_id = pallet_id;
        hive.position = position;
        hive.last_updated = stamp.on;
        hive.updated_by = stamp.by.clone();
        Ok(())
    }

    fn create_nucleus(&mut self, nucleus: Nucleus) -> StoreResult<()> {
        if self.nucleus(nucleus.id).is_some() {
            return Err(StoreError::already_exists(nucleus.id));
        }
        self.nuclei.push(nucleus);
        Ok(())
    }

    fn update_nucleus(
        &mut self,
        id: NucleusId,
        update: &NucleusUpdate,
        stamp: &Stamp,
    ) -> StoreResult<()> {
        let nucleus = self.nucleus_mut(id)?;
        update.apply_to(nucleus);
        nucleus.last_updated = stamp.on;
        nucleus.updated_by = stamp.by.clone();
        Ok(())
    }

    fn delete_nucleus(&mut self, id: NucleusId) -> StoreResult<()> {
        let before = self.nuclei.len();
        self.nuclei.retain(|n| n.id != id);
        if self.nuclei.len() == before {
            return Err(StoreError::not_found(id));
        }
        Ok(())
    }

    fn create_work_log(&mut self, log: WorkLog) -> StoreResult<()> {
        if self.work_log(log.id).is_some() {
            return Err(StoreError::already_exists(log.id));
        }
        self.work_logs.push(log);
        Ok(())
    }

    fn update_work_log(&mut self, id: WorkLogId, update: &WorkLogUpdate) -> StoreResult<()> {
        let log = self
            .work_logs
            .iter_mut()
            .find(|w| w.id == id)
            .ok_or_else(|| StoreError::not_found(id))?;
        update.apply_to(log);
        Ok(())
    }

    fn create_user(&mut self, user: User) -> StoreResult<()> {
        if self.user(user.id).is_some() {
            return Err(StoreError::already_exists(user.id));
        }
        self.users.push(user);
        Ok(())
    }

    fn set_user_status(&mut self, id: UserId, status: UserStatus) -> StoreResult<()> {
        let user = self
            .users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or_else(|| StoreError::not_found(id))?;
        user.status = status;
        Ok(())
    }

    /// Ops run against a copy that replaces the yard only when all succeed
    fn apply_ops(&mut self, ops: &[StoreOp]) -> StoreResult<()> {
        let mut next = self.clone();
        for op in ops {
            op.apply(&mut next)?;
        }
        *self = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{HiveStatus, LidType, Queen, Role};
    use chrono::NaiveDate;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    fn pallet(apiary_id: ApiaryId, code: &str, capacity: u32) -> Pallet {
        Pallet {
            id: PalletId::new(),
            apiary_id,
            code: code.into(),
            capacity,
        }
    }

    fn hive(pallet_id: PalletId, position: Position, status: HiveStatus) -> Hive {
        Hive {
            id: HiveId::new(),
            pallet_id,
            position,
            chamber_count: 1,
            lid_type: LidType::Standard,
            status,
            queen: Queen::default(),
            last_updated: day(),
            updated_by: "Ana".into(),
        }
    }

    #[test]
    fn test_create_rejects_duplicate_ids() {
        let mut yard = Yard::new();
        let p = pallet(ApiaryId::new(), "P-001", 4);
        yard.create_pallet(p.clone()).unwrap();

        let err = yard.create_pallet(p).unwrap_err();
        assert!(matches!(err, StoreError::AlreadyExists { .. }));
    }

    #[test]
    fn test_move_and_delete_hive() {
        let mut yard = Yard::new();
        let apiary = ApiaryId::new();
        let a = pallet(apiary, "P-001", 4);
        let b = pallet(apiary, "P-002", 4);
        let h = hive(a.id, 0, HiveStatus::Good);
        let hive_id = h.id;
        yard.create_pallet(a.clone()).unwrap();
        yard.create_pallet(b.clone()).unwrap();
        yard.create_hive(h).unwrap();

        yard.move_hive(hive_id, b.id, 2, &Stamp::new(day(), "Luis"))
            .unwrap();
        let moved = yard.hive(hive_id).unwrap();
        assert_eq!((moved.pallet_id, moved.position), (b.id, 2));
        assert_eq!(moved.updated_by, "Luis");
        assert!(yard.resident(b.id, 2).is_some());

        yard.delete_hive(hive_id).unwrap();
        assert!(yard.hive(hive_id).is_none());
        assert!(matches!(
            yard.delete_hive(hive_id),
            Err(StoreError::NotFound { .. })
        ));
    }

    #[test]
    fn test_pallet_by_code_is_scoped_to_apiary() {
        let mut yard = Yard::new();
        let north = ApiaryId::new();
        let south = ApiaryId::new();
        yard.create_pallet(pallet(north, "P-001", 4)).unwrap();
        yard.create_pallet(pallet(south, "P-001", 6)).unwrap();

        assert_eq!(yard.pallet_by_code(south, "p-001").unwrap().capacity, 6);
        assert!(yard.pallet_by_code(north, "P-002").is_none());
    }

    #[test]
    fn test_check_invariants_reports_conflicts() {
        let mut yard = Yard::new();
        let p = pallet(ApiaryId::new(), "P-001", 2);
        yard.create_pallet(p.clone()).unwrap();
        yard.create_hive(hive(p.id, 0, HiveStatus::Good)).unwrap();
        yard.create_hive(hive(p.id, 0, HiveStatus::Bad)).unwrap();
        yard.create_hive(hive(p.id, 5, HiveStatus::Good)).unwrap();
        yard.create_hive(hive(p.id, 1, HiveStatus::Dead)).unwrap();

        let violations = yard.check_invariants();
        assert!(violations
            .iter()
            .any(|v| matches!(v, Violation::SharedPosition { position: 0, .. })));
        assert!(violations
            .iter()
            .any(|v| matches!(v, Violation::OutOfRange { position: 5, .. })));
        assert!(violations
            .iter()
            .any(|v| matches!(v, Violation::OverCapacity { occupancy: 3, .. })));
    }

    #[test]
    fn test_clean_yard_has_no_violations() {
        let mut yard = Yard::new();
        let p = pallet(ApiaryId::new(), "P-001", 4);
        yard.create_pallet(p.clone()).unwrap();
        yard.create_hive(hive(p.id, 0, HiveStatus::Good)).unwrap();
        yard.create_hive(hive(p.id, 0, HiveStatus::Dead)).unwrap();

        assert!(yard.check_invariants().is_empty());
    }

    #[test]
    fn test_apply_ops_is_all_or_nothing() {
        let mut yard = Yard::new();
        let apiary = ApiaryId::new();
        let a = pallet(apiary, "P-001", 1);
        let b = pallet(apiary, "P-002", 1);
        let h = hive(a.id, 0, HiveStatus::Good);
        let hive_id = h.id;
        yard.create_pallet(a.clone()).unwrap();
        yard.create_pallet(b.clone()).unwrap();
        yard.create_hive(h).unwrap();
        let before = yard.clone();

        let stamp = Stamp::new(day(), "Luis");
        let ops = [
            StoreOp::MoveHive {
                id: hive_id,
                pallet_id: b.id,
                position: 0,
                stamp: stamp.clone(),
            },
            StoreOp::MoveHive {
                id: HiveId::new(),
                pallet_id: a.id,
                position: 0,
                stamp,
            },
        ];
        let err = yard.apply_ops(&ops).unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
        assert_eq!(yard, before);

        yard.apply_ops(&ops[..1]).unwrap();
        assert_eq!(yard.hive(hive_id).unwrap().pallet_id, b.id);
    }

    #[test]
    fn test_user_lookup_and_status() {
        let marta = User::new("marta", "Marta", Role::Admin);
        let id = marta.id;
        let mut yard = Yard::new().with_users(vec![marta.clone()]);

        assert_eq!(yard.find_user("MARTA"), Some(&marta));
        assert!(yard.find_user("luis").is_none());
        assert!(matches!(
            yard.create_user(marta),
            Err(StoreError::AlreadyExists { .. })
        ));

        yard.set_user_status(id, UserStatus::Disabled).unwrap();
        assert_eq!(yard.user(id).unwrap().status, UserStatus::Disabled);
        assert!(matches!(
            yard.set_user_status(UserId::new(), UserStatus::Active),
            Err(StoreError::NotFound { .. })
        ));
    }
}
