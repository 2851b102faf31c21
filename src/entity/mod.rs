pub mod apiary;
pub mod hive;
pub mod nucleus;
pub mod pallet;
pub mod user;
pub mod work_log;

pub use apiary::{Apiary, ApiaryStatus, ApiaryUpdate, NewApiary};
pub use hive::{Hive, HiveSpec, HiveStatus, HiveUpdate, LidType, Queen, QueenOrigin, QueenStatus};
pub use nucleus::{Nucleus, NucleusSpec, NucleusStatus, NucleusUpdate, PromotionTarget};
pub use pallet::Pallet;
pub use user::{NewUser, Role, User, UserStatus};
pub use work_log::{NewWorkLog, TaskStatus, TaskType, VarroaRisk, WorkLog, WorkLogUpdate};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Who touched a record and when
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stamp {
    pub on: NaiveDate,
    pub by: String,
}

impl Stamp {
    pub fn new(on: NaiveDate, by: impl Into<String>) -> Self {
        Self { on, by: by.into() }
    }
}
