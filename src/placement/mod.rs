//! Slot allocation and placement planning
//!
//! Planners are pure functions of the current [`Yard`](crate::state::Yard)
//! and a request. They validate and return a plan or an error; the engine
//! applies plans.

pub mod occupancy;
pub mod promotion;
pub mod relocation;
pub mod removal;

pub use occupancy::{
    allocate, free_positions, has_free_slot, lowest_free_position, occupancy, occupancy_excluding,
};
pub use promotion::{plan_promotion, PromotionPlan};
pub use relocation::{plan_move, MoveOutcome, MovePlan, MoveRequest, Placement};
pub use removal::{plan_removal, RemovalPlan};

use crate::core::error::{HivekeepError, Result};

/// Chamber counts run from 1 to the configured maximum
pub fn check_chambers(chamber_count: u8, max: u8) -> Result<()> {
    if chamber_count == 0 || chamber_count > max {
        return Err(HivekeepError::InvalidAttribute(format!(
            "chamber count {} is outside 1-{}",
            chamber_count, max
        )));
    }
    Ok(())
}
