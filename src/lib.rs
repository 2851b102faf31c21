//! Hivekeep - Apiary Inventory and Hive Placement Engine

pub mod audit;
pub mod core;
pub mod engine;
pub mod entity;
pub mod placement;
pub mod state;
pub mod store;

pub use crate::core::error::{HivekeepError, Result};
pub use crate::engine::PlacementEngine;
