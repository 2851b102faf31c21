pub mod clock;
pub mod config;
pub mod error;
pub mod types;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{EngineConfig, RemovalPolicy};
pub use error::{HivekeepError, Result};
