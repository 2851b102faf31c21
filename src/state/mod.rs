pub mod loader;
pub mod yard;

pub use loader::{Loader, Snapshot, SNAPSHOT_VERSION};
pub use yard::{Violation, Yard};
