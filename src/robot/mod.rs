// Robot snapshots and the in-memory registry (latest snapshot per robot)

mod registry;
mod snapshot;

pub use registry::RobotRegistry;
pub use snapshot::{Position, RobotSnapshot, RobotStatus, RobotType};
