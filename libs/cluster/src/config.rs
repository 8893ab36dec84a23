//! Cluster-wide schedule limits.

use serde::{Deserialize, Serialize};

/// Default number of leader operators allowed in flight at once.
pub const DEFAULT_LEADER_SCHEDULE_LIMIT: u64 = 4;

/// Default number of region operators allowed in flight at once.
pub const DEFAULT_REGION_SCHEDULE_LIMIT: u64 = 2048;

/// Schedule limits shared by every scheduler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleConfig {
    /// Max in-flight leader-transfer operators per scheduler.
    pub leader_schedule_limit: u64,

    /// Max in-flight region operators per scheduler.
    pub region_schedule_limit: u64,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            leader_schedule_limit: DEFAULT_LEADER_SCHEDULE_LIMIT,
            region_schedule_limit: DEFAULT_REGION_SCHEDULE_LIMIT,
        }
    }
}
