//! Collaborators consumed by the placement scheduler.
//!
//! The scheduling framework only ever talks to three services:
//!
//! - **Cluster state** ([`SchedulerCluster`]): store/region metadata, per-store
//!   leader-transfer pause flags and the cluster-wide schedule limits.
//! - **Operator controller** ([`OperatorController`]): tracks in-flight
//!   operators and counts admissions rejected by the schedule limit.
//! - **Config storage** ([`ConfigStorage`]): durable scheduler configs keyed by
//!   scheduler name.
//!
//! Each contract ships with an in-memory implementation used by the dev binary
//! and by tests. [`FileStorage`] persists configs to a directory.

mod cluster;
mod config;
mod controller;
mod error;
mod operator;
mod region;
mod storage;
mod store;

pub use cluster::{BasicCluster, ClusterSnapshot, SchedulerCluster, RAND_REGION_LIMIT};
pub use config::{ScheduleConfig, DEFAULT_LEADER_SCHEDULE_LIMIT, DEFAULT_REGION_SCHEDULE_LIMIT};
pub use controller::{MemoryOperatorController, OperatorController};
pub use error::{ClusterError, OperatorError, StorageError};
pub use operator::{create_transfer_leader_operator, OpKind, OpStep, Operator, PriorityLevel};
pub use region::{Peer, RegionEpoch, RegionInfo};
pub use storage::{ConfigStorage, FileStorage, MemoryStorage};
pub use store::{Direction, StoreInfo, StoreState};
