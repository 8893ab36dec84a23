//! Collaborator error types.

use std::path::PathBuf;

use placement_keyspace::{RegionId, StoreId};
use thiserror::Error;

use crate::region::RegionEpoch;
use crate::store::Direction;

/// Errors returned by cluster-state mutations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ClusterError {
    /// The store is not part of the cluster.
    #[error("store {0} not found")]
    StoreNotFound(StoreId),

    /// Leader transfer in this direction is already paused for the store.
    #[error("leader transfer {direction} is already paused for store {store_id}")]
    LeaderTransferPaused {
        store_id: StoreId,
        direction: Direction,
    },
}

/// Errors returned when building an operator against stale or invalid metadata.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OperatorError {
    #[error("region {0} not found")]
    RegionNotFound(RegionId),

    #[error("region {0} has no leader")]
    NoLeader(RegionId),

    #[error("region {region_id} epoch is stale: have {actual}, cluster has {expected}")]
    StaleEpoch {
        region_id: RegionId,
        expected: RegionEpoch,
        actual: RegionEpoch,
    },

    #[error("store {store_id} does not hold a voter of region {region_id}")]
    TargetNotFollower {
        region_id: RegionId,
        store_id: StoreId,
    },

    #[error("store {store_id} already leads region {region_id}")]
    TargetIsLeader {
        region_id: RegionId,
        store_id: StoreId,
    },
}

/// Durable config storage errors.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Filesystem failure.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The backend refused the write.
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}
