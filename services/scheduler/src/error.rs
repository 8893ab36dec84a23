//! Scheduler error taxonomy.

use placement_cluster::{ClusterError, StorageError};
use placement_keyspace::{IdError, KeyError};
use thiserror::Error;

/// Errors surfaced by scheduler construction, config mutation and the
/// coordinator.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// Malformed CLI or HTTP input.
    #[error("{0}")]
    InvalidArgument(String),

    /// A URL-escaped key could not be decoded.
    #[error(transparent)]
    Decode(#[from] KeyError),

    /// Durable persistence failed.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// The cluster refused a pause request.
    #[error(transparent)]
    Cluster(#[from] ClusterError),

    #[error("{0}")]
    NotFound(String),

    #[error("unknown scheduler type {0:?}")]
    UnknownSchedulerType(String),

    #[error("scheduler {0:?} already exists")]
    AlreadyExists(String),

    #[error("failed to encode scheduler config: {0}")]
    Encode(#[from] serde_json::Error),
}

impl From<IdError> for SchedulerError {
    fn from(err: IdError) -> Self {
        SchedulerError::InvalidArgument(err.to_string())
    }
}

impl SchedulerError {
    /// Returns true if the caller supplied bad input.
    pub fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            SchedulerError::InvalidArgument(_)
                | SchedulerError::Decode(_)
                | SchedulerError::UnknownSchedulerType(_)
        )
    }
}
