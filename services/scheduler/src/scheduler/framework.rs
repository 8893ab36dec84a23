//! The lifecycle contract every scheduler implements.

use std::sync::Arc;

use axum::Router;
use placement_cluster::{Operator, OperatorController, SchedulerCluster};
use serde::Serialize;

use crate::error::SchedulerError;

/// Identity and shared handles held by every scheduler.
#[derive(Clone)]
pub struct SchedulerContext {
    name: String,
    scheduler_type: &'static str,
    op_controller: Arc<dyn OperatorController>,
}

impl SchedulerContext {
    pub fn new(
        name: impl Into<String>,
        scheduler_type: &'static str,
        op_controller: Arc<dyn OperatorController>,
    ) -> Self {
        Self {
            name: name.into(),
            scheduler_type,
            op_controller,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn scheduler_type(&self) -> &'static str {
        self.scheduler_type
    }

    pub fn op_controller(&self) -> &dyn OperatorController {
        self.op_controller.as_ref()
    }
}

/// A pluggable scheduler driven by the coordinator.
///
/// `prepare_config` runs once before the first tick and `clean_config` once
/// after the last. `schedule` is never called concurrently with itself for the
/// same instance, but HTTP handlers may mutate the scheduler's config at any
/// time.
pub trait Scheduler: Send + Sync {
    fn context(&self) -> &SchedulerContext;

    fn name(&self) -> &str {
        self.context().name()
    }

    fn scheduler_type(&self) -> &'static str {
        self.context().scheduler_type()
    }

    /// Serialized config, as written to durable storage.
    fn encode_config(&self) -> Result<Vec<u8>, SchedulerError>;

    /// Applies the config's side effects to the cluster.
    fn prepare_config(&self, cluster: &dyn SchedulerCluster) -> Result<(), SchedulerError>;

    /// Reverts whatever `prepare_config` applied. Best effort.
    fn clean_config(&self, cluster: &dyn SchedulerCluster);

    /// Admission gate checked before every tick.
    fn is_schedule_allowed(&self, cluster: &dyn SchedulerCluster) -> bool;

    /// One scheduling pass. An empty result is a normal outcome.
    fn schedule(&self, cluster: &dyn SchedulerCluster) -> Vec<Operator>;

    /// Control-plane routes served under the scheduler's namespace.
    fn http_handler(&self) -> Option<Router> {
        None
    }
}

/// Encodes a scheduler config the way it is persisted.
pub fn encode_config<T: Serialize>(config: &T) -> Result<Vec<u8>, SchedulerError> {
    Ok(serde_json::to_vec(config)?)
}
