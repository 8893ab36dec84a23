//! Application state shared across request handlers.

use std::sync::Arc;

use placement_cluster::{BasicCluster, OperatorController};

use crate::scheduler::SchedulerCoordinator;

/// Shared application state.
///
/// This is passed to all request handlers via Axum's state extractor.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    coordinator: Arc<SchedulerCoordinator>,
    cluster: Arc<BasicCluster>,
    op_controller: Arc<dyn OperatorController>,
}

impl AppState {
    pub fn new(
        coordinator: Arc<SchedulerCoordinator>,
        cluster: Arc<BasicCluster>,
        op_controller: Arc<dyn OperatorController>,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                coordinator,
                cluster,
                op_controller,
            }),
        }
    }

    pub fn coordinator(&self) -> &SchedulerCoordinator {
        &self.inner.coordinator
    }

    pub fn cluster(&self) -> &BasicCluster {
        &self.inner.cluster
    }

    pub fn op_controller(&self) -> &dyn OperatorController {
        self.inner.op_controller.as_ref()
    }
}
