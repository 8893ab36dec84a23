//! Running-scheduler bookkeeping.
//!
//! The coordinator owns every live scheduler: it runs the lifecycle hooks,
//! keeps the durable record of which schedulers exist, and starts and stops
//! their tick loops.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::Router;
use parking_lot::RwLock;
use serde::Serialize;
use tokio::{sync::watch, task::JoinHandle};
use tracing::{info, warn};

use super::framework::Scheduler;
use super::registry::{ConfigSource, SchedulerDeps, SchedulerRegistry};
use super::worker::{ScheduleWorker, WorkerConfig};
use crate::error::SchedulerError;

/// Summary of a running scheduler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[cfg_attr(test, derive(serde::Deserialize))]
pub struct SchedulerSummary {
    pub name: String,
    #[serde(rename = "type")]
    pub scheduler_type: String,
}

struct RunningScheduler {
    scheduler: Arc<dyn Scheduler>,
    stop: watch::Sender<bool>,
    task: JoinHandle<()>,
}

pub struct SchedulerCoordinator {
    registry: Arc<SchedulerRegistry>,
    deps: SchedulerDeps,
    worker_config: WorkerConfig,
    running: RwLock<BTreeMap<String, RunningScheduler>>,
}

impl SchedulerCoordinator {
    pub fn new(
        registry: Arc<SchedulerRegistry>,
        deps: SchedulerDeps,
        worker_config: WorkerConfig,
    ) -> Self {
        Self {
            registry,
            deps,
            worker_config,
            running: RwLock::new(BTreeMap::new()),
        }
    }

    pub fn registry(&self) -> &SchedulerRegistry {
        &self.registry
    }

    /// Creates a scheduler from CLI-style arguments, persists its config and
    /// starts ticking it. Returns the scheduler's name.
    ///
    /// The name stays reserved from the existence check until the scheduler
    /// is running, so a losing concurrent add never touches durable state.
    /// Must be called from within a tokio runtime.
    pub fn add(&self, scheduler_type: &str, args: Vec<String>) -> Result<String, SchedulerError> {
        let registration = self
            .registry
            .get(scheduler_type)
            .ok_or_else(|| SchedulerError::UnknownSchedulerType(scheduler_type.to_string()))?;

        let mut running = self.running.write();
        if running.contains_key(registration.name()) {
            return Err(SchedulerError::AlreadyExists(registration.name().to_string()));
        }

        let scheduler = registration.construct(&self.deps, ConfigSource::Args(args))?;
        let data = scheduler.encode_config()?;
        self.deps
            .storage
            .save_scheduler_config(scheduler.name(), &data)?;

        let name = scheduler.name().to_string();
        self.start(&mut running, scheduler)?;
        Ok(name)
    }

    /// Deletes a scheduler's persisted config, stops its tick loop and
    /// reverts its cluster side effects.
    ///
    /// The scheduler keeps running when the durable delete fails. Cleanup
    /// waits for an in-flight tick to finish.
    pub async fn remove(&self, name: &str) -> Result<(), SchedulerError> {
        let removed = {
            let mut running = self.running.write();
            let Some(entry) = running.remove(name) else {
                return Err(SchedulerError::NotFound(format!("scheduler {name:?} not found")));
            };
            if let Err(e) = self.deps.storage.remove_scheduler_config(name) {
                running.insert(name.to_string(), entry);
                return Err(e.into());
            }
            entry
        };

        let _ = removed.stop.send(true);
        if let Err(e) = removed.task.await {
            warn!(scheduler = %name, error = %e, "Schedule worker panicked");
        }
        removed.scheduler.clean_config(self.deps.cluster.as_ref());

        info!(scheduler = %name, "Scheduler removed");
        Ok(())
    }

    /// Restarts every scheduler found in durable storage. Entries that no
    /// registered type claims, or that fail to decode, are skipped.
    pub fn load_persisted(&self) -> Result<usize, SchedulerError> {
        let mut loaded = 0;
        for (name, data) in self.deps.storage.load_all_scheduler_configs()? {
            let Some(registration) = self.registry.by_name(&name) else {
                warn!(scheduler = %name, "No registered scheduler for persisted config, skipping");
                continue;
            };
            let scheduler = match registration.construct(&self.deps, ConfigSource::Persisted(data)) {
                Ok(scheduler) => scheduler,
                Err(e) => {
                    warn!(scheduler = %name, error = %e, "Failed to restore scheduler, skipping");
                    continue;
                }
            };
            match self.start(&mut self.running.write(), scheduler) {
                Ok(()) => loaded += 1,
                Err(SchedulerError::AlreadyExists(_)) => {}
                Err(e) => return Err(e),
            }
        }
        Ok(loaded)
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Scheduler>> {
        self.running.read().get(name).map(|r| r.scheduler.clone())
    }

    /// Control-plane routes of the named scheduler.
    pub fn handler(&self, name: &str) -> Option<Router> {
        self.get(name).and_then(|s| s.http_handler())
    }

    pub fn list(&self) -> Vec<SchedulerSummary> {
        self.running
            .read()
            .values()
            .map(|r| SchedulerSummary {
                name: r.scheduler.name().to_string(),
                scheduler_type: r.scheduler.scheduler_type().to_string(),
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.running.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.running.read().is_empty()
    }

    /// Stops every tick loop and waits for them to exit. Cluster side effects
    /// and persisted configs are left in place for the next start.
    pub async fn shutdown(&self) {
        let running: Vec<RunningScheduler> = std::mem::take(&mut *self.running.write())
            .into_values()
            .collect();
        for r in &running {
            let _ = r.stop.send(true);
        }
        for r in running {
            if let Err(e) = r.task.await {
                warn!(scheduler = %r.scheduler.name(), error = %e, "Schedule worker panicked");
            }
        }
    }

    fn start(
        &self,
        running: &mut BTreeMap<String, RunningScheduler>,
        scheduler: Arc<dyn Scheduler>,
    ) -> Result<(), SchedulerError> {
        let name = scheduler.name().to_string();
        if running.contains_key(&name) {
            return Err(SchedulerError::AlreadyExists(name));
        }

        if let Err(e) = scheduler.prepare_config(self.deps.cluster.as_ref()) {
            warn!(scheduler = %name, error = %e, "Scheduler prepare failed, continuing");
        }

        let (stop, stop_rx) = watch::channel(false);
        let worker = ScheduleWorker::new(
            scheduler.clone(),
            self.deps.cluster.clone(),
            self.deps.op_controller.clone(),
            self.worker_config.clone(),
        );
        let task = tokio::spawn(worker.run(stop_rx));

        info!(scheduler = %name, scheduler_type = scheduler.scheduler_type(), "Scheduler started");
        running.insert(
            name,
            RunningScheduler {
                scheduler,
                stop,
                task,
            },
        );
        Ok(())
    }
}
