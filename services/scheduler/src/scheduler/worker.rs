//! Per-scheduler tick loop.
//!
//! Each running scheduler gets its own task. Ticks never overlap: the next
//! sleep only starts once the previous pass has returned.

use std::sync::Arc;
use std::time::Duration;

use placement_cluster::{OperatorController, SchedulerCluster};
use tokio::sync::watch;
use tracing::{debug, info, instrument};

use super::framework::Scheduler;

/// Default minimum interval between ticks.
pub const DEFAULT_MIN_INTERVAL: Duration = Duration::from_secs(5);

/// Upper bound for the backed-off interval.
pub const MAX_INTERVAL: Duration = Duration::from_secs(60);

/// Growth factor applied after an unproductive tick.
pub const BACKOFF_FACTOR: f64 = 1.3;

/// Interval lower bound accepted from configuration.
pub const MIN_INTERVAL_FLOOR: Duration = Duration::from_millis(10);

#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub min_interval: Duration,
    pub max_interval: Duration,
    pub backoff_factor: f64,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            min_interval: DEFAULT_MIN_INTERVAL,
            max_interval: MAX_INTERVAL,
            backoff_factor: BACKOFF_FACTOR,
        }
    }
}

impl WorkerConfig {
    pub fn with_min_interval(min_interval: Duration) -> Self {
        Self {
            min_interval: min_interval.max(MIN_INTERVAL_FLOOR),
            ..Self::default()
        }
    }

    /// Interval to wait after a tick that did or did not emit operators.
    pub fn next_interval(&self, current: Duration, productive: bool) -> Duration {
        if productive {
            return self.min_interval;
        }
        current
            .mul_f64(self.backoff_factor)
            .clamp(self.min_interval, self.max_interval.max(self.min_interval))
    }
}

/// Drives one scheduler against the cluster.
pub struct ScheduleWorker {
    scheduler: Arc<dyn Scheduler>,
    cluster: Arc<dyn SchedulerCluster>,
    op_controller: Arc<dyn OperatorController>,
    config: WorkerConfig,
}

impl ScheduleWorker {
    pub fn new(
        scheduler: Arc<dyn Scheduler>,
        cluster: Arc<dyn SchedulerCluster>,
        op_controller: Arc<dyn OperatorController>,
        config: WorkerConfig,
    ) -> Self {
        Self {
            scheduler,
            cluster,
            op_controller,
            config,
        }
    }

    /// Runs a single pass and returns the number of operators admitted.
    pub fn tick(&self) -> usize {
        let cluster = self.cluster.as_ref();
        if !self.scheduler.is_schedule_allowed(cluster) {
            debug!(scheduler = %self.scheduler.name(), "Schedule limit reached, skipping tick");
            return 0;
        }

        let ops = self.scheduler.schedule(cluster);
        if ops.is_empty() {
            return 0;
        }

        let emitted = ops.len();
        let added = self.op_controller.add_operators(ops);
        debug!(scheduler = %self.scheduler.name(), emitted, added, "Scheduling pass complete");
        added
    }

    /// Ticks until shutdown is signaled.
    #[instrument(skip(self, shutdown), fields(scheduler = %self.scheduler.name()))]
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        info!(
            min_interval_ms = self.config.min_interval.as_millis() as u64,
            "Starting schedule worker"
        );

        let mut interval = self.config.min_interval;
        loop {
            tokio::select! {
                _ = tokio::time::sleep(interval) => {
                    let added = self.tick();
                    interval = self.config.next_interval(interval, added > 0);
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        info!("Schedule worker shutting down");
                        break;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use placement_cluster::{
        BasicCluster, MemoryOperatorController, MemoryStorage, OpKind, Peer, RegionInfo,
        ScheduleConfig, StoreInfo,
    };
    use placement_keyspace::{KeyRange, PeerId, RegionId, StoreId};
    use rstest::rstest;

    use super::*;
    use crate::scheduler::evict_leader::EVICT_LEADER_TYPE;
    use crate::scheduler::registry::{default_registry, ConfigSource, SchedulerDeps};

    #[rstest]
    #[case::productive_resets(Duration::from_secs(30), true, Duration::from_secs(5))]
    #[case::grows(Duration::from_secs(10), false, Duration::from_secs(13))]
    #[case::capped(Duration::from_secs(50), false, Duration::from_secs(60))]
    #[case::at_least_min(Duration::from_secs(1), false, Duration::from_secs(5))]
    fn test_next_interval(
        #[case] current: Duration,
        #[case] productive: bool,
        #[case] expected: Duration,
    ) {
        let config = WorkerConfig::default();
        assert_eq!(config.next_interval(current, productive), expected);
    }

    #[test]
    fn test_min_interval_floor() {
        let config = WorkerConfig::with_min_interval(Duration::from_millis(1));
        assert_eq!(config.min_interval, MIN_INTERVAL_FLOOR);
    }

    fn worker(limit: u64) -> (ScheduleWorker, Arc<MemoryOperatorController>) {
        let cluster = Arc::new(BasicCluster::new(ScheduleConfig {
            leader_schedule_limit: limit,
            ..ScheduleConfig::default()
        }));
        for id in [1, 2] {
            cluster.put_store(StoreInfo::new(StoreId::new(id)));
        }
        cluster.put_region(RegionInfo::new(
            RegionId::new(10),
            KeyRange::whole(),
            vec![
                Peer::new(PeerId::new(101), StoreId::new(1)),
                Peer::new(PeerId::new(102), StoreId::new(2)),
            ],
        ));
        let op_controller = Arc::new(MemoryOperatorController::new());
        let deps = SchedulerDeps {
            cluster: cluster.clone(),
            op_controller: op_controller.clone(),
            storage: Arc::new(MemoryStorage::new()),
        };
        let scheduler = default_registry()
            .create(EVICT_LEADER_TYPE, &deps, ConfigSource::Args(vec!["1".into()]))
            .unwrap();
        let worker = ScheduleWorker::new(
            scheduler,
            cluster,
            op_controller.clone(),
            WorkerConfig::with_min_interval(Duration::from_millis(10)),
        );
        (worker, op_controller)
    }

    #[test]
    fn test_tick_submits_operators() {
        let (worker, op_controller) = worker(4);
        assert_eq!(worker.tick(), 1);
        assert!(op_controller.has_operator(RegionId::new(10)));
        // The region is busy now.
        assert_eq!(worker.tick(), 0);
    }

    #[test]
    fn test_tick_respects_limit() {
        let (worker, op_controller) = worker(0);
        assert_eq!(worker.tick(), 0);
        assert!(op_controller.operators().is_empty());
        assert_eq!(op_controller.limit_counter(EVICT_LEADER_TYPE, OpKind::Leader), 1);
    }

    #[tokio::test]
    async fn test_run_stops_on_shutdown() {
        let (worker, op_controller) = worker(4);
        let (tx, rx) = watch::channel(false);
        let handle = tokio::spawn(worker.run(rx));

        for _ in 0..100 {
            if op_controller.has_operator(RegionId::new(10)) {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(op_controller.has_operator(RegionId::new(10)));

        tx.send(true).unwrap();
        handle.await.unwrap();
    }
}
