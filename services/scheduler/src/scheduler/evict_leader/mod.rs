//! User evict-leader scheduler.
//!
//! Moves leadership off a configured set of stores, optionally limited to key
//! ranges. While a store is configured its inbound leader transfer stays
//! paused so that other schedulers do not hand leadership back to it.

mod config;
mod handler;

use std::sync::Arc;

use axum::Router;
use placement_cluster::{
    create_transfer_leader_operator, Direction, OpKind, Operator, PriorityLevel, SchedulerCluster,
};
use rand::Rng;
use tracing::{debug, instrument};

pub use config::EvictLeaderConfig;
pub use handler::UpdateConfigRequest;

use self::handler::EvictLeaderHandler;
use super::config_store::ConfigStore;
use super::filter::{
    select_one_region, Candidates, RegionDownFilter, RegionOperatorFilter, RegionPendingFilter,
    StoreStateFilter,
};
use super::framework::{Scheduler, SchedulerContext};
use super::registry::{SchedulerDeps, SchedulerRegistration};
use crate::error::SchedulerError;

pub const EVICT_LEADER_NAME: &str = "user-evict-leader-scheduler";
pub const EVICT_LEADER_TYPE: &str = "user-evict-leader";
pub const NO_STORE_IN_CONFIG: &str = "No store in user-evict-leader-scheduler-config";

const DEFAULT_ARGS: &[&str] = &["1"];

pub fn registration() -> SchedulerRegistration {
    SchedulerRegistration::new(
        EVICT_LEADER_TYPE,
        EVICT_LEADER_NAME,
        DEFAULT_ARGS,
        config::decode_args,
        build,
    )
}

fn build(
    deps: &SchedulerDeps,
    config: EvictLeaderConfig,
) -> Result<Arc<dyn Scheduler>, SchedulerError> {
    Ok(Arc::new(EvictLeaderScheduler::new(deps, config)))
}

pub struct EvictLeaderScheduler {
    ctx: SchedulerContext,
    config: Arc<ConfigStore<EvictLeaderConfig>>,
    handler: Router,
}

impl EvictLeaderScheduler {
    pub fn new(deps: &SchedulerDeps, config: EvictLeaderConfig) -> Self {
        let config = Arc::new(ConfigStore::new(
            EVICT_LEADER_NAME,
            config,
            deps.storage.clone(),
        ));
        let handler = handler::routes(Arc::new(EvictLeaderHandler::new(
            config.clone(),
            deps.cluster.clone(),
        )));
        Self {
            ctx: SchedulerContext::new(
                EVICT_LEADER_NAME,
                EVICT_LEADER_TYPE,
                deps.op_controller.clone(),
            ),
            config,
            handler,
        }
    }

    pub fn config(&self) -> EvictLeaderConfig {
        self.config.snapshot()
    }

    /// One scheduling pass with an explicit source of randomness.
    ///
    /// Emits at most one operator per configured store.
    pub fn schedule_with_rng<R: Rng + ?Sized>(
        &self,
        cluster: &dyn SchedulerCluster,
        rng: &mut R,
    ) -> Vec<Operator> {
        let config = self.config.read();
        let op_filter = RegionOperatorFilter::new(self.ctx.op_controller());
        let store_filter = StoreStateFilter {
            action_scope: self.name().to_string(),
            transfer_leader: true,
            operator_level: PriorityLevel::Urgent,
        };

        let mut ops = Vec::with_capacity(config.store_id_ranges.len());
        for (&store_id, ranges) in &config.store_id_ranges {
            let Some(region) = select_one_region(
                cluster.rand_leader_regions(store_id, ranges),
                &[&op_filter, &RegionPendingFilter, &RegionDownFilter],
            ) else {
                debug!(%store_id, "No evictable leader region");
                continue;
            };

            let candidates =
                Candidates::new(cluster.follower_stores(&region)).filter_target(&[&store_filter]);
            let Some(target) = candidates.random_pick(rng) else {
                debug!(%store_id, region_id = %region.id, "No target store for leader");
                continue;
            };

            match create_transfer_leader_operator(
                self.name(),
                cluster,
                &region,
                target.id,
                OpKind::Leader,
            ) {
                Ok(mut op) => {
                    op.set_priority_level(PriorityLevel::High);
                    ops.push(op);
                }
                Err(e) => {
                    debug!(%store_id, region_id = %region.id, error = %e, "Failed to create evict leader operator");
                }
            }
        }
        ops
    }
}

impl Scheduler for EvictLeaderScheduler {
    fn context(&self) -> &SchedulerContext {
        &self.ctx
    }

    fn encode_config(&self) -> Result<Vec<u8>, SchedulerError> {
        self.config.encode()
    }

    /// Pauses inbound leader transfer for every configured store. Every store
    /// is attempted; the last failure is returned.
    fn prepare_config(&self, cluster: &dyn SchedulerCluster) -> Result<(), SchedulerError> {
        let config = self.config.read();
        let mut result = Ok(());
        for store_id in config.store_ids() {
            if let Err(e) = cluster.pause_leader_transfer(store_id, Direction::In) {
                result = Err(e.into());
            }
        }
        result
    }

    fn clean_config(&self, cluster: &dyn SchedulerCluster) {
        let config = self.config.read();
        for store_id in config.store_ids() {
            cluster.resume_leader_transfer(store_id, Direction::In);
        }
    }

    fn is_schedule_allowed(&self, cluster: &dyn SchedulerCluster) -> bool {
        let in_flight = self
            .ctx
            .op_controller()
            .operator_count(OpKind::Leader, self.name());
        let allowed = in_flight < cluster.schedule_config().leader_schedule_limit;
        if !allowed {
            self.ctx
                .op_controller()
                .inc_limit_counter(self.scheduler_type(), OpKind::Leader);
        }
        allowed
    }

    #[instrument(skip_all, fields(scheduler = EVICT_LEADER_NAME))]
    fn schedule(&self, cluster: &dyn SchedulerCluster) -> Vec<Operator> {
        self.schedule_with_rng(cluster, &mut rand::rng())
    }

    fn http_handler(&self) -> Option<Router> {
        Some(self.handler.clone())
    }
}
