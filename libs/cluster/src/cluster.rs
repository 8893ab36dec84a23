//! Cluster state as seen by schedulers.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::RwLock;
use placement_keyspace::{KeyRange, RegionId, StoreId};
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::ScheduleConfig;
use crate::error::ClusterError;
use crate::region::RegionInfo;
use crate::store::{Direction, StoreInfo};

/// Max regions returned by one [`SchedulerCluster::rand_leader_regions`] call.
pub const RAND_REGION_LIMIT: usize = 10;

/// Read access to cluster metadata plus the per-store pause flags that
/// schedulers use to coordinate with each other.
///
/// All lookups are local and non-blocking.
pub trait SchedulerCluster: Send + Sync {
    /// Current cluster-wide schedule limits.
    fn schedule_config(&self) -> ScheduleConfig;

    fn get_store(&self, store_id: StoreId) -> Option<Arc<StoreInfo>>;

    fn get_region(&self, region_id: RegionId) -> Option<Arc<RegionInfo>>;

    /// Stops other schedulers from moving leadership in `direction` for the
    /// store. Fails if the store is unknown or already paused.
    fn pause_leader_transfer(&self, store_id: StoreId, direction: Direction)
        -> Result<(), ClusterError>;

    /// Lifts a pause. Unknown stores and unpaused stores are ignored.
    fn resume_leader_transfer(&self, store_id: StoreId, direction: Direction);

    /// Up to [`RAND_REGION_LIMIT`] regions led by `store_id` that lie inside
    /// one of `ranges`, in no particular order.
    fn rand_leader_regions(&self, store_id: StoreId, ranges: &[KeyRange]) -> Vec<Arc<RegionInfo>>;

    /// Stores holding a voting, non-leader replica of `region`.
    fn follower_stores(&self, region: &RegionInfo) -> Vec<Arc<StoreInfo>>;
}

/// Serializable cluster topology used to seed a [`BasicCluster`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClusterSnapshot {
    #[serde(default)]
    pub schedule: ScheduleConfig,
    #[serde(default)]
    pub stores: Vec<StoreInfo>,
    #[serde(default)]
    pub regions: Vec<RegionInfo>,
}

#[derive(Default)]
struct Topology {
    stores: BTreeMap<StoreId, Arc<StoreInfo>>,
    regions: BTreeMap<RegionId, Arc<RegionInfo>>,
}

/// In-memory cluster state.
#[derive(Default)]
pub struct BasicCluster {
    topology: RwLock<Topology>,
    schedule: RwLock<ScheduleConfig>,
}

impl BasicCluster {
    pub fn new(schedule: ScheduleConfig) -> Self {
        Self {
            topology: RwLock::new(Topology::default()),
            schedule: RwLock::new(schedule),
        }
    }

    pub fn from_snapshot(snapshot: ClusterSnapshot) -> Self {
        let cluster = Self::new(snapshot.schedule);
        for store in snapshot.stores {
            cluster.put_store(store);
        }
        for region in snapshot.regions {
            cluster.put_region(region);
        }
        cluster
    }

    pub fn snapshot(&self) -> ClusterSnapshot {
        let topology = self.topology.read();
        ClusterSnapshot {
            schedule: self.schedule.read().clone(),
            stores: topology.stores.values().map(|s| s.as_ref().clone()).collect(),
            regions: topology.regions.values().map(|r| r.as_ref().clone()).collect(),
        }
    }

    pub fn set_schedule_config(&self, schedule: ScheduleConfig) {
        *self.schedule.write() = schedule;
    }

    pub fn put_store(&self, store: StoreInfo) {
        self.topology.write().stores.insert(store.id, Arc::new(store));
    }

    pub fn put_region(&self, region: RegionInfo) {
        self.topology.write().regions.insert(region.id, Arc::new(region));
    }

    pub fn remove_region(&self, region_id: RegionId) -> Option<Arc<RegionInfo>> {
        self.topology.write().regions.remove(&region_id)
    }

    pub fn store_count(&self) -> usize {
        self.topology.read().stores.len()
    }

    pub fn region_count(&self) -> usize {
        self.topology.read().regions.len()
    }

    /// Returns true if leader transfer in `direction` is paused for the store.
    pub fn is_leader_transfer_paused(&self, store_id: StoreId, direction: Direction) -> bool {
        self.get_store(store_id)
            .is_some_and(|s| !s.allows_leader_transfer(direction))
    }
}

impl SchedulerCluster for BasicCluster {
    fn schedule_config(&self) -> ScheduleConfig {
        self.schedule.read().clone()
    }

    fn get_store(&self, store_id: StoreId) -> Option<Arc<StoreInfo>> {
        self.topology.read().stores.get(&store_id).cloned()
    }

    fn get_region(&self, region_id: RegionId) -> Option<Arc<RegionInfo>> {
        self.topology.read().regions.get(&region_id).cloned()
    }

    fn pause_leader_transfer(
        &self,
        store_id: StoreId,
        direction: Direction,
    ) -> Result<(), ClusterError> {
        let mut topology = self.topology.write();
        let store = topology
            .stores
            .get_mut(&store_id)
            .ok_or(ClusterError::StoreNotFound(store_id))?;
        if !store.allows_leader_transfer(direction) {
            return Err(ClusterError::LeaderTransferPaused {
                store_id,
                direction,
            });
        }
        Arc::make_mut(store).set_leader_transfer_paused(direction, true);
        debug!(store_id = %store_id, direction = %direction, "Paused leader transfer");
        Ok(())
    }

    fn resume_leader_transfer(&self, store_id: StoreId, direction: Direction) {
        let mut topology = self.topology.write();
        if let Some(store) = topology.stores.get_mut(&store_id) {
            if !store.allows_leader_transfer(direction) {
                Arc::make_mut(store).set_leader_transfer_paused(direction, false);
                debug!(store_id = %store_id, direction = %direction, "Resumed leader transfer");
            }
        }
    }

    fn rand_leader_regions(&self, store_id: StoreId, ranges: &[KeyRange]) -> Vec<Arc<RegionInfo>> {
        let mut regions: Vec<_> = self
            .topology
            .read()
            .regions
            .values()
            .filter(|r| r.leader_store_id() == Some(store_id))
            .filter(|r| ranges.iter().any(|kr| kr.involves(r.start_key(), r.end_key())))
            .cloned()
            .collect();
        regions.shuffle(&mut rand::rng());
        regions.truncate(RAND_REGION_LIMIT);
        regions
    }

    fn follower_stores(&self, region: &RegionInfo) -> Vec<Arc<StoreInfo>> {
        let topology = self.topology.read();
        region
            .followers()
            .filter_map(|p| topology.stores.get(&p.store_id).cloned())
            .collect()
    }
}
