//! Candidate filters.
//!
//! Filters are stateless predicates. Region filters decide whether a region
//! may be a scheduling source; store filters decide whether a store may be a
//! scheduling target.

use std::sync::Arc;

use placement_cluster::{Direction, OperatorController, PriorityLevel, RegionInfo, StoreInfo};
use rand::{seq::IndexedRandom, Rng};
use tracing::trace;

/// Predicate over source regions.
pub trait RegionFilter {
    fn name(&self) -> &'static str;

    /// Returns true if the region may be scheduled.
    fn select(&self, region: &RegionInfo) -> bool;
}

/// Rejects regions with replicas still catching up.
pub struct RegionPendingFilter;

impl RegionFilter for RegionPendingFilter {
    fn name(&self) -> &'static str {
        "pending-filter"
    }

    fn select(&self, region: &RegionInfo) -> bool {
        !region.has_pending_peers()
    }
}

/// Rejects regions with replicas reported down.
pub struct RegionDownFilter;

impl RegionFilter for RegionDownFilter {
    fn name(&self) -> &'static str {
        "down-filter"
    }

    fn select(&self, region: &RegionInfo) -> bool {
        !region.has_down_peers()
    }
}

/// Rejects regions that already have an operator in flight.
pub struct RegionOperatorFilter<'a> {
    op_controller: &'a dyn OperatorController,
}

impl<'a> RegionOperatorFilter<'a> {
    pub fn new(op_controller: &'a dyn OperatorController) -> Self {
        Self { op_controller }
    }
}

impl RegionFilter for RegionOperatorFilter<'_> {
    fn name(&self) -> &'static str {
        "operator-filter"
    }

    fn select(&self, region: &RegionInfo) -> bool {
        !self.op_controller.has_operator(region.id)
    }
}

/// First region accepted by every filter.
pub fn select_one_region(
    regions: Vec<Arc<RegionInfo>>,
    filters: &[&dyn RegionFilter],
) -> Option<Arc<RegionInfo>> {
    regions.into_iter().find(|region| {
        filters.iter().all(|filter| {
            let ok = filter.select(region);
            if !ok {
                trace!(region_id = %region.id, filter = filter.name(), "Region filtered out");
            }
            ok
        })
    })
}

/// Predicate over target stores.
pub trait StoreFilter {
    /// Returns true if the store may receive the scheduled change.
    fn target(&self, store: &StoreInfo) -> bool;
}

/// Rejects stores whose state makes them unfit to take over leadership.
#[derive(Debug, Clone)]
pub struct StoreStateFilter {
    /// Scheduler on whose behalf the filter runs.
    pub action_scope: String,
    pub transfer_leader: bool,
    /// Disconnected stores are tolerated at `Urgent`.
    pub operator_level: PriorityLevel,
}

impl StoreStateFilter {
    /// Why the store is rejected as a target, if it is.
    pub fn reject_reason(&self, store: &StoreInfo) -> Option<&'static str> {
        if store.is_removed() {
            return Some("removed");
        }
        if store.down {
            return Some("down");
        }
        if self.transfer_leader {
            if !store.allows_leader_transfer(Direction::In) {
                return Some("leader-transfer-in-paused");
            }
            if store.slow_evicted {
                return Some("slow-evicted");
            }
            if store.reject_leader {
                return Some("reject-leader");
            }
        }
        if store.busy {
            return Some("busy");
        }
        if store.disconnected && self.operator_level < PriorityLevel::Urgent {
            return Some("disconnected");
        }
        None
    }
}

impl StoreFilter for StoreStateFilter {
    fn target(&self, store: &StoreInfo) -> bool {
        match self.reject_reason(store) {
            Some(reason) => {
                trace!(scope = %self.action_scope, store_id = %store.id, reason, "Target store filtered out");
                false
            }
            None => true,
        }
    }
}

/// Candidate stores for one scheduling decision.
pub struct Candidates {
    stores: Vec<Arc<StoreInfo>>,
}

impl Candidates {
    pub fn new(stores: Vec<Arc<StoreInfo>>) -> Self {
        Self { stores }
    }

    /// Keeps only stores accepted as targets by every filter.
    pub fn filter_target(mut self, filters: &[&dyn StoreFilter]) -> Self {
        self.stores
            .retain(|store| filters.iter().all(|f| f.target(store)));
        self
    }

    pub fn random_pick<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&Arc<StoreInfo>> {
        self.stores.choose(rng)
    }

    pub fn len(&self) -> usize {
        self.stores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stores.is_empty()
    }
}
