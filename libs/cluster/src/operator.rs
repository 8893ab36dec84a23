//! Scheduling operators.
//!
//! An operator is a corrective action proposed by a scheduler and executed
//! asynchronously by the apply pipeline. Schedulers only build and emit them.

use std::fmt;

use chrono::{DateTime, Utc};
use placement_keyspace::{RegionId, StoreId};
use serde::{Deserialize, Serialize};

use crate::cluster::SchedulerCluster;
use crate::error::OperatorError;
use crate::region::{RegionEpoch, RegionInfo};

/// Operator class, used for limit accounting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OpKind {
    /// Moves leadership between existing replicas.
    Leader,
    /// Adds, removes or moves replicas.
    Region,
    /// Issued by an administrator.
    Admin,
}

impl OpKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OpKind::Leader => "leader",
            OpKind::Region => "region",
            OpKind::Admin => "admin",
        }
    }
}

impl fmt::Display for OpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Urgency tag, shared by operator execution and by store filters.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum PriorityLevel {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

/// One step of an operator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OpStep {
    TransferLeader {
        from_store: StoreId,
        to_store: StoreId,
    },
}

impl fmt::Display for OpStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OpStep::TransferLeader {
                from_store,
                to_store,
            } => write!(f, "transfer leader from store {from_store} to store {to_store}"),
        }
    }
}

/// A scheduled corrective action against one region.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operator {
    /// Name of the scheduler that created the operator.
    desc: String,
    brief: String,
    region_id: RegionId,
    region_epoch: RegionEpoch,
    kind: OpKind,
    steps: Vec<OpStep>,
    priority: PriorityLevel,
    created_at: DateTime<Utc>,
}

impl Operator {
    pub fn new(
        desc: impl Into<String>,
        brief: impl Into<String>,
        region: &RegionInfo,
        kind: OpKind,
        steps: Vec<OpStep>,
    ) -> Self {
        Self {
            desc: desc.into(),
            brief: brief.into(),
            region_id: region.id,
            region_epoch: region.epoch,
            kind,
            steps,
            priority: PriorityLevel::default(),
            created_at: Utc::now(),
        }
    }

    pub fn desc(&self) -> &str {
        &self.desc
    }

    pub fn brief(&self) -> &str {
        &self.brief
    }

    pub fn region_id(&self) -> RegionId {
        self.region_id
    }

    pub fn region_epoch(&self) -> RegionEpoch {
        self.region_epoch
    }

    pub fn kind(&self) -> OpKind {
        self.kind
    }

    pub fn steps(&self) -> &[OpStep] {
        &self.steps
    }

    pub fn priority(&self) -> PriorityLevel {
        self.priority
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn set_priority_level(&mut self, priority: PriorityLevel) {
        self.priority = priority;
    }

    /// Target store of the first leader transfer step.
    pub fn transfer_leader_target(&self) -> Option<StoreId> {
        self.steps.iter().find_map(|step| match step {
            OpStep::TransferLeader { to_store, .. } => Some(*to_store),
        })
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "\"{}\" {{region: {}, kind: {}, priority: {:?}, brief: {}}}",
            self.desc, self.region_id, self.kind, self.priority, self.brief
        )
    }
}

/// Builds an operator moving `region`'s leadership to `target_store`.
///
/// Fails when `region` no longer matches the cluster's view (unknown or stale
/// epoch) or when the target cannot take leadership.
pub fn create_transfer_leader_operator(
    desc: &str,
    cluster: &dyn SchedulerCluster,
    region: &RegionInfo,
    target_store: StoreId,
    kind: OpKind,
) -> Result<Operator, OperatorError> {
    let current = cluster
        .get_region(region.id)
        .ok_or(OperatorError::RegionNotFound(region.id))?;
    if current.epoch != region.epoch {
        return Err(OperatorError::StaleEpoch {
            region_id: region.id,
            expected: current.epoch,
            actual: region.epoch,
        });
    }

    let source_store = region
        .leader_store_id()
        .ok_or(OperatorError::NoLeader(region.id))?;
    if source_store == target_store {
        return Err(OperatorError::TargetIsLeader {
            region_id: region.id,
            store_id: target_store,
        });
    }
    match region.store_peer(target_store) {
        Some(peer) if !peer.is_learner => {}
        _ => {
            return Err(OperatorError::TargetNotFollower {
                region_id: region.id,
                store_id: target_store,
            })
        }
    }

    let step = OpStep::TransferLeader {
        from_store: source_store,
        to_store: target_store,
    };
    let brief = format!("transfer leader: store {source_store} to {target_store}");
    Ok(Operator::new(desc, brief, region, kind, vec![step]))
}

#[cfg(test)]
mod tests {
    use placement_keyspace::{KeyRange, PeerId};
    use rstest::rstest;

    use super::*;
    use crate::cluster::BasicCluster;
    use crate::region::Peer;
    use crate::store::StoreInfo;

    fn cluster_with_region() -> (BasicCluster, RegionInfo) {
        let cluster = BasicCluster::default();
        for id in 1..=3 {
            cluster.put_store(StoreInfo::new(StoreId::new(id)));
        }
        let mut learner = Peer::new(PeerId::new(3), StoreId::new(3));
        learner.is_learner = true;
        let region = RegionInfo::new(
            RegionId::new(7),
            KeyRange::whole(),
            vec![
                Peer::new(PeerId::new(1), StoreId::new(1)),
                Peer::new(PeerId::new(2), StoreId::new(2)),
                learner,
            ],
        );
        cluster.put_region(region.clone());
        (cluster, region)
    }

    #[test]
    fn test_transfer_leader_operator() {
        let (cluster, region) = cluster_with_region();
        let op = create_transfer_leader_operator(
            "evict",
            &cluster,
            &region,
            StoreId::new(2),
            OpKind::Leader,
        )
        .unwrap();

        assert_eq!(op.desc(), "evict");
        assert_eq!(op.region_id(), RegionId::new(7));
        assert_eq!(op.kind(), OpKind::Leader);
        assert_eq!(op.priority(), PriorityLevel::Medium);
        assert_eq!(op.transfer_leader_target(), Some(StoreId::new(2)));
        assert_eq!(
            op.steps(),
            &[OpStep::TransferLeader {
                from_store: StoreId::new(1),
                to_store: StoreId::new(2),
            }]
        );
    }

    #[rstest]
    #[case::leader(1)]
    #[case::learner(3)]
    #[case::absent(9)]
    fn test_invalid_target(#[case] target: u64) {
        let (cluster, region) = cluster_with_region();
        let result = create_transfer_leader_operator(
            "evict",
            &cluster,
            &region,
            StoreId::new(target),
            OpKind::Leader,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_stale_epoch() {
        let (cluster, region) = cluster_with_region();
        let mut split = region.clone();
        split.epoch.version += 1;
        cluster.put_region(split);

        let err = create_transfer_leader_operator(
            "evict",
            &cluster,
            &region,
            StoreId::new(2),
            OpKind::Leader,
        )
        .unwrap_err();
        assert!(matches!(err, OperatorError::StaleEpoch { .. }));
    }

    #[test]
    fn test_unknown_region() {
        let (cluster, region) = cluster_with_region();
        cluster.remove_region(region.id);
        let err = create_transfer_leader_operator(
            "evict",
            &cluster,
            &region,
            StoreId::new(2),
            OpKind::Leader,
        )
        .unwrap_err();
        assert_eq!(err, OperatorError::RegionNotFound(region.id));
    }

    #[test]
    fn test_priority_ordering() {
        assert!(PriorityLevel::Urgent > PriorityLevel::High);
        assert!(PriorityLevel::High > PriorityLevel::Medium);
    }
}
