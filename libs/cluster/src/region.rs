//! Region metadata.

use std::fmt;

use placement_keyspace::{KeyRange, PeerId, RegionId, StoreId};
use serde::{Deserialize, Serialize};

/// A replica of a region on one store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Peer {
    pub id: PeerId,
    pub store_id: StoreId,
    /// Learners replicate data but never lead.
    #[serde(default)]
    pub is_learner: bool,
}

impl Peer {
    pub fn new(id: PeerId, store_id: StoreId) -> Self {
        Self {
            id,
            store_id,
            is_learner: false,
        }
    }
}

/// Region version counters; bumped on membership change and on split/merge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionEpoch {
    pub conf_ver: u64,
    pub version: u64,
}

impl fmt::Display for RegionEpoch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{conf_ver: {}, version: {}}}", self.conf_ver, self.version)
    }
}

/// A contiguous keyspace shard and its replica set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionInfo {
    pub id: RegionId,

    #[serde(flatten)]
    pub range: KeyRange,

    #[serde(default)]
    pub epoch: RegionEpoch,

    pub peers: Vec<Peer>,

    /// Peer ID of the current leader.
    #[serde(default)]
    pub leader: Option<PeerId>,

    /// Peers still catching up on the raft log.
    #[serde(default)]
    pub pending_peers: Vec<PeerId>,

    /// Peers that stopped reporting.
    #[serde(default)]
    pub down_peers: Vec<PeerId>,
}

impl RegionInfo {
    /// Creates a region whose leader is the first peer.
    pub fn new(id: RegionId, range: KeyRange, peers: Vec<Peer>) -> Self {
        let leader = peers.first().map(|p| p.id);
        Self {
            id,
            range,
            epoch: RegionEpoch::default(),
            peers,
            leader,
            pending_peers: Vec::new(),
            down_peers: Vec::new(),
        }
    }

    pub fn leader_peer(&self) -> Option<&Peer> {
        let leader = self.leader?;
        self.peers.iter().find(|p| p.id == leader)
    }

    pub fn leader_store_id(&self) -> Option<StoreId> {
        self.leader_peer().map(|p| p.store_id)
    }

    /// The peer hosted on `store_id`, if any.
    pub fn store_peer(&self, store_id: StoreId) -> Option<&Peer> {
        self.peers.iter().find(|p| p.store_id == store_id)
    }

    /// Voting peers other than the leader.
    pub fn followers(&self) -> impl Iterator<Item = &Peer> {
        self.peers
            .iter()
            .filter(move |p| Some(p.id) != self.leader && !p.is_learner)
    }

    pub fn has_pending_peers(&self) -> bool {
        !self.pending_peers.is_empty()
    }

    pub fn has_down_peers(&self) -> bool {
        !self.down_peers.is_empty()
    }

    pub fn start_key(&self) -> &[u8] {
        self.range.start_key()
    }

    pub fn end_key(&self) -> &[u8] {
        self.range.end_key()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn peer(id: u64, store: u64) -> Peer {
        Peer::new(PeerId::new(id), StoreId::new(store))
    }

    fn region() -> RegionInfo {
        let mut learner = peer(13, 3);
        learner.is_learner = true;
        RegionInfo::new(
            RegionId::new(1),
            KeyRange::new("a", "m"),
            vec![peer(11, 1), peer(12, 2), learner],
        )
    }

    #[test]
    fn test_first_peer_leads() {
        let region = region();
        assert_eq!(region.leader_store_id(), Some(StoreId::new(1)));
    }

    #[test]
    fn test_followers_exclude_leader_and_learners() {
        let region = region();
        let followers: Vec<_> = region.followers().map(|p| p.store_id.get()).collect();
        assert_eq!(followers, vec![2]);
    }

    #[test]
    fn test_region_json_is_flat() {
        let json = serde_json::to_value(region()).unwrap();
        assert_eq!(json["start_key"], "a");
        assert_eq!(json["end_key"], "m");

        let parsed: RegionInfo = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, region());
    }
}
