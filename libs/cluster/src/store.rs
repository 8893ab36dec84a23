//! Store metadata.

use std::fmt;

use placement_keyspace::StoreId;
use serde::{Deserialize, Serialize};

/// Store lifecycle state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreState {
    #[default]
    Up,
    /// Being decommissioned.
    Offline,
    /// Removed from the cluster.
    Tombstone,
}

/// Leader-transfer direction relative to a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Leadership moving onto the store.
    In,
    /// Leadership moving off the store.
    Out,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::In => f.write_str("in"),
            Direction::Out => f.write_str("out"),
        }
    }
}

/// A node hosting region replicas.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreInfo {
    pub id: StoreId,

    #[serde(default)]
    pub address: String,

    #[serde(default)]
    pub state: StoreState,

    /// Missed recent heartbeats.
    #[serde(default)]
    pub disconnected: bool,

    /// Missed heartbeats for longer than the down threshold.
    #[serde(default)]
    pub down: bool,

    /// Reported itself as overloaded.
    #[serde(default)]
    pub busy: bool,

    /// Leadership was evicted because the store is slow.
    #[serde(default)]
    pub slow_evicted: bool,

    /// Labelled to never hold leaders.
    #[serde(default)]
    pub reject_leader: bool,

    #[serde(default)]
    pub pause_leader_in: bool,

    #[serde(default)]
    pub pause_leader_out: bool,
}

impl StoreInfo {
    /// A healthy, up store.
    pub fn new(id: StoreId) -> Self {
        Self {
            id,
            address: String::new(),
            state: StoreState::Up,
            disconnected: false,
            down: false,
            busy: false,
            slow_evicted: false,
            reject_leader: false,
            pause_leader_in: false,
            pause_leader_out: false,
        }
    }

    /// Offline or tombstone.
    pub fn is_removed(&self) -> bool {
        !matches!(self.state, StoreState::Up)
    }

    pub fn allows_leader_transfer(&self, direction: Direction) -> bool {
        match direction {
            Direction::In => !self.pause_leader_in,
            Direction::Out => !self.pause_leader_out,
        }
    }

    pub(crate) fn set_leader_transfer_paused(&mut self, direction: Direction, paused: bool) {
        match direction {
            Direction::In => self.pause_leader_in = paused,
            Direction::Out => self.pause_leader_out = paused,
        }
    }
}
