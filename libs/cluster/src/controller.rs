//! In-flight operator tracking.

use std::collections::{btree_map::Entry, BTreeMap};

use parking_lot::{Mutex, RwLock};
use placement_keyspace::RegionId;
use tracing::{debug, info};

use crate::operator::{OpKind, Operator};

/// Tracks operators handed over for execution.
pub trait OperatorController: Send + Sync {
    /// Number of in-flight operators of `kind` created by scheduler `desc`.
    fn operator_count(&self, kind: OpKind, desc: &str) -> u64;

    /// Returns true if an operator is in flight for the region.
    fn has_operator(&self, region_id: RegionId) -> bool;

    /// Accepts operators for execution and returns how many were admitted.
    /// A region holds at most one operator at a time.
    fn add_operators(&self, ops: Vec<Operator>) -> usize;

    /// Removes the region's operator once it has finished or been cancelled.
    fn remove_operator(&self, region_id: RegionId) -> Option<Operator>;

    /// Records one admission rejected by the schedule limit.
    fn inc_limit_counter(&self, scheduler_type: &str, kind: OpKind);

    /// Rejections recorded for the scheduler type and kind.
    fn limit_counter(&self, scheduler_type: &str, kind: OpKind) -> u64;

    /// All in-flight operators ordered by region.
    fn operators(&self) -> Vec<Operator>;
}

/// In-memory operator controller.
#[derive(Default)]
pub struct MemoryOperatorController {
    operators: RwLock<BTreeMap<RegionId, Operator>>,
    limit_counters: Mutex<BTreeMap<(String, OpKind), u64>>,
}

impl MemoryOperatorController {
    pub fn new() -> Self {
        Self::default()
    }
}

impl OperatorController for MemoryOperatorController {
    fn operator_count(&self, kind: OpKind, desc: &str) -> u64 {
        self.operators
            .read()
            .values()
            .filter(|op| op.kind() == kind && op.desc() == desc)
            .count() as u64
    }

    fn has_operator(&self, region_id: RegionId) -> bool {
        self.operators.read().contains_key(&region_id)
    }

    fn add_operators(&self, ops: Vec<Operator>) -> usize {
        let mut operators = self.operators.write();
        let mut added = 0;
        for op in ops {
            match operators.entry(op.region_id()) {
                Entry::Occupied(existing) => {
                    debug!(
                        region_id = %op.region_id(),
                        existing = %existing.get(),
                        "Region already has an operator, dropping new one"
                    );
                }
                Entry::Vacant(slot) => {
                    info!(operator = %op, "Operator added");
                    slot.insert(op);
                    added += 1;
                }
            }
        }
        added
    }

    fn remove_operator(&self, region_id: RegionId) -> Option<Operator> {
        self.operators.write().remove(&region_id)
    }

    fn inc_limit_counter(&self, scheduler_type: &str, kind: OpKind) {
        let mut counters = self.limit_counters.lock();
        *counters
            .entry((scheduler_type.to_string(), kind))
            .or_insert(0) += 1;
    }

    fn limit_counter(&self, scheduler_type: &str, kind: OpKind) -> u64 {
        self.limit_counters
            .lock()
            .get(&(scheduler_type.to_string(), kind))
            .copied()
            .unwrap_or(0)
    }

    fn operators(&self) -> Vec<Operator> {
        self.operators.read().values().cloned().collect()
    }
}
