use std::collections::BTreeMap;

use placement_keyspace::{KeyRange, StoreId};
use serde::{Deserialize, Serialize};

use crate::error::SchedulerError;

/// Stores under eviction and the key ranges whose leaders are moved off them.
///
/// A configured store always has at least one range; the whole-keyspace range
/// stands in when none was given.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvictLeaderConfig {
    #[serde(rename = "store-id-ranges")]
    pub store_id_ranges: BTreeMap<StoreId, Vec<KeyRange>>,
}

impl EvictLeaderConfig {
    /// Decodes `<store_id> [start end]...` and replaces that store's ranges.
    ///
    /// Keys are URL-escaped. A trailing unpaired key is ignored.
    pub fn build_with_args<S: AsRef<str>>(&mut self, args: &[S]) -> Result<StoreId, SchedulerError> {
        let Some((id, keys)) = args.split_first() else {
            return Err(SchedulerError::InvalidArgument(
                "should specify the store-id".to_string(),
            ));
        };
        let store_id = StoreId::parse(id.as_ref())?;
        let ranges = KeyRange::from_escaped_pairs(keys)?;
        self.store_id_ranges.insert(store_id, ranges);
        Ok(store_id)
    }

    /// The store's ranges as alternating escaped start/end keys, the same form
    /// [`build_with_args`](Self::build_with_args) accepts.
    pub fn ranges_for(&self, store_id: StoreId) -> Vec<String> {
        self.store_id_ranges
            .get(&store_id)
            .into_iter()
            .flatten()
            .flat_map(KeyRange::to_escaped_pair)
            .collect()
    }

    pub fn contains(&self, store_id: StoreId) -> bool {
        self.store_id_ranges.contains_key(&store_id)
    }

    pub fn store_ids(&self) -> impl Iterator<Item = StoreId> + '_ {
        self.store_id_ranges.keys().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.store_id_ranges.is_empty()
    }
}

/// Argument decoder registered for the scheduler.
pub(super) fn decode_args(args: &[String]) -> Result<EvictLeaderConfig, SchedulerError> {
    let mut config = EvictLeaderConfig::default();
    config.build_with_args(args)?;
    Ok(config)
}
