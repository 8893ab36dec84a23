//! Locked, durably persisted scheduler config.
//!
//! Every mutation goes through [`ConfigStore::apply_and_persist`], which holds
//! the write lock across the mutation and the durable write. If either step
//! fails the in-memory value is restored, so readers never observe a config
//! that storage does not hold.

use std::sync::Arc;

use parking_lot::{RwLock, RwLockReadGuard};
use placement_cluster::ConfigStorage;
use serde::Serialize;
use tracing::{debug, warn};

use super::framework::encode_config;
use crate::error::SchedulerError;

pub struct ConfigStore<T> {
    name: String,
    config: RwLock<T>,
    storage: Arc<dyn ConfigStorage>,
}

impl<T> ConfigStore<T>
where
    T: Clone + Serialize,
{
    pub fn new(name: impl Into<String>, config: T, storage: Arc<dyn ConfigStorage>) -> Self {
        Self {
            name: name.into(),
            config: RwLock::new(config),
            storage,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Shared access for the duration of the guard.
    pub fn read(&self) -> RwLockReadGuard<'_, T> {
        self.config.read()
    }

    /// Value copy, safe to use after the lock is released.
    pub fn snapshot(&self) -> T {
        self.config.read().clone()
    }

    pub fn encode(&self) -> Result<Vec<u8>, SchedulerError> {
        encode_config(&*self.config.read())
    }

    /// Writes the current value to durable storage.
    pub fn persist(&self) -> Result<(), SchedulerError> {
        let config = self.config.read();
        self.save(&config)
    }

    /// Runs `mutation` under the write lock and persists the result.
    ///
    /// If the mutation fails, the previous value is restored and its error is
    /// returned. If the write fails, the previous value is restored and
    /// `compensate` receives the mutation's outcome so that side effects the
    /// mutation applied outside the config can be undone.
    pub fn apply_and_persist<R>(
        &self,
        mutation: impl FnOnce(&mut T) -> Result<R, SchedulerError>,
        compensate: impl FnOnce(&R),
    ) -> Result<R, SchedulerError> {
        let mut config = self.config.write();
        let previous = config.clone();

        let outcome = match mutation(&mut config) {
            Ok(outcome) => outcome,
            Err(e) => {
                *config = previous;
                return Err(e);
            }
        };

        if let Err(e) = self.save(&config) {
            warn!(scheduler = %self.name, error = %e, "Failed to persist scheduler config, rolling back");
            *config = previous;
            compensate(&outcome);
            return Err(e);
        }

        Ok(outcome)
    }

    fn save(&self, config: &T) -> Result<(), SchedulerError> {
        let data = encode_config(config)?;
        self.storage.save_scheduler_config(&self.name, &data)?;
        debug!(scheduler = %self.name, bytes = data.len(), "Persisted scheduler config");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::collections::BTreeMap;

    use placement_cluster::MemoryStorage;

    use super::*;

    fn store(storage: &Arc<MemoryStorage>) -> ConfigStore<BTreeMap<String, u32>> {
        ConfigStore::new("counter", BTreeMap::new(), storage.clone())
    }

    #[test]
    fn test_apply_persists() {
        let storage = Arc::new(MemoryStorage::new());
        let config = store(&storage);

        let n = config
            .apply_and_persist(
                |c| {
                    c.insert("a".to_string(), 1);
                    Ok(c.len())
                },
                |_| panic!("no compensation on success"),
            )
            .unwrap();

        assert_eq!(n, 1);
        let saved = storage.load_scheduler_config("counter").unwrap().unwrap();
        assert_eq!(saved, br#"{"a":1}"#.to_vec());
    }

    #[test]
    fn test_mutation_error_restores_value() {
        let storage = Arc::new(MemoryStorage::new());
        let config = store(&storage);

        let err = config
            .apply_and_persist(
                |c| {
                    c.insert("a".to_string(), 1);
                    Err::<(), _>(SchedulerError::InvalidArgument("nope".to_string()))
                },
                |_| panic!("no compensation on mutation error"),
            )
            .unwrap_err();

        assert!(err.is_invalid_input());
        assert!(config.snapshot().is_empty());
        assert_eq!(storage.load_scheduler_config("counter").unwrap(), None);
    }

    #[test]
    fn test_save_error_restores_value_and_compensates() {
        let storage = Arc::new(MemoryStorage::new());
        let config = store(&storage);
        config
            .apply_and_persist(|c| Ok(c.insert("keep".to_string(), 0)), |_| {})
            .unwrap();

        storage.set_fail_writes(true);
        let compensated = Cell::new(None);
        let err = config
            .apply_and_persist(
                |c| {
                    c.insert("b".to_string(), 2);
                    Ok(7)
                },
                |outcome| compensated.set(Some(*outcome)),
            )
            .unwrap_err();

        assert!(matches!(err, SchedulerError::Storage(_)));
        assert_eq!(compensated.get(), Some(7));
        assert_eq!(config.snapshot().keys().collect::<Vec<_>>(), vec!["keep"]);
    }
}
