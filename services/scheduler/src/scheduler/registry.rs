//! Scheduler registration table.
//!
//! Built once at startup and shared immutably afterwards. Each entry binds a
//! scheduler type to a typed argument decoder and a constructor.

use std::collections::BTreeMap;
use std::sync::Arc;

use placement_cluster::{ConfigStorage, OperatorController, SchedulerCluster};
use serde::de::DeserializeOwned;

use super::framework::Scheduler;
use crate::error::SchedulerError;

/// Collaborators handed to scheduler constructors.
#[derive(Clone)]
pub struct SchedulerDeps {
    pub cluster: Arc<dyn SchedulerCluster>,
    pub op_controller: Arc<dyn OperatorController>,
    pub storage: Arc<dyn ConfigStorage>,
}

/// Where a new scheduler's config comes from.
#[derive(Debug, Clone)]
pub enum ConfigSource {
    /// CLI-style arguments.
    Args(Vec<String>),
    /// Bytes previously written by the scheduler itself.
    Persisted(Vec<u8>),
}

type Constructor =
    Box<dyn Fn(&SchedulerDeps, ConfigSource) -> Result<Arc<dyn Scheduler>, SchedulerError> + Send + Sync>;

/// One registered scheduler type.
pub struct SchedulerRegistration {
    scheduler_type: &'static str,
    name: &'static str,
    default_args: Vec<String>,
    construct: Constructor,
}

impl SchedulerRegistration {
    /// Registers a scheduler whose config type is `C`.
    ///
    /// Persisted bytes are decoded straight into `C`; a shape that does not
    /// match is rejected with [`SchedulerError::InvalidArgument`].
    pub fn new<C>(
        scheduler_type: &'static str,
        name: &'static str,
        default_args: &[&str],
        decode_args: fn(&[String]) -> Result<C, SchedulerError>,
        build: fn(&SchedulerDeps, C) -> Result<Arc<dyn Scheduler>, SchedulerError>,
    ) -> Self
    where
        C: DeserializeOwned + 'static,
    {
        let construct = move |deps: &SchedulerDeps,
                              source: ConfigSource|
              -> Result<Arc<dyn Scheduler>, SchedulerError> {
            let config = match source {
                ConfigSource::Args(args) => decode_args(&args)?,
                ConfigSource::Persisted(data) => serde_json::from_slice(&data).map_err(|e| {
                    SchedulerError::InvalidArgument(format!(
                        "malformed {scheduler_type} config: {e}"
                    ))
                })?,
            };
            build(deps, config)
        };

        Self {
            scheduler_type,
            name,
            default_args: default_args.iter().map(|a| a.to_string()).collect(),
            construct: Box::new(construct),
        }
    }

    pub fn scheduler_type(&self) -> &'static str {
        self.scheduler_type
    }

    /// Well-known scheduler name, also the durable storage key.
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn default_args(&self) -> &[String] {
        &self.default_args
    }

    pub fn construct(
        &self,
        deps: &SchedulerDeps,
        source: ConfigSource,
    ) -> Result<Arc<dyn Scheduler>, SchedulerError> {
        (self.construct)(deps, source)
    }
}

/// Immutable lookup table from scheduler type to registration.
pub struct SchedulerRegistry {
    entries: BTreeMap<&'static str, SchedulerRegistration>,
}

impl SchedulerRegistry {
    pub fn builder() -> SchedulerRegistryBuilder {
        SchedulerRegistryBuilder::default()
    }

    pub fn get(&self, scheduler_type: &str) -> Option<&SchedulerRegistration> {
        self.entries.get(scheduler_type)
    }

    pub fn by_name(&self, name: &str) -> Option<&SchedulerRegistration> {
        self.entries.values().find(|r| r.name == name)
    }

    pub fn types(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.keys().copied()
    }

    /// Instantiates a scheduler of the given type.
    pub fn create(
        &self,
        scheduler_type: &str,
        deps: &SchedulerDeps,
        source: ConfigSource,
    ) -> Result<Arc<dyn Scheduler>, SchedulerError> {
        self.get(scheduler_type)
            .ok_or_else(|| SchedulerError::UnknownSchedulerType(scheduler_type.to_string()))?
            .construct(deps, source)
    }
}

#[derive(Default)]
pub struct SchedulerRegistryBuilder {
    entries: BTreeMap<&'static str, SchedulerRegistration>,
}

impl SchedulerRegistryBuilder {
    /// Adds a registration. A later registration of the same type replaces
    /// the earlier one.
    pub fn register(mut self, registration: SchedulerRegistration) -> Self {
        self.entries.insert(registration.scheduler_type, registration);
        self
    }

    pub fn build(self) -> SchedulerRegistry {
        SchedulerRegistry {
            entries: self.entries,
        }
    }
}

/// Registry with every built-in scheduler.
pub fn default_registry() -> SchedulerRegistry {
    SchedulerRegistry::builder()
        .register(super::evict_leader::registration())
        .build()
}

#[cfg(test)]
mod tests {
    use placement_cluster::{BasicCluster, MemoryOperatorController, MemoryStorage};

    use super::*;
    use crate::scheduler::evict_leader::{EVICT_LEADER_NAME, EVICT_LEADER_TYPE};

    fn deps() -> SchedulerDeps {
        SchedulerDeps {
            cluster: Arc::new(BasicCluster::default()),
            op_controller: Arc::new(MemoryOperatorController::new()),
            storage: Arc::new(MemoryStorage::new()),
        }
    }

    #[test]
    fn test_default_registry_lookup() {
        let registry = default_registry();
        let entry = registry.get(EVICT_LEADER_TYPE).unwrap();
        assert_eq!(entry.name(), EVICT_LEADER_NAME);
        assert_eq!(entry.default_args(), ["1".to_string()]);
        assert!(registry.by_name(EVICT_LEADER_NAME).is_some());
        assert_eq!(registry.types().collect::<Vec<_>>(), vec![EVICT_LEADER_TYPE]);
    }

    #[test]
    fn test_create_from_args() {
        let registry = default_registry();
        let scheduler = registry
            .create(EVICT_LEADER_TYPE, &deps(), ConfigSource::Args(vec!["3".into()]))
            .unwrap();
        assert_eq!(scheduler.name(), EVICT_LEADER_NAME);
        assert_eq!(scheduler.scheduler_type(), EVICT_LEADER_TYPE);
    }

    #[test]
    fn test_unknown_type() {
        let err = default_registry()
            .create("balance-everything", &deps(), ConfigSource::Args(Vec::new()))
            .err()
            .unwrap();
        assert!(matches!(err, SchedulerError::UnknownSchedulerType(_)));
    }

    #[test]
    fn test_malformed_persisted_config() {
        let err = default_registry()
            .create(
                EVICT_LEADER_TYPE,
                &deps(),
                ConfigSource::Persisted(br#"{"store-id-ranges": 5}"#.to_vec()),
            )
            .err()
            .unwrap();
        assert!(matches!(err, SchedulerError::InvalidArgument(_)));
    }

    #[test]
    fn test_missing_store_id_argument() {
        let err = default_registry()
            .create(EVICT_LEADER_TYPE, &deps(), ConfigSource::Args(Vec::new()))
            .err()
            .unwrap();
        assert!(err.is_invalid_input());
    }
}
