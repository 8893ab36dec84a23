//! Pluggable scheduling framework.
//!
//! - [`framework`]: the [`Scheduler`] lifecycle contract and its
//!   [`SchedulerContext`]
//! - [`registry`]: type name to decoder and constructor
//! - [`config_store`]: locked config with transactional persistence
//! - [`filter`]: region and store eligibility predicates
//! - [`coordinator`] and [`worker`]: running schedulers and their tick loops
//! - [`evict_leader`]: the user evict-leader scheduler

pub mod config_store;
pub mod coordinator;
pub mod evict_leader;
pub mod filter;
pub mod framework;
pub mod registry;
pub mod worker;

pub use coordinator::{SchedulerCoordinator, SchedulerSummary};
pub use framework::{Scheduler, SchedulerContext};
pub use registry::{default_registry, ConfigSource, SchedulerDeps, SchedulerRegistry};
pub use worker::{ScheduleWorker, WorkerConfig};
