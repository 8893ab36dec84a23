//! Placement scheduler service.
//!
//! Runs pluggable schedulers against the cluster view, each on its own tick
//! loop, and exposes an HTTP control plane for creating, removing and
//! reconfiguring them at runtime.
//!
//! The binary is `placement-scheduler`; the library surface exists for
//! integration testing and reuse.

pub mod api;
pub mod config;
pub mod error;
pub mod scheduler;
pub mod state;

pub use error::SchedulerError;
