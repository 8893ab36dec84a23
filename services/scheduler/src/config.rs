use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use placement_cluster::DEFAULT_LEADER_SCHEDULE_LIMIT;

use crate::scheduler::worker::DEFAULT_MIN_INTERVAL;

/// A scheduler to create at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulerSpec {
    pub scheduler_type: String,
    pub args: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub listen_addr: SocketAddr,
    pub log_level: String,
    /// Directory for persisted scheduler configs; in-memory when unset.
    pub data_dir: Option<PathBuf>,
    /// JSON cluster snapshot to seed the cluster view from.
    pub topology_file: Option<PathBuf>,
    pub leader_schedule_limit: u64,
    pub schedule_interval: Duration,
    pub schedulers: Vec<SchedulerSpec>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let listen_addr = std::env::var("PLACEMENT_LISTEN_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:2379".to_string())
            .parse()
            .context("invalid PLACEMENT_LISTEN_ADDR")?;

        let log_level =
            std::env::var("PLACEMENT_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let data_dir = std::env::var("PLACEMENT_DATA_DIR").ok().map(PathBuf::from);
        let topology_file = std::env::var("PLACEMENT_TOPOLOGY_FILE")
            .ok()
            .map(PathBuf::from);

        let leader_schedule_limit = match std::env::var("PLACEMENT_LEADER_SCHEDULE_LIMIT") {
            Ok(v) => v
                .parse()
                .context("invalid PLACEMENT_LEADER_SCHEDULE_LIMIT")?,
            Err(_) => DEFAULT_LEADER_SCHEDULE_LIMIT,
        };

        let schedule_interval = match std::env::var("PLACEMENT_SCHEDULE_INTERVAL_MS") {
            Ok(v) => Duration::from_millis(
                v.parse()
                    .context("invalid PLACEMENT_SCHEDULE_INTERVAL_MS")?,
            ),
            Err(_) => DEFAULT_MIN_INTERVAL,
        };

        let schedulers = std::env::var("PLACEMENT_SCHEDULERS")
            .map(|v| parse_scheduler_specs(&v))
            .unwrap_or_default();

        Ok(Self {
            listen_addr,
            log_level,
            data_dir,
            topology_file,
            leader_schedule_limit,
            schedule_interval,
            schedulers,
        })
    }
}

/// Parses `type arg...;type arg...`. Blank entries are ignored.
pub fn parse_scheduler_specs(raw: &str) -> Vec<SchedulerSpec> {
    raw.split(';')
        .filter_map(|entry| {
            let mut words = entry.split_whitespace();
            let scheduler_type = words.next()?.to_string();
            Some(SchedulerSpec {
                scheduler_type,
                args: words.map(str::to_string).collect(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_scheduler_specs() {
        let specs = parse_scheduler_specs("user-evict-leader 4 a z ; ;other");
        assert_eq!(
            specs,
            vec![
                SchedulerSpec {
                    scheduler_type: "user-evict-leader".to_string(),
                    args: vec!["4".into(), "a".into(), "z".into()],
                },
                SchedulerSpec {
                    scheduler_type: "other".to_string(),
                    args: Vec::new(),
                },
            ]
        );
        assert!(parse_scheduler_specs("").is_empty());
    }
}
