//! Placement scheduler service.

use std::sync::Arc;

use anyhow::{Context, Result};
use placement_cluster::{
    BasicCluster, ClusterSnapshot, ConfigStorage, FileStorage, MemoryOperatorController,
    MemoryStorage, ScheduleConfig, SchedulerCluster,
};
use placement_scheduler::{
    api, config,
    scheduler::{default_registry, SchedulerCoordinator, SchedulerDeps, WorkerConfig},
    state::AppState,
    SchedulerError,
};
use tokio::sync::watch;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let config = config::Config::from_env()?;

    // Prefer RUST_LOG, fall back to PLACEMENT_LOG_LEVEL
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| config.log_level.clone().into()))
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    info!("Starting placement scheduler");
    info!(listen_addr = %config.listen_addr, "Configuration loaded");

    let cluster = Arc::new(load_cluster(&config)?);
    info!(
        stores = cluster.store_count(),
        regions = cluster.region_count(),
        "Cluster view ready"
    );

    let storage: Arc<dyn ConfigStorage> = match &config.data_dir {
        Some(dir) => {
            info!(data_dir = %dir.display(), "Persisting scheduler configs to disk");
            Arc::new(FileStorage::new(dir))
        }
        None => {
            warn!("PLACEMENT_DATA_DIR not set, scheduler configs are kept in memory");
            Arc::new(MemoryStorage::new())
        }
    };

    let op_controller = Arc::new(MemoryOperatorController::new());
    let deps = SchedulerDeps {
        cluster: cluster.clone(),
        op_controller: op_controller.clone(),
        storage,
    };
    let coordinator = Arc::new(SchedulerCoordinator::new(
        Arc::new(default_registry()),
        deps,
        WorkerConfig::with_min_interval(config.schedule_interval),
    ));

    let restored = coordinator.load_persisted()?;
    info!(restored, "Restored persisted schedulers");

    for spec in &config.schedulers {
        match coordinator.add(&spec.scheduler_type, spec.args.clone()) {
            Ok(name) => info!(scheduler = %name, "Scheduler created from environment"),
            Err(SchedulerError::AlreadyExists(name)) => {
                info!(scheduler = %name, "Scheduler already running, keeping persisted config")
            }
            Err(e) => {
                error!(scheduler_type = %spec.scheduler_type, error = %e, "Failed to create scheduler");
                return Err(e.into());
            }
        }
    }

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let state = AppState::new(coordinator.clone(), cluster, op_controller);
    let app = api::create_router(state);

    let listener = tokio::net::TcpListener::bind(&config.listen_addr).await?;
    info!(addr = %config.listen_addr, "Listening for connections");

    let server_handle = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let mut shutdown_rx = shutdown_rx;
                loop {
                    if *shutdown_rx.borrow() {
                        break;
                    }
                    if shutdown_rx.changed().await.is_err() {
                        break;
                    }
                }
                info!("HTTP server shutting down");
            })
            .await
    });

    tokio::signal::ctrl_c().await?;
    info!("Received shutdown signal");
    let _ = shutdown_tx.send(true);

    coordinator.shutdown().await;
    match server_handle.await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => error!(error = %e, "HTTP server error"),
        Err(e) => error!(error = %e, "HTTP server task panicked"),
    }

    info!("Placement scheduler stopped");
    Ok(())
}

fn load_cluster(config: &config::Config) -> Result<BasicCluster> {
    let snapshot = match &config.topology_file {
        Some(path) => {
            let data = std::fs::read(path)
                .with_context(|| format!("failed to read topology file {}", path.display()))?;
            serde_json::from_slice::<ClusterSnapshot>(&data)
                .with_context(|| format!("invalid topology file {}", path.display()))?
        }
        None => ClusterSnapshot::default(),
    };

    let cluster = BasicCluster::from_snapshot(snapshot);
    cluster.set_schedule_config(ScheduleConfig {
        leader_schedule_limit: config.leader_schedule_limit,
        ..cluster.schedule_config()
    });
    Ok(cluster)
}
