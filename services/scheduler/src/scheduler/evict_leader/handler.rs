//! Control-plane routes for the evict-leader scheduler.
//!
//! | Method | Path | |
//! |---|---|---|
//! | POST | `/config` | add a store or replace its ranges |
//! | GET | `/list` | current config |
//! | DELETE | `/delete/{store_id}` | stop evicting a store |

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::Response,
    routing::{delete, get, post},
    Json, Router,
};
use placement_cluster::{Direction, SchedulerCluster};
use placement_keyspace::StoreId;
use serde::{de, Deserialize, Deserializer};
use tracing::{info, warn};

use super::config::EvictLeaderConfig;
use super::NO_STORE_IN_CONFIG;
use crate::api::{error::ApiError, render};
use crate::error::SchedulerError;
use crate::scheduler::config_store::ConfigStore;

/// Body of `POST /config`.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateConfigRequest {
    #[serde(default, deserialize_with = "store_id_from_number")]
    pub store_id: Option<StoreId>,
    /// Alternating URL-escaped start/end keys.
    pub ranges: Option<Vec<String>>,
}

/// Accepts any JSON number with an integral non-negative value, so `5.0`
/// names store 5.
fn store_id_from_number<'de, D>(deserializer: D) -> Result<Option<StoreId>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(number) = Option::<serde_json::Number>::deserialize(deserializer)? else {
        return Ok(None);
    };
    if let Some(id) = number.as_u64() {
        return Ok(Some(StoreId::new(id)));
    }
    match number.as_f64() {
        Some(id) if id >= 0.0 && id.fract() == 0.0 && id < u64::MAX as f64 => {
            Ok(Some(StoreId::new(id as u64)))
        }
        _ => Err(de::Error::custom(format!("invalid store id {number}"))),
    }
}

pub(super) struct EvictLeaderHandler {
    config: Arc<ConfigStore<EvictLeaderConfig>>,
    cluster: Arc<dyn SchedulerCluster>,
}

impl EvictLeaderHandler {
    pub(super) fn new(
        config: Arc<ConfigStore<EvictLeaderConfig>>,
        cluster: Arc<dyn SchedulerCluster>,
    ) -> Self {
        Self { config, cluster }
    }

    /// Adds the store, or replaces its ranges, and persists the result.
    ///
    /// A newly added store is paused for inbound leader transfer before the
    /// config changes and resumed again if the change does not stick.
    pub(super) fn update(&self, req: UpdateConfigRequest) -> Result<StoreId, SchedulerError> {
        let cluster = self.cluster.as_ref();
        let (store_id, newly_paused) = self.config.apply_and_persist(
            |config| {
                let Some(store_id) = req.store_id else {
                    return Err(SchedulerError::InvalidArgument(
                        "should specify the store-id".to_string(),
                    ));
                };

                let newly_paused = !config.contains(store_id);
                if newly_paused {
                    cluster.pause_leader_transfer(store_id, Direction::In)?;
                }

                let mut args = vec![store_id.to_string()];
                match req.ranges {
                    Some(ranges) => args.extend(ranges),
                    None => args.extend(config.ranges_for(store_id)),
                }

                if let Err(e) = config.build_with_args(&args) {
                    if newly_paused {
                        cluster.resume_leader_transfer(store_id, Direction::In);
                    }
                    return Err(e);
                }
                Ok((store_id, newly_paused))
            },
            |&(store_id, newly_paused)| {
                if newly_paused {
                    cluster.resume_leader_transfer(store_id, Direction::In);
                }
            },
        )?;

        info!(%store_id, newly_paused, "Evict-leader store configured");
        Ok(store_id)
    }

    /// Removes the store, resumes it and persists the result. Returns the
    /// number of stores still configured.
    pub(super) fn remove(&self, store_id: StoreId) -> Result<usize, SchedulerError> {
        let cluster = self.cluster.as_ref();
        let remaining = self.config.apply_and_persist(
            |config| {
                if config.store_id_ranges.remove(&store_id).is_none() {
                    return Err(SchedulerError::NotFound(
                        "the config does not exist".to_string(),
                    ));
                }
                cluster.resume_leader_transfer(store_id, Direction::In);
                Ok(config.store_id_ranges.len())
            },
            |_| {
                if let Err(e) = cluster.pause_leader_transfer(store_id, Direction::In) {
                    warn!(%store_id, error = %e, "Failed to re-pause store after rollback");
                }
            },
        )?;

        info!(%store_id, remaining, "Evict-leader store removed");
        Ok(remaining)
    }

    pub(super) fn list(&self) -> EvictLeaderConfig {
        self.config.snapshot()
    }
}

pub(super) fn routes(handler: Arc<EvictLeaderHandler>) -> Router {
    Router::new()
        .route("/config", post(update_config))
        .route("/list", get(list_config))
        .route("/delete/{store_id}", delete(delete_config))
        .with_state(handler)
}

async fn update_config(
    State(handler): State<Arc<EvictLeaderHandler>>,
    payload: Result<Json<UpdateConfigRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(req) = payload.map_err(|e| ApiError::bad_request(e.body_text()))?;
    handler.update(req)?;
    Ok(render::json(StatusCode::OK, &serde_json::Value::Null))
}

async fn list_config(State(handler): State<Arc<EvictLeaderHandler>>) -> Response {
    render::json(StatusCode::OK, &handler.list())
}

async fn delete_config(
    State(handler): State<Arc<EvictLeaderHandler>>,
    Path(raw_id): Path<String>,
) -> Result<Response, ApiError> {
    let store_id = StoreId::parse(&raw_id).map_err(|e| ApiError::bad_request(e.to_string()))?;
    let remaining = handler.remove(store_id)?;

    let body = (remaining == 0).then_some(NO_STORE_IN_CONFIG);
    Ok(render::json(StatusCode::OK, &body))
}
