//! Scheduler management routes.
//!
//! - `GET /schedulers`: running schedulers
//! - `POST /schedulers`: start one from `{"type", "args"}`
//! - `DELETE /schedulers/{name}`: stop one
//! - `/scheduler-config/{name}/...`: forwarded to the scheduler's own routes

use axum::{
    extract::{rejection::JsonRejection, Path, Request, State},
    http::{self, Extensions, StatusCode, Uri},
    response::Response,
    routing::{any, delete, get},
    Json, Router,
};
use serde::Deserialize;
use tower::ServiceExt;
use tracing::info;

use super::{error::ApiError, render};
use crate::error::SchedulerError;
use crate::scheduler::SchedulerSummary;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateSchedulerRequest {
    #[serde(rename = "type")]
    pub scheduler_type: String,
    /// CLI-style arguments. The type's defaults are used when absent.
    #[serde(default)]
    pub args: Option<Vec<String>>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/schedulers", get(list_schedulers).post(create_scheduler))
        .route("/schedulers/{name}", delete(delete_scheduler))
        .route("/scheduler-config/{name}/{*rest}", any(forward_to_scheduler))
}

async fn list_schedulers(State(state): State<AppState>) -> Response {
    render::json(StatusCode::OK, &state.coordinator().list())
}

async fn create_scheduler(
    State(state): State<AppState>,
    payload: Result<Json<CreateSchedulerRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(req) = payload.map_err(|e| ApiError::bad_request(e.body_text()))?;
    let coordinator = state.coordinator();

    let args = match req.args {
        Some(args) => args,
        None => coordinator
            .registry()
            .get(&req.scheduler_type)
            .map(|r| r.default_args().to_vec())
            .unwrap_or_default(),
    };

    let name = coordinator
        .add(&req.scheduler_type, args)
        .map_err(|e| match e {
            SchedulerError::AlreadyExists(_) => ApiError::conflict(e.to_string()),
            e => e.into(),
        })?;

    info!(scheduler = %name, "Scheduler created via API");
    Ok(render::json(
        StatusCode::OK,
        &SchedulerSummary {
            name,
            scheduler_type: req.scheduler_type,
        },
    ))
}

async fn delete_scheduler(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Response, ApiError> {
    state.coordinator().remove(&name).await.map_err(|e| match e {
        SchedulerError::NotFound(_) => ApiError::not_found(e.to_string()),
        e => e.into(),
    })?;
    Ok(render::json(StatusCode::OK, &serde_json::Value::Null))
}

/// Hands the request to the named scheduler's router with the prefix
/// stripped, so `/scheduler-config/{name}/list` reaches its `/list`.
///
/// The forwarded request starts with empty extensions: the path params
/// matched here must not reach the inner router's extractors.
async fn forward_to_scheduler(
    State(state): State<AppState>,
    Path((name, rest)): Path<(String, String)>,
    req: Request,
) -> Result<Response, ApiError> {
    let router = state
        .coordinator()
        .handler(&name)
        .ok_or_else(|| ApiError::not_found(format!("scheduler {name:?} not found")))?;

    let (mut parts, body) = req.into_parts();
    let path = match parts.uri.query() {
        Some(query) => format!("/{rest}?{query}"),
        None => format!("/{rest}"),
    };
    parts.uri = path
        .parse::<Uri>()
        .map_err(|e| ApiError::bad_request(e.to_string()))?;
    parts.extensions = Extensions::new();

    match router.oneshot(http::Request::from_parts(parts, body)).await {
        Ok(response) => Ok(response),
        Err(never) => match never {},
    }
}
