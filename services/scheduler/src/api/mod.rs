//! HTTP API handlers and routing.

pub mod error;
mod health;
mod operators;
pub mod render;
mod schedulers;

use axum::{
    http::{header, Method},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::state::AppState;

/// Create the main API router with all routes and middleware.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE])
        .allow_origin(Any);

    let v1 = Router::new()
        .merge(schedulers::routes())
        .merge(operators::routes());

    Router::new()
        .merge(health::routes())
        .nest("/v1", v1)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use placement_cluster::{BasicCluster, MemoryOperatorController, MemoryStorage, StoreInfo};
    use placement_keyspace::StoreId;
    use tower::ServiceExt;

    use super::*;
    use crate::scheduler::{
        default_registry, SchedulerCoordinator, SchedulerDeps, SchedulerSummary, WorkerConfig,
    };

    fn app(stores: u64) -> Router {
        let cluster = Arc::new(BasicCluster::default());
        for id in 1..=stores {
            cluster.put_store(StoreInfo::new(StoreId::new(id)));
        }
        let op_controller = Arc::new(MemoryOperatorController::new());
        let deps = SchedulerDeps {
            cluster: cluster.clone(),
            op_controller: op_controller.clone(),
            storage: Arc::new(MemoryStorage::new()),
        };
        let coordinator = Arc::new(SchedulerCoordinator::new(
            Arc::new(default_registry()),
            deps,
            WorkerConfig::with_min_interval(Duration::from_millis(10)),
        ));
        create_router(AppState::new(coordinator, cluster, op_controller))
    }

    async fn call(app: &Router, method: &str, uri: &str, body: Option<&str>) -> (StatusCode, String) {
        let mut builder = Request::builder().method(method).uri(uri);
        if body.is_some() {
            builder = builder.header("content-type", "application/json");
        }
        let req = builder
            .body(body.map(|b| Body::from(b.to_string())).unwrap_or_else(Body::empty))
            .unwrap();
        let resp = app.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_readyz_needs_stores() {
        let (status, _) = call(&app(0), "GET", "/readyz", None).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        let (status, _) = call(&app(1), "GET", "/readyz", None).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_scheduler_lifecycle_routes() {
        let app = app(3);

        let (status, body) = call(&app, "POST", "/v1/schedulers", Some(r#"{"type": "user-evict-leader"}"#)).await;
        assert_eq!(status, StatusCode::OK, "{body}");
        let created: SchedulerSummary = serde_json::from_str(&body).unwrap();
        assert_eq!(created.name, "user-evict-leader-scheduler");

        let (status, _) = call(&app, "POST", "/v1/schedulers", Some(r#"{"type": "user-evict-leader"}"#)).await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, body) = call(&app, "GET", "/v1/schedulers", None).await;
        assert_eq!(status, StatusCode::OK);
        let listed: Vec<SchedulerSummary> = serde_json::from_str(&body).unwrap();
        assert_eq!(listed, vec![created]);

        let (status, body) = call(&app, "GET", "/v1/scheduler-config/user-evict-leader-scheduler/list", None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("store-id-ranges"));

        let (status, _) = call(&app, "DELETE", "/v1/schedulers/user-evict-leader-scheduler", None).await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = call(&app, "DELETE", "/v1/schedulers/user-evict-leader-scheduler", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_forwarded_delete_reaches_store_route() {
        let app = app(3);
        let prefix = "/v1/scheduler-config/user-evict-leader-scheduler";

        let (status, body) = call(
            &app,
            "POST",
            "/v1/schedulers",
            Some(r#"{"type": "user-evict-leader", "args": ["2"]}"#),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        let (status, _) = call(&app, "POST", &format!("{prefix}/config"), Some(r#"{"store_id": 3}"#)).await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = call(&app, "DELETE", &format!("{prefix}/delete/nine"), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");

        let (status, body) = call(&app, "DELETE", &format!("{prefix}/delete/9"), None).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body.contains("the config does not exist"), "{body}");

        let (status, body) = call(&app, "DELETE", &format!("{prefix}/delete/3"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "null");

        let (status, body) = call(&app, "DELETE", &format!("{prefix}/delete/2"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("No store in user-evict-leader-scheduler-config"), "{body}");
    }

    #[tokio::test]
    async fn test_create_rejects_unknown_type() {
        let (status, body) = call(&app(1), "POST", "/v1/schedulers", Some(r#"{"type": "balance-all"}"#)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.contains("balance-all"));
    }

    #[tokio::test]
    async fn test_forward_to_missing_scheduler() {
        let (status, _) = call(&app(1), "GET", "/v1/scheduler-config/nope/list", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_list_operators_empty() {
        let (status, body) = call(&app(1), "GET", "/v1/operators", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "[]");
    }
}
