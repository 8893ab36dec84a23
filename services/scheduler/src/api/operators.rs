//! In-flight operator listing.

use axum::{extract::State, http::StatusCode, response::Response, routing::get, Router};

use super::render;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/operators", get(list_operators))
}

async fn list_operators(State(state): State<AppState>) -> Response {
    render::json(StatusCode::OK, &state.op_controller().operators())
}
