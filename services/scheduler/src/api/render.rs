//! Indented JSON responses.

use axum::{
    http::{header::CONTENT_TYPE, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use tracing::error;

const JSON_CONTENT_TYPE: &str = "application/json; charset=UTF-8";

/// Renders `value` as pretty-printed JSON with the given status.
pub fn json<T: Serialize + ?Sized>(status: StatusCode, value: &T) -> Response {
    match serde_json::to_vec_pretty(value) {
        Ok(body) => (
            status,
            [(CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE))],
            body,
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "Failed to render JSON response");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
