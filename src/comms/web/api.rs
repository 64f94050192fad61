//! Handlers for `/api/*` routes.

use std::sync::Arc;

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use serde_json::json;

use crate::comms::state::{AskState, Display};

#[derive(Deserialize)]
pub(super) struct AskRequest {
    #[serde(default)]
    question: String,
}

/// Build a JSON error response body.
fn json_error(code: &str, msg: impl std::fmt::Display) -> Json<serde_json::Value> {
    Json(json!({ "error": code, "message": format!("{msg}") }))
}

/// POST /api/ask
pub(super) async fn ask(
    State(state): State<Arc<AskState>>,
    Json(req): Json<AskRequest>,
) -> Response {
    match state.handle_input(&req.question).await {
        Display::Empty => (StatusCode::OK, Json(json!({ "answer": null }))).into_response(),
        Display::Answer(text) => (StatusCode::OK, Json(json!({ "answer": text }))).into_response(),
        Display::Error { message, timed_out: true } => {
            (StatusCode::GATEWAY_TIMEOUT, json_error("timeout", message)).into_response()
        }
        Display::Error { message, timed_out: false } => {
            (StatusCode::BAD_GATEWAY, json_error("remote", message)).into_response()
        }
    }
}

/// GET /api/health
pub(super) async fn health(State(state): State<Arc<AskState>>) -> Response {
    Json(json!({
        "status": "ok",
        "provider": state.pipeline().provider().name(),
    }))
    .into_response()
}
