//! Chat and session status handlers.
//!
//! Both endpoints accept any body: anything that is not a JSON object of the
//! expected shape is treated as an empty request.

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::api::{ChatRequest, ChatResponse, StatusRequest, StatusResponse};
use crate::server::AppState;

/// POST /chat
pub async fn chat(State(state): State<AppState>, body: Bytes) -> Json<ChatResponse> {
    let bundle = state.bundles.refresh().await;
    let req: ChatRequest = parse_lenient(&body);

    let outcome = state
        .router
        .chat(
            &bundle,
            req.session_id.as_deref(),
            req.message.as_deref().unwrap_or_default(),
        )
        .await;
    Json(outcome.into())
}

/// POST /status
pub async fn status(State(state): State<AppState>, body: Bytes) -> Json<StatusResponse> {
    let bundle = state.bundles.refresh().await;
    let req: StatusRequest = parse_lenient(&body);

    Json(state.router.status(&bundle, req.session_id.as_deref()).into())
}

fn parse_lenient<T: DeserializeOwned + Default>(body: &[u8]) -> T {
    serde_json::from_slice(body).unwrap_or_else(|e| {
        if !body.is_empty() {
            debug!(error = %e, "Ignoring malformed request body");
        }
        T::default()
    })
}
