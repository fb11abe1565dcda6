//! Admin handlers for inspecting and editing the configuration bundle.
//!
//! Every handler first picks up on-disk changes, then authorizes against the
//! resulting settings (see [`super::admin_auth`]).

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use chrono::{SecondsFormat, Utc};
use tracing::{error, info};

use super::admin_auth;
use super::problem_details;
use crate::api::{ReloadResponse, WriteConfigRequest, WriteConfigResponse};
use crate::bundle::BundleError;
use crate::server::AppState;

/// GET /admin/config
pub async fn get_config(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let bundle = state.bundles.refresh().await;
    if let Err(problem) = admin_auth::authorize(&bundle.settings, &headers) {
        return problem.into_response();
    }
    Json(bundle.snapshot()).into_response()
}

/// POST /admin/reload
pub async fn reload(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let bundle = state.bundles.refresh().await;
    if let Err(problem) = admin_auth::authorize(&bundle.settings, &headers) {
        return problem.into_response();
    }

    state.bundles.reload().await;
    info!("Configuration reload requested");
    Json(ReloadResponse {
        reloaded_at: Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true),
    })
    .into_response()
}

/// PUT /admin/config
///
/// Overwrites one allow-listed source file and reloads.
pub async fn put_config(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let bundle = state.bundles.refresh().await;
    if let Err(problem) = admin_auth::authorize(&bundle.settings, &headers) {
        return problem.into_response();
    }

    let req: WriteConfigRequest = match serde_json::from_slice(&body) {
        Ok(req) => req,
        Err(e) => {
            return problem_details::bad_request(format!("invalid request body: {e}"))
                .into_response();
        }
    };
    let file = req.file.unwrap_or_default();

    match state.bundles.write_source(&file, &req.data).await {
        Ok(receipt) => Json(WriteConfigResponse {
            saved: receipt.file.to_string(),
            mtime: receipt.mtime,
        })
        .into_response(),
        Err(e @ BundleError::FileNotAllowed(_)) => {
            problem_details::bad_request(e.to_string()).into_response()
        }
        Err(e) => {
            error!(file = %file, error = %e, "Failed to write configuration source");
            problem_details::internal_error(e.to_string()).into_response()
        }
    }
}
