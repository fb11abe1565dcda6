use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;

use crate::api::RootResponse;
use crate::server::AppState;

pub async fn livez() -> (StatusCode, &'static str) {
    (StatusCode::OK, "ok")
}

/// GET /
pub async fn root(State(state): State<AppState>) -> Json<RootResponse> {
    let bundle = state.bundles.refresh().await;
    Json(RootResponse {
        message: format!("{} bot aktif.", bundle.clinic_name()),
        config_dir: state.bundles.dir().display().to_string(),
    })
}
