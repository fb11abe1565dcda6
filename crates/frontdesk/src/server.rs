use std::time::Duration;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderValue, Method, StatusCode};
use axum::routing::{get, post};
use tower::limit::ConcurrencyLimitLayer;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tracing::warn;

use crate::bundle::BundleStore;
use crate::handlers;
use crate::router::ResponseRouter;

/// Request body cap for every route.
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

// ============================================================================
// Application State
// ============================================================================

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub bundles: BundleStore,
    pub router: ResponseRouter,
    /// Browser origins allowed by CORS, fixed at startup.
    pub cors_origins: Vec<String>,
    pub max_connections: usize,
}

// ============================================================================
// Server Setup
// ============================================================================

pub fn build_app(state: AppState, request_timeout_seconds: u64) -> Router {
    let max_connections = state.max_connections;
    let cors = cors_layer(&state.cors_origins);

    let chat_routes = Router::new()
        .route("/", get(handlers::root))
        .route("/status", post(handlers::status))
        .route("/chat", post(handlers::chat))
        .with_state(state.clone());

    let admin_routes = Router::new()
        .route(
            "/admin/config",
            get(handlers::get_config).put(handlers::put_config),
        )
        .route("/admin/reload", post(handlers::reload))
        .with_state(state);

    let app_routes = Router::new()
        .merge(chat_routes)
        .merge(admin_routes)
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(request_timeout_seconds),
        ))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(ConcurrencyLimitLayer::new(max_connections));

    Router::new()
        .route("/livez", get(handlers::livez))
        .route("/version", get(handlers::version))
        .merge(app_routes)
        .layer(cors)
}

/// CORS for the configured browser origins. A `*` entry allows any origin.
fn cors_layer(origins: &[String]) -> CorsLayer {
    let allow_origin = if origins.iter().any(|o| o == "*") {
        AllowOrigin::any()
    } else {
        let values: Vec<HeaderValue> = origins
            .iter()
            .filter_map(|origin| match HeaderValue::from_str(origin) {
                Ok(value) => Some(value),
                Err(_) => {
                    warn!(origin = %origin, "Ignoring invalid CORS origin");
                    None
                }
            })
            .collect();
        AllowOrigin::list(values)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_headers(Any)
}
