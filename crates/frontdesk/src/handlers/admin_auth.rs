//! Shared-secret authorization for admin routes.
//!
//! Behavior:
//! - `settings.admin_enabled` false: every admin request is refused with 403
//! - enabled: the `X-Admin-Token` header must equal the non-empty `admin_token`
//!   (401 otherwise)

use axum::http::HeaderMap;
use sha2::{Digest, Sha256};

use super::problem_details::{self, ProblemDetails};
use crate::bundle::Settings;

pub const ADMIN_TOKEN_HEADER: &str = "x-admin-token";

/// Whether the provided token matches the expected one (constant-time via SHA-256).
pub fn token_matches(expected: &str, headers: &HeaderMap) -> bool {
    if expected.is_empty() {
        return false;
    }
    headers
        .get(ADMIN_TOKEN_HEADER)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|provided| {
            let a = Sha256::digest(provided.as_bytes());
            let b = Sha256::digest(expected.as_bytes());
            a == b
        })
}

/// Check an admin request against the current settings.
pub fn authorize(settings: &Settings, headers: &HeaderMap) -> Result<(), ProblemDetails> {
    if !settings.admin_enabled {
        return Err(problem_details::forbidden("admin endpoints disabled"));
    }
    if !token_matches(&settings.admin_token, headers) {
        return Err(problem_details::unauthorized("unauthorized"));
    }
    Ok(())
}
