use serde::Serialize;

// ============================================================================
// Constants
// ============================================================================

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const COMMIT: &str = match option_env!("BUILD_COMMIT") {
    Some(c) => c,
    None => "unknown",
};
pub const BUILD_DATE: &str = match option_env!("BUILD_DATE") {
    Some(d) => d,
    None => "unknown",
};

/// Full version string including commit and build date.
pub fn version_string() -> String {
    format!("{} (commit: {}, built: {})", VERSION, COMMIT, BUILD_DATE)
}

// ============================================================================
// BuildInfo
// ============================================================================

/// Body of `GET /version`.
#[derive(Debug, Serialize)]
pub struct BuildInfo {
    pub name: &'static str,
    pub version: &'static str,
    pub commit: &'static str,
    pub build_date: &'static str,
}

impl BuildInfo {
    #[must_use]
    pub fn new() -> Self {
        Self {
            name: env!("CARGO_PKG_NAME"),
            version: VERSION,
            commit: COMMIT,
            build_date: BUILD_DATE,
        }
    }
}

impl Default for BuildInfo {
    fn default() -> Self {
        Self::new()
    }
}
