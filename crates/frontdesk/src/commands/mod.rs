//! CLI command implementations.

use std::path::{Path, PathBuf};

use frontdesk::config::Config;

pub mod doctor;
pub mod serve;

/// Resolve the bundle directory for a command and make it absolute.
///
/// The store keeps this path for its whole lifetime, so a later working
/// directory change must not move it.
pub fn bundle_dir(config: &Config, config_path: &str, cli_override: Option<&Path>) -> PathBuf {
    let dir = config.bundle_dir(
        Path::new(config_path),
        cli_override,
        std::env::var("CONFIG_DIR").ok(),
    );
    std::path::absolute(&dir).unwrap_or(dir)
}

