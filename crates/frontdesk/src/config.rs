use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tokio::fs;

use serde::Deserialize;
use thiserror::Error;

// ============================================================================
// Config (root)
// ============================================================================

/// Server configuration file (`frontdesk.yaml`).
///
/// This only covers the process: where to listen and where the clinic bundle lives.
/// Clinic content and behavior come from the bundle directory itself.
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    /// Bundle directory. Relative paths are resolved against the config file.
    #[serde(default)]
    pub config_dir: Option<PathBuf>,
    #[serde(default)]
    pub sessions: SessionsConfig,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Yaml(#[from] serde_saphyr::Error),

    #[error("environment variable '{0}' is not set")]
    MissingEnvVar(String),

    #[error("unclosed variable reference '${{' (missing '}}')")]
    UnclosedVarReference,
}

impl Config {
    /// Load from a YAML file. A missing file yields the defaults.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = match fs::read_to_string(path).await {
            Ok(c) => c,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(ConfigError::Io(e)),
        };
        Self::parse(&contents, |name| std::env::var(name).ok())
    }

    /// Parse YAML text after expanding variables through `lookup`.
    pub fn parse(
        contents: &str,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let expanded = expand_vars(contents, lookup)?;
        Ok(serde_saphyr::from_str(&expanded)?)
    }

    /// Pick the bundle directory.
    ///
    /// Precedence: CLI flag (relative to the working directory), then `config_dir`
    /// from the file (relative to the file), then `CONFIG_DIR`, then `config`.
    pub fn bundle_dir(
        &self,
        config_path: &Path,
        cli_override: Option<&Path>,
        env_dir: Option<String>,
    ) -> PathBuf {
        if let Some(dir) = cli_override {
            return dir.to_path_buf();
        }
        if let Some(dir) = &self.config_dir {
            return resolve_path(config_path, dir);
        }
        env_dir
            .filter(|d| !d.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_DIR))
    }
}

/// Resolve a path relative to the config file directory.
///
/// Absolute paths are returned as-is.
pub fn resolve_path(config_path: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }

    let config_dir = config_path.parent().unwrap_or_else(|| Path::new("."));
    config_dir.join(path)
}

// ============================================================================
// Defaults
// ============================================================================

/// Default config file name.
pub const DEFAULT_CONFIG_FILE: &str = "frontdesk.yaml";
/// Default bundle directory (relative to the working directory).
pub const DEFAULT_CONFIG_DIR: &str = "config";

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_request_timeout() -> u64 {
    120
}

fn default_max_connections() -> usize {
    1024
}

fn default_sweep_interval() -> u64 {
    600
}

// ============================================================================
// Variable Expansion
// ============================================================================

/// Expand `${VAR}` references in a string.
///
/// - `${VAR}` must resolve, otherwise it is an error
/// - `${VAR:-fallback}` uses the fallback when unset (an empty fallback is allowed)
/// - `$$` is a literal `$`; a `$` not followed by `{` is kept as-is
///
/// There is no nested expansion.
fn expand_vars(
    input: &str,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<String, ConfigError> {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(pos) = rest.find('$') {
        out.push_str(&rest[..pos]);
        let after = &rest[pos + 1..];

        if let Some(tail) = after.strip_prefix('$') {
            out.push('$');
            rest = tail;
        } else if let Some(body) = after.strip_prefix('{') {
            let end = body.find('}').ok_or(ConfigError::UnclosedVarReference)?;
            let reference = &body[..end];
            let value = match reference.split_once(":-") {
                Some((name, fallback)) => lookup(name).unwrap_or_else(|| fallback.to_string()),
                None => lookup(reference)
                    .ok_or_else(|| ConfigError::MissingEnvVar(reference.to_string()))?,
            };
            out.push_str(&value);
            rest = &body[end + 1..];
        } else {
            out.push('$');
            rest = after;
        }
    }

    out.push_str(rest);
    Ok(out)
}

// ============================================================================
// ServerConfig
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Overall per-request deadline, including generative calls.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
    /// Maximum in-flight requests.
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_timeout_seconds: default_request_timeout(),
            max_connections: default_max_connections(),
        }
    }
}

// ============================================================================
// SessionsConfig
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct SessionsConfig {
    /// Period of the background session sweep. `0` disables it; sweeps still
    /// happen opportunistically on session creation.
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_seconds: u64,
}

impl Default for SessionsConfig {
    fn default() -> Self {
        Self {
            sweep_interval_seconds: default_sweep_interval(),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
