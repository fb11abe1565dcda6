//! Hot-reloadable holder of the current bundle snapshot.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use serde_json::Value;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};

use super::error::{BundleError, log_load_warnings};
use super::{ConfigBundle, SOURCE_FILES, allowed_source, is_json_source};

type MtimeTable = HashMap<&'static str, Option<SystemTime>>;

/// Shared, cheap-to-clone handle to the live configuration.
///
/// Readers get an `Arc<ConfigBundle>` and keep using it for the whole request even
/// if a reload lands meanwhile. Reloads build a complete new bundle before swapping
/// the pointer, so no reader sees a partial update.
#[derive(Clone)]
pub struct BundleStore {
    dir: Arc<PathBuf>,
    current: Arc<RwLock<Arc<ConfigBundle>>>,
    /// Last seen modification time per source (`None` = file absent).
    /// Also serializes concurrent reloads.
    mtimes: Arc<Mutex<MtimeTable>>,
}

/// Result of an admin write.
#[derive(Debug, Clone)]
pub struct WriteReceipt {
    pub file: &'static str,
    /// Modification time after the write, seconds since the epoch.
    pub mtime: f64,
}

impl BundleStore {
    /// Open a store on `dir` and load the initial snapshot.
    pub async fn open(dir: impl Into<PathBuf>) -> Self {
        let store = Self {
            dir: Arc::new(dir.into()),
            current: Arc::new(RwLock::new(Arc::new(ConfigBundle::default()))),
            mtimes: Arc::new(Mutex::new(HashMap::new())),
        };
        store.reload().await;
        store
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// The current snapshot, without checking the files.
    pub async fn current(&self) -> Arc<ConfigBundle> {
        self.current.read().await.clone()
    }

    /// Reload if any source's modification time changed, then return the snapshot.
    pub async fn refresh(&self) -> Arc<ConfigBundle> {
        self.reload_if(false).await
    }

    /// Reload unconditionally.
    pub async fn reload(&self) -> Arc<ConfigBundle> {
        self.reload_if(true).await
    }

    async fn reload_if(&self, force: bool) -> Arc<ConfigBundle> {
        let mut seen = Vec::with_capacity(SOURCE_FILES.len());
        for file in SOURCE_FILES {
            seen.push((file, modified(&self.dir.join(file)).await));
        }

        // Held through the load so concurrent reloads swap in order.
        let mut mtimes = self.mtimes.lock().await;
        let mut changed = Vec::new();
        for (file, mtime) in seen {
            if mtimes.get(file) != Some(&mtime) {
                mtimes.insert(file, mtime);
                changed.push(file);
            }
        }

        if !force && changed.is_empty() {
            return self.current().await;
        }

        let load = ConfigBundle::load(&self.dir).await;
        log_load_warnings(&load.warnings);
        let bundle = Arc::new(load.bundle);
        *self.current.write().await = bundle.clone();

        if changed.is_empty() {
            debug!(dir = %self.dir.display(), "Configuration reloaded");
        } else {
            info!(dir = %self.dir.display(), changed = ?changed, "Configuration reloaded");
        }
        bundle
    }

    /// Overwrite one allow-listed source file and force a reload.
    ///
    /// JSON sources are pretty-printed; text sources are written verbatim (a JSON
    /// string as-is, `null` as empty, anything else as its JSON text).
    pub async fn write_source(&self, file: &str, data: &Value) -> Result<WriteReceipt, BundleError> {
        let file = allowed_source(file).ok_or_else(|| BundleError::FileNotAllowed(file.to_string()))?;

        let contents = if is_json_source(file) {
            serde_json::to_string_pretty(data)?
        } else {
            match data {
                Value::String(s) => s.clone(),
                Value::Null => String::new(),
                other => other.to_string(),
            }
        };

        tokio::fs::create_dir_all(self.dir.as_path())
            .await
            .map_err(|e| BundleError::io(self.dir.as_path(), e))?;
        let path = self.dir.join(file);
        tokio::fs::write(&path, contents)
            .await
            .map_err(|e| BundleError::io(&path, e))?;

        self.reload().await;

        let mtime = modified(&path)
            .await
            .and_then(|t| t.duration_since(SystemTime::UNIX_EPOCH).ok())
            .map(|d| d.as_secs_f64())
            .unwrap_or_default();
        info!(file = %file, "Configuration source written");
        Ok(WriteReceipt { file, mtime })
    }
}

async fn modified(path: &Path) -> Option<SystemTime> {
    tokio::fs::metadata(path).await.ok()?.modified().ok()
}
