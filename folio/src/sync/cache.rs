//! Local snapshot cache.
//!
//! A single JSON file, `<cache_dir>/portfolioData.json`, holding the last snapshot written by this
//! process. It is the fallback source when the database cannot be reached at load time and the
//! only persistence while offline. Writes go to a temporary file that is then renamed over the
//! cache so a crash never leaves a truncated document behind.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use serde_json::Value;
use tracing::{debug, instrument, warn};

use crate::content::Snapshot;

pub const CACHE_FILE_NAME: &str = "portfolioData.json";

#[derive(Debug, Clone)]
pub struct LocalCache {
    path: PathBuf,
}

impl LocalCache {
    pub fn new(cache_dir: impl AsRef<Path>) -> Self {
        Self {
            path: cache_dir.as_ref().join(CACHE_FILE_NAME),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read and parse the cached document.
    ///
    /// Returns `None` when the file is missing, unreadable or not JSON; the caller falls back to
    /// the seed defaults.
    #[instrument(skip(self), fields(path = %self.path.display()))]
    pub async fn read(&self) -> Option<Value> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No cached snapshot");
                return None;
            }
            Err(e) => {
                warn!(error = %e, "Failed to read cached snapshot");
                return None;
            }
        };

        match serde_json::from_slice(&bytes) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(error = %e, "Cached snapshot is not valid JSON");
                None
            }
        }
    }

    #[instrument(skip(self, snapshot), fields(path = %self.path.display()), err)]
    pub async fn write(&self, snapshot: &Snapshot) -> anyhow::Result<()> {
        let bytes = serde_json::to_vec_pretty(snapshot).context("serialize snapshot")?;

        if let Some(dir) = self.path.parent() {
            tokio::fs::create_dir_all(dir)
                .await
                .with_context(|| format!("create cache directory {}", dir.display()))?;
        }

        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, &bytes)
            .await
            .with_context(|| format!("write {}", tmp.display()))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .with_context(|| format!("replace {}", self.path.display()))?;

        debug!(bytes = bytes.len(), "Cached snapshot written");
        Ok(())
    }

    /// Remove the cached document. A missing file is not an error.
    #[instrument(skip(self), fields(path = %self.path.display()), err)]
    pub async fn clear(&self) -> anyhow::Result<()> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| format!("remove {}", self.path.display())),
        }
    }
}
