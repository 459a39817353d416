use super::{CacheKey, CacheStore};
use async_trait::async_trait;
use serde_json::Value;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, warn};

static TMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Durable cache storing one `<key>.json` file per record
#[derive(Debug, Clone)]
pub struct DiskCache {
    dir: PathBuf,
}

impl DiskCache {
    /// Opens the cache directory, creating it when needed
    pub fn new(dir: impl Into<PathBuf>) -> io::Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn record_path(&self, key: &CacheKey) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }

    fn tmp_path(&self, key: &CacheKey) -> PathBuf {
        let n = TMP_COUNTER.fetch_add(1, Ordering::Relaxed);
        self.dir
            .join(format!(".{}.{}.{}.tmp", key, std::process::id(), n))
    }

    /// Removes every record (and stray temporary files); returns the record count
    pub fn clear(&self) -> io::Result<usize> {
        let mut removed = 0;
        let entries = match std::fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e),
        };

        for entry in entries {
            let path = entry?.path();
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if name.ends_with(".json") && !name.starts_with('.') {
                std::fs::remove_file(&path)?;
                removed += 1;
            } else if name.starts_with('.') && name.ends_with(".tmp") {
                std::fs::remove_file(&path)?;
            }
        }

        debug!(dir = %self.dir.display(), removed, "Cache cleared");
        Ok(removed)
    }

    async fn write_record(&self, key: &CacheKey, value: &Value) -> io::Result<()> {
        let bytes = serde_json::to_vec_pretty(value)?;
        let tmp = self.tmp_path(key);
        tokio::fs::create_dir_all(&self.dir).await?;
        tokio::fs::write(&tmp, bytes).await?;
        if let Err(e) = tokio::fs::rename(&tmp, self.record_path(key)).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e);
        }
        Ok(())
    }
}

#[async_trait]
impl CacheStore for DiskCache {
    async fn get(&self, key: &CacheKey) -> Option<Value> {
        let path = self.record_path(key);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return None,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to read cache record");
                return None;
            }
        };

        match serde_json::from_slice(&bytes) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Corrupt cache record treated as miss");
                None
            }
        }
    }

    async fn put(&self, key: &CacheKey, value: &Value) {
        if let Err(e) = self.write_record(key, value).await {
            warn!(key = %key, error = %e, "Failed to write cache record");
        }
    }

    fn name(&self) -> &str {
        "disk"
    }
}
