/// Whole-value JSON snapshot persistence.
///
/// A snapshot is one serialized value under one key, read once at startup and overwritten
/// wholesale on every write. There is no schema versioning and no partial update.
///
/// Backends:
/// - Redis: the value lives under the configured key (degrades to "nothing stored").
/// - File: the value is the whole file; writes go through a sibling temp file and a rename.
/// - Memory: process-local, lost on restart.
use std::path::PathBuf;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::CommonError;
use crate::redis::RedisCache;

enum Backend {
    Redis { cache: RedisCache, key: String },
    File(PathBuf),
    Memory(Mutex<Option<String>>),
}

pub struct SnapshotStore {
    backend: Backend,
}

impl SnapshotStore {
    pub fn redis(cache: RedisCache, key: impl Into<String>) -> Self {
        Self {
            backend: Backend::Redis {
                cache,
                key: key.into(),
            },
        }
    }

    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            backend: Backend::File(path.into()),
        }
    }

    pub fn memory() -> Self {
        Self {
            backend: Backend::Memory(Mutex::new(None)),
        }
    }

    /// Short backend name for logs.
    pub fn kind(&self) -> &'static str {
        match &self.backend {
            Backend::Redis { .. } => "redis",
            Backend::File(_) => "file",
            Backend::Memory(_) => "memory",
        }
    }

    /// Read the raw snapshot text. `Ok(None)` means nothing has been stored yet.
    pub async fn load_raw(&self) -> Result<Option<String>, CommonError> {
        match &self.backend {
            Backend::Redis { cache, key } => Ok(cache.get(key).await),
            Backend::File(path) => match tokio::fs::read_to_string(path).await {
                Ok(text) => Ok(Some(text)),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    debug!(path = %path.display(), "no snapshot file yet");
                    Ok(None)
                }
                Err(e) => Err(e.into()),
            },
            Backend::Memory(slot) => Ok(slot.lock().await.clone()),
        }
    }

    /// Overwrite the snapshot with `raw`.
    pub async fn save_raw(&self, raw: &str) -> Result<(), CommonError> {
        match &self.backend {
            Backend::Redis { cache, key } => {
                if cache.set(key, raw).await {
                    Ok(())
                } else {
                    Err(CommonError::RedisUnavailable)
                }
            }
            Backend::File(path) => {
                if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    tokio::fs::create_dir_all(parent).await?;
                }
                let tmp = path.with_extension("tmp");
                tokio::fs::write(&tmp, raw).await?;
                tokio::fs::rename(&tmp, path).await?;
                Ok(())
            }
            Backend::Memory(slot) => {
                *slot.lock().await = Some(raw.to_string());
                Ok(())
            }
        }
    }

    pub async fn load<T: DeserializeOwned>(&self) -> Result<Option<T>, CommonError> {
        let Some(raw) = self.load_raw().await? else {
            return Ok(None);
        };
        Ok(Some(serde_json::from_str(&raw)?))
    }

    pub async fn save<T: Serialize + ?Sized>(&self, value: &T) -> Result<(), CommonError> {
        let raw = serde_json::to_string(value)?;
        self.save_raw(&raw).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_snapshot_overwrites_wholesale() {
        let store = SnapshotStore::memory();
        assert!(store.load::<Vec<u32>>().await.unwrap().is_none());

        store.save(&vec![1u32, 2, 3]).await.unwrap();
        store.save(&vec![9u32]).await.unwrap();
        assert_eq!(store.load::<Vec<u32>>().await.unwrap(), Some(vec![9]));
    }

    #[tokio::test]
    async fn file_snapshot_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("courses.json");

        let store = SnapshotStore::file(&path);
        assert!(store.load_raw().await.unwrap().is_none());
        store.save(&["a", "b"]).await.unwrap();

        let reopened = SnapshotStore::file(&path);
        assert_eq!(
            reopened.load::<Vec<String>>().await.unwrap(),
            Some(vec!["a".to_string(), "b".to_string()])
        );
        assert!(!path.with_extension("tmp").exists());
    }

    #[tokio::test]
    async fn corrupt_file_snapshot_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("courses.json");
        std::fs::write(&path, "{not json").unwrap();

        let store = SnapshotStore::file(&path);
        let err = store.load::<Vec<String>>().await.unwrap_err();
        assert!(matches!(err, CommonError::SnapshotJson(_)));
    }

    #[tokio::test]
    async fn unconfigured_redis_write_reports_unavailable() {
        let store = SnapshotStore::redis(RedisCache::new(None), "catalog:v1:courses");
        assert_eq!(store.kind(), "redis");
        assert!(store.load_raw().await.unwrap().is_none());
        let err = store.save_raw("[]").await.unwrap_err();
        assert!(matches!(err, CommonError::RedisUnavailable));
    }
}
