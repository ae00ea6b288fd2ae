/// Course list persistence.
///
/// The whole list is one JSON array under `catalog:v1:courses` (Redis) or in one file. It is read
/// once at startup and overwritten after every successful import.
use catalog_common::redis::RedisCache;
use catalog_common::snapshot::SnapshotStore;
use tracing::warn;

use crate::config::Config;
use crate::error::AppError;
use crate::model::Course;

pub const SNAPSHOT_KEY: &str = "catalog:v1:courses";

pub struct CourseStore {
    snapshot: SnapshotStore,
}

impl CourseStore {
    pub fn new(snapshot: SnapshotStore) -> Self {
        Self { snapshot }
    }

    /// Redis when `REDIS_URL` is set, else a file when `CATALOG_SNAPSHOT_PATH` is set, else memory.
    pub fn from_config(config: &Config) -> Self {
        let snapshot = if let Some(url) = config.redis_url.as_deref() {
            SnapshotStore::redis(RedisCache::new(Some(url)), SNAPSHOT_KEY)
        } else if let Some(path) = &config.snapshot_path {
            SnapshotStore::file(path)
        } else {
            SnapshotStore::memory()
        };
        Self::new(snapshot)
    }

    pub fn kind(&self) -> &'static str {
        self.snapshot.kind()
    }

    /// `Ok(None)` when nothing has been stored yet.
    pub async fn load(&self) -> Result<Option<Vec<Course>>, AppError> {
        Ok(self.snapshot.load::<Vec<Course>>().await?)
    }

    /// Best effort: a failed write is logged and reported as `false`.
    pub async fn save(&self, courses: &[Course]) -> bool {
        match self.snapshot.save(courses).await {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, backend = self.kind(), "failed to persist course snapshot");
                false
            }
        }
    }
}
