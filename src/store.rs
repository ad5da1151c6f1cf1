//! File-backed key-value store: one `<key>.json` file per key.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use flowpilot_protocols::{KeyValueStore, StoreError};
use tracing::debug;

pub(crate) struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn load(&self, key: &str) -> Result<Option<String>, StoreError> {
        match tokio::fs::read_to_string(self.path_for(key)).await {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(unavailable(e)),
        }
    }

    async fn save(&self, key: &str, value: String) -> Result<(), StoreError> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(unavailable)?;
        let path = self.path_for(key);
        tokio::fs::write(&path, value).await.map_err(unavailable)?;
        debug!("Saved {}", path.display());
        Ok(())
    }
}

fn unavailable(e: std::io::Error) -> StoreError {
    StoreError::Unavailable(e.to_string())
}
