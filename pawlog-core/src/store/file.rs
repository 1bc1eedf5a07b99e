use async_trait::async_trait;
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

use super::backend::StorageBackend;
use super::error::LocalStoreError;

/// Stores each key as `<key>.json` inside a directory.
///
/// Writes go to a temporary sibling file which is synced and then renamed over
/// the target, so a crash leaves either the old or the new contents.
#[derive(Debug, Clone)]
pub struct FileBackend {
    data_dir: PathBuf,
}

impl FileBackend {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Full path of the file backing `key`.
    pub fn path(&self, key: &str) -> PathBuf {
        self.data_dir.join(format!("{}.json", key))
    }
}

#[async_trait]
impl StorageBackend for FileBackend {
    async fn read(&self, key: &str) -> Result<Option<Vec<u8>>, LocalStoreError> {
        match fs::read(self.path(key)).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(LocalStoreError::io(key, e)),
        }
    }

    async fn write(&self, key: &str, bytes: Vec<u8>) -> Result<(), LocalStoreError> {
        fs::create_dir_all(&self.data_dir)
            .await
            .map_err(|e| LocalStoreError::io(key, e))?;

        let target = self.path(key);
        let tmp = self.data_dir.join(format!(".{}.json.tmp", key));

        let mut file = fs::File::create(&tmp)
            .await
            .map_err(|e| LocalStoreError::io(key, e))?;
        file.write_all(&bytes)
            .await
            .map_err(|e| LocalStoreError::io(key, e))?;
        file.sync_all()
            .await
            .map_err(|e| LocalStoreError::io(key, e))?;
        drop(file);

        fs::rename(&tmp, &target)
            .await
            .map_err(|e| LocalStoreError::io(key, e))
    }

    async fn delete(&self, key: &str) -> Result<(), LocalStoreError> {
        match fs::remove_file(self.path(key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(LocalStoreError::io(key, e)),
        }
    }
}
