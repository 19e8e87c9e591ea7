//! Filesystem media storage rooted at `MEDIA_ROOT`.

use std::io::ErrorKind;
use std::path::PathBuf;

use async_trait::async_trait;

use yatube_core::ports::{MediaError, MediaStorage};

use super::{check_key, new_key};

pub struct LocalMediaStorage {
    root: PathBuf,
}

impl LocalMediaStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl MediaStorage for LocalMediaStorage {
    async fn store(&self, extension: &str, bytes: Vec<u8>) -> Result<String, MediaError> {
        let key = new_key(extension)?;
        let path = self.root.join(&key);

        if let Some(dir) = path.parent() {
            tokio::fs::create_dir_all(dir)
                .await
                .map_err(|e| MediaError::Io(e.to_string()))?;
        }
        tokio::fs::write(&path, &bytes)
            .await
            .map_err(|e| MediaError::Io(e.to_string()))?;

        tracing::debug!(%key, size = bytes.len(), "Stored media file");
        Ok(key)
    }

    async fn load(&self, key: &str) -> Result<Option<Vec<u8>>, MediaError> {
        check_key(key)?;

        match tokio::fs::read(self.root.join(key)).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(MediaError::Io(e.to_string())),
        }
    }
}
