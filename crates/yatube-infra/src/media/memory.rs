//! In-memory media storage. Note: files are lost on process restart.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use yatube_core::ports::{MediaError, MediaStorage};

use super::{check_key, new_key};

#[derive(Default)]
pub struct InMemoryMediaStorage {
    files: RwLock<HashMap<String, Vec<u8>>>,
}

impl InMemoryMediaStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MediaStorage for InMemoryMediaStorage {
    async fn store(&self, extension: &str, bytes: Vec<u8>) -> Result<String, MediaError> {
        let key = new_key(extension)?;
        self.files.write().await.insert(key.clone(), bytes);
        Ok(key)
    }

    async fn load(&self, key: &str) -> Result<Option<Vec<u8>>, MediaError> {
        check_key(key)?;
        Ok(self.files.read().await.get(key).cloned())
    }
}
