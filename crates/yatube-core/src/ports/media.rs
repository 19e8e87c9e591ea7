//! Media storage port - where uploaded post images live.

use async_trait::async_trait;

/// Storage for uploaded image files, addressed by opaque keys.
#[async_trait]
pub trait MediaStorage: Send + Sync {
    /// Store `bytes` under a fresh key ending in `extension`, returning the key.
    async fn store(&self, extension: &str, bytes: Vec<u8>) -> Result<String, MediaError>;

    /// Load a previously stored file.
    async fn load(&self, key: &str) -> Result<Option<Vec<u8>>, MediaError>;
}

/// Media storage errors.
#[derive(Debug, thiserror::Error)]
pub enum MediaError {
    #[error("Invalid media key: {0}")]
    InvalidKey(String),

    #[error("Storage I/O failed: {0}")]
    Io(String),
}
