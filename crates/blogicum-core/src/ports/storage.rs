//! Image storage port.

use async_trait::async_trait;

use crate::forms::ImageUpload;

/// Persists uploaded post images and returns their relative paths.
#[async_trait]
pub trait ImageStorage: Send + Sync {
    /// Store the upload and return its path relative to the media root.
    async fn save(&self, upload: &ImageUpload) -> Result<String, StorageError>;

    /// Remove a previously stored image.
    async fn delete(&self, path: &str) -> Result<(), StorageError>;
}

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Invalid storage path: {0}")]
    InvalidPath(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
