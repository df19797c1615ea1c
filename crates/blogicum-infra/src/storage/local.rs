//! Local-disk image storage under a media root.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use uuid::Uuid;

use blogicum_core::domain::IMAGE_UPLOAD_PREFIX;
use blogicum_core::forms::ImageUpload;
use blogicum_core::ports::{ImageStorage, StorageError};

/// Writes uploads to `<root>/post_images/<uuid>.<ext>`.
#[derive(Debug, Clone)]
pub struct LocalImageStorage {
    root: PathBuf,
}

impl LocalImageStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map a stored relative path back onto the media root.
    ///
    /// Only plain relative paths below the upload prefix are accepted.
    pub fn resolve(&self, path: &str) -> Result<PathBuf, StorageError> {
        let relative = Path::new(path);
        let plain = relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
        if !plain || !relative.starts_with(IMAGE_UPLOAD_PREFIX) {
            return Err(StorageError::InvalidPath(path.to_owned()));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl ImageStorage for LocalImageStorage {
    async fn save(&self, upload: &ImageUpload) -> Result<String, StorageError> {
        if upload.extension.is_empty()
            || !upload.extension.chars().all(|c| c.is_ascii_alphanumeric())
        {
            return Err(StorageError::InvalidPath(upload.extension.clone()));
        }

        let relative = format!(
            "{IMAGE_UPLOAD_PREFIX}/{}.{}",
            Uuid::new_v4(),
            upload.extension.to_ascii_lowercase()
        );
        let target = self.resolve(&relative)?;

        if let Some(dir) = target.parent() {
            tokio::fs::create_dir_all(dir).await?;
        }
        tokio::fs::write(&target, &upload.bytes).await?;

        tracing::debug!(path = %relative, size = upload.bytes.len(), "Stored image");
        Ok(relative)
    }

    async fn delete(&self, path: &str) -> Result<(), StorageError> {
        let target = self.resolve(path)?;
        match tokio::fs::remove_file(&target).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(%path, "Image already gone");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upload(extension: &str) -> ImageUpload {
        ImageUpload {
            extension: extension.to_owned(),
            bytes: vec![0x89, b'P', b'N', b'G'],
        }
    }

    #[tokio::test]
    async fn test_save_writes_under_prefix() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalImageStorage::new(dir.path());

        let path = storage.save(&upload("PNG")).await.unwrap();

        assert!(path.starts_with("post_images/"));
        assert!(path.ends_with(".png"));
        let written = tokio::fs::read(dir.path().join(&path)).await.unwrap();
        assert_eq!(written, upload("png").bytes);
    }

    #[tokio::test]
    async fn test_delete_removes_file_and_tolerates_missing() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalImageStorage::new(dir.path());

        let path = storage.save(&upload("jpg")).await.unwrap();
        storage.delete(&path).await.unwrap();

        assert!(!dir.path().join(&path).exists());
        assert!(storage.delete(&path).await.is_ok());
    }

    #[test]
    fn test_resolve_rejects_escaping_paths() {
        let storage = LocalImageStorage::new("/srv/media");

        assert!(storage.resolve("post_images/a.png").is_ok());
        assert!(storage.resolve("post_images/../../etc/passwd").is_err());
        assert!(storage.resolve("/etc/passwd").is_err());
        assert!(storage.resolve("avatars/a.png").is_err());
    }

    #[tokio::test]
    async fn test_save_rejects_odd_extension() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalImageStorage::new(dir.path());

        assert!(storage.save(&upload("png/../x")).await.is_err());
    }
}
