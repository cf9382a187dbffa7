use std::path::PathBuf;

use async_trait::async_trait;
use chrono::Utc;

use super::{stored_file_name, ImageStorage, ImageUpload, StorageError, StoredImage};

/// Writes images under a directory that the router serves at `/uploads`
pub struct LocalStorage {
    dir: PathBuf,
    base_url: String,
}

impl LocalStorage {
    pub fn new(dir: impl Into<PathBuf>, base_url: &str) -> Self {
        Self {
            dir: dir.into(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl ImageStorage for LocalStorage {
    async fn store(&self, image: &ImageUpload) -> Result<StoredImage, StorageError> {
        tokio::fs::create_dir_all(&self.dir).await?;

        let file_name = stored_file_name(&image.file_name, Utc::now().timestamp_millis());
        tokio::fs::write(self.dir.join(&file_name), &image.bytes).await?;

        tracing::debug!("Stored image {} ({} bytes)", file_name, image.bytes.len());
        Ok(StoredImage {
            url: format!("{}/{}", self.base_url, file_name),
            key: file_name,
        })
    }

    async fn discard(&self, key: &str) -> Result<(), StorageError> {
        // Keys are flat file names produced by `store`
        if key.is_empty() || key.contains(['/', '\\']) || key.starts_with('.') {
            return Err(StorageError::Misconfigured(format!("refusing to delete {:?}", key)));
        }
        match tokio::fs::remove_file(self.dir.join(key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn backend_name(&self) -> &'static str {
        "local"
    }
}
