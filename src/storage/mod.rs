//! Product image storage.
//!
//! Uploads pass through an [`UploadPolicy`] first; accepted images are then
//! written by one of the [`ImageStorage`] backends, which hand back the URL
//! that gets persisted on the product row.

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Bytes;
use thiserror::Error;

use crate::config::{StorageBackend, UploadConfig};

pub mod cloud;
pub mod local;

pub use cloud::CloudStorage;
pub use local::LocalStorage;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("file exceeds the {limit} byte limit")]
    TooLarge { limit: usize },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("upload failed: {0}")]
    Upload(String),

    #[error("could not sign url: {0}")]
    Presign(String),

    #[error("storage misconfigured: {0}")]
    Misconfigured(String),
}

/// An image received from a multipart form
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Bytes,
}

/// Where a stored image ended up
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredImage {
    /// Backend-specific name, accepted by [`ImageStorage::discard`]
    pub key: String,
    /// URL clients can read the image from
    pub url: String,
}

#[async_trait]
pub trait ImageStorage: Send + Sync {
    async fn store(&self, image: &ImageUpload) -> Result<StoredImage, StorageError>;

    /// Remove an image whose product was never saved
    async fn discard(&self, key: &str) -> Result<(), StorageError>;

    fn backend_name(&self) -> &'static str;
}

/// MIME and size rules applied before anything is stored
#[derive(Debug, Clone)]
pub struct UploadPolicy {
    pub max_file_size: usize,
    pub allowed_mime_types: Vec<String>,
}

impl UploadPolicy {
    pub fn from_config(config: &UploadConfig) -> Self {
        Self {
            max_file_size: config.max_file_size,
            allowed_mime_types: config.allowed_mime_types.clone(),
        }
    }

    /// Files of other types are skipped, not rejected
    pub fn accepts(&self, content_type: Option<&str>) -> bool {
        let Some(content_type) = content_type else {
            return false;
        };
        let essence = content_type.split(';').next().unwrap_or_default().trim();
        self.allowed_mime_types
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(essence))
    }

    pub fn check_size(&self, len: usize) -> Result<(), StorageError> {
        if len > self.max_file_size {
            return Err(StorageError::TooLarge { limit: self.max_file_size });
        }
        Ok(())
    }
}

/// `<unix millis>-<original name>` with path separators and odd characters removed
pub fn stored_file_name(original: &str, unix_millis: i64) -> String {
    let base = original
        .rsplit(|c: char| c == '/' || c == '\\')
        .next()
        .unwrap_or_default();

    let cleaned: String = base
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') { c } else { '_' })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');

    if cleaned.is_empty() {
        format!("{}-image", unix_millis)
    } else {
        format!("{}-{}", unix_millis, cleaned)
    }
}

/// Build the configured backend once at startup
pub async fn build_storage(config: &UploadConfig) -> Result<Arc<dyn ImageStorage>, StorageError> {
    let storage: Arc<dyn ImageStorage> = match config.backend {
        StorageBackend::Local => Arc::new(LocalStorage::new(&config.upload_dir, &config.image_base_url)),
        StorageBackend::Cloud => Arc::new(CloudStorage::from_config(config).await?),
    };
    tracing::info!("Image storage backend: {}", storage.backend_name());
    Ok(storage)
}
