use std::time::Duration;

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::{
    config::Region, error::DisplayErrorContext, presigning::PresigningConfig, primitives::ByteStream, Client,
};
use chrono::Utc;

use super::{stored_file_name, ImageStorage, ImageUpload, StorageError, StoredImage};
use crate::config::UploadConfig;

/// S3-compatible bucket; images are returned as time-limited presigned URLs
pub struct CloudStorage {
    client: Client,
    bucket: String,
    signed_url_ttl: Duration,
}

impl CloudStorage {
    pub async fn from_config(config: &UploadConfig) -> Result<Self, StorageError> {
        let bucket = config
            .bucket
            .clone()
            .filter(|b| !b.is_empty())
            .ok_or_else(|| StorageError::Misconfigured("STORAGE_BUCKET is not set".to_string()))?;

        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(region) = &config.region {
            loader = loader.region(Region::new(region.clone()));
        }
        let sdk_config = loader.load().await;

        let mut builder = aws_sdk_s3::config::Builder::from(&sdk_config);
        if let Some(endpoint) = &config.endpoint {
            // Non-AWS providers (GCS interop, MinIO) need path-style addressing
            builder = builder.endpoint_url(endpoint).force_path_style(true);
        }

        Ok(Self {
            client: Client::from_conf(builder.build()),
            bucket,
            signed_url_ttl: Duration::from_secs(config.signed_url_ttl_secs),
        })
    }

    fn object_key(file_name: &str) -> String {
        format!("products/{}", stored_file_name(file_name, Utc::now().timestamp_millis()))
    }
}

#[async_trait]
impl ImageStorage for CloudStorage {
    async fn store(&self, image: &ImageUpload) -> Result<StoredImage, StorageError> {
        let key = Self::object_key(&image.file_name);

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .content_type(&image.content_type)
            .body(ByteStream::from(image.bytes.clone()))
            .send()
            .await
            .map_err(|e| StorageError::Upload(DisplayErrorContext(&e).to_string()))?;

        let presigning = PresigningConfig::expires_in(self.signed_url_ttl)
            .map_err(|e| StorageError::Presign(e.to_string()))?;

        let request = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(&key)
            .presigned(presigning)
            .await
            .map_err(|e| StorageError::Presign(DisplayErrorContext(&e).to_string()))?;

        tracing::info!("Uploaded image to {}/{}", self.bucket, key);
        Ok(StoredImage {
            url: request.uri().to_string(),
            key,
        })
    }

    async fn discard(&self, key: &str) -> Result<(), StorageError> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| StorageError::Upload(DisplayErrorContext(&e).to_string()))?;

        tracing::info!("Discarded image {}/{}", self.bucket, key);
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "cloud"
    }
}
