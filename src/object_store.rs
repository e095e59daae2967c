use async_trait::async_trait;
use aws_config::meta::region::RegionProviderChain;
use aws_config::BehaviorVersion;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use std::path::Path;
use thiserror::Error;
use tracing::{error, info};

#[derive(Debug, Error)]
pub enum ObjectStoreError {
    #[error("upload failed: {0}")]
    UploadFailed(String),
}

/// Remote object-store contract. The real implementation talks to S3 (or an
/// S3-compatible endpoint); tests inject in-memory fakes.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Upload a local file under `key`, tagged with the given content type.
    async fn put_file(
        &self,
        key: &str,
        content_type: &str,
        path: &Path,
    ) -> Result<(), ObjectStoreError>;

    /// Public URL of the object at `key`, deterministic from endpoint,
    /// bucket, region, and key.
    fn object_url(&self, key: &str) -> String;
}

pub struct S3ObjectStore {
    client: Client,
    bucket: String,
    region: String,
    endpoint_url: Option<String>,
}

impl S3ObjectStore {
    /// Build a client for AWS S3, or for an S3-compatible provider when
    /// `endpoint_url` is set (MinIO and friends need path-style addressing).
    pub async fn new(bucket: String, region: String, endpoint_url: Option<String>) -> Self {
        let region_provider =
            RegionProviderChain::first_try(aws_config::Region::new(region.clone()));
        let config = aws_config::defaults(BehaviorVersion::latest())
            .region(region_provider)
            .load()
            .await;

        let client = if let Some(ref endpoint) = endpoint_url {
            let s3_config = aws_sdk_s3::config::Builder::from(&config)
                .endpoint_url(endpoint)
                .force_path_style(true)
                .build();
            Client::from_conf(s3_config)
        } else {
            Client::new(&config)
        };

        Self {
            client,
            bucket,
            region,
            endpoint_url,
        }
    }
}

fn build_object_url(endpoint: Option<&str>, bucket: &str, region: &str, key: &str) -> String {
    match endpoint {
        // S3-compatible providers: path-style from the configured endpoint.
        Some(endpoint) => format!("{}/{}/{}", endpoint.trim_end_matches('/'), bucket, key),
        // Standard AWS virtual-hosted form.
        None => format!("https://{}.s3.{}.amazonaws.com/{}", bucket, region, key),
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn put_file(
        &self,
        key: &str,
        content_type: &str,
        path: &Path,
    ) -> Result<(), ObjectStoreError> {
        let body = ByteStream::from_path(path)
            .await
            .map_err(|e| ObjectStoreError::UploadFailed(format!("unreadable source: {}", e)))?;

        let start = std::time::Instant::now();

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(body)
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| {
                error!(
                    error = %e,
                    bucket = %self.bucket,
                    key = %key,
                    "S3 upload failed"
                );
                ObjectStoreError::UploadFailed(e.to_string())
            })?;

        info!(
            bucket = %self.bucket,
            key = %key,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 upload complete"
        );

        Ok(())
    }

    fn object_url(&self, key: &str) -> String {
        build_object_url(
            self.endpoint_url.as_deref(),
            &self.bucket,
            &self.region,
            key,
        )
    }
}
