use anyhow::Result;
use async_trait::async_trait;
use aws_sdk_s3::Client;
use aws_sdk_s3::primitives::ByteStream;
use std::fmt;
use tokio::fs::File;
use uuid::Uuid;

use crate::services::orientation::Orientation;

/// Object key `<orientation>/<video id>.<extension>`. Deterministic, so a
/// re-upload of the same video overwrites the previous object.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StorageKey(String);

impl StorageKey {
    pub fn new(orientation: Orientation, video_id: Uuid, extension: &str) -> Self {
        Self(format!(
            "{}/{}.{}",
            orientation.as_str(),
            video_id.hyphenated(),
            extension
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Virtual-hosted-style public URL of an object.
pub fn object_url(bucket: &str, region: &str, key: &str) -> String {
    format!("https://{}.s3.{}.amazonaws.com/{}", bucket, region, key)
}

#[async_trait]
pub trait StorageService: Send + Sync {
    /// Uploads the whole file, which must be positioned at its start.
    async fn upload_file(&self, key: &StorageKey, file: File, content_type: &str) -> Result<()>;
    fn object_url(&self, key: &StorageKey) -> String;
}

pub struct S3StorageService {
    client: Client,
    bucket: String,
    region: String,
}

impl S3StorageService {
    pub fn new(client: Client, bucket: String, region: String) -> Self {
        Self {
            client,
            bucket,
            region,
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }
}

#[async_trait]
impl StorageService for S3StorageService {
    async fn upload_file(&self, key: &StorageKey, file: File, content_type: &str) -> Result<()> {
        let body = ByteStream::read_from().file(file).build().await?;

        let res = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(key.as_str())
            .body(body)
            .content_type(content_type)
            .send()
            .await;

        if let Err(e) = res {
            tracing::error!(
                "S3 put_object failed: bucket={}, key={}, error={:?}",
                self.bucket,
                key,
                e
            );
            return Err(e.into());
        }
        Ok(())
    }

    fn object_url(&self, key: &StorageKey) -> String {
        object_url(&self.bucket, &self.region, key.as_str())
    }
}
