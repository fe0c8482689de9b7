use std::time::Duration;

use async_trait::async_trait;
use aws_sdk_s3::config::timeout::TimeoutConfig;
use aws_sdk_s3::config::{Credentials, Region};
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::core::config::StorageConfig;
use crate::core::error::StorageError;

use super::{GetObjectOutput, ObjectInfo, ObjectPage, ObjectStore};

// ---------------------------------------------------------------------------
// Retry constants
// ---------------------------------------------------------------------------

const MAX_RETRIES: u32 = 3;
const INITIAL_BACKOFF_MS: u64 = 100;

// ---------------------------------------------------------------------------
// S3ObjectStore
// ---------------------------------------------------------------------------

/// Production storage backend wrapping `aws-sdk-s3`.
///
/// Supports AWS S3 and S3-compatible stores (Cloudflare R2, MinIO,
/// DigitalOcean Spaces, etc.) via configurable endpoint and path-style
/// addressing. The list adapter expects exactly the ListObjectsV2 response
/// shape; a malformed upstream response surfaces as an error rather than
/// being guessed around.
pub struct S3ObjectStore {
    client: Client,
    bucket: String,
}

impl S3ObjectStore {
    /// Create a new S3ObjectStore from configuration.
    pub fn new(config: &StorageConfig) -> Self {
        let credentials = Credentials::new(
            &config.access_key_id,
            &config.secret_access_key,
            None,
            None,
            "reelshelf-config",
        );

        let mut s3_config_builder = aws_sdk_s3::Config::builder()
            .region(Region::new(config.region.clone()))
            .credentials_provider(credentials)
            .force_path_style(config.path_style)
            .timeout_config(
                TimeoutConfig::builder()
                    .operation_timeout(Duration::from_secs(config.request_timeout_secs))
                    .build(),
            );

        if !config.endpoint.is_empty() {
            s3_config_builder = s3_config_builder.endpoint_url(&config.endpoint);
        }

        let s3_config = s3_config_builder.build();
        let client = Client::from_conf(s3_config);

        Self {
            client,
            bucket: config.bucket.clone(),
        }
    }

    /// Execute a PUT with bounded retry and exponential backoff.
    async fn put_with_retry(
        &self,
        key: &str,
        body: Bytes,
        content_type: &str,
    ) -> Result<(), StorageError> {
        for attempt in 0..MAX_RETRIES {
            if attempt > 0 {
                let backoff = Duration::from_millis(INITIAL_BACKOFF_MS * (1 << (attempt - 1)));
                debug!(key, attempt, backoff_ms = backoff.as_millis(), "retrying PUT");
                tokio::time::sleep(backoff).await;
            }

            match self
                .client
                .put_object()
                .bucket(&self.bucket)
                .key(key)
                .body(ByteStream::from(body.clone()))
                .content_type(content_type)
                .send()
                .await
            {
                Ok(_) => return Ok(()),
                Err(e) => {
                    let err_str = e.to_string();
                    // Don't retry 403 (forbidden) — likely misconfigured credentials
                    if err_str.contains("403") || err_str.contains("Forbidden") {
                        return Err(StorageError::PutFailed {
                            path: key.to_string(),
                            reason: format!("forbidden (credentials issue): {}", err_str),
                        });
                    }
                    warn!(key, attempt, error = %err_str, "PUT failed");
                }
            }
        }

        Err(StorageError::RetriesExhausted {
            path: key.to_string(),
        })
    }

    /// Execute a GET with bounded retry and exponential backoff.
    async fn get_with_retry(&self, key: &str) -> Result<GetObjectOutput, StorageError> {
        for attempt in 0..MAX_RETRIES {
            if attempt > 0 {
                let backoff = Duration::from_millis(INITIAL_BACKOFF_MS * (1 << (attempt - 1)));
                tokio::time::sleep(backoff).await;
            }

            match self
                .client
                .get_object()
                .bucket(&self.bucket)
                .key(key)
                .send()
                .await
            {
                Ok(output) => {
                    let content_type = output
                        .content_type
                        .unwrap_or_else(|| "application/octet-stream".to_string());
                    let etag = output.e_tag.unwrap_or_default();
                    let last_modified = output
                        .last_modified
                        .and_then(|t| DateTime::from_timestamp(t.secs(), t.subsec_nanos()))
                        .unwrap_or_else(Utc::now);

                    let body_bytes = output
                        .body
                        .collect()
                        .await
                        .map_err(|e| StorageError::GetFailed {
                            path: key.to_string(),
                            reason: e.to_string(),
                        })?
                        .into_bytes();

                    return Ok(GetObjectOutput {
                        body: Bytes::from(body_bytes),
                        content_type,
                        last_modified,
                        etag,
                    });
                }
                Err(e) => {
                    let err_str = e.to_string();
                    // Don't retry 404 — object doesn't exist
                    if err_str.contains("NoSuchKey") || err_str.contains("404") {
                        return Err(StorageError::NotFound {
                            path: key.to_string(),
                        });
                    }
                    if err_str.contains("403") || err_str.contains("Forbidden") {
                        return Err(StorageError::GetFailed {
                            path: key.to_string(),
                            reason: format!("forbidden: {}", err_str),
                        });
                    }
                    warn!(key, attempt, error = %err_str, "GET failed");
                }
            }
        }

        Err(StorageError::RetriesExhausted {
            path: key.to_string(),
        })
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn list(
        &self,
        prefix: &str,
        max_keys: u32,
        continuation_token: Option<&str>,
    ) -> Result<ObjectPage, StorageError> {
        let mut req = self
            .client
            .list_objects_v2()
            .bucket(&self.bucket)
            .max_keys(max_keys as i32);

        if !prefix.is_empty() {
            req = req.prefix(prefix);
        }
        if let Some(token) = continuation_token {
            req = req.continuation_token(token);
        }

        let output = req.send().await.map_err(|e| StorageError::ListFailed {
            prefix: prefix.to_string(),
            reason: e.to_string(),
        })?;

        let mut entries = Vec::new();
        if let Some(contents) = output.contents {
            for obj in contents {
                let key = obj.key.unwrap_or_default();
                let size = obj.size.unwrap_or(0) as u64;
                let last_modified = obj
                    .last_modified
                    .and_then(|t| DateTime::from_timestamp(t.secs(), t.subsec_nanos()))
                    .unwrap_or_else(Utc::now);

                entries.push(ObjectInfo {
                    key,
                    size,
                    last_modified,
                });
            }
        }

        Ok(ObjectPage {
            entries,
            is_truncated: output.is_truncated.unwrap_or(false),
            next_continuation_token: output.next_continuation_token,
        })
    }

    async fn get(&self, key: &str) -> Result<GetObjectOutput, StorageError> {
        self.get_with_retry(key).await
    }

    async fn put(&self, key: &str, data: Bytes, content_type: &str) -> Result<(), StorageError> {
        self.put_with_retry(key, data, content_type).await
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| StorageError::DeleteFailed {
                path: key.to_string(),
                reason: e.to_string(),
            })?;
        Ok(())
    }

    async fn presign_get(&self, key: &str, ttl_secs: u64) -> Result<String, StorageError> {
        let presign_config = PresigningConfig::expires_in(Duration::from_secs(ttl_secs))
            .map_err(|e| StorageError::PresignFailed {
                path: key.to_string(),
                reason: e.to_string(),
            })?;

        let presigned = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .presigned(presign_config)
            .await
            .map_err(|e| StorageError::PresignFailed {
                path: key.to_string(),
                reason: e.to_string(),
            })?;

        Ok(presigned.uri().to_string())
    }

    async fn presign_put(
        &self,
        key: &str,
        content_type: &str,
        ttl_secs: u64,
    ) -> Result<String, StorageError> {
        let presign_config = PresigningConfig::expires_in(Duration::from_secs(ttl_secs))
            .map_err(|e| StorageError::PresignFailed {
                path: key.to_string(),
                reason: e.to_string(),
            })?;

        let presigned = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .presigned(presign_config)
            .await
            .map_err(|e| StorageError::PresignFailed {
                path: key.to_string(),
                reason: e.to_string(),
            })?;

        Ok(presigned.uri().to_string())
    }
}
