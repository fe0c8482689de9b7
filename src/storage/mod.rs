pub mod memory;
pub mod s3;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::error::StorageError;

// ---------------------------------------------------------------------------
// ObjectStore trait
// ---------------------------------------------------------------------------

/// Trait-based abstraction over the object store.
///
/// The production implementation (`S3ObjectStore`) wraps `aws-sdk-s3` and
/// works against any S3-compatible endpoint (Cloudflare R2, MinIO, AWS).
/// Tests and development use `InMemoryObjectStore` without external deps.
/// Handlers hold the store as `Arc<dyn ObjectStore>` so the backend is a
/// runtime configuration choice.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// List one page of objects under a prefix.
    ///
    /// Pagination is the store's own: `max_keys` bounds the page and
    /// `continuation_token` resumes a previous listing. The returned
    /// truncation signal is passed through to callers unmodified.
    async fn list(
        &self,
        prefix: &str,
        max_keys: u32,
        continuation_token: Option<&str>,
    ) -> Result<ObjectPage, StorageError>;

    /// Read an object. Absence is `StorageError::NotFound`, not a failure.
    async fn get(&self, key: &str) -> Result<GetObjectOutput, StorageError>;

    /// Write an object, overwriting any existing content.
    async fn put(&self, key: &str, data: Bytes, content_type: &str) -> Result<(), StorageError>;

    /// Delete a single object. Deleting a missing object is not an error.
    async fn delete(&self, key: &str) -> Result<(), StorageError>;

    /// Produce a time-limited URL granting direct read access to one object.
    async fn presign_get(&self, key: &str, ttl_secs: u64) -> Result<String, StorageError>;

    /// Produce a time-limited URL granting direct write access for one object.
    async fn presign_put(
        &self,
        key: &str,
        content_type: &str,
        ttl_secs: u64,
    ) -> Result<String, StorageError>;
}

// ---------------------------------------------------------------------------
// Storage types
// ---------------------------------------------------------------------------

/// Information about an object from a LIST operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectInfo {
    pub key: String,
    pub size: u64,
    pub last_modified: DateTime<Utc>,
}

/// One page of a LIST operation, with the store's pagination signal.
#[derive(Debug, Clone, Default)]
pub struct ObjectPage {
    pub entries: Vec<ObjectInfo>,
    pub is_truncated: bool,
    pub next_continuation_token: Option<String>,
}

/// Output from a GET object operation.
#[derive(Debug, Clone)]
pub struct GetObjectOutput {
    pub body: Bytes,
    pub content_type: String,
    pub last_modified: DateTime<Utc>,
    pub etag: String,
}

// ---------------------------------------------------------------------------
// Content type helpers
// ---------------------------------------------------------------------------

/// Determine content type from file extension.
pub fn content_type_for_key(key: &str) -> &'static str {
    let lower = key.to_ascii_lowercase();
    if lower.ends_with(".mp4") || lower.ends_with(".mov") {
        "video/mp4"
    } else if lower.ends_with(".webm") {
        "video/webm"
    } else if lower.ends_with(".ogg") {
        "video/ogg"
    } else if lower.ends_with(".mkv") {
        "video/x-matroska"
    } else if lower.ends_with(".avi") {
        "video/x-msvideo"
    } else if lower.ends_with(".m3u8") {
        "application/vnd.apple.mpegurl"
    } else if lower.ends_with(".json") {
        "application/json"
    } else if lower.ends_with(".jpg") || lower.ends_with(".jpeg") {
        "image/jpeg"
    } else if lower.ends_with(".png") {
        "image/png"
    } else if lower.ends_with(".webp") {
        "image/webp"
    } else {
        "application/octet-stream"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_type_for_key() {
        assert_eq!(content_type_for_key("a/b/clip.MP4"), "video/mp4");
        assert_eq!(content_type_for_key("clip.webm"), "video/webm");
        assert_eq!(
            content_type_for_key("clip.mp4.metadata.json"),
            "application/json"
        );
        assert_eq!(content_type_for_key("covers/x-en.jpg"), "image/jpeg");
        assert_eq!(content_type_for_key("mystery.bin"), "application/octet-stream");
    }
}
