use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::core::error::StorageError;

use super::{GetObjectOutput, ObjectInfo, ObjectPage, ObjectStore};

// ---------------------------------------------------------------------------
// InMemoryObjectStore — for development and tests
// ---------------------------------------------------------------------------

/// In-memory storage backend for unit tests and local development.
///
/// Objects live in a `BTreeMap` behind a `RwLock`, so listings come back in
/// lexicographic key order like an S3 bucket. The continuation token is the
/// last key of the previous page.
pub struct InMemoryObjectStore {
    objects: Arc<RwLock<BTreeMap<String, StoredObject>>>,
}

#[derive(Debug, Clone)]
struct StoredObject {
    data: Bytes,
    content_type: String,
    created_at: DateTime<Utc>,
}

impl InMemoryObjectStore {
    pub fn new() -> Self {
        Self {
            objects: Arc::new(RwLock::new(BTreeMap::new())),
        }
    }
}

impl Default for InMemoryObjectStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ObjectStore for InMemoryObjectStore {
    async fn list(
        &self,
        prefix: &str,
        max_keys: u32,
        continuation_token: Option<&str>,
    ) -> Result<ObjectPage, StorageError> {
        let objects = self.objects.read().await;
        let mut entries = Vec::new();
        let mut is_truncated = false;

        for (key, obj) in objects.iter() {
            if !key.starts_with(prefix) {
                continue;
            }
            if let Some(token) = continuation_token {
                if key.as_str() <= token {
                    continue;
                }
            }
            if entries.len() as u32 == max_keys {
                is_truncated = true;
                break;
            }
            entries.push(ObjectInfo {
                key: key.clone(),
                size: obj.data.len() as u64,
                last_modified: obj.created_at,
            });
        }

        let next_continuation_token = if is_truncated {
            entries.last().map(|e| e.key.clone())
        } else {
            None
        };

        Ok(ObjectPage {
            entries,
            is_truncated,
            next_continuation_token,
        })
    }

    async fn get(&self, key: &str) -> Result<GetObjectOutput, StorageError> {
        let objects = self.objects.read().await;
        let obj = objects.get(key).ok_or_else(|| StorageError::NotFound {
            path: key.to_string(),
        })?;

        Ok(GetObjectOutput {
            body: obj.data.clone(),
            content_type: obj.content_type.clone(),
            last_modified: obj.created_at,
            etag: format!("\"{}\"", obj.data.len()),
        })
    }

    async fn put(&self, key: &str, data: Bytes, content_type: &str) -> Result<(), StorageError> {
        let mut objects = self.objects.write().await;
        objects.insert(
            key.to_string(),
            StoredObject {
                data,
                content_type: content_type.to_string(),
                created_at: Utc::now(),
            },
        );
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        let mut objects = self.objects.write().await;
        objects.remove(key);
        Ok(())
    }

    async fn presign_get(&self, key: &str, ttl_secs: u64) -> Result<String, StorageError> {
        Ok(format!("memory:///get/{}?expires={}", key, ttl_secs))
    }

    async fn presign_put(
        &self,
        key: &str,
        _content_type: &str,
        ttl_secs: u64,
    ) -> Result<String, StorageError> {
        Ok(format!("memory:///put/{}?expires={}", key, ttl_secs))
    }
}

#[cfg(test)]
impl InMemoryObjectStore {
    pub async fn object_count(&self) -> usize {
        self.objects.read().await.len()
    }

    pub async fn exists(&self, key: &str) -> bool {
        self.objects.read().await.contains_key(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_and_get() {
        let store = InMemoryObjectStore::new();
        let data = Bytes::from(vec![0xAA; 1000]);

        store
            .put("library/clip.mp4", data.clone(), "video/mp4")
            .await
            .unwrap();

        let output = store.get("library/clip.mp4").await.unwrap();
        assert_eq!(output.body, data);
        assert_eq!(output.content_type, "video/mp4");
    }

    #[tokio::test]
    async fn test_get_nonexistent_is_not_found() {
        let store = InMemoryObjectStore::new();
        let err = store.get("nonexistent").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_delete_object() {
        let store = InMemoryObjectStore::new();
        store
            .put("clip.mp4", Bytes::from("data"), "video/mp4")
            .await
            .unwrap();

        assert!(store.exists("clip.mp4").await);
        store.delete("clip.mp4").await.unwrap();
        assert!(!store.exists("clip.mp4").await);
    }

    #[tokio::test]
    async fn test_list_respects_prefix_and_order() {
        let store = InMemoryObjectStore::new();
        for key in ["b/two.mp4", "a/one.mp4", "a/three.mp4"] {
            store
                .put(key, Bytes::from("x"), "video/mp4")
                .await
                .unwrap();
        }

        let page = store.list("a/", 100, None).await.unwrap();
        let keys: Vec<_> = page.entries.iter().map(|e| e.key.as_str()).collect();
        assert_eq!(keys, vec!["a/one.mp4", "a/three.mp4"]);
        assert!(!page.is_truncated);
        assert!(page.next_continuation_token.is_none());
    }

    #[tokio::test]
    async fn test_list_pagination_with_continuation_token() {
        let store = InMemoryObjectStore::new();
        for i in 0..5 {
            store
                .put(&format!("v/{:02}.mp4", i), Bytes::from("x"), "video/mp4")
                .await
                .unwrap();
        }

        let first = store.list("v/", 2, None).await.unwrap();
        assert_eq!(first.entries.len(), 2);
        assert!(first.is_truncated);
        let token = first.next_continuation_token.clone().unwrap();

        let second = store.list("v/", 2, Some(&token)).await.unwrap();
        assert_eq!(second.entries[0].key, "v/02.mp4");
        assert!(second.is_truncated);

        let token = second.next_continuation_token.unwrap();
        let last = store.list("v/", 2, Some(&token)).await.unwrap();
        assert_eq!(last.entries.len(), 1);
        assert!(!last.is_truncated);
        assert!(last.next_continuation_token.is_none());
    }

    #[tokio::test]
    async fn test_presign_urls_embed_key_and_ttl() {
        let store = InMemoryObjectStore::new();
        let url = store.presign_get("a/clip.mp4", 900).await.unwrap();
        assert!(url.contains("a/clip.mp4"));
        assert!(url.contains("900"));

        let url = store.presign_put("a/clip.mp4", "video/mp4", 600).await.unwrap();
        assert!(url.contains("put"));
        assert!(url.contains("600"));
    }
}
