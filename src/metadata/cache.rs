use std::num::NonZeroUsize;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use lru::LruCache;
use tracing::trace;

use crate::core::config::MetadataCacheConfig;
use crate::core::types::VideoMetadataRecord;
use crate::observability::metrics as obs;

// ---------------------------------------------------------------------------
// Metadata LRU cache
// ---------------------------------------------------------------------------

/// A cached metadata record with its insertion time.
#[derive(Debug, Clone)]
struct CacheEntry {
    record: VideoMetadataRecord,
    inserted_at: Instant,
}

impl CacheEntry {
    fn is_expired(&self, ttl: Duration) -> bool {
        self.inserted_at.elapsed() > ttl
    }
}

/// Bounded LRU+TTL cache in front of metadata sidecar reads.
///
/// Listing a page of N videos costs N sidecar GETs without this cache.
/// Writes go through `MetadataStore::upsert`, which re-inserts the fresh
/// record here (write-through invalidation), so a cached entry is never
/// stale relative to writes from this process.
pub struct MetadataCache {
    cache: Mutex<LruCache<String, CacheEntry>>,
    ttl: Duration,
    enabled: bool,
}

impl MetadataCache {
    pub fn new(config: &MetadataCacheConfig) -> Self {
        let cap = NonZeroUsize::new(config.max_entries.max(1))
            .expect("cache capacity must be non-zero");
        Self {
            cache: Mutex::new(LruCache::new(cap)),
            ttl: Duration::from_secs(config.ttl_secs),
            enabled: config.enabled,
        }
    }

    /// Get a record from cache if present and not expired.
    pub fn get(&self, video_key: &str) -> Option<VideoMetadataRecord> {
        if !self.enabled {
            return None;
        }
        let mut cache = self.cache.lock().unwrap_or_else(|e| e.into_inner());

        if let Some(entry) = cache.get(video_key) {
            if entry.is_expired(self.ttl) {
                cache.pop(video_key);
                trace!(video_key, "metadata cache entry expired");
                obs::inc_metadata_cache_miss();
                return None;
            }
            obs::inc_metadata_cache_hit();
            return Some(entry.record.clone());
        }

        obs::inc_metadata_cache_miss();
        None
    }

    /// Insert or refresh a record.
    pub fn put(&self, video_key: &str, record: VideoMetadataRecord) {
        if !self.enabled {
            return;
        }
        let mut cache = self.cache.lock().unwrap_or_else(|e| e.into_inner());
        cache.put(
            video_key.to_string(),
            CacheEntry {
                record,
                inserted_at: Instant::now(),
            },
        );
        obs::set_metadata_cache_entries(cache.len() as f64);
    }

    /// Drop a record (e.g. when an upsert could not be re-read).
    pub fn invalidate(&self, video_key: &str) {
        let mut cache = self.cache.lock().unwrap_or_else(|e| e.into_inner());
        cache.pop(video_key);
    }
}

#[cfg(test)]
impl MetadataCache {
    pub fn entry_count(&self) -> usize {
        self.cache.lock().unwrap().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::collections::BTreeMap;

    fn record(key: &str) -> VideoMetadataRecord {
        VideoMetadataRecord {
            video_key: key.to_string(),
            locales: BTreeMap::new(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn cache(enabled: bool, max_entries: usize, ttl_secs: u64) -> MetadataCache {
        MetadataCache::new(&MetadataCacheConfig {
            enabled,
            max_entries,
            ttl_secs,
        })
    }

    #[test]
    fn test_put_get_invalidate() {
        let cache = cache(true, 10, 300);
        cache.put("a.mp4", record("a.mp4"));
        assert!(cache.get("a.mp4").is_some());
        cache.invalidate("a.mp4");
        assert!(cache.get("a.mp4").is_none());
    }

    #[test]
    fn test_disabled_cache_stores_nothing() {
        let cache = cache(false, 10, 300);
        cache.put("a.mp4", record("a.mp4"));
        assert!(cache.get("a.mp4").is_none());
        assert_eq!(cache.entry_count(), 0);
    }

    #[test]
    fn test_zero_ttl_expires_immediately() {
        let cache = cache(true, 10, 0);
        cache.put("a.mp4", record("a.mp4"));
        std::thread::sleep(Duration::from_millis(5));
        assert!(cache.get("a.mp4").is_none());
    }

    #[test]
    fn test_lru_eviction_at_capacity() {
        let cache = cache(true, 2, 300);
        cache.put("a.mp4", record("a.mp4"));
        cache.put("b.mp4", record("b.mp4"));
        cache.put("c.mp4", record("c.mp4"));
        assert_eq!(cache.entry_count(), 2);
        assert!(cache.get("a.mp4").is_none());
        assert!(cache.get("c.mp4").is_some());
    }
}
