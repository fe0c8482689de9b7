pub mod cache;

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use bytes::Bytes;
use chrono::Utc;
use dashmap::DashMap;
use futures::future::join_all;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::core::config::MetadataCacheConfig;
use crate::core::error::MetadataError;
use crate::core::types::{Locale, LocaleEntry, VideoMetadataRecord, SUPPORTED_LOCALES};
use crate::storage::ObjectStore;

use self::cache::MetadataCache;

// ---------------------------------------------------------------------------
// Sidecar key derivation
// ---------------------------------------------------------------------------

/// Suffix appended to a video key to derive its metadata sidecar key.
pub const METADATA_SUFFIX: &str = ".metadata.json";

/// The object key of a video's metadata sidecar.
pub fn metadata_key(video_key: &str) -> String {
    format!("{}{}", video_key, METADATA_SUFFIX)
}

/// Fields of one locale edit. An absent `cover_url` leaves any previously
/// stored cover in place (merge, not overwrite).
#[derive(Debug, Clone, Default)]
pub struct MetadataPatch {
    pub title: String,
    pub description: String,
    pub cover_url: Option<String>,
}

// ---------------------------------------------------------------------------
// MetadataStore
// ---------------------------------------------------------------------------

/// Per-locale video metadata persisted as one JSON sidecar per video, in the
/// same bucket as the videos themselves. No separate database.
///
/// `upsert` is a read-modify-write; concurrent upserts to the same video are
/// serialized by a per-key async mutex so a slow writer cannot clobber a
/// faster one. Different keys proceed in parallel.
pub struct MetadataStore {
    store: Arc<dyn ObjectStore>,
    cache: MetadataCache,
    key_locks: DashMap<String, Arc<Mutex<()>>>,
}

impl MetadataStore {
    pub fn new(store: Arc<dyn ObjectStore>, cache_config: &MetadataCacheConfig) -> Self {
        Self {
            store,
            cache: MetadataCache::new(cache_config),
            key_locks: DashMap::new(),
        }
    }

    /// Fetch the metadata record for one video. Absence of the sidecar is a
    /// normal outcome (`None`), not an error.
    pub async fn get(
        &self,
        video_key: &str,
    ) -> Result<Option<VideoMetadataRecord>, MetadataError> {
        if let Some(record) = self.cache.get(video_key) {
            return Ok(Some(record));
        }

        let sidecar = metadata_key(video_key);
        let output = match self.store.get(&sidecar).await {
            Ok(output) => output,
            Err(e) if e.is_not_found() => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let record: VideoMetadataRecord =
            serde_json::from_slice(&output.body).map_err(|e| MetadataError::Deserialize {
                key: sidecar,
                reason: e.to_string(),
            })?;

        self.cache.put(video_key, record.clone());
        Ok(Some(record))
    }

    /// Create or update the record for one video, editing a single locale.
    ///
    /// Creation initializes every supported locale with an empty entry and
    /// then overwrites the target locale. Updates replace the target
    /// locale's title and description; `cover_url` is merged (an absent
    /// value never erases a stored cover). `updated_at` is bumped on every
    /// call.
    pub async fn upsert(
        &self,
        video_key: &str,
        locale: Locale,
        patch: MetadataPatch,
    ) -> Result<VideoMetadataRecord, MetadataError> {
        let lock = self
            .key_locks
            .entry(video_key.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let _guard = lock.lock().await;

        let now = Utc::now();
        let record = match self.fetch_uncached(video_key).await? {
            Some(mut existing) => {
                let entry = existing.locales.entry(locale).or_default();
                entry.title = patch.title;
                entry.description = patch.description;
                if let Some(cover_url) = patch.cover_url {
                    entry.cover_url = Some(cover_url);
                }
                existing.updated_at = now;
                existing
            }
            None => {
                let mut locales = BTreeMap::new();
                for l in SUPPORTED_LOCALES {
                    locales.insert(l, LocaleEntry::default());
                }
                locales.insert(
                    locale,
                    LocaleEntry {
                        title: patch.title,
                        description: patch.description,
                        cover_url: patch.cover_url,
                    },
                );
                VideoMetadataRecord {
                    video_key: video_key.to_string(),
                    locales,
                    created_at: now,
                    updated_at: now,
                }
            }
        };

        let sidecar = metadata_key(video_key);
        let json =
            serde_json::to_vec_pretty(&record).map_err(|e| MetadataError::Serialize {
                key: sidecar.clone(),
                reason: e.to_string(),
            })?;

        self.store
            .put(&sidecar, Bytes::from(json), "application/json")
            .await?;

        self.cache.put(video_key, record.clone());
        debug!(video_key, locale = %locale, "metadata sidecar saved");
        Ok(record)
    }

    /// Fetch records for many videos concurrently.
    ///
    /// Keys with no sidecar are simply absent from the result; a failed
    /// individual fetch is logged and likewise treated as absence. The batch
    /// never fails as a whole, so a degraded metadata backend cannot take a
    /// listing down with it.
    pub async fn get_batch(
        &self,
        video_keys: &[String],
    ) -> HashMap<String, VideoMetadataRecord> {
        let fetches = video_keys.iter().map(|key| async move {
            match self.get(key).await {
                Ok(Some(record)) => Some((key.clone(), record)),
                Ok(None) => None,
                Err(e) => {
                    warn!(video_key = %key, error = %e, "metadata fetch failed, treating as absent");
                    None
                }
            }
        });

        join_all(fetches).await.into_iter().flatten().collect()
    }

    /// Uncached read, used inside the upsert critical section so the merge
    /// always starts from the stored document.
    async fn fetch_uncached(
        &self,
        video_key: &str,
    ) -> Result<Option<VideoMetadataRecord>, MetadataError> {
        let sidecar = metadata_key(video_key);
        let output = match self.store.get(&sidecar).await {
            Ok(output) => output,
            Err(e) if e.is_not_found() => return Ok(None),
            Err(e) => {
                self.cache.invalidate(video_key);
                return Err(e.into());
            }
        };

        let record: VideoMetadataRecord =
            serde_json::from_slice(&output.body).map_err(|e| MetadataError::Deserialize {
                key: sidecar,
                reason: e.to_string(),
            })?;
        Ok(Some(record))
    }
}
