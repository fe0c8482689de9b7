use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::error::CatalogError;
use crate::core::security::{DEFAULT_LIST_KEYS, MAX_LIST_KEYS};
use crate::core::types::{Locale, ResolvedVideoView, VideoMetadataRecord};
use crate::metadata::MetadataStore;
use crate::storage::{ObjectInfo, ObjectStore};

// ---------------------------------------------------------------------------
// Video file detection
// ---------------------------------------------------------------------------

/// Allow-list of video container extensions. Anything else in the bucket
/// (metadata sidecars, covers, stray uploads) must never surface as a
/// playable entry.
pub const VIDEO_EXTENSIONS: [&str; 7] = [
    ".mp4", ".webm", ".ogg", ".mov", ".avi", ".mkv", ".m3u8",
];

/// Display title used when a key yields no usable filename stem.
pub const PLACEHOLDER_TITLE: &str = "Untitled video";

/// True when a key's lowercased suffix matches the video allow-list.
pub fn is_video_key(key: &str) -> bool {
    if key.is_empty() {
        return false;
    }
    let lower = key.to_lowercase();
    VIDEO_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
}

/// Derive a display title from a key: strip directory components and the
/// final extension; fall back to a fixed placeholder if nothing remains.
pub fn fallback_title(key: &str) -> String {
    let filename = key.rsplit('/').next().unwrap_or("");
    let stem = match filename.rfind('.') {
        Some(idx) => &filename[..idx],
        None => filename,
    };
    if stem.trim().is_empty() {
        PLACEHOLDER_TITLE.to_string()
    } else {
        stem.to_string()
    }
}

// ---------------------------------------------------------------------------
// Query and result types
// ---------------------------------------------------------------------------

/// Listing query. Also the HTTP query-string shape (camelCase).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VideoListQuery {
    pub prefix: Option<String>,
    /// Case-insensitive substring title search.
    pub title: Option<String>,
    pub max_keys: Option<i64>,
    pub continuation_token: Option<String>,
    /// Raw locale code; validated against the supported set.
    pub locale: Option<String>,
}

/// One page of locale-resolved catalog entries.
///
/// `is_truncated` / `next_continuation_token` pass the object store's own
/// pagination signal through unmodified: a title search can filter a page
/// down without claiming the listing is complete, and it makes no promise
/// about matches on later pages either.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PagedVideos {
    pub videos: Vec<ResolvedVideoView>,
    pub is_truncated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_continuation_token: Option<String>,
    pub key_count: usize,
}

// ---------------------------------------------------------------------------
// VideoAggregator
// ---------------------------------------------------------------------------

/// Merges raw object listings with per-locale metadata into a
/// locale-resolved, searchable, paginated catalog view. Read-only; every
/// call is one store LIST plus one metadata batch fetch.
pub struct VideoAggregator {
    store: Arc<dyn ObjectStore>,
    metadata: Arc<MetadataStore>,
}

impl VideoAggregator {
    pub fn new(store: Arc<dyn ObjectStore>, metadata: Arc<MetadataStore>) -> Self {
        Self { store, metadata }
    }

    /// List one page of the catalog.
    ///
    /// Locale semantics: with `locale=L`, a video whose `L` entry is missing
    /// or has an empty title is excluded outright. "Untitled in this locale"
    /// means the video does not belong to that locale's catalog, and is
    /// never weakened to a filename fallback. Without a locale, the
    /// first locale in declaration order with a non-empty title wins, and
    /// only then does the filename-derived fallback apply.
    pub async fn list_videos(&self, query: &VideoListQuery) -> Result<PagedVideos, CatalogError> {
        let max_keys = match query.max_keys {
            None => DEFAULT_LIST_KEYS,
            Some(n) if (1..=MAX_LIST_KEYS as i64).contains(&n) => n as u32,
            Some(n) => {
                return Err(CatalogError::Validation {
                    field: "maxKeys",
                    reason: format!("must be between 1 and {}, got {}", MAX_LIST_KEYS, n),
                })
            }
        };

        let locale = match query.locale.as_deref() {
            None => None,
            Some(raw) => Some(raw.parse::<Locale>().map_err(|e| {
                CatalogError::Validation {
                    field: "locale",
                    reason: e.to_string(),
                }
            })?),
        };

        // A failed LIST is structural: without the raw listing there is
        // nothing to paginate, so this is a hard error, never an empty page.
        let page = self
            .store
            .list(
                query.prefix.as_deref().unwrap_or(""),
                max_keys,
                query.continuation_token.as_deref(),
            )
            .await
            .map_err(|e| CatalogError::UpstreamUnavailable {
                reason: e.to_string(),
            })?;

        let entries: Vec<ObjectInfo> = page
            .entries
            .into_iter()
            .filter(|entry| is_video_key(&entry.key))
            .collect();

        // Metadata failures are cosmetic: per-key fetch errors come back as
        // absence and the affected videos render with filename titles.
        let keys: Vec<String> = entries.iter().map(|e| e.key.clone()).collect();
        let metadata_map = self.metadata.get_batch(&keys).await;

        let mut videos = Vec::with_capacity(entries.len());
        for entry in entries {
            let record = metadata_map.get(entry.key.as_str());
            if let Some(view) = resolve_view(entry, record, locale) {
                videos.push(view);
            }
        }

        if let Some(term) = query.title.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            let needle = term.to_lowercase();
            videos.retain(|video| matches_search(video, &metadata_map, &needle));
        }

        debug!(
            count = videos.len(),
            is_truncated = page.is_truncated,
            "catalog page resolved"
        );

        Ok(PagedVideos {
            key_count: videos.len(),
            videos,
            is_truncated: page.is_truncated,
            next_continuation_token: page.next_continuation_token,
        })
    }
}

/// Resolve display fields for one listed object. Returns `None` when the
/// strict locale filter excludes the video.
fn resolve_view(
    entry: ObjectInfo,
    record: Option<&VideoMetadataRecord>,
    locale: Option<Locale>,
) -> Option<ResolvedVideoView> {
    let available_locales = record.map(|r| r.available_locales()).unwrap_or_default();

    let (title, description, cover_url) = match locale {
        Some(requested) => {
            let locale_entry = record?.locales.get(&requested)?;
            if !locale_entry.has_title() {
                return None;
            }
            (
                locale_entry.title.trim().to_string(),
                locale_entry.description.trim().to_string(),
                locale_entry.cover_url.clone(),
            )
        }
        None => match record.and_then(|r| {
            r.first_locale_with_title()
                .and_then(|l| r.locales.get(&l))
        }) {
            Some(locale_entry) => (
                locale_entry.title.trim().to_string(),
                locale_entry.description.trim().to_string(),
                locale_entry.cover_url.clone(),
            ),
            None => (fallback_title(&entry.key), String::new(), None),
        },
    };

    Some(ResolvedVideoView {
        key: entry.key,
        size: entry.size,
        last_modified: entry.last_modified,
        title,
        description,
        cover_url,
        available_locales,
    })
}

/// Case-insensitive substring match over every available-locale title, the
/// resolved display title, and the raw key.
fn matches_search(
    video: &ResolvedVideoView,
    metadata: &HashMap<String, VideoMetadataRecord>,
    needle: &str,
) -> bool {
    if let Some(record) = metadata.get(&video.key) {
        for locale in &video.available_locales {
            if let Some(entry) = record.locales.get(locale) {
                if entry.title.to_lowercase().contains(needle) {
                    return true;
                }
            }
        }
    }
    video.title.to_lowercase().contains(needle) || video.key.to_lowercase().contains(needle)
}
