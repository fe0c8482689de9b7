use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Locales
// ---------------------------------------------------------------------------

/// A supported catalog locale.
///
/// The variant order is the canonical declaration order: it drives the
/// fallback search when a listing request does not pin a locale, and the
/// ordering of `available_locales` in resolved views.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    Zh,
    En,
    Es,
    Ko,
    Ja,
    Fr,
    Ar,
}

/// All supported locales, in declaration order.
pub const SUPPORTED_LOCALES: [Locale; 7] = [
    Locale::Zh,
    Locale::En,
    Locale::Es,
    Locale::Ko,
    Locale::Ja,
    Locale::Fr,
    Locale::Ar,
];

impl Locale {
    pub fn as_str(&self) -> &'static str {
        match self {
            Locale::Zh => "zh",
            Locale::En => "en",
            Locale::Es => "es",
            Locale::Ko => "ko",
            Locale::Ja => "ja",
            Locale::Fr => "fr",
            Locale::Ar => "ar",
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Locale {
    type Err = UnknownLocale;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SUPPORTED_LOCALES
            .iter()
            .copied()
            .find(|l| l.as_str() == s)
            .ok_or_else(|| UnknownLocale {
                value: s.to_string(),
            })
    }
}

/// Returned when a locale string is not in the supported set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownLocale {
    pub value: String,
}

impl fmt::Display for UnknownLocale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown locale: {}", self.value)
    }
}

impl std::error::Error for UnknownLocale {}

// ---------------------------------------------------------------------------
// Video metadata records
// ---------------------------------------------------------------------------

/// Per-locale display fields for one video.
///
/// An entry with an empty `title` means "no content for this locale yet";
/// that is distinct from the locale key being absent from a partially
/// written record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocaleEntry {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_url: Option<String>,
}

impl LocaleEntry {
    /// True when this locale carries displayable content.
    pub fn has_title(&self) -> bool {
        !self.title.trim().is_empty()
    }
}

/// The metadata sidecar document stored next to a video object.
///
/// Wire and storage form is camelCase JSON, one document per video. Once a
/// record exists it carries an entry for every supported locale (empty
/// entries for locales that were never edited).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoMetadataRecord {
    pub video_key: String,
    pub locales: BTreeMap<Locale, LocaleEntry>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl VideoMetadataRecord {
    /// Locale codes with a non-empty title, in declaration order.
    pub fn available_locales(&self) -> Vec<Locale> {
        SUPPORTED_LOCALES
            .iter()
            .copied()
            .filter(|l| self.locales.get(l).is_some_and(LocaleEntry::has_title))
            .collect()
    }

    /// First locale (declaration order) whose entry has a non-empty title.
    pub fn first_locale_with_title(&self) -> Option<Locale> {
        SUPPORTED_LOCALES
            .iter()
            .copied()
            .find(|l| self.locales.get(l).is_some_and(LocaleEntry::has_title))
    }
}

// ---------------------------------------------------------------------------
// Resolved catalog views
// ---------------------------------------------------------------------------

/// A locale-resolved, display-ready catalog entry. Ephemeral: built per
/// request, never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedVideoView {
    pub key: String,
    pub size: u64,
    pub last_modified: DateTime<Utc>,
    /// Resolved display title; never empty (falls back to a filename-derived
    /// string, then to a fixed placeholder).
    pub title: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_url: Option<String>,
    /// Locales with a non-empty title, in declaration order.
    pub available_locales: Vec<Locale>,
}

// ---------------------------------------------------------------------------
// Interactions
// ---------------------------------------------------------------------------

/// Post-toggle like state for one video.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LikeState {
    pub liked: bool,
    pub count: usize,
}

/// A single comment on a video.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentRecord {
    pub id: String,
    pub video_key: String,
    pub user_id: String,
    pub username: String,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_locale_round_trip() {
        for locale in SUPPORTED_LOCALES {
            assert_eq!(locale.as_str().parse::<Locale>().unwrap(), locale);
        }
    }

    #[test]
    fn test_unknown_locale_rejected() {
        assert!("de".parse::<Locale>().is_err());
        assert!("".parse::<Locale>().is_err());
        assert!("EN".parse::<Locale>().is_err());
    }

    #[test]
    fn test_locale_serde_lowercase() {
        assert_eq!(serde_json::to_string(&Locale::Zh).unwrap(), "\"zh\"");
        let parsed: Locale = serde_json::from_str("\"ko\"").unwrap();
        assert_eq!(parsed, Locale::Ko);
    }

    #[test]
    fn test_available_locales_declaration_order() {
        let mut locales = BTreeMap::new();
        locales.insert(
            Locale::Fr,
            LocaleEntry {
                title: "Titre".to_string(),
                ..Default::default()
            },
        );
        locales.insert(
            Locale::Zh,
            LocaleEntry {
                title: "标题".to_string(),
                ..Default::default()
            },
        );
        locales.insert(Locale::En, LocaleEntry::default());
        let record = VideoMetadataRecord {
            video_key: "a.mp4".to_string(),
            locales,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        assert_eq!(record.available_locales(), vec![Locale::Zh, Locale::Fr]);
        assert_eq!(record.first_locale_with_title(), Some(Locale::Zh));
    }

    #[test]
    fn test_whitespace_title_is_not_content() {
        let entry = LocaleEntry {
            title: "   ".to_string(),
            ..Default::default()
        };
        assert!(!entry.has_title());
    }

    #[test]
    fn test_metadata_record_camel_case_wire_form() {
        let mut locales = BTreeMap::new();
        locales.insert(
            Locale::En,
            LocaleEntry {
                title: "Episode One".to_string(),
                description: String::new(),
                cover_url: Some("covers/a.mp4-en.jpg".to_string()),
            },
        );
        let record = VideoMetadataRecord {
            video_key: "a.mp4".to_string(),
            locales,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let json = serde_json::to_value(&record).unwrap();
        assert!(json.get("videoKey").is_some());
        assert!(json.get("createdAt").is_some());
        assert!(json["locales"]["en"].get("coverUrl").is_some());
    }
}
