use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::core::config::AdsSettings;

// ---------------------------------------------------------------------------
// Providers and positions
// ---------------------------------------------------------------------------

/// Configured ad network selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdProvider {
    Exoclick,
    Adsterra,
    /// Use both networks; ExoClick's non-null value wins per slot.
    Both,
    None,
}

impl AdProvider {
    /// Parse the config string. Anything unrecognized counts as `None` so a
    /// typo in deployment config fails closed (no ads) rather than open.
    pub fn parse(value: &str) -> Self {
        match value {
            "exoclick" => AdProvider::Exoclick,
            "adsterra" => AdProvider::Adsterra,
            "both" => AdProvider::Both,
            _ => AdProvider::None,
        }
    }
}

/// Playback position of an ad slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AdPosition {
    #[serde(rename = "pre-roll")]
    PreRoll,
    #[serde(rename = "mid-roll")]
    MidRoll,
    #[serde(rename = "post-roll")]
    PostRoll,
}

impl AdPosition {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdPosition::PreRoll => "pre-roll",
            AdPosition::MidRoll => "mid-roll",
            AdPosition::PostRoll => "post-roll",
        }
    }
}

impl fmt::Display for AdPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for AdPosition {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pre-roll" => Ok(AdPosition::PreRoll),
            "mid-roll" => Ok(AdPosition::MidRoll),
            "post-roll" => Ok(AdPosition::PostRoll),
            other => Err(format!("unknown ad position: {}", other)),
        }
    }
}

// ---------------------------------------------------------------------------
// Slot resolution
// ---------------------------------------------------------------------------

/// Resolved VAST tag URLs, up to one per playback position.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdSlots {
    pub pre_roll: Option<String>,
    pub mid_roll: Option<String>,
    pub post_roll: Option<String>,
}

impl AdSlots {
    pub fn url_for(&self, position: AdPosition) -> Option<&str> {
        match position {
            AdPosition::PreRoll => self.pre_roll.as_deref(),
            AdPosition::MidRoll => self.mid_roll.as_deref(),
            AdPosition::PostRoll => self.post_roll.as_deref(),
        }
    }

    fn is_empty(&self) -> bool {
        self.pre_roll.is_none() && self.mid_roll.is_none() && self.post_roll.is_none()
    }
}

/// Resolve the effective ad configuration.
///
/// Returns `None` when ads are globally disabled, the provider is `none` (or
/// unrecognized), or every slot resolves to nothing. With provider `both`,
/// ExoClick's non-null value wins per slot; there is no merging within a
/// single slot.
pub fn resolve_ad_config(settings: &AdsSettings) -> Option<AdSlots> {
    if !settings.enabled {
        return None;
    }

    let slots = match AdProvider::parse(&settings.provider) {
        AdProvider::Exoclick => AdSlots {
            pre_roll: slot(&settings.exoclick_pre_roll),
            mid_roll: slot(&settings.exoclick_mid_roll),
            post_roll: slot(&settings.exoclick_post_roll),
        },
        AdProvider::Adsterra => AdSlots {
            pre_roll: slot(&settings.adsterra_pre_roll),
            mid_roll: slot(&settings.adsterra_mid_roll),
            post_roll: slot(&settings.adsterra_post_roll),
        },
        AdProvider::Both => AdSlots {
            pre_roll: slot(&settings.exoclick_pre_roll).or_else(|| slot(&settings.adsterra_pre_roll)),
            mid_roll: slot(&settings.exoclick_mid_roll).or_else(|| slot(&settings.adsterra_mid_roll)),
            post_roll: slot(&settings.exoclick_post_roll)
                .or_else(|| slot(&settings.adsterra_post_roll)),
        },
        AdProvider::None => return None,
    };

    if slots.is_empty() {
        None
    } else {
        Some(slots)
    }
}

/// True when at least one ad slot is configured and ads are enabled.
pub fn has_ads(settings: &AdsSettings) -> bool {
    resolve_ad_config(settings).is_some()
}

/// A usable VAST tag URL is an absolute http(s) URL.
pub fn is_valid_vast_url(value: &str) -> bool {
    match url::Url::parse(value) {
        Ok(parsed) => matches!(parsed.scheme(), "http" | "https"),
        Err(_) => false,
    }
}

/// Normalize a configured slot value: blank strings count as unset.
fn slot(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
}
