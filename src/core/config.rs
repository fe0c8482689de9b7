use serde::{Deserialize, Serialize};
use std::path::Path;

/// Top-level application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub metadata_cache: MetadataCacheConfig,
    pub admin: AdminConfig,
    pub ads: AdsSettings,
    pub observability: ObservabilityConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors_allowed_origins: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// "memory" for development/tests, "s3" for R2/MinIO/AWS.
    pub backend: String,
    pub endpoint: String,
    pub bucket: String,
    pub access_key_id: String,
    pub secret_access_key: String,
    pub region: String,
    #[serde(default)]
    pub path_style: bool,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_request_timeout_secs() -> u64 {
    30
}

/// Bounded cache in front of metadata sidecar reads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetadataCacheConfig {
    pub enabled: bool,
    pub max_entries: usize,
    pub ttl_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminConfig {
    /// Empty string disables admin login entirely.
    pub password: String,
    pub session_ttl_secs: u64,
}

/// Ad slot configuration. Slot URLs are VAST tag URLs; a missing value means
/// the slot is not served.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdsSettings {
    pub enabled: bool,
    /// "exoclick" | "adsterra" | "both" | "none"
    pub provider: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exoclick_pre_roll: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exoclick_mid_roll: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exoclick_post_roll: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub adsterra_pre_roll: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub adsterra_mid_roll: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub adsterra_post_roll: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    pub log_level: String,
    pub log_format: String,
    pub metrics_enabled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub max_json_body_bytes: usize,
    #[serde(default)]
    pub brute_force_max_attempts: u32,
    #[serde(default)]
    pub brute_force_window_secs: u64,
    #[serde(default)]
    pub brute_force_block_secs: u64,
}

impl AppConfig {
    /// Load configuration with layered overrides:
    /// 1. config/default.toml
    /// 2. config/{env}.toml (based on REELSHELF_ENV)
    /// 3. Environment variables (REELSHELF_* prefix)
    pub fn load() -> anyhow::Result<Self> {
        let default_path = Path::new("config/default.toml");
        let default_content = std::fs::read_to_string(default_path)
            .map_err(|e| anyhow::anyhow!("failed to read {}: {}", default_path.display(), e))?;

        let mut config: AppConfig = toml::from_str(&default_content)
            .map_err(|e| anyhow::anyhow!("failed to parse {}: {}", default_path.display(), e))?;

        // Layer 2: environment-specific overrides
        let env_name =
            std::env::var("REELSHELF_ENV").unwrap_or_else(|_| "development".to_string());
        let env_path = format!("config/{}.toml", env_name);
        if let Ok(env_content) = std::fs::read_to_string(&env_path) {
            let env_config: AppConfig = toml::from_str(&env_content)
                .map_err(|e| anyhow::anyhow!("failed to parse {}: {}", env_path, e))?;
            config = env_config;
        }

        // Layer 3: environment variable overrides (selected keys)
        Self::apply_env_overrides(&mut config);

        Ok(config)
    }

    fn apply_env_overrides(config: &mut AppConfig) {
        if let Ok(v) = std::env::var("REELSHELF_SERVER_HOST") {
            config.server.host = v;
        }
        if let Ok(v) = std::env::var("REELSHELF_SERVER_PORT") {
            if let Ok(port) = v.parse() {
                config.server.port = port;
            }
        }
        if let Ok(v) = std::env::var("REELSHELF_STORAGE_BACKEND") {
            config.storage.backend = v;
        }
        if let Ok(v) = std::env::var("REELSHELF_STORAGE_ENDPOINT") {
            config.storage.endpoint = v;
        }
        if let Ok(v) = std::env::var("REELSHELF_STORAGE_BUCKET") {
            config.storage.bucket = v;
        }
        if let Ok(v) = std::env::var("REELSHELF_STORAGE_ACCESS_KEY_ID") {
            config.storage.access_key_id = v;
        }
        if let Ok(v) = std::env::var("REELSHELF_STORAGE_SECRET_ACCESS_KEY") {
            config.storage.secret_access_key = v;
        }
        if let Ok(v) = std::env::var("REELSHELF_STORAGE_REGION") {
            config.storage.region = v;
        }
        if let Ok(v) = std::env::var("REELSHELF_ADMIN_PASSWORD") {
            config.admin.password = v;
        }
        if let Ok(v) = std::env::var("REELSHELF_ADS_ENABLED") {
            config.ads.enabled = v == "true" || v == "1";
        }
        if let Ok(v) = std::env::var("REELSHELF_AD_PROVIDER") {
            config.ads.provider = v;
        }
        if let Ok(v) = std::env::var("REELSHELF_VAST_EXOCLICK_PRE_ROLL") {
            config.ads.exoclick_pre_roll = Some(v);
        }
        if let Ok(v) = std::env::var("REELSHELF_VAST_EXOCLICK_MID_ROLL") {
            config.ads.exoclick_mid_roll = Some(v);
        }
        if let Ok(v) = std::env::var("REELSHELF_VAST_EXOCLICK_POST_ROLL") {
            config.ads.exoclick_post_roll = Some(v);
        }
        if let Ok(v) = std::env::var("REELSHELF_VAST_ADSTERRA_PRE_ROLL") {
            config.ads.adsterra_pre_roll = Some(v);
        }
        if let Ok(v) = std::env::var("REELSHELF_VAST_ADSTERRA_MID_ROLL") {
            config.ads.adsterra_mid_roll = Some(v);
        }
        if let Ok(v) = std::env::var("REELSHELF_VAST_ADSTERRA_POST_ROLL") {
            config.ads.adsterra_post_roll = Some(v);
        }
        if let Ok(v) = std::env::var("REELSHELF_OBSERVABILITY_LOG_LEVEL") {
            config.observability.log_level = v;
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8080,
                cors_allowed_origins: vec!["*".to_string()],
            },
            storage: StorageConfig {
                backend: "memory".to_string(),
                endpoint: "http://localhost:9000".to_string(),
                bucket: "reelshelf-media".to_string(),
                access_key_id: String::new(),
                secret_access_key: String::new(),
                region: "auto".to_string(),
                path_style: true,
                request_timeout_secs: 30,
            },
            metadata_cache: MetadataCacheConfig {
                enabled: true,
                max_entries: 10_000,
                ttl_secs: 300,
            },
            admin: AdminConfig {
                password: String::new(),
                session_ttl_secs: 604_800, // 7 days
            },
            ads: AdsSettings {
                enabled: false,
                provider: "none".to_string(),
                exoclick_pre_roll: None,
                exoclick_mid_roll: None,
                exoclick_post_roll: None,
                adsterra_pre_roll: None,
                adsterra_mid_roll: None,
                adsterra_post_roll: None,
            },
            observability: ObservabilityConfig {
                log_level: "info".to_string(),
                log_format: "json".to_string(),
                metrics_enabled: true,
            },
            security: SecurityConfig {
                max_json_body_bytes: 10_485_760, // 10 MB, covers base64 cover uploads
                brute_force_max_attempts: 5,
                brute_force_window_secs: 60,
                brute_force_block_secs: 300,
            },
        }
    }
}
