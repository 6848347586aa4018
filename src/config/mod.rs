mod file_config;

pub use file_config::{
    CatalogConfig, FileConfig, LlmConfig, RecommendationsConfig, VideoConfig,
};

use crate::catalog::{SPOTIFY_ACCOUNTS_BASE, SPOTIFY_API_BASE};
use crate::enrichment::YOUTUBE_API_BASE;
use crate::llm::{ApiKeySource, RetryPolicy};
use crate::recommendation::{DEFAULT_BYPASS_PROBABILITY, DEFAULT_CACHE_TTL};
use crate::server::RequestsLoggingLevel;
use anyhow::{bail, Result};
use clap::ValueEnum;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_LLM_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_LLM_MODEL: &str = "gpt-4o-mini";

const DEFAULT_CATALOG_TIMEOUT_SEC: u64 = 20;
const DEFAULT_LLM_TIMEOUT_SEC: u64 = 60;
const DEFAULT_VIDEO_TIMEOUT_SEC: u64 = 10;
const DEFAULT_TOKEN_SAFETY_MARGIN_SEC: u64 = 60;

/// CLI arguments that can be used for config resolution.
/// This struct mirrors the CLI arguments that can be overridden by TOML config.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub db_dir: Option<PathBuf>,
    pub port: u16,
    pub metrics_port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub catalog_api_url: Option<String>,
    pub catalog_accounts_url: Option<String>,
    pub catalog_client_id: Option<String>,
    pub catalog_client_secret: Option<String>,
    pub llm_base_url: Option<String>,
    pub llm_model: Option<String>,
    pub llm_api_key: Option<String>,
    pub llm_api_key_command: Option<String>,
    pub video_api_url: Option<String>,
    pub video_api_key: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    // Core settings
    pub db_dir: PathBuf,
    pub port: u16,
    pub metrics_port: u16,
    pub logging_level: RequestsLoggingLevel,

    pub catalog: CatalogSettings,
    pub llm: LlmSettings,
    /// `None` disables video enrichment.
    pub video: Option<VideoSettings>,
    pub recommendations: RecommendationSettings,
}

#[derive(Debug, Clone)]
pub struct CatalogSettings {
    pub api_url: String,
    pub accounts_url: String,
    pub client_id: String,
    pub client_secret: String,
    pub timeout: Duration,
    pub token_safety_margin: Duration,
}

#[derive(Debug, Clone)]
pub struct LlmSettings {
    pub base_url: String,
    pub model: String,
    pub api_key: ApiKeySource,
    pub timeout: Duration,
    pub temperature: f32,
    pub max_tokens: Option<u32>,
    pub retry: RetryPolicy,
}

#[derive(Debug, Clone)]
pub struct VideoSettings {
    pub api_url: String,
    pub api_key: String,
    pub timeout: Duration,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecommendationSettings {
    /// Songs requested from the generator, and the cap on songs returned.
    pub song_count: usize,
    /// Albums requested from the generator, and the target filled by backfill.
    pub album_count: usize,
    /// Page size for catalog searches.
    pub search_limit: usize,
    pub recently_played_limit: usize,
    /// How many past recommendations feed the exclusion sets.
    pub history_lookback: usize,
    pub cache_ttl: Duration,
    pub cache_bypass_probability: f64,
    pub cache_purge_interval: Duration,
}

impl Default for RecommendationSettings {
    fn default() -> Self {
        Self {
            song_count: 5,
            album_count: 5,
            search_limit: 20,
            recently_played_limit: 50,
            history_lookback: 50,
            cache_ttl: DEFAULT_CACHE_TTL,
            cache_bypass_probability: DEFAULT_BYPASS_PROBABILITY,
            cache_purge_interval: Duration::from_secs(15 * 60),
        }
    }
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and optional TOML file config.
    /// TOML values override CLI values where present.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        let db_dir = file
            .db_dir
            .map(PathBuf::from)
            .or_else(|| cli.db_dir.clone())
            .ok_or_else(|| {
                anyhow::anyhow!("db_dir must be specified via --db-dir or in config file")
            })?;

        if !db_dir.exists() {
            bail!("Database directory does not exist: {:?}", db_dir);
        }
        if !db_dir.is_dir() {
            bail!("db_dir is not a directory: {:?}", db_dir);
        }

        let port = file.port.unwrap_or(cli.port);
        let metrics_port = file.metrics_port.unwrap_or(cli.metrics_port);

        let logging_level = file
            .logging_level
            .and_then(|s| parse_logging_level(&s))
            .unwrap_or_else(|| cli.logging_level.clone());

        let catalog = resolve_catalog(cli, file.catalog.unwrap_or_default())?;
        let llm = resolve_llm(cli, file.llm.unwrap_or_default());
        let video = resolve_video(cli, file.video.unwrap_or_default());
        let recommendations = resolve_recommendations(file.recommendations.unwrap_or_default())?;

        Ok(Self {
            db_dir,
            port,
            metrics_port,
            logging_level,
            catalog,
            llm,
            video,
            recommendations,
        })
    }

    pub fn history_db_path(&self) -> PathBuf {
        self.db_dir.join("history.db")
    }
}

fn resolve_catalog(cli: &CliConfig, file: CatalogConfig) -> Result<CatalogSettings> {
    let client_id = file
        .client_id
        .or_else(|| cli.catalog_client_id.clone())
        .filter(|s| !s.is_empty());
    let client_secret = file
        .client_secret
        .or_else(|| cli.catalog_client_secret.clone())
        .filter(|s| !s.is_empty());
    let (Some(client_id), Some(client_secret)) = (client_id, client_secret) else {
        bail!("Catalog client id and secret must be configured");
    };

    Ok(CatalogSettings {
        api_url: file
            .api_url
            .or_else(|| cli.catalog_api_url.clone())
            .unwrap_or_else(|| SPOTIFY_API_BASE.to_string()),
        accounts_url: file
            .accounts_url
            .or_else(|| cli.catalog_accounts_url.clone())
            .unwrap_or_else(|| SPOTIFY_ACCOUNTS_BASE.to_string()),
        client_id,
        client_secret,
        timeout: Duration::from_secs(file.timeout_sec.unwrap_or(DEFAULT_CATALOG_TIMEOUT_SEC)),
        token_safety_margin: Duration::from_secs(
            file.token_safety_margin_sec
                .unwrap_or(DEFAULT_TOKEN_SAFETY_MARGIN_SEC),
        ),
    })
}

fn resolve_llm(cli: &CliConfig, file: LlmConfig) -> LlmSettings {
    let api_key_command = file
        .api_key_command
        .or_else(|| cli.llm_api_key_command.clone());
    let api_key = file.api_key.or_else(|| cli.llm_api_key.clone());
    let api_key = match (api_key_command, api_key) {
        (Some(command), _) => ApiKeySource::Command(command),
        (None, Some(key)) => ApiKeySource::Static(key),
        (None, None) => ApiKeySource::None,
    };

    let default_retry = RetryPolicy::default();
    LlmSettings {
        base_url: file
            .base_url
            .or_else(|| cli.llm_base_url.clone())
            .unwrap_or_else(|| DEFAULT_LLM_BASE_URL.to_string()),
        model: file
            .model
            .or_else(|| cli.llm_model.clone())
            .unwrap_or_else(|| DEFAULT_LLM_MODEL.to_string()),
        api_key,
        timeout: Duration::from_secs(file.timeout_sec.unwrap_or(DEFAULT_LLM_TIMEOUT_SEC)),
        temperature: file.temperature.unwrap_or(0.7),
        max_tokens: file.max_tokens.or(Some(500)),
        retry: RetryPolicy {
            max_retries: file.max_retries.unwrap_or(default_retry.max_retries),
            initial_backoff_ms: file
                .initial_backoff_ms
                .unwrap_or(default_retry.initial_backoff_ms),
            max_backoff_ms: file.max_backoff_ms.unwrap_or(default_retry.max_backoff_ms),
            backoff_multiplier: file
                .backoff_multiplier
                .unwrap_or(default_retry.backoff_multiplier),
        },
    }
}

fn resolve_video(cli: &CliConfig, file: VideoConfig) -> Option<VideoSettings> {
    let api_key = file
        .api_key
        .or_else(|| cli.video_api_key.clone())
        .filter(|s| !s.is_empty())?;
    Some(VideoSettings {
        api_url: file
            .api_url
            .or_else(|| cli.video_api_url.clone())
            .unwrap_or_else(|| YOUTUBE_API_BASE.to_string()),
        api_key,
        timeout: Duration::from_secs(file.timeout_sec.unwrap_or(DEFAULT_VIDEO_TIMEOUT_SEC)),
    })
}

fn resolve_recommendations(file: RecommendationsConfig) -> Result<RecommendationSettings> {
    let defaults = RecommendationSettings::default();
    let settings = RecommendationSettings {
        song_count: file.song_count.unwrap_or(defaults.song_count),
        album_count: file.album_count.unwrap_or(defaults.album_count),
        search_limit: file.search_limit.unwrap_or(defaults.search_limit),
        recently_played_limit: file
            .recently_played_limit
            .unwrap_or(defaults.recently_played_limit),
        history_lookback: file.history_lookback.unwrap_or(defaults.history_lookback),
        cache_ttl: file
            .cache_ttl_sec
            .map(Duration::from_secs)
            .unwrap_or(defaults.cache_ttl),
        cache_bypass_probability: file
            .cache_bypass_probability
            .unwrap_or(defaults.cache_bypass_probability),
        cache_purge_interval: file
            .cache_purge_interval_sec
            .map(Duration::from_secs)
            .unwrap_or(defaults.cache_purge_interval),
    };

    if !(0.0..=1.0).contains(&settings.cache_bypass_probability) {
        bail!(
            "cache_bypass_probability must be between 0 and 1, got {}",
            settings.cache_bypass_probability
        );
    }
    if settings.search_limit == 0 {
        bail!("search_limit must be greater than 0");
    }
    if settings.cache_purge_interval.is_zero() {
        bail!("cache_purge_interval_sec must be greater than 0");
    }

    Ok(settings)
}

/// Parses a logging level string into RequestsLoggingLevel.
/// Uses clap's ValueEnum trait for parsing.
fn parse_logging_level(s: &str) -> Option<RequestsLoggingLevel> {
    RequestsLoggingLevel::from_str(s, true).ok()
}
