use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, level_filters::LevelFilter, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use moodmix_server::catalog::{CatalogClientConfig, SpotifyCatalogClient};
use moodmix_server::config::{AppConfig, CliConfig, FileConfig};
use moodmix_server::enrichment::{VideoFinder, YouTubeClient};
use moodmix_server::history::{HistoryStore, SqliteHistoryStore};
use moodmix_server::llm::{CompletionOptions, LlmProvider, OpenAIProvider, RetryingProvider};
use moodmix_server::recommendation::{
    RecommendationCache, RecommendationEngine, SuggestionGenerator, ThreadRandom,
};
use moodmix_server::server::{self, run_server, RequestsLoggingLevel, ServerConfig};

fn parse_path(s: &str) -> Result<PathBuf> {
    let path_buf = PathBuf::from(s);
    let original_path = match path_buf.canonicalize() {
        Ok(path) => path,
        Err(msg) => {
            if msg.kind() == std::io::ErrorKind::NotFound {
                path_buf
            } else {
                return Err(msg).with_context(|| format!("Error resolving path: {}", s));
            }
        }
    };
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir()?;
    Ok(cwd.join(original_path))
}

#[derive(Parser, Debug)]
struct CliArgs {
    /// Path to a TOML config file. Values in the file override CLI arguments.
    #[clap(long, value_parser = parse_path)]
    pub config: Option<PathBuf>,

    /// Directory holding the history database.
    #[clap(long, value_parser = parse_path)]
    pub db_dir: Option<PathBuf>,

    /// The port to listen on.
    #[clap(short, long, default_value_t = 3001)]
    pub port: u16,

    /// The port for the metrics server (Prometheus scraping).
    #[clap(long, default_value_t = 9091)]
    pub metrics_port: u16,

    /// The level of logging to perform on each request.
    #[clap(long, default_value = "path")]
    pub logging_level: RequestsLoggingLevel,

    /// Base URL of the catalog Web API.
    #[clap(long)]
    pub catalog_api_url: Option<String>,

    /// Base URL of the catalog accounts service issuing app tokens.
    #[clap(long)]
    pub catalog_accounts_url: Option<String>,

    #[clap(long, env = "CATALOG_CLIENT_ID", hide_env_values = true)]
    pub catalog_client_id: Option<String>,

    #[clap(long, env = "CATALOG_CLIENT_SECRET", hide_env_values = true)]
    pub catalog_client_secret: Option<String>,

    /// Base URL of the OpenAI-compatible completion API.
    #[clap(long)]
    pub llm_base_url: Option<String>,

    #[clap(long)]
    pub llm_model: Option<String>,

    #[clap(long, env = "LLM_API_KEY", hide_env_values = true)]
    pub llm_api_key: Option<String>,

    /// Shell command printing the completion API key.
    #[clap(long, env = "LLM_API_KEY_COMMAND")]
    pub llm_api_key_command: Option<String>,

    /// Base URL of the video search API.
    #[clap(long)]
    pub video_api_url: Option<String>,

    /// Video search API key. Enrichment is disabled when unset.
    #[clap(long, env = "VIDEO_API_KEY", hide_env_values = true)]
    pub video_api_key: Option<String>,
}

impl CliArgs {
    fn to_cli_config(&self) -> CliConfig {
        CliConfig {
            db_dir: self.db_dir.clone(),
            port: self.port,
            metrics_port: self.metrics_port,
            logging_level: self.logging_level.clone(),
            catalog_api_url: self.catalog_api_url.clone(),
            catalog_accounts_url: self.catalog_accounts_url.clone(),
            catalog_client_id: self.catalog_client_id.clone(),
            catalog_client_secret: self.catalog_client_secret.clone(),
            llm_base_url: self.llm_base_url.clone(),
            llm_model: self.llm_model.clone(),
            llm_api_key: self.llm_api_key.clone(),
            llm_api_key_command: self.llm_api_key_command.clone(),
            video_api_url: self.video_api_url.clone(),
            video_api_key: self.video_api_key.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()
        .context("Failed to initialize logging")?;

    let file_config = match &cli_args.config {
        Some(path) => {
            info!("Loading config from {:?}...", path);
            Some(FileConfig::load(path)?)
        }
        None => None,
    };
    let config = AppConfig::resolve(&cli_args.to_cli_config(), file_config)?;

    info!("Initializing metrics...");
    server::metrics::init_metrics();

    let history_db_path = config.history_db_path();
    info!("Opening history database at {:?}...", history_db_path);
    let history: Arc<dyn HistoryStore> = Arc::new(SqliteHistoryStore::new(&history_db_path)?);

    let catalog = Arc::new(
        SpotifyCatalogClient::new(CatalogClientConfig {
            api_base_url: config.catalog.api_url.clone(),
            accounts_base_url: config.catalog.accounts_url.clone(),
            client_id: config.catalog.client_id.clone(),
            client_secret: config.catalog.client_secret.clone(),
            timeout: config.catalog.timeout,
            token_safety_margin: config.catalog.token_safety_margin,
        })
        .context("Failed to create catalog client")?,
    );
    info!("Catalog client configured at {}", config.catalog.api_url);

    let videos: Option<Arc<dyn VideoFinder>> = match &config.video {
        Some(video) => {
            info!("Video enrichment enabled via {}", video.api_url);
            Some(Arc::new(
                YouTubeClient::new(&video.api_url, &video.api_key, video.timeout)
                    .context("Failed to create video client")?,
            ))
        }
        None => {
            info!("Video enrichment disabled");
            None
        }
    };

    let provider = Arc::new(OpenAIProvider::new(
        &config.llm.base_url,
        &config.llm.model,
        config.llm.api_key.clone(),
    ));
    let provider: Arc<dyn LlmProvider> =
        Arc::new(RetryingProvider::new(provider, config.llm.retry.clone()));
    match provider.health_check().await {
        Ok(()) => info!(
            "Generation backend reachable: {} ({})",
            provider.name(),
            provider.model()
        ),
        Err(e) => warn!("Generation backend health check failed: {}", e),
    }
    let generator = SuggestionGenerator::new(
        provider,
        CompletionOptions {
            temperature: config.llm.temperature,
            max_tokens: config.llm.max_tokens,
            timeout: config.llm.timeout,
        },
    );

    let settings = config.recommendations.clone();
    let cache = Arc::new(RecommendationCache::new(
        settings.cache_ttl,
        settings.cache_bypass_probability,
        Arc::new(ThreadRandom),
    ));
    let engine = Arc::new(RecommendationEngine::new(
        catalog,
        videos,
        generator,
        cache.clone(),
        history.clone(),
        settings.clone(),
    ));

    let purge_interval = settings.cache_purge_interval;
    info!(
        "Cache entries live {}s, purged every {}s",
        settings.cache_ttl.as_secs(),
        purge_interval.as_secs()
    );
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(purge_interval);

        // Skip the first immediate tick, wait for the first interval
        ticker.tick().await;

        loop {
            ticker.tick().await;

            let purged = cache.purge_expired();
            if purged > 0 {
                info!("Purged {} expired recommendation cache entries", purged);
            }
        }
    });

    let server_config = ServerConfig {
        requests_logging_level: config.logging_level.clone(),
        port: config.port,
        metrics_port: config.metrics_port,
        ..ServerConfig::default()
    };

    info!("Starting server on port {}...", config.port);
    run_server(server_config, engine, history).await
}
