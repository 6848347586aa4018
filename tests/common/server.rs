//! Test server lifecycle management
//!
//! Each test gets an isolated server with its own history database and its
//! own fake upstreams.

use super::constants::*;
use super::fake_services::FakeUpstreams;
use moodmix_server::catalog::{CatalogClientConfig, SpotifyCatalogClient};
use moodmix_server::config::RecommendationSettings;
use moodmix_server::enrichment::{VideoFinder, YouTubeClient};
use moodmix_server::history::{HistoryStore, SqliteHistoryStore};
use moodmix_server::llm::{
    ApiKeySource, CompletionOptions, LlmProvider, OpenAIProvider, RetryPolicy, RetryingProvider,
};
use moodmix_server::recommendation::{
    RandomSource, RecommendationCache, RecommendationEngine, SuggestionGenerator,
};
use moodmix_server::server::{make_app, RequestsLoggingLevel, ServerConfig};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::net::TcpListener;

/// Draws above any bypass probability below 1, so cached entries are always served.
struct NeverBypass;

impl RandomSource for NeverBypass {
    fn next_f64(&self) -> f64 {
        1.0
    }
}

/// Test server instance with isolated database and upstreams
///
/// When dropped, the server gracefully shuts down and temp resources are cleaned up.
pub struct TestServer {
    /// Base URL for making requests (e.g., "http://127.0.0.1:12345")
    pub base_url: String,

    /// The port the server is listening on
    pub port: u16,

    /// Fakes of the catalog, generation and video services
    pub upstreams: FakeUpstreams,

    /// History store for direct database access in tests
    pub history: Arc<dyn HistoryStore>,

    // Private fields - keep resources alive until drop
    _temp_db_dir: TempDir,
    _shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
}

impl TestServer {
    /// Spawns a new test server on a random port
    ///
    /// Returns two songs and two albums per recommendation, enriches songs
    /// with videos and never bypasses the cache.
    pub async fn spawn() -> Self {
        let upstreams = FakeUpstreams::spawn().await;

        let temp_db_dir = TempDir::new().expect("Failed to create temp dir");
        let history: Arc<dyn HistoryStore> = Arc::new(
            SqliteHistoryStore::new(temp_db_dir.path().join("history.db"))
                .expect("Failed to open history store"),
        );

        let catalog = Arc::new(
            SpotifyCatalogClient::new(CatalogClientConfig {
                api_base_url: upstreams.base_url.clone(),
                accounts_base_url: upstreams.base_url.clone(),
                client_id: FAKE_CLIENT_ID.to_string(),
                client_secret: FAKE_CLIENT_SECRET.to_string(),
                timeout: Duration::from_secs(5),
                token_safety_margin: Duration::from_secs(60),
            })
            .expect("Failed to create catalog client"),
        );

        let videos: Option<Arc<dyn VideoFinder>> = Some(Arc::new(
            YouTubeClient::new(&upstreams.base_url, "test-video-key", Duration::from_secs(5))
                .expect("Failed to create video client"),
        ));

        let provider: Arc<dyn LlmProvider> = Arc::new(RetryingProvider::new(
            Arc::new(OpenAIProvider::new(
                &upstreams.base_url,
                "test-model",
                ApiKeySource::Static("test-llm-key".to_string()),
            )),
            RetryPolicy::default(),
        ));
        let generator = SuggestionGenerator::new(
            provider,
            CompletionOptions {
                timeout: Duration::from_secs(5),
                ..CompletionOptions::default()
            },
        );

        let settings = RecommendationSettings {
            song_count: 2,
            album_count: 2,
            ..RecommendationSettings::default()
        };
        let cache = Arc::new(RecommendationCache::new(
            settings.cache_ttl,
            settings.cache_bypass_probability,
            Arc::new(NeverBypass),
        ));
        let engine = Arc::new(RecommendationEngine::new(
            catalog,
            videos,
            generator,
            cache,
            history.clone(),
            settings,
        ));

        // Bind to random port
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");

        let port = listener
            .local_addr()
            .expect("Failed to get local address")
            .port();

        let base_url = format!("http://127.0.0.1:{}", port);

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

        let config = ServerConfig {
            port,
            requests_logging_level: RequestsLoggingLevel::None,
            ..ServerConfig::default()
        };
        let app = make_app(config, engine, history.clone());

        // Spawn server in background task with graceful shutdown
        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .expect("Server failed");
        });

        let server = Self {
            base_url,
            port,
            upstreams,
            history,
            _temp_db_dir: temp_db_dir,
            _shutdown_tx: Some(shutdown_tx),
        };

        server.wait_for_ready().await;

        server
    }

    /// Waits for the server to become ready by polling the root endpoint
    async fn wait_for_ready(&self) {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(100))
            .build()
            .expect("Failed to build reqwest client");

        let start = std::time::Instant::now();
        let timeout = Duration::from_millis(SERVER_READY_TIMEOUT_MS);

        loop {
            if start.elapsed() > timeout {
                panic!(
                    "Server did not become ready within {}ms",
                    SERVER_READY_TIMEOUT_MS
                );
            }

            match client.get(format!("{}/", self.base_url)).send().await {
                Ok(response) if response.status().is_success() => return,
                _ => {
                    tokio::time::sleep(Duration::from_millis(SERVER_READY_POLL_INTERVAL_MS)).await;
                }
            }
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self._shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}
