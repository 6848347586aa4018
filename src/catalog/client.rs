//! HTTP client for the music catalog.

use super::auth::CatalogAuthState;
use super::models::{PagedAlbums, PagedTracks, SearchResponse, TokenResponse};
use super::{CatalogError, CatalogSearch};
use crate::server::metrics::record_upstream_request;
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use reqwest::{Client, StatusCode};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

pub const SPOTIFY_API_BASE: &str = "https://api.spotify.com";
pub const SPOTIFY_ACCOUNTS_BASE: &str = "https://accounts.spotify.com";

/// Connection settings for [`SpotifyCatalogClient`].
#[derive(Clone, Debug)]
pub struct CatalogClientConfig {
    pub api_base_url: String,
    pub accounts_base_url: String,
    pub client_id: String,
    pub client_secret: String,
    pub timeout: Duration,
    pub token_safety_margin: Duration,
}

pub struct SpotifyCatalogClient {
    client: Client,
    api_base_url: String,
    accounts_base_url: String,
    client_id: String,
    client_secret: String,
    auth: CatalogAuthState,
}

#[derive(Clone, Copy)]
enum SearchType {
    Track,
    Album,
}

impl SearchType {
    fn as_str(self) -> &'static str {
        match self {
            SearchType::Track => "track",
            SearchType::Album => "album",
        }
    }
}

impl SpotifyCatalogClient {
    pub fn new(config: CatalogClientConfig) -> Result<Self, CatalogError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| CatalogError::Unavailable(format!("Failed to create client: {}", e)))?;

        Ok(Self {
            client,
            api_base_url: config.api_base_url.trim_end_matches('/').to_string(),
            accounts_base_url: config.accounts_base_url.trim_end_matches('/').to_string(),
            client_id: config.client_id,
            client_secret: config.client_secret,
            auth: CatalogAuthState::new(config.token_safety_margin),
        })
    }

    /// Returns a fresh application token, fetching a new one when the cached
    /// token is missing or about to expire.
    async fn access_token(&self) -> Result<String, CatalogError> {
        let now = chrono::Utc::now().timestamp_millis();
        if let Some(token) = self.auth.current(now) {
            return Ok(token);
        }

        debug!("Requesting catalog application token");
        let start = Instant::now();
        let result = self.request_token().await;
        record_upstream_request(
            "catalog_auth",
            if result.is_ok() { "ok" } else { "error" },
            start.elapsed(),
        );
        let token = result?;

        let now = chrono::Utc::now().timestamp_millis();
        let stored = self.auth.store(token.access_token, token.expires_in, now);
        info!(
            expires_in_secs = token.expires_in,
            "Obtained catalog application token"
        );
        Ok(stored.value)
    }

    async fn request_token(&self) -> Result<TokenResponse, CatalogError> {
        let credentials = BASE64.encode(format!("{}:{}", self.client_id, self.client_secret));
        let url = format!("{}/api/token", self.accounts_base_url);

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Basic {}", credentials))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await
            .map_err(|e| CatalogError::Auth(format!("Token request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CatalogError::Auth(format!(
                "Token endpoint returned {}: {}",
                status, body
            )));
        }

        response
            .json::<TokenResponse>()
            .await
            .map_err(|e| CatalogError::Auth(format!("Invalid token response: {}", e)))
    }

    async fn search(
        &self,
        query: &str,
        search_type: SearchType,
        limit: usize,
    ) -> Result<SearchResponse, CatalogError> {
        let start = Instant::now();
        let result = self.search_inner(query, search_type, limit).await;
        record_upstream_request(
            "catalog_search",
            if result.is_ok() { "ok" } else { "error" },
            start.elapsed(),
        );
        result
    }

    async fn search_inner(
        &self,
        query: &str,
        search_type: SearchType,
        limit: usize,
    ) -> Result<SearchResponse, CatalogError> {
        let token = self.access_token().await?;
        let url = format!(
            "{}/v1/search?q={}&type={}&limit={}",
            self.api_base_url,
            urlencoding::encode(query),
            search_type.as_str(),
            limit
        );

        debug!(query = %query, kind = search_type.as_str(), "Searching catalog");

        let response = self
            .client
            .get(&url)
            .bearer_auth(&token)
            .send()
            .await
            .map_err(|e| CatalogError::Unavailable(format!("Search request failed: {}", e)))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            // Revoked early; the next call fetches a new token.
            warn!("Catalog rejected application token");
            self.auth.clear();
            return Err(CatalogError::Auth("Token rejected by catalog".to_string()));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CatalogError::Unavailable(format!(
                "Search returned {}: {}",
                status, body
            )));
        }

        response
            .json::<SearchResponse>()
            .await
            .map_err(|e| CatalogError::Unavailable(format!("Invalid search response: {}", e)))
    }
}

#[async_trait]
impl CatalogSearch for SpotifyCatalogClient {
    async fn search_tracks(&self, query: &str, limit: usize) -> Result<PagedTracks, CatalogError> {
        let response = self.search(query, SearchType::Track, limit).await?;
        Ok(response.tracks.unwrap_or_default())
    }

    async fn search_albums(&self, query: &str, limit: usize) -> Result<PagedAlbums, CatalogError> {
        let response = self.search(query, SearchType::Album, limit).await?;
        Ok(response.albums.unwrap_or_default())
    }
}
