//! HTTP client for end-to-end tests
//!
//! Wraps reqwest with one method per server endpoint. Identified clients
//! send the user id header on every request.

use super::constants::*;
use moodmix_server::server::session::HEADER_USER_ID_KEY;
use reqwest::Response;
use std::time::Duration;

pub struct TestClient {
    /// The underlying reqwest client (public for custom requests in tests)
    pub client: reqwest::Client,
    /// The base URL of the test server
    pub base_url: String,
    user_id: Option<String>,
}

impl TestClient {
    /// Creates an anonymous client
    pub fn new(base_url: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .expect("Failed to build reqwest client");

        Self {
            client,
            base_url,
            user_id: None,
        }
    }

    /// Creates a client identified as `user_id`
    pub fn identified(base_url: String, user_id: &str) -> Self {
        Self {
            user_id: Some(user_id.to_string()),
            ..Self::new(base_url)
        }
    }

    fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.with_identity(self.client.get(format!("{}{}", self.base_url, path)))
    }

    fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.with_identity(self.client.post(format!("{}{}", self.base_url, path)))
    }

    fn with_identity(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.user_id {
            Some(user_id) => builder.header(HEADER_USER_ID_KEY, user_id),
            None => builder,
        }
    }

    // ========================================================================
    // Recommendations
    // ========================================================================

    pub async fn get_recommendations(&self, mood: &str, genre: &str) -> Response {
        self.get(&format!(
            "/recommendations?mood={}&genre={}",
            urlencoding::encode(mood),
            urlencoding::encode(genre)
        ))
        .send()
        .await
        .expect("Recommendations request failed")
    }

    /// Sends a raw query string, for testing parameter validation
    pub async fn get_recommendations_raw(&self, query: &str) -> Response {
        self.get(&format!("/recommendations{}", query))
            .send()
            .await
            .expect("Recommendations request failed")
    }

    // ========================================================================
    // History
    // ========================================================================

    pub async fn get_history(&self, limit: Option<usize>) -> Response {
        let path = match limit {
            Some(limit) => format!("/history?limit={}", limit),
            None => "/history".to_string(),
        };
        self.get(&path).send().await.expect("History request failed")
    }

    pub async fn post_played(&self, track_id: &str) -> Response {
        self.post(&format!("/played/{}", urlencoding::encode(track_id)))
            .send()
            .await
            .expect("Played request failed")
    }

    // ========================================================================
    // Server
    // ========================================================================

    pub async fn get_home(&self) -> Response {
        self.get("/").send().await.expect("Home request failed")
    }
}
