//! YouTube Data API client for companion video lookup.

use super::{EnrichmentError, VideoData, VideoFinder};
use crate::server::metrics::record_upstream_request;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::{Duration, Instant};
use tracing::debug;

pub const YOUTUBE_API_BASE: &str = "https://www.googleapis.com/youtube/v3";

pub struct YouTubeClient {
    client: Client,
    base_url: String,
    api_key: String,
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Deserialize)]
struct SearchItem {
    id: SearchItemId,
    snippet: Option<Snippet>,
}

#[derive(Deserialize)]
struct SearchItemId {
    #[serde(rename = "videoId")]
    video_id: Option<String>,
}

#[derive(Deserialize)]
struct Snippet {
    title: Option<String>,
    thumbnails: Option<Thumbnails>,
}

#[derive(Deserialize)]
struct Thumbnails {
    high: Option<Thumbnail>,
}

#[derive(Deserialize)]
struct Thumbnail {
    url: String,
}

impl YouTubeClient {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, EnrichmentError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| EnrichmentError::Connection(e.to_string()))?;
        let base_url = base_url.into().trim_end_matches('/').to_string();

        Ok(Self {
            client,
            base_url,
            api_key: api_key.into(),
        })
    }

    async fn search(&self, query: &str) -> Result<Option<VideoData>, EnrichmentError> {
        let url = format!(
            "{}/search?part=snippet&type=video&maxResults=1&q={}&key={}",
            self.base_url,
            urlencoding::encode(query),
            urlencoding::encode(&self.api_key)
        );

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| EnrichmentError::Connection(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            // The API reports exhausted quota as 403 with a quotaExceeded reason.
            if status.as_u16() == 403 && body.contains("quotaExceeded") {
                return Err(EnrichmentError::QuotaExceeded);
            }
            return Err(EnrichmentError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let body: SearchResponse = response
            .json()
            .await
            .map_err(|e| EnrichmentError::InvalidResponse(e.to_string()))?;

        let video = body.items.into_iter().find_map(|item| {
            let video_id = item.id.video_id?;
            let snippet = item.snippet;
            let title = snippet
                .as_ref()
                .and_then(|s| s.title.clone())
                .unwrap_or_default();
            let thumbnail = snippet
                .and_then(|s| s.thumbnails)
                .and_then(|t| t.high)
                .map(|t| t.url)
                .unwrap_or_default();
            Some(VideoData {
                video_id,
                title,
                thumbnail,
            })
        });

        Ok(video)
    }
}

#[async_trait]
impl VideoFinder for YouTubeClient {
    async fn find_video(&self, query: &str) -> Result<Option<VideoData>, EnrichmentError> {
        debug!(query = %query, "Searching video index");
        let start = Instant::now();
        let result = self.search(query).await;
        let outcome = match &result {
            Ok(_) => "ok",
            Err(EnrichmentError::QuotaExceeded) => "quota",
            Err(_) => "error",
        };
        record_upstream_request("video_index", outcome, start.elapsed());
        result
    }
}
