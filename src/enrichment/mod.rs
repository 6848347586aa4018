//! Best-effort companion video lookup for verified tracks.

mod youtube;

pub use youtube::{YouTubeClient, YOUTUBE_API_BASE};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

/// Appended to every lookup to bias results toward official audio uploads.
pub const OFFICIAL_AUDIO_QUALIFIER: &str = "official audio";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoData {
    pub video_id: String,
    pub title: String,
    pub thumbnail: String,
}

#[derive(Debug, Error)]
pub enum EnrichmentError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Quota exceeded")]
    QuotaExceeded,

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

#[async_trait]
pub trait VideoFinder: Send + Sync {
    /// Returns the best matching video for `query`, or `None` when the index
    /// has no results.
    async fn find_video(&self, query: &str) -> Result<Option<VideoData>, EnrichmentError>;
}

/// Builds the lookup query for a track.
pub fn video_query(track_name: &str, primary_artist: &str) -> String {
    format!(
        "{} {} {}",
        track_name.trim(),
        primary_artist.trim(),
        OFFICIAL_AUDIO_QUALIFIER
    )
}

/// Looks up a video, converting every failure into `None`.
///
/// Enrichment never affects whether a track is returned, so errors stop here.
pub async fn find_video_best_effort(
    finder: Option<&dyn VideoFinder>,
    query: &str,
) -> Option<VideoData> {
    let finder = finder?;
    match finder.find_video(query).await {
        Ok(video) => {
            if video.is_none() {
                debug!(query = %query, "No video found");
            }
            video
        }
        Err(e) => {
            warn!(query = %query, error = %e, "Video enrichment failed");
            crate::server::metrics::record_error("enrichment_failed", "video_index");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FailingFinder;

    #[async_trait]
    impl VideoFinder for FailingFinder {
        async fn find_video(&self, _query: &str) -> Result<Option<VideoData>, EnrichmentError> {
            Err(EnrichmentError::QuotaExceeded)
        }
    }

    struct FixedFinder;

    #[async_trait]
    impl VideoFinder for FixedFinder {
        async fn find_video(&self, query: &str) -> Result<Option<VideoData>, EnrichmentError> {
            Ok(Some(VideoData {
                video_id: "abc".to_string(),
                title: query.to_string(),
                thumbnail: "https://img/abc.jpg".to_string(),
            }))
        }
    }

    #[test]
    fn test_video_query_appends_qualifier() {
        assert_eq!(
            video_query(" Blinding Lights ", "The Weeknd"),
            "Blinding Lights The Weeknd official audio"
        );
    }

    #[tokio::test]
    async fn test_failure_degrades_to_none() {
        let finder = FailingFinder;
        assert_eq!(find_video_best_effort(Some(&finder), "q").await, None);
    }

    #[tokio::test]
    async fn test_missing_finder_is_none() {
        assert_eq!(find_video_best_effort(None, "q").await, None);
    }

    #[tokio::test]
    async fn test_success_passes_through() {
        let finder = FixedFinder;
        let video = find_video_best_effort(Some(&finder), "song artist official audio")
            .await
            .unwrap();
        assert_eq!(video.video_id, "abc");
        assert_eq!(video.title, "song artist official audio");
    }
}
