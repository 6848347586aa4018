use crate::enrichment::VideoData;
use crate::recommendation::{VerifiedAlbum, VerifiedTrack};
use serde::{Deserialize, Serialize};

/// The kind of request that produced a recommendation record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationType {
    Mood,
}

impl RecommendationType {
    pub fn to_db_str(&self) -> &'static str {
        match self {
            RecommendationType::Mood => "mood",
        }
    }

    pub fn from_db_str(s: &str) -> Option<Self> {
        match s {
            "mood" => Some(RecommendationType::Mood),
            _ => None,
        }
    }
}

/// Snapshot of a recommended track, with its rank in the response.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderedTrackRef {
    pub position: usize,
    pub track_id: String,
    pub track_name: String,
    pub artist_name: String,
    pub album_name: String,
    pub album_cover: Option<String>,
    pub preview_url: Option<String>,
    pub spotify_url: Option<String>,
    pub youtube_data: Option<VideoData>,
}

/// Snapshot of a recommended album, with its rank in the response.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderedAlbumRef {
    pub position: usize,
    pub album_id: String,
    pub album_name: String,
    pub artist_name: String,
    pub album_cover: Option<String>,
    pub release_date: Option<String>,
    pub spotify_url: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationRecord {
    pub id: String,
    pub user_id: String,
    #[serde(rename = "type")]
    pub kind: RecommendationType,
    pub mood: String,
    pub genres: Vec<String>,
    pub parameters: serde_json::Value,
    pub tracks: Vec<OrderedTrackRef>,
    pub albums: Vec<OrderedAlbumRef>,
    /// Unix timestamp in seconds.
    pub created_at: i64,
}

impl RecommendationRecord {
    /// Builds a new record for a mood recommendation. Positions follow the
    /// order of `songs` and `albums`.
    pub fn for_mood(
        user_id: &str,
        mood: &str,
        genre: &str,
        songs: &[VerifiedTrack],
        albums: &[VerifiedAlbum],
    ) -> Self {
        let tracks = songs
            .iter()
            .enumerate()
            .map(|(position, song)| OrderedTrackRef {
                position,
                track_id: song.song_id.clone(),
                track_name: song.song_name.clone(),
                artist_name: song.artist_name.clone(),
                album_name: song.album_name.clone(),
                album_cover: song.album_cover.clone(),
                preview_url: song.preview_url.clone(),
                spotify_url: song.spotify_url.clone(),
                youtube_data: song.youtube_data.clone(),
            })
            .collect();

        let albums = albums
            .iter()
            .enumerate()
            .map(|(position, album)| OrderedAlbumRef {
                position,
                album_id: album.album_id.clone(),
                album_name: album.album_name.clone(),
                artist_name: album.artist_name.clone(),
                album_cover: album.album_cover.clone(),
                release_date: album.release_date.clone(),
                spotify_url: album.spotify_url.clone(),
            })
            .collect();

        RecommendationRecord {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            kind: RecommendationType::Mood,
            mood: mood.to_string(),
            genres: vec![genre.to_string()],
            parameters: serde_json::json!({ "mood": mood, "genre": genre }),
            tracks,
            albums,
            created_at: chrono::Utc::now().timestamp(),
        }
    }
}

/// Catalog ids a user has already been recommended.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PriorRecommendations {
    pub track_ids: Vec<String>,
    pub album_ids: Vec<String>,
}
