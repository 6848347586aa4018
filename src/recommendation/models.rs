use crate::catalog::{CatalogAlbum, CatalogItem, CatalogTrack};
use crate::enrichment::VideoData;
use serde::{Deserialize, Serialize};

/// One line of generated output: a title and the artist it is attributed to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SuggestionItem {
    pub name: String,
    pub artist: String,
}

impl SuggestionItem {
    pub fn new(name: impl Into<String>, artist: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            artist: artist.into(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Suggestions {
    pub songs: Vec<SuggestionItem>,
    pub albums: Vec<SuggestionItem>,
}

/// A track resolved against the catalog. `song_id` is always a catalog id.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifiedTrack {
    pub song_id: String,
    pub song_name: String,
    pub artist_name: String,
    pub album_id: String,
    pub album_name: String,
    pub album_cover: Option<String>,
    pub preview_url: Option<String>,
    pub spotify_url: Option<String>,
    pub youtube_data: Option<VideoData>,
}

impl VerifiedTrack {
    pub fn from_catalog(track: &CatalogTrack, youtube_data: Option<VideoData>) -> Self {
        Self {
            song_id: track.id.clone(),
            song_name: track.name.clone(),
            artist_name: track.primary_artist_name().to_string(),
            album_id: track.album.id.clone(),
            album_name: track.album.name.clone(),
            album_cover: track.album.cover_url(),
            preview_url: track.preview_url.clone(),
            spotify_url: track.external_urls.spotify.clone(),
            youtube_data,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifiedAlbum {
    pub album_id: String,
    pub album_name: String,
    pub artist_name: String,
    pub album_cover: Option<String>,
    pub release_date: Option<String>,
    pub spotify_url: Option<String>,
}

impl From<&CatalogAlbum> for VerifiedAlbum {
    fn from(album: &CatalogAlbum) -> Self {
        Self {
            album_id: album.id.clone(),
            album_name: album.name.clone(),
            artist_name: album.primary_artist_name().to_string(),
            album_cover: album.cover_url(),
            release_date: album.release_date.clone(),
            spotify_url: album.external_urls.spotify.clone(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecommendationRequest {
    /// `None` for anonymous callers.
    pub user_id: Option<String>,
    pub mood: String,
    pub genre: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationResponse {
    pub songs: Vec<VerifiedTrack>,
    pub albums: Vec<VerifiedAlbum>,
    pub from_cache: bool,
}
