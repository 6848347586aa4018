//! In-memory catalog used by the recommendation unit tests.

use crate::catalog::{
    CatalogAlbum, CatalogArtist, CatalogError, CatalogImage, CatalogSearch, CatalogTrack,
    ExternalUrls, Paged, PagedAlbums, PagedTracks,
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

pub fn album(id: &str, name: &str, artist: &str) -> CatalogAlbum {
    CatalogAlbum {
        id: id.to_string(),
        name: name.to_string(),
        artists: vec![CatalogArtist {
            id: None,
            name: artist.to_string(),
        }],
        images: vec![CatalogImage {
            url: format!("https://img/{}.jpg", id),
            width: None,
            height: None,
        }],
        release_date: Some("2020-01-01".to_string()),
        external_urls: ExternalUrls {
            spotify: Some(format!("https://open.spotify.com/album/{}", id)),
        },
    }
}

/// A track whose album id is `<id>-album`.
pub fn track(id: &str, name: &str, artist: &str) -> CatalogTrack {
    CatalogTrack {
        id: id.to_string(),
        name: name.to_string(),
        artists: vec![CatalogArtist {
            id: None,
            name: artist.to_string(),
        }],
        album: album(&format!("{}-album", id), &format!("{} album", name), artist),
        preview_url: None,
        external_urls: ExternalUrls {
            spotify: Some(format!("https://open.spotify.com/track/{}", id)),
        },
    }
}

/// Answers searches from fixed per-query result lists. Unknown queries
/// return no results.
#[derive(Default)]
pub struct FakeCatalog {
    tracks: HashMap<String, Vec<CatalogTrack>>,
    albums: HashMap<String, Vec<CatalogAlbum>>,
    delays: HashMap<String, Duration>,
    failing: bool,
    pub queries: Mutex<Vec<String>>,
}

impl FakeCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    pub fn with_tracks(mut self, query: &str, tracks: Vec<CatalogTrack>) -> Self {
        self.tracks.insert(query.to_string(), tracks);
        self
    }

    pub fn with_albums(mut self, query: &str, albums: Vec<CatalogAlbum>) -> Self {
        self.albums.insert(query.to_string(), albums);
        self
    }

    pub fn with_delay(mut self, query: &str, delay: Duration) -> Self {
        self.delays.insert(query.to_string(), delay);
        self
    }

    pub fn recorded_queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }

    async fn before_search(&self, query: &str) -> Result<(), CatalogError> {
        self.queries.lock().unwrap().push(query.to_string());
        if let Some(delay) = self.delays.get(query) {
            tokio::time::sleep(*delay).await;
        }
        if self.failing {
            return Err(CatalogError::Unavailable("fake outage".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl CatalogSearch for FakeCatalog {
    async fn search_tracks(&self, query: &str, limit: usize) -> Result<PagedTracks, CatalogError> {
        self.before_search(query).await?;
        let mut items = self.tracks.get(query).cloned().unwrap_or_default();
        items.truncate(limit);
        Ok(Paged::of(items))
    }

    async fn search_albums(&self, query: &str, limit: usize) -> Result<PagedAlbums, CatalogError> {
        self.before_search(query).await?;
        let mut items = self.albums.get(query).cloned().unwrap_or_default();
        items.truncate(limit);
        Ok(Paged::of(items))
    }
}
