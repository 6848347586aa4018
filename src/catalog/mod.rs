//! Music catalog search.
//!
//! The catalog is the source of truth for track and album identity. Every
//! generated suggestion is resolved against it before being returned.

mod auth;
mod client;
mod models;

pub use auth::{AppToken, CatalogAuthState};
pub use client::{
    CatalogClientConfig, SpotifyCatalogClient, SPOTIFY_ACCOUNTS_BASE, SPOTIFY_API_BASE,
};
pub use models::{
    CatalogAlbum, CatalogArtist, CatalogImage, CatalogItem, CatalogTrack, ExternalUrls, Paged,
    PagedAlbums, PagedTracks,
};

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Catalog unavailable: {0}")]
    Unavailable(String),

    #[error("Catalog authentication failed: {0}")]
    Auth(String),
}

#[async_trait]
pub trait CatalogSearch: Send + Sync {
    async fn search_tracks(&self, query: &str, limit: usize) -> Result<PagedTracks, CatalogError>;

    async fn search_albums(&self, query: &str, limit: usize) -> Result<PagedAlbums, CatalogError>;
}
