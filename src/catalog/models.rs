//! Catalog API response types.
//!
//! These mirror the JSON returned by the catalog search endpoint. Unknown
//! fields are ignored and most fields are optional, since the catalog omits
//! them freely.

use serde::{Deserialize, Deserializer};

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct Paged<T> {
    /// The catalog occasionally returns `null` slots; they are dropped.
    #[serde(default = "Vec::new", deserialize_with = "skip_null_items")]
    pub items: Vec<T>,
    #[serde(default)]
    pub total: u32,
    #[serde(default)]
    pub limit: u32,
    #[serde(default)]
    pub offset: u32,
    #[serde(default)]
    pub next: Option<String>,
}

impl<T> Default for Paged<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            total: 0,
            limit: 0,
            offset: 0,
            next: None,
        }
    }
}

impl<T> Paged<T> {
    pub fn of(items: Vec<T>) -> Self {
        Self {
            total: items.len() as u32,
            limit: items.len() as u32,
            items,
            offset: 0,
            next: None,
        }
    }
}

fn skip_null_items<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    let items = Option::<Vec<Option<T>>>::deserialize(deserializer)?;
    Ok(items.unwrap_or_default().into_iter().flatten().collect())
}

pub type PagedTracks = Paged<CatalogTrack>;
pub type PagedAlbums = Paged<CatalogAlbum>;

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct ExternalUrls {
    pub spotify: Option<String>,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct CatalogImage {
    pub url: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct CatalogArtist {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct CatalogAlbum {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub artists: Vec<CatalogArtist>,
    #[serde(default)]
    pub images: Vec<CatalogImage>,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub external_urls: ExternalUrls,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct CatalogTrack {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub artists: Vec<CatalogArtist>,
    pub album: CatalogAlbum,
    #[serde(default)]
    pub preview_url: Option<String>,
    #[serde(default)]
    pub external_urls: ExternalUrls,
}

/// Identity fields shared by every searchable catalog item.
pub trait CatalogItem {
    fn id(&self) -> &str;
    fn name(&self) -> &str;
    fn artists(&self) -> &[CatalogArtist];

    fn primary_artist_name(&self) -> &str {
        self.artists().first().map(|a| a.name.as_str()).unwrap_or("")
    }
}

impl CatalogItem for CatalogTrack {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn artists(&self) -> &[CatalogArtist] {
        &self.artists
    }
}

impl CatalogItem for CatalogAlbum {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn artists(&self) -> &[CatalogArtist] {
        &self.artists
    }
}

impl CatalogAlbum {
    /// The first listed image, which the catalog orders largest first.
    pub fn cover_url(&self) -> Option<String> {
        self.images.first().map(|i| i.url.clone())
    }
}

#[derive(Debug, Default, Deserialize)]
pub(super) struct SearchResponse {
    pub tracks: Option<PagedTracks>,
    pub albums: Option<PagedAlbums>,
}

#[derive(Debug, Deserialize)]
pub(super) struct TokenResponse {
    pub access_token: String,
    #[serde(default = "default_token_ttl_secs")]
    pub expires_in: i64,
}

fn default_token_ttl_secs() -> i64 {
    3600
}
