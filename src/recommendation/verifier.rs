//! Resolution of generated suggestions to real catalog entries.

use super::models::{SuggestionItem, VerifiedAlbum, VerifiedTrack};
use crate::catalog::{CatalogAlbum, CatalogError, CatalogItem, CatalogSearch, CatalogTrack};
use crate::enrichment::{find_video_best_effort, video_query, VideoFinder};
use crate::server::metrics::{record_error, record_verification_outcome};
use futures::future::{join_all, BoxFuture};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, warn};

/// A searchable kind of catalog item.
pub trait ItemKind: Send + Sync + 'static {
    type Candidate: CatalogItem + Send + Sync;

    /// Field qualifier used in structured queries and metric labels.
    const LABEL: &'static str;

    fn search<'a>(
        catalog: &'a dyn CatalogSearch,
        query: &'a str,
        limit: usize,
    ) -> BoxFuture<'a, Result<Vec<Self::Candidate>, CatalogError>>;
}

pub struct TrackKind;

pub struct AlbumKind;

impl ItemKind for TrackKind {
    type Candidate = CatalogTrack;
    const LABEL: &'static str = "track";

    fn search<'a>(
        catalog: &'a dyn CatalogSearch,
        query: &'a str,
        limit: usize,
    ) -> BoxFuture<'a, Result<Vec<CatalogTrack>, CatalogError>> {
        Box::pin(async move {
            catalog
                .search_tracks(query, limit)
                .await
                .map(|page| page.items)
        })
    }
}

impl ItemKind for AlbumKind {
    type Candidate = CatalogAlbum;
    const LABEL: &'static str = "album";

    fn search<'a>(
        catalog: &'a dyn CatalogSearch,
        query: &'a str,
        limit: usize,
    ) -> BoxFuture<'a, Result<Vec<CatalogAlbum>, CatalogError>> {
        Box::pin(async move {
            catalog
                .search_albums(query, limit)
                .await
                .map(|page| page.items)
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MatchOutcome {
    /// A non-excluded candidate whose name and artist contain the requested ones.
    Matched,
    /// No such candidate; the catalog's top result was used instead.
    Fallback,
}

impl MatchOutcome {
    fn as_str(&self) -> &'static str {
        match self {
            MatchOutcome::Matched => "matched",
            MatchOutcome::Fallback => "fallback",
        }
    }
}

pub fn structured_query(label: &str, item: &SuggestionItem) -> String {
    format!("{}:{} artist:{}", label, item.name, item.artist)
}

/// Picks the candidate to use for `item` out of raw search results.
///
/// Returns the index into `candidates`, or `None` only when there are no
/// candidates at all. The fallback ignores exclusions.
pub fn select_candidate<C: CatalogItem>(
    candidates: &[C],
    item: &SuggestionItem,
    exclusions: &HashSet<String>,
) -> Option<(usize, MatchOutcome)> {
    if candidates.is_empty() {
        return None;
    }

    let wanted_name = item.name.to_lowercase();
    let wanted_artist = item.artist.to_lowercase();

    let matched = candidates
        .iter()
        .enumerate()
        .filter(|(_, c)| !exclusions.contains(c.id()))
        .find(|(_, c)| {
            let artist_matches = c
                .artists()
                .iter()
                .any(|a| a.name.to_lowercase().contains(&wanted_artist));
            artist_matches && c.name().to_lowercase().contains(&wanted_name)
        });

    match matched {
        Some((idx, _)) => Some((idx, MatchOutcome::Matched)),
        None => Some((0, MatchOutcome::Fallback)),
    }
}

pub struct IdentityVerifier {
    catalog: Arc<dyn CatalogSearch>,
    videos: Option<Arc<dyn VideoFinder>>,
    search_limit: usize,
}

impl IdentityVerifier {
    pub fn new(
        catalog: Arc<dyn CatalogSearch>,
        videos: Option<Arc<dyn VideoFinder>>,
        search_limit: usize,
    ) -> Self {
        Self {
            catalog,
            videos,
            search_limit,
        }
    }

    async fn resolve<K: ItemKind>(
        &self,
        item: &SuggestionItem,
        exclusions: &HashSet<String>,
    ) -> Option<K::Candidate> {
        let query = structured_query(K::LABEL, item);
        let mut candidates = match K::search(self.catalog.as_ref(), &query, self.search_limit).await
        {
            Ok(candidates) => candidates,
            Err(e) => {
                warn!(kind = K::LABEL, query = %query, error = %e, "Catalog search failed");
                record_error("catalog_unavailable", "verification");
                record_verification_outcome(K::LABEL, "unresolved");
                return None;
            }
        };

        match select_candidate(&candidates, item, exclusions) {
            Some((idx, outcome)) => {
                debug!(
                    kind = K::LABEL,
                    query = %query,
                    outcome = outcome.as_str(),
                    id = candidates[idx].id(),
                    "Resolved suggestion"
                );
                record_verification_outcome(K::LABEL, outcome.as_str());
                Some(candidates.swap_remove(idx))
            }
            None => {
                debug!(kind = K::LABEL, query = %query, "No catalog results for suggestion");
                record_verification_outcome(K::LABEL, "unresolved");
                None
            }
        }
    }

    /// Resolves every song concurrently. The output is positional: entry `i`
    /// belongs to `items[i]` regardless of completion order.
    pub async fn verify_tracks(
        &self,
        items: &[SuggestionItem],
        exclusions: &HashSet<String>,
    ) -> Vec<Option<VerifiedTrack>> {
        join_all(items.iter().map(|item| async move {
            let track = self.resolve::<TrackKind>(item, exclusions).await?;
            let query = video_query(&track.name, track.primary_artist_name());
            let video = find_video_best_effort(self.videos.as_deref(), &query).await;
            Some(VerifiedTrack::from_catalog(&track, video))
        }))
        .await
    }

    /// Album counterpart of [`Self::verify_tracks`]. Albums are not enriched.
    pub async fn verify_albums(
        &self,
        items: &[SuggestionItem],
        exclusions: &HashSet<String>,
    ) -> Vec<Option<VerifiedAlbum>> {
        join_all(items.iter().map(|item| async move {
            let album = self.resolve::<AlbumKind>(item, exclusions).await?;
            Some(VerifiedAlbum::from(&album))
        }))
        .await
    }
}
