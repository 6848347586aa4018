//! The recommendation cycle: cache, exclusions, generation, verification,
//! backfill, persistence.

use super::backfill::backfill;
use super::cache::{cache_key, RecommendationCache};
use super::errors::RecommendationError;
use super::generator::SuggestionGenerator;
use super::models::{
    RecommendationRequest, RecommendationResponse, VerifiedAlbum, VerifiedTrack,
};
use super::parser::parse_suggestions;
use super::prompt::build_prompt;
use super::verifier::{AlbumKind, IdentityVerifier};
use crate::catalog::CatalogSearch;
use crate::config::RecommendationSettings;
use crate::enrichment::VideoFinder;
use crate::history::{HistoryStore, RecommendationRecord};
use crate::server::metrics::{record_error, record_recommendation};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::task::JoinError;
use tracing::{debug, error, info, warn};

/// Catalog ids that must not be recommended again to a user.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Exclusions {
    /// Recently played plus previously recommended tracks.
    pub tracks: HashSet<String>,
    /// Previously recommended albums.
    pub albums: HashSet<String>,
}

pub struct RecommendationEngine {
    catalog: Arc<dyn CatalogSearch>,
    generator: SuggestionGenerator,
    verifier: IdentityVerifier,
    cache: Arc<RecommendationCache>,
    history: Arc<dyn HistoryStore>,
    settings: RecommendationSettings,
}

impl RecommendationEngine {
    pub fn new(
        catalog: Arc<dyn CatalogSearch>,
        videos: Option<Arc<dyn VideoFinder>>,
        generator: SuggestionGenerator,
        cache: Arc<RecommendationCache>,
        history: Arc<dyn HistoryStore>,
        settings: RecommendationSettings,
    ) -> Self {
        let verifier = IdentityVerifier::new(catalog.clone(), videos, settings.search_limit);
        Self {
            catalog,
            generator,
            verifier,
            cache,
            history,
            settings,
        }
    }

    pub fn cache(&self) -> &Arc<RecommendationCache> {
        &self.cache
    }

    pub async fn recommend(
        &self,
        request: &RecommendationRequest,
    ) -> Result<RecommendationResponse, RecommendationError> {
        let key = cache_key(request.user_id.as_deref(), &request.mood, &request.genre);
        if let Some(entry) = self.cache.get(&key) {
            record_recommendation("cache");
            return Ok(RecommendationResponse {
                songs: entry.songs,
                albums: entry.albums,
                from_cache: true,
            });
        }

        match self.generate_fresh(request, key).await {
            Ok(response) => {
                record_recommendation("generated");
                Ok(response)
            }
            Err(e) => {
                error!(
                    mood = %request.mood,
                    genre = %request.genre,
                    error = %e,
                    "Recommendation cycle failed"
                );
                record_recommendation("failed");
                record_error(e.metric_label(), "/recommendations");
                Err(e)
            }
        }
    }

    async fn generate_fresh(
        &self,
        request: &RecommendationRequest,
        key: String,
    ) -> Result<RecommendationResponse, RecommendationError> {
        let exclusions = match &request.user_id {
            Some(user_id) => self.load_exclusions(user_id).await,
            None => Exclusions::default(),
        };

        let prompt = build_prompt(
            &request.mood,
            &request.genre,
            self.settings.song_count,
            self.settings.album_count,
        );
        let raw = self.generator.generate(&prompt).await?;
        let suggestions = parse_suggestions(&raw)?;
        debug!(
            songs = suggestions.songs.len(),
            albums = suggestions.albums.len(),
            "Parsed suggestions"
        );

        let (songs, albums) = tokio::join!(
            self.verifier
                .verify_tracks(&suggestions.songs, &exclusions.tracks),
            self.verifier
                .verify_albums(&suggestions.albums, &exclusions.albums),
        );

        let mut songs: Vec<VerifiedTrack> = songs.into_iter().flatten().collect();
        songs.truncate(self.settings.song_count);

        let mut albums: Vec<VerifiedAlbum> = albums.into_iter().flatten().collect();
        if albums.len() < self.settings.album_count {
            let missing = self.settings.album_count - albums.len();
            let extra = backfill::<AlbumKind>(
                self.catalog.as_ref(),
                &request.mood,
                &request.genre,
                missing,
                &exclusions.albums,
                self.settings.search_limit,
            )
            .await;
            albums.extend(extra.iter().map(VerifiedAlbum::from));
        }
        albums.truncate(self.settings.album_count);

        info!(
            mood = %request.mood,
            genre = %request.genre,
            songs = songs.len(),
            albums = albums.len(),
            "Generated recommendations"
        );

        self.cache.set(key, songs.clone(), albums.clone());

        if let Some(user_id) = &request.user_id {
            self.persist(user_id, request, &songs, &albums).await;
        }

        Ok(RecommendationResponse {
            songs,
            albums,
            from_cache: false,
        })
    }

    /// Reads the user's recent plays and prior recommendations concurrently.
    /// A failed read contributes nothing.
    async fn load_exclusions(&self, user_id: &str) -> Exclusions {
        let recent = {
            let history = self.history.clone();
            let user_id = user_id.to_string();
            let limit = self.settings.recently_played_limit;
            tokio::task::spawn_blocking(move || history.get_recently_played(&user_id, limit))
        };
        let prior = {
            let history = self.history.clone();
            let user_id = user_id.to_string();
            let lookback = self.settings.history_lookback;
            tokio::task::spawn_blocking(move || {
                history.get_recommendation_history(&user_id, lookback)
            })
        };

        let (recent, prior) = tokio::join!(recent, prior);
        let recent = blocking_or_default(recent, "recently_played");
        let prior = blocking_or_default(prior, "recommendation_history");

        let mut tracks: HashSet<String> = recent.into_iter().collect();
        tracks.extend(prior.track_ids);
        let albums: HashSet<String> = prior.album_ids.into_iter().collect();

        debug!(
            user_id = %user_id,
            excluded_tracks = tracks.len(),
            excluded_albums = albums.len(),
            "Loaded exclusions"
        );
        Exclusions { tracks, albums }
    }

    async fn persist(
        &self,
        user_id: &str,
        request: &RecommendationRequest,
        songs: &[VerifiedTrack],
        albums: &[VerifiedAlbum],
    ) {
        let record =
            RecommendationRecord::for_mood(user_id, &request.mood, &request.genre, songs, albums);
        let history = self.history.clone();
        let user_id = user_id.to_string();
        let result =
            tokio::task::spawn_blocking(move || history.save_recommendation(&user_id, &record))
                .await;
        blocking_or_default(result, "save_recommendation")
    }
}

fn blocking_or_default<T: Default>(
    result: Result<anyhow::Result<T>, JoinError>,
    operation: &str,
) -> T {
    match result {
        Ok(Ok(value)) => value,
        Ok(Err(e)) => {
            warn!(operation = operation, error = %e, "History store call failed");
            record_error("history_store_failed", operation);
            T::default()
        }
        Err(e) => {
            warn!(operation = operation, error = %e, "History store task failed");
            record_error("history_store_failed", operation);
            T::default()
        }
    }
}
