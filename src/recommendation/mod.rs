//! Mood and genre recommendations.
//!
//! Suggestions come from a text generation backend and are only returned
//! once they have been resolved to real catalog entries.

mod backfill;
mod cache;
mod engine;
mod errors;
mod generator;
mod models;
mod parser;
mod prompt;
mod verifier;

#[cfg(test)]
pub(crate) mod test_support;

pub use backfill::backfill;
pub use cache::{
    cache_key, CacheEntry, CacheLookup, RandomSource, RecommendationCache, ThreadRandom,
    DEFAULT_BYPASS_PROBABILITY, DEFAULT_CACHE_TTL,
};
pub use engine::{Exclusions, RecommendationEngine};
pub use errors::RecommendationError;
pub use generator::SuggestionGenerator;
pub use models::{
    RecommendationRequest, RecommendationResponse, SuggestionItem, Suggestions, VerifiedAlbum,
    VerifiedTrack,
};
pub use parser::parse_suggestions;
pub use prompt::build_prompt;
pub use verifier::{
    select_candidate, structured_query, AlbumKind, IdentityVerifier, ItemKind, MatchOutcome,
    TrackKind,
};
