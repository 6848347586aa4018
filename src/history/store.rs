use super::models::{PriorRecommendations, RecommendationRecord};
use anyhow::Result;

/// Persistence for plays and past recommendations.
///
/// Implementations are synchronous; async callers are expected to run them
/// on the blocking pool.
pub trait HistoryStore: Send + Sync {
    /// Records that the user played a track.
    fn record_played(&self, user_id: &str, track_id: &str) -> Result<()>;

    /// Returns the ids of the user's most recently played tracks, newest
    /// first, at most `limit` of them.
    fn get_recently_played(&self, user_id: &str, limit: usize) -> Result<Vec<String>>;

    /// Returns the track and album ids contained in the user's last
    /// `lookback` recommendations.
    fn get_recommendation_history(
        &self,
        user_id: &str,
        lookback: usize,
    ) -> Result<PriorRecommendations>;

    /// Persists a recommendation with its ordered track and album snapshots.
    fn save_recommendation(&self, user_id: &str, record: &RecommendationRecord) -> Result<()>;

    /// Returns the user's recommendations, newest first.
    fn list_recommendations(&self, user_id: &str, limit: usize)
        -> Result<Vec<RecommendationRecord>>;
}
