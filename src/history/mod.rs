//! Persistence of plays and past recommendations.
//!
//! The recommendation pipeline reads exclusion sets from here and writes the
//! final result back; both directions are best-effort from its perspective.

mod models;
mod sqlite_history_store;
mod store;

pub use models::{
    OrderedAlbumRef, OrderedTrackRef, PriorRecommendations, RecommendationRecord,
    RecommendationType,
};
pub use sqlite_history_store::SqliteHistoryStore;
pub use store::HistoryStore;
