//! Short-lived per-user cache of recommendation results.
//!
//! A fresh entry is still skipped with a fixed probability so that repeated
//! identical requests keep producing some variety.

use super::models::{VerifiedAlbum, VerifiedTrack};
use crate::server::metrics::{record_cache_lookup, set_cache_entries};
use rand::Rng;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tracing::{debug, warn};

pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(6 * 60 * 60);
pub const DEFAULT_BYPASS_PROBABILITY: f64 = 0.3;

const ANONYMOUS_USER: &str = "anonymous";

/// Source of uniform draws in `[0, 1)`.
pub trait RandomSource: Send + Sync {
    fn next_f64(&self) -> f64;
}

pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn next_f64(&self) -> f64 {
        rand::rng().random::<f64>()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct CacheEntry {
    /// Unix timestamp in milliseconds.
    pub timestamp: i64,
    pub songs: Vec<VerifiedTrack>,
    pub albums: Vec<VerifiedAlbum>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CacheLookup {
    Hit,
    Miss,
    Expired,
    Bypassed,
}

impl CacheLookup {
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheLookup::Hit => "hit",
            CacheLookup::Miss => "miss",
            CacheLookup::Expired => "expired",
            CacheLookup::Bypassed => "bypassed",
        }
    }
}

/// Builds the cache key for a caller. Keys are case-sensitive.
pub fn cache_key(user_id: Option<&str>, mood: &str, genre: &str) -> String {
    format!(
        "{}-{}-{}",
        user_id.unwrap_or(ANONYMOUS_USER),
        mood,
        genre
    )
}

pub struct RecommendationCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
    ttl_ms: i64,
    bypass_probability: f64,
    random: Arc<dyn RandomSource>,
}

impl RecommendationCache {
    pub fn new(ttl: Duration, bypass_probability: f64, random: Arc<dyn RandomSource>) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl_ms: ttl.as_millis() as i64,
            bypass_probability,
            random,
        }
    }

    /// Returns the entry for `key` if it is fresh and survives the bypass draw.
    pub fn get(&self, key: &str) -> Option<CacheEntry> {
        self.get_at(key, chrono::Utc::now().timestamp_millis())
    }

    pub fn get_at(&self, key: &str, now_ms: i64) -> Option<CacheEntry> {
        let (lookup, entry) = self.lookup(key, now_ms);
        record_cache_lookup(lookup.as_str());
        debug!(key = %key, result = lookup.as_str(), "Cache lookup");
        entry
    }

    fn lookup(&self, key: &str, now_ms: i64) -> (CacheLookup, Option<CacheEntry>) {
        let entry = match self.entries.read() {
            Ok(entries) => entries.get(key).cloned(),
            Err(_) => {
                warn!("Recommendation cache lock poisoned");
                None
            }
        };
        let Some(entry) = entry else {
            return (CacheLookup::Miss, None);
        };
        if now_ms - entry.timestamp >= self.ttl_ms {
            return (CacheLookup::Expired, None);
        }
        if self.random.next_f64() <= self.bypass_probability {
            return (CacheLookup::Bypassed, None);
        }
        (CacheLookup::Hit, Some(entry))
    }

    /// Replaces whatever is stored under `key`.
    pub fn set(&self, key: String, songs: Vec<VerifiedTrack>, albums: Vec<VerifiedAlbum>) {
        self.set_entry(
            key,
            CacheEntry {
                timestamp: chrono::Utc::now().timestamp_millis(),
                songs,
                albums,
            },
        );
    }

    pub fn set_entry(&self, key: String, entry: CacheEntry) {
        if let Ok(mut entries) = self.entries.write() {
            entries.insert(key, entry);
            set_cache_entries(entries.len());
        }
    }

    /// Drops every entry older than the TTL. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        self.purge_expired_at(chrono::Utc::now().timestamp_millis())
    }

    pub fn purge_expired_at(&self, now_ms: i64) -> usize {
        let Ok(mut entries) = self.entries.write() else {
            return 0;
        };
        let before = entries.len();
        entries.retain(|_, entry| now_ms - entry.timestamp < self.ttl_ms);
        set_cache_entries(entries.len());
        before - entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
