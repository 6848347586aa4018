//! Shared constants for end-to-end tests
//!
//! When fake catalog data or canned generations change, update only this file.

// ============================================================================
// Timing
// ============================================================================

/// Maximum time to wait for a spawned server to answer
pub const SERVER_READY_TIMEOUT_MS: u64 = 5000;

/// Delay between readiness probes
pub const SERVER_READY_POLL_INTERVAL_MS: u64 = 20;

/// Per-request timeout of the test client
pub const REQUEST_TIMEOUT_SECS: u64 = 10;

// ============================================================================
// Identity
// ============================================================================

pub const TEST_USER_ID: &str = "user-1";

pub const OTHER_USER_ID: &str = "user-2";

// ============================================================================
// Fake Catalog
// ============================================================================

pub const FAKE_CLIENT_ID: &str = "test-client-id";
pub const FAKE_CLIENT_SECRET: &str = "test-client-secret";
pub const FAKE_ACCESS_TOKEN: &str = "fake-app-token";

pub const ARTIST_1_NAME: &str = "The Test Band";
pub const ARTIST_2_NAME: &str = "Jazz Ensemble";

/// "First Album" by The Test Band
pub const ALBUM_1_ID: &str = "album-1";
pub const ALBUM_1_NAME: &str = "First Album";

/// "Jazz Collection" by Jazz Ensemble
pub const ALBUM_2_ID: &str = "album-2";
pub const ALBUM_2_NAME: &str = "Jazz Collection";

/// "Opening Track" on First Album
pub const TRACK_1_ID: &str = "track-1";
pub const TRACK_1_NAME: &str = "Opening Track";

/// "Blue Notes" on Jazz Collection
pub const TRACK_2_ID: &str = "track-2";
pub const TRACK_2_NAME: &str = "Blue Notes";

/// Video id the fake video index returns for every query
pub const FAKE_VIDEO_ID: &str = "video-1";

// ============================================================================
// Canned Generations
// ============================================================================

pub const HAPPY_GENERATION: &str = "SONGS:\n\
    1. Opening Track - The Test Band\n\
    2. Blue Notes - Jazz Ensemble\n\
    \n\
    ALBUMS:\n\
    1. First Album - The Test Band\n\
    2. Jazz Collection - Jazz Ensemble\n";

/// One album short of the configured album count
pub const SHORT_ALBUMS_GENERATION: &str = "SONGS:\n\
    1. Opening Track - The Test Band\n\
    ALBUMS:\n\
    1. Jazz Collection - Jazz Ensemble\n";

pub const MALFORMED_GENERATION: &str = "Sorry, I can't think of anything right now.";
