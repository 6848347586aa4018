//! Process-wide client-credentials token slot.

use std::sync::RwLock;
use std::time::Duration;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AppToken {
    pub value: String,
    /// Unix timestamp in milliseconds, already reduced by the safety margin.
    pub expires_at: i64,
}

/// Holds the catalog's application token.
///
/// Reads and writes take the lock only long enough to copy the token in or
/// out; it is never held across a network call. Two requests that both see
/// an expired token will both re-authenticate and the last write wins.
pub struct CatalogAuthState {
    token: RwLock<Option<AppToken>>,
    safety_margin_ms: i64,
}

impl CatalogAuthState {
    pub fn new(safety_margin: Duration) -> Self {
        Self {
            token: RwLock::new(None),
            safety_margin_ms: safety_margin.as_millis() as i64,
        }
    }

    /// Returns the cached token value if it is still fresh at `now_ms`.
    pub fn current(&self, now_ms: i64) -> Option<String> {
        let guard = self.token.read().ok()?;
        guard
            .as_ref()
            .filter(|t| now_ms < t.expires_at - self.safety_margin_ms)
            .map(|t| t.value.clone())
    }

    /// Stores a freshly issued token that is valid for `ttl_secs` from `now_ms`.
    pub fn store(&self, value: String, ttl_secs: i64, now_ms: i64) -> AppToken {
        let token = AppToken {
            value,
            expires_at: now_ms + ttl_secs * 1000 - self.safety_margin_ms,
        };
        if let Ok(mut guard) = self.token.write() {
            *guard = Some(token.clone());
        }
        token
    }

    pub fn clear(&self) {
        if let Ok(mut guard) = self.token.write() {
            *guard = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_state_has_no_token() {
        let state = CatalogAuthState::new(Duration::from_secs(60));
        assert_eq!(state.current(0), None);
    }

    #[test]
    fn test_stored_token_expiry_accounts_for_margin() {
        let state = CatalogAuthState::new(Duration::from_secs(60));
        let token = state.store("abc".to_string(), 3600, 1_000_000);
        assert_eq!(token.expires_at, 1_000_000 + 3_600_000 - 60_000);
    }

    #[test]
    fn test_token_is_fresh_until_margin_before_expiry() {
        let state = CatalogAuthState::new(Duration::from_secs(60));
        let token = state.store("abc".to_string(), 3600, 0);

        assert_eq!(state.current(0).as_deref(), Some("abc"));
        assert_eq!(
            state.current(token.expires_at - 60_001).as_deref(),
            Some("abc")
        );
        assert_eq!(state.current(token.expires_at - 60_000), None);
        assert_eq!(state.current(token.expires_at + 1), None);
    }

    #[test]
    fn test_last_store_wins() {
        let state = CatalogAuthState::new(Duration::from_secs(0));
        state.store("first".to_string(), 3600, 0);
        state.store("second".to_string(), 3600, 0);
        assert_eq!(state.current(1).as_deref(), Some("second"));

        state.clear();
        assert_eq!(state.current(1), None);
    }
}
