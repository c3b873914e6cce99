//! Cached bearer token

use std::fmt;

use nimbus_common::error::{SdkError, SdkResult};

/// Capacity of the cached `authorization` value, `Bearer ` prefix included
pub const TOKEN_CAPACITY: usize = 2048;

/// Prefix stored in front of every cached token
pub const BEARER_PREFIX: &str = "Bearer ";

/// Token cache embedded in a credential
///
/// Holds the ready-to-send `authorization` header value. A token is valid
/// while `now < expiry`; a fresh cache has expiry 0 and is always expired.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct TokenCache {
    bearer_token: heapless::String<TOKEN_CAPACITY>,
    expiry_msec: i64,
}

impl TokenCache {
    #[must_use]
    pub const fn new() -> Self {
        Self { bearer_token: heapless::String::new(), expiry_msec: 0 }
    }

    /// Whether the cached token may be used at `now_msec`
    #[must_use]
    pub fn is_valid(&self, now_msec: i64) -> bool {
        now_msec < self.expiry_msec
    }

    #[must_use]
    pub const fn expiry_msec(&self) -> i64 {
        self.expiry_msec
    }

    /// `Bearer <token>`, or empty if nothing was ever stored
    #[must_use]
    pub fn header_value(&self) -> &str {
        &self.bearer_token
    }

    /// The token without its `Bearer ` prefix
    #[must_use]
    pub fn access_token(&self) -> &str {
        self.bearer_token.strip_prefix(BEARER_PREFIX).unwrap_or_default()
    }

    /// Replace the cached token
    ///
    /// # Errors
    /// `BufferTooSmall` when `Bearer <access_token>` exceeds
    /// [`TOKEN_CAPACITY`]; the previous token is kept.
    pub fn store(&mut self, access_token: &str, expiry_msec: i64) -> SdkResult<()> {
        let required = BEARER_PREFIX.len() + access_token.len();
        if required > TOKEN_CAPACITY {
            return Err(SdkError::buffer_too_small("token", required, TOKEN_CAPACITY));
        }
        self.bearer_token.clear();
        for part in [BEARER_PREFIX, access_token] {
            self.bearer_token
                .push_str(part)
                .map_err(|()| SdkError::buffer_too_small("token", required, TOKEN_CAPACITY))?;
        }
        self.expiry_msec = expiry_msec;
        Ok(())
    }

    /// Forget the token so the next use refreshes it
    pub fn invalidate(&mut self) {
        self.bearer_token.clear();
        self.expiry_msec = 0;
    }
}

impl fmt::Debug for TokenCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenCache")
            .field("token", &"[REDACTED]")
            .field("token_len", &self.access_token().len())
            .field("expiry_msec", &self.expiry_msec)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_cache_is_expired() {
        let cache = TokenCache::new();
        assert!(!cache.is_valid(0));
        assert!(!cache.is_valid(100_000_000));
        assert_eq!(cache.header_value(), "");
    }

    /// Validates the validity window is `now < expiry`.
    #[test]
    fn test_validity_boundary() {
        let mut cache = TokenCache::new();
        cache.store("AccessToken", 1_000).unwrap();

        assert!(cache.is_valid(999));
        assert!(!cache.is_valid(1_000));
        assert_eq!(cache.header_value(), "Bearer AccessToken");
        assert_eq!(cache.access_token(), "AccessToken");
    }

    #[test]
    fn test_oversized_token_keeps_previous() {
        let mut cache = TokenCache::new();
        cache.store("old", 5).unwrap();

        let huge = "x".repeat(TOKEN_CAPACITY);
        let err = cache.store(&huge, 10).unwrap_err();

        assert_eq!(err, SdkError::buffer_too_small("token", TOKEN_CAPACITY + 7, TOKEN_CAPACITY));
        assert_eq!(cache.access_token(), "old");
        assert_eq!(cache.expiry_msec(), 5);
    }

    #[test]
    fn test_debug_redacts_token() {
        let mut cache = TokenCache::new();
        cache.store("s3cret", 1).unwrap();
        let rendered = format!("{cache:?}");
        assert!(!rendered.contains("s3cret"));
        assert!(rendered.contains("REDACTED"));
    }

    #[test]
    fn test_invalidate() {
        let mut cache = TokenCache::new();
        cache.store("t", i64::MAX).unwrap();
        cache.invalidate();
        assert!(!cache.is_valid(0));
    }
}
