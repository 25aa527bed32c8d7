//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with TTL support.

use std::time::Duration;

use super::clock::duration_ms;

// == Cache Entry ==
/// A stored value together with the time it was written and its expiry.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry<V> {
    /// The stored value
    pub value: V,
    /// Write timestamp (Unix milliseconds)
    pub stored_at: u64,
    /// Expiration timestamp (Unix milliseconds), always `stored_at + ttl`
    pub expires_at: u64,
}

impl<V> CacheEntry<V> {
    // == Constructor ==
    /// Creates an entry written at `now_ms` that lives for `ttl`.
    ///
    /// A zero TTL is clamped to one millisecond so that `expires_at` is
    /// always strictly after `stored_at`.
    pub fn new(value: V, now_ms: u64, ttl: Duration) -> Self {
        let ttl_ms = duration_ms(ttl).max(1);

        Self {
            value,
            stored_at: now_ms,
            expires_at: now_ms.saturating_add(ttl_ms),
        }
    }

    // == Is Live ==
    /// An entry is live up to and including its expiry instant.
    pub fn is_live(&self, now_ms: u64) -> bool {
        now_ms <= self.expires_at
    }

    // == Time To Live ==
    /// Remaining lifetime in milliseconds, zero once expired.
    pub fn ttl_remaining_ms(&self, now_ms: u64) -> u64 {
        self.expires_at.saturating_sub(now_ms)
    }
}
