//! Cache Statistics Module
//!
//! Counters describing how lookups were answered. Used for introspection only.

use serde::Serialize;

// == Cache Stats ==
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CacheStats {
    /// Lookups answered with a live entry
    pub hits: u64,
    /// Lookups that found nothing usable (missing or expired)
    pub misses: u64,
    /// Stale entries evicted lazily by a lookup
    pub expired: u64,
}

impl CacheStats {
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Returns hits / (hits + misses), or 0.0 if nothing was looked up yet.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    /// An expired entry counts as a miss as well as an eviction.
    pub fn record_expired(&mut self) {
        self.misses += 1;
        self.expired += 1;
    }
}
