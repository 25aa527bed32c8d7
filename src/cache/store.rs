//! Cache Store Module
//!
//! Pure TTL cache: a HashMap of entries with lazy expiry. There is no
//! capacity bound and no background sweeper; stale entries are removed when a
//! lookup touches them.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use serde_json::Value;
use tracing::trace;

use crate::cache::{CacheEntry, CacheStats, Clock, SystemClock};
use crate::lock::mutex_lock;

const SOURCE: &str = "cache::store";

// == Inner State ==
#[derive(Debug)]
struct Inner<V> {
    entries: HashMap<String, CacheEntry<V>>,
    stats: CacheStats,
}

// == TTL Cache ==
/// In-memory key/value cache with per-entry time-to-live.
///
/// Every method takes `&self`; the map is guarded by a mutex that is held for
/// one operation only, so operations are atomic with respect to each other.
pub struct TtlCache<V = Value> {
    inner: Mutex<Inner<V>>,
    default_ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl<V: Clone> TtlCache<V> {
    // == Constructor ==
    /// Creates a cache on the system clock.
    ///
    /// # Arguments
    /// * `default_ttl` - TTL applied by [`set_default`](Self::set_default)
    pub fn new(default_ttl: Duration) -> Self {
        Self::with_clock(default_ttl, Arc::new(SystemClock))
    }

    /// Creates a cache reading time from `clock`.
    pub fn with_clock(default_ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            inner: Mutex::new(Inner {
                entries: HashMap::new(),
                stats: CacheStats::new(),
            }),
            default_ttl,
            clock,
        }
    }

    /// TTL used when the caller does not pass one.
    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    // == Set ==
    /// Stores `value` under `key` for `ttl`, replacing any existing entry.
    pub fn set(&self, key: impl Into<String>, value: V, ttl: Duration) {
        let entry = CacheEntry::new(value, self.clock.now_ms(), ttl);
        self.lock("set").entries.insert(key.into(), entry);
    }

    /// Stores `value` under `key` with the default TTL.
    pub fn set_default(&self, key: impl Into<String>, value: V) {
        self.set(key, value, self.default_ttl);
    }

    // == Get ==
    /// Returns the live value for `key`.
    ///
    /// Missing and expired keys both yield `None`; an expired entry is
    /// removed by this call.
    pub fn get(&self, key: &str) -> Option<V> {
        let now = self.clock.now_ms();
        let mut guard = self.lock("get");
        let inner = &mut *guard;

        match inner.entries.get(key) {
            Some(entry) if entry.is_live(now) => {
                let value = entry.value.clone();
                inner.stats.record_hit();
                Some(value)
            }
            Some(_) => {
                inner.entries.remove(key);
                inner.stats.record_expired();
                trace!(key, "evicted expired cache entry");
                None
            }
            None => {
                inner.stats.record_miss();
                None
            }
        }
    }

    // == Has ==
    /// Same liveness rule as [`get`](Self::get) without cloning the value.
    pub fn has(&self, key: &str) -> bool {
        let now = self.clock.now_ms();
        let mut guard = self.lock("has");
        let inner = &mut *guard;

        match inner.entries.get(key).map(|entry| entry.is_live(now)) {
            Some(true) => true,
            Some(false) => {
                inner.entries.remove(key);
                inner.stats.record_expired();
                trace!(key, "evicted expired cache entry");
                false
            }
            None => false,
        }
    }

    /// Remaining lifetime of a live entry. Does not evict or count as a
    /// lookup.
    pub fn ttl_remaining(&self, key: &str) -> Option<Duration> {
        let now = self.clock.now_ms();
        self.lock("ttl_remaining")
            .entries
            .get(key)
            .filter(|entry| entry.is_live(now))
            .map(|entry| Duration::from_millis(entry.ttl_remaining_ms(now)))
    }

    // == Delete ==
    /// Removes `key`. Returns whether an entry was present.
    pub fn delete(&self, key: &str) -> bool {
        self.lock("delete").entries.remove(key).is_some()
    }

    /// Removes every key starting with the literal `prefix`.
    ///
    /// Returns the number of entries removed.
    pub fn delete_by_prefix(&self, prefix: &str) -> usize {
        let mut inner = self.lock("delete_by_prefix");
        let before = inner.entries.len();
        inner.entries.retain(|key, _| !key.starts_with(prefix));
        before - inner.entries.len()
    }

    /// Removes all entries. Statistics are kept.
    pub fn clear(&self) {
        self.lock("clear").entries.clear();
    }

    // == Introspection ==
    /// All physically present keys, sorted. May include expired entries that
    /// no lookup has touched yet.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.lock("keys").entries.keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Number of physically present entries, same accounting as `keys`.
    pub fn size(&self) -> usize {
        self.lock("size").entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// Snapshot of the lookup counters.
    pub fn stats(&self) -> CacheStats {
        self.lock("stats").stats.clone()
    }

    fn lock(&self, op: &'static str) -> MutexGuard<'_, Inner<V>> {
        mutex_lock(&self.inner, SOURCE, op)
    }
}

impl<V> fmt::Debug for TtlCache<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TtlCache")
            .field("default_ttl", &self.default_ttl)
            .finish_non_exhaustive()
    }
}
