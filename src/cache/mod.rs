//! Cache Module
//!
//! Provides the in-memory TTL cache shared by the server read/write paths and
//! the client orchestration hook.

mod clock;
mod entry;
pub mod keys;
mod stats;
mod store;


// Re-export public types
pub use clock::{current_timestamp_ms, Clock, ManualClock, SystemClock};
pub(crate) use clock::duration_ms;
pub use entry::CacheEntry;
pub use stats::CacheStats;
pub use store::TtlCache;

use std::time::Duration;

// == Public Constants ==
/// Default TTL of the client-side cache (5 minutes)
pub const CLIENT_DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);

/// Default TTL of server-side collection results (1 hour)
pub const SERVER_DEFAULT_TTL: Duration = Duration::from_secs(60 * 60);
