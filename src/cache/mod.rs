//! Cache Module
//!
//! Durable TTL cache for upstream responses, partitioned by namespace.

mod entry;
mod key;
mod stats;
mod store;


// Re-export public types
pub use entry::CacheEntry;
pub use key::CacheKey;
pub use stats::CacheStats;
pub use store::ResponseCache;

// == Public Constants ==
/// Namespace for NewsAPI responses
pub const NEWS_NAMESPACE: &str = "news";

/// Namespace for sports query results
pub const SPORTS_NAMESPACE: &str = "sports";
