// Cache module for in-memory query result caching.
// Holds the TTL store and the background task that sweeps it.

pub mod store;
pub mod sweeper;

pub use store::{CacheEntry, LISTING_TTL, SEARCH_TTL, TtlCache};
pub use sweeper::{CacheSweeper, DEFAULT_SWEEP_INTERVAL};
