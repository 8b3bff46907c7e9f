//! Query memoization for the ledger service.
//!
//! A pure memoization layer keyed structurally by the
//! `(search, page_index, page_size)` tuple. There is no eviction policy
//! and no TTL: staleness is bounded by "has any mutation occurred since",
//! enforced by [`QueryCache::invalidate_all`]. The cache also deduplicates
//! concurrent fetches for one key and discards responses computed against
//! a superseded generation.

pub(crate) mod lock;
mod store;

pub use store::QueryCache;
