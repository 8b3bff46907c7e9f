//! Query cache storage.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

use metrics::counter;
use tokio::sync::Mutex as FetchMutex;
use tracing::debug;

use super::lock::{mutex_lock, rw_read, rw_write};
use crate::application::pagination::{PageQuery, QueryPage};
use crate::domain::customers::CustomerRecord;

const SOURCE: &str = "cache::store";

/// Monotonic counter identifying the cache's coherence window.
///
/// Every `invalidate_all` starts a new generation; a response computed
/// under an older generation is stale by definition and must not be
/// stored.
pub type Generation = u64;

struct CacheInner {
    entries: HashMap<PageQuery, QueryPage<CustomerRecord>>,
    generation: Generation,
}

/// Memoizes query results per parameter tuple.
///
/// Entries are created lazily on first query and destroyed wholesale
/// (all keys, regardless of which record changed) whenever a mutation
/// succeeds. No eviction, no TTL.
pub struct QueryCache {
    inner: RwLock<CacheInner>,
    // One async lock per key so concurrent fetches for the same tuple
    // collapse into a single store read.
    inflight: Mutex<HashMap<PageQuery, Arc<FetchMutex<()>>>>,
}

impl QueryCache {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(CacheInner {
                entries: HashMap::new(),
                generation: 0,
            }),
            inflight: Mutex::new(HashMap::new()),
        }
    }

    pub fn get(&self, key: &PageQuery) -> Option<QueryPage<CustomerRecord>> {
        let hit = rw_read(&self.inner, SOURCE, "get").entries.get(key).cloned();
        if hit.is_some() {
            counter!("saldo_query_cache_hit_total").increment(1);
        } else {
            counter!("saldo_query_cache_miss_total").increment(1);
        }
        hit
    }

    /// Generation observed at the start of a fetch; pass it back to
    /// [`Self::insert_if_current`] when the result is ready.
    pub fn generation(&self) -> Generation {
        rw_read(&self.inner, SOURCE, "generation").generation
    }

    /// Store a computed page unless the cache has been invalidated since
    /// `observed` was read. Returns whether the entry was stored.
    pub fn insert_if_current(
        &self,
        key: PageQuery,
        page: QueryPage<CustomerRecord>,
        observed: Generation,
    ) -> bool {
        let mut inner = rw_write(&self.inner, SOURCE, "insert_if_current");
        if inner.generation != observed {
            counter!("saldo_query_cache_stale_discard_total").increment(1);
            debug!(
                search = %key.search,
                page_index = key.page_index,
                page_size = key.page_size,
                observed_generation = observed,
                current_generation = inner.generation,
                "Discarded stale query response"
            );
            return false;
        }
        inner.entries.insert(key, page);
        true
    }

    /// Flush every entry and open a new generation. Called by the mutation
    /// gateway after, and only after, a successful store write.
    pub fn invalidate_all(&self) {
        let mut inner = rw_write(&self.inner, SOURCE, "invalidate_all");
        inner.entries.clear();
        inner.generation += 1;
        counter!("saldo_query_cache_invalidate_total").increment(1);
        debug!(generation = inner.generation, "Query cache invalidated");
    }

    /// Per-key fetch lock for single-flight de-duplication. Callers lock
    /// the returned mutex for the duration of a cache-miss fetch; waiters
    /// re-check the cache once they acquire it.
    pub fn fetch_lock(&self, key: &PageQuery) -> Arc<FetchMutex<()>> {
        let mut inflight = mutex_lock(&self.inflight, SOURCE, "fetch_lock");
        inflight
            .entry(key.clone())
            .or_insert_with(|| Arc::new(FetchMutex::new(())))
            .clone()
    }

    pub fn len(&self) -> usize {
        rw_read(&self.inner, SOURCE, "len").entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new()
    }
}
