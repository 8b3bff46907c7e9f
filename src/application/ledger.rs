//! The ledger service: the boundary contract presentational collaborators
//! call.
//!
//! Composes the entity store, query engine, query cache, search debouncer,
//! and selection coordinator into one constructible object with a defined
//! lifecycle: one instance per application session, no hidden globals.

use std::sync::{Arc, RwLock};
use std::time::Duration;

use tracing::info;
use uuid::Uuid;

use crate::application::error::LedgerError;
use crate::application::pagination::{
    DEFAULT_PAGE_SIZE, DEFAULT_PAGE_SIZE_OPTIONS, PageQuery, QueryPage,
};
use crate::application::query;
use crate::application::repos::CustomerStore;
use crate::application::search::{DEFAULT_DEBOUNCE, SearchDebouncer};
use crate::application::selection::{PageSelection, SelectionCoordinator};
use crate::cache::QueryCache;
use crate::cache::lock::rw_write;
use crate::domain::customers::{CustomerDraft, CustomerPatch, CustomerRecord};
use crate::domain::error::DomainError;

const SOURCE: &str = "application::ledger";

/// Tunables for a service instance; defaults mirror the table frontend's.
#[derive(Debug, Clone)]
pub struct LedgerOptions {
    pub debounce: Duration,
    pub default_page_size: usize,
    pub page_size_options: Vec<usize>,
}

impl Default for LedgerOptions {
    fn default() -> Self {
        Self {
            debounce: DEFAULT_DEBOUNCE,
            default_page_size: DEFAULT_PAGE_SIZE,
            page_size_options: DEFAULT_PAGE_SIZE_OPTIONS.to_vec(),
        }
    }
}

struct PageState {
    index: usize,
    size: usize,
    /// Search value the current page index was chosen under; a debounced
    /// transition away from it invalidates the user's position.
    last_search: String,
}

pub struct LedgerService {
    store: Arc<dyn CustomerStore>,
    cache: QueryCache,
    selection: SelectionCoordinator,
    search: SearchDebouncer,
    page_state: RwLock<PageState>,
    page_size_options: Vec<usize>,
}

impl LedgerService {
    pub fn new(store: Arc<dyn CustomerStore>, options: LedgerOptions) -> Self {
        Self {
            store,
            cache: QueryCache::new(),
            selection: SelectionCoordinator::new(),
            search: SearchDebouncer::new(options.debounce),
            page_state: RwLock::new(PageState {
                index: 0,
                size: options.default_page_size,
                last_search: String::new(),
            }),
            page_size_options: options.page_size_options,
        }
    }

    // ========================================================================
    // Query path
    // ========================================================================

    /// Resolve one page of customers for the given parameter tuple.
    ///
    /// Served from the query cache when possible; on a miss the full
    /// collection is loaded and filtered, with concurrent fetches for the
    /// same tuple collapsed into one load. The freshly resolved page also
    /// becomes the selection coordinator's rendered page.
    pub async fn list_customers(
        &self,
        query: &PageQuery,
    ) -> Result<QueryPage<CustomerRecord>, LedgerError> {
        self.ensure_page_size(query.page_size)?;

        if let Some(hit) = self.cache.get(query) {
            self.selection.sync_page(hit.data.clone());
            return Ok(hit);
        }

        let fetch_lock = self.cache.fetch_lock(query);
        let _in_flight = fetch_lock.lock().await;

        // A concurrent fetch may have filled the entry while we waited.
        if let Some(hit) = self.cache.get(query) {
            self.selection.sync_page(hit.data.clone());
            return Ok(hit);
        }

        let observed = self.cache.generation();
        let records = self.store.load_all().await?;
        let page = query::run(&records, query);

        // A mutation may have landed while the load was in flight; its
        // invalidation wins and this response is dropped from the cache.
        self.cache
            .insert_if_current(query.clone(), page.clone(), observed);
        self.selection.sync_page(page.data.clone());
        Ok(page)
    }

    /// Resolve the page addressed by the current effective parameters.
    pub async fn list_effective(&self) -> Result<QueryPage<CustomerRecord>, LedgerError> {
        let query = self.effective_query();
        self.list_customers(&query).await
    }

    // ========================================================================
    // Mutation gateway
    // ========================================================================

    /// Validate and persist a new customer. The record is prepended, so a
    /// subsequent first-page query shows it first.
    pub async fn create_customer(
        &self,
        draft: CustomerDraft,
    ) -> Result<CustomerRecord, LedgerError> {
        let record = draft.into_record()?;
        self.store.put(record.clone()).await?;
        self.cache.invalidate_all();
        info!(customer_id = %record.id, "Customer created");
        Ok(record)
    }

    /// Merge a partial update into an existing customer. The identifier is
    /// immutable; a patch for an unknown id is an error, not a silent
    /// no-op.
    pub async fn update_customer(
        &self,
        id: Uuid,
        patch: CustomerPatch,
    ) -> Result<CustomerRecord, LedgerError> {
        patch.validate()?;

        let records = self.store.load_all().await?;
        let mut record = records
            .into_iter()
            .find(|candidate| candidate.id == id)
            .ok_or(DomainError::NotFound { id })?;
        patch.apply_to(&mut record);

        self.store.put(record.clone()).await?;
        self.cache.invalidate_all();
        info!(customer_id = %id, "Customer updated");
        Ok(record)
    }

    /// Remove a batch of customers by id. Idempotent: unknown or
    /// already-deleted ids are ignored. Returns the number actually
    /// removed. Safe to call without any confirmation flow.
    pub async fn delete_customers(&self, ids: &[Uuid]) -> Result<usize, LedgerError> {
        let removed = self.store.remove_by_ids(ids).await?;
        self.cache.invalidate_all();
        info!(requested = ids.len(), removed, "Customers deleted");
        Ok(removed)
    }

    // ========================================================================
    // Search input
    // ========================================================================

    /// Feed raw keystroke input; it becomes effective after the debounce
    /// quiet period.
    pub fn set_raw_search_input(&self, text: impl Into<String>) {
        self.search.set_input(text);
    }

    /// The current effective parameter tuple. A debounced search
    /// transition observed here resets the page index to 0: changing the
    /// search term always invalidates the user's position in the result
    /// set.
    pub fn effective_query(&self) -> PageQuery {
        let search = self.search.effective();
        let mut state = rw_write(&self.page_state, SOURCE, "effective_query");
        if state.last_search != search {
            state.last_search = search.clone();
            state.index = 0;
        }
        PageQuery::new(search, state.index, state.size)
    }

    pub fn set_page_index(&self, index: usize) {
        rw_write(&self.page_state, SOURCE, "set_page_index").index = index;
    }

    /// Switch rows-per-page; resets the page index since the old position
    /// is meaningless under a new page geometry.
    pub fn set_page_size(&self, size: usize) -> Result<(), LedgerError> {
        self.ensure_page_size(size)?;
        let mut state = rw_write(&self.page_state, SOURCE, "set_page_size");
        state.size = size;
        state.index = 0;
        Ok(())
    }

    pub fn page_size_options(&self) -> &[usize] {
        &self.page_size_options
    }

    // ========================================================================
    // Selection
    // ========================================================================

    pub fn selected_records(&self) -> Vec<CustomerRecord> {
        self.selection.selected_records()
    }

    pub fn selected_ids(&self) -> Vec<Uuid> {
        self.selection.selected_ids()
    }

    pub fn toggle_row(&self, id: Uuid) {
        self.selection.toggle_row(id);
    }

    pub fn toggle_all_on_page(&self) {
        self.selection.toggle_all_on_page();
    }

    pub fn clear_selection(&self) {
        self.selection.clear();
    }

    pub fn selection_state(&self) -> PageSelection {
        self.selection.page_selection()
    }

    fn ensure_page_size(&self, size: usize) -> Result<(), LedgerError> {
        if size == 0 || !self.page_size_options.contains(&size) {
            return Err(DomainError::validation(format!(
                "page size {size} is not one of the allowed sizes {:?}",
                self.page_size_options
            ))
            .into());
        }
        Ok(())
    }
}
