//! Row-selection bookkeeping across pagination and filtering changes.

use std::collections::HashMap;
use std::sync::RwLock;

use uuid::Uuid;

use crate::cache::lock::{rw_read, rw_write};
use crate::domain::customers::CustomerRecord;

const SOURCE: &str = "application::selection";

/// Tri-state of the page-level "select all" header control, computed from
/// the intersection of the selection map with the currently rendered
/// page's identifiers only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageSelection {
    None,
    /// Some but not all rendered rows are selected (indeterminate).
    Partial,
    All,
}

struct SelectionState {
    /// Identifier → selected flag, scoped to ids ever rendered. Flags for
    /// ids that no longer resolve to a loaded record are unobservable but
    /// not proactively purged.
    flags: HashMap<Uuid, bool>,
    /// The most recently loaded page, in render order.
    page: Vec<CustomerRecord>,
}

/// Tracks which currently-visible rows are selected.
///
/// The derived record view resolves selected identifiers against the most
/// recently loaded page data, so a mutation-triggered reload implicitly
/// drops selections of records that no longer exist.
pub struct SelectionCoordinator {
    inner: RwLock<SelectionState>,
}

impl SelectionCoordinator {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(SelectionState {
                flags: HashMap::new(),
                page: Vec::new(),
            }),
        }
    }

    /// Replace the rendered page. Called with every freshly loaded page
    /// slice, cache hit or miss.
    pub fn sync_page(&self, records: Vec<CustomerRecord>) {
        rw_write(&self.inner, SOURCE, "sync_page").page = records;
    }

    /// Flip one row's flag.
    pub fn toggle_row(&self, id: Uuid) {
        let mut inner = rw_write(&self.inner, SOURCE, "toggle_row");
        let flag = inner.flags.entry(id).or_insert(false);
        *flag = !*flag;
    }

    /// Header control behavior: from none-selected, select exactly the
    /// rendered page; from indeterminate or all-selected, clear the whole
    /// selection.
    pub fn toggle_all_on_page(&self) {
        let mut inner = rw_write(&self.inner, SOURCE, "toggle_all_on_page");
        match page_selection_of(&inner) {
            PageSelection::None => {
                let ids: Vec<Uuid> = inner.page.iter().map(|record| record.id).collect();
                for id in ids {
                    inner.flags.insert(id, true);
                }
            }
            PageSelection::Partial | PageSelection::All => inner.flags.clear(),
        }
    }

    pub fn clear(&self) {
        rw_write(&self.inner, SOURCE, "clear").flags.clear();
    }

    pub fn page_selection(&self) -> PageSelection {
        page_selection_of(&rw_read(&self.inner, SOURCE, "page_selection"))
    }

    /// Full records for every selected row resolvable through the
    /// currently loaded page, in render order.
    pub fn selected_records(&self) -> Vec<CustomerRecord> {
        let inner = rw_read(&self.inner, SOURCE, "selected_records");
        inner
            .page
            .iter()
            .filter(|record| inner.flags.get(&record.id).copied().unwrap_or(false))
            .cloned()
            .collect()
    }

    /// Identifiers of the selected, currently resolvable rows; the shape a
    /// batch delete wants.
    pub fn selected_ids(&self) -> Vec<Uuid> {
        self.selected_records()
            .into_iter()
            .map(|record| record.id)
            .collect()
    }
}

impl Default for SelectionCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

fn page_selection_of(state: &SelectionState) -> PageSelection {
    if state.page.is_empty() {
        return PageSelection::None;
    }
    let selected = state
        .page
        .iter()
        .filter(|record| state.flags.get(&record.id).copied().unwrap_or(false))
        .count();
    if selected == 0 {
        PageSelection::None
    } else if selected == state.page.len() {
        PageSelection::All
    } else {
        PageSelection::Partial
    }
}
