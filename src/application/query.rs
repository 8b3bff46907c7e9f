//! The query engine: derive a filtered, paginated view from the full
//! collection.

use crate::application::pagination::{PageQuery, QueryPage};
use crate::domain::customers::CustomerRecord;

/// Run `query` against the collection in storage order.
///
/// Filtering matches the trimmed, case-folded search text as a substring
/// of any of the six statically declared field projections (OR across
/// fields, no tokenization). `total` counts matches before slicing; a
/// page index beyond the last page yields an empty slice, never an error.
pub fn run(records: &[CustomerRecord], query: &PageQuery) -> QueryPage<CustomerRecord> {
    let needle = query.search.trim().to_lowercase();

    let filtered: Vec<&CustomerRecord> = if needle.is_empty() {
        records.iter().collect()
    } else {
        records
            .iter()
            .filter(|record| matches(record, &needle))
            .collect()
    };

    let total = filtered.len() as u64;
    let data = filtered
        .into_iter()
        .skip(query.offset())
        .take(query.page_size)
        .cloned()
        .collect();

    QueryPage::new(data, total)
}

/// `needle` must already be trimmed and lowercased.
fn matches(record: &CustomerRecord, needle: &str) -> bool {
    record
        .search_haystacks()
        .iter()
        .any(|haystack| haystack.to_lowercase().contains(needle))
}
