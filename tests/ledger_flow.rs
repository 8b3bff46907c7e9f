//! End-to-end flows over a file-backed store: seeded listing, filtered
//! totals, mutation-driven cache invalidation, selection consistency.

use std::sync::Arc;
use std::time::Duration;

use saldo::application::ledger::{LedgerOptions, LedgerService};
use saldo::application::pagination::{PageInfo, PageQuery, page_count};
use saldo::application::selection::PageSelection;
use saldo::domain::customers::{CustomerDraft, CustomerPatch, CustomerStatus};
use saldo::infra::blob::JsonBlobStore;
use tempfile::TempDir;

fn service_in(dir: &TempDir, options: LedgerOptions) -> LedgerService {
    let store = Arc::new(JsonBlobStore::new(dir.path().join("customers.json")));
    LedgerService::new(store, options)
}

fn small_pages() -> LedgerOptions {
    LedgerOptions {
        default_page_size: 5,
        page_size_options: vec![5, 10],
        ..LedgerOptions::default()
    }
}

#[tokio::test]
async fn seeded_collection_supports_the_canonical_scenario() {
    let dir = TempDir::new().expect("tempdir");
    let service = service_in(&dir, small_pages());

    // First access seeds ten records and pages them.
    let first = service
        .list_customers(&PageQuery::new("", 0, 5))
        .await
        .expect("seeded list");
    assert_eq!(first.data.len(), 5);
    assert_eq!(first.total, 10);

    // "Customer 1" matches Customer 1 and Customer 10 by substring.
    let filtered = service
        .list_customers(&PageQuery::new("Customer 1", 0, 10))
        .await
        .expect("filtered list");
    assert_eq!(filtered.total, 2);
    let names: Vec<&str> = filtered
        .data
        .iter()
        .map(|record| record.name.as_str())
        .collect();
    assert_eq!(names, vec!["Customer 1", "Customer 10"]);

    // Delete Customer 1 and the unfiltered total drops.
    let customer_1 = filtered
        .data
        .iter()
        .find(|record| record.name == "Customer 1")
        .expect("customer 1 present")
        .id;
    service
        .delete_customers(&[customer_1])
        .await
        .expect("delete");

    let after = service
        .list_customers(&PageQuery::new("", 0, 5))
        .await
        .expect("relist");
    assert_eq!(after.total, 9);
}

#[tokio::test]
async fn pagination_reaches_exactly_the_computed_page_count() {
    let dir = TempDir::new().expect("tempdir");
    let service = service_in(&dir, small_pages());

    let first = service
        .list_customers(&PageQuery::new("", 0, 5))
        .await
        .expect("list");
    let pages = page_count(first.total, 5);
    assert_eq!(pages, 2);

    let last = service
        .list_customers(&PageQuery::new("", 1, 5))
        .await
        .expect("last page");
    assert_eq!(last.data.len(), 5);

    let beyond = service
        .list_customers(&PageQuery::new("", pages as usize, 5))
        .await
        .expect("out of range");
    assert!(beyond.data.is_empty());
    assert_eq!(beyond.total, 10);

    let info = PageInfo::compute(&PageQuery::new("", 1, 5), last.total);
    assert_eq!(info.start, 6);
    assert_eq!(info.end, 10);
    assert!(info.can_previous);
    assert!(!info.can_next);
}

#[tokio::test]
async fn mutations_show_up_through_previously_cached_tuples() {
    let dir = TempDir::new().expect("tempdir");
    let service = service_in(&dir, LedgerOptions::default());
    let query = PageQuery::new("", 0, 10);

    let seeded = service.list_customers(&query).await.expect("warm cache");
    assert_eq!(seeded.total, 10);

    // Create: the new record leads the first page.
    let created = service
        .create_customer(CustomerDraft {
            name: "Acme Holdings".to_string(),
            description: Some("wholesale".to_string()),
            status: Some(CustomerStatus::Due),
            rate: 99.5,
            balance: None,
            deposit: None,
        })
        .await
        .expect("create");

    let after_create = service.list_customers(&query).await.expect("relist");
    assert_eq!(after_create.total, 11);
    assert_eq!(after_create.data[0].id, created.id);

    // Update: the merged fields are visible through the same tuple.
    service
        .update_customer(
            created.id,
            CustomerPatch {
                status: Some(CustomerStatus::Paid),
                balance: Some(1_250.0),
                ..CustomerPatch::default()
            },
        )
        .await
        .expect("update");

    let after_update = service.list_customers(&query).await.expect("relist");
    assert_eq!(after_update.data[0].status, CustomerStatus::Paid);
    assert_eq!(after_update.data[0].balance, 1_250.0);
    assert_eq!(after_update.data[0].rate, 99.5);

    // Delete: the tuple no longer shows the record.
    service
        .delete_customers(&[created.id])
        .await
        .expect("delete");
    let after_delete = service.list_customers(&query).await.expect("relist");
    assert_eq!(after_delete.total, 10);
    assert!(after_delete.data.iter().all(|record| record.id != created.id));
}

#[tokio::test]
async fn select_all_then_batch_delete_clears_the_page() {
    let dir = TempDir::new().expect("tempdir");
    let service = service_in(&dir, small_pages());

    let page = service
        .list_customers(&PageQuery::new("", 0, 5))
        .await
        .expect("list");
    assert_eq!(page.data.len(), 5);

    service.toggle_all_on_page();
    assert_eq!(service.selection_state(), PageSelection::All);
    let selected = service.selected_ids();
    assert_eq!(selected.len(), 5);

    let removed = service
        .delete_customers(&selected)
        .await
        .expect("batch delete");
    assert_eq!(removed, 5);

    let after = service
        .list_customers(&PageQuery::new("", 0, 5))
        .await
        .expect("relist");
    assert_eq!(after.total, 5);

    // The reload replaced the rendered page; deleted ids no longer
    // resolve, so nothing is observably selected.
    assert!(service.selected_records().is_empty());
    assert_eq!(service.selection_state(), PageSelection::None);
}

#[tokio::test]
async fn selection_follows_the_rendered_page_across_pagination() {
    let dir = TempDir::new().expect("tempdir");
    let service = service_in(&dir, small_pages());

    let first = service
        .list_customers(&PageQuery::new("", 0, 5))
        .await
        .expect("first page");
    let picked = first.data[2].id;
    service.toggle_row(picked);
    assert_eq!(service.selection_state(), PageSelection::Partial);

    // Paginating away hides the selection without purging it.
    service
        .list_customers(&PageQuery::new("", 1, 5))
        .await
        .expect("second page");
    assert!(service.selected_records().is_empty());
    assert_eq!(service.selection_state(), PageSelection::None);

    // Coming back makes the same row observable again.
    service
        .list_customers(&PageQuery::new("", 0, 5))
        .await
        .expect("back to first");
    assert_eq!(service.selected_ids(), vec![picked]);
}

#[tokio::test(start_paused = true)]
async fn debounced_search_drives_the_effective_listing() {
    let dir = TempDir::new().expect("tempdir");
    let service = service_in(&dir, LedgerOptions::default());
    service.set_page_index(1);

    service.set_raw_search_input("customer 1");
    tokio::time::sleep(Duration::from_millis(500)).await;

    let query = service.effective_query();
    assert_eq!(query.search, "customer 1");
    assert_eq!(query.page_index, 0);

    let page = service.list_effective().await.expect("effective list");
    assert_eq!(page.total, 2);
}
