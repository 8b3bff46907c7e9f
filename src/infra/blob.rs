//! File-backed JSON blob persistence for the customer collection.
//!
//! The whole collection lives in one named blob (a JSON array of records)
//! at a fixed path. Every mutation re-serializes and re-persists the full
//! collection; writes are serialized behind an internal async mutex, which
//! is sufficient under the single-writer assumption the store documents.

use std::io::ErrorKind;
use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::application::repos::{CustomerStore, StoreError};
use crate::domain::customers::{CustomerRecord, CustomerStatus};

/// Size of the deterministic sample collection seeded on first access.
pub const SEED_COUNT: usize = 10;

/// The fixed sample collection: `Customer 1`..`Customer 10`, statuses
/// cycling through the four values, amounts on fixed arithmetic
/// progressions. Ids are stable so re-seeding after corruption converges
/// on the same collection.
pub fn seed_records() -> Vec<CustomerRecord> {
    const STATUSES: [CustomerStatus; 4] = [
        CustomerStatus::Open,
        CustomerStatus::Paid,
        CustomerStatus::Due,
        CustomerStatus::Inactive,
    ];

    (0..SEED_COUNT)
        .map(|i| CustomerRecord {
            id: Uuid::from_u128(i as u128 + 1),
            name: format!("Customer {}", i + 1),
            description: String::new(),
            status: STATUSES[i % STATUSES.len()],
            rate: 25.0 + 5.0 * i as f64,
            balance: 100.0 * (i + 1) as f64,
            deposit: 50.0 * (i + 1) as f64,
        })
        .collect()
}

pub struct JsonBlobStore {
    path: PathBuf,
    latency: Option<Duration>,
    write_guard: Mutex<()>,
}

impl JsonBlobStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            latency: None,
            write_guard: Mutex::new(()),
        }
    }

    /// Add an artificial per-operation delay, for demos that want the
    /// feel of a remote backend.
    pub fn with_latency(path: impl Into<PathBuf>, latency: Duration) -> Self {
        Self {
            path: path.into(),
            latency: (latency > Duration::ZERO).then_some(latency),
            write_guard: Mutex::new(()),
        }
    }

    async fn simulate_latency(&self) {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }

    /// Read the blob, degrading instead of propagating: a missing blob
    /// seeds the sample collection, a corrupt or unreadable one is
    /// replaced by it. Read-path problems never reach the caller.
    async fn read_or_seed(&self) -> Vec<CustomerRecord> {
        match fs::read(&self.path).await {
            Ok(bytes) => match serde_json::from_slice(&bytes) {
                Ok(records) => records,
                Err(err) => {
                    warn!(
                        path = %self.path.display(),
                        error = %err,
                        "Persisted blob is corrupt; resetting to the seed collection"
                    );
                    self.persist_seed().await
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "No persisted blob; seeding");
                self.persist_seed().await
            }
            Err(err) => {
                warn!(
                    path = %self.path.display(),
                    error = %err,
                    "Persisted blob is unreadable; serving the seed collection"
                );
                seed_records()
            }
        }
    }

    /// Best effort: the seeded collection is served even when it cannot
    /// be persisted.
    async fn persist_seed(&self) -> Vec<CustomerRecord> {
        let seeded = seed_records();
        if let Err(err) = self.write_blob(&seeded).await {
            warn!(
                path = %self.path.display(),
                error = %err,
                "Failed to persist the seed collection"
            );
        }
        seeded
    }

    /// Overwrite the blob with the deterministic seed collection,
    /// discarding whatever it held. Returns the seeded records.
    pub async fn reset_to_seed(&self) -> Result<Vec<CustomerRecord>, StoreError> {
        self.simulate_latency().await;
        let _rmw = self.write_guard.lock().await;

        let seeded = seed_records();
        self.write_blob(&seeded).await?;
        Ok(seeded)
    }

    async fn write_blob(&self, records: &[CustomerRecord]) -> Result<(), StoreError> {
        let bytes =
            serde_json::to_vec_pretty(records).map_err(StoreError::from_serialization)?;
        fs::write(&self.path, bytes).await?;
        Ok(())
    }
}

#[async_trait]
impl CustomerStore for JsonBlobStore {
    async fn load_all(&self) -> Result<Vec<CustomerRecord>, StoreError> {
        self.simulate_latency().await;
        Ok(self.read_or_seed().await)
    }

    async fn put(&self, record: CustomerRecord) -> Result<(), StoreError> {
        self.simulate_latency().await;
        let _rmw = self.write_guard.lock().await;

        let mut records = self.read_or_seed().await;
        if let Some(existing) = records.iter_mut().find(|existing| existing.id == record.id) {
            *existing = record;
        } else {
            records.insert(0, record);
        }
        self.write_blob(&records).await
    }

    async fn put_many(&self, incoming: Vec<CustomerRecord>) -> Result<(), StoreError> {
        self.simulate_latency().await;
        let _rmw = self.write_guard.lock().await;

        let mut records = self.read_or_seed().await;
        let mut fresh = Vec::new();
        for record in incoming {
            if let Some(existing) = records.iter_mut().find(|existing| existing.id == record.id)
            {
                *existing = record;
            } else {
                fresh.push(record);
            }
        }
        // New records land at the front as a block, preserving their order.
        records.splice(0..0, fresh);
        self.write_blob(&records).await
    }

    async fn remove_by_ids(&self, ids: &[Uuid]) -> Result<usize, StoreError> {
        self.simulate_latency().await;
        let _rmw = self.write_guard.lock().await;

        let mut records = self.read_or_seed().await;
        let before = records.len();
        records.retain(|record| !ids.contains(&record.id));
        let removed = before - records.len();
        self.write_blob(&records).await?;
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;
    use crate::domain::customers::CustomerDraft;

    fn store_in(dir: &TempDir) -> JsonBlobStore {
        JsonBlobStore::new(dir.path().join("customers.json"))
    }

    fn draft(name: &str) -> CustomerRecord {
        CustomerDraft::new(name, 30.0)
            .into_record()
            .expect("valid draft")
    }

    #[tokio::test]
    async fn first_access_seeds_ten_records() {
        let dir = TempDir::new().expect("tempdir");
        let store = store_in(&dir);

        let records = store.load_all().await.expect("load");

        assert_eq!(records.len(), SEED_COUNT);
        assert_eq!(records[0].name, "Customer 1");
        assert_eq!(records[9].name, "Customer 10");
        assert_eq!(records[0].status, CustomerStatus::Open);
        assert_eq!(records[1].status, CustomerStatus::Paid);
        assert_eq!(records[4].status, CustomerStatus::Open);
        assert_eq!(records[0].rate, 25.0);
        assert_eq!(records[9].rate, 70.0);
        assert_eq!(records[9].balance, 1000.0);
        assert_eq!(records[9].deposit, 500.0);

        // The seed was persisted, not just served.
        assert!(dir.path().join("customers.json").exists());
    }

    #[tokio::test]
    async fn corrupt_blob_resets_to_seed() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("customers.json");
        std::fs::write(&path, b"{ not json ]").expect("write garbage");

        let store = JsonBlobStore::new(&path);
        let records = store.load_all().await.expect("load degrades");

        assert_eq!(records.len(), SEED_COUNT);

        // The blob on disk is valid again.
        let bytes = std::fs::read(&path).expect("read back");
        let reparsed: Vec<CustomerRecord> =
            serde_json::from_slice(&bytes).expect("valid JSON after reset");
        assert_eq!(reparsed.len(), SEED_COUNT);
    }

    #[tokio::test]
    async fn reseeding_is_deterministic() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("customers.json");

        let first = JsonBlobStore::new(&path).load_all().await.expect("seed");
        std::fs::write(&path, b"garbage").expect("corrupt");
        let second = JsonBlobStore::new(&path)
            .load_all()
            .await
            .expect("reseed");

        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn put_prepends_new_records() {
        let dir = TempDir::new().expect("tempdir");
        let store = store_in(&dir);
        store.load_all().await.expect("seed");

        let record = draft("Newest");
        store.put(record.clone()).await.expect("put");

        let records = store.load_all().await.expect("reload");
        assert_eq!(records.len(), SEED_COUNT + 1);
        assert_eq!(records[0].id, record.id);
        assert_eq!(records[1].name, "Customer 1");
    }

    #[tokio::test]
    async fn put_replaces_in_place_preserving_order() {
        let dir = TempDir::new().expect("tempdir");
        let store = store_in(&dir);
        let mut third = store.load_all().await.expect("seed")[2].clone();
        third.balance = 9_999.0;

        store.put(third.clone()).await.expect("put");

        let records = store.load_all().await.expect("reload");
        assert_eq!(records.len(), SEED_COUNT);
        assert_eq!(records[2].id, third.id);
        assert_eq!(records[2].balance, 9_999.0);
    }

    #[tokio::test]
    async fn put_many_prepends_fresh_block_in_order() {
        let dir = TempDir::new().expect("tempdir");
        let store = store_in(&dir);
        store.load_all().await.expect("seed");

        let a = draft("A");
        let b = draft("B");
        store.put_many(vec![a.clone(), b.clone()]).await.expect("put_many");

        let records = store.load_all().await.expect("reload");
        assert_eq!(records.len(), SEED_COUNT + 2);
        assert_eq!(records[0].id, a.id);
        assert_eq!(records[1].id, b.id);
    }

    #[tokio::test]
    async fn remove_by_ids_is_idempotent() {
        let dir = TempDir::new().expect("tempdir");
        let store = store_in(&dir);
        let victim = store.load_all().await.expect("seed")[0].id;

        assert_eq!(store.remove_by_ids(&[victim]).await.expect("remove"), 1);
        assert_eq!(store.remove_by_ids(&[victim]).await.expect("repeat"), 0);

        let records = store.load_all().await.expect("reload");
        assert_eq!(records.len(), SEED_COUNT - 1);
        assert!(records.iter().all(|record| record.id != victim));
    }

    #[tokio::test]
    async fn reset_discards_accumulated_records() {
        let dir = TempDir::new().expect("tempdir");
        let store = store_in(&dir);
        store.put(draft("Extra")).await.expect("put");

        let seeded = store.reset_to_seed().await.expect("reset");
        assert_eq!(seeded.len(), SEED_COUNT);

        let records = store.load_all().await.expect("reload");
        assert_eq!(records.len(), SEED_COUNT);
        assert_eq!(records[0].name, "Customer 1");
    }

    #[tokio::test]
    async fn mutations_survive_a_new_store_instance() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("customers.json");

        let record = draft("Persistent");
        {
            let store = JsonBlobStore::new(&path);
            store.put(record.clone()).await.expect("put");
        }

        let reopened = JsonBlobStore::new(&path);
        let records = reopened.load_all().await.expect("load");
        assert_eq!(records[0].id, record.id);
    }

    #[tokio::test(start_paused = true)]
    async fn simulated_latency_delays_operations() {
        let dir = TempDir::new().expect("tempdir");
        let store = JsonBlobStore::with_latency(
            dir.path().join("customers.json"),
            Duration::from_millis(500),
        );

        let started = tokio::time::Instant::now();
        store.load_all().await.expect("load");
        assert!(started.elapsed() >= Duration::from_millis(500));
    }
}
