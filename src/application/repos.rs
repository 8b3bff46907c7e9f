//! Repository trait describing the persistence adapter.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::customers::CustomerRecord;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("serialization error: {0}")]
    Serialization(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }

    pub fn from_serialization(err: impl std::fmt::Display) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Ground-truth collection of customer records.
///
/// Every mutation is a read-modify-write over the full collection; the
/// whole collection is re-persisted on each call. That is acceptable only
/// under the single-writer assumption: implementations serialize their
/// own writes, but two independent processes mutating one backing blob
/// can lose updates.
///
/// The production adapter is [`crate::infra::blob::JsonBlobStore`]; a
/// network-backed store can be substituted without touching the query,
/// cache, or selection layers.
#[async_trait]
pub trait CustomerStore: Send + Sync {
    /// Load the full collection in storage order.
    ///
    /// Read-path failures degrade rather than propagate where the backing
    /// medium allows it (a corrupt local blob resets to the seeded
    /// collection); the `Err` branch is reserved for adapters that cannot
    /// recover locally.
    async fn load_all(&self) -> Result<Vec<CustomerRecord>, StoreError>;

    /// Upsert one record: replace in place when the id exists, otherwise
    /// prepend so the collection stays most-recent-first.
    async fn put(&self, record: CustomerRecord) -> Result<(), StoreError>;

    /// Bulk upsert; new records are prepended as a block in the given
    /// order, existing ids are replaced in place.
    async fn put_many(&self, records: Vec<CustomerRecord>) -> Result<(), StoreError>;

    /// Remove every record whose id appears in `ids`; unknown ids are
    /// ignored. Returns the number of records actually removed.
    async fn remove_by_ids(&self, ids: &[Uuid]) -> Result<usize, StoreError>;
}
