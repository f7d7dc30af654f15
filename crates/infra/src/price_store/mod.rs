//! Price storage boundary.
//!
//! `PriceStore` hides the storage engine from the import/export service.
//! Implementations must make `insert_batch` all-or-nothing.

pub mod in_memory;
pub mod postgres;

use async_trait::async_trait;
use thiserror::Error;

use pricehub_core::{ImportStats, PriceRecord};

pub use in_memory::InMemoryPriceStore;
pub use postgres::PostgresPriceStore;

/// Storage failure. Messages are for operator logs, not for clients.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    /// Could not obtain a connection (pool closed, network down, timeout).
    #[error("connection failed in {operation}: {message}")]
    Connection { operation: &'static str, message: String },

    /// A statement was rejected by the database.
    #[error("query failed in {operation}: {message}")]
    Query { operation: &'static str, message: String },

    /// Begin/commit/rollback failed.
    #[error("transaction failed in {operation}: {message}")]
    Transaction { operation: &'static str, message: String },

    /// A stored row could not be turned back into a record.
    #[error("stored row is invalid: {0}")]
    Decode(String),
}

/// Persistence gateway for price records.
#[async_trait]
pub trait PriceStore: Send + Sync {
    /// Insert every record in one transaction, then compute the aggregate over
    /// the whole table inside that same transaction and commit.
    ///
    /// On any failure nothing from `records` is visible afterwards.
    async fn insert_batch(&self, records: &[PriceRecord]) -> Result<ImportStats, StoreError>;

    /// All stored records in stable storage order.
    async fn fetch_all(&self) -> Result<Vec<PriceRecord>, StoreError>;

    /// Aggregate over everything currently stored.
    async fn aggregate(&self) -> Result<ImportStats, StoreError>;
}

#[async_trait]
impl<S> PriceStore for std::sync::Arc<S>
where
    S: PriceStore + ?Sized,
{
    async fn insert_batch(&self, records: &[PriceRecord]) -> Result<ImportStats, StoreError> {
        (**self).insert_batch(records).await
    }

    async fn fetch_all(&self) -> Result<Vec<PriceRecord>, StoreError> {
        (**self).fetch_all().await
    }

    async fn aggregate(&self) -> Result<ImportStats, StoreError> {
        (**self).aggregate().await
    }
}
