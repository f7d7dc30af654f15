use std::sync::RwLock;

use async_trait::async_trait;

use pricehub_core::{ImportStats, PriceRecord};

use super::{PriceStore, StoreError};

/// In-memory price store.
///
/// Intended for tests/dev. A batch is staged and only appended once every
/// record made it, which mirrors the transactional contract of the Postgres store.
#[derive(Debug, Default)]
pub struct InMemoryPriceStore {
    rows: RwLock<Vec<PriceRecord>>,
    fail_at: Option<usize>,
}

impl InMemoryPriceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store that rejects the record at `index` of every batch (fault injection).
    pub fn failing_at(index: usize) -> Self {
        Self {
            rows: RwLock::new(Vec::new()),
            fail_at: Some(index),
        }
    }

    /// Pre-populated store.
    pub fn with_records(records: Vec<PriceRecord>) -> Self {
        Self {
            rows: RwLock::new(records),
            fail_at: None,
        }
    }

    pub fn len(&self) -> usize {
        self.rows.read().map(|rows| rows.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn poisoned(operation: &'static str) -> StoreError {
    StoreError::Transaction {
        operation,
        message: "lock poisoned".to_string(),
    }
}

#[async_trait]
impl PriceStore for InMemoryPriceStore {
    async fn insert_batch(&self, records: &[PriceRecord]) -> Result<ImportStats, StoreError> {
        let mut rows = self.rows.write().map_err(|_| poisoned("insert_batch"))?;

        let mut staged = Vec::with_capacity(records.len());
        for (idx, record) in records.iter().enumerate() {
            if self.fail_at == Some(idx) {
                tracing::debug!(idx, "injected insert failure");
                return Err(StoreError::Query {
                    operation: "insert_price",
                    message: format!("injected failure at record {idx}"),
                });
            }
            staged.push(record.clone());
        }

        rows.extend(staged);
        Ok(ImportStats::from_records(rows.iter()))
    }

    async fn fetch_all(&self) -> Result<Vec<PriceRecord>, StoreError> {
        let rows = self.rows.read().map_err(|_| poisoned("fetch_all"))?;
        Ok(rows.clone())
    }

    async fn aggregate(&self) -> Result<ImportStats, StoreError> {
        let rows = self.rows.read().map_err(|_| poisoned("aggregate"))?;
        Ok(ImportStats::from_records(rows.iter()))
    }
}
