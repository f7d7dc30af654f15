//! Service wiring and the import/export orchestration.
//!
//! Import (transactional):
//! extract `*data.csv` → parse every row (short rows skipped, bad price aborts)
//! → one transaction: insert all + storage-side aggregate → commit.
//! Nothing touches storage until the whole upload parsed cleanly.
//!
//! Export:
//! fetch all rows → encode CSV → wrap in zip. The response is only built from
//! a finished buffer, so a failure never produces partial output.

use std::sync::Arc;

use axum::body::Bytes;
use thiserror::Error;
use tracing::instrument;

use pricehub_codec::{CodecError, ParsedBatch, PriceArchive, RecordParser};
use pricehub_core::ImportStats;
use pricehub_infra::{db, InMemoryPriceStore, PostgresPriceStore, PriceStore, StoreError};

use crate::config::ApiConfig;

/// Import failure.
#[derive(Debug, Error)]
pub enum ImportError {
    /// Archive or CSV problem caused by the upload itself.
    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error("archive has no entry ending in data.csv")]
    MissingEntry,

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("import task failed: {0}")]
    Internal(String),
}

/// Export failure.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Encoding(#[from] CodecError),

    #[error("export task failed: {0}")]
    Internal(String),
}

/// Extract and parse an uploaded archive; the entry may inflate to `max_entry_bytes`.
pub fn decode_upload(upload: &[u8], max_entry_bytes: u64) -> Result<ParsedBatch, ImportError> {
    let mut archive = PriceArchive::open(upload)?;
    let entry = archive
        .data_entry(max_entry_bytes)?
        .ok_or(ImportError::MissingEntry)?;
    Ok(RecordParser::new(entry).parse_all()?)
}

/// Import/export orchestrator over an injected store.
#[derive(Clone)]
pub struct PriceCatalogService {
    store: Arc<dyn PriceStore>,
    max_entry_bytes: u64,
}

impl PriceCatalogService {
    pub fn new(store: Arc<dyn PriceStore>, max_entry_bytes: u64) -> Self {
        Self {
            store,
            max_entry_bytes,
        }
    }

    /// Import one uploaded archive and report the post-commit aggregate.
    #[instrument(skip_all, fields(upload_bytes = upload.len()), err)]
    pub async fn import_archive(&self, upload: Bytes) -> Result<ImportStats, ImportError> {
        tracing::debug!("extracting");
        // Inflate + parse is CPU-bound; keep it off the async workers.
        let max_entry_bytes = self.max_entry_bytes;
        let batch = tokio::task::spawn_blocking(move || decode_upload(&upload, max_entry_bytes))
            .await
            .map_err(|e| ImportError::Internal(e.to_string()))??;

        tracing::info!(
            records = batch.records.len(),
            skipped = batch.skipped,
            "parsed upload; persisting"
        );

        let stats = self.store.insert_batch(&batch.records).await?;

        tracing::info!(
            total_items = stats.total_items,
            total_categories = stats.total_categories,
            total_price = stats.total_price,
            "import committed"
        );
        Ok(stats)
    }

    /// Build the export archive holding every stored row.
    #[instrument(skip_all, err)]
    pub async fn export_archive(&self) -> Result<Vec<u8>, ExportError> {
        let records = self.store.fetch_all().await?;
        let count = records.len();

        let bytes = tokio::task::spawn_blocking(move || pricehub_codec::export_archive(&records))
            .await
            .map_err(|e| ExportError::Internal(e.to_string()))??;

        tracing::info!(records = count, archive_bytes = bytes.len(), "export built");
        Ok(bytes)
    }

    pub async fn stats(&self) -> Result<ImportStats, StoreError> {
        self.store.aggregate().await
    }
}

/// Everything request handlers need, built once at startup.
#[derive(Clone)]
pub struct AppServices {
    pub catalog: PriceCatalogService,
    pool: Option<sqlx::PgPool>,
}

impl AppServices {
    /// Wire handlers to an existing store (tests, embedding).
    pub fn with_store(store: Arc<dyn PriceStore>, config: &ApiConfig) -> Self {
        Self {
            catalog: PriceCatalogService::new(store, config.max_entry_bytes),
            pool: None,
        }
    }

    pub fn in_memory(config: &ApiConfig) -> Self {
        Self::with_store(Arc::new(InMemoryPriceStore::new()), config)
    }

    /// Close the database pool, if any. Called once on shutdown.
    pub async fn close(&self) {
        if let Some(pool) = &self.pool {
            pool.close().await;
            tracing::info!("database pool closed");
        }
    }
}

pub async fn build_services(config: &ApiConfig) -> Result<AppServices, StoreError> {
    let Some(database_url) = config.database_url.as_deref() else {
        tracing::warn!("DATABASE_URL not set; using in-memory price store (data is lost on exit)");
        return Ok(AppServices::in_memory(config));
    };

    let pool = db::connect(database_url, config.db_max_connections).await?;
    if config.db_ensure_schema {
        db::ensure_schema(&pool).await?;
    }

    let store: Arc<dyn PriceStore> = Arc::new(PostgresPriceStore::new(pool.clone()));
    Ok(AppServices {
        catalog: PriceCatalogService::new(store, config.max_entry_bytes),
        pool: Some(pool),
    })
}
