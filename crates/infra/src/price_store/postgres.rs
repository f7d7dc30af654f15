//! Postgres-backed price store.
//!
//! ## Schema
//!
//! ```sql
//! prices(id BIGSERIAL PRIMARY KEY, product_id TEXT, created_at TEXT,
//!        product_name TEXT, category TEXT, price TEXT)
//! ```
//!
//! Prices are stored as the validated text, so an export reproduces the
//! imported spelling (`1e3`, `+5`, `.5`). The aggregate casts to `NUMERIC`,
//! sums exactly and truncates toward zero before converting to `BIGINT`.
//!
//! ## Error Mapping
//!
//! | SQLx Error | StoreError |
//! |------------|------------|
//! | PoolClosed / PoolTimedOut / Io / Tls | `Connection` |
//! | Database / RowNotFound / other | `Query` |
//! | ColumnDecode / ColumnNotFound / Decode | `Decode` |
//!
//! Begin/commit/rollback failures are reported as `Transaction`.

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgConnection, PgExecutor, PgPool, Row};
use tracing::{instrument, Span};

use pricehub_core::{ImportStats, Price, PriceRecord};

use super::{PriceStore, StoreError};

const INSERT_PRICE: &str = r#"
    INSERT INTO prices (product_id, created_at, product_name, category, price)
    VALUES ($1, $2, $3, $4, $5)
"#;

const SELECT_STATS: &str = r#"
    SELECT
        COUNT(*) AS total_items,
        COUNT(DISTINCT category) AS total_categories,
        TRUNC(COALESCE(SUM(price::numeric), 0))::bigint AS total_price
    FROM prices
"#;

const SELECT_ALL: &str = r#"
    SELECT
        product_id,
        created_at,
        product_name,
        category,
        price
    FROM prices
    ORDER BY id ASC
"#;

/// Postgres price store.
///
/// Holds the process-wide pool handed in at startup; cloning is cheap and
/// shares the pool.
#[derive(Debug, Clone)]
pub struct PostgresPriceStore {
    pool: PgPool,
}

impl PostgresPriceStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a batch atomically and aggregate inside the same transaction.
    #[instrument(
        skip(self, records),
        fields(record_count = records.len(), total_items = tracing::field::Empty),
        err
    )]
    pub async fn insert_batch(&self, records: &[PriceRecord]) -> Result<ImportStats, StoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| transaction_error("begin_transaction", e))?;

        for (idx, record) in records.iter().enumerate() {
            if let Err(e) = insert_price(&mut tx, record).await {
                tracing::warn!(idx, product_id = %record.product_id, "insert failed; rolling back batch");
                if let Err(rb) = tx.rollback().await {
                    tracing::error!(error = %rb, "rollback failed");
                }
                return Err(e);
            }
        }

        let stats = match query_stats(&mut *tx).await {
            Ok(stats) => stats,
            Err(e) => {
                if let Err(rb) = tx.rollback().await {
                    tracing::error!(error = %rb, "rollback failed");
                }
                return Err(e);
            }
        };

        tx.commit()
            .await
            .map_err(|e| transaction_error("commit_transaction", e))?;

        Span::current().record("total_items", stats.total_items);
        Ok(stats)
    }

    /// Load every row, ordered by insertion id.
    #[instrument(skip(self), err)]
    pub async fn fetch_all(&self) -> Result<Vec<PriceRecord>, StoreError> {
        let rows = sqlx::query(SELECT_ALL)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("fetch_all", e))?;

        let mut records = Vec::with_capacity(rows.len());
        for row in &rows {
            records.push(PriceRow::from_pg_row(row)?.into_record()?);
        }

        tracing::debug!(count = records.len(), "loaded prices");
        Ok(records)
    }

    /// Storage-side aggregate over the whole table.
    #[instrument(skip(self), err)]
    pub async fn aggregate(&self) -> Result<ImportStats, StoreError> {
        query_stats(&self.pool).await
    }
}

async fn insert_price(conn: &mut PgConnection, record: &PriceRecord) -> Result<(), StoreError> {
    sqlx::query(INSERT_PRICE)
        .bind(&record.product_id)
        .bind(&record.created_at)
        .bind(&record.product_name)
        .bind(&record.category)
        .bind(record.price.as_str())
        .execute(conn)
        .await
        .map_err(|e| map_sqlx_error("insert_price", e))?;
    Ok(())
}

async fn query_stats<'e, E>(executor: E) -> Result<ImportStats, StoreError>
where
    E: PgExecutor<'e>,
{
    let row = sqlx::query(SELECT_STATS)
        .fetch_one(executor)
        .await
        .map_err(|e| map_sqlx_error("aggregate", e))?;

    let total_items: i64 = row
        .try_get("total_items")
        .map_err(|e| StoreError::Decode(format!("total_items: {e}")))?;
    let total_categories: i64 = row
        .try_get("total_categories")
        .map_err(|e| StoreError::Decode(format!("total_categories: {e}")))?;
    let total_price: i64 = row
        .try_get("total_price")
        .map_err(|e| StoreError::Decode(format!("total_price: {e}")))?;

    Ok(ImportStats::from_parts(
        u64::try_from(total_items).unwrap_or_default(),
        u64::try_from(total_categories).unwrap_or_default(),
        total_price,
    ))
}

fn transaction_error(operation: &'static str, err: sqlx::Error) -> StoreError {
    StoreError::Transaction {
        operation,
        message: err.to_string(),
    }
}

/// Map SQLx errors to StoreError.
pub(crate) fn map_sqlx_error(operation: &'static str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let code = db_err.code().map(|c| c.into_owned()).unwrap_or_default();
            StoreError::Query {
                operation,
                message: format!("database error [{code}]: {}", db_err.message()),
            }
        }
        sqlx::Error::PoolClosed
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::Io(_)
        | sqlx::Error::Tls(_) => StoreError::Connection {
            operation,
            message: err.to_string(),
        },
        sqlx::Error::ColumnDecode { .. }
        | sqlx::Error::ColumnNotFound(_)
        | sqlx::Error::Decode(_) => StoreError::Decode(format!("{operation}: {err}")),
        _ => StoreError::Query {
            operation,
            message: err.to_string(),
        },
    }
}

// SQLx row types

#[derive(Debug)]
struct PriceRow {
    product_id: String,
    created_at: String,
    product_name: String,
    category: String,
    price: String,
}

impl PriceRow {
    fn from_pg_row(row: &PgRow) -> Result<Self, StoreError> {
        let get = |col: &str| -> Result<String, StoreError> {
            row.try_get::<String, _>(col)
                .map_err(|e| StoreError::Decode(format!("{col}: {e}")))
        };

        Ok(PriceRow {
            product_id: get("product_id")?,
            created_at: get("created_at")?,
            product_name: get("product_name")?,
            category: get("category")?,
            price: get("price")?,
        })
    }

    fn into_record(self) -> Result<PriceRecord, StoreError> {
        let price = Price::parse(&self.price).map_err(|e| StoreError::Decode(e.to_string()))?;
        Ok(PriceRecord::new(
            self.product_id,
            self.product_name,
            self.category,
            price,
            self.created_at,
        ))
    }
}

// Implement PriceStore trait

#[async_trait]
impl PriceStore for PostgresPriceStore {
    async fn insert_batch(&self, records: &[PriceRecord]) -> Result<ImportStats, StoreError> {
        PostgresPriceStore::insert_batch(self, records).await
    }

    async fn fetch_all(&self) -> Result<Vec<PriceRecord>, StoreError> {
        PostgresPriceStore::fetch_all(self).await
    }

    async fn aggregate(&self) -> Result<ImportStats, StoreError> {
        PostgresPriceStore::aggregate(self).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    #[test]
    fn pool_errors_map_to_connection() {
        assert!(matches!(
            map_sqlx_error("fetch_all", sqlx::Error::PoolClosed),
            StoreError::Connection { operation: "fetch_all", .. }
        ));
        assert!(matches!(
            map_sqlx_error("fetch_all", sqlx::Error::PoolTimedOut),
            StoreError::Connection { .. }
        ));
    }

    #[test]
    fn decode_errors_map_to_decode() {
        let err = map_sqlx_error("fetch_all", sqlx::Error::ColumnNotFound("price".into()));
        assert!(matches!(err, StoreError::Decode(msg) if msg.contains("price")));
    }

    #[test]
    fn other_errors_map_to_query() {
        assert!(matches!(
            map_sqlx_error("aggregate", sqlx::Error::RowNotFound),
            StoreError::Query { operation: "aggregate", .. }
        ));
    }

    #[test]
    fn stored_price_text_is_validated() {
        let row = PriceRow {
            product_id: "1".into(),
            created_at: "2024-01-01".into(),
            product_name: "a".into(),
            category: "b".into(),
            price: "NaN".into(),
        };
        assert!(matches!(row.into_record(), Err(StoreError::Decode(_))));
    }

    fn rec(id: &str, category: &str, price: &str) -> PriceRecord {
        PriceRecord::new(id, format!("item {id}"), category, Price::parse(price).unwrap(), "2024-01-01")
    }

    /// Runs against a live database only when `PRICEHUB_TEST_DATABASE_URL` is set.
    /// The `prices` table of that database is truncated.
    #[tokio::test]
    async fn postgres_store_contract() {
        let Ok(url) = std::env::var("PRICEHUB_TEST_DATABASE_URL") else {
            eprintln!("PRICEHUB_TEST_DATABASE_URL not set; skipping");
            return;
        };

        let pool = db::connect(&url, 2).await.unwrap();
        db::ensure_schema(&pool).await.unwrap();
        sqlx::query("TRUNCATE prices RESTART IDENTITY")
            .execute(&pool)
            .await
            .unwrap();
        let store = PostgresPriceStore::new(pool);

        // Atomic insert + in-transaction aggregate.
        let stats = store
            .insert_batch(&[rec("1", "Tools", "9.99"), rec("2", "Tools", "5")])
            .await
            .unwrap();
        assert_eq!(
            stats,
            ImportStats {
                total_items: 2,
                total_categories: 1,
                total_price: 14,
            }
        );
        assert_eq!(store.aggregate().await.unwrap(), stats);

        // Round-trip keeps digits and order.
        let stored = store.fetch_all().await.unwrap();
        assert_eq!(stored, vec![rec("1", "Tools", "9.99"), rec("2", "Tools", "5")]);

        // NUL bytes are rejected by Postgres text columns: the batch must roll back.
        let err = store
            .insert_batch(&[rec("3", "Toys", "1"), rec("bad\0id", "Toys", "1")])
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Query { operation: "insert_price", .. }));
        assert_eq!(store.aggregate().await.unwrap(), stats);
        assert_eq!(store.fetch_all().await.unwrap().len(), 2);

        // Alternate spellings come back verbatim and sum exactly.
        let spelled = [
            rec("4", "Misc", "1e3"),
            rec("5", "Misc", "+5"),
            rec("6", "Misc", ".5"),
            rec("7", "Misc", "13.9999995"),
        ];
        let stats = store.insert_batch(&spelled).await.unwrap();
        assert_eq!(stats.total_items, 6);
        assert_eq!(stats.total_categories, 2);
        // 14.99 + 1000 + 5 + 0.5 + 13.9999995
        assert_eq!(stats.total_price, 1033);

        let stored = store.fetch_all().await.unwrap();
        assert_eq!(stored[2..], spelled);
        assert_eq!(stats, ImportStats::from_records(&stored));
    }
}
