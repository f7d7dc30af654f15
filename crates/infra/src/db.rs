//! Postgres pool wiring.
//!
//! The pool is created once at process start and shared by every request.

use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use crate::price_store::postgres::map_sqlx_error;
use crate::price_store::StoreError;

const CREATE_PRICES_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS prices (
        id BIGSERIAL PRIMARY KEY,
        product_id TEXT NOT NULL,
        created_at TEXT NOT NULL,
        product_name TEXT NOT NULL,
        category TEXT NOT NULL,
        price TEXT NOT NULL
    )
"#;

/// Open a connection pool and check that the database answers.
pub async fn connect(database_url: &str, max_connections: u32) -> Result<PgPool, StoreError> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(Duration::from_secs(5))
        .connect(database_url)
        .await
        .map_err(|e| StoreError::Connection {
            operation: "connect",
            message: e.to_string(),
        })?;

    sqlx::query("SELECT 1")
        .execute(&pool)
        .await
        .map_err(|e| map_sqlx_error("ping", e))?;

    tracing::info!(max_connections, "connected to postgres");
    Ok(pool)
}

/// Create the `prices` table when it does not exist yet.
///
/// Bootstrap only; existing tables are left untouched.
pub async fn ensure_schema(pool: &PgPool) -> Result<(), StoreError> {
    sqlx::query(CREATE_PRICES_TABLE)
        .execute(pool)
        .await
        .map_err(|e| map_sqlx_error("ensure_schema", e))?;
    Ok(())
}
