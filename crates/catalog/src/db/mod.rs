//! Database operations for the local catalog store (`SQLite`).
//!
//! ## Tables
//!
//! - `products` - One row per Shopify product, keyed by the Shopify id
//! - `products_variants` - One row per variant, owned by a product
//!
//! The table definitions live in `crates/catalog/schema.sql`. They are
//! applied with `CREATE TABLE IF NOT EXISTS` when `CATALOG_BOOTSTRAP_SCHEMA`
//! is enabled; there is no migration tooling.
//!
//! Every statement is parameterized. INSERT and UPDATE column lists are built
//! from the typed schema in [`crate::models::schema`].

pub mod products;
pub mod variants;

use std::str::FromStr;
use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::SqlitePool;
use sqlx::query::Query;
use sqlx::sqlite::{Sqlite, SqliteArguments, SqliteConnectOptions, SqlitePoolOptions};
use thiserror::Error;

use crate::models::schema::{ColumnValue, Record, insert_sql, update_columns, update_sql};

pub use products::ProductRepository;
pub use variants::VariantRepository;

/// Table definitions applied by [`bootstrap_schema`].
const SCHEMA: &str = include_str!("../../schema.sql");

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Loading the catalog snapshot into the cache failed.
    #[error("catalog load failed: {0}")]
    CatalogLoad(String),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),
}

/// Create a `SQLite` connection pool.
///
/// The database file is created if it does not exist yet.
///
/// # Errors
///
/// Returns `sqlx::Error` if the URL is invalid or the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(database_url.expose_secret())?
        .create_if_missing(true)
        .foreign_keys(true);

    SqlitePoolOptions::new()
        .max_connections(5)
        .acquire_timeout(Duration::from_secs(10))
        .connect_with(options)
        .await
}

/// Create a single-connection in-memory pool.
///
/// An in-memory `SQLite` database lives exactly as long as its connection, so
/// the pool holds one connection that never idles out.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_memory_pool() -> Result<SqlitePool, sqlx::Error> {
    SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
}

/// Create the catalog tables if they are missing.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if a statement fails.
pub async fn bootstrap_schema(pool: &SqlitePool) -> Result<(), RepositoryError> {
    sqlx::raw_sql(SCHEMA).execute(pool).await?;
    Ok(())
}

// =============================================================================
// Record writes
// =============================================================================

type SqliteQuery<'q> = Query<'q, Sqlite, SqliteArguments<'q>>;

fn bind_columns<'q, R: Record>(
    mut query: SqliteQuery<'q>,
    record: &'q R,
    columns: impl IntoIterator<Item = R::Column>,
) -> SqliteQuery<'q> {
    for column in columns {
        query = match record.value(column) {
            ColumnValue::Integer(value) => query.bind(value),
            ColumnValue::Text(value) => query.bind(value),
        };
    }
    query
}

/// Insert every tracked column of `record`.
async fn insert_record<R: Record>(pool: &SqlitePool, record: &R) -> Result<(), RepositoryError> {
    let sql = insert_sql::<R>();
    bind_columns(sqlx::query(&sql), record, R::COLUMNS.iter().copied())
        .execute(pool)
        .await?;
    Ok(())
}

/// Update every non-key tracked column of `record`, keyed by its primary key.
///
/// Returns `false` when no row matched the key.
async fn update_record<R: Record>(pool: &SqlitePool, record: &R) -> Result<bool, RepositoryError> {
    let sql = update_sql::<R>();
    let query = bind_columns(sqlx::query(&sql), record, update_columns::<R>());
    let query = bind_columns(query, record, [R::KEY]);

    match query.execute(pool).await?.rows_affected() {
        0 => Ok(false),
        1 => Ok(true),
        n => Err(RepositoryError::DataCorruption(format!(
            "update of {} affected {n} rows",
            R::TABLE
        ))),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod tests {
    use super::*;

    /// In-memory pool with the catalog tables created.
    pub(crate) async fn test_pool() -> SqlitePool {
        let pool = create_memory_pool().await.unwrap();
        bootstrap_schema(&pool).await.unwrap();
        pool
    }

    #[tokio::test]
    async fn test_bootstrap_schema_is_idempotent() {
        let pool = test_pool().await;
        bootstrap_schema(&pool).await.unwrap();

        let tables: Vec<String> = sqlx::query_scalar(
            "SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name",
        )
        .fetch_all(&pool)
        .await
        .unwrap();
        assert_eq!(tables, vec!["products", "products_variants"]);
    }
}
