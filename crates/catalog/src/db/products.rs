//! Product repository.
//!
//! Rows are returned ordered by `product_id` so that the catalog snapshot and
//! the sync diff see products in a stable order.

use camerazon_core::ProductId;
use sqlx::SqlitePool;

use super::{RepositoryError, insert_record, update_record};
use crate::models::schema::column_list;
use crate::models::{Product, ProductRecord};

/// Repository for product database operations.
pub struct ProductRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// All stored products as write models, for diffing.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_records(&self) -> Result<Vec<ProductRecord>, RepositoryError> {
        let sql = format!(
            "SELECT {} FROM products ORDER BY product_id",
            column_list::<ProductRecord>()
        );
        let records = sqlx::query_as::<_, ProductRecord>(&sql)
            .fetch_all(self.pool)
            .await?;
        Ok(records)
    }

    /// All stored products as read models, without variants attached.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_all(&self) -> Result<Vec<Product>, RepositoryError> {
        let sql = format!(
            "SELECT {} FROM products ORDER BY product_id",
            column_list::<ProductRecord>()
        );
        let products = sqlx::query_as::<_, Product>(&sql)
            .fetch_all(self.pool)
            .await?;
        Ok(products)
    }

    /// Find a product by id, without variants attached.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let sql = format!(
            "SELECT {} FROM products WHERE product_id = ?",
            column_list::<ProductRecord>()
        );
        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?;
        Ok(product)
    }

    /// Insert a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails (including a
    /// duplicate `product_id`).
    pub async fn insert(&self, record: &ProductRecord) -> Result<(), RepositoryError> {
        insert_record(self.pool, record).await
    }

    /// Update a product's tracked columns.
    ///
    /// Returns `false` if no product with that id exists.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails, or
    /// `RepositoryError::DataCorruption` if more than one row matched.
    pub async fn update(&self, record: &ProductRecord) -> Result<bool, RepositoryError> {
        update_record(self.pool, record).await
    }
}
