//! Variant repository.
//!
//! Two orderings are exposed on purpose: read paths list a product's variants
//! by `position`, the sync diff lists them by `variant_id`.

use camerazon_core::{ProductId, VariantId};
use sqlx::SqlitePool;

use super::{RepositoryError, insert_record, update_record};
use crate::models::schema::column_list;
use crate::models::{Variant, VariantRecord};

/// Repository for variant database operations.
pub struct VariantRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> VariantRepository<'a> {
    /// Create a new variant repository.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Variants of one product, ordered by position.
    ///
    /// Returns an empty list for an unknown product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_product_by_position(
        &self,
        product_id: ProductId,
    ) -> Result<Vec<Variant>, RepositoryError> {
        let sql = format!(
            "SELECT {} FROM products_variants WHERE product_id = ? \
             ORDER BY position, variant_id",
            column_list::<VariantRecord>()
        );
        let variants = sqlx::query_as::<_, Variant>(&sql)
            .bind(product_id)
            .fetch_all(self.pool)
            .await?;
        Ok(variants)
    }

    /// Every stored variant, grouped by product and ordered by position.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_all_by_position(&self) -> Result<Vec<Variant>, RepositoryError> {
        let sql = format!(
            "SELECT {} FROM products_variants ORDER BY product_id, position, variant_id",
            column_list::<VariantRecord>()
        );
        let variants = sqlx::query_as::<_, Variant>(&sql)
            .fetch_all(self.pool)
            .await?;
        Ok(variants)
    }

    /// Variants of one product as write models, ordered by `variant_id`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_records_for_product(
        &self,
        product_id: ProductId,
    ) -> Result<Vec<VariantRecord>, RepositoryError> {
        let sql = format!(
            "SELECT {} FROM products_variants WHERE product_id = ? ORDER BY variant_id",
            column_list::<VariantRecord>()
        );
        let records = sqlx::query_as::<_, VariantRecord>(&sql)
            .bind(product_id)
            .fetch_all(self.pool)
            .await?;
        Ok(records)
    }

    /// Find a variant by id under any product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_record(
        &self,
        id: VariantId,
    ) -> Result<Option<VariantRecord>, RepositoryError> {
        let sql = format!(
            "SELECT {} FROM products_variants WHERE variant_id = ?",
            column_list::<VariantRecord>()
        );
        let record = sqlx::query_as::<_, VariantRecord>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?;
        Ok(record)
    }

    /// Insert a variant. The owning product must already exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn insert(&self, record: &VariantRecord) -> Result<(), RepositoryError> {
        insert_record(self.pool, record).await
    }

    /// Update a variant's tracked columns.
    ///
    /// Returns `false` if no variant with that id exists.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails, or
    /// `RepositoryError::DataCorruption` if more than one row matched.
    pub async fn update(&self, record: &VariantRecord) -> Result<bool, RepositoryError> {
        update_record(self.pool, record).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod tests {
    use super::*;
    use crate::db::ProductRepository;
    use crate::db::tests::test_pool;
    use crate::models::ProductRecord;

    pub(crate) fn variant(id: i64, product_id: i64, position: i64) -> VariantRecord {
        VariantRecord {
            variant_id: VariantId::new(id),
            product_id: ProductId::new(product_id),
            created_at: Some(1_700_000_000),
            updated_at: Some(1_700_000_000),
            title: Some(format!("Option {position}")),
            sku: Some(format!("SKU-{id}")),
            price: Some("12.50".to_string()),
            compare_at_price: None,
            position: Some(position),
            option1: Some(format!("Option {position}")),
            option2: None,
            option3: None,
            inventory_quantity: Some(4),
            barcode: None,
        }
    }

    async fn seed_product(pool: &SqlitePool, id: i64) {
        ProductRepository::new(pool)
            .insert(&ProductRecord {
                product_id: ProductId::new(id),
                created_at: None,
                updated_at: None,
                product_type: None,
                vendor: None,
                handle: None,
                title: Some(format!("Product {id}")),
                body_html: None,
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_orderings_differ_by_access_path() {
        let pool = test_pool().await;
        seed_product(&pool, 1).await;
        let repo = VariantRepository::new(&pool);

        // Higher ids sit earlier in display order.
        repo.insert(&variant(30, 1, 1)).await.unwrap();
        repo.insert(&variant(10, 1, 3)).await.unwrap();
        repo.insert(&variant(20, 1, 2)).await.unwrap();

        let by_position: Vec<i64> = repo
            .list_for_product_by_position(ProductId::new(1))
            .await
            .unwrap()
            .iter()
            .map(|v| v.variant_id.as_i64())
            .collect();
        assert_eq!(by_position, vec![30, 20, 10]);

        let by_id: Vec<i64> = repo
            .list_records_for_product(ProductId::new(1))
            .await
            .unwrap()
            .iter()
            .map(|v| v.variant_id.as_i64())
            .collect();
        assert_eq!(by_id, vec![10, 20, 30]);
    }

    #[tokio::test]
    async fn test_unknown_product_has_no_variants() {
        let pool = test_pool().await;
        let repo = VariantRepository::new(&pool);

        let variants = repo
            .list_for_product_by_position(ProductId::new(404))
            .await
            .unwrap();
        assert!(variants.is_empty());
    }

    #[tokio::test]
    async fn test_list_all_groups_by_product() {
        let pool = test_pool().await;
        seed_product(&pool, 1).await;
        seed_product(&pool, 2).await;
        let repo = VariantRepository::new(&pool);

        repo.insert(&variant(5, 2, 1)).await.unwrap();
        repo.insert(&variant(4, 1, 2)).await.unwrap();
        repo.insert(&variant(3, 1, 1)).await.unwrap();

        let pairs: Vec<(i64, i64)> = repo
            .list_all_by_position()
            .await
            .unwrap()
            .iter()
            .map(|v| (v.product_id.as_i64(), v.variant_id.as_i64()))
            .collect();
        assert_eq!(pairs, vec![(1, 3), (1, 4), (2, 5)]);
    }

    #[tokio::test]
    async fn test_find_record_across_products() {
        let pool = test_pool().await;
        seed_product(&pool, 1).await;
        let repo = VariantRepository::new(&pool);
        repo.insert(&variant(7, 1, 1)).await.unwrap();

        let found = repo.find_record(VariantId::new(7)).await.unwrap();
        assert_eq!(found, Some(variant(7, 1, 1)));
        assert!(repo.find_record(VariantId::new(8)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_variant() {
        let pool = test_pool().await;
        seed_product(&pool, 1).await;
        let repo = VariantRepository::new(&pool);
        repo.insert(&variant(1, 1, 1)).await.unwrap();

        let mut changed = variant(1, 1, 1);
        changed.price = Some("10.00".to_string());
        changed.inventory_quantity = Some(0);
        assert!(repo.update(&changed).await.unwrap());
        assert!(!repo.update(&variant(2, 1, 1)).await.unwrap());

        let stored = repo
            .list_records_for_product(ProductId::new(1))
            .await
            .unwrap();
        assert_eq!(stored, vec![changed]);
    }
}
