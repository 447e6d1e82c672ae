//! Read-through catalog cache.
//!
//! The whole catalog is loaded as one snapshot: every product with its
//! variants attached in position order. Concurrent first reads share a single
//! load. The snapshot stays until [`ProductCache::invalidate`] is called
//! (after a sync) or the optional TTL expires.
//!
//! Snapshots are keyed by a generation counter. Invalidation bumps the
//! generation, so a load that started before a sync and finishes after it
//! lands under a stale key and is never served.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use camerazon_core::ProductId;
use moka::future::Cache;
use sqlx::SqlitePool;
use tracing::{debug, warn};

use crate::db::{ProductRepository, RepositoryError, VariantRepository};
use crate::models::Product;

/// Every stored product, hydrated with variants, in load order.
#[derive(Debug, Default)]
pub struct CatalogSnapshot {
    products: Vec<Product>,
    index: HashMap<ProductId, usize>,
}

impl CatalogSnapshot {
    /// Products in load order (ascending `product_id`).
    #[must_use]
    pub fn products(&self) -> &[Product] {
        &self.products
    }

    /// Look up one product.
    #[must_use]
    pub fn get(&self, id: ProductId) -> Option<&Product> {
        self.index.get(&id).and_then(|&i| self.products.get(i))
    }

    /// Number of products in the snapshot.
    #[must_use]
    pub fn len(&self) -> usize {
        self.products.len()
    }

    /// Whether the snapshot holds no products.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}

/// Process-local cache of the hydrated catalog.
#[derive(Clone)]
pub struct ProductCache {
    pool: SqlitePool,
    cache: Cache<u64, Arc<CatalogSnapshot>>,
    generation: Arc<AtomicU64>,
}

impl ProductCache {
    /// Create an empty cache over `pool`.
    ///
    /// With `ttl` set, a snapshot also expires that long after it was loaded.
    #[must_use]
    pub fn new(pool: SqlitePool, ttl: Option<Duration>) -> Self {
        let mut builder = Cache::builder().max_capacity(1);
        if let Some(ttl) = ttl {
            builder = builder.time_to_live(ttl);
        }

        Self {
            pool,
            cache: builder.build(),
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Current snapshot, loading it from the store if needed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::CatalogLoad` if loading fails. A failed load
    /// is not cached; the next call tries again.
    pub async fn snapshot(&self) -> Result<Arc<CatalogSnapshot>, RepositoryError> {
        let pool = self.pool.clone();
        let generation = self.generation.load(Ordering::Acquire);
        self.cache
            .try_get_with(generation, async move { load_snapshot(&pool).await.map(Arc::new) })
            .await
            .map_err(|e| RepositoryError::CatalogLoad(e.to_string()))
    }

    /// All products in load order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::CatalogLoad` if loading fails.
    pub async fn all(&self) -> Result<Vec<Product>, RepositoryError> {
        Ok(self.snapshot().await?.products().to_vec())
    }

    /// One product, or `None` if it is not in the catalog.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::CatalogLoad` if loading fails.
    pub async fn get(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        Ok(self.snapshot().await?.get(id).cloned())
    }

    /// Drop the current snapshot; the next read reloads from the store.
    pub fn invalidate(&self) {
        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        self.cache.invalidate_all();
        debug!(generation, "Catalog cache invalidated");
    }
}

/// Load all products, then all variants in one pass, and attach them.
async fn load_snapshot(pool: &SqlitePool) -> Result<CatalogSnapshot, RepositoryError> {
    let mut products = ProductRepository::new(pool).list_all().await?;
    let variants = VariantRepository::new(pool).list_all_by_position().await?;

    let index: HashMap<ProductId, usize> = products
        .iter()
        .enumerate()
        .map(|(i, p)| (p.product_id, i))
        .collect();

    for variant in variants {
        match index.get(&variant.product_id).and_then(|&i| products.get_mut(i)) {
            Some(product) => product.variants.push(variant),
            None => warn!(
                variant_id = %variant.variant_id,
                product_id = %variant.product_id,
                "Variant references a missing product"
            ),
        }
    }

    debug!(products = products.len(), "Catalog snapshot loaded");
    Ok(CatalogSnapshot { products, index })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::db::tests::test_pool;
    use crate::db::variants::tests::variant;
    use crate::models::ProductRecord;

    fn product(id: i64, title: &str) -> ProductRecord {
        ProductRecord {
            product_id: ProductId::new(id),
            created_at: Some(0),
            updated_at: Some(0),
            product_type: None,
            vendor: None,
            handle: None,
            title: Some(title.to_string()),
            body_html: None,
        }
    }

    #[tokio::test]
    async fn test_snapshot_attaches_variants_by_position() {
        let pool = test_pool().await;
        ProductRepository::new(&pool)
            .insert(&product(1, "A"))
            .await
            .unwrap();
        ProductRepository::new(&pool)
            .insert(&product(2, "B"))
            .await
            .unwrap();
        let variants = VariantRepository::new(&pool);
        variants.insert(&variant(11, 1, 2)).await.unwrap();
        variants.insert(&variant(12, 1, 1)).await.unwrap();

        let cache = ProductCache::new(pool, None);
        let all = cache.all().await.unwrap();

        assert_eq!(all.len(), 2);
        let ids: Vec<i64> = all[0]
            .variants
            .iter()
            .map(|v| v.variant_id.as_i64())
            .collect();
        assert_eq!(ids, vec![12, 11]);
        assert!(all[1].variants.is_empty());

        let b = cache.get(ProductId::new(2)).await.unwrap().unwrap();
        assert_eq!(b.title.as_deref(), Some("B"));
        assert!(cache.get(ProductId::new(3)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_snapshot_is_reused_until_invalidated() {
        let pool = test_pool().await;
        let repo = ProductRepository::new(&pool);
        repo.insert(&product(1, "A")).await.unwrap();

        let cache = ProductCache::new(pool.clone(), None);
        let first = cache.snapshot().await.unwrap();

        // A write behind the cache's back is not visible until invalidation.
        repo.insert(&product(2, "B")).await.unwrap();
        let second = cache.snapshot().await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(second.len(), 1);

        cache.invalidate();
        let third = cache.snapshot().await.unwrap();
        assert_eq!(third.len(), 2);
    }

    #[tokio::test]
    async fn test_load_finishing_after_invalidation_is_not_served() {
        let pool = test_pool().await;
        let repo = ProductRepository::new(&pool);
        repo.insert(&product(1, "A")).await.unwrap();

        let cache = ProductCache::new(pool.clone(), None);
        let stale_generation = cache.generation.load(Ordering::Acquire);
        let stale = Arc::new(load_snapshot(&pool).await.unwrap());

        repo.insert(&product(2, "B")).await.unwrap();
        cache.invalidate();

        // The earlier load completes only now and is stored under its own key.
        cache.cache.insert(stale_generation, stale).await;

        let current = cache.snapshot().await.unwrap();
        assert_eq!(current.len(), 2);
    }

    #[tokio::test]
    async fn test_empty_store_gives_empty_snapshot() {
        let pool = test_pool().await;
        let cache = ProductCache::new(pool, Some(Duration::from_secs(60)));
        assert!(cache.snapshot().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_load_failure_is_reported() {
        let pool = crate::db::create_memory_pool().await.unwrap();
        let cache = ProductCache::new(pool, None);

        let err = cache.all().await.unwrap_err();
        assert!(matches!(err, RepositoryError::CatalogLoad(_)));
    }
}
