//! Application state shared across handlers.

use std::sync::Arc;
use std::time::Duration;

use sqlx::SqlitePool;

use crate::cache::ProductCache;
use crate::shopify::ProductSource;
use crate::sync::{SyncEngine, SyncError, SyncReport};

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    pool: SqlitePool,
    source: Arc<dyn ProductSource>,
    cache: ProductCache,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Arguments
    ///
    /// * `pool` - `SQLite` connection pool holding the catalog tables
    /// * `source` - Remote product source used by sync
    /// * `cache_ttl` - Optional lifetime of a cached catalog snapshot
    #[must_use]
    pub fn new(
        pool: SqlitePool,
        source: Arc<dyn ProductSource>,
        cache_ttl: Option<Duration>,
    ) -> Self {
        let cache = ProductCache::new(pool.clone(), cache_ttl);
        Self {
            inner: Arc::new(AppStateInner {
                pool,
                source,
                cache,
            }),
        }
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &SqlitePool {
        &self.inner.pool
    }

    /// Get a reference to the catalog cache.
    #[must_use]
    pub fn cache(&self) -> &ProductCache {
        &self.inner.cache
    }

    /// Sync the store against the remote source.
    ///
    /// The cache is invalidated whenever the store may have been written,
    /// including a store failure part-way through.
    ///
    /// # Errors
    ///
    /// Returns `SyncError` if the sync aborts.
    pub async fn sync_catalog(&self) -> Result<SyncReport, SyncError> {
        let result = SyncEngine::new(&self.inner.pool, self.inner.source.as_ref())
            .run()
            .await;

        if !matches!(result, Err(SyncError::Remote(_) | SyncError::EmptyCatalog)) {
            self.inner.cache.invalidate();
        }
        result
    }
}
