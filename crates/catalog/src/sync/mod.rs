//! Catalog reconciliation against Shopify.
//!
//! # Procedure
//!
//! 1. Load every local product record, keyed by id
//! 2. Fetch the remote product list; a failure or an empty list aborts the
//!    run before anything is written
//! 3. Diff each remote product against its local record over
//!    [`ProductColumn::TRACKED`](crate::models::ProductColumn::TRACKED),
//!    stopping at the first differing column
//! 4. Apply updates, then inserts, one statement per product
//! 5. Reconcile the variants of every product that carried any
//!
//! Nothing is ever deleted. Statements are not wrapped in a transaction, so a
//! store failure part-way through leaves earlier writes in place; the next
//! run picks up from there.

pub mod variants;

use std::collections::{HashMap, HashSet};

use camerazon_core::ProductId;
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::db::{ProductRepository, RepositoryError};
use crate::models::ProductRecord;
use crate::models::schema::first_difference;
use crate::shopify::convert::product_record;
use crate::shopify::{ProductSource, RemoteProduct, RemoteVariant, ShopifyError};

pub use variants::VariantSyncReport;

/// Errors that abort a sync run.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The remote catalog could not be fetched.
    #[error("{0}")]
    Remote(#[from] ShopifyError),

    /// The remote catalog came back with no products.
    #[error("Shopify returned no products")]
    EmptyCatalog,

    /// A store read or write failed.
    #[error("{0}")]
    Store(#[from] RepositoryError),
}

/// Ids touched by a sync run, in processing order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Products whose tracked columns were rewritten.
    pub updated: Vec<ProductId>,
    /// Products created.
    pub inserted: Vec<ProductId>,
    /// Remote products left alone because their timestamps did not parse.
    pub skipped: Vec<ProductId>,
    /// Variant reconciliation results.
    pub variants: VariantSyncReport,
}

/// Writes decided by diffing remote products against local records.
#[derive(Debug, Default)]
pub struct ProductPlan<'r> {
    pub updates: Vec<ProductRecord>,
    pub inserts: Vec<ProductRecord>,
    pub skipped: Vec<ProductId>,
    /// Remote variants per product, in remote order.
    pub staged_variants: Vec<(ProductId, &'r [RemoteVariant])>,
}

/// Diff remote products against local records.
///
/// Products with no differing tracked column produce no write. A product id
/// repeated in the remote list is only considered once.
#[must_use]
pub fn plan<'r>(
    local: &HashMap<ProductId, ProductRecord>,
    remote: &'r [RemoteProduct],
) -> ProductPlan<'r> {
    let mut plan = ProductPlan::default();
    let mut seen = HashSet::new();

    for remote_product in remote {
        let id = ProductId::new(remote_product.id);
        if !seen.insert(id) {
            warn!(product_id = %id, "Duplicate product in remote catalog, ignoring");
            continue;
        }

        let incoming = match product_record(remote_product) {
            Ok(record) => record,
            Err(e) => {
                warn!(product_id = %id, error = %e, "Skipping product with unparseable timestamp");
                plan.skipped.push(id);
                continue;
            }
        };

        match local.get(&id) {
            Some(stored) => {
                if let Some(column) = first_difference(&incoming, stored) {
                    debug!(product_id = %id, ?column, "Product changed");
                    plan.updates.push(incoming);
                }
            }
            None => plan.inserts.push(incoming),
        }

        if !remote_product.variants.is_empty() {
            plan.staged_variants
                .push((id, remote_product.variants.as_slice()));
        }
    }

    plan
}

/// Runs one reconciliation of the local store against a [`ProductSource`].
pub struct SyncEngine<'a> {
    pool: &'a SqlitePool,
    source: &'a dyn ProductSource,
}

impl<'a> SyncEngine<'a> {
    /// Create a sync engine.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool, source: &'a dyn ProductSource) -> Self {
        Self { pool, source }
    }

    /// Run the sync.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::Remote` or `SyncError::EmptyCatalog` without
    /// touching the store, or `SyncError::Store` if a read or write fails.
    #[instrument(skip(self))]
    pub async fn run(&self) -> Result<SyncReport, SyncError> {
        let products = ProductRepository::new(self.pool);

        let local: HashMap<ProductId, ProductRecord> = products
            .list_records()
            .await?
            .into_iter()
            .map(|record| (record.product_id, record))
            .collect();

        let remote = self.source.fetch_products().await.map_err(|e| {
            warn!(error = %e, "Remote catalog fetch failed");
            SyncError::Remote(e)
        })?;
        if remote.is_empty() {
            warn!("Remote catalog is empty, nothing synced");
            return Err(SyncError::EmptyCatalog);
        }

        debug!(local = local.len(), remote = remote.len(), "Diffing catalog");
        let plan = plan(&local, &remote);

        let mut report = SyncReport {
            skipped: plan.skipped,
            ..SyncReport::default()
        };

        for record in &plan.updates {
            if products.update(record).await? {
                report.updated.push(record.product_id);
            } else {
                warn!(product_id = %record.product_id, "Product update matched no rows");
            }
        }

        for record in &plan.inserts {
            products.insert(record).await?;
            report.inserted.push(record.product_id);
        }

        report.variants = variants::sync_variants(self.pool, &plan.staged_variants).await?;

        info!(
            updated = ?report.updated,
            inserted = ?report.inserted,
            skipped = ?report.skipped,
            variants_updated = ?report.variants.updated,
            variants_inserted = ?report.variants.inserted,
            "Catalog sync complete"
        );

        Ok(report)
    }
}
