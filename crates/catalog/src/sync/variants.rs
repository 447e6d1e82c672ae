//! Variant reconciliation.
//!
//! Runs per product over the variants staged by the product diff. Local
//! variants are loaded in `variant_id` order and keyed by id; each remote
//! variant is then updated (first differing column), inserted, or left alone.
//! A variant stored under another product is found by id and updated, which
//! moves it to the parent listed remotely.

use std::collections::BTreeMap;

use camerazon_core::{ProductId, VariantId};
use sqlx::SqlitePool;
use tracing::{debug, warn};

use crate::db::{RepositoryError, VariantRepository};
use crate::models::VariantRecord;
use crate::models::schema::first_difference;
use crate::shopify::RemoteVariant;
use crate::shopify::convert::variant_record;

/// Variant ids touched by a sync run, in processing order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VariantSyncReport {
    pub updated: Vec<VariantId>,
    pub inserted: Vec<VariantId>,
    /// Remote variants left alone because their timestamps did not parse.
    pub skipped: Vec<VariantId>,
}

/// Reconcile the staged variants of each product.
///
/// The owning product id always comes from the parent product.
///
/// # Errors
///
/// Returns `RepositoryError` if a read or write fails.
pub async fn sync_variants(
    pool: &SqlitePool,
    staged: &[(ProductId, &[RemoteVariant])],
) -> Result<VariantSyncReport, RepositoryError> {
    let repo = VariantRepository::new(pool);
    let mut report = VariantSyncReport::default();

    for &(product_id, remote_variants) in staged {
        let local: BTreeMap<VariantId, VariantRecord> = repo
            .list_records_for_product(product_id)
            .await?
            .into_iter()
            .map(|record| (record.variant_id, record))
            .collect();

        let mut updates = Vec::new();
        let mut inserts = Vec::new();

        for remote in remote_variants {
            let incoming = match variant_record(product_id, remote) {
                Ok(record) => record,
                Err(e) => {
                    warn!(
                        product_id = %product_id,
                        variant_id = remote.id,
                        error = %e,
                        "Skipping variant with unparseable timestamp"
                    );
                    report.skipped.push(VariantId::new(remote.id));
                    continue;
                }
            };

            if updates
                .iter()
                .chain(&inserts)
                .any(|r: &VariantRecord| r.variant_id == incoming.variant_id)
            {
                warn!(variant_id = %incoming.variant_id, "Duplicate variant in remote product");
                continue;
            }

            let elsewhere = if local.contains_key(&incoming.variant_id) {
                None
            } else {
                repo.find_record(incoming.variant_id).await?
            };
            if let Some(stored) = &elsewhere {
                debug!(
                    variant_id = %incoming.variant_id,
                    from = %stored.product_id,
                    to = %product_id,
                    "Variant moved to another product"
                );
            }

            match local.get(&incoming.variant_id).or(elsewhere.as_ref()) {
                Some(stored) => {
                    if let Some(column) = first_difference(&incoming, stored) {
                        debug!(variant_id = %incoming.variant_id, ?column, "Variant changed");
                        updates.push(incoming);
                    }
                }
                None => inserts.push(incoming),
            }
        }

        for record in &updates {
            if repo.update(record).await? {
                report.updated.push(record.variant_id);
            } else {
                warn!(variant_id = %record.variant_id, "Variant update matched no rows");
            }
        }

        for record in &inserts {
            repo.insert(record).await?;
            report.inserted.push(record.variant_id);
        }
    }

    Ok(report)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::db::ProductRepository;
    use crate::db::tests::test_pool;
    use crate::models::ProductRecord;

    async fn seed_product(pool: &SqlitePool, id: i64) {
        ProductRepository::new(pool)
            .insert(&ProductRecord {
                product_id: ProductId::new(id),
                created_at: None,
                updated_at: None,
                product_type: None,
                vendor: None,
                handle: None,
                title: None,
                body_html: None,
            })
            .await
            .unwrap();
    }

    fn remote_variants(value: serde_json::Value) -> Vec<RemoteVariant> {
        serde_json::from_value(value).unwrap()
    }

    #[tokio::test]
    async fn test_inserts_then_updates_changed_variant() {
        let pool = test_pool().await;
        seed_product(&pool, 1).await;

        let first = remote_variants(serde_json::json!([
            {"id": 11, "price": "10.00", "position": 1},
            {"id": 12, "price": "20.00", "position": 2}
        ]));
        let report = sync_variants(&pool, &[(ProductId::new(1), first.as_slice())])
            .await
            .unwrap();
        assert_eq!(report.inserted, vec![VariantId::new(11), VariantId::new(12)]);

        let second = remote_variants(serde_json::json!([
            {"id": 11, "price": "10.00", "position": 1},
            {"id": 12, "price": "18.00", "position": 2},
            {"id": 13, "price": "30.00", "position": 3}
        ]));
        let report = sync_variants(&pool, &[(ProductId::new(1), second.as_slice())])
            .await
            .unwrap();
        assert_eq!(report.updated, vec![VariantId::new(12)]);
        assert_eq!(report.inserted, vec![VariantId::new(13)]);

        let prices: Vec<Option<String>> = VariantRepository::new(&pool)
            .list_records_for_product(ProductId::new(1))
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.price)
            .collect();
        assert_eq!(
            prices,
            vec![
                Some("10.00".to_string()),
                Some("18.00".to_string()),
                Some("30.00".to_string())
            ]
        );
    }

    #[tokio::test]
    async fn test_owner_comes_from_parent_product() {
        let pool = test_pool().await;
        seed_product(&pool, 1).await;

        let variants = remote_variants(serde_json::json!([
            {"id": 11, "product_id": 999, "position": 1}
        ]));
        sync_variants(&pool, &[(ProductId::new(1), variants.as_slice())])
            .await
            .unwrap();

        let stored = VariantRepository::new(&pool)
            .list_records_for_product(ProductId::new(1))
            .await
            .unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].product_id, ProductId::new(1));
    }

    #[tokio::test]
    async fn test_variant_moved_to_another_product_is_updated() {
        let pool = test_pool().await;
        seed_product(&pool, 1).await;
        seed_product(&pool, 2).await;

        let variants = remote_variants(serde_json::json!([
            {"id": 10, "price": "5.00", "position": 1}
        ]));
        sync_variants(&pool, &[(ProductId::new(1), variants.as_slice())])
            .await
            .unwrap();

        let report = sync_variants(&pool, &[(ProductId::new(2), variants.as_slice())])
            .await
            .unwrap();
        assert_eq!(report.updated, vec![VariantId::new(10)]);
        assert!(report.inserted.is_empty());

        let repo = VariantRepository::new(&pool);
        let moved = repo.find_record(VariantId::new(10)).await.unwrap().unwrap();
        assert_eq!(moved.product_id, ProductId::new(2));
        assert!(
            repo.list_records_for_product(ProductId::new(1))
                .await
                .unwrap()
                .is_empty()
        );
    }

    #[tokio::test]
    async fn test_bad_variant_timestamp_is_skipped() {
        let pool = test_pool().await;
        seed_product(&pool, 1).await;

        let variants = remote_variants(serde_json::json!([
            {"id": 11, "updated_at": "not a date"},
            {"id": 12}
        ]));
        let report = sync_variants(&pool, &[(ProductId::new(1), variants.as_slice())])
            .await
            .unwrap();
        assert_eq!(report.skipped, vec![VariantId::new(11)]);
        assert_eq!(report.inserted, vec![VariantId::new(12)]);
    }
}
