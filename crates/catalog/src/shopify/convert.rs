//! Remote payload to write model conversion.
//!
//! Fields are copied explicitly; the remote payload is never reused as a
//! stored or cached value.

use camerazon_core::{ProductId, TimestampError, VariantId, parse_remote_timestamp};

use super::types::{RemoteProduct, RemoteVariant};
use crate::models::{ProductRecord, VariantRecord};

fn epoch(value: Option<&str>) -> Result<Option<i64>, TimestampError> {
    value.map(parse_remote_timestamp).transpose()
}

/// Convert a remote product into the tracked product columns.
///
/// # Errors
///
/// Returns `TimestampError` if `created_at` or `updated_at` cannot be parsed.
pub fn product_record(remote: &RemoteProduct) -> Result<ProductRecord, TimestampError> {
    Ok(ProductRecord {
        product_id: ProductId::new(remote.id),
        created_at: epoch(remote.created_at.as_deref())?,
        updated_at: epoch(remote.updated_at.as_deref())?,
        product_type: remote.product_type.clone(),
        vendor: remote.vendor.clone(),
        handle: remote.handle.clone(),
        title: remote.title.clone(),
        body_html: remote.body_html.clone(),
    })
}

/// Convert a remote variant into the tracked variant columns.
///
/// `product_id` is the owning product; the variant's own `product_id`
/// field is ignored.
///
/// # Errors
///
/// Returns `TimestampError` if `created_at` or `updated_at` cannot be parsed.
pub fn variant_record(
    product_id: ProductId,
    remote: &RemoteVariant,
) -> Result<VariantRecord, TimestampError> {
    Ok(VariantRecord {
        variant_id: VariantId::new(remote.id),
        product_id,
        created_at: epoch(remote.created_at.as_deref())?,
        updated_at: epoch(remote.updated_at.as_deref())?,
        title: remote.title.clone(),
        sku: remote.sku.clone(),
        price: remote.price.clone(),
        compare_at_price: remote.compare_at_price.clone(),
        position: remote.position,
        option1: remote.option1.clone(),
        option2: remote.option2.clone(),
        option3: remote.option3.clone(),
        inventory_quantity: remote.inventory_quantity,
        barcode: remote.barcode.clone(),
    })
}
