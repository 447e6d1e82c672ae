//! Catalog product and variant models.
//!
//! Read models ([`Product`], [`Variant`]) are what the HTTP layer serializes.
//! Write models ([`ProductRecord`], [`VariantRecord`]) hold exactly the
//! tracked columns and are what the sync engine compares and persists.

use camerazon_core::{ProductId, VariantId};
use serde::{Deserialize, Serialize};

use super::schema::{ColumnValue, ProductColumn, Record, VariantColumn};

// =============================================================================
// Read models
// =============================================================================

/// A stored product with its variants attached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Product {
    /// Shopify product id, reused as the local primary key.
    pub product_id: ProductId,
    /// Creation time (epoch seconds).
    pub created_at: Option<i64>,
    /// Last update time (epoch seconds).
    pub updated_at: Option<i64>,
    pub product_type: Option<String>,
    pub vendor: Option<String>,
    /// URL handle.
    pub handle: Option<String>,
    pub title: Option<String>,
    /// HTML description.
    pub body_html: Option<String>,
    /// Variants, ordered by position.
    #[sqlx(skip)]
    #[serde(default)]
    pub variants: Vec<Variant>,
}

/// A stored product variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Variant {
    pub variant_id: VariantId,
    /// Owning product.
    pub product_id: ProductId,
    pub created_at: Option<i64>,
    pub updated_at: Option<i64>,
    pub title: Option<String>,
    pub sku: Option<String>,
    /// Decimal price as reported by Shopify (e.g. `"19.99"`).
    pub price: Option<String>,
    pub compare_at_price: Option<String>,
    /// 1-based display order within the product.
    pub position: Option<i64>,
    pub option1: Option<String>,
    pub option2: Option<String>,
    pub option3: Option<String>,
    pub inventory_quantity: Option<i64>,
    pub barcode: Option<String>,
}

// =============================================================================
// Write models
// =============================================================================

/// Tracked product columns, as compared and written by the sync.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct ProductRecord {
    pub product_id: ProductId,
    pub created_at: Option<i64>,
    pub updated_at: Option<i64>,
    pub product_type: Option<String>,
    pub vendor: Option<String>,
    pub handle: Option<String>,
    pub title: Option<String>,
    pub body_html: Option<String>,
}

impl Record for ProductRecord {
    type Column = ProductColumn;

    const TABLE: &'static str = "products";
    const KEY: ProductColumn = ProductColumn::ProductId;
    const COLUMNS: &'static [ProductColumn] = &ProductColumn::TRACKED;

    fn value(&self, column: ProductColumn) -> ColumnValue<'_> {
        match column {
            ProductColumn::ProductId => ColumnValue::Integer(Some(self.product_id.as_i64())),
            ProductColumn::CreatedAt => ColumnValue::Integer(self.created_at),
            ProductColumn::UpdatedAt => ColumnValue::Integer(self.updated_at),
            ProductColumn::ProductType => ColumnValue::Text(self.product_type.as_deref()),
            ProductColumn::Vendor => ColumnValue::Text(self.vendor.as_deref()),
            ProductColumn::Handle => ColumnValue::Text(self.handle.as_deref()),
            ProductColumn::Title => ColumnValue::Text(self.title.as_deref()),
            ProductColumn::BodyHtml => ColumnValue::Text(self.body_html.as_deref()),
        }
    }
}

/// Tracked variant columns, as compared and written by the variant sync.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct VariantRecord {
    pub variant_id: VariantId,
    pub product_id: ProductId,
    pub created_at: Option<i64>,
    pub updated_at: Option<i64>,
    pub title: Option<String>,
    pub sku: Option<String>,
    pub price: Option<String>,
    pub compare_at_price: Option<String>,
    pub position: Option<i64>,
    pub option1: Option<String>,
    pub option2: Option<String>,
    pub option3: Option<String>,
    pub inventory_quantity: Option<i64>,
    pub barcode: Option<String>,
}

impl Record for VariantRecord {
    type Column = VariantColumn;

    const TABLE: &'static str = "products_variants";
    const KEY: VariantColumn = VariantColumn::VariantId;
    const COLUMNS: &'static [VariantColumn] = &VariantColumn::TRACKED;

    fn value(&self, column: VariantColumn) -> ColumnValue<'_> {
        match column {
            VariantColumn::VariantId => ColumnValue::Integer(Some(self.variant_id.as_i64())),
            VariantColumn::ProductId => ColumnValue::Integer(Some(self.product_id.as_i64())),
            VariantColumn::CreatedAt => ColumnValue::Integer(self.created_at),
            VariantColumn::UpdatedAt => ColumnValue::Integer(self.updated_at),
            VariantColumn::Title => ColumnValue::Text(self.title.as_deref()),
            VariantColumn::Sku => ColumnValue::Text(self.sku.as_deref()),
            VariantColumn::Price => ColumnValue::Text(self.price.as_deref()),
            VariantColumn::CompareAtPrice => ColumnValue::Text(self.compare_at_price.as_deref()),
            VariantColumn::Position => ColumnValue::Integer(self.position),
            VariantColumn::Option1 => ColumnValue::Text(self.option1.as_deref()),
            VariantColumn::Option2 => ColumnValue::Text(self.option2.as_deref()),
            VariantColumn::Option3 => ColumnValue::Text(self.option3.as_deref()),
            VariantColumn::InventoryQuantity => ColumnValue::Integer(self.inventory_quantity),
            VariantColumn::Barcode => ColumnValue::Text(self.barcode.as_deref()),
        }
    }
}
