//! Typed column schema for the catalog tables.
//!
//! [`ProductColumn::TRACKED`] and [`VariantColumn::TRACKED`] are the only
//! place the synced column sets are listed. The sync diff walks them to
//! compare records, and the repository builds its INSERT/UPDATE column lists
//! from them, so a column absent here can never reach SQL.

use std::fmt;

/// A single column of a catalog table.
pub trait Column: Copy + Eq + fmt::Debug + Send + Sync + 'static {
    /// SQL column name.
    fn name(self) -> &'static str;
}

/// A borrowed column value, ready to bind or compare.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnValue<'a> {
    /// `INTEGER` column.
    Integer(Option<i64>),
    /// `TEXT` column.
    Text(Option<&'a str>),
}

/// A write model whose tracked columns can be enumerated.
pub trait Record: Send + Sync {
    /// Column descriptor type for this table.
    type Column: Column;

    /// Table the record is written to.
    const TABLE: &'static str;

    /// Primary key column.
    const KEY: Self::Column;

    /// Tracked columns in comparison order.
    const COLUMNS: &'static [Self::Column];

    /// Value of `column` on this record.
    fn value(&self, column: Self::Column) -> ColumnValue<'_>;
}

/// Tracked product columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProductColumn {
    ProductId,
    CreatedAt,
    UpdatedAt,
    ProductType,
    Vendor,
    Handle,
    Title,
    BodyHtml,
}

impl ProductColumn {
    /// Columns compared and written during sync, in comparison order.
    pub const TRACKED: [Self; 8] = [
        Self::ProductId,
        Self::CreatedAt,
        Self::UpdatedAt,
        Self::ProductType,
        Self::Vendor,
        Self::Handle,
        Self::Title,
        Self::BodyHtml,
    ];
}

impl Column for ProductColumn {
    fn name(self) -> &'static str {
        match self {
            Self::ProductId => "product_id",
            Self::CreatedAt => "created_at",
            Self::UpdatedAt => "updated_at",
            Self::ProductType => "product_type",
            Self::Vendor => "vendor",
            Self::Handle => "handle",
            Self::Title => "title",
            Self::BodyHtml => "body_html",
        }
    }
}

/// Tracked variant columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VariantColumn {
    VariantId,
    ProductId,
    CreatedAt,
    UpdatedAt,
    Title,
    Sku,
    Price,
    CompareAtPrice,
    Position,
    Option1,
    Option2,
    Option3,
    InventoryQuantity,
    Barcode,
}

impl VariantColumn {
    /// Columns compared and written during variant sync, in comparison order.
    pub const TRACKED: [Self; 14] = [
        Self::VariantId,
        Self::ProductId,
        Self::CreatedAt,
        Self::UpdatedAt,
        Self::Title,
        Self::Sku,
        Self::Price,
        Self::CompareAtPrice,
        Self::Position,
        Self::Option1,
        Self::Option2,
        Self::Option3,
        Self::InventoryQuantity,
        Self::Barcode,
    ];
}

impl Column for VariantColumn {
    fn name(self) -> &'static str {
        match self {
            Self::VariantId => "variant_id",
            Self::ProductId => "product_id",
            Self::CreatedAt => "created_at",
            Self::UpdatedAt => "updated_at",
            Self::Title => "title",
            Self::Sku => "sku",
            Self::Price => "price",
            Self::CompareAtPrice => "compare_at_price",
            Self::Position => "position",
            Self::Option1 => "option1",
            Self::Option2 => "option2",
            Self::Option3 => "option3",
            Self::InventoryQuantity => "inventory_quantity",
            Self::Barcode => "barcode",
        }
    }
}

/// Return the first tracked column whose values differ, if any.
///
/// Comparison stops at the first mismatch.
pub fn first_difference<R: Record>(incoming: &R, stored: &R) -> Option<R::Column> {
    R::COLUMNS
        .iter()
        .copied()
        .find(|&column| incoming.value(column) != stored.value(column))
}

/// Comma-separated tracked column names of `R`, for SELECT lists.
#[must_use]
pub fn column_list<R: Record>() -> String {
    R::COLUMNS
        .iter()
        .map(|c| c.name())
        .collect::<Vec<_>>()
        .join(", ")
}

/// `INSERT` statement covering every tracked column of `R`.
#[must_use]
pub fn insert_sql<R: Record>() -> String {
    let placeholders = vec!["?"; R::COLUMNS.len()].join(", ");
    format!(
        "INSERT INTO {} ({}) VALUES ({placeholders})",
        R::TABLE,
        column_list::<R>()
    )
}

/// Non-key tracked columns of `R`, in the order [`update_sql`] binds them.
pub fn update_columns<R: Record>() -> impl Iterator<Item = R::Column> {
    R::COLUMNS.iter().copied().filter(|&c| c != R::KEY)
}

/// `UPDATE` statement setting every non-key tracked column, keyed by `R::KEY`.
#[must_use]
pub fn update_sql<R: Record>() -> String {
    let assignments: Vec<String> = update_columns::<R>()
        .map(|c| format!("{} = ?", c.name()))
        .collect();
    format!(
        "UPDATE {} SET {} WHERE {} = ?",
        R::TABLE,
        assignments.join(", "),
        R::KEY.name()
    )
}
