//! Domain models for the catalog.

pub mod product;
pub mod schema;

pub use product::{Product, ProductRecord, Variant, VariantRecord};
pub use schema::{Column, ColumnValue, ProductColumn, Record, VariantColumn};
