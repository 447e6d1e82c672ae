//! Camerazon Core - Shared catalog types.
//!
//! This crate provides the types shared by the catalog service and its tests:
//! - type-safe product and variant identifiers
//! - normalization of Shopify's textual timestamps to epoch seconds
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no database
//! access, no HTTP clients. With the `sqlite` feature enabled, the id types
//! can be bound to and decoded from `sqlx` SQLite queries.
//!
//! # Modules
//!
//! - [`types`] - Newtype ids and timestamp helpers

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
