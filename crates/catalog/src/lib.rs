//! Camerazon catalog service library.
//!
//! Mirrors a Shopify store's products and variants into a local `SQLite`
//! store and serves them over a small JSON API. The binary in `main.rs`
//! wires configuration, logging and the HTTP server around this library.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cache;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod routes;
pub mod shopify;
pub mod state;
pub mod sync;
