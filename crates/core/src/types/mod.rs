//! Core types for Camerazon.
//!
//! This module provides type-safe wrappers for catalog concepts.

pub mod id;
pub mod timestamp;

pub use id::*;
pub use timestamp::{TimestampError, parse_remote_timestamp};
