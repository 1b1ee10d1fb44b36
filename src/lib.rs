//! pkx: directory navigation and caching core for a pubky explorer.
//!
//! The crate turns raw address input into canonical directory addresses,
//! pages through remote listings, keeps a bounded per-directory LRU cache
//! with scroll positions, and publishes immutable view snapshots to a thin
//! presentation layer.

pub mod config;
pub mod core;
pub mod models;
pub mod utils;
