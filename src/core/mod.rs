//! Core navigation and caching logic.
//!
//! This module provides:
//! - [`normalize`] path normalization
//! - [`Explorer`] navigation controller with race-safe paging
//! - [`DirCache`] bounded LRU cache over a persisted store
//! - [`merge`] and [`sort`] for accumulated listings
//! - [`ListingClient`] and [`ContentClient`] remote capabilities

pub mod cache;
pub mod client;
mod controller;
pub mod coordinator;
pub mod error;
pub mod merge;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod normalize;
pub mod prefetch;
pub mod view_store;

pub use cache::{CacheEntry, CachePatch, DirCache};
pub use client::{
    Content, ContentClient, Download, ListRequest, ListingClient, OwnerAccess, WriteAccess,
};
pub use controller::Explorer;
pub use coordinator::{RequestCoordinator, RequestToken};
pub use error::{ClientError, ConfigError, ErrorKind, StoreError};
pub use merge::{merge, sort};
pub use normalize::normalize;
pub use view_store::{SubscriptionId, ViewStore};
