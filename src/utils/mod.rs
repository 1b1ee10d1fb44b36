//! Storage and browser glue.
//!
//! Provides:
//! - [`storage`] - [`PersistedStore`](storage::PersistedStore) backends
//! - [`percent_encode`], [`percent_decode`] - Deep-link parameter codec
//! - `dom`, `fetch` - Browser helpers and the HTTP gateway client (wasm only)

pub mod storage;
mod url;

#[cfg(target_arch = "wasm32")]
pub mod dom;
#[cfg(target_arch = "wasm32")]
mod fetch;

#[cfg(target_arch = "wasm32")]
pub use fetch::{GatewayClient, RaceResult, race_with_timeout};
pub use url::{percent_decode, percent_encode};
