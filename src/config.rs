//! Explorer configuration.
//!
//! Centralizes the compile-time defaults used throughout the crate and the
//! runtime [`ExplorerConfig`] that hosts can load from TOML.

use serde::Deserialize;

use crate::core::error::ConfigError;
use crate::models::SortOrder;

// =============================================================================
// Addressing
// =============================================================================

/// URI scheme of the remote listing service.
pub const URI_SCHEME: &str = "pubky://";

/// Length of an actor root key (z-base-32 encoded public key).
pub const ROOT_KEY_LEN: usize = 52;

/// Subpath appended to a bare root key. The service refuses to list the root itself.
pub const ROOT_DEFAULT_SUBPATH: &str = "pub/";

/// Display prefix glued to a root key in the address bar (`pubky<key>/...`).
pub const DISPLAY_KEY_PREFIX: &str = "pubky";

/// z-base-32 alphabet used by root keys.
pub const Z32_ALPHABET: &str = "ybndrfg8ejkmcpqxot1uwisza345h769";

// =============================================================================
// Paging
// =============================================================================

/// Height of one listing row in pixels, used to derive the page size.
pub const ROW_HEIGHT_PX: f64 = 40.0;

/// Viewport height assumed until the host reports the real one.
pub const DEFAULT_VIEWPORT_HEIGHT_PX: f64 = 800.0;

// =============================================================================
// Directory Cache
// =============================================================================

/// Maximum number of (directory, mode) slots kept in the cache.
pub const DIR_CACHE_CAPACITY: usize = 50;

/// sessionStorage key holding the serialized directory cache.
pub const DIR_CACHE_STORAGE_KEY: &str = "pkx-dir-cache";

// =============================================================================
// Network / Routing
// =============================================================================

/// Fetch request timeout in milliseconds (browser HTTP client only).
pub const FETCH_TIMEOUT_MS: i32 = 10000;

/// Name of the deep-link parameter in the location fragment (`#p=...`).
pub const DEEP_LINK_PARAM: &str = "p";

// =============================================================================
// Runtime configuration
// =============================================================================

/// Runtime settings for an [`Explorer`](crate::core::Explorer).
///
/// Every field has a default, so a TOML document only needs the keys it
/// overrides:
///
/// ```toml
/// cache_capacity = 20
/// default_shallow = false
/// default_sort = "desc"
/// ```
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExplorerConfig {
    /// Maximum number of cached directory slots.
    pub cache_capacity: usize,
    /// Storage key the cache blob is written under.
    pub cache_storage_key: String,
    /// Row height used to turn the viewport height into a page size.
    pub row_height_px: f64,
    /// Whether new explorers start in shallow mode.
    pub default_shallow: bool,
    /// Initial sort order.
    pub default_sort: SortOrder,
    /// Whether directories are listed before files initially.
    pub default_dirs_first: bool,
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        Self {
            cache_capacity: DIR_CACHE_CAPACITY,
            cache_storage_key: DIR_CACHE_STORAGE_KEY.to_string(),
            row_height_px: ROW_HEIGHT_PX,
            default_shallow: true,
            default_sort: SortOrder::Asc,
            default_dirs_first: true,
        }
    }
}

impl ExplorerConfig {
    /// Parse a configuration from a TOML document.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source)?;
        config.validated()
    }

    /// Reject values the explorer cannot work with.
    pub fn validated(self) -> Result<Self, ConfigError> {
        if self.cache_capacity == 0 {
            return Err(ConfigError::Invalid {
                field: "cache_capacity",
                reason: "must be at least 1".to_string(),
            });
        }
        if !(self.row_height_px.is_finite() && self.row_height_px > 0.0) {
            return Err(ConfigError::Invalid {
                field: "row_height_px",
                reason: format!("must be a positive number, got {}", self.row_height_px),
            });
        }
        if self.cache_storage_key.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "cache_storage_key",
                reason: "must not be empty".to_string(),
            });
        }
        Ok(self)
    }
}
