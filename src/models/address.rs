//! Canonical directory addresses and cache keys.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::{DISPLAY_KEY_PREFIX, URI_SCHEME};
use crate::core::normalize::{is_root_key, normalize};
use crate::models::SortOrder;

// =============================================================================
// DirectoryAddress
// =============================================================================

/// A normalized, `/`-terminated directory path without scheme.
///
/// The empty address is the "nothing open yet" state of a fresh explorer.
/// Every other value is produced by [`normalize`], so string equality is
/// address equality.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DirectoryAddress(String);

impl DirectoryAddress {
    /// Normalize raw input into an address. Never fails.
    pub fn parse(raw: &str) -> Self {
        Self(normalize(raw))
    }

    /// The unset address.
    pub fn empty() -> Self {
        Self(String::new())
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Address with no segments (`/`), produced by blank or fully popped input.
    pub fn is_root(&self) -> bool {
        self.0 == "/"
    }

    /// Listing URI for this directory (`pubky://<address>`).
    pub fn uri(&self) -> String {
        format!("{}{}", URI_SCHEME, self.0)
    }

    /// Non-empty path segments.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('/').filter(|s| !s.is_empty())
    }

    /// Resolve a child name (or relative path) against this directory.
    pub fn join(&self, name: &str) -> Self {
        Self::parse(&format!("{}{}", self.0, name))
    }

    /// Parent directory, if this address has more than one segment.
    pub fn parent(&self) -> Option<Self> {
        let segments: Vec<&str> = self.segments().collect();
        if segments.len() <= 1 {
            return None;
        }
        Some(Self(format!("{}/", segments[..segments.len() - 1].join("/"))))
    }

    /// Root key this address lives under, if the first segment is one.
    pub fn root_key(&self) -> Option<&str> {
        self.segments().next().filter(|s| is_root_key(s))
    }

    /// Address-bar rendering: a leading root key is shown as `pubky<key>`.
    pub fn display(&self) -> String {
        match self.root_key() {
            Some(_) => format!("{}{}", DISPLAY_KEY_PREFIX, self.0),
            None => self.0.clone(),
        }
    }

    /// Path-bar buttons, one per segment, each pointing at its prefix.
    pub fn breadcrumbs(&self) -> Vec<Crumb> {
        let mut crumbs = Vec::new();
        let mut prefix = String::new();

        for segment in self.segments() {
            prefix.push_str(segment);
            prefix.push('/');
            let label = if crumbs.is_empty() && is_root_key(segment) {
                format!("{}{}", DISPLAY_KEY_PREFIX, segment)
            } else {
                segment.to_string()
            };
            crumbs.push(Crumb {
                label,
                address: Self(prefix.clone()),
            });
        }

        crumbs
    }
}

impl fmt::Display for DirectoryAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for DirectoryAddress {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// One path-bar segment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Crumb {
    pub label: String,
    pub address: DirectoryAddress,
}

// =============================================================================
// CacheKey
// =============================================================================

/// Cache slot identity: result sets differ per retrieval mode.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub dir: DirectoryAddress,
    pub shallow: bool,
    pub sort: SortOrder,
}

impl CacheKey {
    pub fn new(dir: DirectoryAddress, shallow: bool, sort: SortOrder) -> Self {
        Self { dir, shallow, sort }
    }

    /// Storage form: `<dir>|<shallow|deep>|<asc|desc>`.
    pub fn encode(&self) -> String {
        let mode = if self.shallow { "shallow" } else { "deep" };
        format!("{}|{}|{}", self.dir, mode, self.sort)
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}
