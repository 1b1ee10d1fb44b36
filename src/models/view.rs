//! View state published to the presentation layer.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::ExplorerConfig;
use crate::core::error::ErrorKind;
use crate::models::{DirectoryAddress, Entry};

/// Lexicographic direction of a listing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn toggled(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Asc => f.write_str("asc"),
            Self::Desc => f.write_str("desc"),
        }
    }
}

/// Snapshot of what the directory view should show.
///
/// Snapshots are immutable once published; every change produces a new one.
#[derive(Clone, Debug, PartialEq)]
pub struct ViewState {
    /// Directory being shown (empty before the first navigation).
    pub dir: DirectoryAddress,
    /// Deduplicated, sorted entries of `dir`.
    pub entries: Vec<Entry>,
    /// A first page or a next page is being fetched.
    pub loading: bool,
    /// Most recent failure for `dir`, cleared by the next successful fetch.
    pub error: Option<ErrorKind>,
    pub shallow: bool,
    pub sort_order: SortOrder,
    pub dirs_first: bool,
    /// The last page was full, so another may follow.
    pub has_more: bool,
    /// Scroll position to restore, set when `dir` was served from cache.
    pub scroll_offset: Option<f64>,
    /// The current actor may write into `dir`.
    pub writable: bool,
}

impl ViewState {
    pub fn new(config: &ExplorerConfig) -> Self {
        Self {
            dir: DirectoryAddress::empty(),
            entries: Vec::new(),
            loading: false,
            error: None,
            shallow: config.default_shallow,
            sort_order: config.default_sort,
            dirs_first: config.default_dirs_first,
            has_more: false,
            scroll_offset: None,
            writable: false,
        }
    }

    /// "No results" state, distinct from loading and from an error.
    pub fn is_empty_result(&self) -> bool {
        !self.dir.is_empty() && !self.loading && self.error.is_none() && self.entries.is_empty()
    }
}

impl Default for ViewState {
    fn default() -> Self {
        Self::new(&ExplorerConfig::default())
    }
}
