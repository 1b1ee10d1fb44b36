//! Data models and types for the explorer.
//!
//! Contains domain types for:
//! - [`DirectoryAddress`], [`CacheKey`], [`Crumb`] - Canonical addressing
//! - [`Entry`] - One item of a directory listing
//! - [`ViewState`], [`SortOrder`] - What the directory view shows
//! - [`Target`] - Deep links and "file in directory" input

mod address;
mod entry;
mod route;
mod view;

pub use address::{CacheKey, Crumb, DirectoryAddress};
pub use entry::{Entry, file_name_of};
pub use route::Target;
pub use view::{SortOrder, ViewState};
