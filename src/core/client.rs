//! Capabilities the explorer consumes from the outside world.
//!
//! The remote service is reached through [`ListingClient`] and
//! [`ContentClient`]; write permission through [`WriteAccess`].

use crate::core::error::ClientError;
use crate::models::DirectoryAddress;

// =============================================================================
// Listing
// =============================================================================

/// Arguments of one paginated listing call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ListRequest {
    /// `pubky://<dir>` of the listed directory.
    pub directory_uri: String,
    /// URI of the last entry already received; empty for the first page.
    pub cursor: String,
    pub recursive: bool,
    /// Maximum number of URIs in the page.
    pub limit: u32,
    /// Collapse nested paths into their first-level directory.
    pub shallow: bool,
}

impl ListRequest {
    pub fn first_page(dir: &DirectoryAddress, limit: u32, shallow: bool) -> Self {
        Self {
            directory_uri: dir.uri(),
            cursor: String::new(),
            recursive: false,
            limit,
            shallow,
        }
    }

    pub fn after(mut self, cursor: impl Into<String>) -> Self {
        self.cursor = cursor.into();
        self
    }
}

/// Remote directory listing.
#[allow(async_fn_in_trait)]
pub trait ListingClient {
    /// Return up to `request.limit` URIs following `request.cursor`, in
    /// ascending key order.
    async fn list(&self, request: ListRequest) -> Result<Vec<String>, ClientError>;
}

// =============================================================================
// Content
// =============================================================================

/// Raw file content with its media type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Content {
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
}

/// File content ready to be saved under `file_name`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Download {
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
}

/// Remote file content.
#[allow(async_fn_in_trait)]
pub trait ContentClient {
    async fn fetch(&self, uri: &str) -> Result<Content, ClientError>;
}

// =============================================================================
// Write access
// =============================================================================

/// Whether the current actor may write into a directory.
pub trait WriteAccess {
    fn can_write(&self, dir: &DirectoryAddress) -> bool;
}

impl<F: Fn(&DirectoryAddress) -> bool> WriteAccess for F {
    fn can_write(&self, dir: &DirectoryAddress) -> bool {
        self(dir)
    }
}

/// Grants writes anywhere under the signed-in actor's root key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OwnerAccess {
    root_key: String,
}

impl OwnerAccess {
    pub fn new(root_key: impl Into<String>) -> Self {
        Self {
            root_key: root_key.into(),
        }
    }
}

impl WriteAccess for OwnerAccess {
    fn can_write(&self, dir: &DirectoryAddress) -> bool {
        dir.root_key() == Some(self.root_key.as_str())
    }
}
