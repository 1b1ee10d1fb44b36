//! Listing entries returned by the remote service.

use serde::{Deserialize, Serialize};

use crate::config::URI_SCHEME;
use crate::models::DirectoryAddress;

/// One item of a directory listing.
///
/// `name` is relative to the listed directory. Directories carry a trailing
/// `/`; deep (non-shallow) listings may produce nested names like `a/b.json`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    pub uri: String,
    pub name: String,
    pub is_directory: bool,
}

impl Entry {
    /// Build an entry from a URI returned by a listing of `dir`.
    pub fn from_uri(uri: impl Into<String>, dir: &DirectoryAddress) -> Self {
        let uri = uri.into();
        let bare = uri.strip_prefix(URI_SCHEME).unwrap_or(&uri);
        let name = bare.strip_prefix(dir.as_str()).unwrap_or(bare).to_string();
        let is_directory = name.ends_with('/');

        Self {
            uri,
            name,
            is_directory,
        }
    }

    /// Last path segment, used as the download file name.
    pub fn file_name(&self) -> &str {
        file_name_of(&self.uri)
    }
}

/// Last non-empty path segment of a URI or path.
pub fn file_name_of(uri: &str) -> &str {
    uri.trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or_default()
}
