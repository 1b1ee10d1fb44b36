//! Deep links mirrored into the location fragment.
//!
//! URL format: `#p=<percent-encoded path>`. A path ending in `/` (or a bare
//! root key) opens a directory; anything else opens a file inside its
//! directory.

use crate::config::DEEP_LINK_PARAM;
use crate::core::normalize::strip_input_prefixes;
use crate::models::DirectoryAddress;
use crate::utils::{percent_decode, percent_encode};

/// Where a deep link or submitted input points.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Target {
    /// Browse a directory.
    Directory(DirectoryAddress),
    /// Browse `dir` and preview `name` inside it.
    File { dir: DirectoryAddress, name: String },
}

impl Target {
    /// Interpret address-bar input or a decoded deep-link path.
    ///
    /// Returns `None` for blank input.
    pub fn parse(raw: &str) -> Option<Self> {
        let stripped = strip_input_prefixes(raw);
        if stripped.is_empty() {
            return None;
        }

        if stripped.ends_with('/') {
            return Some(Self::Directory(DirectoryAddress::parse(stripped)));
        }

        match stripped.rsplit_once('/') {
            Some((dir, name)) if !name.is_empty() && name != "." && name != ".." => {
                Some(Self::File {
                    dir: DirectoryAddress::parse(dir),
                    name: name.to_string(),
                })
            }
            // bare key or single segment: treat as a directory
            _ => Some(Self::Directory(DirectoryAddress::parse(stripped))),
        }
    }

    /// Read the target from a location fragment, falling back to the query.
    ///
    /// `hash` is the raw `location.hash` (`#p=...`), `query` the raw
    /// `location.search` (`?p=...`).
    pub fn from_location(hash: &str, query: &str) -> Option<Self> {
        let from_hash = hash
            .strip_prefix('#')
            .and_then(|h| h.strip_prefix(DEEP_LINK_PARAM))
            .and_then(|h| h.strip_prefix('='))
            .map(decode_param);

        let path = from_hash.or_else(|| query_param(query))?;
        Self::parse(&path)
    }

    /// Directory this target browses.
    pub fn dir(&self) -> &DirectoryAddress {
        match self {
            Self::Directory(dir) | Self::File { dir, .. } => dir,
        }
    }

    /// Path shared in links: directories keep the trailing `/`, files do not.
    pub fn share_path(&self) -> String {
        match self {
            Self::Directory(dir) => dir.to_string(),
            Self::File { dir, name } => format!("{}{}", dir, name),
        }
    }

    /// Location fragment for this target (`#p=...`).
    pub fn to_hash(&self) -> String {
        format!("#{}={}", DEEP_LINK_PARAM, percent_encode(&self.share_path()))
    }

    /// Get current target from the browser URL.
    #[cfg(target_arch = "wasm32")]
    pub fn current() -> Option<Self> {
        let location = crate::utils::dom::window()?.location();
        let hash = location.hash().unwrap_or_default();
        let search = location.search().unwrap_or_default();
        Self::from_location(&hash, &search)
    }

    /// Update browser URL to match this target (using pushState).
    #[cfg(target_arch = "wasm32")]
    pub fn push(&self) {
        if let Some(window) = crate::utils::dom::window()
            && let Ok(history) = window.history()
        {
            let hash = self.to_hash();
            let _ = history.push_state_with_url(&wasm_bindgen::JsValue::NULL, "", Some(&hash));
        }
    }
}

/// Decode a parameter value, keeping the raw text if it is malformed.
fn decode_param(value: &str) -> String {
    percent_decode(value).unwrap_or_else(|| value.to_string())
}

fn query_param(query: &str) -> Option<String> {
    query
        .trim_start_matches('?')
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(key, _)| *key == DEEP_LINK_PARAM)
        .map(|(_, value)| decode_param(&value.replace('+', " ")))
        .filter(|value| !value.trim().is_empty())
}
