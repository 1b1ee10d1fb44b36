//! Path normalization for user and URL input.
//!
//! Turns anything typed into the address bar or found in a deep link into a
//! canonical directory address: no scheme, no `.`/`..`, no empty segments,
//! always `/`-terminated. Normalization never fails; malformed input degrades
//! to its best-effort form.

use std::sync::LazyLock;

use regex::Regex;
use url::Url;

use crate::config::{DISPLAY_KEY_PREFIX, ROOT_DEFAULT_SUBPATH, ROOT_KEY_LEN, Z32_ALPHABET};

static INPUT_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(?:pubky:/{0,2}|pk:)").expect("static prefix pattern"));

static LOCATOR_SCHEME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^[a-z][a-z0-9+.\-]*://").expect("static scheme pattern"));

/// Normalize raw input into a canonical, `/`-terminated address string.
///
/// # Examples
///
/// ```
/// use pkx::core::normalize;
///
/// assert_eq!(normalize("a/b/../c"), "a/c/");
/// assert_eq!(normalize("pubky://a/./b"), "a/b/");
/// ```
pub fn normalize(raw: &str) -> String {
    let stripped = strip_input_prefixes(raw);
    let located = extract_locator(stripped);
    let source = located.as_deref().unwrap_or(stripped);

    let mut parts: Vec<&str> = Vec::new();
    for segment in source.split('/') {
        // a segment that becomes the head of the path is read like fresh input
        let segment = if parts.is_empty() {
            strip_leading_prefixes(segment)
        } else {
            segment
        };
        match segment {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            _ => parts.push(segment),
        }
    }

    let mut path = parts.join("/");

    // The service does not allow listing a bare root.
    if parts.len() == 1 && parts[0].chars().count() == ROOT_KEY_LEN {
        path.push('/');
        path.push_str(ROOT_DEFAULT_SUBPATH);
    }

    if !path.ends_with('/') {
        path.push('/');
    }

    path
}

/// Strip the recognized input prefixes (`pubky://`, `pk:`, `pubky<key>`).
///
/// Prefixes are stripped repeatedly, so `pk:pubky://x` becomes `x`.
pub fn strip_input_prefixes(raw: &str) -> &str {
    strip_leading_prefixes(raw.trim_end())
}

fn strip_leading_prefixes(input: &str) -> &str {
    let mut rest = input.trim_start();
    loop {
        if let Some(m) = INPUT_PREFIX.find(rest) {
            rest = rest[m.end()..].trim_start();
        } else if let Some(key_path) = strip_glued_key_prefix(rest) {
            rest = key_path;
        } else {
            return rest;
        }
    }
}

/// Check whether a path segment is a root key (52 z-base-32 characters).
pub fn is_root_key(segment: &str) -> bool {
    segment.len() == ROOT_KEY_LEN && segment.chars().all(|c| Z32_ALPHABET.contains(c))
}

/// `pubky<key>/...` as shown in the address bar.
fn strip_glued_key_prefix(input: &str) -> Option<&str> {
    let head = input.get(..DISPLAY_KEY_PREFIX.len())?;
    if !head.eq_ignore_ascii_case(DISPLAY_KEY_PREFIX) {
        return None;
    }
    let rest = &input[DISPLAY_KEY_PREFIX.len()..];
    let first = rest.split('/').next().unwrap_or_default();
    is_root_key(first).then_some(rest)
}

/// Re-extract `host/path` from a fully qualified locator.
fn extract_locator(input: &str) -> Option<String> {
    if !LOCATOR_SCHEME.is_match(input) {
        return None;
    }
    let url = Url::parse(input).ok()?;
    let host = url.host_str().unwrap_or_default();
    let joined = format!("{}{}", host, url.path());
    Some(joined.trim_start_matches('/').to_string())
}
