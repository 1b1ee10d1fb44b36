//! Page merging and listing order.

use std::collections::HashMap;

use crate::models::{Entry, SortOrder};

/// Merge a freshly fetched page into previously accepted entries.
///
/// Entries are keyed by name; on collision the incoming entry wins. The
/// result has no particular order, callers apply [`sort`].
pub fn merge(existing: &[Entry], incoming: &[Entry]) -> Vec<Entry> {
    let mut by_name: HashMap<&str, &Entry> =
        HashMap::with_capacity(existing.len() + incoming.len());
    for entry in existing.iter().chain(incoming) {
        by_name.insert(entry.name.as_str(), entry);
    }
    by_name.into_values().cloned().collect()
}

/// Order entries in place.
///
/// With `dirs_first`, directories form a block ahead of files. Within each
/// block names compare byte-wise (case-sensitive), reversed for
/// [`SortOrder::Desc`].
pub fn sort(entries: &mut [Entry], order: SortOrder, dirs_first: bool) {
    entries.sort_by(|a, b| {
        let partition = if dirs_first {
            b.is_directory.cmp(&a.is_directory)
        } else {
            std::cmp::Ordering::Equal
        };
        partition.then_with(|| match order {
            SortOrder::Asc => a.name.cmp(&b.name),
            SortOrder::Desc => b.name.cmp(&a.name),
        })
    });
}

/// [`merge`] followed by [`sort`].
pub fn merge_sorted(
    existing: &[Entry],
    incoming: &[Entry],
    order: SortOrder,
    dirs_first: bool,
) -> Vec<Entry> {
    let mut merged = merge(existing, incoming);
    sort(&mut merged, order, dirs_first);
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(name: &str) -> Entry {
        Entry {
            uri: format!("pubky://k/{}", name),
            name: name.to_string(),
            is_directory: false,
        }
    }

    fn dir(name: &str) -> Entry {
        Entry {
            uri: format!("pubky://k/{}/", name),
            name: name.to_string(),
            is_directory: true,
        }
    }

    fn names(entries: &[Entry]) -> Vec<&str> {
        entries.iter().map(|e| e.name.as_str()).collect()
    }

    #[test]
    fn test_incoming_wins_on_collision() {
        let merged = merge(&[file("a")], &[dir("a")]);
        assert_eq!(merged.len(), 1);
        assert!(merged[0].is_directory);
    }

    #[test]
    fn test_merge_keeps_both_sides() {
        let merged = merge_sorted(&[file("a"), file("c")], &[file("b")], SortOrder::Asc, false);
        assert_eq!(names(&merged), ["a", "b", "c"]);
    }

    #[test]
    fn test_merge_empty_page() {
        let merged = merge_sorted(&[file("a")], &[], SortOrder::Asc, true);
        assert_eq!(names(&merged), ["a"]);
    }

    #[test]
    fn test_dirs_first_desc() {
        let mut entries = vec![file("x"), dir("b"), dir("a")];
        sort(&mut entries, SortOrder::Desc, true);
        assert_eq!(names(&entries), ["b", "a", "x"]);
    }

    #[test]
    fn test_interleaved_without_dirs_first() {
        let mut entries = vec![file("x"), dir("b"), dir("a")];
        sort(&mut entries, SortOrder::Asc, false);
        assert_eq!(names(&entries), ["a", "b", "x"]);

        sort(&mut entries, SortOrder::Desc, false);
        assert_eq!(names(&entries), ["x", "b", "a"]);
    }

    #[test]
    fn test_case_sensitive_order() {
        let mut entries = vec![file("b"), file("B"), file("a")];
        sort(&mut entries, SortOrder::Asc, true);
        assert_eq!(names(&entries), ["B", "a", "b"]);
    }
}
