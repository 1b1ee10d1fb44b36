//! Deduplication of background prefetches.

use std::cell::RefCell;
use std::collections::HashSet;

use crate::models::CacheKey;

/// Tracks cache slots with a prefetch in flight.
#[derive(Debug, Default)]
pub struct PrefetchManager {
    pending: RefCell<HashSet<String>>,
}

impl PrefetchManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `key`. Returns `None` if a prefetch for it is already running.
    pub fn claim(&self, key: &CacheKey) -> Option<PrefetchClaim<'_>> {
        let encoded = key.encode();
        if !self.pending.borrow_mut().insert(encoded.clone()) {
            return None;
        }
        Some(PrefetchClaim {
            manager: self,
            key: encoded,
        })
    }
}

/// Releases its slot when dropped.
pub struct PrefetchClaim<'a> {
    manager: &'a PrefetchManager,
    key: String,
}

impl Drop for PrefetchClaim<'_> {
    fn drop(&mut self) {
        self.manager.pending.borrow_mut().remove(&self.key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DirectoryAddress, SortOrder};

    #[test]
    fn test_claim_is_exclusive() {
        let manager = PrefetchManager::new();
        let key = CacheKey::new(DirectoryAddress::parse("a/"), true, SortOrder::Asc);

        let claim = manager.claim(&key);
        assert!(claim.is_some());
        assert!(manager.claim(&key).is_none());

        drop(claim);
        assert!(manager.claim(&key).is_some());
        assert!(manager.pending.borrow().is_empty());
    }

    #[test]
    fn test_modes_claim_separately() {
        let manager = PrefetchManager::new();
        let shallow = CacheKey::new(DirectoryAddress::parse("a/"), true, SortOrder::Asc);
        let deep = CacheKey::new(DirectoryAddress::parse("a/"), false, SortOrder::Asc);

        let _a = manager.claim(&shallow).unwrap();
        assert!(manager.claim(&deep).is_some());
    }
}
