// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! LRU cache for principal signing keys.
//!
//! Advisory only: the key store stays authoritative. Entries are
//! last-write-wins, so a late write from a timed-out request cannot leave
//! more than one key visible for a principal.

use std::num::NonZeroUsize;
use std::sync::Mutex;

use lru::LruCache;

use super::did::PrivateKey;

/// In-process LRU cache for hot principal keys.
pub struct KeyCache {
    cache: Mutex<LruCache<String, PrivateKey>>,
}

impl KeyCache {
    /// Create a new cache holding at most `capacity` keys.
    pub fn new(capacity: usize) -> Self {
        Self {
            cache: Mutex::new(LruCache::new(
                NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN),
            )),
        }
    }

    pub fn get(&self, principal_id: &str) -> Option<PrivateKey> {
        let mut cache = self.cache.lock().ok()?;
        cache.get(principal_id).cloned()
    }

    pub fn put(&self, principal_id: &str, key: PrivateKey) {
        if let Ok(mut cache) = self.cache.lock() {
            cache.put(principal_id.to_string(), key);
        }
    }

    pub fn len(&self) -> usize {
        self.cache.lock().map(|c| c.len()).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_put_and_get() {
        let cache = KeyCache::new(4);
        let key = PrivateKey::generate();

        assert!(cache.get("p1").is_none());
        cache.put("p1", key.clone());
        assert_eq!(cache.get("p1"), Some(key));
    }

    #[test]
    fn last_write_wins() {
        let cache = KeyCache::new(4);
        let first = PrivateKey::generate();
        let second = PrivateKey::generate();

        cache.put("p1", first);
        cache.put("p1", second.clone());
        assert_eq!(cache.get("p1"), Some(second));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn evicts_least_recently_used() {
        let cache = KeyCache::new(2);
        cache.put("a", PrivateKey::generate());
        cache.put("b", PrivateKey::generate());
        let _ = cache.get("a");
        cache.put("c", PrivateKey::generate());

        assert!(cache.get("a").is_some());
        assert!(cache.get("b").is_none());
        assert!(cache.get("c").is_some());
    }

    #[test]
    fn zero_capacity_falls_back_to_one() {
        let cache = KeyCache::new(0);
        cache.put("a", PrivateKey::generate());
        assert_eq!(cache.len(), 1);
    }
}
