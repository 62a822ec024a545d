// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Resolves a principal id to a stable signing key.
//!
//! Lookup order is cache, then durable store, then generate-and-persist.
//! Store failures never fail the request: the caller gets a fresh in-memory
//! key that is not cached, so a later call can still converge on a persisted
//! one.

use std::sync::Arc;

use tracing::{debug, warn};

use super::did::{Did, PrivateKey};
use super::key_cache::KeyCache;
use super::key_store::{KeyStore, KeyStoreResult};

/// A principal's key together with its derived identity.
#[derive(Debug, Clone)]
pub struct SigningIdentity {
    pub principal_id: String,
    pub key: PrivateKey,
    pub did: Did,
}

impl SigningIdentity {
    pub fn new(principal_id: impl Into<String>, key: PrivateKey) -> Self {
        let did = key.did();
        Self {
            principal_id: principal_id.into(),
            key,
            did,
        }
    }
}

/// Principal id under which an anonymous session's key is kept.
pub fn session_principal_id(session_id: &str) -> String {
    format!("session:{session_id}")
}

pub struct IdentityProvider {
    store: Arc<dyn KeyStore>,
    cache: KeyCache,
}

impl IdentityProvider {
    pub fn new(store: Arc<dyn KeyStore>, cache_capacity: usize) -> Self {
        Self {
            store,
            cache: KeyCache::new(cache_capacity),
        }
    }

    /// Return the principal's key, creating and persisting one on first use.
    pub fn get_or_create_signing_key(&self, principal_id: &str) -> PrivateKey {
        if let Some(key) = self.cache.get(principal_id) {
            return key;
        }

        match self.store.get(principal_id) {
            Ok(Some(key)) => {
                self.cache.put(principal_id, key.clone());
                return key;
            }
            Ok(None) => {}
            Err(e) => warn!(principal_id, error = %e, "Key store read failed"),
        }

        let generated = PrivateKey::generate();
        match self.store.put_if_absent(principal_id, &generated) {
            Ok(key) => {
                debug!(principal_id, did = %key.did(), "Signing key ready");
                self.cache.put(principal_id, key.clone());
                key
            }
            Err(e) => {
                warn!(principal_id, error = %e, "Key store write failed, using ephemeral key");
                generated
            }
        }
    }

    /// Return the principal's persisted key without ever creating one.
    pub fn stored_signing_key(&self, principal_id: &str) -> KeyStoreResult<Option<PrivateKey>> {
        if let Some(key) = self.cache.get(principal_id) {
            return Ok(Some(key));
        }

        let stored = self.store.get(principal_id)?;
        if let Some(key) = &stored {
            self.cache.put(principal_id, key.clone());
        }
        Ok(stored)
    }

    pub fn signing_identity(&self, principal_id: &str) -> SigningIdentity {
        SigningIdentity::new(principal_id, self.get_or_create_signing_key(principal_id))
    }

    /// Key of an anonymous session principal.
    pub fn session_identity(&self, session_id: &str) -> SigningIdentity {
        self.signing_identity(&session_principal_id(session_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::key_store::{KeyStoreError, RedbKeyStore};

    struct FailingStore;

    impl KeyStore for FailingStore {
        fn get(&self, principal_id: &str) -> KeyStoreResult<Option<PrivateKey>> {
            Err(KeyStoreError::Corrupt {
                principal_id: principal_id.to_string(),
                reason: "unavailable".to_string(),
            })
        }

        fn put_if_absent(&self, principal_id: &str, _key: &PrivateKey) -> KeyStoreResult<PrivateKey> {
            Err(KeyStoreError::Corrupt {
                principal_id: principal_id.to_string(),
                reason: "unavailable".to_string(),
            })
        }
    }

    fn provider() -> (IdentityProvider, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let store = RedbKeyStore::open(&dir.path().join("keys.redb")).unwrap();
        (IdentityProvider::new(Arc::new(store), 16), dir)
    }

    #[test]
    fn same_principal_gets_same_key() {
        let (provider, _dir) = provider();
        let first = provider.get_or_create_signing_key("user-1");
        let second = provider.get_or_create_signing_key("user-1");
        assert_eq!(first, second);
    }

    #[test]
    fn principals_get_distinct_keys() {
        let (provider, _dir) = provider();
        let a = provider.signing_identity("user-1");
        let b = provider.signing_identity("user-2");
        assert_ne!(a.did, b.did);
    }

    #[test]
    fn key_survives_restart() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("keys.redb");
        let did = {
            let provider =
                IdentityProvider::new(Arc::new(RedbKeyStore::open(&path).unwrap()), 16);
            provider.session_identity("abc").did
        };
        let provider = IdentityProvider::new(Arc::new(RedbKeyStore::open(&path).unwrap()), 16);
        assert_eq!(provider.session_identity("abc").did, did);
    }

    #[test]
    fn concurrent_first_use_converges() {
        let (provider, _dir) = provider();
        let provider = Arc::new(provider);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let provider = Arc::clone(&provider);
                std::thread::spawn(move || provider.get_or_create_signing_key("shared"))
            })
            .collect();
        let keys: Vec<PrivateKey> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        let settled = provider.get_or_create_signing_key("shared");
        assert!(keys.iter().all(|k| *k == settled));
    }

    #[test]
    fn store_failure_yields_usable_ephemeral_key() {
        let provider = IdentityProvider::new(Arc::new(FailingStore), 16);
        let key = provider.get_or_create_signing_key("user-1");
        let signature = key.sign(b"hello");
        assert!(key.did().verify(b"hello", &signature).is_ok());
    }

    #[test]
    fn session_principal_id_is_prefixed() {
        assert_eq!(session_principal_id("abc"), "session:abc");
    }

    #[test]
    fn stored_lookup_never_creates() {
        let (provider, _dir) = provider();
        assert!(provider.stored_signing_key("user-1").unwrap().is_none());
        assert!(provider.stored_signing_key("user-1").unwrap().is_none());

        let created = provider.get_or_create_signing_key("user-1");
        assert_eq!(provider.stored_signing_key("user-1").unwrap(), Some(created));
    }

    #[test]
    fn stored_lookup_surfaces_store_errors() {
        let provider = IdentityProvider::new(Arc::new(FailingStore), 4);
        assert!(provider.stored_signing_key("user-1").is_err());
    }
}
