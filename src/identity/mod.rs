// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Signing Identities
//!
//! Every principal (an account, or an anonymous session) owns one secp256k1
//! key. Its public identity is a `did:nil:` string. Keys are persisted in a
//! redb database and fronted by an LRU cache.

pub mod did;
pub mod key_cache;
pub mod key_store;
pub mod provider;

pub use did::{derive_public_identity, Did, PrivateKey};
pub use key_store::{KeyStore, KeyStoreError, RedbKeyStore};
pub use provider::{session_principal_id, IdentityProvider, SigningIdentity};

#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    #[error("invalid private key: {0}")]
    InvalidKey(String),

    #[error("invalid identity: {0}")]
    InvalidDid(String),

    #[error("signature does not verify")]
    InvalidSignature,
}
