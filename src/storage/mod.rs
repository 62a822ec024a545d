// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Document Storage
//!
//! The encrypted document store the vault writes notes and accounts into.
//! [`DocumentStore`] is the collaborator contract; [`LocalDocumentStore`]
//! implements it on the data directory.
//!
//! ## Storage Layout
//!
//! ```text
//! /data/
//!   keys.redb                          # principal signing keys
//!   collections/
//!     {collection_id}.json             # collection definition
//!   documents/{collection_id}/
//!     {document_id}.json               # { owner, acl, data }
//! ```
//!
//! ## Security Model
//!
//! - Fields written as `{"%allot": ...}` are AES-256-GCM sealed at rest
//! - Every data call names the calling identity; owner and ACL are checked
//! - Writes need a delegation from the administrative identity

pub mod document_store;
pub mod encrypted_fs;
pub mod field_crypto;
pub mod local_store;
pub mod paths;

pub use document_store::{
    Acl, Collection, CollectionKind, CreateDataRequest, DataReference, DocumentStore, StoreError,
    StoreResult,
};
pub use encrypted_fs::{EncryptedStorage, StorageError, StorageResult};
pub use field_crypto::{allot, FieldCipher};
pub use local_store::LocalDocumentStore;
pub use paths::StoragePaths;
