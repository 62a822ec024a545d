// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Durable per-principal signing key storage backed by redb (pure Rust, ACID).
//!
//! ## Table Layout
//!
//! - `signing_keys`: principal_id → 32 raw key bytes
//!
//! A key is written at most once per principal. `put_if_absent` runs inside a
//! single write transaction, so two racing first uses converge on one key.

use std::path::Path;

use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};

use super::did::PrivateKey;

const SIGNING_KEYS: TableDefinition<&str, &[u8]> = TableDefinition::new("signing_keys");

#[derive(Debug, thiserror::Error)]
pub enum KeyStoreError {
    #[error("redb database error: {0}")]
    RedbDatabase(#[from] redb::DatabaseError),

    #[error("redb transaction error: {0}")]
    RedbTransaction(#[from] redb::TransactionError),

    #[error("redb table error: {0}")]
    RedbTable(#[from] redb::TableError),

    #[error("redb storage error: {0}")]
    RedbStorage(#[from] redb::StorageError),

    #[error("redb commit error: {0}")]
    RedbCommit(#[from] redb::CommitError),

    #[error("stored key for {principal_id} is corrupt: {reason}")]
    Corrupt { principal_id: String, reason: String },
}

pub type KeyStoreResult<T> = Result<T, KeyStoreError>;

/// Keyed secret storage for principal signing keys.
pub trait KeyStore: Send + Sync {
    /// Load the key persisted for `principal_id`, if any.
    fn get(&self, principal_id: &str) -> KeyStoreResult<Option<PrivateKey>>;

    /// Persist `key` unless a key already exists; returns whichever key is
    /// stored afterwards.
    fn put_if_absent(&self, principal_id: &str, key: &PrivateKey) -> KeyStoreResult<PrivateKey>;
}

pub struct RedbKeyStore {
    db: Database,
}

impl RedbKeyStore {
    /// Open (or create) the key database at the given path.
    pub fn open(path: &Path) -> KeyStoreResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).ok();
        }
        let db = Database::create(path)?;

        // Pre-create the table so later read transactions don't fail
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(SIGNING_KEYS)?;
        }
        write_txn.commit()?;

        Ok(Self { db })
    }
}

fn decode_key(principal_id: &str, bytes: &[u8]) -> KeyStoreResult<PrivateKey> {
    PrivateKey::from_bytes(bytes).map_err(|e| KeyStoreError::Corrupt {
        principal_id: principal_id.to_string(),
        reason: e.to_string(),
    })
}

impl KeyStore for RedbKeyStore {
    fn get(&self, principal_id: &str) -> KeyStoreResult<Option<PrivateKey>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(SIGNING_KEYS)?;
        match table.get(principal_id)? {
            Some(value) => Ok(Some(decode_key(principal_id, value.value())?)),
            None => Ok(None),
        }
    }

    fn put_if_absent(&self, principal_id: &str, key: &PrivateKey) -> KeyStoreResult<PrivateKey> {
        let write_txn = self.db.begin_write()?;
        let stored = {
            let mut table = write_txn.open_table(SIGNING_KEYS)?;

            let existing = table.get(principal_id)?.map(|value| value.value().to_vec());
            match existing {
                Some(bytes) => decode_key(principal_id, &bytes)?,
                None => {
                    let bytes = key.to_bytes();
                    table.insert(principal_id, bytes.as_slice())?;
                    key.clone()
                }
            }
        };
        write_txn.commit()?;
        Ok(stored)
    }
}
