// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Document store over the vault data directory.
//!
//! Enforces the collaborator contract locally: delegations must come from
//! the trusted administrative identity, owned-collection records belong to
//! their writer, reads and deletes follow owner + ACL, and `%allot` fields
//! are sealed before they touch disk.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use super::document_store::{
    Acl, Collection, CollectionKind, CreateDataRequest, DataReference, DocumentStore, StoreError,
    StoreResult,
};
use super::encrypted_fs::{EncryptedStorage, StorageError};
use super::field_crypto::FieldCipher;
use super::paths::is_safe_segment;
use crate::delegation::{DelegationToken, CMD_DATA_CREATE};
use crate::identity::Did;

/// On-disk envelope of one record.
#[derive(Debug, Serialize, Deserialize)]
struct StoredRecord {
    owner: Did,
    #[serde(default)]
    acl: Vec<Acl>,
    data: Value,
}

impl StoredRecord {
    fn can_read(&self, caller: &Did) -> bool {
        &self.owner == caller || self.acl.iter().any(|a| &a.grantee == caller && a.read)
    }

    fn can_write(&self, caller: &Did) -> bool {
        &self.owner == caller || self.acl.iter().any(|a| &a.grantee == caller && a.write)
    }
}

pub struct LocalDocumentStore {
    storage: EncryptedStorage,
    cipher: FieldCipher,
    trusted_issuer: Did,
}

fn check_segment(kind: &str, value: &str) -> StoreResult<()> {
    if is_safe_segment(value) {
        Ok(())
    } else {
        Err(StoreError::Invalid(format!("invalid {kind} id")))
    }
}

fn missing_as(what: String) -> impl FnOnce(StorageError) -> StoreError {
    move |e| match e {
        StorageError::NotFound(_) => StoreError::NotFound(what),
        other => StoreError::Storage(other),
    }
}

fn record_id(record: &Value) -> StoreResult<String> {
    let id = record
        .get("_id")
        .and_then(Value::as_str)
        .ok_or_else(|| StoreError::Invalid("record is missing _id".to_string()))?;
    uuid::Uuid::parse_str(id)
        .map_err(|_| StoreError::Invalid(format!("_id is not a UUID: {id}")))?;
    Ok(id.to_string())
}

/// Owner field of a stored record; the payload is skipped.
#[derive(Deserialize)]
struct RecordOwner {
    owner: Did,
}

/// Walk every collection's documents and keep the ones `owner` wrote.
fn scan_owned(storage: &EncryptedStorage, owner: &Did) -> StoreResult<Vec<DataReference>> {
    let paths = storage.paths();
    let mut references = Vec::new();

    for collection in storage.list_dirs(paths.documents_dir())? {
        if !is_safe_segment(&collection) {
            continue;
        }
        let dir = paths.collection_documents_dir(&collection);
        for document in storage.list_files(&dir, "json")? {
            if !is_safe_segment(&document) {
                continue;
            }
            // Records can vanish between listing and reading
            let Ok(record) =
                storage.read_json::<RecordOwner>(paths.document(&collection, &document))
            else {
                continue;
            };
            if &record.owner == owner {
                references.push(DataReference {
                    collection: collection.clone(),
                    document,
                });
            }
        }
    }

    Ok(references)
}

impl LocalDocumentStore {
    /// `storage` must already be initialized.
    pub fn new(storage: EncryptedStorage, encryption_key: &[u8; 32], trusted_issuer: Did) -> Self {
        Self {
            storage,
            cipher: FieldCipher::new(encryption_key),
            trusted_issuer,
        }
    }

    fn load_collection(&self, collection_id: &str) -> StoreResult<Collection> {
        check_segment("collection", collection_id)?;
        self.storage
            .read_json(self.storage.paths().collection(collection_id))
            .map_err(missing_as(format!("collection {collection_id}")))
    }

    fn load_record(&self, collection: &str, document: &str) -> StoreResult<StoredRecord> {
        check_segment("collection", collection)?;
        check_segment("document", document)?;
        self.storage
            .read_json(self.storage.paths().document(collection, document))
            .map_err(missing_as(format!("document {collection}/{document}")))
    }
}

#[async_trait]
impl DocumentStore for LocalDocumentStore {
    async fn create_collection(&self, collection: Collection) -> StoreResult<()> {
        check_segment("collection", &collection.id)?;
        let path = self.storage.paths().collection(&collection.id);
        self.storage
            .create_json(&path, &collection)
            .map_err(|e| match e {
                StorageError::AlreadyExists(_) => {
                    StoreError::AlreadyExists(format!("collection {}", collection.id))
                }
                other => StoreError::Storage(other),
            })?;
        debug!(collection = %collection.id, kind = ?collection.kind, "Collection created");
        Ok(())
    }

    async fn read_collection(&self, collection_id: &str) -> StoreResult<Collection> {
        self.load_collection(collection_id)
    }

    async fn create_data(
        &self,
        caller: &Did,
        request: CreateDataRequest,
        delegation: Option<&DelegationToken>,
    ) -> StoreResult<Vec<String>> {
        let collection = self.load_collection(&request.collection)?;

        let delegation = delegation
            .ok_or_else(|| StoreError::Unauthorized("delegation required".to_string()))?;
        delegation.verify(
            &self.trusted_issuer,
            caller,
            CMD_DATA_CREATE,
            chrono::Utc::now().timestamp(),
        )?;

        match collection.kind {
            CollectionKind::Owned if &request.owner != caller => {
                return Err(StoreError::Unauthorized(
                    "owned records must be written by their owner".to_string(),
                ));
            }
            CollectionKind::Standard if caller != &collection.owner => {
                return Err(StoreError::Unauthorized(format!(
                    "only the owner of {} may write to it",
                    collection.id
                )));
            }
            _ => {}
        }

        let mut ids = Vec::with_capacity(request.data.len());
        for mut record in request.data {
            let id = record_id(&record)?;
            self.cipher.seal(&mut record)?;

            let stored = StoredRecord {
                owner: request.owner.clone(),
                acl: request.acl.iter().cloned().collect(),
                data: record,
            };
            let path = self.storage.paths().document(&collection.id, &id);
            self.storage.create_json(&path, &stored).map_err(|e| match e {
                StorageError::AlreadyExists(_) => {
                    StoreError::AlreadyExists(format!("document {}/{id}", collection.id))
                }
                other => StoreError::Storage(other),
            })?;
            ids.push(id);
        }
        Ok(ids)
    }

    async fn read_data(&self, caller: &Did, collection: &str, document: &str) -> StoreResult<Value> {
        let record = self.load_record(collection, document)?;
        if !record.can_read(caller) {
            return Err(StoreError::Unauthorized(format!(
                "no read access to {collection}/{document}"
            )));
        }

        let mut data = record.data;
        self.cipher.open(&mut data)?;
        Ok(data)
    }

    async fn list_data_references(&self, caller: &Did) -> StoreResult<Vec<DataReference>> {
        let storage = self.storage.clone();
        let owner = caller.clone();
        let references = tokio::task::spawn_blocking(move || scan_owned(&storage, &owner)).await??;

        if references.is_empty() {
            return Err(StoreError::Unauthorized(format!("no data owned by {caller}")));
        }
        Ok(references)
    }

    async fn delete_data(&self, caller: &Did, collection: &str, document: &str) -> StoreResult<()> {
        let record = self.load_record(collection, document)?;
        if !record.can_write(caller) {
            return Err(StoreError::Unauthorized(format!(
                "no write access to {collection}/{document}"
            )));
        }

        self.storage
            .delete(self.storage.paths().document(collection, document))
            .map_err(missing_as(format!("document {collection}/{document}")))
    }

    async fn health_check(&self) -> StoreResult<()> {
        Ok(self.storage.health_check()?)
    }
}
