// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Contract of the encrypted document-store collaborator.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::encrypted_fs::StorageError;
use super::field_crypto::FieldCryptoError;
use crate::delegation::{DelegationToken, TokenError};
use crate::identity::Did;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollectionKind {
    /// Records belong to the collection owner; the owner reads and writes.
    Standard,
    /// Records belong to individual users under per-record ACLs.
    Owned,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Collection {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "type")]
    pub kind: CollectionKind,
    pub name: String,
    pub owner: Did,
    #[serde(default)]
    pub schema: Value,
}

/// Access granted to one non-owner identity on one record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Acl {
    pub grantee: Did,
    pub read: bool,
    pub write: bool,
    pub execute: bool,
}

#[derive(Debug, Clone)]
pub struct CreateDataRequest {
    pub owner: Did,
    pub acl: Option<Acl>,
    pub collection: String,
    /// Records to insert, each carrying a UUID `_id`.
    pub data: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataReference {
    pub collection: String,
    pub document: String,
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("already exists: {0}")]
    AlreadyExists(String),

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("invalid request: {0}")]
    Invalid(String),

    #[error("delegation rejected: {0}")]
    Delegation(#[from] TokenError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    FieldCrypto(#[from] FieldCryptoError),

    #[error("blocking storage task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// The encrypted document store. Every data call names the calling identity.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn create_collection(&self, collection: Collection) -> StoreResult<()>;

    async fn read_collection(&self, collection_id: &str) -> StoreResult<Collection>;

    /// Insert records; returns their ids. Requires a delegation addressed to
    /// `caller` that covers data creation.
    async fn create_data(
        &self,
        caller: &Did,
        request: CreateDataRequest,
        delegation: Option<&DelegationToken>,
    ) -> StoreResult<Vec<String>>;

    /// Read one record with sealed fields opened.
    async fn read_data(&self, caller: &Did, collection: &str, document: &str) -> StoreResult<Value>;

    /// References to every record owned by `caller`.
    async fn list_data_references(&self, caller: &Did) -> StoreResult<Vec<DataReference>>;

    async fn delete_data(&self, caller: &Did, collection: &str, document: &str) -> StoreResult<()>;

    async fn health_check(&self) -> StoreResult<()>;
}
