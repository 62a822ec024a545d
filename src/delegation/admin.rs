// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Administrative Client
//!
//! The service's own identity ("builder"): it owns the collections, signs
//! every delegation and holds the root token those delegations extend.
//!
//! ## Lifecycle
//!
//! 1. [`AdminClient::new`] mints the first root token (no I/O).
//! 2. [`AdminClient::initialize`] provisions the notes and accounts
//!    collections. Idempotent.
//! 3. [`RootTokenRefresher`] re-mints the root token on an interval until
//!    [`AdminClient::shutdown`] cancels it.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::token::{new_nonce, Claims, DelegationToken, TokenError, CMD_ROOT};
use crate::identity::{Did, PrivateKey, SigningIdentity};
use crate::storage::{Collection, CollectionKind, DocumentStore, StoreError};

/// Collection holding every note, one owner per record.
pub const NOTES_COLLECTION_ID: &str = "memory-vault-collection";
/// Collection holding account records, owned by the administrative identity.
pub const ACCOUNTS_COLLECTION_ID: &str = "a1b2c3d4-e5f6-7890-abcd-ef1234567890";

const ADMIN_PRINCIPAL_ID: &str = "builder";

#[derive(Debug, thiserror::Error)]
pub enum AdminError {
    #[error(transparent)]
    Token(#[from] TokenError),

    #[error("collection provisioning failed: {0}")]
    Store(#[from] StoreError),
}

fn notes_collection(owner: &Did) -> Collection {
    Collection {
        id: NOTES_COLLECTION_ID.to_string(),
        kind: CollectionKind::Owned,
        name: "Memory Vault Collection".to_string(),
        owner: owner.clone(),
        schema: json!({
            "type": "object",
            "properties": {
                "_id": { "type": "string", "format": "uuid" },
                "title": { "type": "string" },
                "content": {
                    "type": "object",
                    "properties": { "%share": { "type": "string" } },
                    "required": ["%share"]
                },
                "tags": { "type": "array", "items": { "type": "string" } },
                "createdAt": { "type": "string" },
                "updatedAt": { "type": "string" }
            },
            "required": ["_id", "title", "content", "createdAt", "updatedAt"]
        }),
    }
}

fn accounts_collection(owner: &Did) -> Collection {
    Collection {
        id: ACCOUNTS_COLLECTION_ID.to_string(),
        kind: CollectionKind::Standard,
        name: "Memory Vault Users".to_string(),
        owner: owner.clone(),
        schema: json!({
            "type": "object",
            "properties": {
                "_id": { "type": "string", "format": "uuid" },
                "email": { "type": "string" },
                "emailHash": { "type": "string" },
                "passwordHash": { "type": "string" },
                "signingKey": {
                    "type": "object",
                    "properties": { "%share": { "type": "string" } },
                    "required": ["%share"]
                },
                "createdAt": { "type": "string" },
                "updatedAt": { "type": "string" }
            },
            "required": ["_id", "email", "emailHash", "passwordHash", "signingKey"]
        }),
    }
}

fn mint_root_token(key: &PrivateKey, ttl: Duration) -> Result<DelegationToken, TokenError> {
    let did = key.did();
    let claims = Claims {
        iss: did.clone(),
        aud: did.clone(),
        sub: did,
        cmd: CMD_ROOT.to_string(),
        exp: chrono::Utc::now().timestamp() + ttl.as_secs() as i64,
        nonce: new_nonce(),
        prf: Vec::new(),
    };
    DelegationToken::sign(claims, key)
}

pub struct AdminClient {
    identity: SigningIdentity,
    store: Arc<dyn DocumentStore>,
    root: RwLock<DelegationToken>,
    root_ttl: Duration,
    shutdown: CancellationToken,
}

impl AdminClient {
    pub fn new(
        key: PrivateKey,
        store: Arc<dyn DocumentStore>,
        root_ttl: Duration,
    ) -> Result<Self, TokenError> {
        let root = mint_root_token(&key, root_ttl)?;
        Ok(Self {
            identity: SigningIdentity::new(ADMIN_PRINCIPAL_ID, key),
            store,
            root: RwLock::new(root),
            root_ttl,
            shutdown: CancellationToken::new(),
        })
    }

    /// Provision the collections the vault writes into.
    pub async fn initialize(&self) -> Result<(), AdminError> {
        self.refresh_root_token().await?;
        self.ensure_notes_collection().await?;
        self.ensure_accounts_collection().await?;

        info!(did = %self.did(), "Administrative client initialized");
        Ok(())
    }

    pub async fn ensure_notes_collection(&self) -> Result<(), StoreError> {
        self.ensure_collection(notes_collection(self.did())).await
    }

    pub async fn ensure_accounts_collection(&self) -> Result<(), StoreError> {
        self.ensure_collection(accounts_collection(self.did())).await
    }

    /// Create `collection` unless it exists. Concurrent creators both succeed.
    pub async fn ensure_collection(&self, collection: Collection) -> Result<(), StoreError> {
        match self.store.read_collection(&collection.id).await {
            Ok(_) => return Ok(()),
            Err(StoreError::NotFound(_)) => {}
            Err(e) => return Err(e),
        }

        let id = collection.id.clone();
        match self.store.create_collection(collection).await {
            Ok(()) => {
                info!(collection = %id, "Collection created");
                Ok(())
            }
            Err(StoreError::AlreadyExists(_)) => Ok(()),
            Err(e) => Err(e),
        }
    }

    pub async fn root_token(&self) -> DelegationToken {
        self.root.read().await.clone()
    }

    pub async fn refresh_root_token(&self) -> Result<(), TokenError> {
        let token = mint_root_token(&self.identity.key, self.root_ttl)?;
        *self.root.write().await = token;
        Ok(())
    }

    pub fn did(&self) -> &Did {
        &self.identity.did
    }

    pub fn key(&self) -> &PrivateKey {
        &self.identity.key
    }

    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    pub fn refresher(self: &Arc<Self>, interval: Duration) -> RootTokenRefresher {
        RootTokenRefresher {
            admin: Arc::clone(self),
            interval,
        }
    }

    /// Token cancelled by [`shutdown`](Self::shutdown).
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    pub fn shutdown(&self) {
        info!("Administrative client shutting down");
        self.shutdown.cancel();
    }
}

/// Background task keeping the root token fresh.
pub struct RootTokenRefresher {
    admin: Arc<AdminClient>,
    interval: Duration,
}

impl RootTokenRefresher {
    /// Run until `shutdown` fires. Spawn with `tokio::spawn`.
    pub async fn run(self, shutdown: CancellationToken) {
        info!(
            interval_secs = self.interval.as_secs(),
            "Root token refresher starting"
        );

        loop {
            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {},
                _ = shutdown.cancelled() => {
                    info!("Root token refresher shutting down");
                    return;
                }
            }

            match self.admin.refresh_root_token().await {
                Ok(()) => {
                    let expires_at = self.admin.root_token().await.expires_at();
                    info!(expires_at, "Root token refreshed");
                }
                Err(e) => warn!(error = %e, "Root token refresh failed"),
            }
        }
    }
}
