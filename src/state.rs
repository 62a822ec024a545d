// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Shared application state and its startup wiring.

use std::sync::Arc;

use tracing::info;

use crate::assistant::{Assistant, CompletionClient};
use crate::auth::{AuthError, CredentialStore, PrincipalResolver, SessionManager};
use crate::config::Config;
use crate::delegation::{AdminClient, AdminError, DelegationIssuer, TokenError};
use crate::identity::{IdentityError, IdentityProvider, KeyStoreError, PrivateKey, RedbKeyStore};
use crate::notes::NoteRepository;
use crate::storage::{DocumentStore, EncryptedStorage, LocalDocumentStore, StorageError, StoragePaths};

#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("data directory unusable: {0}")]
    Storage(#[from] StorageError),

    #[error("builder key unusable: {0}")]
    Identity(#[from] IdentityError),

    #[error("key database unusable: {0}")]
    KeyStore(#[from] KeyStoreError),

    #[error("root token minting failed: {0}")]
    Token(#[from] TokenError),

    #[error("administrative setup failed: {0}")]
    Admin(#[from] AdminError),

    #[error("session setup failed: {0}")]
    Session(#[from] AuthError),
}

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub sessions: Arc<SessionManager>,
    pub identities: Arc<IdentityProvider>,
    pub admin: Arc<AdminClient>,
    pub issuer: Arc<DelegationIssuer>,
    pub credentials: Arc<CredentialStore>,
    pub principals: Arc<PrincipalResolver>,
    pub notes: Arc<NoteRepository>,
    pub assistant: Arc<Assistant>,
    pub store: Arc<dyn DocumentStore>,
}

impl AppState {
    /// Open the data directory and key database, then provision the
    /// administrative collections.
    pub async fn initialize(
        config: Config,
        llm: Arc<dyn CompletionClient>,
    ) -> Result<Self, StartupError> {
        let paths = StoragePaths::new(&config.data_dir);
        let mut storage = EncryptedStorage::new(paths.clone());
        storage.initialize()?;

        let admin_key = PrivateKey::from_hex(&config.builder_private_key)?;
        let store: Arc<dyn DocumentStore> = Arc::new(LocalDocumentStore::new(
            storage,
            &config.store_encryption_key,
            admin_key.did(),
        ));

        let keys = RedbKeyStore::open(&paths.keys_db())?;
        let identities = Arc::new(IdentityProvider::new(
            Arc::new(keys),
            config.key_cache_capacity,
        ));

        let admin = Arc::new(AdminClient::new(
            admin_key,
            Arc::clone(&store),
            config.root_token_ttl,
        )?);
        admin.initialize().await?;
        info!(did = %admin.did(), "Administrative identity ready");

        let issuer = Arc::new(DelegationIssuer::new(
            Arc::clone(&admin),
            config.delegation_ttl,
        ));
        let credentials = Arc::new(CredentialStore::new(
            Arc::clone(&admin),
            Arc::clone(&issuer),
            Arc::clone(&identities),
            config.account_id_secret.clone(),
        ));
        let principals = Arc::new(PrincipalResolver::new(
            Arc::clone(&credentials),
            Arc::clone(&identities),
        ));
        let notes = Arc::new(NoteRepository::new(
            Arc::clone(&issuer),
            Arc::clone(&store),
            config.timeouts,
        ));
        let sessions = Arc::new(SessionManager::new(
            &config.session_secret,
            config.cookie_secure,
        )?);
        let assistant = Arc::new(Assistant::new(llm, config.nilai.model.clone()));

        Ok(Self {
            config: Arc::new(config),
            sessions,
            identities,
            admin,
            issuer,
            credentials,
            principals,
            notes,
            assistant,
            store,
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::assistant::tests::ScriptedClient;
    use crate::config::tests::test_config;
    use crate::delegation::{ACCOUNTS_COLLECTION_ID, NOTES_COLLECTION_ID};

    /// State over a fresh data directory with a scripted LLM.
    pub(crate) async fn test_state(reply: Option<&str>) -> (AppState, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let state = AppState::initialize(
            test_config(dir.path()),
            Arc::new(ScriptedClient::replying(reply)),
        )
        .await
        .unwrap();
        (state, dir)
    }

    #[tokio::test]
    async fn initialize_provisions_collections_and_key_db() {
        let (state, dir) = test_state(None).await;

        assert!(dir.path().join("keys.redb").is_file());
        assert!(state.store.read_collection(NOTES_COLLECTION_ID).await.is_ok());
        assert!(state.store.read_collection(ACCOUNTS_COLLECTION_ID).await.is_ok());
        assert!(state.store.health_check().await.is_ok());
    }

    #[tokio::test]
    async fn invalid_builder_key_fails_startup() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = test_config(dir.path());
        config.builder_private_key = "00".repeat(32);

        let result = AppState::initialize(config, Arc::new(ScriptedClient::replying(None))).await;
        assert!(matches!(result, Err(StartupError::Identity(_))));
    }
}
