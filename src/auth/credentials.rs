// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Account records in the document store.
//!
//! Accounts live in a standard collection owned by the administrative
//! identity. Each record carries the account's signing key in a sealed
//! field, so the key survives even if the local key database is lost.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};

use super::account_id::{derive_account_id, email_hash, normalize_email};
use super::password::{
    hash_password_blocking, verify_dummy_blocking, verify_password_blocking, MIN_PASSWORD_LEN,
};
use super::AuthError;
use crate::delegation::{AdminClient, DelegationIssuer, ACCOUNTS_COLLECTION_ID};
use crate::identity::{Did, IdentityProvider, PrivateKey};
use crate::storage::{allot, Acl, CreateDataRequest, StoreError};

/// A registered account.
#[derive(Debug, Clone)]
pub struct Account {
    pub id: String,
    pub email: String,
    pub email_hash: String,
    pub password_hash: String,
    pub signing_key: PrivateKey,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Account {
    pub fn did(&self) -> Did {
        self.signing_key.did()
    }
}

/// Account record as read back (sealed fields already opened).
#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
struct AccountRecord {
    #[serde(rename = "_id")]
    id: String,
    email: String,
    email_hash: String,
    password_hash: String,
    signing_key: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<AccountRecord> for Account {
    type Error = AuthError;

    fn try_from(record: AccountRecord) -> Result<Self, Self::Error> {
        let signing_key = PrivateKey::from_hex(&record.signing_key)
            .map_err(|e| AuthError::Internal(format!("stored signing key unusable: {e}")))?;
        Ok(Account {
            id: record.id,
            email: record.email,
            email_hash: record.email_hash,
            password_hash: record.password_hash,
            signing_key,
            created_at: record.created_at,
            updated_at: record.updated_at,
        })
    }
}

fn validate(email: &str, password: &str) -> Result<(), AuthError> {
    if email.trim().is_empty() || password.is_empty() {
        return Err(AuthError::Validation(
            "Email and password are required".to_string(),
        ));
    }
    Ok(())
}

pub struct CredentialStore {
    admin: Arc<AdminClient>,
    issuer: Arc<DelegationIssuer>,
    identities: Arc<IdentityProvider>,
    account_id_secret: Vec<u8>,
}

impl CredentialStore {
    pub fn new(
        admin: Arc<AdminClient>,
        issuer: Arc<DelegationIssuer>,
        identities: Arc<IdentityProvider>,
        account_id_secret: Vec<u8>,
    ) -> Self {
        Self {
            admin,
            issuer,
            identities,
            account_id_secret,
        }
    }

    pub fn account_id_for(&self, email: &str) -> String {
        derive_account_id(&self.account_id_secret, email).to_string()
    }

    /// Create an account. Fails with `DuplicateAccount` if the email is taken.
    pub async fn register(&self, email: &str, password: &str) -> Result<Account, AuthError> {
        validate(email, password)?;
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AuthError::Validation(format!(
                "Password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }
        let email = normalize_email(email);
        if !email.contains('@') {
            return Err(AuthError::Validation("Invalid email address".to_string()));
        }

        let id = self.account_id_for(&email);
        match self.find_by_id(&id).await {
            Ok(_) => return Err(AuthError::DuplicateAccount),
            Err(AuthError::NotFound(_)) => {}
            Err(e) => return Err(e),
        }

        let password_hash = hash_password_blocking(password.to_string()).await?;
        let signing_key = self.identities.get_or_create_signing_key(&id);
        let now = Utc::now();

        self.admin.ensure_accounts_collection().await?;

        let admin_did = self.admin.did().clone();
        let delegation = self.issuer.issue_create_data(&admin_did).await?;
        let record = json!({
            "_id": id,
            "email": email,
            "emailHash": email_hash(&email),
            "passwordHash": password_hash,
            "signingKey": allot(signing_key.to_hex()),
            "createdAt": now,
            "updatedAt": now,
        });
        let request = CreateDataRequest {
            owner: admin_did.clone(),
            acl: Some(Acl {
                grantee: admin_did.clone(),
                read: true,
                write: true,
                execute: true,
            }),
            collection: ACCOUNTS_COLLECTION_ID.to_string(),
            data: vec![record],
        };

        match self
            .admin
            .store()
            .create_data(&admin_did, request, Some(&delegation))
            .await
        {
            Ok(_) => {}
            Err(StoreError::AlreadyExists(_)) => return Err(AuthError::DuplicateAccount),
            Err(e) => return Err(e.into()),
        }

        info!(user_id = %id, did = %signing_key.did(), "Account registered");
        Ok(Account {
            email_hash: email_hash(&email),
            id,
            email,
            password_hash,
            signing_key,
            created_at: now,
            updated_at: now,
        })
    }

    /// Check credentials. Unknown email and wrong password are
    /// indistinguishable to the caller.
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<Account, AuthError> {
        validate(email, password)?;
        let id = self.account_id_for(email);

        let account = match self.find_by_id(&id).await {
            Ok(account) => account,
            Err(AuthError::NotFound(_)) => {
                verify_dummy_blocking(password.to_string()).await;
                return Err(AuthError::InvalidCredentials);
            }
            Err(e) => return Err(e),
        };

        if !verify_password_blocking(password.to_string(), account.password_hash.clone()).await {
            warn!(user_id = %id, "Password verification failed");
            return Err(AuthError::InvalidCredentials);
        }
        Ok(account)
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Account, AuthError> {
        let data = match self
            .admin
            .store()
            .read_data(self.admin.did(), ACCOUNTS_COLLECTION_ID, id)
            .await
        {
            Ok(data) => data,
            Err(StoreError::NotFound(_)) => return Err(AuthError::NotFound(id.to_string())),
            Err(e) => return Err(e.into()),
        };

        let record: AccountRecord = serde_json::from_value(data)
            .map_err(|e| AuthError::Internal(format!("account record malformed: {e}")))?;
        record.try_into()
    }
}
