// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Chooses the identity a request acts as.
//!
//! Authenticated sessions act as their account's key; anonymous sessions
//! act as a key bound to the session id. Nothing is process-global.

use std::sync::Arc;

use tracing::warn;

use super::credentials::CredentialStore;
use super::error::AuthError;
use super::session::Session;
use crate::identity::{IdentityProvider, SigningIdentity};

pub struct PrincipalResolver {
    credentials: Arc<CredentialStore>,
    identities: Arc<IdentityProvider>,
}

impl PrincipalResolver {
    pub fn new(credentials: Arc<CredentialStore>, identities: Arc<IdentityProvider>) -> Self {
        Self {
            credentials,
            identities,
        }
    }

    /// An account whose record is unreadable falls back to the key
    /// persisted under its id at registration. No key is ever minted for an
    /// account here.
    pub async fn resolve(&self, session: &Session) -> Result<SigningIdentity, AuthError> {
        let Some(user_id) = session.authenticated_user() else {
            return Ok(self.identities.session_identity(&session.session_id));
        };

        let lookup = match self.credentials.find_by_id(user_id).await {
            Ok(account) => return Ok(SigningIdentity::new(user_id, account.signing_key)),
            Err(e) => e,
        };
        warn!(user_id, error = %lookup, "Account lookup failed, using stored key");

        match self.identities.stored_signing_key(user_id) {
            Ok(Some(key)) => Ok(SigningIdentity::new(user_id, key)),
            Ok(None) => Err(AuthError::Internal(format!(
                "no signing key available for account {user_id}: {lookup}"
            ))),
            Err(e) => Err(AuthError::Internal(format!(
                "signing key lookup for account {user_id} failed: {e}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::credentials::tests::harness;
    use crate::identity::PrivateKey;

    #[tokio::test]
    async fn anonymous_sessions_use_session_keys() {
        let h = harness().await;
        let resolver = PrincipalResolver::new(h.credentials.clone(), h.identities.clone());

        let a = Session::anonymous();
        let b = Session::anonymous();
        let id_a = resolver.resolve(&a).await.unwrap();

        assert_eq!(id_a.principal_id, format!("session:{}", a.session_id));
        assert_eq!(resolver.resolve(&a).await.unwrap().did, id_a.did);
        assert_ne!(resolver.resolve(&b).await.unwrap().did, id_a.did);
    }

    #[tokio::test]
    async fn authenticated_sessions_use_account_key() {
        let h = harness().await;
        let resolver = PrincipalResolver::new(h.credentials.clone(), h.identities.clone());
        let account = h.credentials.register("p@example.com", "secret1").await.unwrap();

        let mut first = Session::anonymous();
        first.authenticate(&account.id, account.did(), &account.email);
        let mut second = Session::anonymous();
        second.authenticate(&account.id, account.did(), &account.email);

        let resolved = resolver.resolve(&first).await.unwrap();
        assert_eq!(resolved.did, account.did());
        assert_eq!(resolver.resolve(&second).await.unwrap().did, account.did());

        first.logout();
        assert_ne!(resolver.resolve(&first).await.unwrap().did, account.did());
    }

    #[tokio::test]
    async fn unreadable_account_uses_key_stored_at_registration() {
        let h = harness().await;
        let resolver = PrincipalResolver::new(h.credentials.clone(), h.identities.clone());

        // A key persisted under an id whose account record is gone
        let user_id = uuid::Uuid::new_v4().to_string();
        let stored = h.identities.get_or_create_signing_key(&user_id);
        let mut session = Session::anonymous();
        session.authenticate(&user_id, stored.did(), "gone@example.com");

        assert_eq!(resolver.resolve(&session).await.unwrap().did, stored.did());
    }

    #[tokio::test]
    async fn unreadable_account_without_stored_key_is_an_error() {
        let h = harness().await;
        let resolver = PrincipalResolver::new(h.credentials.clone(), h.identities.clone());

        let user_id = uuid::Uuid::new_v4().to_string();
        let mut session = Session::anonymous();
        session.authenticate(&user_id, PrivateKey::generate().did(), "lost@example.com");

        let err = resolver.resolve(&session).await.unwrap_err();
        assert!(matches!(err, AuthError::Internal(_)));
        assert!(!err.is_client_error());

        // The failed resolve must not have minted a replacement key
        assert!(h.identities.stored_signing_key(&user_id).unwrap().is_none());
        assert!(resolver.resolve(&session).await.is_err());
    }
}
