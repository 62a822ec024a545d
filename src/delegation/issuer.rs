// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Mints short-lived delegations from the administrative identity.
//!
//! A fresh token is minted for every write and never cached. Delegations
//! extend the current root token and never outlive it.

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use super::admin::AdminClient;
use super::token::{command_covers, new_nonce, Claims, DelegationToken, TokenError, CMD_DATA_CREATE};
use crate::identity::Did;

pub struct DelegationIssuer {
    admin: Arc<AdminClient>,
    default_ttl: Duration,
}

impl DelegationIssuer {
    pub fn new(admin: Arc<AdminClient>, default_ttl: Duration) -> Self {
        Self { admin, default_ttl }
    }

    /// Token letting `audience` run `command` for at most `ttl`.
    pub async fn issue(
        &self,
        audience: &Did,
        command: &str,
        ttl: Duration,
    ) -> Result<DelegationToken, TokenError> {
        let root = self.admin.root_token().await;
        if !command_covers(&root.claims().cmd, command) {
            return Err(TokenError::CommandNotCovered {
                granted: root.claims().cmd.clone(),
                requested: command.to_string(),
            });
        }

        let now = chrono::Utc::now().timestamp();
        let exp = (now + ttl.as_secs() as i64).min(root.expires_at());
        if exp <= now {
            return Err(TokenError::Expired {
                expires_at: root.expires_at(),
                now,
            });
        }

        let claims = Claims {
            iss: self.admin.did().clone(),
            aud: audience.clone(),
            sub: self.admin.did().clone(),
            cmd: command.to_string(),
            exp,
            nonce: new_nonce(),
            prf: vec![root.digest()],
        };
        let token = DelegationToken::sign(claims, self.admin.key())?;
        debug!(audience = %audience, command, exp, "Delegation issued");
        Ok(token)
    }

    /// Token for one data write by `audience`, with the configured lifetime.
    pub async fn issue_create_data(&self, audience: &Did) -> Result<DelegationToken, TokenError> {
        self.issue(audience, CMD_DATA_CREATE, self.default_ttl).await
    }

    pub fn admin(&self) -> &Arc<AdminClient> {
        &self.admin
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::delegation::admin::tests::test_admin;
    use crate::identity::PrivateKey;

    #[tokio::test]
    async fn issued_token_verifies_for_audience() {
        let (admin, _dir) = test_admin(Duration::from_secs(86_400));
        let issuer = DelegationIssuer::new(Arc::clone(&admin), Duration::from_secs(3600));
        let user = PrivateKey::generate().did();

        let token = issuer.issue_create_data(&user).await.unwrap();
        let now = chrono::Utc::now().timestamp();

        assert!(token.verify(admin.did(), &user, CMD_DATA_CREATE, now).is_ok());
        assert!(token.expires_at() <= now + 3600);
        assert_eq!(token.claims().prf, vec![admin.root_token().await.digest()]);
    }

    #[tokio::test]
    async fn expiry_is_capped_by_root_token() {
        let (admin, _dir) = test_admin(Duration::from_secs(60));
        let issuer = DelegationIssuer::new(Arc::clone(&admin), Duration::from_secs(3600));
        let user = PrivateKey::generate().did();

        let token = issuer.issue_create_data(&user).await.unwrap();
        assert_eq!(token.expires_at(), admin.root_token().await.expires_at());
    }

    #[tokio::test]
    async fn tokens_are_never_reused() {
        let (admin, _dir) = test_admin(Duration::from_secs(86_400));
        let issuer = DelegationIssuer::new(admin, Duration::from_secs(3600));
        let user = PrivateKey::generate().did();

        let a = issuer.issue_create_data(&user).await.unwrap();
        let b = issuer.issue_create_data(&user).await.unwrap();
        assert_ne!(a.as_str(), b.as_str());
    }

    #[tokio::test]
    async fn commands_outside_root_are_refused() {
        let (admin, _dir) = test_admin(Duration::from_secs(86_400));
        let issuer = DelegationIssuer::new(admin, Duration::from_secs(3600));
        let user = PrivateKey::generate().did();

        let result = issuer
            .issue(&user, "/nil/auth/payments", Duration::from_secs(60))
            .await;
        assert!(matches!(result, Err(TokenError::CommandNotCovered { .. })));
    }
}
