// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Signed session cookies.
//!
//! The whole [`Session`] travels as camelCase JSON in the signed cookie
//! `memoryvault_session`. A missing, forged or unparsable cookie yields a
//! fresh anonymous session.

use serde::{Deserialize, Serialize};
use tower_cookies::{
    cookie::{time::Duration as CookieDuration, SameSite},
    Cookie, Cookies, Key,
};
use tracing::debug;

use super::AuthError;
use crate::identity::Did;

pub const SESSION_COOKIE_NAME: &str = "memoryvault_session";
pub const SESSION_MAX_AGE_DAYS: i64 = 30;

/// Per-browser session state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub session_id: String,
    #[serde(default)]
    pub is_authenticated: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_did: Option<Did>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Unix milliseconds.
    pub created_at: i64,
}

impl Session {
    /// A new anonymous session with a random id.
    pub fn anonymous() -> Self {
        Self {
            session_id: uuid::Uuid::new_v4().to_string(),
            is_authenticated: false,
            user_id: None,
            user_did: None,
            email: None,
            created_at: chrono::Utc::now().timestamp_millis(),
        }
    }

    /// Anonymous → Authenticated. The session id is kept.
    pub fn authenticate(&mut self, user_id: impl Into<String>, user_did: Did, email: impl Into<String>) {
        self.is_authenticated = true;
        self.user_id = Some(user_id.into());
        self.user_did = Some(user_did);
        self.email = Some(email.into());
    }

    /// Authenticated → Anonymous.
    pub fn logout(&mut self) {
        self.is_authenticated = false;
        self.user_id = None;
        self.user_did = None;
        self.email = None;
    }

    /// Account id, only when authenticated.
    pub fn authenticated_user(&self) -> Option<&str> {
        if self.is_authenticated {
            self.user_id.as_deref()
        } else {
            None
        }
    }
}

/// Reads and writes the session cookie.
#[derive(Clone)]
pub struct SessionManager {
    key: Key,
    secure: bool,
}

impl SessionManager {
    /// `secret` must be at least 64 bytes.
    pub fn new(secret: &[u8], secure: bool) -> Result<Self, AuthError> {
        let key = Key::try_from(secret)
            .map_err(|e| AuthError::Internal(format!("session key rejected: {e}")))?;
        Ok(Self { key, secure })
    }

    /// Current session and whether it was just created.
    pub fn resolve(&self, cookies: &Cookies) -> (Session, bool) {
        let Some(cookie) = cookies.signed(&self.key).get(SESSION_COOKIE_NAME) else {
            return (Session::anonymous(), true);
        };

        match serde_json::from_str::<Session>(cookie.value()) {
            Ok(session) if !session.session_id.is_empty() => (session, false),
            Ok(_) => (Session::anonymous(), true),
            Err(e) => {
                debug!(error = %e, "Discarding unparsable session cookie");
                (Session::anonymous(), true)
            }
        }
    }

    pub fn persist(&self, cookies: &Cookies, session: &Session) -> Result<(), AuthError> {
        let value = serde_json::to_string(session)
            .map_err(|e| AuthError::Internal(format!("session encoding failed: {e}")))?;

        let cookie = Cookie::build((SESSION_COOKIE_NAME, value))
            .http_only(true)
            .same_site(SameSite::Lax)
            .path("/")
            .max_age(CookieDuration::days(SESSION_MAX_AGE_DAYS))
            .secure(self.secure)
            .build();
        cookies.signed(&self.key).add(cookie);
        Ok(())
    }

    pub fn clear(&self, cookies: &Cookies) {
        cookies.remove(Cookie::build((SESSION_COOKIE_NAME, "")).path("/").build());
    }
}
