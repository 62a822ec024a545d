// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Axum extractor for the caller's session.
//!
//! Every vault route takes a session; anonymous callers get one on first
//! contact:
//!
//! ```rust,ignore
//! async fn my_handler(session: CurrentSession) -> impl IntoResponse {
//!     // session.session is the resolved Session
//! }
//! ```

use std::sync::Arc;

use axum::{extract::FromRequestParts, http::request::Parts};
use tower_cookies::Cookies;

use super::session::{Session, SessionManager};
use crate::error::ApiError;
use crate::state::AppState;

/// The resolved session plus the handle needed to rewrite its cookie.
pub struct CurrentSession {
    pub session: Session,
    cookies: Cookies,
    manager: Arc<SessionManager>,
}

impl CurrentSession {
    /// Write the (possibly modified) session back to the cookie.
    pub fn save(&self) -> Result<(), ApiError> {
        self.manager
            .persist(&self.cookies, &self.session)
            .map_err(ApiError::from)
    }

    /// Drop the cookie entirely.
    pub fn clear(&self) {
        self.manager.clear(&self.cookies);
    }
}

impl FromRequestParts<AppState> for CurrentSession {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let cookies = Cookies::from_request_parts(parts, state)
            .await
            .map_err(|(status, message)| ApiError::new(status, message))?;

        let manager = Arc::clone(&state.sessions);
        let (session, is_new) = manager.resolve(&cookies);
        let current = CurrentSession {
            session,
            cookies,
            manager,
        };
        if is_new {
            current.save()?;
        }
        Ok(current)
    }
}
