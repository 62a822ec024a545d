// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication and account errors.

use axum::http::StatusCode;

use crate::delegation::TokenError;
use crate::storage::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Request failed input validation.
    #[error("{0}")]
    Validation(String),

    #[error("User with this email already exists")]
    DuplicateAccount,

    /// Unknown email or wrong password; never distinguish the two.
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Account not found: {0}")]
    NotFound(String),

    #[error("Account storage failed: {0}")]
    Store(#[from] StoreError),

    #[error("Delegation failed: {0}")]
    Delegation(#[from] TokenError),

    #[error("Internal authentication error: {0}")]
    Internal(String),
}

impl AuthError {
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::Validation(_) => "validation_error",
            AuthError::DuplicateAccount => "duplicate_account",
            AuthError::InvalidCredentials => "invalid_credentials",
            AuthError::NotFound(_) => "not_found",
            AuthError::Store(_) => "store_error",
            AuthError::Delegation(_) => "delegation_error",
            AuthError::Internal(_) => "internal_error",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::Validation(_) | AuthError::DuplicateAccount => StatusCode::BAD_REQUEST,
            AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AuthError::NotFound(_) => StatusCode::NOT_FOUND,
            AuthError::Store(_) | AuthError::Delegation(_) | AuthError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Whether the message is safe to return to the client.
    pub fn is_client_error(&self) -> bool {
        self.status_code().is_client_error()
    }
}
