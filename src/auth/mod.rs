// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! Sessions, accounts and principal resolution.
//!
//! ## Flow
//!
//! 1. [`CurrentSession`] reads the signed `memoryvault_session` cookie, or
//!    issues a fresh anonymous one.
//! 2. `/auth/register` and `/auth/login` go through [`CredentialStore`] and
//!    mark the session authenticated.
//! 3. [`PrincipalResolver`] maps the session to the signing identity the
//!    request acts as.
//!
//! Account ids are derived from the normalized email with a keyed HMAC, so
//! lookups need no index.

pub mod account_id;
pub mod credentials;
pub mod error;
pub mod extractor;
pub mod password;
pub mod principal;
pub mod session;

pub use credentials::{Account, CredentialStore};
pub use error::AuthError;
pub use extractor::CurrentSession;
pub use principal::PrincipalResolver;
pub use session::{Session, SessionManager, SESSION_COOKIE_NAME};
