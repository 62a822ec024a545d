// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Delegation
//!
//! Capability tokens the administrative identity issues so that a user
//! identity may write into the document store.

pub mod admin;
pub mod issuer;
pub mod token;

pub use admin::{
    AdminClient, AdminError, RootTokenRefresher, ACCOUNTS_COLLECTION_ID, NOTES_COLLECTION_ID,
};
pub use issuer::DelegationIssuer;
pub use token::{
    command_covers, new_nonce, Claims, DelegationToken, TokenError, CMD_DATA_CREATE, CMD_ROOT,
};
