// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Memory Vault - Personal Encrypted Notes Service
//!
//! Users keep notes in an encrypted document store, each note written under
//! the user's own signing identity with a short-lived delegation from the
//! service. A private LLM searches, summarizes and answers questions over
//! them.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum)
//! - `auth` - Sessions, accounts and principal resolution
//! - `identity` - Per-principal secp256k1 signing keys
//! - `delegation` - Root token and delegation tokens
//! - `notes` - Owner-scoped note repository
//! - `assistant` - Private LLM client and prompts
//! - `storage` - Encrypted document store

pub mod api;
pub mod assistant;
pub mod auth;
pub mod config;
pub mod delegation;
pub mod error;
pub mod identity;
pub mod models;
pub mod notes;
pub mod state;
pub mod storage;
