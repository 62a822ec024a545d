// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Notes
//!
//! Owner-scoped note CRUD over the document store. Every note is owned by
//! the principal that wrote it; the administrative identity is granted read
//! and execute, never write. `content` is sealed at rest.
//!
//! ## Timeouts
//!
//! Listing never fails: a slow or refusing store degrades to fewer (or no)
//! notes. Single-note reads and all writes surface timeouts as errors.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, error, info, warn};
use utoipa::ToSchema;

use crate::config::Timeouts;
use crate::delegation::{DelegationIssuer, TokenError, NOTES_COLLECTION_ID};
use crate::identity::{Did, SigningIdentity};
use crate::storage::{allot, Acl, CreateDataRequest, DocumentStore, StoreError};

/// A note with its content in plaintext.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, thiserror::Error)]
pub enum NoteError {
    #[error("Note not found")]
    NotFound(String),

    #[error("document store timed out during {0}")]
    Timeout(&'static str),

    #[error("stored note is malformed: {0}")]
    Malformed(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Delegation(#[from] TokenError),
}

fn not_found_or(id: &str) -> impl FnOnce(StoreError) -> NoteError + '_ {
    move |e| match e {
        StoreError::NotFound(_) | StoreError::Unauthorized(_) | StoreError::Invalid(_) => {
            NoteError::NotFound(id.to_string())
        }
        other => NoteError::Store(other),
    }
}

async fn bounded<T>(
    limit: Duration,
    operation: &'static str,
    call: impl Future<Output = Result<T, StoreError>>,
) -> Result<Result<T, StoreError>, NoteError> {
    tokio::time::timeout(limit, call)
        .await
        .map_err(|_| NoteError::Timeout(operation))
}

pub struct NoteRepository {
    issuer: Arc<DelegationIssuer>,
    store: Arc<dyn DocumentStore>,
    timeouts: Timeouts,
}

impl NoteRepository {
    pub fn new(issuer: Arc<DelegationIssuer>, store: Arc<dyn DocumentStore>, timeouts: Timeouts) -> Self {
        Self {
            issuer,
            store,
            timeouts,
        }
    }

    fn admin_did(&self) -> &Did {
        self.issuer.admin().did()
    }

    /// Store `note` as a new record owned by `principal`, under a fresh
    /// delegation.
    async fn write(&self, principal: &SigningIdentity, note: &Note) -> Result<(), NoteError> {
        bounded(
            self.timeouts.write,
            "collection setup",
            self.issuer.admin().ensure_notes_collection(),
        )
        .await??;

        let delegation = self.issuer.issue_create_data(&principal.did).await?;
        let record = json!({
            "_id": note.id,
            "title": note.title,
            "content": allot(note.content.clone()),
            "tags": note.tags,
            "createdAt": note.created_at,
            "updatedAt": note.updated_at,
        });
        let request = CreateDataRequest {
            owner: principal.did.clone(),
            acl: Some(Acl {
                grantee: self.admin_did().clone(),
                read: true,
                write: false,
                execute: true,
            }),
            collection: NOTES_COLLECTION_ID.to_string(),
            data: vec![record],
        };

        bounded(
            self.timeouts.write,
            "create",
            self.store
                .create_data(&principal.did, request, Some(&delegation)),
        )
        .await??;
        Ok(())
    }

    pub async fn create(
        &self,
        principal: &SigningIdentity,
        title: &str,
        content: &str,
        tags: Vec<String>,
    ) -> Result<String, NoteError> {
        let now = Utc::now();
        let note = Note {
            id: uuid::Uuid::new_v4().to_string(),
            title: title.to_string(),
            content: content.to_string(),
            tags,
            created_at: now,
            updated_at: now,
        };
        self.write(principal, &note).await?;

        info!(note_id = %note.id, owner = %principal.did, "Note created");
        Ok(note.id)
    }

    async fn fetch(&self, owner: &Did, note_id: &str, limit: Duration) -> Result<Note, NoteError> {
        let data = bounded(
            limit,
            "read",
            self.store.read_data(owner, NOTES_COLLECTION_ID, note_id),
        )
        .await?
        .map_err(not_found_or(note_id))?;

        serde_json::from_value(data).map_err(|e| NoteError::Malformed(e.to_string()))
    }

    pub async fn get(&self, principal: &SigningIdentity, note_id: &str) -> Result<Note, NoteError> {
        self.fetch(&principal.did, note_id, self.timeouts.note_fetch)
            .await
    }

    /// Every note of `principal`, most recently updated first.
    pub async fn list(&self, principal: &SigningIdentity) -> Vec<Note> {
        let owner = &principal.did;
        let listing = async {
            let references = match bounded(
                self.timeouts.enumeration,
                "enumeration",
                self.store.list_data_references(owner),
            )
            .await
            {
                Ok(Ok(references)) => references,
                Ok(Err(StoreError::Unauthorized(_))) => {
                    debug!(owner = %owner, "No stored data for principal yet");
                    return Vec::new();
                }
                Ok(Err(e)) => {
                    warn!(owner = %owner, error = %e, "Listing note references failed");
                    return Vec::new();
                }
                Err(e) => {
                    warn!(owner = %owner, error = %e, "Listing note references timed out");
                    return Vec::new();
                }
            };

            let mut notes = Vec::new();
            for reference in references
                .into_iter()
                .filter(|r| r.collection == NOTES_COLLECTION_ID)
            {
                match self
                    .fetch(owner, &reference.document, self.timeouts.note_fetch)
                    .await
                {
                    Ok(note) => notes.push(note),
                    Err(e) => warn!(note_id = %reference.document, error = %e, "Skipping note"),
                }
            }
            notes
        };

        let mut notes = match tokio::time::timeout(self.timeouts.listing, listing).await {
            Ok(notes) => notes,
            Err(_) => {
                warn!(owner = %owner, "Notes listing timed out");
                Vec::new()
            }
        };
        notes.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        notes
    }

    /// Replace a note's title, content and tags, keeping `createdAt`.
    ///
    /// The store has no in-place update: the record is deleted and written
    /// again. If the rewrite fails the previous version is restored.
    pub async fn update(
        &self,
        principal: &SigningIdentity,
        note_id: &str,
        title: &str,
        content: &str,
        tags: Vec<String>,
    ) -> Result<(), NoteError> {
        let previous = self.get(principal, note_id).await?;
        let updated = Note {
            id: previous.id.clone(),
            title: title.to_string(),
            content: content.to_string(),
            tags,
            created_at: previous.created_at,
            updated_at: Utc::now(),
        };

        self.delete(principal, note_id).await?;

        if let Err(e) = self.write(principal, &updated).await {
            warn!(note_id, error = %e, "Rewriting note failed, restoring previous version");
            if let Err(restore) = self.write(principal, &previous).await {
                error!(note_id, error = %restore, "Restoring previous note version failed");
            }
            return Err(e);
        }

        info!(note_id, owner = %principal.did, "Note updated");
        Ok(())
    }

    pub async fn delete(&self, principal: &SigningIdentity, note_id: &str) -> Result<(), NoteError> {
        bounded(
            self.timeouts.write,
            "delete",
            self.store
                .delete_data(&principal.did, NOTES_COLLECTION_ID, note_id),
        )
        .await?
        .map_err(not_found_or(note_id))
    }
}
