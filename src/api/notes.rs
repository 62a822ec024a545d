// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    extract::{Query, State},
    response::{IntoResponse, Response},
    Json,
};
use tracing::debug;

use crate::{
    auth::CurrentSession,
    error::ApiError,
    models::{
        CreateNoteRequest, CreateNoteResponse, NoteIdQuery, NoteListResponse, NoteResponse,
        SuccessResponse, UpdateNoteRequest,
    },
    notes::NoteError,
    state::AppState,
};

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

/// List the caller's notes, or fetch one with `?id=`.
///
/// Listing never fails; a slow or unavailable store yields fewer notes.
#[utoipa::path(
    get,
    path = "/notes",
    params(NoteIdQuery),
    tag = "Notes",
    responses(
        (status = 200, description = "`{notes}` without `id`, `{note}` with it", body = NoteListResponse),
        (status = 404, description = "Note not found")
    )
)]
pub async fn get_notes(
    State(state): State<AppState>,
    current: CurrentSession,
    Query(query): Query<NoteIdQuery>,
) -> Result<Response, ApiError> {
    let principal = state.principals.resolve(&current.session).await?;

    if let Some(id) = query.id.filter(|id| !is_blank(id)) {
        let note = state.notes.get(&principal, &id).await?;
        return Ok(Json(NoteResponse { note }).into_response());
    }

    let notes = state.notes.list(&principal).await;
    debug!(count = notes.len(), "Listed notes");
    Ok(Json(NoteListResponse { notes }).into_response())
}

#[utoipa::path(
    post,
    path = "/notes",
    tag = "Notes",
    request_body = CreateNoteRequest,
    responses(
        (status = 200, body = CreateNoteResponse),
        (status = 400, description = "Title and content are required")
    )
)]
pub async fn create_note(
    State(state): State<AppState>,
    current: CurrentSession,
    Json(body): Json<CreateNoteRequest>,
) -> Result<Json<CreateNoteResponse>, ApiError> {
    if is_blank(&body.title) || is_blank(&body.content) {
        return Err(ApiError::bad_request("Title and content are required"));
    }

    let principal = state.principals.resolve(&current.session).await?;
    let note_id = state
        .notes
        .create(
            &principal,
            &body.title,
            &body.content,
            body.tags.unwrap_or_default(),
        )
        .await?;

    Ok(Json(CreateNoteResponse {
        note_id,
        success: true,
    }))
}

#[utoipa::path(
    put,
    path = "/notes",
    tag = "Notes",
    request_body = UpdateNoteRequest,
    responses(
        (status = 200, body = SuccessResponse),
        (status = 400, description = "Note ID, title, and content are required"),
        (status = 404, description = "Note not found")
    )
)]
pub async fn update_note(
    State(state): State<AppState>,
    current: CurrentSession,
    Json(body): Json<UpdateNoteRequest>,
) -> Result<Json<SuccessResponse>, ApiError> {
    if is_blank(&body.note_id) || is_blank(&body.title) || is_blank(&body.content) {
        return Err(ApiError::bad_request(
            "Note ID, title, and content are required",
        ));
    }

    let principal = state.principals.resolve(&current.session).await?;
    state
        .notes
        .update(
            &principal,
            &body.note_id,
            &body.title,
            &body.content,
            body.tags.unwrap_or_default(),
        )
        .await?;

    Ok(Json(SuccessResponse::ok()))
}

/// Delete a note. Deleting a note that does not exist succeeds.
#[utoipa::path(
    delete,
    path = "/notes",
    params(NoteIdQuery),
    tag = "Notes",
    responses(
        (status = 200, body = SuccessResponse),
        (status = 400, description = "Note ID is required")
    )
)]
pub async fn delete_note(
    State(state): State<AppState>,
    current: CurrentSession,
    Query(query): Query<NoteIdQuery>,
) -> Result<Json<SuccessResponse>, ApiError> {
    let Some(id) = query.id.filter(|id| !is_blank(id)) else {
        return Err(ApiError::bad_request("Note ID is required"));
    };

    let principal = state.principals.resolve(&current.session).await?;
    match state.notes.delete(&principal, &id).await {
        Ok(()) | Err(NoteError::NotFound(_)) => Ok(Json(SuccessResponse::ok())),
        Err(e) => Err(e.into()),
    }
}
