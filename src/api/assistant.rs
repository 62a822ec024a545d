// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{extract::State, Json};

use crate::{
    auth::CurrentSession,
    error::ApiError,
    models::{AnswerResponse, QuestionRequest, SearchRequest, SearchResponse, SummaryResponse},
    state::AppState,
};

pub const EMPTY_VAULT: &str = "No notes found in your vault.";
pub const EMPTY_VAULT_ASK: &str =
    "No notes found in your vault. Add some notes first to ask questions.";

#[utoipa::path(
    post,
    path = "/search",
    tag = "Assistant",
    request_body = SearchRequest,
    responses(
        (status = 200, body = SearchResponse),
        (status = 400, description = "Search query is required")
    )
)]
pub async fn search(
    State(state): State<AppState>,
    current: CurrentSession,
    Json(body): Json<SearchRequest>,
) -> Result<Json<SearchResponse>, ApiError> {
    if body.query.trim().is_empty() {
        return Err(ApiError::bad_request("Search query is required"));
    }

    let principal = state.principals.resolve(&current.session).await?;
    let notes = state.notes.list(&principal).await;
    if notes.is_empty() {
        return Ok(Json(SearchResponse {
            result: EMPTY_VAULT.to_string(),
        }));
    }

    let result = state.assistant.search(&body.query, &notes).await?;
    Ok(Json(SearchResponse { result }))
}

#[utoipa::path(
    post,
    path = "/ask",
    tag = "Assistant",
    request_body = QuestionRequest,
    responses(
        (status = 200, body = AnswerResponse),
        (status = 400, description = "Question is required")
    )
)]
pub async fn ask(
    State(state): State<AppState>,
    current: CurrentSession,
    Json(body): Json<QuestionRequest>,
) -> Result<Json<AnswerResponse>, ApiError> {
    if body.question.trim().is_empty() {
        return Err(ApiError::bad_request("Question is required"));
    }

    let principal = state.principals.resolve(&current.session).await?;
    let notes = state.notes.list(&principal).await;
    if notes.is_empty() {
        return Ok(Json(AnswerResponse {
            answer: EMPTY_VAULT_ASK.to_string(),
        }));
    }

    let answer = state.assistant.answer(&body.question, &notes).await?;
    Ok(Json(AnswerResponse { answer }))
}

#[utoipa::path(
    post,
    path = "/summarize",
    tag = "Assistant",
    responses((status = 200, body = SummaryResponse))
)]
pub async fn summarize(
    State(state): State<AppState>,
    current: CurrentSession,
) -> Result<Json<SummaryResponse>, ApiError> {
    let principal = state.principals.resolve(&current.session).await?;
    let notes = state.notes.list(&principal).await;
    if notes.is_empty() {
        return Ok(Json(SummaryResponse {
            summary: EMPTY_VAULT.to_string(),
        }));
    }

    let summary = state.assistant.summarize(&notes).await?;
    Ok(Json(SummaryResponse { summary }))
}
