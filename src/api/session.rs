// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::Json;
use chrono::{DateTime, Utc};

use crate::{auth::CurrentSession, models::SessionInfoResponse};

const SESSION_MESSAGE: &str =
    "Each browser session has a unique identity. Your notes are private to this session.";

fn abbreviate(value: &str) -> String {
    format!("{}...", value.chars().take(8).collect::<String>())
}

/// Abbreviated session diagnostics; full ids are never returned.
#[utoipa::path(
    get,
    path = "/session",
    tag = "Session",
    responses((status = 200, body = SessionInfoResponse))
)]
pub async fn session_info(current: CurrentSession) -> Json<SessionInfoResponse> {
    let session = &current.session;
    Json(SessionInfoResponse {
        session_id: abbreviate(&session.session_id),
        user_id: session
            .user_id
            .as_deref()
            .map(abbreviate)
            .unwrap_or_else(|| "not set".to_string()),
        created_at: DateTime::<Utc>::from_timestamp_millis(session.created_at)
            .unwrap_or_else(Utc::now),
        message: SESSION_MESSAGE.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn abbreviate_keeps_eight_chars() {
        assert_eq!(abbreviate("0123456789abcdef"), "01234567...");
        assert_eq!(abbreviate("abc"), "abc...");
    }
}
