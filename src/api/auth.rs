// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{extract::State, Json};
use tracing::info;

use crate::{
    auth::CurrentSession,
    error::ApiError,
    models::{CredentialsRequest, LoginResponse, MeResponse, RegisterResponse, SuccessResponse},
    state::AppState,
};

/// Create an account and sign the session in as it.
#[utoipa::path(
    post,
    path = "/auth/register",
    tag = "Auth",
    request_body = CredentialsRequest,
    responses(
        (status = 200, body = RegisterResponse),
        (status = 400, description = "Invalid input or email already registered")
    )
)]
pub async fn register(
    State(state): State<AppState>,
    mut current: CurrentSession,
    Json(body): Json<CredentialsRequest>,
) -> Result<Json<RegisterResponse>, ApiError> {
    let account = state.credentials.register(&body.email, &body.password).await?;

    current
        .session
        .authenticate(&account.id, account.did(), &account.email);
    current.save()?;

    Ok(Json(RegisterResponse {
        success: true,
        message: "User registered successfully".to_string(),
        user_id: account.id,
    }))
}

#[utoipa::path(
    post,
    path = "/auth/login",
    tag = "Auth",
    request_body = CredentialsRequest,
    responses(
        (status = 200, body = LoginResponse),
        (status = 400, description = "Missing email or password"),
        (status = 401, description = "Invalid email or password")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    mut current: CurrentSession,
    Json(body): Json<CredentialsRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let account = state
        .credentials
        .authenticate(&body.email, &body.password)
        .await?;

    current
        .session
        .authenticate(&account.id, account.did(), &account.email);
    current.save()?;
    info!(user_id = %account.id, "User logged in");

    Ok(Json(LoginResponse {
        success: true,
        message: "Login successful".to_string(),
        user_id: account.id,
        email: account.email,
    }))
}

/// Drop the session cookie. The next request starts a new anonymous session.
#[utoipa::path(
    post,
    path = "/auth/logout",
    tag = "Auth",
    responses((status = 200, body = SuccessResponse))
)]
pub async fn logout(current: CurrentSession) -> Json<SuccessResponse> {
    current.clear();
    Json(SuccessResponse::with_message("Logged out successfully"))
}

#[utoipa::path(
    get,
    path = "/auth/me",
    tag = "Auth",
    responses((status = 200, body = MeResponse))
)]
pub async fn me(current: CurrentSession) -> Json<MeResponse> {
    let session = current.session;
    if session.authenticated_user().is_none() {
        return Json(MeResponse {
            is_authenticated: false,
            user_id: None,
            email: None,
            user_did: None,
        });
    }

    Json(MeResponse {
        is_authenticated: true,
        user_id: session.user_id,
        email: session.email,
        user_did: session.user_did,
    })
}
