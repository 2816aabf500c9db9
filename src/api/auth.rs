// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Login, registration and logout.

use axum::{extract::State, http::StatusCode, Json};

use crate::{
    auth::{password, Auth, AuthError, Role},
    error::{ApiError, ApiJson},
    models::{AccountResponse, LoginRequest, LoginResponse, RegisterRequest},
    state::AppState,
    store::{normalize_username, validate_username, CredentialStore},
};

const PASSWORD_MIN_LEN: usize = 8;

/// Exchange username and password for a bearer token.
#[utoipa::path(
    post,
    path = "/v1/auth/login",
    tag = "Auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Token issued", body = LoginResponse),
        (status = 400, description = "Missing username or password"),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    if request.username.trim().is_empty() || request.password.is_empty() {
        return Err(ApiError::bad_request("username and password are required"));
    }

    let account = state.store.read().await.find_account(&request.username);
    let Some(account) = account.filter(|a| a.enabled) else {
        // Same bcrypt work as a wrong password, so timing does not reveal the account.
        let dummy_hash = state.dummy_password_hash().await?;
        password::verify_password(request.password, dummy_hash).await?;
        tracing::warn!(
            username = %request.username.trim(),
            "Login failed: unknown or disabled account"
        );
        return Err(AuthError::InvalidCredentials.into());
    };

    if !password::verify_password(request.password, account.password_hash).await? {
        tracing::warn!(username = %account.username, "Login failed: wrong password");
        return Err(AuthError::InvalidCredentials.into());
    }

    let issued = state.tokens.issue(&account.username)?;
    let expires_in = issued.expires_in();

    tracing::info!(username = %account.username, role = %account.role, "Login succeeded");

    Ok(Json(LoginResponse {
        token: issued.token,
        token_type: "Bearer".to_string(),
        subject: issued.subject,
        role: account.role,
        expires_at: issued.expires_at,
        expires_in,
    }))
}

/// Create a DRIVER account.
#[utoipa::path(
    post,
    path = "/v1/auth/register",
    tag = "Auth",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = AccountResponse),
        (status = 400, description = "Invalid username or password"),
        (status = 409, description = "Username already taken")
    )
)]
pub async fn register(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<RegisterRequest>,
) -> Result<(StatusCode, Json<AccountResponse>), ApiError> {
    let username = normalize_username(&request.username);
    validate_username(&username)?;
    if request.password.chars().count() < PASSWORD_MIN_LEN {
        return Err(ApiError::bad_request(format!(
            "password must be at least {PASSWORD_MIN_LEN} characters"
        )));
    }

    let cost = {
        let store = state.store.read().await;
        if store.contains(&username) {
            return Err(ApiError::conflict("Username is already taken"));
        }
        store.bcrypt_cost()
    };

    let password_hash = password::hash_password_blocking(request.password, cost).await?;
    let account = state
        .store
        .write()
        .await
        .insert_account(&username, password_hash, Role::default())?;

    tracing::info!(username = %account.username, "Account registered");

    Ok((StatusCode::CREATED, Json(account.into())))
}

/// Log out. Tokens are stateless, so the client simply discards its token.
#[utoipa::path(
    post,
    path = "/v1/auth/logout",
    tag = "Auth",
    security(("bearer" = [])),
    responses(
        (status = 204, description = "Logged out"),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn logout(Auth(user): Auth) -> StatusCode {
    tracing::info!(username = %user.subject, "Logout");
    StatusCode::NO_CONTENT
}
