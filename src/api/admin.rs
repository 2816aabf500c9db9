// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Admin-only account management.
//!
//! Role and status changes are read by the gate on the account's next
//! request, so they apply to tokens that were already issued.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    auth::AdminOnly,
    error::{ApiError, ApiJson},
    models::{AccountResponse, UpdateRoleRequest, UpdateStatusRequest},
    state::AppState,
    store::normalize_username,
};

#[derive(Debug, Serialize, ToSchema)]
pub struct AccountListResponse {
    pub accounts: Vec<AccountResponse>,
    pub total: usize,
}

/// List all accounts.
#[utoipa::path(
    get,
    path = "/v1/admin/accounts",
    tag = "Admin",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "All accounts", body = AccountListResponse),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Admin role required")
    )
)]
pub async fn list_accounts(
    AdminOnly(_admin): AdminOnly,
    State(state): State<AppState>,
) -> Json<AccountListResponse> {
    let accounts: Vec<AccountResponse> = state
        .store
        .read()
        .await
        .list_accounts()
        .into_iter()
        .map(Into::into)
        .collect();

    Json(AccountListResponse {
        total: accounts.len(),
        accounts,
    })
}

/// Change an account's role.
#[utoipa::path(
    put,
    path = "/v1/admin/accounts/{username}/role",
    tag = "Admin",
    security(("bearer" = [])),
    params(("username" = String, Path, description = "Account username")),
    request_body = UpdateRoleRequest,
    responses(
        (status = 200, description = "Role updated", body = AccountResponse),
        (status = 400, description = "Admins cannot change their own role"),
        (status = 403, description = "Admin role required"),
        (status = 404, description = "Account not found")
    )
)]
pub async fn update_role(
    AdminOnly(admin): AdminOnly,
    State(state): State<AppState>,
    Path(username): Path<String>,
    ApiJson(request): ApiJson<UpdateRoleRequest>,
) -> Result<Json<AccountResponse>, ApiError> {
    if is_self(&admin.subject, &username) {
        return Err(ApiError::bad_request("Admins cannot change their own role"));
    }

    let account = state.store.write().await.set_role(&username, request.role)?;
    tracing::info!(
        admin = %admin.subject,
        username = %account.username,
        role = %account.role,
        "Account role changed"
    );

    Ok(Json(account.into()))
}

/// Enable or disable an account.
#[utoipa::path(
    put,
    path = "/v1/admin/accounts/{username}/status",
    tag = "Admin",
    security(("bearer" = [])),
    params(("username" = String, Path, description = "Account username")),
    request_body = UpdateStatusRequest,
    responses(
        (status = 200, description = "Status updated", body = AccountResponse),
        (status = 400, description = "Admins cannot disable themselves"),
        (status = 403, description = "Admin role required"),
        (status = 404, description = "Account not found")
    )
)]
pub async fn update_status(
    AdminOnly(admin): AdminOnly,
    State(state): State<AppState>,
    Path(username): Path<String>,
    ApiJson(request): ApiJson<UpdateStatusRequest>,
) -> Result<Json<AccountResponse>, ApiError> {
    if !request.enabled && is_self(&admin.subject, &username) {
        return Err(ApiError::bad_request("Admins cannot disable themselves"));
    }

    let account = state
        .store
        .write()
        .await
        .set_enabled(&username, request.enabled)?;
    tracing::info!(
        admin = %admin.subject,
        username = %account.username,
        enabled = account.enabled,
        "Account status changed"
    );

    Ok(Json(account.into()))
}

fn is_self(subject: &str, username: &str) -> bool {
    normalize_username(subject) == normalize_username(username)
}
