// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::time::Duration;

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::auth::{OptionalAuth, Role};
use crate::state::AppState;

const STORE_LOCK_TIMEOUT: Duration = Duration::from_secs(2);

/// Health check response with individual component status.
#[derive(Debug, Serialize, ToSchema)]
pub struct ReadyResponse {
    /// Overall health status ("ok" or "degraded").
    pub status: String,
    /// Individual health checks and their results.
    pub checks: HealthChecks,
}

/// Individual health check results.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthChecks {
    /// Whether the service process is running.
    pub service: String,
    /// Credential store status ("ok" or "unavailable").
    pub store: String,
    /// Number of accounts in the credential store. Reported to admins only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accounts: Option<usize>,
    /// Token signing algorithm in use.
    pub token_algorithm: String,
}

/// Simple health check response for liveness probes.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
}

/// Health check endpoint handler.
///
/// Returns 503 while the credential store is locked for longer than
/// [`STORE_LOCK_TIMEOUT`].
#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses(
        (status = 200, description = "Service is healthy", body = ReadyResponse),
        (status = 503, description = "Service is unhealthy", body = ReadyResponse)
    )
)]
pub async fn health(
    OptionalAuth(caller): OptionalAuth,
    State(state): State<AppState>,
) -> (StatusCode, Json<ReadyResponse>) {
    let accounts = tokio::time::timeout(STORE_LOCK_TIMEOUT, state.store.read())
        .await
        .map(|store| store.len());
    let store_ok = accounts.is_ok();
    let is_admin = caller.is_some_and(|user| user.has_role(Role::Admin));

    let response = ReadyResponse {
        status: if store_ok { "ok" } else { "degraded" }.to_string(),
        checks: HealthChecks {
            service: "ok".to_string(),
            store: if store_ok { "ok" } else { "unavailable" }.to_string(),
            accounts: accounts.ok().filter(|_| is_admin),
            token_algorithm: format!("{:?}", state.tokens.algorithm()),
        },
    };

    let status = if store_ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status, Json(response))
}

/// Liveness probe handler.
///
/// Always returns 200 if the process is running.
#[utoipa::path(
    get,
    path = "/health/live",
    tag = "Health",
    responses(
        (status = 200, description = "Service is alive", body = HealthResponse)
    )
)]
pub async fn liveness() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

/// Readiness probe handler.
#[utoipa::path(
    get,
    path = "/health/ready",
    tag = "Health",
    responses(
        (status = 200, description = "Service is ready", body = ReadyResponse),
        (status = 503, description = "Service is not ready", body = ReadyResponse)
    )
)]
pub async fn readiness(
    caller: OptionalAuth,
    state: State<AppState>,
) -> (StatusCode, Json<ReadyResponse>) {
    health(caller, state).await
}
