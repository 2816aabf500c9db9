// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication gate and authorization enforcement for Axum.
//!
//! Both run as router-wide middleware, gate first:
//!
//! ```rust,ignore
//! Router::new()
//!     .route("/v1/users/me", get(users::get_current_user))
//!     .layer(middleware::from_fn_with_state(state.clone(), authorize))
//!     .layer(middleware::from_fn_with_state(state.clone(), authenticate))
//! ```
//!
//! The gate never rejects. It attaches a [`Principal`] (anonymous when no
//! usable token was presented) and leaves the decision to [`authorize`],
//! which applies the [`AccessPolicy`](super::AccessPolicy) before any handler.

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};

use super::{AuthError, AuthenticatedUser, Principal, TokenRejection, TokenService};
use crate::state::AppState;
use crate::store::CredentialStore;

/// Authentication gate.
///
/// Inserts exactly one `Principal` into the request extensions. A request
/// that already carries one passes through untouched.
pub async fn authenticate(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    if request.extensions().get::<Principal>().is_none() {
        let resolved = resolve_principal(&state, request.headers()).await;
        let principal = match resolved {
            Ok(principal) => principal,
            Err(rejection) => {
                tracing::debug!(
                    reason = rejection.error_code(),
                    path = %request.uri().path(),
                    "Ignoring presented credentials"
                );
                request.extensions_mut().insert(TokenRejection(rejection));
                Principal::Anonymous
            }
        };
        request.extensions_mut().insert(principal);
    }

    next.run(request).await
}

/// Authorization enforcement.
///
/// Evaluates the access policy against the principal set by [`authenticate`];
/// a missing principal is treated as anonymous.
pub async fn authorize(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let principal = request
        .extensions()
        .get::<Principal>()
        .cloned()
        .unwrap_or_default();

    let decision = state
        .policy
        .evaluate(request.method(), request.uri().path(), &principal);

    match decision {
        Ok(()) => next.run(request).await,
        Err(AuthError::Unauthenticated) => {
            unauthenticated_error(&state, request.extensions().get::<TokenRejection>())
                .into_response()
        }
        Err(err) => {
            tracing::warn!(
                subject = principal.user().map(|u| u.subject.as_str()).unwrap_or("-"),
                role = ?principal.role(),
                method = %request.method(),
                path = %request.uri().path(),
                "Permission denied"
            );
            err.into_response()
        }
    }
}

/// The 401 reported for an anonymous request that a rule refused.
///
/// A recorded token rejection replaces `unauthenticated` only when
/// `expose_token_errors` is set.
pub fn unauthenticated_error(state: &AppState, rejection: Option<&TokenRejection>) -> AuthError {
    match rejection {
        Some(TokenRejection(err)) if state.expose_token_errors && err.is_token_error() => {
            err.clone()
        }
        _ => AuthError::Unauthenticated,
    }
}

/// Resolve the principal for a request's headers.
///
/// `Ok(Principal::Anonymous)` means no credentials were presented; `Err`
/// describes credentials that were presented but could not be used.
pub async fn resolve_principal(
    state: &AppState,
    headers: &HeaderMap,
) -> Result<Principal, AuthError> {
    let Some(token) = bearer_token(headers)? else {
        return Ok(Principal::Anonymous);
    };

    let store = state.store.read().await;
    let user = authenticate_token(token, &state.tokens, &*store)?;
    Ok(Principal::Authenticated(user))
}

/// Extract the token from `Authorization: Bearer <token>`.
///
/// The scheme is matched case-insensitively.
pub fn bearer_token(headers: &HeaderMap) -> Result<Option<&str>, AuthError> {
    let Some(value) = headers.get(AUTHORIZATION) else {
        return Ok(None);
    };

    let value = value.to_str().map_err(|_| AuthError::InvalidAuthHeader)?;
    let (scheme, token) = value
        .trim()
        .split_once(' ')
        .ok_or(AuthError::InvalidAuthHeader)?;
    let token = token.trim();

    if !scheme.eq_ignore_ascii_case("bearer") || token.is_empty() {
        return Err(AuthError::InvalidAuthHeader);
    }
    Ok(Some(token))
}

/// Validate `token` and resolve its subject's current role.
///
/// The role always comes from the store, never from the token.
pub fn authenticate_token<S>(
    token: &str,
    tokens: &TokenService,
    store: &S,
) -> Result<AuthenticatedUser, AuthError>
where
    S: CredentialStore + ?Sized,
{
    let claims = tokens.validate(token)?;
    let (subject, role) = store
        .find_principal_by_username(&claims.sub)
        .ok_or(AuthError::UnknownAccount)?;

    Ok(AuthenticatedUser {
        subject,
        role,
        expires_at: claims.exp,
    })
}
