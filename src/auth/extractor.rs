// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Axum extractors for the request principal.
//!
//! ```rust,ignore
//! async fn my_handler(Auth(user): Auth) -> impl IntoResponse {
//!     // user is AuthenticatedUser
//! }
//! ```

use axum::{extract::FromRequestParts, http::request::Parts};

use super::middleware::{resolve_principal, unauthenticated_error};
use super::{AuthError, AuthenticatedUser, Principal, TokenRejection};
use crate::state::AppState;

/// Extractor for authenticated users.
///
/// Reads the principal attached by the authentication gate. On routers
/// without the gate it resolves the `Authorization` header itself.
pub struct Auth(pub AuthenticatedUser);

impl FromRequestParts<AppState> for Auth {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let principal = match parts.extensions.get::<Principal>() {
            Some(principal) => principal.clone(),
            None => resolve_principal(state, &parts.headers).await?,
        };

        match principal {
            Principal::Authenticated(user) => Ok(Auth(user)),
            Principal::Anonymous => Err(unauthenticated_error(
                state,
                parts.extensions.get::<TokenRejection>(),
            )),
        }
    }
}

/// Extractor that requires the ADMIN role.
pub struct AdminOnly(pub AuthenticatedUser);

impl FromRequestParts<AppState> for AdminOnly {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Auth(user) = Auth::from_request_parts(parts, state).await?;

        if !user.is_admin() {
            return Err(AuthError::Forbidden);
        }

        Ok(AdminOnly(user))
    }
}

/// Optional authentication extractor.
///
/// `None` for anonymous requests instead of rejecting.
pub struct OptionalAuth(pub Option<AuthenticatedUser>);

impl FromRequestParts<AppState> for OptionalAuth {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        match Auth::from_request_parts(parts, state).await {
            Ok(Auth(user)) => Ok(OptionalAuth(Some(user))),
            Err(_) => Ok(OptionalAuth(None)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Role;
    use crate::state::test_support::{bearer, state};
    use axum::http::{header::AUTHORIZATION, Request};

    fn parts() -> Parts {
        Request::builder()
            .uri("/test")
            .body(())
            .unwrap()
            .into_parts()
            .0
    }

    fn user(subject: &str, role: Role) -> AuthenticatedUser {
        AuthenticatedUser {
            subject: subject.to_string(),
            role,
            expires_at: 0,
        }
    }

    #[tokio::test]
    async fn auth_rejects_anonymous() {
        let state = state();
        let result = Auth::from_request_parts(&mut parts(), &state).await;
        assert!(matches!(result, Err(AuthError::Unauthenticated)));
    }

    #[tokio::test]
    async fn auth_resolves_header_without_gate() {
        let state = state();
        let mut parts = Request::builder()
            .uri("/test")
            .header(AUTHORIZATION, bearer(&state, "manager"))
            .body(())
            .unwrap()
            .into_parts()
            .0;

        let Auth(user) = Auth::from_request_parts(&mut parts, &state).await.unwrap();
        assert_eq!(user.subject, "manager");
        assert_eq!(user.role, Role::Manager);
    }

    #[tokio::test]
    async fn auth_prefers_extensions() {
        let state = state();
        let mut parts = parts();
        parts
            .extensions
            .insert(Principal::Authenticated(user("from_gate", Role::Employee)));

        let Auth(user) = Auth::from_request_parts(&mut parts, &state).await.unwrap();
        assert_eq!(user.subject, "from_gate");
    }

    #[tokio::test]
    async fn auth_reports_recorded_rejection() {
        let state = state();
        let mut parts = parts();
        parts.extensions.insert(Principal::Anonymous);
        parts.extensions.insert(TokenRejection(AuthError::TokenExpired));

        let result = Auth::from_request_parts(&mut parts, &state).await;
        assert!(matches!(result, Err(AuthError::TokenExpired)));
    }

    #[tokio::test]
    async fn admin_only_rejects_non_admin() {
        let state = state();
        let mut parts = parts();
        parts
            .extensions
            .insert(Principal::Authenticated(user("driver", Role::Driver)));

        let result = AdminOnly::from_request_parts(&mut parts, &state).await;
        assert!(matches!(result, Err(AuthError::Forbidden)));
    }

    #[tokio::test]
    async fn admin_only_accepts_admin() {
        let state = state();
        let mut parts = parts();
        parts
            .extensions
            .insert(Principal::Authenticated(user("admin", Role::Admin)));

        assert!(AdminOnly::from_request_parts(&mut parts, &state).await.is_ok());
    }

    #[tokio::test]
    async fn optional_auth_returns_none_without_user() {
        let state = state();
        let OptionalAuth(user) = OptionalAuth::from_request_parts(&mut parts(), &state)
            .await
            .unwrap();
        assert!(user.is_none());
    }
}
