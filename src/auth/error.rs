// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication and authorization errors.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Authentication error type.
///
/// Token-level variants (`MalformedToken`, `InvalidSignature`, `TokenExpired`)
/// and `UnknownAccount` are produced by the gate and only reach a client when
/// the authorization policy refuses an anonymous request.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    /// Authorization header is not of the form `Bearer <token>`
    #[error("Invalid authorization header format (expected 'Bearer <token>')")]
    InvalidAuthHeader,
    /// Token cannot be parsed
    #[error("Token is malformed")]
    MalformedToken,
    /// Token signature does not verify against the configured secret
    #[error("Token signature is invalid")]
    InvalidSignature,
    /// Token has expired
    #[error("Token has expired")]
    TokenExpired,
    /// Token subject has no enabled account
    #[error("Account not found or disabled")]
    UnknownAccount,
    /// A rule requires an authenticated principal
    #[error("Authentication is required")]
    Unauthenticated,
    /// Authenticated, but the role does not satisfy the rule
    #[error("Insufficient permissions for this operation")]
    Forbidden,
    /// Login with a wrong username or password
    #[error("Invalid username or password")]
    InvalidCredentials,
    /// Internal error
    #[error("Internal authentication error: {0}")]
    InternalError(String),
}

#[derive(Serialize)]
struct AuthErrorBody {
    error: String,
    error_code: String,
}

impl AuthError {
    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::InvalidAuthHeader => "invalid_auth_header",
            AuthError::MalformedToken => "malformed_token",
            AuthError::InvalidSignature => "invalid_signature",
            AuthError::TokenExpired => "token_expired",
            AuthError::UnknownAccount => "unknown_account",
            AuthError::Unauthenticated => "unauthenticated",
            AuthError::Forbidden => "forbidden",
            AuthError::InvalidCredentials => "invalid_credentials",
            AuthError::InternalError(_) => "internal_error",
        }
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::Forbidden => StatusCode::FORBIDDEN,
            AuthError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::UNAUTHORIZED,
        }
    }

    /// Whether this error describes a presented bearer credential the gate
    /// could not use. Only these are reported in place of `unauthenticated`.
    pub fn is_token_error(&self) -> bool {
        matches!(
            self,
            AuthError::InvalidAuthHeader
                | AuthError::MalformedToken
                | AuthError::InvalidSignature
                | AuthError::TokenExpired
                | AuthError::UnknownAccount
        )
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(AuthErrorBody {
            error: self.to_string(),
            error_code: self.error_code().to_string(),
        });
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    #[tokio::test]
    async fn unauthenticated_returns_401_with_code() {
        let response = AuthError::Unauthenticated.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let body_bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();
        assert_eq!(body["error_code"], "unauthenticated");
        assert_eq!(body["error"], "Authentication is required");
    }

    #[tokio::test]
    async fn forbidden_returns_403() {
        let response = AuthError::Forbidden.into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn token_errors_are_unauthorized() {
        for err in [
            AuthError::InvalidAuthHeader,
            AuthError::MalformedToken,
            AuthError::InvalidSignature,
            AuthError::TokenExpired,
            AuthError::UnknownAccount,
        ] {
            assert!(err.is_token_error());
            assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
        }
        assert!(!AuthError::Forbidden.is_token_error());
        assert!(!AuthError::Unauthenticated.is_token_error());
        assert!(!AuthError::InternalError("store".into()).is_token_error());
    }

    #[test]
    fn internal_error_is_500() {
        let err = AuthError::InternalError("boom".into());
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.to_string(), "Internal authentication error: boom");
    }
}
