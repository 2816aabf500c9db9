// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Password hashing (bcrypt).

use crate::error::ApiError;

use super::AuthError;

pub fn hash_password(password: &str, cost: u32) -> Result<String, ApiError> {
    bcrypt::hash(password, cost)
        .map_err(|e| ApiError::internal(format!("Failed to hash password: {e}")))
}

/// [`hash_password`] on the blocking pool.
pub async fn hash_password_blocking(password: String, cost: u32) -> Result<String, ApiError> {
    tokio::task::spawn_blocking(move || hash_password(&password, cost))
        .await
        .map_err(|e| ApiError::internal(format!("Password hashing aborted: {e}")))?
}

/// Check `password` against a bcrypt hash.
///
/// bcrypt is CPU-bound; the check runs on the blocking pool.
pub async fn verify_password(password: String, password_hash: String) -> Result<bool, AuthError> {
    tokio::task::spawn_blocking(move || bcrypt::verify(password, &password_hash))
        .await
        .map_err(|e| AuthError::InternalError(format!("Password check aborted: {e}")))?
        .map_err(|e| AuthError::InternalError(format!("Failed to verify password: {e}")))
}
