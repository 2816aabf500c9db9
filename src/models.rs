// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # API Data Models
//!
//! Request and response structures used by the REST API, plus the stored
//! [`Account`] record. API types derive `ToSchema` for OpenAPI documentation.
//!
//! ## Model Categories
//!
//! - **Accounts**: Stored credentials and their public view
//! - **Auth**: Login, registration and token responses
//! - **Admin**: Role and status changes

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::Role;

// =============================================================================
// Accounts
// =============================================================================

/// A stored account. Never serialized directly: the hash stays server-side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub id: Uuid,
    /// Lowercased, unique username; also the token subject.
    pub username: String,
    /// bcrypt hash
    pub password_hash: String,
    pub role: Role,
    /// Disabled accounts cannot log in and their tokens stop resolving.
    pub enabled: bool,
    pub created_at: DateTime<Utc>,
}

/// Public view of an account.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct AccountResponse {
    pub id: Uuid,
    pub username: String,
    pub role: Role,
    pub enabled: bool,
    pub created_at: DateTime<Utc>,
}

impl From<Account> for AccountResponse {
    fn from(account: Account) -> Self {
        Self {
            id: account.id,
            username: account.username,
            role: account.role,
            enabled: account.enabled,
            created_at: account.created_at,
        }
    }
}

// =============================================================================
// Auth
// =============================================================================

/// Request body for `POST /v1/auth/login`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Successful login.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoginResponse {
    /// Bearer token to send as `Authorization: Bearer <token>`
    pub token: String,
    /// Always `Bearer`
    pub token_type: String,
    /// Token subject (account username)
    pub subject: String,
    /// Role at login time; later requests use the stored role
    pub role: Role,
    pub expires_at: DateTime<Utc>,
    /// Seconds until `expires_at`
    pub expires_in: i64,
}

/// Request body for `POST /v1/auth/register`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RegisterRequest {
    /// 3-64 characters of `a-z`, `0-9`, `.`, `_`, `-` (case-insensitive)
    pub username: String,
    /// At least 8 characters
    pub password: String,
}

// =============================================================================
// Admin
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UpdateRoleRequest {
    pub role: Role,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UpdateStatusRequest {
    pub enabled: bool,
}
