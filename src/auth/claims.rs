// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! JWT claims and the per-request principal.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{roles::Role, AuthError};

/// Claims carried by tokens issued by this server.
///
/// The role is not a claim: it is looked up in the credential store on
/// every request so that role changes apply without reissuing tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject (account username)
    pub sub: String,
    /// Issued at (Unix seconds)
    pub iat: i64,
    /// Expiration (Unix seconds), always `iat + ttl`
    pub exp: i64,
}

/// Authenticated account information resolved for the current request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct AuthenticatedUser {
    /// Account username (token `sub` claim)
    pub subject: String,

    /// Role as currently stored for the account
    pub role: Role,

    /// Token expiration (Unix timestamp)
    pub expires_at: i64,
}

impl AuthenticatedUser {
    pub fn has_role(&self, required: Role) -> bool {
        self.role == required
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Identity attached to a request by the authentication gate.
///
/// Exactly one `Principal` is inserted into the request extensions.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Principal {
    #[default]
    Anonymous,
    Authenticated(AuthenticatedUser),
}

impl Principal {
    pub fn user(&self) -> Option<&AuthenticatedUser> {
        match self {
            Principal::Anonymous => None,
            Principal::Authenticated(user) => Some(user),
        }
    }

    pub fn role(&self) -> Option<Role> {
        self.user().map(|u| u.role)
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, Principal::Authenticated(_))
    }
}

/// Why a presented credential was ignored by the gate.
///
/// Stored in the request extensions next to an anonymous `Principal`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenRejection(pub AuthError);
