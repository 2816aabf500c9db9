// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! Stateless bearer-token authentication and role-based authorization.
//!
//! ## Auth Flow
//!
//! 1. Client logs in with username and password (`POST /v1/auth/login`)
//! 2. Server verifies the bcrypt hash and issues an HMAC-signed JWT whose
//!    only identity claim is `sub` (the username)
//! 3. Client sends `Authorization: Bearer <token>` on later requests
//! 4. The gate ([`middleware::authenticate`]):
//!    - Verifies signature and expiry
//!    - Looks the subject up in the credential store
//!    - Attaches the resulting [`Principal`], anonymous on any failure
//! 5. [`middleware::authorize`] applies the [`AccessPolicy`] rule table
//!
//! ## Security
//!
//! - The role is read from the store on every request, never from the token
//! - Role changes and account disabling apply to already-issued tokens
//! - Only HMAC algorithms are accepted; `alg: none` is malformed
//! - No server-side sessions: logout is client-side

pub mod claims;
pub mod error;
pub mod extractor;
pub mod middleware;
pub mod password;
pub mod policy;
pub mod roles;
pub mod token;

pub use claims::{AuthenticatedUser, Principal, TokenClaims, TokenRejection};
pub use error::AuthError;
pub use extractor::{AdminOnly, Auth, OptionalAuth};
pub use policy::{AccessPolicy, DefaultDecision, PathPattern, PolicyRule, Requirement};
pub use roles::Role;
pub use token::{IssuedToken, TokenConfig, TokenService};
