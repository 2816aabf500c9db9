// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Bearer token issuance and validation.
//!
//! ## Security
//!
//! - Tokens are HMAC-signed with a pre-shared secret
//! - Exactly one algorithm is accepted per deployment; tokens whose header
//!   names any other algorithm fail verification
//! - There is no revocation list: a token is valid until `exp`, and rotating
//!   the secret invalidates every outstanding token at once

use std::time::Duration;

use chrono::{DateTime, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::Serialize;

use super::{claims::TokenClaims, AuthError};

/// Default token lifetime (24 hours).
pub const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(86_400);

/// Minimum accepted secret length in bytes.
pub const MIN_SECRET_LEN: usize = 32;

/// Token service configuration.
#[derive(Clone)]
pub struct TokenConfig {
    /// HMAC secret
    pub secret: String,
    /// Lifetime of issued tokens
    pub ttl: Duration,
    /// Signing algorithm (HMAC family only)
    pub algorithm: Algorithm,
    /// Clock skew tolerance when checking `exp`
    pub leeway_secs: u64,
}

impl TokenConfig {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            ttl: DEFAULT_TOKEN_TTL,
            algorithm: Algorithm::HS256,
            leeway_secs: 0,
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn with_algorithm(mut self, algorithm: Algorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    pub fn with_leeway(mut self, leeway_secs: u64) -> Self {
        self.leeway_secs = leeway_secs;
        self
    }
}

impl std::fmt::Debug for TokenConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenConfig")
            .field("secret", &"<redacted>")
            .field("ttl", &self.ttl)
            .field("algorithm", &self.algorithm)
            .field("leeway_secs", &self.leeway_secs)
            .finish()
    }
}

/// Whether `algorithm` can be used with a shared secret.
pub fn is_hmac(algorithm: Algorithm) -> bool {
    matches!(algorithm, Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512)
}

/// A freshly signed token.
#[derive(Debug, Clone, Serialize)]
pub struct IssuedToken {
    /// Compact JWT
    pub token: String,
    /// Subject the token was issued for
    pub subject: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl IssuedToken {
    /// Seconds between issuance and expiry.
    pub fn expires_in(&self) -> i64 {
        (self.expires_at - self.issued_at).num_seconds()
    }
}

/// Issues and validates signed bearer tokens.
///
/// Validation is a pure function of the token, the secret and the current
/// time, so a single instance is shared across all request tasks.
pub struct TokenService {
    algorithm: Algorithm,
    ttl_secs: i64,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenService {
    pub fn new(config: TokenConfig) -> Result<Self, AuthError> {
        if !is_hmac(config.algorithm) {
            return Err(AuthError::InternalError(format!(
                "Unsupported token algorithm {:?} (HS256, HS384 or HS512 required)",
                config.algorithm
            )));
        }
        if config.secret.is_empty() {
            return Err(AuthError::InternalError("Token secret is empty".to_string()));
        }
        let ttl_secs = i64::try_from(config.ttl.as_secs())
            .map_err(|_| AuthError::InternalError("Token TTL out of range".to_string()))?;

        let mut validation = Validation::new(config.algorithm);
        validation.leeway = config.leeway_secs;
        validation.validate_aud = false;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Ok(Self {
            algorithm: config.algorithm,
            ttl_secs,
            encoding_key: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
            validation,
        })
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    pub fn ttl_secs(&self) -> i64 {
        self.ttl_secs
    }

    /// Issue a token for `subject`, valid from now for the configured TTL.
    pub fn issue(&self, subject: &str) -> Result<IssuedToken, AuthError> {
        self.issue_at(subject, Utc::now())
    }

    /// Issue a token as if the current time were `now`.
    pub fn issue_at(&self, subject: &str, now: DateTime<Utc>) -> Result<IssuedToken, AuthError> {
        let iat = now.timestamp();
        let exp = iat
            .checked_add(self.ttl_secs)
            .ok_or_else(|| AuthError::InternalError("Token expiry overflow".to_string()))?;

        let claims = TokenClaims {
            sub: subject.to_string(),
            iat,
            exp,
        };

        let token = encode(&Header::new(self.algorithm), &claims, &self.encoding_key)
            .map_err(|e| AuthError::InternalError(format!("Failed to sign token: {e}")))?;

        let issued_at = DateTime::from_timestamp(iat, 0)
            .ok_or_else(|| AuthError::InternalError("Invalid issue timestamp".to_string()))?;
        let expires_at = DateTime::from_timestamp(exp, 0)
            .ok_or_else(|| AuthError::InternalError("Invalid expiry timestamp".to_string()))?;

        Ok(IssuedToken {
            token,
            subject: claims.sub,
            issued_at,
            expires_at,
        })
    }

    /// Validate a compact token and return its claims.
    ///
    /// The structure is checked before the signature, and the signature before
    /// expiry, so each failure maps to exactly one of `MalformedToken`,
    /// `InvalidSignature` or `TokenExpired`.
    pub fn validate(&self, token: &str) -> Result<TokenClaims, AuthError> {
        let token = token.trim();

        jsonwebtoken::dangerous::insecure_decode::<TokenClaims>(token)
            .map_err(|_| AuthError::MalformedToken)?;

        let data = decode::<TokenClaims>(token, &self.decoding_key, &self.validation).map_err(
            |e| match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                ErrorKind::InvalidToken
                | ErrorKind::Json(_)
                | ErrorKind::Utf8(_)
                | ErrorKind::MissingRequiredClaim(_) => AuthError::MalformedToken,
                // Header and payload decoded above, so anything else is the
                // signature segment or a foreign algorithm.
                _ => AuthError::InvalidSignature,
            },
        )?;

        Ok(data.claims)
    }

    /// Validate a token and return only its subject.
    pub fn validate_subject(&self, token: &str) -> Result<String, AuthError> {
        self.validate(token).map(|claims| claims.sub)
    }
}
