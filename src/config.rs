// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Configuration is read once from the environment at startup (a `.env` file
//! is honoured by `main`) into immutable structs that are handed to the
//! services that need them. Nothing reads the environment after startup.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `JWT_SECRET` | HMAC secret for bearer tokens (at least 32 bytes) | Required |
//! | `JWT_TTL_SECS` | Token lifetime in seconds | `86400` |
//! | `JWT_ALGORITHM` | `HS256`, `HS384` or `HS512` | `HS256` |
//! | `JWT_LEEWAY_SECS` | Clock skew tolerance for `exp` | `0` |
//! | `AUTH_DEFAULT_POLICY` | `allow` or `deny` for paths matching no rule | `allow` |
//! | `AUTH_EXPOSE_TOKEN_ERRORS` | Report why a token was rejected | `true` |
//! | `BCRYPT_COST` | bcrypt work factor (4-31) | `12` |
//! | `SEED_ADMIN_USERNAME` | Bootstrap admin account | Optional |
//! | `SEED_ADMIN_PASSWORD` | Password for the bootstrap admin | Optional |
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `TLS_CERT_PATH` | PEM certificate chain; enables HTTPS with `TLS_KEY_PATH` | Optional |
//! | `TLS_KEY_PATH` | PEM private key | Optional |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use jsonwebtoken::Algorithm;

use crate::auth::policy::DefaultDecision;
use crate::auth::token::{is_hmac, TokenConfig, DEFAULT_TOKEN_TTL, MIN_SECRET_LEN};

pub const JWT_SECRET_ENV: &str = "JWT_SECRET";
pub const JWT_TTL_SECS_ENV: &str = "JWT_TTL_SECS";
pub const JWT_ALGORITHM_ENV: &str = "JWT_ALGORITHM";
pub const JWT_LEEWAY_SECS_ENV: &str = "JWT_LEEWAY_SECS";
pub const AUTH_DEFAULT_POLICY_ENV: &str = "AUTH_DEFAULT_POLICY";
pub const AUTH_EXPOSE_TOKEN_ERRORS_ENV: &str = "AUTH_EXPOSE_TOKEN_ERRORS";
pub const BCRYPT_COST_ENV: &str = "BCRYPT_COST";
pub const SEED_ADMIN_USERNAME_ENV: &str = "SEED_ADMIN_USERNAME";
pub const SEED_ADMIN_PASSWORD_ENV: &str = "SEED_ADMIN_PASSWORD";
pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";
pub const TLS_CERT_PATH_ENV: &str = "TLS_CERT_PATH";
pub const TLS_KEY_PATH_ENV: &str = "TLS_KEY_PATH";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

/// Default tracing filter when `RUST_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str = "info,tower_http=debug";

/// Secret used when `JWT_SECRET` is unset in `dev` builds only.
#[cfg(feature = "dev")]
const DEV_FALLBACK_SECRET: &str = "dev-only-insecure-secret-change-me-0123456789";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("invalid value {value:?} for {var}: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
    #[error("JWT_SECRET must be at least 32 bytes (got {0})")]
    WeakSecret(usize),
    #[error("TLS_CERT_PATH and TLS_KEY_PATH must be set together")]
    PartialTls,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    Json,
    #[default]
    Pretty,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(LogFormat::Json),
            "pretty" | "text" => Ok(LogFormat::Pretty),
            other => Err(format!("unknown log format {other:?}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsPaths {
    pub cert: PathBuf,
    pub key: PathBuf,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub tls: Option<TlsPaths>,
}

impl ServerConfig {
    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        let raw = format!("{}:{}", self.host, self.port);
        raw.parse().map_err(|e: std::net::AddrParseError| ConfigError::Invalid {
            var: HOST_ENV,
            value: raw.clone(),
            reason: e.to_string(),
        })
    }
}

#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub token: TokenConfig,
    pub default_decision: DefaultDecision,
    pub expose_token_errors: bool,
    pub bcrypt_cost: u32,
}

impl AuthConfig {
    pub fn new(token: TokenConfig) -> Self {
        Self {
            token,
            default_decision: DefaultDecision::Allow,
            expose_token_errors: true,
            bcrypt_cost: bcrypt::DEFAULT_COST,
        }
    }
}

#[derive(Clone)]
pub struct SeedAdmin {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for SeedAdmin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SeedAdmin")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub auth: AuthConfig,
    pub seed_admin: Option<SeedAdmin>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let secret = load_secret(get(JWT_SECRET_ENV))?;
        let ttl_secs: u64 = parse_or(
            get(JWT_TTL_SECS_ENV),
            JWT_TTL_SECS_ENV,
            DEFAULT_TOKEN_TTL.as_secs(),
        )?;
        if ttl_secs == 0 {
            return Err(invalid(JWT_TTL_SECS_ENV, "0", "must be positive"));
        }
        let algorithm = match get(JWT_ALGORITHM_ENV) {
            None => Algorithm::HS256,
            Some(raw) => {
                let alg = Algorithm::from_str(raw.trim())
                    .map_err(|e| invalid(JWT_ALGORITHM_ENV, &raw, &e.to_string()))?;
                if !is_hmac(alg) {
                    return Err(invalid(
                        JWT_ALGORITHM_ENV,
                        &raw,
                        "only HS256, HS384 and HS512 are supported",
                    ));
                }
                alg
            }
        };
        let leeway_secs = parse_or(get(JWT_LEEWAY_SECS_ENV), JWT_LEEWAY_SECS_ENV, 0u64)?;

        let default_decision = match get(AUTH_DEFAULT_POLICY_ENV) {
            None => DefaultDecision::Allow,
            Some(raw) => DefaultDecision::parse(&raw)
                .ok_or_else(|| invalid(AUTH_DEFAULT_POLICY_ENV, &raw, "expected allow or deny"))?,
        };
        let expose_token_errors = match get(AUTH_EXPOSE_TOKEN_ERRORS_ENV) {
            None => true,
            Some(raw) => parse_bool(&raw)
                .ok_or_else(|| invalid(AUTH_EXPOSE_TOKEN_ERRORS_ENV, &raw, "expected a boolean"))?,
        };
        let bcrypt_cost: u32 =
            parse_or(get(BCRYPT_COST_ENV), BCRYPT_COST_ENV, bcrypt::DEFAULT_COST)?;
        if !(4..=31).contains(&bcrypt_cost) {
            return Err(invalid(
                BCRYPT_COST_ENV,
                &bcrypt_cost.to_string(),
                "must be between 4 and 31",
            ));
        }

        let seed_admin = match (get(SEED_ADMIN_USERNAME_ENV), get(SEED_ADMIN_PASSWORD_ENV)) {
            (Some(username), Some(password)) => Some(SeedAdmin { username, password }),
            (None, None) => None,
            (Some(_), None) => return Err(ConfigError::Missing(SEED_ADMIN_PASSWORD_ENV)),
            (None, Some(_)) => return Err(ConfigError::Missing(SEED_ADMIN_USERNAME_ENV)),
        };

        let tls = match (get(TLS_CERT_PATH_ENV), get(TLS_KEY_PATH_ENV)) {
            (Some(cert), Some(key)) => Some(TlsPaths {
                cert: cert.into(),
                key: key.into(),
            }),
            (None, None) => None,
            _ => return Err(ConfigError::PartialTls),
        };
        Ok(Self {
            server: ServerConfig {
                host: get(HOST_ENV).unwrap_or_else(|| "0.0.0.0".to_string()),
                port: parse_or(get(PORT_ENV), PORT_ENV, 8080u16)?,
                tls,
            },
            auth: AuthConfig {
                token: TokenConfig::new(secret)
                    .with_ttl(Duration::from_secs(ttl_secs))
                    .with_algorithm(algorithm)
                    .with_leeway(leeway_secs),
                default_decision,
                expose_token_errors,
                bcrypt_cost,
            },
            seed_admin,
        })
    }
}

/// Logging format, read separately so logging can start before the rest of
/// the configuration is validated.
pub fn log_format_from_env() -> Result<LogFormat, ConfigError> {
    log_format_from(std::env::var(LOG_FORMAT_ENV).ok())
}

fn log_format_from(raw: Option<String>) -> Result<LogFormat, ConfigError> {
    match raw.filter(|v| !v.trim().is_empty()) {
        None => Ok(LogFormat::default()),
        Some(raw) => raw.parse().map_err(|e: String| invalid(LOG_FORMAT_ENV, &raw, &e)),
    }
}

fn load_secret(raw: Option<String>) -> Result<String, ConfigError> {
    let secret = match raw {
        Some(secret) => secret,
        #[cfg(feature = "dev")]
        None => {
            tracing::warn!("{JWT_SECRET_ENV} unset, using the development fallback secret");
            DEV_FALLBACK_SECRET.to_string()
        }
        #[cfg(not(feature = "dev"))]
        None => return Err(ConfigError::Missing(JWT_SECRET_ENV)),
    };

    if secret.len() < MIN_SECRET_LEN {
        return Err(ConfigError::WeakSecret(secret.len()));
    }
    Ok(secret)
}

fn parse_or<T>(raw: Option<String>, var: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| invalid(var, &raw, &e.to_string())),
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn invalid(var: &'static str, value: &str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        var,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const SECRET: &str = "0123456789abcdef0123456789abcdef";

    fn load(vars: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|name| map.get(name).cloned())
    }

    #[test]
    fn defaults_apply_with_only_a_secret() {
        let config = load(&[(JWT_SECRET_ENV, SECRET)]).unwrap();

        assert_eq!(config.auth.token.ttl, Duration::from_secs(86_400));
        assert_eq!(config.auth.token.algorithm, Algorithm::HS256);
        assert_eq!(config.auth.token.leeway_secs, 0);
        assert_eq!(config.auth.default_decision, DefaultDecision::Allow);
        assert!(config.auth.expose_token_errors);
        assert_eq!(config.auth.bcrypt_cost, bcrypt::DEFAULT_COST);
        assert_eq!(config.server.port, 8080);
        assert!(config.server.tls.is_none());
        assert!(config.seed_admin.is_none());
        assert_eq!(
            config.server.bind_addr().unwrap(),
            "0.0.0.0:8080".parse::<SocketAddr>().unwrap()
        );
    }

    #[cfg(not(feature = "dev"))]
    #[test]
    fn missing_secret_is_an_error() {
        assert!(matches!(load(&[]), Err(ConfigError::Missing(JWT_SECRET_ENV))));
    }

    #[test]
    fn short_secret_is_rejected() {
        assert!(matches!(
            load(&[(JWT_SECRET_ENV, "short")]),
            Err(ConfigError::WeakSecret(5))
        ));
    }

    #[test]
    fn overrides_are_parsed() {
        let config = load(&[
            (JWT_SECRET_ENV, SECRET),
            (JWT_TTL_SECS_ENV, "3600"),
            (JWT_ALGORITHM_ENV, "HS512"),
            (JWT_LEEWAY_SECS_ENV, "30"),
            (AUTH_DEFAULT_POLICY_ENV, "deny"),
            (AUTH_EXPOSE_TOKEN_ERRORS_ENV, "false"),
            (BCRYPT_COST_ENV, "10"),
            (PORT_ENV, "9443"),
            (TLS_CERT_PATH_ENV, "/certs/server.pem"),
            (TLS_KEY_PATH_ENV, "/certs/server.key"),
            (SEED_ADMIN_USERNAME_ENV, "root"),
            (SEED_ADMIN_PASSWORD_ENV, "changeme-now"),
        ])
        .unwrap();

        assert_eq!(config.auth.token.ttl, Duration::from_secs(3600));
        assert_eq!(config.auth.token.algorithm, Algorithm::HS512);
        assert_eq!(config.auth.token.leeway_secs, 30);
        assert_eq!(config.auth.default_decision, DefaultDecision::Deny);
        assert!(!config.auth.expose_token_errors);
        assert_eq!(config.auth.bcrypt_cost, 10);
        assert_eq!(config.server.port, 9443);
        assert_eq!(
            config.server.tls,
            Some(TlsPaths {
                cert: "/certs/server.pem".into(),
                key: "/certs/server.key".into(),
            })
        );
        assert_eq!(config.seed_admin.unwrap().username, "root");
    }

    #[test]
    fn asymmetric_algorithm_is_rejected() {
        let err = load(&[(JWT_SECRET_ENV, SECRET), (JWT_ALGORITHM_ENV, "RS256")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: JWT_ALGORITHM_ENV, .. }));
    }

    #[test]
    fn invalid_values_are_reported() {
        for (var, value) in [
            (JWT_TTL_SECS_ENV, "soon"),
            (JWT_TTL_SECS_ENV, "0"),
            (AUTH_DEFAULT_POLICY_ENV, "sometimes"),
            (AUTH_EXPOSE_TOKEN_ERRORS_ENV, "perhaps"),
            (BCRYPT_COST_ENV, "2"),
            (PORT_ENV, "99999"),
        ] {
            let result = load(&[(JWT_SECRET_ENV, SECRET), (var, value)]);
            assert!(
                matches!(result, Err(ConfigError::Invalid { .. })),
                "{var}={value}"
            );
        }
    }

    #[test]
    fn log_format_parsing() {
        assert_eq!(log_format_from(None).unwrap(), LogFormat::Pretty);
        assert_eq!(log_format_from(Some("JSON".into())).unwrap(), LogFormat::Json);
        assert!(log_format_from(Some("xml".into())).is_err());
    }

    #[test]
    fn tls_paths_must_come_in_pairs() {
        let result = load(&[(JWT_SECRET_ENV, SECRET), (TLS_CERT_PATH_ENV, "/c.pem")]);
        assert!(matches!(result, Err(ConfigError::PartialTls)));
    }

    #[test]
    fn seed_admin_requires_both_values() {
        let result = load(&[(JWT_SECRET_ENV, SECRET), (SEED_ADMIN_USERNAME_ENV, "root")]);
        assert!(matches!(result, Err(ConfigError::Missing(SEED_ADMIN_PASSWORD_ENV))));
    }

    #[test]
    fn seed_admin_debug_redacts_password() {
        let seed = SeedAdmin {
            username: "root".into(),
            password: "hunter22".into(),
        };
        assert!(!format!("{seed:?}").contains("hunter22"));
    }
}
