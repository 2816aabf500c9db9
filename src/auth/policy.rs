// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Static authorization rule table.
//!
//! Rules are evaluated in order and the first rule whose method and path
//! pattern match decides the request. Requests matching no rule fall through
//! to the configured [`DefaultDecision`].
//!
//! ## Path patterns
//!
//! | Segment | Matches |
//! |---------|---------|
//! | `stations` | exactly that segment |
//! | `*` or `{id}` | any single segment |
//! | `**` | zero or more segments |

use axum::http::Method;

use super::{claims::Principal, roles::Role, AuthError};

/// What a rule demands of the principal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Requirement {
    /// No authentication needed
    Public,
    /// Any authenticated principal
    Authenticated,
    /// Exactly this role
    Role(Role),
    /// Any of these roles
    AnyRole(Vec<Role>),
}

impl Requirement {
    fn check(&self, principal: &Principal) -> Result<(), AuthError> {
        let role = match (self, principal.role()) {
            (Requirement::Public, _) => return Ok(()),
            (_, None) => return Err(AuthError::Unauthenticated),
            (_, Some(role)) => role,
        };

        let allowed = match self {
            Requirement::Public | Requirement::Authenticated => true,
            Requirement::Role(required) => role == *required,
            Requirement::AnyRole(roles) => roles.contains(&role),
        };

        if allowed {
            Ok(())
        } else {
            Err(AuthError::Forbidden)
        }
    }
}

/// Outcome for requests that match no rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DefaultDecision {
    /// Fail open: unmatched requests proceed regardless of principal.
    #[default]
    Allow,
    /// Unmatched requests require an authenticated principal.
    Deny,
}

impl DefaultDecision {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "allow" | "permit" | "open" => Some(DefaultDecision::Allow),
            "deny" | "closed" => Some(DefaultDecision::Deny),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Single,
    Rest,
}

/// Compiled path pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    raw: String,
    segments: Vec<Segment>,
}

impl PathPattern {
    pub fn new(pattern: &str) -> Self {
        let segments = split_path(pattern)
            .map(|seg| match seg {
                "**" => Segment::Rest,
                "*" => Segment::Single,
                s if s.starts_with('{') && s.ends_with('}') => Segment::Single,
                s => Segment::Literal(s.to_string()),
            })
            .collect();

        Self {
            raw: pattern.to_string(),
            segments,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn matches(&self, path: &str) -> bool {
        let parts: Vec<&str> = split_path(path).collect();
        match_segments(&self.segments, &parts)
    }
}

fn split_path(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

fn match_segments(pattern: &[Segment], path: &[&str]) -> bool {
    match pattern.split_first() {
        None => path.is_empty(),
        Some((Segment::Rest, rest)) => {
            (0..=path.len()).any(|skip| match_segments(rest, &path[skip..]))
        }
        Some((segment, rest)) => match path.split_first() {
            None => false,
            Some((head, tail)) => {
                let head_ok = match segment {
                    Segment::Literal(lit) => lit == head,
                    _ => true,
                };
                head_ok && match_segments(rest, tail)
            }
        },
    }
}

/// A single authorization rule.
#[derive(Debug, Clone)]
pub struct PolicyRule {
    /// `None` matches every method
    pub method: Option<Method>,
    pub pattern: PathPattern,
    pub requirement: Requirement,
}

impl PolicyRule {
    pub fn new(method: Option<Method>, pattern: &str, requirement: Requirement) -> Self {
        Self {
            method,
            pattern: PathPattern::new(pattern),
            requirement,
        }
    }

    pub fn any(pattern: &str, requirement: Requirement) -> Self {
        Self::new(None, pattern, requirement)
    }

    pub fn get(pattern: &str, requirement: Requirement) -> Self {
        Self::new(Some(Method::GET), pattern, requirement)
    }

    pub fn post(pattern: &str, requirement: Requirement) -> Self {
        Self::new(Some(Method::POST), pattern, requirement)
    }

    pub fn matches(&self, method: &Method, path: &str) -> bool {
        self.method.as_ref().is_none_or(|m| m == method) && self.pattern.matches(path)
    }
}

/// Ordered rule table plus default decision.
#[derive(Debug, Clone)]
pub struct AccessPolicy {
    rules: Vec<PolicyRule>,
    default_decision: DefaultDecision,
}

impl AccessPolicy {
    pub fn new(rules: Vec<PolicyRule>, default_decision: DefaultDecision) -> Self {
        Self {
            rules,
            default_decision,
        }
    }

    /// Rule table for the charging platform, most specific rules first.
    pub fn platform(default_decision: DefaultDecision) -> Self {
        use Requirement::{AnyRole, Authenticated, Public};

        let staff = || AnyRole(vec![Role::Admin, Role::Manager]);

        let rules = vec![
            // Operational endpoints
            PolicyRule::get("/health", Public),
            PolicyRule::get("/health/**", Public),
            PolicyRule::get("/docs/**", Public),
            PolicyRule::get("/api-doc/**", Public),
            // Account lifecycle
            PolicyRule::post("/v1/auth/login", Public),
            PolicyRule::post("/v1/auth/register", Public),
            PolicyRule::post("/v1/auth/logout", Authenticated),
            PolicyRule::any("/v1/users/me", Authenticated),
            PolicyRule::any("/v1/admin/**", Requirement::Role(Role::Admin)),
            // Payment gateway redirects back without a bearer token
            PolicyRule::get("/v1/payments/vnpay/return", Public),
            PolicyRule::any("/v1/payments/**", Authenticated),
            // Stations, charging points and chargers
            PolicyRule::get("/v1/stations/**", Public),
            PolicyRule::any("/v1/stations/**", staff()),
            PolicyRule::any("/v1/reservations/**", Requirement::Role(Role::Driver)),
            PolicyRule::any(
                "/v1/sessions/**",
                AnyRole(vec![Role::Driver, Role::Employee, Role::Manager, Role::Admin]),
            ),
            PolicyRule::any(
                "/v1/incidents/**",
                AnyRole(vec![Role::Employee, Role::Manager, Role::Admin]),
            ),
            PolicyRule::any("/v1/invoices/**", Authenticated),
            PolicyRule::any("/v1/subscriptions/**", Authenticated),
        ];

        Self::new(rules, default_decision)
    }

    pub fn rules(&self) -> &[PolicyRule] {
        &self.rules
    }

    pub fn default_decision(&self) -> DefaultDecision {
        self.default_decision
    }

    /// First rule matching `method` and `path`, if any.
    pub fn find_rule(&self, method: &Method, path: &str) -> Option<&PolicyRule> {
        self.rules.iter().find(|rule| rule.matches(method, path))
    }

    /// Decide whether `principal` may proceed with `method path`.
    pub fn evaluate(
        &self,
        method: &Method,
        path: &str,
        principal: &Principal,
    ) -> Result<(), AuthError> {
        match self.find_rule(method, path) {
            Some(rule) => rule.requirement.check(principal),
            None => match self.default_decision {
                DefaultDecision::Allow => Ok(()),
                DefaultDecision::Deny => Requirement::Authenticated.check(principal),
            },
        }
    }
}
