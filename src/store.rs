// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Account credential store.
//!
//! The platform persists accounts through its ORM layer; this in-memory store
//! is the implementation used by the gate and the account endpoints in this
//! service. Usernames are unique and compared case-insensitively.

use std::collections::HashMap;

use chrono::Utc;
use uuid::Uuid;

use crate::auth::{password, Role};
use crate::error::ApiError;
use crate::models::Account;

pub const USERNAME_MIN_LEN: usize = 3;
pub const USERNAME_MAX_LEN: usize = 64;

/// Lookup interface used by the authentication gate.
pub trait CredentialStore: Send + Sync {
    /// Resolve an enabled account to `(subject, role)`.
    ///
    /// Returns `None` for unknown or disabled accounts.
    fn find_principal_by_username(&self, username: &str) -> Option<(String, Role)>;

    fn find_account(&self, username: &str) -> Option<Account>;
}

#[derive(Debug)]
pub struct InMemoryStore {
    accounts: HashMap<String, Account>,
    bcrypt_cost: u32,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::with_bcrypt_cost(bcrypt::DEFAULT_COST)
    }

    pub fn with_bcrypt_cost(bcrypt_cost: u32) -> Self {
        Self {
            accounts: HashMap::new(),
            bcrypt_cost,
        }
    }

    pub fn bcrypt_cost(&self) -> u32 {
        self.bcrypt_cost
    }

    /// Create an account, hashing `password` with the store's bcrypt cost.
    pub fn create_account(
        &mut self,
        username: &str,
        password: &str,
        role: Role,
    ) -> Result<Account, ApiError> {
        validate_username(&normalize_username(username))?;
        if self.contains(username) {
            return Err(ApiError::conflict("Username is already taken"));
        }
        let password_hash = password::hash_password(password, self.bcrypt_cost)?;
        self.insert_account(username, password_hash, role)
    }

    /// Insert an account whose password was already hashed.
    ///
    /// The username is normalized and must pass [`validate_username`].
    pub fn insert_account(
        &mut self,
        username: &str,
        password_hash: String,
        role: Role,
    ) -> Result<Account, ApiError> {
        let key = normalize_username(username);
        validate_username(&key)?;
        if self.accounts.contains_key(&key) {
            return Err(ApiError::conflict("Username is already taken"));
        }

        let account = Account {
            id: Uuid::new_v4(),
            username: key.clone(),
            password_hash,
            role,
            enabled: true,
            created_at: Utc::now(),
        };
        self.accounts.insert(key, account.clone());
        Ok(account)
    }

    pub fn contains(&self, username: &str) -> bool {
        self.accounts.contains_key(&normalize_username(username))
    }

    pub fn list_accounts(&self) -> Vec<Account> {
        let mut accounts: Vec<Account> = self.accounts.values().cloned().collect();
        accounts.sort_by(|a, b| a.username.cmp(&b.username));
        accounts
    }

    pub fn set_role(&mut self, username: &str, role: Role) -> Result<Account, ApiError> {
        let account = self
            .accounts
            .get_mut(&normalize_username(username))
            .ok_or_else(|| ApiError::not_found("Account not found"))?;
        account.role = role;
        Ok(account.clone())
    }

    pub fn set_enabled(&mut self, username: &str, enabled: bool) -> Result<Account, ApiError> {
        let account = self
            .accounts
            .get_mut(&normalize_username(username))
            .ok_or_else(|| ApiError::not_found("Account not found"))?;
        account.enabled = enabled;
        Ok(account.clone())
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}

impl CredentialStore for InMemoryStore {
    fn find_principal_by_username(&self, username: &str) -> Option<(String, Role)> {
        self.accounts
            .get(&normalize_username(username))
            .filter(|account| account.enabled)
            .map(|account| (account.username.clone(), account.role))
    }

    fn find_account(&self, username: &str) -> Option<Account> {
        self.accounts.get(&normalize_username(username)).cloned()
    }
}

/// Storage key for a username: trimmed and lowercased.
pub fn normalize_username(username: &str) -> String {
    username.trim().to_lowercase()
}

/// Check a normalized username: 3-64 characters of `a-z`, `0-9`, `.`, `_`, `-`.
pub fn validate_username(username: &str) -> Result<(), ApiError> {
    let len = username.chars().count();
    if !(USERNAME_MIN_LEN..=USERNAME_MAX_LEN).contains(&len) {
        return Err(ApiError::bad_request(format!(
            "username must be {USERNAME_MIN_LEN}-{USERNAME_MAX_LEN} characters"
        )));
    }
    let valid = username
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '.' | '_' | '-'));
    if !valid {
        return Err(ApiError::bad_request(
            "username may only contain a-z, 0-9, '.', '_' and '-'",
        ));
    }
    Ok(())
}
