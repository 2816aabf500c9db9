// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use tokio::sync::{OnceCell, RwLock};
use uuid::Uuid;

use crate::auth::{password, AccessPolicy, AuthError, TokenService};
use crate::config::AuthConfig;
use crate::error::ApiError;
use crate::store::InMemoryStore;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<RwLock<InMemoryStore>>,
    pub tokens: Arc<TokenService>,
    pub policy: Arc<AccessPolicy>,
    /// Report the specific token failure on 401 instead of `unauthenticated`.
    pub expose_token_errors: bool,
    /// Hash checked by logins that name no usable account.
    pub(crate) dummy_hash: Arc<OnceCell<String>>,
}

impl AppState {
    pub fn new(store: InMemoryStore, tokens: TokenService, policy: AccessPolicy) -> Self {
        Self {
            store: Arc::new(RwLock::new(store)),
            tokens: Arc::new(tokens),
            policy: Arc::new(policy),
            expose_token_errors: true,
            dummy_hash: Arc::new(OnceCell::new()),
        }
    }

    /// Build the state from validated configuration, using the platform rule table.
    pub fn from_config(config: &AuthConfig, store: InMemoryStore) -> Result<Self, AuthError> {
        let tokens = TokenService::new(config.token.clone())?;
        let policy = AccessPolicy::platform(config.default_decision);
        Ok(Self::new(store, tokens, policy).with_expose_token_errors(config.expose_token_errors))
    }

    pub fn with_expose_token_errors(mut self, expose: bool) -> Self {
        self.expose_token_errors = expose;
        self
    }

    /// A bcrypt hash of a random password at the store's cost.
    ///
    /// Built once, on first use.
    pub async fn dummy_password_hash(&self) -> Result<String, ApiError> {
        let hash = self
            .dummy_hash
            .get_or_try_init(|| async {
                let cost = self.store.read().await.bcrypt_cost();
                password::hash_password_blocking(Uuid::new_v4().to_string(), cost).await
            })
            .await?;
        Ok(hash.clone())
    }
}
