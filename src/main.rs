// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::{error::Error, time::Duration};

use axum_server::{tls_rustls::RustlsConfig, Handle};
use evcharge_server::{
    api::router,
    auth::{DefaultDecision, Role},
    config::{self, AppConfig},
    logging,
    state::AppState,
    store::InMemoryStore,
};

const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    dotenvy::dotenv().ok();

    let log_format = config::log_format_from_env().unwrap_or_else(|e| {
        eprintln!("{e}; falling back to the default log format");
        Default::default()
    });
    logging::init(log_format);

    let config = AppConfig::from_env()
        .inspect_err(|e| tracing::error!(error = %e, "Invalid configuration"))?;

    if config.auth.default_decision == DefaultDecision::Allow {
        tracing::warn!("Requests matching no access rule are allowed (AUTH_DEFAULT_POLICY=allow)");
    }

    let mut store = InMemoryStore::with_bcrypt_cost(config.auth.bcrypt_cost);
    if let Some(seed) = &config.seed_admin {
        let account = store.create_account(&seed.username, &seed.password, Role::Admin)?;
        tracing::info!(username = %account.username, "Seeded admin account");
    }

    let state = AppState::from_config(&config.auth, store)?;
    state.dummy_password_hash().await?;
    tracing::info!(
        algorithm = ?state.tokens.algorithm(),
        ttl_secs = state.tokens.ttl_secs(),
        rules = state.policy.rules().len(),
        "Authentication ready"
    );
    let app = router(state);
    let addr = config.server.bind_addr()?;

    let handle = Handle::new();
    let shutdown = handle.clone();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for shutdown signal");
            return;
        }
        tracing::info!("Shutdown signal received");
        shutdown.graceful_shutdown(Some(SHUTDOWN_GRACE));
    });

    match &config.server.tls {
        Some(tls) => {
            // Install the ring crypto provider for rustls before any TLS operations
            rustls::crypto::ring::default_provider()
                .install_default()
                .map_err(|_| "Failed to install rustls crypto provider")?;

            let tls_config = RustlsConfig::from_pem_file(&tls.cert, &tls.key).await?;
            tracing::info!(%addr, "EV charging auth server listening on https (docs at /docs)");
            axum_server::bind_rustls(addr, tls_config)
                .handle(handle)
                .serve(app.into_make_service())
                .await?;
        }
        None => {
            tracing::warn!(%addr, "TLS not configured, serving plain HTTP (docs at /docs)");
            axum_server::bind(addr)
                .handle(handle)
                .serve(app.into_make_service())
                .await?;
        }
    }

    tracing::info!("Server stopped");
    Ok(())
}
