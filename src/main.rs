// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::net::SocketAddr;
use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use profile_service::api::router;
use profile_service::auth::JwksManager;
use profile_service::config::AppConfig;
use profile_service::state::{AppState, AuthConfig};
use profile_service::storage::UserStore;

#[tokio::main]
async fn main() {
    init_tracing();

    let config = match AppConfig::load() {
        Ok(config) => config,
        Err(err) => {
            tracing::error!(error = %err, "invalid configuration");
            std::process::exit(1);
        }
    };

    // Data-store failure at boot is fatal.
    let store = match UserStore::open(config.data_dir.join("users.redb")) {
        Ok(store) => store,
        Err(err) => {
            tracing::error!(error = %err, path = %config.data_dir.display(), "failed to open user store");
            std::process::exit(1);
        }
    };

    let auth = AuthConfig {
        jwks: Some(Arc::new(JwksManager::new(config.jwks_url.clone()))),
        issuer: config.issuer.clone(),
        audience: Some(config.client_id.clone()),
        algorithm: config.algorithm,
        client_id: config.client_id.clone(),
    };

    let mut state = AppState::new(store, auth);
    if let Some(origin) = &config.allowed_origin {
        state = state.with_allowed_origin(origin.clone());
    }
    let app = router(state);

    let addr: SocketAddr = match format!("{}:{}", config.host, config.port).parse() {
        Ok(addr) => addr,
        Err(err) => {
            tracing::error!(error = %err, "failed to parse bind address");
            std::process::exit(1);
        }
    };

    tracing::info!(
        %addr,
        realm = %config.realm,
        issuer = %config.issuer,
        "profile service listening (docs at /docs)"
    );

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!(error = %err, "failed to bind");
            std::process::exit(1);
        }
    };

    if let Err(err) = axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        tracing::error!(error = %err, "server failed");
        std::process::exit(1);
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    let json = std::env::var(profile_service::config::LOG_FORMAT_ENV)
        .map(|format| format == "json")
        .unwrap_or(false);
    if json {
        let _ = builder.json().try_init();
    } else {
        let _ = builder.try_init();
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("shutdown signal received");
}
