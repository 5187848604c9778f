// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::process::ExitCode;
use std::sync::Arc;

use devboard_api::{
    api::router,
    auth::{KeySetResolver, TokenAuthenticator},
    config::Config,
    error::StartupError,
    state::AppState,
    telemetry::{self, LogFormat},
};
use tracing::{error, info};

#[tokio::main]
async fn main() -> ExitCode {
    telemetry::init(LogFormat::from_env());

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Fatal startup error");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), StartupError> {
    let config = Config::from_env()?;

    // The server must not accept traffic until the signing key is known.
    let key = KeySetResolver::new(config.jwks_fetch_timeout)?
        .with_max_attempts(config.jwks_fetch_attempts)
        .resolve(&config.supabase_url)
        .await?;
    info!(kid = key.key_id().unwrap_or("-"), "Supabase JWKS public key loaded");

    let mut authenticator =
        TokenAuthenticator::new(Arc::new(key)).with_leeway(config.jwt_leeway_secs);
    if let Some(issuer) = &config.jwt_issuer {
        authenticator = authenticator.with_issuer(issuer);
    }
    if let Some(audience) = &config.jwt_audience {
        authenticator = authenticator.with_audience(audience);
    }

    let state = AppState::new(authenticator).with_allowed_origins(config.allowed_origins.clone());
    let app = router(state);

    let listener = tokio::net::TcpListener::bind((config.host.as_str(), config.port))
        .await
        .map_err(StartupError::Bind)?;
    let addr = listener.local_addr().map_err(StartupError::Bind)?;
    info!(%addr, "Devboard API listening (docs at /docs)");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(StartupError::Serve)?;

    info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("Shutdown signal received");
}
