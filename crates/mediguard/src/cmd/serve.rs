//! Serve command - Run the MediGuard API server

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use mediguard_api::{AppState, RouterOptions, build_router_with_options};
use mediguard_auth::db::open_pool;
use mediguard_auth::{CredentialConfig, CredentialService, LocalUserStore, UserStore};
use mediguard_care::{Care, CareOptions, LocalCalendar, dispatcher_from_config};
use mediguard_config::{Config, FanOut};
use tokio::net::TcpListener;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use super::load_config;

/// Run the serve command
pub async fn run(config_path: Option<PathBuf>) -> Result<()> {
    let config_label = config_path
        .as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "(default)".to_string());

    info!(
        version = env!("CARGO_PKG_VERSION"),
        platform = std::env::consts::OS,
        arch = std::env::consts::ARCH,
        config = %config_label,
        "MediGuard starting"
    );

    let config = load_config(config_path.as_deref())?;

    if let Err(e) = run_server(config).await {
        error!(error = %e, "server error");
        return Err(e);
    }

    info!("MediGuard shutdown complete");
    Ok(())
}

/// Build the application state from configuration
async fn build_state(config: &Config) -> Result<AppState> {
    let db_path = config.storage.db_path();
    let pool = open_pool(&db_path, config.storage.max_connections)
        .await
        .with_context(|| format!("failed to open database {}", db_path.display()))?;
    info!(db = %db_path.display(), "database opened");

    let store = LocalUserStore::new(pool.clone())
        .await
        .context("failed to initialize user store")?;
    let users: Arc<dyn UserStore> = Arc::new(store);

    let secret = config
        .auth
        .jwt_secret_bytes()
        .context("auth.jwt_secret is not set")?;
    let credential_config = CredentialConfig::new(secret.to_vec())
        .with_ttl(config.auth.token_ttl)
        .with_issuer(config.auth.issuer.clone());
    let credentials = CredentialService::new(Arc::clone(&users), credential_config)
        .context("failed to initialize credential service")?;

    let calendar = LocalCalendar::new(
        config
            .records
            .offset()
            .context("invalid records.utc_offset")?,
    );
    let dispatcher =
        dispatcher_from_config(&config.notify).context("failed to initialize notifications")?;

    if config.notify.fan_out == FanOut::AllRegistered {
        warn!(
            "notify.fan_out = all_registered: every confirmation is pushed to all registered devices"
        );
    }

    let options = CareOptions {
        calendar,
        withdrawn: config.records.withdrawn_data,
        fan_out: config.notify.fan_out,
    };
    let care = Care::new(pool, users, dispatcher, options)
        .await
        .context("failed to initialize care records")?;

    info!(
        utc_offset = %config.records.utc_offset,
        withdrawn_data = ?config.records.withdrawn_data,
        notify = ?config.notify.provider,
        "care records ready"
    );

    Ok(AppState::new(Arc::new(credentials), care))
}

/// Main server run loop
async fn run_server(config: Config) -> Result<()> {
    // Create cancellation token for coordinated shutdown
    let cancel = CancellationToken::new();

    let state = build_state(&config).await?;
    let app = build_router_with_options(
        state,
        RouterOptions {
            trace: true,
            cors: config.server.cors,
        },
    );

    let addr = config.server.addr();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;

    info!(addr = %addr, cors = config.server.cors, "MediGuard API listening");

    let server_cancel = cancel.clone();
    let mut server = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                server_cancel.cancelled().await;
            })
            .await
    });

    tokio::select! {
        _ = wait_for_shutdown() => {
            info!("shutdown signal received, stopping server...");
            cancel.cancel();
            server
                .await
                .context("server task panicked")?
                .context("server error")?;
        }
        result = &mut server => {
            result.context("server task panicked")?.context("server error")?;
        }
    }

    Ok(())
}

/// Wait for SIGINT or SIGTERM
async fn wait_for_shutdown() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
