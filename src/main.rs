//! cryptochat-gateway server entry point.
//!
//! Loads configuration, opens the store, selects the reply backend and
//! serves the REST API until SIGINT/SIGTERM.

use std::net::SocketAddr;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use cryptochat_gateway::api;
use cryptochat_gateway::app_state::AppState;
use cryptochat_gateway::config::GatewayConfig;
use cryptochat_gateway::error;
use cryptochat_gateway::persistence::SqlitePersistence;
use cryptochat_gateway::service::relay;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = GatewayConfig::from_env().map_err(|e| anyhow::anyhow!("invalid configuration: {e}"))?;

    // Initialize tracing: RUST_LOG, then LOG_LEVEL, then info
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        config.log_level.parse().unwrap_or_else(|e| {
            eprintln!(
                "WARN: LOG_LEVEL='{}' is not a valid tracing filter ({e}); falling back to 'info'",
                config.log_level
            );
            EnvFilter::new("info")
        })
    });
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true);
    if config.log_json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    error::set_expose_details(config.expose_error_details);
    tracing::info!(
        addr = %config.listen_addr,
        db_path = %config.db_path,
        backend = config.relay.backend.as_str(),
        request_timeout = ?config.request_timeout,
        relay_timeout = ?config.relay.timeout,
        "starting cryptochat-gateway"
    );

    // Build persistence and the reply backend
    let store = SqlitePersistence::open(&config)
        .await
        .context("failed to open the database")?;
    let backend = relay::build_backend(&config.relay)
        .await
        .map_err(|e| anyhow::anyhow!("failed to build the reply backend: {e}"))?;

    // Build application state and router
    let listen_addr = config.listen_addr;
    let state = AppState::new(config, store.clone(), backend);
    let app = api::build_app(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(listen_addr)
        .await
        .with_context(|| format!("failed to bind {listen_addr}"))?;
    tracing::info!(addr = %listen_addr, "server listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    store.close().await;
    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "failed to install CTRL+C handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut s) => {
                s.recv().await;
            }
            Err(e) => tracing::warn!(error = %e, "failed to install SIGTERM handler"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }

    tracing::info!("shutdown signal received; draining connections");
}
