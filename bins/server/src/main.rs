//! Coffer API Server
//!
//! Main entry point for the wallet service.

use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use coffer_api::{AppState, create_router};
use coffer_core::wallet::{BalanceMutator, RetryPolicy, WalletService, WalletStore};
use coffer_db::{WalletRepository, connect};
use coffer_shared::{AppConfig, LogConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load()?;
    init_tracing(&config.log);

    let db = connect(&config.database).await?;
    info!(
        max_connections = config.database.max_connections,
        "Connected to database"
    );

    let repository = Arc::new(WalletRepository::new(db));
    let store: Arc<dyn WalletStore> = repository.clone();
    let mutator: Arc<dyn BalanceMutator> = repository;

    let policy = RetryPolicy::new(config.wallet.max_attempts, config.wallet.base_backoff());
    let wallets = WalletService::new(store, mutator, policy)
        .with_deadline(config.wallet.operation_timeout());
    info!(
        max_attempts = policy.max_attempts(),
        base_backoff_ms = config.wallet.base_backoff_ms,
        operation_timeout_ms = config.wallet.operation_timeout_ms,
        "Wallet service configured"
    );

    let app = create_router(AppState::new(wallets));

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

fn init_tracing(log: &LogConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "coffer=debug,tower_http=debug".into());

    if log.json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

/// Resolves on Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
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

    info!("Shutdown signal received, draining connections");
}
