//! itemcache server - exposes one cache pool over HTTP
//!
//! The backend is chosen at start-up from the environment (see
//! [`itemcache::Config`]).

use std::net::SocketAddr;

use anyhow::Context;
use axum::Router;
use tokio::{net::TcpListener, signal, task::JoinHandle};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use itemcache::{
    api::create_router, spawn_sweep_task, AppState, BackendKind, Config, MemoryEntityManager,
    OrmBackend, Pool,
};

/// Main entry point for the itemcache server.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Build the pool for the configured backend
/// 4. Start the expiry sweep (ephemeral backend only)
/// 5. Serve the router until SIGINT/SIGTERM
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "itemcache=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting itemcache server");

    let config = Config::from_env();
    info!(
        "Configuration loaded: backend={}, port={}, sweep_interval={}s",
        config.backend, config.server_port, config.sweep_interval
    );

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("Server listening on http://{}", addr);

    match config.backend {
        BackendKind::Ephemeral => {
            let state = AppState::new(Pool::ephemeral());
            let sweep_handle = spawn_sweep_task(state.pool.clone(), config.sweep_interval);
            serve(listener, create_router(state), Some(sweep_handle)).await?;
        }
        BackendKind::Redis => {
            let pool = Pool::redis(&config.redis_url)
                .with_context(|| format!("invalid REDIS_URL '{}'", config.redis_url))?;
            info!("Redis pool configured, connecting on first request");
            serve(listener, create_router(AppState::new(pool)), None).await?;
        }
        BackendKind::Orm => {
            let backend = OrmBackend::with_table(MemoryEntityManager::new(), &config.orm_table);
            info!("ORM pool using table '{}'", config.orm_table);
            serve(listener, create_router(AppState::new(Pool::new(backend))), None).await?;
        }
    }

    info!("Server shutdown complete");
    Ok(())
}

async fn serve(
    listener: TcpListener,
    app: Router,
    sweep_handle: Option<JoinHandle<()>>,
) -> anyhow::Result<()> {
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(sweep_handle))
        .await
        .context("server error")
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
///
/// On shutdown signal, aborts the sweep task and allows graceful shutdown.
async fn shutdown_signal(sweep_handle: Option<JoinHandle<()>>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }

    if let Some(handle) = sweep_handle {
        handle.abort();
        warn!("Expiry sweep task aborted");
    }
}
