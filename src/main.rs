//! News & Sports Gateway server binary.

use std::net::SocketAddr;

use anyhow::Context;
use tokio::signal;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use news_sports_gateway::{create_router, spawn_cleanup_task, spawn_sync_task, AppState, Config};

/// Main entry point for the gateway.
///
/// # Startup Sequence
/// 1. Load `.env` if present and initialize tracing
/// 2. Load configuration from environment variables
/// 3. Open the database and build the shared state
/// 4. Start the cache sweep and, if enabled, the sync task
/// 5. Serve HTTP until SIGINT/SIGTERM, then stop the background tasks
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let dotenv = dotenvy::dotenv();

    // Initialize tracing subscriber with env filter
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "news_sports_gateway=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Ok(path) = dotenv {
        info!("Loaded environment from {}", path.display());
    }
    info!("Starting News & Sports Gateway");

    let config = Config::from_env();
    info!(
        "Configuration loaded: port={}, database={}, news_ttl={}s, sports_ttl={}s, cleanup_interval={}s, sync_interval={}s",
        config.server_port,
        config.database_path,
        config.news_cache_ttl,
        config.sports_cache_ttl,
        config.cleanup_interval,
        config.sync_interval
    );
    if config.news_api_key.is_empty() {
        warn!("NEWS_API_KEY is not set, NewsAPI will reject proxied requests");
    }

    let state = AppState::from_config(&config).context("Failed to initialise application state")?;

    let mut background = Vec::new();
    if config.cleanup_interval > 0 {
        background.push(spawn_cleanup_task(
            vec![state.news_cache.clone(), state.sports_cache.clone()],
            config.cleanup_interval,
        ));
    }
    if config.sync_interval > 0 {
        background.push(spawn_sync_task(state.sync.clone(), config.sync_interval));
    }
    info!("{} background tasks started", background.len());

    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(background))
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
///
/// On shutdown signal, aborts the background tasks and allows graceful shutdown.
async fn shutdown_signal(background: Vec<JoinHandle<()>>) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
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

    for handle in &background {
        handle.abort();
    }
    warn!("{} background tasks aborted", background.len());
}
