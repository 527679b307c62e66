//! Portal Cache - hosts the shared cache and its admin HTTP surface.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use portal_cache::api::create_router;
use portal_cache::{
    AppState, CacheStore, Config, HttpPurgeHook, InvalidationHook, MaintenanceTimer, NoopHook,
    ServiceCache,
};

/// Main entry point for the cache host.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Create the shared store and upstream hook
/// 4. Start the maintenance timer
/// 5. Serve the admin router on the configured port
/// 6. Stop the timer on SIGINT/SIGTERM
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "portal_cache=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting portal cache");

    let config = Config::from_env();
    info!(
        "Configuration loaded: max_size={}, default_ttl={}s, cleanup_interval={}s, port={}",
        config.cache.max_size,
        config.cache.default_ttl.as_secs(),
        config.cache.cleanup_interval.as_secs(),
        config.server_port
    );

    let hook: Arc<dyn InvalidationHook> = match &config.purge_url {
        Some(url) => {
            info!(
                "Upstream purge enabled at {} (timeout {}s)",
                url,
                config.purge_timeout.as_secs()
            );
            Arc::new(HttpPurgeHook::new(url.clone(), config.purge_timeout)?)
        }
        None => Arc::new(NoopHook),
    };

    let store = CacheStore::shared(&config.cache);
    let state = AppState::new(ServiceCache::new(store.clone(), hook));
    info!("Cache store initialized");

    let mut timer = MaintenanceTimer::new(store, config.cache.cleanup_interval);
    timer.start();

    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    timer.stop();
    info!("Server shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                warn!("Failed to install SIGTERM handler: {}", err);
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
}
