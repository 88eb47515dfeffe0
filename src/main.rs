//! Search Cache - podcast search backend with a read-through result cache
//!
//! Serves search endpoints over a catalog, caching results per normalized
//! query for a bounded time.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::signal;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use search_cache::api::create_router;
use search_cache::search::{MemoryCatalog, SearchBackend};
use search_cache::{spawn_cleanup_task, AppState, Config};

/// Main entry point for the search server.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Load the search catalog
/// 4. Create the read-through cache and search service
/// 5. Start the background expiry sweep
/// 6. Start HTTP server on configured port
/// 7. Handle graceful shutdown on SIGINT/SIGTERM
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "search_cache=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting search server");

    let config = Config::from_env();
    info!(
        "Configuration loaded: max_entries={}, search_ttl={}s, port={}, cleanup_interval={}s, compute_timeout={}s",
        config.max_entries,
        config.search_ttl,
        config.server_port,
        config.cleanup_interval,
        config.compute_timeout
    );

    let catalog = match &config.catalog_path {
        Some(path) => MemoryCatalog::from_file(path)?,
        None => {
            warn!("CATALOG_PATH not set, serving an empty catalog");
            MemoryCatalog::default()
        }
    };
    info!(
        "Catalog loaded: {} channels, {} podcasts",
        catalog.channel_count(),
        catalog.podcast_count()
    );
    let backend: Arc<dyn SearchBackend> = Arc::new(catalog);

    let state = AppState::from_config(&config, backend);
    info!("Read-through cache initialized");

    let cleanup_handle = (config.cleanup_interval > 0).then(|| {
        let handle = spawn_cleanup_task(Arc::clone(state.cache().store()), config.cleanup_interval);
        info!("Background expiry sweep started");
        handle
    });

    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {}", addr))?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(cleanup_handle))
        .await
        .context("serving HTTP")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
///
/// On shutdown signal, aborts the sweep task and allows graceful shutdown.
async fn shutdown_signal(cleanup_handle: Option<JoinHandle<()>>) {
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

    if let Some(handle) = cleanup_handle {
        handle.abort();
        warn!("Expiry sweep aborted");
    }
}
