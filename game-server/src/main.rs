use std::net::IpAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::signal;
use tracing::{error, info};

use game_core::RoomStore;
use game_persistence::{MemoryRoomStore, SqlRoomStore, connect_and_migrate};
use game_server::config::{Config, StoreBackend};
use game_server::create_routes;
use game_server::room_hub::RoomHub;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    info!("Starting Strawberry room server...");

    let config = Config::from_env().context("Invalid configuration")?;

    let store: Arc<dyn RoomStore> = match config.store_backend {
        StoreBackend::Memory => {
            info!("Using in-memory room store, rooms will not survive a restart");
            Arc::new(MemoryRoomStore::new())
        }
        StoreBackend::Sqlite => {
            let db = connect_and_migrate(&config.database_url).await?;
            Arc::new(SqlRoomStore::new(db))
        }
    };
    let hub = Arc::new(RoomHub::new(store));

    if let Some(dir) = &config.static_dir {
        info!("Serving static files from {}", dir.display());
    }
    let routes = create_routes(hub.clone(), config.clone());

    // Drop long-poll channels nobody is waiting on
    let cleanup_hub = hub.clone();
    let cleanup_interval = config.watcher_cleanup_interval();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(cleanup_interval);
        loop {
            interval.tick().await;
            let pruned = cleanup_hub.prune_watchers();
            if pruned > 0 {
                tracing::debug!(pruned, "pruned idle room watchers");
            }
        }
    });

    let host: IpAddr = config
        .host
        .parse()
        .with_context(|| format!("Invalid HOST {:?}", config.host))?;

    let (addr, server) = warp::serve(routes)
        .try_bind_with_graceful_shutdown((host, config.port), shutdown_signal())
        .with_context(|| format!("Error listening on {host}:{}", config.port))?;

    info!("Server started on {}. Press Ctrl+C to stop.", addr);
    server.await;
    info!("Server shutdown complete.");
    Ok(())
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use signal::unix::{SignalKind, signal};
        match (signal(SignalKind::interrupt()), signal(SignalKind::terminate())) {
            (Ok(mut sigint), Ok(mut sigterm)) => {
                tokio::select! {
                    _ = sigint.recv() => info!("Received SIGINT, shutting down gracefully..."),
                    _ = sigterm.recv() => info!("Received SIGTERM, shutting down gracefully..."),
                }
            }
            (Err(err), _) | (_, Err(err)) => {
                error!("Could not install signal handlers: {}", err);
                if let Err(err) = signal::ctrl_c().await {
                    error!("Failed to listen for ctrl+c: {}", err);
                }
            }
        }
    }

    #[cfg(not(unix))]
    {
        if let Err(err) = signal::ctrl_c().await {
            error!("Failed to listen for ctrl+c: {}", err);
        }
        info!("Received Ctrl+C, shutting down gracefully...");
    }
}
