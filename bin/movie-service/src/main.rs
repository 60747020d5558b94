use anyhow::Result;
use discovery_core::{InMemoryRegistry, Registry};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod config;
mod controller;
mod handler;
mod server;

use config::ServiceConfig;
use server::{serve, MovieService};

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let config = ServiceConfig::load()?;
    info!("Starting the movie service on port {}", config.api.port);

    let shutdown = CancellationToken::new();

    // Registry handle shared by the heartbeat loops and every gateway
    let registry: Arc<dyn Registry> = Arc::new(InMemoryRegistry::from_config(&config.registry)?);
    let service = MovieService::start(&config, registry, shutdown.clone()).await?;

    let addr: SocketAddr = ([0, 0, 0, 0], config.api.port).into();
    let listener = TcpListener::bind(&addr).await?;
    info!("HTTP server listening on {}", addr);

    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            shutdown_signal().await;
            shutdown.cancel();
        }
    });

    serve(listener, service.state(), shutdown.clone(), TaskTracker::new()).await;

    info!("Attempting graceful shutdown");
    service.stopped().await;
    info!("Movie service stopped");
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("MOVIE_LOG_FORMAT")
        .map(|format| format.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
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
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Ctrl+C received, shutting down"),
        _ = terminate => info!("SIGTERM received, shutting down"),
    }
}
