//! Service wiring and the HTTP accept loop

use crate::config::ServiceConfig;
use crate::controller::MovieController;
use crate::handler::{handle_request, AppState};
use anyhow::{Context, Result};
use discovery_core::{
    generate_instance_id, register_static_instances, register_with_heartbeat, Registry,
};
use discovery_gateway::{
    AdmissionLimiter, MetadataGateway, MetricsCollector, RatingGateway, ServiceGateway,
};
use hyper::{server::conn::http1, service::service_fn};
use hyper_util::rt::tokio::TokioIo;
use movie_api::{METADATA_SERVICE, MOVIE_SERVICE, RATING_SERVICE};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, info, warn};

/// A registered movie service instance and its background tasks
pub struct MovieService {
    state: Arc<AppState>,
    heartbeats: Vec<JoinHandle<()>>,
}

impl MovieService {
    /// Register configured peers and this instance, then build the request
    /// handling state. Every heartbeat loop stops when `shutdown` fires.
    pub async fn start(
        config: &ServiceConfig,
        registry: Arc<dyn Registry>,
        shutdown: CancellationToken,
    ) -> Result<Self> {
        let period = config.registry.heartbeat_period();

        let mut heartbeats = register_static_instances(
            registry.clone(),
            &config.registry.static_instances,
            period,
            shutdown.clone(),
        )
        .await
        .context("Failed to register static instances")?;
        if !heartbeats.is_empty() {
            info!("Registered {} static instances", heartbeats.len());
        }

        let instance_id = generate_instance_id(MOVIE_SERVICE);
        heartbeats.push(
            register_with_heartbeat(
                registry.clone(),
                &instance_id,
                MOVIE_SERVICE,
                &config.advertised_address(),
                period,
                shutdown.clone(),
            )
            .await
            .context("Failed to register the movie service")?,
        );

        let metrics = MetricsCollector::new().context("Failed to create metrics collector")?;
        let client = config.gateway.build_client()?;
        let metadata = MetadataGateway::from_gateway(
            ServiceGateway::with_client(
                registry.clone(),
                METADATA_SERVICE,
                client.clone(),
                config.gateway.strategy,
            )
            .with_metrics(metrics.clone()),
        );
        let rating = RatingGateway::from_gateway(
            ServiceGateway::with_client(registry, RATING_SERVICE, client, config.gateway.strategy)
                .with_metrics(metrics.clone()),
        );

        let limiter = AdmissionLimiter::from_config(&config.limiter)?.with_metrics(metrics.clone());
        info!(
            "Admission limiter: {} req/s, burst {}",
            config.limiter.rate_per_second, config.limiter.burst
        );

        let state = Arc::new(AppState {
            controller: MovieController::new(metadata, rating),
            limiter,
            metrics,
            request_timeout: config.gateway.request_timeout(),
            shutdown,
        });

        Ok(Self { state, heartbeats })
    }

    pub fn state(&self) -> Arc<AppState> {
        self.state.clone()
    }

    /// Wait for every heartbeat loop to deregister its instance
    pub async fn stopped(self) {
        for heartbeat in self.heartbeats {
            if let Err(e) = heartbeat.await {
                warn!("Heartbeat task ended abnormally: {}", e);
            }
        }
    }
}

/// Accept HTTP connections until `shutdown` fires, then let every open
/// connection finish its current request and wait for it to close.
pub async fn serve(
    listener: TcpListener,
    state: Arc<AppState>,
    shutdown: CancellationToken,
    connections: TaskTracker,
) {
    loop {
        let (stream, peer_addr) = tokio::select! {
            _ = shutdown.cancelled() => break,
            accepted = listener.accept() => match accepted {
                Ok(accepted) => accepted,
                Err(e) => {
                    warn!("Error accepting HTTP connection: {}", e);
                    continue;
                }
            },
        };
        let io = TokioIo::new(stream);
        let state = state.clone();
        let shutdown = shutdown.clone();

        connections.spawn(async move {
            let service = service_fn(move |req| handle_request(req, state.clone()));
            let connection = http1::Builder::new().serve_connection(io, service);
            tokio::pin!(connection);

            let result = tokio::select! {
                result = connection.as_mut() => result,
                _ = shutdown.cancelled() => {
                    connection.as_mut().graceful_shutdown();
                    connection.await
                }
            };
            if let Err(e) = result {
                debug!("Error serving HTTP connection from {}: {}", peer_addr, e);
            }
        });
    }

    connections.close();
    debug!("Waiting for {} open connections", connections.len());
    connections.wait().await;
}
