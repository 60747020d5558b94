//! Heartbeat loop keeping a registered instance alive
//!
//! One loop runs per service process for its whole lifetime. Failures are
//! logged and absorbed; the loop only ends when the shutdown token fires,
//! after which it deregisters the instance once.

use crate::config::{StaticInstance, DEFAULT_HEARTBEAT_PERIOD};
use crate::{generate_instance_id, DiscoveryError, Registry, Result};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Periodic liveness reporter for one service instance
pub struct HeartbeatLoop {
    registry: Arc<dyn Registry>,
    instance_id: String,
    service_name: String,
    period: Duration,
    failures: Arc<AtomicU64>,
}

impl HeartbeatLoop {
    /// Create a heartbeat loop with the default one second period
    pub fn new(
        registry: Arc<dyn Registry>,
        instance_id: impl Into<String>,
        service_name: impl Into<String>,
    ) -> Self {
        Self {
            registry,
            instance_id: instance_id.into(),
            service_name: service_name.into(),
            period: DEFAULT_HEARTBEAT_PERIOD,
            failures: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Set the heartbeat period, which must be positive
    pub fn with_period(mut self, period: Duration) -> Result<Self> {
        if period.is_zero() {
            return Err(DiscoveryError::InvalidConfiguration(
                "heartbeat period must be positive".to_string(),
            ));
        }
        self.period = period;
        Ok(self)
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Shared counter of failed heartbeats, readable after the loop is spawned
    pub fn failure_counter(&self) -> Arc<AtomicU64> {
        Arc::clone(&self.failures)
    }

    /// Report liveness once
    pub async fn beat(&self) -> Result<()> {
        self.registry
            .report_healthy_state(&self.instance_id, &self.service_name)
            .await
    }

    /// Run until `shutdown` fires, then deregister the instance.
    ///
    /// A heartbeat already in flight when shutdown fires is allowed to finish.
    pub async fn run(self, shutdown: CancellationToken) {
        let mut ticker = time::interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        debug!(
            "Heartbeat loop started for {} ({}) every {:?}",
            self.instance_id, self.service_name, self.period
        );

        loop {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => {
                    if let Err(e) = self.beat().await {
                        self.failures.fetch_add(1, Ordering::Relaxed);
                        warn!(
                            "Failed to report healthy state for {} ({}): {}",
                            self.instance_id, self.service_name, e
                        );
                    }
                }
            }
        }

        match self
            .registry
            .deregister(&self.instance_id, &self.service_name)
            .await
        {
            Ok(()) => info!("Deregistered {} ({})", self.instance_id, self.service_name),
            Err(e) => warn!(
                "Failed to deregister {} ({}): {}",
                self.instance_id, self.service_name, e
            ),
        }
    }

    /// Spawn the loop onto the current runtime
    pub fn spawn(self, shutdown: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(self.run(shutdown))
    }
}

/// Register an instance and start its heartbeat loop.
///
/// The initial registration error is returned to the caller: a service must
/// not run unregistered. Later heartbeat failures never surface here. A zero
/// period is rejected before anything is registered.
pub async fn register_with_heartbeat(
    registry: Arc<dyn Registry>,
    instance_id: &str,
    service_name: &str,
    host_port: &str,
    period: Duration,
    shutdown: CancellationToken,
) -> Result<JoinHandle<()>> {
    let heartbeat =
        HeartbeatLoop::new(registry.clone(), instance_id, service_name).with_period(period)?;

    registry.register(instance_id, service_name, host_port).await?;
    info!("Registered {} ({}) at {}", instance_id, service_name, host_port);

    Ok(heartbeat.spawn(shutdown))
}

/// Register every configured peer instance under a fresh id and keep each
/// alive with its own heartbeat loop until `shutdown` fires.
pub async fn register_static_instances(
    registry: Arc<dyn Registry>,
    instances: &[StaticInstance],
    period: Duration,
    shutdown: CancellationToken,
) -> Result<Vec<JoinHandle<()>>> {
    let mut handles = Vec::with_capacity(instances.len());
    for instance in instances {
        let instance_id = generate_instance_id(&instance.service);
        let handle = register_with_heartbeat(
            registry.clone(),
            &instance_id,
            &instance.service,
            &instance.host_port,
            period,
            shutdown.clone(),
        )
        .await?;
        handles.push(handle);
    }
    Ok(handles)
}
