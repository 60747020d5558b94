//! In-memory service registry

use crate::config::DEFAULT_LIVENESS_WINDOW;
use crate::{DiscoveryError, Registry, RegistryConfig, Result, ServiceInstance};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::time::{Duration, Instant};
use tracing::debug;

type Directory = HashMap<String, HashMap<String, ServiceInstance>>;

/// InMemoryRegistry keeps the directory of service instances in process memory.
///
/// Liveness is evaluated when addresses are queried; stale entries stay in
/// the directory until they are deregistered or `evict_stale` is called.
/// Clones share the same directory.
#[derive(Clone)]
pub struct InMemoryRegistry {
    // Map of service_name to (instance_id to instance)
    services: Arc<RwLock<Directory>>,
    liveness_window: Duration,
}

impl InMemoryRegistry {
    pub fn new() -> Self {
        Self::with_liveness_window(DEFAULT_LIVENESS_WINDOW)
    }

    /// Create a registry from validated timing configuration
    pub fn from_config(config: &RegistryConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::with_liveness_window(config.liveness_window()))
    }

    pub fn with_liveness_window(liveness_window: Duration) -> Self {
        Self {
            services: Arc::new(RwLock::new(HashMap::new())),
            liveness_window,
        }
    }

    pub fn liveness_window(&self) -> Duration {
        self.liveness_window
    }

    /// Snapshot of every entry for a service, stale ones included
    pub async fn instances(&self, service_name: &str) -> Vec<ServiceInstance> {
        let services = self.services.read().await;
        services
            .get(service_name)
            .map(|instances| instances.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Drop every stale entry and any service left without instances.
    /// Returns the number of instances removed.
    pub async fn evict_stale(&self) -> usize {
        let now = Instant::now();
        let mut services = self.services.write().await;
        let mut removed = 0;

        services.retain(|service_name, instances| {
            let before = instances.len();
            instances.retain(|_, instance| instance.is_active(self.liveness_window, now));
            let evicted = before - instances.len();
            if evicted > 0 {
                debug!("Evicted {} stale instances of {}", evicted, service_name);
            }
            removed += evicted;
            !instances.is_empty()
        });

        removed
    }

    /// Get count of services with at least one entry
    pub async fn service_count(&self) -> usize {
        let services = self.services.read().await;
        services.len()
    }
}

impl Default for InMemoryRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Registry for InMemoryRegistry {
    async fn register(
        &self,
        instance_id: &str,
        service_name: &str,
        host_port: &str,
    ) -> Result<()> {
        let mut services = self.services.write().await;
        services.entry(service_name.to_string()).or_default().insert(
            instance_id.to_string(),
            ServiceInstance::new(
                instance_id.to_string(),
                service_name.to_string(),
                host_port.to_string(),
            ),
        );

        debug!("Registered instance {} of {} at {}", instance_id, service_name, host_port);
        Ok(())
    }

    async fn deregister(&self, instance_id: &str, service_name: &str) -> Result<()> {
        let mut services = self.services.write().await;
        if let Some(instances) = services.get_mut(service_name) {
            if instances.remove(instance_id).is_some() {
                debug!("Deregistered instance {} of {}", instance_id, service_name);
            }
        }
        Ok(())
    }

    async fn report_healthy_state(&self, instance_id: &str, service_name: &str) -> Result<()> {
        let mut services = self.services.write().await;
        let instances = services
            .get_mut(service_name)
            .ok_or_else(|| DiscoveryError::UnregisteredService(service_name.to_string()))?;
        let instance = instances.get_mut(instance_id).ok_or_else(|| {
            DiscoveryError::UnregisteredInstance {
                service: service_name.to_string(),
                instance_id: instance_id.to_string(),
            }
        })?;

        instance.touch();
        Ok(())
    }

    async fn service_addresses(&self, service_name: &str) -> Result<Vec<String>> {
        let now = Instant::now();
        let services = self.services.read().await;
        let addresses: Vec<String> = services
            .get(service_name)
            .into_iter()
            .flat_map(|instances| instances.values())
            .filter(|instance| instance.is_active(self.liveness_window, now))
            .map(|instance| instance.host_port.clone())
            .collect();

        if addresses.is_empty() {
            return Err(DiscoveryError::NotFound(service_name.to_string()));
        }
        Ok(addresses)
    }
}
