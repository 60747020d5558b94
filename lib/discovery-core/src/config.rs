//! Registry and heartbeat timing configuration

use crate::{DiscoveryError, Result};
use serde::Deserialize;
use std::time::Duration;

/// Default liveness window: an instance silent for this long is stale
pub const DEFAULT_LIVENESS_WINDOW: Duration = Duration::from_secs(5);
/// Default heartbeat period, a small fraction of the liveness window
pub const DEFAULT_HEARTBEAT_PERIOD: Duration = Duration::from_secs(1);

/// Timing configuration for the registry and the heartbeat loop
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Liveness window in milliseconds
    pub liveness_window_ms: u64,
    /// Heartbeat period in milliseconds
    pub heartbeat_period_ms: u64,
    /// Instances of other services reachable at fixed addresses.
    ///
    /// Each one is registered at startup and kept alive by its own
    /// heartbeat loop for as long as the process runs.
    pub static_instances: Vec<StaticInstance>,
}

/// A peer service instance known from configuration
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct StaticInstance {
    /// Service name the instance is registered under
    pub service: String,
    /// Address to dial, `host:port`
    pub host_port: String,
}

impl RegistryConfig {
    pub fn liveness_window(&self) -> Duration {
        Duration::from_millis(self.liveness_window_ms)
    }

    pub fn heartbeat_period(&self) -> Duration {
        Duration::from_millis(self.heartbeat_period_ms)
    }

    /// Check the timing and static instance settings.
    ///
    /// Both durations must be positive and the heartbeat period must be
    /// shorter than the liveness window.
    pub fn validate(&self) -> Result<()> {
        if self.liveness_window_ms == 0 {
            return Err(DiscoveryError::InvalidConfiguration(
                "liveness window must be positive".to_string(),
            ));
        }
        if self.heartbeat_period_ms == 0 {
            return Err(DiscoveryError::InvalidConfiguration(
                "heartbeat period must be positive".to_string(),
            ));
        }
        if self.heartbeat_period_ms >= self.liveness_window_ms {
            return Err(DiscoveryError::InvalidConfiguration(format!(
                "heartbeat period ({}ms) must be shorter than the liveness window ({}ms)",
                self.heartbeat_period_ms, self.liveness_window_ms
            )));
        }

        for instance in &self.static_instances {
            if instance.service.is_empty() || instance.host_port.is_empty() {
                return Err(DiscoveryError::InvalidConfiguration(format!(
                    "static instance needs a service and an address: {:?}",
                    instance
                )));
            }
        }
        Ok(())
    }
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            liveness_window_ms: DEFAULT_LIVENESS_WINDOW.as_millis() as u64,
            heartbeat_period_ms: DEFAULT_HEARTBEAT_PERIOD.as_millis() as u64,
            static_instances: Vec::new(),
        }
    }
}
