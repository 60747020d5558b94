//! Registered service instances
use tokio::time::{Duration, Instant};

/// One running process of a named service
#[derive(Clone, Debug)]
pub struct ServiceInstance {
    pub instance_id: String,
    pub service_name: String,
    /// Address other processes should dial, `host:port`
    pub host_port: String,
    /// Time of the most recent registration or heartbeat
    pub last_active: Instant,
}

impl ServiceInstance {
    pub fn new(instance_id: String, service_name: String, host_port: String) -> Self {
        Self {
            instance_id,
            service_name,
            host_port,
            last_active: Instant::now(),
        }
    }

    /// Record liveness at the current instant
    pub fn touch(&mut self) {
        self.last_active = Instant::now();
    }

    /// Whether the instance is still inside the liveness window at `now`
    pub fn is_active(&self, liveness_window: Duration, now: Instant) -> bool {
        now.saturating_duration_since(self.last_active) < liveness_window
    }
}
