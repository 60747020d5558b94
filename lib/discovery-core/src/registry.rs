//! Service registry capability shared by service processes and gateways

use crate::Result;
use async_trait::async_trait;
use uuid::Uuid;

/// Registry of service instances and their liveness.
///
/// Implementations may keep the directory in process memory or in an
/// external store; callers hold an `Arc<dyn Registry>` and never depend on
/// which one they were given. Externally-backed implementations perform
/// network I/O inside these calls, so callers that need a deadline wrap
/// the returned future.
#[async_trait]
pub trait Registry: Send + Sync {
    /// Create or overwrite the record for `(service_name, instance_id)`
    /// and mark it active now.
    async fn register(&self, instance_id: &str, service_name: &str, host_port: &str)
        -> Result<()>;

    /// Remove the record if present. Unknown identities are not an error.
    async fn deregister(&self, instance_id: &str, service_name: &str) -> Result<()>;

    /// Push-style liveness report for an already registered instance.
    async fn report_healthy_state(&self, instance_id: &str, service_name: &str) -> Result<()>;

    /// Addresses of every active instance of `service_name`, in no
    /// particular order. Fails with `NotFound` when none are active.
    async fn service_addresses(&self, service_name: &str) -> Result<Vec<String>>;
}

/// Generate a fresh instance identifier for a process of `service_name`
pub fn generate_instance_id(service_name: &str) -> String {
    format!("{}-{}", service_name, Uuid::new_v4())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instance_ids_are_unique_and_prefixed() {
        let a = generate_instance_id("rating");
        let b = generate_instance_id("rating");
        assert_ne!(a, b);
        assert!(a.starts_with("rating-"));
        assert!(b.starts_with("rating-"));
    }
}
