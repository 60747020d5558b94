use thiserror::Error;

pub type Result<T> = std::result::Result<T, DiscoveryError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DiscoveryError {
    #[error("No active instances for service: {0}")]
    NotFound(String),

    #[error("Service is not registered yet: {0}")]
    UnregisteredService(String),

    #[error("Service instance is not registered yet: {instance_id} ({service})")]
    UnregisteredInstance { service: String, instance_id: String },

    #[error("Registry backend error: {0}")]
    Backend(String),

    #[error("Invalid registry configuration: {0}")]
    InvalidConfiguration(String),
}

impl DiscoveryError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, DiscoveryError::NotFound(_))
    }
}
