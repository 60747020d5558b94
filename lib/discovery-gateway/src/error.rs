use discovery_core::DiscoveryError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, GatewayError>;

#[derive(Error, Debug)]
pub enum GatewayError {
    /// No active instance, or the downstream service has no such record
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Transport error: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("Request deadline exceeded")]
    DeadlineExceeded,

    #[error("Request cancelled")]
    Cancelled,

    #[error("Upstream {service} responded with status {status}")]
    Upstream { service: String, status: u16 },

    #[error("Resource exhausted: request rejected by admission limiter")]
    ResourceExhausted,

    #[error("Failed to decode response from {service}: {reason}")]
    Decode { service: String, reason: String },

    #[error("Invalid gateway configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Registry error: {0}")]
    Registry(DiscoveryError),
}

impl GatewayError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, GatewayError::NotFound(_))
    }

    /// Whether the resolved instance could not be reached at all
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            GatewayError::Transport(_) | GatewayError::DeadlineExceeded | GatewayError::Cancelled
        )
    }

    /// Short label used for the outcome metric
    pub fn kind(&self) -> &'static str {
        match self {
            GatewayError::NotFound(_) => "not_found",
            GatewayError::Transport(_) => "transport_error",
            GatewayError::DeadlineExceeded => "deadline_exceeded",
            GatewayError::Cancelled => "cancelled",
            GatewayError::Upstream { .. } => "upstream_error",
            GatewayError::ResourceExhausted => "resource_exhausted",
            GatewayError::Decode { .. } => "decode_error",
            GatewayError::InvalidConfiguration(_) => "invalid_configuration",
            GatewayError::Registry(_) => "registry_error",
        }
    }
}

impl From<DiscoveryError> for GatewayError {
    fn from(err: DiscoveryError) -> Self {
        match err {
            DiscoveryError::NotFound(service) => GatewayError::NotFound(service),
            other => GatewayError::Registry(other),
        }
    }
}
