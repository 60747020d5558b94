//! Client-side gateway to registry-discovered services
//!
//! Provides:
//! - `ServiceGateway`: resolve, select, call and translate errors
//! - Typed gateways for the metadata and rating services
//! - `AdmissionLimiter`: token bucket gate for inbound requests
//! - Prometheus metrics shared by all of the above

pub mod context;
pub mod error;
pub mod gateway;
pub mod limiter;
pub mod load_balancer;
pub mod metadata;
pub mod metrics;
pub mod rating;

pub use context::CallContext;
pub use error::{GatewayError, Result};
pub use gateway::{GatewayConfig, ServiceGateway};
pub use limiter::{AdmissionLimiter, LimiterConfig};
pub use load_balancer::{LoadBalancer, LoadBalancingStrategy};
pub use metadata::MetadataGateway;
pub use metrics::MetricsCollector;
pub use rating::RatingGateway;
