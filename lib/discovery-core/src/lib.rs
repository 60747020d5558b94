//! Core service discovery functionality
//!
//! This library provides:
//! - The `Registry` capability shared by every service process and gateway
//! - An in-memory registry with TTL-based liveness filtering
//! - The heartbeat loop that keeps a registered instance alive

pub mod config;
pub mod error;
pub mod heartbeat;
pub mod instance;
pub mod memory;
pub mod registry;

pub use config::{RegistryConfig, StaticInstance};
pub use error::{DiscoveryError, Result};
pub use heartbeat::{register_static_instances, register_with_heartbeat, HeartbeatLoop};
pub use instance::ServiceInstance;
pub use memory::InMemoryRegistry;
pub use registry::{generate_instance_id, Registry};
