//! Gateway to the metadata service

use crate::{CallContext, GatewayConfig, Result, ServiceGateway};
use discovery_core::Registry;
use movie_api::{Metadata, METADATA_SERVICE};
use std::sync::Arc;

/// HTTP gateway for movie metadata
pub struct MetadataGateway {
    gateway: ServiceGateway,
}

impl MetadataGateway {
    pub fn new(registry: Arc<dyn Registry>, config: &GatewayConfig) -> Result<Self> {
        Ok(Self::from_gateway(ServiceGateway::new(registry, METADATA_SERVICE, config)?))
    }

    pub fn from_gateway(gateway: ServiceGateway) -> Self {
        Self { gateway }
    }

    /// Get movie metadata by movie id
    pub async fn get(&self, ctx: &CallContext, id: &str) -> Result<Metadata> {
        self.gateway
            .get_json(ctx, "/metadata", &[("id", id.to_string())])
            .await
    }
}
