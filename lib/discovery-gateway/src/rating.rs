//! Gateway to the rating service

use crate::{CallContext, GatewayConfig, Result, ServiceGateway};
use discovery_core::Registry;
use movie_api::{Rating, RecordId, RecordType, RATING_SERVICE};
use reqwest::Method;
use std::sync::Arc;

/// HTTP gateway for ratings
pub struct RatingGateway {
    gateway: ServiceGateway,
}

impl RatingGateway {
    pub fn new(registry: Arc<dyn Registry>, config: &GatewayConfig) -> Result<Self> {
        Ok(Self::from_gateway(ServiceGateway::new(registry, RATING_SERVICE, config)?))
    }

    pub fn from_gateway(gateway: ServiceGateway) -> Self {
        Self { gateway }
    }

    /// Aggregated rating of a record, `NotFound` if it has no ratings
    pub async fn get_aggregated_rating(
        &self,
        ctx: &CallContext,
        record_id: &RecordId,
        record_type: &RecordType,
    ) -> Result<f64> {
        self.gateway
            .get_json(
                ctx,
                "/rating",
                &[
                    ("id", record_id.to_string()),
                    ("type", record_type.to_string()),
                ],
            )
            .await
    }

    /// Write a rating for a record
    pub async fn put_rating(
        &self,
        ctx: &CallContext,
        record_id: &RecordId,
        record_type: &RecordType,
        rating: &Rating,
    ) -> Result<()> {
        self.gateway
            .send(
                ctx,
                Method::PUT,
                "/rating",
                &[
                    ("id", record_id.to_string()),
                    ("type", record_type.to_string()),
                    ("userId", rating.user_id.to_string()),
                    ("value", rating.value.to_string()),
                ],
            )
            .await
    }
}
