//! Movie details aggregation over the metadata and rating gateways

use discovery_gateway::{CallContext, MetadataGateway, RatingGateway, Result};
use movie_api::{MovieDetails, RecordId, RecordType};
use tracing::debug;

pub struct MovieController {
    metadata: MetadataGateway,
    rating: RatingGateway,
}

impl MovieController {
    pub fn new(metadata: MetadataGateway, rating: RatingGateway) -> Self {
        Self { metadata, rating }
    }

    /// Movie metadata with its aggregated rating.
    ///
    /// A movie nobody has rated yet is returned without a rating.
    pub async fn get(&self, ctx: &CallContext, id: &str) -> Result<MovieDetails> {
        let metadata = self.metadata.get(ctx, id).await?;

        let rating = match self
            .rating
            .get_aggregated_rating(ctx, &RecordId::new(id), &RecordType::movie())
            .await
        {
            Ok(rating) => Some(rating),
            Err(e) if e.is_not_found() => {
                debug!("No rating for movie {}", id);
                None
            }
            Err(e) => return Err(e),
        };

        Ok(MovieDetails { rating, metadata })
    }
}
