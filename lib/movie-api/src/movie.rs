use crate::Metadata;
use serde::{Deserialize, Serialize};

/// Movie metadata together with its aggregated rating
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MovieDetails {
    /// Aggregated rating, absent when nobody has rated the movie yet
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    pub metadata: Metadata,
}
