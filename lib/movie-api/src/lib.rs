//! Movie application wire types
//!
//! This library defines the payloads exchanged between services:
//! - Metadata: descriptive record of a movie, owned by the metadata service
//! - Rating: a single user rating, owned by the rating service
//! - MovieDetails: the aggregate served by the movie service

pub mod metadata;
pub mod rating;
pub mod movie;

pub use metadata::Metadata;
pub use rating::{Rating, RatingValue, RecordId, RecordType, UserId};
pub use movie::MovieDetails;

/// Logical name the metadata service registers under
pub const METADATA_SERVICE: &str = "metadata";
/// Logical name the rating service registers under
pub const RATING_SERVICE: &str = "rating";
/// Logical name the movie service registers under
pub const MOVIE_SERVICE: &str = "movie";
