//! User-based collaborative filtering engine.
//!
//! A rating matrix feeds Pearson similarity and threshold neighborhoods,
//! which drive mean-centered recommendations behind a snapshot-swapping
//! service.

pub mod catalog;
pub mod neighborhood;
pub mod ratings;
pub mod recommendations;
pub mod service;
pub mod similarity;

pub use catalog::Catalog;
pub use neighborhood::{Neighbor, NeighborhoodSelector};
pub use ratings::RatingMatrix;
pub use recommendations::{RecommendationResponse, Recommender};
pub use service::{RatedItem, RecommendationService, Snapshot};
pub use similarity::{PearsonSimilarity, UserSimilarity};
