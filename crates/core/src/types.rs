use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

pub type UserId = u64;
pub type ItemId = u64;

/// A shopper known to the user catalog. Name and email are display-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub user_id: UserId,
    pub name: String,
    pub email: String,
}

/// A product in the item catalog. Everything except the id is display data;
/// the engine only looks at `name` to order fallback results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub product_id: ItemId,
    pub name: String,
    pub category: String,
    pub price: f64,
    pub description: String,
}

/// One explicit preference signal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rating {
    pub user_id: UserId,
    pub item_id: ItemId,
    pub value: f64,
    pub timestamp: DateTime<Utc>,
}

impl Rating {
    pub fn new(user_id: UserId, item_id: ItemId, value: f64, timestamp: DateTime<Utc>) -> Self {
        Self {
            user_id,
            item_id,
            value,
            timestamp,
        }
    }
}

/// Which branch of the recommender produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RecommendationSource {
    CollaborativeFiltering,
    Fallback,
}

impl RecommendationSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecommendationSource::CollaborativeFiltering => "collaborative-filtering",
            RecommendationSource::Fallback => "fallback",
        }
    }
}

impl fmt::Display for RecommendationSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A scored item for one user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub item_id: ItemId,
    /// Catalog entry for display; absent only if the catalog lost the item.
    pub product: Option<Product>,
    pub score: f64,
    pub source: RecommendationSource,
}
