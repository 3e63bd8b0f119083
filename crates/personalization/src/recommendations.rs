//! User-based collaborative filtering: mean-centered, similarity-weighted
//! aggregation of neighbor ratings, with a deterministic catalog fallback.

use affinity_core::config::RatingsConfig;
use affinity_core::error::{AffinityError, AffinityResult};
use affinity_core::types::{ItemId, Recommendation, RecommendationSource, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;
use uuid::Uuid;

use crate::catalog::Catalog;
use crate::neighborhood::{Neighbor, NeighborhoodSelector};
use crate::ratings::RatingMatrix;
use crate::similarity::UserSimilarity;

pub const MODEL_VERSION: &str = "user-cf-pearson-v1";

/// A recommendation list stamped for the presentation layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationResponse {
    pub request_id: Uuid,
    pub user_id: UserId,
    pub items: Vec<Recommendation>,
    pub generated_at: DateTime<Utc>,
    pub model_version: String,
}

impl RecommendationResponse {
    pub fn new(user_id: UserId, items: Vec<Recommendation>) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            user_id,
            items,
            generated_at: Utc::now(),
            model_version: MODEL_VERSION.to_string(),
        }
    }
}

pub struct Recommender<'a, S: UserSimilarity + ?Sized> {
    catalog: &'a Catalog,
    matrix: &'a RatingMatrix,
    similarity: &'a S,
    threshold: f64,
    bounds: &'a RatingsConfig,
}

impl<'a, S: UserSimilarity + ?Sized> Recommender<'a, S> {
    pub fn new(
        catalog: &'a Catalog,
        matrix: &'a RatingMatrix,
        similarity: &'a S,
        threshold: f64,
        bounds: &'a RatingsConfig,
    ) -> Self {
        Self {
            catalog,
            matrix,
            similarity,
            threshold,
            bounds,
        }
    }

    /// Up to `count` items the user has not rated, best first.
    ///
    /// Items are scored from the user's neighborhood when it yields at least
    /// one candidate; otherwise the catalog fallback is returned. Missing data
    /// never produces an error.
    pub fn recommend(&self, user_id: UserId, count: usize) -> AffinityResult<Vec<Recommendation>> {
        if count < 1 {
            return Err(AffinityError::InvalidArgument(
                "recommendation count must be at least 1".to_string(),
            ));
        }
        if !self.catalog.contains_user(user_id) {
            return Err(AffinityError::UnknownUser(user_id));
        }

        let neighbors = NeighborhoodSelector::new(self.similarity).neighbors(
            user_id,
            self.matrix.users(),
            self.threshold,
        )?;

        let mut scored = self.score_candidates(user_id, &neighbors);
        if scored.is_empty() {
            debug!(
                user_id,
                neighbors = neighbors.len(),
                "No collaborative candidates, using fallback ranking"
            );
            return Ok(self.fallback(user_id, count));
        }

        scored.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.0.cmp(&b.0))
        });
        scored.truncate(count);

        debug!(
            user_id,
            neighbors = neighbors.len(),
            returned = scored.len(),
            "Collaborative recommendations computed"
        );

        Ok(scored
            .into_iter()
            .map(|(item_id, prediction)| Recommendation {
                item_id,
                product: self.catalog.product(item_id).cloned(),
                score: self.bounds.clamp(prediction),
                source: RecommendationSource::CollaborativeFiltering,
            })
            .collect())
    }

    /// Predicted score for every item some neighbor rated and the user has
    /// not:
    ///
    /// `mean(user) + Σ sim(user,u)·(r_u(j) − mean(u)) / Σ |sim(user,u)|`
    ///
    /// Ranking uses this uncapped value; the emitted score is capped to the
    /// rating scale. Items whose weight sum is zero are dropped.
    fn score_candidates(&self, user_id: UserId, neighbors: &[Neighbor]) -> Vec<(ItemId, f64)> {
        let Some(user_mean) = self.matrix.mean_rating(user_id) else {
            return Vec::new();
        };

        // item -> (weighted deviation sum, weight sum)
        let mut sums: BTreeMap<ItemId, (f64, f64)> = BTreeMap::new();
        for neighbor in neighbors {
            let Some(neighbor_mean) = self.matrix.mean_rating(neighbor.user_id) else {
                continue;
            };
            for (item_id, rating) in self.matrix.user_ratings(neighbor.user_id) {
                if self.matrix.has_rated(user_id, item_id) {
                    continue;
                }
                let entry = sums.entry(item_id).or_insert((0.0, 0.0));
                entry.0 += neighbor.similarity * (rating - neighbor_mean);
                entry.1 += neighbor.similarity.abs();
            }
        }

        sums.into_iter()
            .filter(|(_, (_, weight))| *weight > 0.0)
            .map(|(item_id, (deviation, weight))| (item_id, user_mean + deviation / weight))
            .collect()
    }

    /// Unrated catalog products by name, then id, at the neutral score.
    fn fallback(&self, user_id: UserId, count: usize) -> Vec<Recommendation> {
        let neutral = self.bounds.neutral_score();
        self.catalog
            .products_by_name()
            .filter(|product| !self.matrix.has_rated(user_id, product.product_id))
            .take(count)
            .map(|product| Recommendation {
                item_id: product.product_id,
                product: Some(product.clone()),
                score: neutral,
                source: RecommendationSource::Fallback,
            })
            .collect()
    }
}
