//! Recommendation service. Owns the current snapshot (catalog, rating
//! matrix, similarity cache) and serves requests against it.
//!
//! Requests clone the snapshot `Arc` and run without holding any lock. A
//! rebuild constructs the next snapshot off to the side and swaps it in, so
//! in-flight requests finish on the snapshot they started with.

use affinity_core::config::AppConfig;
use affinity_core::error::{AffinityError, AffinityResult};
use affinity_core::types::{ItemId, Product, Rating, Recommendation, UserId};
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use crate::catalog::Catalog;
use crate::neighborhood::{Neighbor, NeighborhoodSelector};
use crate::ratings::RatingMatrix;
use crate::recommendations::Recommender;
use crate::similarity::{PearsonSimilarity, UserSimilarity};

/// One of a user's own ratings, joined with catalog data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatedItem {
    pub item_id: ItemId,
    pub product: Option<Product>,
    pub value: f64,
}

/// Immutable state every request reads from.
pub struct Snapshot {
    generation: u64,
    catalog: Arc<Catalog>,
    matrix: Arc<RatingMatrix>,
    similarity: PearsonSimilarity,
}

impl Snapshot {
    fn build(
        generation: u64,
        catalog: Arc<Catalog>,
        ratings: &[Rating],
        config: &AppConfig,
    ) -> AffinityResult<Self> {
        let matrix = Arc::new(RatingMatrix::build(ratings, &catalog, &config.ratings)?);
        let similarity = PearsonSimilarity::new(matrix.clone(), config.recommender.cache_similarities);
        Ok(Self {
            generation,
            catalog,
            matrix,
            similarity,
        })
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn matrix(&self) -> &RatingMatrix {
        &self.matrix
    }

    pub fn similarity_model(&self) -> &PearsonSimilarity {
        &self.similarity
    }

    fn require_user(&self, user_id: UserId) -> AffinityResult<()> {
        if self.catalog.contains_user(user_id) {
            Ok(())
        } else {
            Err(AffinityError::UnknownUser(user_id))
        }
    }

    pub fn recommend(
        &self,
        user_id: UserId,
        count: usize,
        config: &AppConfig,
    ) -> AffinityResult<Vec<Recommendation>> {
        Recommender::new(
            &self.catalog,
            &self.matrix,
            &self.similarity,
            config.recommender.similarity_threshold,
            &config.ratings,
        )
        .recommend(user_id, count)
    }

    /// Pearson similarity, with an undefined value reported as `0.0`.
    pub fn user_similarity(&self, a: UserId, b: UserId) -> AffinityResult<f64> {
        self.require_user(a)?;
        self.require_user(b)?;
        Ok(self.similarity.similarity(a, b).unwrap_or(0.0))
    }

    pub fn neighbors(&self, user_id: UserId, threshold: f64) -> AffinityResult<Vec<Neighbor>> {
        self.require_user(user_id)?;
        NeighborhoodSelector::new(&self.similarity).neighbors(
            user_id,
            self.matrix.users(),
            threshold,
        )
    }

    pub fn user_ratings(&self, user_id: UserId) -> AffinityResult<Vec<RatedItem>> {
        self.require_user(user_id)?;
        Ok(self
            .matrix
            .user_ratings(user_id)
            .map(|(item_id, value)| RatedItem {
                item_id,
                product: self.catalog.product(item_id).cloned(),
                value,
            })
            .collect())
    }
}

pub struct RecommendationService {
    config: AppConfig,
    current: RwLock<Arc<Snapshot>>,
    /// Serializes rebuilds; readers never touch it.
    rebuild: Mutex<()>,
}

impl RecommendationService {
    pub fn new(config: AppConfig, catalog: Catalog, ratings: &[Rating]) -> AffinityResult<Self> {
        config.validate()?;
        let snapshot = Snapshot::build(1, Arc::new(catalog), ratings, &config)?;
        info!(
            generation = 1,
            users = snapshot.catalog.user_count(),
            products = snapshot.catalog.product_count(),
            ratings = snapshot.matrix.len(),
            "Recommendation service initialized"
        );
        Ok(Self {
            config,
            current: RwLock::new(Arc::new(snapshot)),
            rebuild: Mutex::new(()),
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// The snapshot requests are currently served from.
    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.current.read().clone()
    }

    pub fn generation(&self) -> u64 {
        self.current.read().generation
    }

    /// Rebuild the matrix from a new rating collection, keeping the catalog.
    /// Returns the new generation.
    pub fn rebuild(&self, ratings: &[Rating]) -> AffinityResult<u64> {
        let _guard = self.rebuild.lock();
        let catalog = self.snapshot().catalog.clone();
        self.install(catalog, ratings)
    }

    /// Replace both the catalog and the rating collection.
    pub fn replace(&self, catalog: Catalog, ratings: &[Rating]) -> AffinityResult<u64> {
        let _guard = self.rebuild.lock();
        self.install(Arc::new(catalog), ratings)
    }

    fn install(&self, catalog: Arc<Catalog>, ratings: &[Rating]) -> AffinityResult<u64> {
        let generation = self.generation() + 1;
        let next = Arc::new(Snapshot::build(generation, catalog, ratings, &self.config)?);
        let ratings_held = next.matrix.len();
        *self.current.write() = next;
        info!(generation, ratings = ratings_held, "Snapshot swapped in");
        Ok(generation)
    }

    pub fn get_recommendations(
        &self,
        user_id: UserId,
        count: usize,
    ) -> AffinityResult<Vec<Recommendation>> {
        self.snapshot().recommend(user_id, count, &self.config)
    }

    /// Recommendations using `default_recommendation_count`.
    pub fn recommend_default(&self, user_id: UserId) -> AffinityResult<Vec<Recommendation>> {
        self.get_recommendations(user_id, self.config.recommender.default_recommendation_count)
    }

    pub fn get_user_similarity(&self, a: UserId, b: UserId) -> AffinityResult<f64> {
        self.snapshot().user_similarity(a, b)
    }

    /// Neighborhood at the configured threshold.
    pub fn neighbors(&self, user_id: UserId) -> AffinityResult<Vec<Neighbor>> {
        self.neighbors_at(user_id, self.config.recommender.similarity_threshold)
    }

    pub fn neighbors_at(&self, user_id: UserId, threshold: f64) -> AffinityResult<Vec<Neighbor>> {
        self.snapshot().neighbors(user_id, threshold)
    }

    pub fn user_ratings(&self, user_id: UserId) -> AffinityResult<Vec<RatedItem>> {
        self.snapshot().user_ratings(user_id)
    }
}
