use serde::Deserialize;
use std::path::Path;

use crate::error::{AffinityError, AffinityResult};

/// Root application configuration. Loaded from an optional TOML file, then
/// environment variables with the prefix `AFFINITY__` layered on top.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub recommender: RecommenderConfig,
    #[serde(default)]
    pub ratings: RatingsConfig,
    #[serde(default)]
    pub demo: DemoConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RecommenderConfig {
    /// Minimum similarity for a user to be admitted as a neighbor.
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f64,
    #[serde(default = "default_recommendation_count")]
    pub default_recommendation_count: usize,
    #[serde(default = "default_cache_similarities")]
    pub cache_similarities: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RatingsConfig {
    #[serde(default = "default_min_rating")]
    pub min_rating: f64,
    #[serde(default = "default_max_rating")]
    pub max_rating: f64,
    /// Abort a whole ingestion batch on the first bad record instead of
    /// skipping it.
    #[serde(default)]
    pub strict_ingestion: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DemoConfig {
    #[serde(default = "default_demo_users")]
    pub users: usize,
    #[serde(default = "default_demo_seed")]
    pub seed: u64,
}

// Default functions
fn default_similarity_threshold() -> f64 {
    0.1
}
fn default_recommendation_count() -> usize {
    5
}
fn default_cache_similarities() -> bool {
    true
}
fn default_min_rating() -> f64 {
    1.0
}
fn default_max_rating() -> f64 {
    5.0
}
fn default_demo_users() -> usize {
    20
}
fn default_demo_seed() -> u64 {
    42
}

impl Default for RecommenderConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: default_similarity_threshold(),
            default_recommendation_count: default_recommendation_count(),
            cache_similarities: default_cache_similarities(),
        }
    }
}

impl Default for RatingsConfig {
    fn default() -> Self {
        Self {
            min_rating: default_min_rating(),
            max_rating: default_max_rating(),
            strict_ingestion: false,
        }
    }
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            users: default_demo_users(),
            seed: default_demo_seed(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            recommender: RecommenderConfig::default(),
            ratings: RatingsConfig::default(),
            demo: DemoConfig::default(),
        }
    }
}

impl RatingsConfig {
    pub fn contains(&self, value: f64) -> bool {
        value.is_finite() && value >= self.min_rating && value <= self.max_rating
    }

    /// Score given to items that were not predicted, halfway up the scale.
    pub fn neutral_score(&self) -> f64 {
        (self.min_rating + self.max_rating) / 2.0
    }

    pub fn clamp(&self, value: f64) -> f64 {
        value.clamp(self.min_rating, self.max_rating)
    }
}

impl AppConfig {
    /// Load configuration from an optional config file and environment
    /// variables, then validate it.
    pub fn load(path: Option<&Path>) -> AffinityResult<Self> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }
        builder = builder.add_source(
            config::Environment::with_prefix("AFFINITY")
                .separator("__")
                .try_parsing(true),
        );
        Self::from_builder(builder)
    }

    fn from_builder(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> AffinityResult<Self> {
        let config: AppConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> AffinityResult<()> {
        let ratings = &self.ratings;
        if !ratings.min_rating.is_finite() || !ratings.max_rating.is_finite() {
            return Err(AffinityError::Config(
                "rating bounds must be finite".to_string(),
            ));
        }
        if ratings.min_rating >= ratings.max_rating {
            return Err(AffinityError::Config(format!(
                "min_rating ({}) must be below max_rating ({})",
                ratings.min_rating, ratings.max_rating
            )));
        }
        let threshold = self.recommender.similarity_threshold;
        if !threshold.is_finite() || !(-1.0..=1.0).contains(&threshold) {
            return Err(AffinityError::Config(format!(
                "similarity_threshold ({}) must lie in [-1, 1]",
                threshold
            )));
        }
        if self.recommender.default_recommendation_count == 0 {
            return Err(AffinityError::Config(
                "default_recommendation_count must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
