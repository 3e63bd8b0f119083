//! Sparse user → item → rating matrix, built once per snapshot.

use affinity_core::config::RatingsConfig;
use affinity_core::error::{AffinityError, AffinityResult};
use affinity_core::types::{ItemId, Rating, UserId};
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::{info, warn};

use crate::catalog::Catalog;

/// Immutable rating matrix. Rows and columns are kept ordered so every
/// reduction over them runs in the same order on every call.
#[derive(Debug, Clone, Default)]
pub struct RatingMatrix {
    rows: BTreeMap<UserId, BTreeMap<ItemId, f64>>,
    means: HashMap<UserId, f64>,
    item_count: usize,
    rating_count: usize,
    rejected: usize,
    superseded: usize,
}

impl RatingMatrix {
    /// Validate and index a batch of ratings.
    ///
    /// Each record must reference a catalog user and product and carry a
    /// finite value inside the configured bounds. With strict ingestion the
    /// first bad record fails the whole batch; otherwise it is logged and
    /// skipped. For a repeated `(user, item)` pair the latest timestamp wins,
    /// and on equal timestamps the later record does.
    pub fn build<'a>(
        ratings: impl IntoIterator<Item = &'a Rating>,
        catalog: &Catalog,
        policy: &RatingsConfig,
    ) -> AffinityResult<Self> {
        let mut latest: HashMap<(UserId, ItemId), (f64, DateTime<Utc>)> = HashMap::new();
        let mut rejected = 0usize;
        let mut superseded = 0usize;

        for rating in ratings {
            if let Err(err) = Self::check(rating, catalog, policy) {
                if policy.strict_ingestion {
                    return Err(err);
                }
                warn!(
                    user_id = rating.user_id,
                    item_id = rating.item_id,
                    value = rating.value,
                    error = %err,
                    "Rejected rating"
                );
                rejected += 1;
                continue;
            }

            let key = (rating.user_id, rating.item_id);
            match latest.get_mut(&key) {
                Some(existing) => {
                    superseded += 1;
                    if rating.timestamp >= existing.1 {
                        *existing = (rating.value, rating.timestamp);
                    }
                }
                None => {
                    latest.insert(key, (rating.value, rating.timestamp));
                }
            }
        }

        let mut rows: BTreeMap<UserId, BTreeMap<ItemId, f64>> = BTreeMap::new();
        let mut items = BTreeSet::new();
        for ((user_id, item_id), (value, _)) in &latest {
            rows.entry(*user_id).or_default().insert(*item_id, *value);
            items.insert(*item_id);
        }

        let means = rows
            .iter()
            .map(|(user_id, row)| (*user_id, row.values().sum::<f64>() / row.len() as f64))
            .collect();

        let matrix = Self {
            rows,
            means,
            item_count: items.len(),
            rating_count: latest.len(),
            rejected,
            superseded,
        };

        info!(
            users = matrix.rows.len(),
            items = matrix.item_count,
            ratings = matrix.rating_count,
            rejected,
            superseded,
            "Rating matrix built"
        );

        Ok(matrix)
    }

    fn check(rating: &Rating, catalog: &Catalog, policy: &RatingsConfig) -> AffinityResult<()> {
        if !catalog.contains_user(rating.user_id) {
            return Err(AffinityError::UnknownUser(rating.user_id));
        }
        if !catalog.contains_product(rating.item_id) {
            return Err(AffinityError::UnknownItem(rating.item_id));
        }
        if !policy.contains(rating.value) {
            return Err(AffinityError::InvalidRating {
                user_id: rating.user_id,
                item_id: rating.item_id,
                value: rating.value,
                min: policy.min_rating,
                max: policy.max_rating,
            });
        }
        Ok(())
    }

    pub fn rating(&self, user_id: UserId, item_id: ItemId) -> Option<f64> {
        self.rows.get(&user_id)?.get(&item_id).copied()
    }

    /// All ratings of one user, ascending by item id. Empty for a user
    /// without ratings.
    pub fn user_ratings(&self, user_id: UserId) -> impl Iterator<Item = (ItemId, f64)> + '_ {
        self.rows
            .get(&user_id)
            .into_iter()
            .flat_map(|row| row.iter().map(|(item, value)| (*item, *value)))
    }

    pub fn rated_items(&self, user_id: UserId) -> BTreeSet<ItemId> {
        self.user_ratings(user_id).map(|(item, _)| item).collect()
    }

    pub fn has_rated(&self, user_id: UserId, item_id: ItemId) -> bool {
        self.rating(user_id, item_id).is_some()
    }

    pub fn co_rated_items(&self, a: UserId, b: UserId) -> BTreeSet<ItemId> {
        self.co_ratings(a, b).into_iter().map(|(item, _, _)| item).collect()
    }

    /// `(item, rating of a, rating of b)` for every item both users rated,
    /// ascending by item id.
    pub fn co_ratings(&self, a: UserId, b: UserId) -> Vec<(ItemId, f64, f64)> {
        let (Some(row_a), Some(row_b)) = (self.rows.get(&a), self.rows.get(&b)) else {
            return Vec::new();
        };
        row_a
            .iter()
            .filter_map(|(item, ra)| row_b.get(item).map(|rb| (*item, *ra, *rb)))
            .collect()
    }

    /// Mean over all of the user's ratings.
    pub fn mean_rating(&self, user_id: UserId) -> Option<f64> {
        self.means.get(&user_id).copied()
    }

    /// Users with at least one rating, ascending.
    pub fn users(&self) -> impl Iterator<Item = UserId> + '_ {
        self.rows.keys().copied()
    }

    pub fn user_count(&self) -> usize {
        self.rows.len()
    }

    pub fn item_count(&self) -> usize {
        self.item_count
    }

    /// Number of distinct `(user, item)` ratings held.
    pub fn len(&self) -> usize {
        self.rating_count
    }

    pub fn is_empty(&self) -> bool {
        self.rating_count == 0
    }

    /// Records dropped at ingestion (lenient mode only).
    pub fn rejected(&self) -> usize {
        self.rejected
    }

    /// Records discarded because another rating for the same pair won.
    pub fn superseded(&self) -> usize {
        self.superseded
    }
}
