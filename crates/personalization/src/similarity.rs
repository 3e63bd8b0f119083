//! Pearson correlation between users over their co-rated items.

use affinity_core::types::{ItemId, UserId};
use dashmap::DashMap;
use std::sync::Arc;

use crate::ratings::RatingMatrix;

/// Sums of squared deviations at or below this count as zero variance.
const VARIANCE_EPSILON: f64 = 1e-12;
/// Two constant rating vectors agree when their levels differ by less than this.
const AGREEMENT_EPSILON: f64 = 1e-9;

/// Pairwise user similarity. `None` means the pair has no defined value.
pub trait UserSimilarity: Send + Sync {
    fn similarity(&self, a: UserId, b: UserId) -> Option<f64>;
}

/// Pearson similarity over one rating matrix, with an optional per-pair
/// cache. The cache lives and dies with the model, so a model built for a
/// new matrix starts empty.
pub struct PearsonSimilarity {
    matrix: Arc<RatingMatrix>,
    cache: Option<DashMap<(UserId, UserId), Option<f64>>>,
}

impl PearsonSimilarity {
    pub fn new(matrix: Arc<RatingMatrix>, cache_enabled: bool) -> Self {
        Self {
            matrix,
            cache: cache_enabled.then(DashMap::new),
        }
    }

    pub fn matrix(&self) -> &Arc<RatingMatrix> {
        &self.matrix
    }

    /// Number of user pairs with a memoized result.
    pub fn cached_pairs(&self) -> usize {
        self.cache.as_ref().map_or(0, |c| c.len())
    }
}

impl UserSimilarity for PearsonSimilarity {
    fn similarity(&self, a: UserId, b: UserId) -> Option<f64> {
        let key = if a <= b { (a, b) } else { (b, a) };
        if let Some(cache) = &self.cache {
            if let Some(hit) = cache.get(&key) {
                return *hit;
            }
        }

        let value = pearson(&self.matrix.co_ratings(key.0, key.1));

        if let Some(cache) = &self.cache {
            cache.insert(key, value);
        }
        value
    }
}

/// Pearson correlation of `(item, x, y)` triples.
///
/// Undefined for fewer than two items, and when either side has no variance,
/// except that two constant vectors at the same level count as perfectly
/// correlated (`1.0`).
pub fn pearson(co_ratings: &[(ItemId, f64, f64)]) -> Option<f64> {
    if co_ratings.len() < 2 {
        return None;
    }

    let n = co_ratings.len() as f64;
    let mean_a = co_ratings.iter().map(|(_, a, _)| a).sum::<f64>() / n;
    let mean_b = co_ratings.iter().map(|(_, _, b)| b).sum::<f64>() / n;

    let mut cov = 0.0;
    let mut var_a = 0.0;
    let mut var_b = 0.0;
    for (_, a, b) in co_ratings {
        let da = a - mean_a;
        let db = b - mean_b;
        cov += da * db;
        var_a += da * da;
        var_b += db * db;
    }

    let flat_a = var_a <= VARIANCE_EPSILON;
    let flat_b = var_b <= VARIANCE_EPSILON;
    if flat_a || flat_b {
        let agree = co_ratings
            .iter()
            .all(|(_, a, b)| (a - b).abs() < AGREEMENT_EPSILON);
        return (flat_a && flat_b && agree).then_some(1.0);
    }

    Some((cov / (var_a * var_b).sqrt()).clamp(-1.0, 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triples(a: &[f64], b: &[f64]) -> Vec<(ItemId, f64, f64)> {
        a.iter()
            .zip(b)
            .enumerate()
            .map(|(i, (x, y))| (i as ItemId, *x, *y))
            .collect()
    }

    #[test]
    fn test_perfect_positive() {
        let sim = pearson(&triples(&[5.0, 3.0], &[4.0, 2.0])).unwrap();
        assert!((sim - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_perfect_negative() {
        let sim = pearson(&triples(&[5.0, 3.0], &[1.0, 5.0])).unwrap();
        assert!((sim + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_known_value() {
        // x = [1,2,3,4], y = [2,1,4,3]: cov = 3, var_x = var_y = 5 → 0.6
        let sim = pearson(&triples(&[1.0, 2.0, 3.0, 4.0], &[2.0, 1.0, 4.0, 3.0])).unwrap();
        assert!((sim - 0.6).abs() < 1e-12);
    }

    #[test]
    fn test_single_item_is_undefined() {
        assert_eq!(pearson(&triples(&[4.0], &[4.0])), None);
        assert_eq!(pearson(&[]), None);
    }

    #[test]
    fn test_one_flat_side_is_undefined() {
        assert_eq!(pearson(&triples(&[3.0, 3.0, 3.0], &[1.0, 4.0, 5.0])), None);
        assert_eq!(pearson(&triples(&[1.0, 4.0, 5.0], &[2.0, 2.0, 2.0])), None);
    }

    #[test]
    fn test_both_flat_and_equal_is_one() {
        assert_eq!(pearson(&triples(&[4.0, 4.0, 4.0], &[4.0, 4.0, 4.0])), Some(1.0));
        // Drift from a repeating decimal mean must not break the flat check.
        assert_eq!(pearson(&triples(&[3.3, 3.3, 3.3], &[3.3, 3.3, 3.3])), Some(1.0));
    }

    #[test]
    fn test_both_flat_but_different_levels_is_undefined() {
        assert_eq!(pearson(&triples(&[4.0, 4.0], &[2.0, 2.0])), None);
    }

    #[test]
    fn test_result_is_clamped() {
        let sim = pearson(&triples(&[1.1, 2.2, 3.3], &[2.2, 4.4, 6.6])).unwrap();
        assert!(sim <= 1.0 && sim >= -1.0);
    }

    #[test]
    fn test_argument_order_is_irrelevant() {
        let xs = [1.0, 2.5, 4.0, 3.5, 5.0];
        let ys = [2.0, 2.0, 3.5, 1.0, 4.5];
        let ab = pearson(&triples(&xs, &ys)).unwrap();
        let ba = pearson(&triples(&ys, &xs)).unwrap();
        assert!((ab - ba).abs() < 1e-12);
    }
}
