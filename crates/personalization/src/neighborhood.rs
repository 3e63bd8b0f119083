//! Threshold neighborhood: every user at least `threshold`-similar to the
//! target.

use affinity_core::error::{AffinityError, AffinityResult};
use affinity_core::types::UserId;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use tracing::debug;

use crate::similarity::UserSimilarity;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Neighbor {
    pub user_id: UserId,
    pub similarity: f64,
}

pub struct NeighborhoodSelector<'a, S: UserSimilarity + ?Sized> {
    similarity: &'a S,
}

impl<'a, S: UserSimilarity + ?Sized> NeighborhoodSelector<'a, S> {
    pub fn new(similarity: &'a S) -> Self {
        Self { similarity }
    }

    /// Neighbors of `target` among `candidates`, most similar first, ties by
    /// ascending user id. Pairs with undefined similarity never qualify, and
    /// `target` is never its own neighbor.
    pub fn neighbors(
        &self,
        target: UserId,
        candidates: impl IntoIterator<Item = UserId>,
        threshold: f64,
    ) -> AffinityResult<Vec<Neighbor>> {
        validate_threshold(threshold)?;

        let mut neighbors: Vec<Neighbor> = candidates
            .into_iter()
            .filter(|user_id| *user_id != target)
            .filter_map(|user_id| {
                let similarity = self.similarity.similarity(target, user_id)?;
                (similarity >= threshold).then_some(Neighbor {
                    user_id,
                    similarity,
                })
            })
            .collect();

        neighbors.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.user_id.cmp(&b.user_id))
        });
        neighbors.dedup_by_key(|n| n.user_id);

        debug!(target_user = target, threshold, count = neighbors.len(), "Neighborhood selected");
        Ok(neighbors)
    }
}

pub fn validate_threshold(threshold: f64) -> AffinityResult<()> {
    if threshold.is_finite() && (-1.0..=1.0).contains(&threshold) {
        Ok(())
    } else {
        Err(AffinityError::InvalidArgument(format!(
            "similarity threshold must lie in [-1, 1], got {}",
            threshold
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    /// Fixed similarity table for exercising the selection policy alone.
    struct Table(HashMap<(UserId, UserId), f64>);

    impl Table {
        fn new(pairs: &[(UserId, UserId, f64)]) -> Self {
            let mut map = HashMap::new();
            for (a, b, s) in pairs {
                map.insert((*a, *b), *s);
                map.insert((*b, *a), *s);
            }
            Self(map)
        }
    }

    impl UserSimilarity for Table {
        fn similarity(&self, a: UserId, b: UserId) -> Option<f64> {
            self.0.get(&(a, b)).copied()
        }
    }

    #[test]
    fn test_filters_sorts_and_excludes_target() {
        let table = Table::new(&[(1, 1, 1.0), (1, 2, 0.4), (1, 3, 0.9), (1, 4, 0.05), (1, 5, -0.7)]);
        let selector = NeighborhoodSelector::new(&table);
        let neighbors = selector.neighbors(1, 1..=6, 0.1).unwrap();
        let ids: Vec<UserId> = neighbors.iter().map(|n| n.user_id).collect();
        // 6 has no defined similarity, 1 is the target.
        assert_eq!(ids, vec![3, 2]);
        assert_eq!(neighbors[0].similarity, 0.9);
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let table = Table::new(&[(1, 2, 0.1)]);
        let selector = NeighborhoodSelector::new(&table);
        assert_eq!(selector.neighbors(1, [2], 0.1).unwrap().len(), 1);
    }

    #[test]
    fn test_ties_break_on_user_id() {
        let table = Table::new(&[(1, 9, 0.5), (1, 4, 0.5), (1, 7, 0.5)]);
        let selector = NeighborhoodSelector::new(&table);
        let ids: Vec<UserId> = selector
            .neighbors(1, [9, 7, 4], 0.0)
            .unwrap()
            .iter()
            .map(|n| n.user_id)
            .collect();
        assert_eq!(ids, vec![4, 7, 9]);
    }

    #[test]
    fn test_empty_is_not_an_error() {
        let table = Table::new(&[(1, 2, -0.3)]);
        let selector = NeighborhoodSelector::new(&table);
        assert!(selector.neighbors(1, [2], 0.1).unwrap().is_empty());
    }

    #[test]
    fn test_rejects_bad_threshold() {
        let table = Table::new(&[]);
        let selector = NeighborhoodSelector::new(&table);
        for threshold in [1.5, -1.01, f64::NAN, f64::INFINITY] {
            let err = selector.neighbors(1, [2], threshold).unwrap_err();
            assert!(matches!(err, AffinityError::InvalidArgument(_)));
        }
    }

    #[test]
    fn test_raising_threshold_never_grows_the_set() {
        let table = Table::new(&[(1, 2, 0.2), (1, 3, 0.5), (1, 4, 0.8), (1, 5, -0.1)]);
        let selector = NeighborhoodSelector::new(&table);
        let mut previous = usize::MAX;
        for step in 0..20 {
            let threshold = -1.0 + step as f64 * 0.1;
            let size = selector.neighbors(1, 1..=5, threshold).unwrap().len();
            assert!(size <= previous);
            previous = size;
        }
    }
}
