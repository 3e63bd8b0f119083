//! System statistics over a snapshot.

use affinity_personalization::Snapshot;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Serialize)]
pub struct SystemStats {
    pub total_users: usize,
    pub total_products: usize,
    pub total_ratings: usize,
    pub average_rating: f64,
    pub products_by_category: BTreeMap<String, usize>,
    /// Ratings bucketed by whole star, 1 through 5.
    pub rating_distribution: BTreeMap<u8, usize>,
}

pub fn summarize(snapshot: &Snapshot) -> SystemStats {
    let catalog = snapshot.catalog();
    let matrix = snapshot.matrix();

    let mut products_by_category = BTreeMap::new();
    for product in catalog.products() {
        *products_by_category
            .entry(product.category.clone())
            .or_insert(0) += 1;
    }

    let mut rating_distribution: BTreeMap<u8, usize> = (1..=5).map(|star| (star, 0)).collect();
    let mut sum = 0.0;
    let mut count = 0usize;
    for user in matrix.users() {
        for (_, value) in matrix.user_ratings(user) {
            let star = value.floor().clamp(1.0, 5.0) as u8;
            *rating_distribution.entry(star).or_insert(0) += 1;
            sum += value;
            count += 1;
        }
    }

    SystemStats {
        total_users: catalog.user_count(),
        total_products: catalog.product_count(),
        total_ratings: count,
        average_rating: if count == 0 { 0.0 } else { sum / count as f64 },
        products_by_category,
        rating_distribution,
    }
}
