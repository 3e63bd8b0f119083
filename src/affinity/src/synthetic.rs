//! Seeded synthetic shoppers, a fixed product catalog, and ratings biased by
//! per-user category affinities.

use affinity_core::types::{ItemId, Product, Rating, User, UserId};
use chrono::{DateTime, Duration, Utc};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

const FIRST_NAMES: [&str; 20] = [
    "Alice", "Bob", "Charlie", "Diana", "Eve", "Frank", "Grace", "Henry", "Ivy", "Jack", "Kate",
    "Liam", "Mia", "Noah", "Olivia", "Paul", "Quinn", "Ruby", "Sam", "Tina",
];

const CATALOG: [(&str, &str, f64, &str); 20] = [
    ("iPhone 15", "Electronics", 999.99, "Latest smartphone with advanced features"),
    ("MacBook Pro", "Electronics", 1999.99, "High-performance laptop for professionals"),
    ("AirPods Pro", "Electronics", 249.99, "Wireless earbuds with noise cancellation"),
    ("iPad Air", "Electronics", 599.99, "Versatile tablet for work and entertainment"),
    ("Samsung Galaxy S24", "Electronics", 899.99, "Android flagship smartphone"),
    ("The Great Gatsby", "Books", 12.99, "Classic American literature"),
    ("To Kill a Mockingbird", "Books", 14.99, "Timeless story of justice and morality"),
    ("1984", "Books", 13.99, "Dystopian novel by George Orwell"),
    ("Pride and Prejudice", "Books", 11.99, "Jane Austen's romantic masterpiece"),
    ("The Catcher in the Rye", "Books", 13.99, "Coming-of-age novel"),
    ("Nike Air Max", "Clothing", 129.99, "Comfortable running shoes"),
    ("Levi's 501 Jeans", "Clothing", 79.99, "Classic denim jeans"),
    ("Adidas Hoodie", "Clothing", 59.99, "Comfortable cotton hoodie"),
    ("Ray-Ban Sunglasses", "Clothing", 149.99, "Stylish sunglasses"),
    ("Patagonia Jacket", "Clothing", 199.99, "Outdoor adventure jacket"),
    ("Dyson Vacuum", "Home", 399.99, "Powerful cordless vacuum cleaner"),
    ("KitchenAid Mixer", "Home", 299.99, "Professional stand mixer"),
    ("Instant Pot", "Home", 89.99, "Multi-functional pressure cooker"),
    ("Philips Air Fryer", "Home", 149.99, "Healthy cooking appliance"),
    ("Roomba Robot Vacuum", "Home", 599.99, "Automated cleaning robot"),
];

const MIN_RATINGS_PER_USER: usize = 5;
const MAX_RATINGS_PER_USER: usize = 15;

pub struct SyntheticData {
    pub users: Vec<User>,
    pub products: Vec<Product>,
    pub ratings: Vec<Rating>,
}

pub fn generate(user_count: usize, seed: u64, now: DateTime<Utc>) -> SyntheticData {
    let mut rng = StdRng::seed_from_u64(seed);
    let users = generate_users(user_count, &mut rng);
    let products = products();
    let ratings = generate_ratings(&users, &products, &mut rng, now);
    SyntheticData {
        users,
        products,
        ratings,
    }
}

/// Users `1..=count`, named from a fixed list plus a zero-padded index.
pub fn generate_users(count: usize, rng: &mut impl Rng) -> Vec<User> {
    (1..=count as UserId)
        .map(|user_id| {
            let first = FIRST_NAMES[rng.gen_range(0..FIRST_NAMES.len())];
            let name = format!("{} {:02}", first, user_id);
            let email = format!("{}@email.com", name.to_lowercase().replace(' ', "."));
            User {
                user_id,
                name,
                email,
            }
        })
        .collect()
}

/// The fixed 20-product catalog, ids `1..=20`.
pub fn products() -> Vec<Product> {
    CATALOG
        .iter()
        .enumerate()
        .map(|(i, (name, category, price, description))| Product {
            product_id: i as ItemId + 1,
            name: name.to_string(),
            category: category.to_string(),
            price: *price,
            description: description.to_string(),
        })
        .collect()
}

/// Each user rates between 5 and 15 distinct products, timestamped within
/// the year before `now`.
pub fn generate_ratings(
    users: &[User],
    products: &[Product],
    rng: &mut impl Rng,
    now: DateTime<Utc>,
) -> Vec<Rating> {
    let year_ms = Duration::days(365).num_milliseconds();
    let mut ratings = Vec::new();

    for user in users {
        let wanted = rng
            .gen_range(MIN_RATINGS_PER_USER..=MAX_RATINGS_PER_USER)
            .min(products.len());
        let picked: Vec<&Product> = products.choose_multiple(rng, wanted).collect();
        for product in picked {
            let value = affinity_rating(user.user_id, &product.category, rng);
            let timestamp = now - Duration::milliseconds(rng.gen_range(0..year_ms));
            ratings.push(Rating::new(user.user_id, product.product_id, value, timestamp));
        }
    }

    ratings
}

/// Neutral 3.0, one star more in the user's favoured categories, plus
/// uniform noise in [-1, 1); clamped to [1, 5] and kept to one decimal.
fn affinity_rating(user_id: UserId, category: &str, rng: &mut impl Rng) -> f64 {
    let likes = match category {
        "Electronics" => user_id % 3 == 0,
        "Books" => user_id % 4 == 1,
        "Clothing" => user_id % 5 == 2,
        "Home" => user_id % 3 == 2,
        _ => false,
    };
    let base = if likes { 4.0 } else { 3.0 };
    let noisy = base + (rng.gen::<f64>() - 0.5) * 2.0;
    (noisy.clamp(1.0, 5.0) * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-01-01T00:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn test_counts_and_ids() {
        let data = generate(10, 1, now());
        assert_eq!(data.users.len(), 10);
        assert_eq!(data.products.len(), 20);
        assert_eq!(data.users[0].user_id, 1);
        assert_eq!(data.products[19].product_id, 20);
        assert!(data.users[0].name.ends_with(" 01"));
        assert!(data.users[0].email.ends_with(".01@email.com"));
    }

    #[test]
    fn test_each_user_rates_distinct_products() {
        let data = generate(30, 2, now());
        for user in &data.users {
            let items: Vec<ItemId> = data
                .ratings
                .iter()
                .filter(|r| r.user_id == user.user_id)
                .map(|r| r.item_id)
                .collect();
            let distinct: HashSet<_> = items.iter().collect();
            assert_eq!(distinct.len(), items.len());
            assert!((MIN_RATINGS_PER_USER..=MAX_RATINGS_PER_USER).contains(&items.len()));
        }
    }

    #[test]
    fn test_ratings_in_range_and_recent() {
        let data = generate(20, 3, now());
        let year_ago = now() - Duration::days(365);
        for rating in &data.ratings {
            assert!((1.0..=5.0).contains(&rating.value));
            assert!(rating.timestamp <= now() && rating.timestamp > year_ago);
        }
    }

    #[test]
    fn test_same_seed_same_data() {
        let a = generate(15, 99, now());
        let b = generate(15, 99, now());
        assert_eq!(a.users, b.users);
        assert_eq!(a.ratings, b.ratings);
    }

    #[test]
    fn test_category_affinity_shifts_ratings() {
        let mut rng = StdRng::seed_from_u64(5);
        // User 3 likes Electronics, user 1 does not.
        let fan: f64 = (0..500).map(|_| affinity_rating(3, "Electronics", &mut rng)).sum();
        let other: f64 = (0..500).map(|_| affinity_rating(1, "Electronics", &mut rng)).sum();
        assert!(fan / 500.0 > other / 500.0 + 0.5);
    }
}
