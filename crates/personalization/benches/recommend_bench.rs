//! Benchmarks for recommendation latency on a synthetic rating set.
//! Run with: cargo bench -p affinity-personalization

use affinity_core::config::AppConfig;
use affinity_core::types::{Product, Rating, User};
use affinity_personalization::{Catalog, RecommendationService};
use chrono::Utc;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const USERS: u64 = 500;
const ITEMS: u64 = 200;

fn build_service(cache: bool) -> RecommendationService {
    let mut rng = StdRng::seed_from_u64(1);
    let users = (1..=USERS).map(|id| User {
        user_id: id,
        name: format!("bench-user-{}", id),
        email: format!("bench.{}@email.com", id),
    });
    let products = (1..=ITEMS).map(|id| Product {
        product_id: id,
        name: format!("product-{:04}", id),
        category: "Bench".to_string(),
        price: 1.0,
        description: String::new(),
    });
    let mut ratings = Vec::new();
    for user in 1..=USERS {
        for item in 1..=ITEMS {
            if rng.gen_bool(0.1) {
                let value = 1.0 + rng.gen_range(0..9) as f64 / 2.0;
                ratings.push(Rating::new(user, item, value, Utc::now()));
            }
        }
    }

    let mut config = AppConfig::default();
    config.recommender.cache_similarities = cache;
    RecommendationService::new(config, Catalog::new(users, products), &ratings)
        .expect("Failed to build service")
}

fn run(label: &str, service: &RecommendationService) {
    // Warmup
    for user in 1..=10 {
        service.get_recommendations(user, 10).unwrap();
    }

    let iterations = 200u32;
    let start = std::time::Instant::now();
    for i in 0..iterations {
        let user = (i as u64 % USERS) + 1;
        let _ = service.get_recommendations(user, 10).unwrap();
    }
    let elapsed = start.elapsed();

    println!("=== {} ===", label);
    println!("Iterations:  {}", iterations);
    println!("Total time:  {:?}", elapsed);
    println!("Per call:    {:?}", elapsed / iterations);
    println!(
        "Throughput:  {:.0} requests/sec",
        iterations as f64 / elapsed.as_secs_f64()
    );
}

fn main() {
    run("Recommend (similarity cache)", &build_service(true));
    run("Recommend (no cache)", &build_service(false));
}
