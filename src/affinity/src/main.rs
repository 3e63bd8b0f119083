//! Affinity: product recommendations from user-based collaborative filtering.
//!
//! Builds a seeded synthetic shop (users, products, ratings), loads it into
//! the recommendation service, and answers one query per invocation.

mod report;
mod synthetic;

use affinity_core::config::AppConfig;
use affinity_core::types::UserId;
use affinity_personalization::{Catalog, RecommendationResponse, RecommendationService};
use chrono::Utc;
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "affinity")]
#[command(about = "Product recommendations from user-based collaborative filtering")]
#[command(version)]
struct Cli {
    /// TOML config file (environment variables with the AFFINITY__ prefix win)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Number of synthetic users (overrides config)
    #[arg(long, global = true, env = "AFFINITY__DEMO__USERS")]
    users: Option<usize>,

    /// Seed for the synthetic data (overrides config)
    #[arg(long, global = true, env = "AFFINITY__DEMO__SEED")]
    seed: Option<u64>,

    /// Minimum similarity for a neighbor (overrides config)
    #[arg(long, global = true)]
    threshold: Option<f64>,

    /// Output format
    #[arg(long, global = true, value_enum, default_value_t = Format::Text)]
    format: Format,

    /// Emit logs as JSON
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Text,
    Json,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List all users
    Users,

    /// List all products by category
    Products,

    /// Show the ratings one user has given
    Ratings {
        #[arg(long)]
        user: UserId,
    },

    /// Recommend products for a user
    Recommend {
        #[arg(long)]
        user: UserId,

        /// Number of recommendations (default from config)
        #[arg(long)]
        count: Option<usize>,
    },

    /// Pearson similarity between two users
    Similarity { a: UserId, b: UserId },

    /// Users similar enough to count as neighbors
    Neighbors {
        #[arg(long)]
        user: UserId,
    },

    /// Totals, average rating, and distributions
    Stats,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.json_logs);

    // Without --config every option falls back to its default; a value that
    // is present but invalid (file or environment) is an error.
    let mut config = AppConfig::load(cli.config.as_deref())?;

    // Apply CLI overrides
    if let Some(users) = cli.users {
        config.demo.users = users;
    }
    if let Some(seed) = cli.seed {
        config.demo.seed = seed;
    }
    if let Some(threshold) = cli.threshold {
        config.recommender.similarity_threshold = threshold;
    }

    info!(
        users = config.demo.users,
        seed = config.demo.seed,
        threshold = config.recommender.similarity_threshold,
        "Configuration loaded"
    );

    let data = synthetic::generate(config.demo.users, config.demo.seed, Utc::now());
    let service = RecommendationService::new(
        config,
        Catalog::new(data.users, data.products),
        &data.ratings,
    )?;

    let format = cli.format;
    match cli.command {
        Commands::Users => cmd_users(&service, format),
        Commands::Products => cmd_products(&service, format),
        Commands::Ratings { user } => cmd_ratings(&service, user, format),
        Commands::Recommend { user, count } => cmd_recommend(&service, user, count, format),
        Commands::Similarity { a, b } => cmd_similarity(&service, a, b, format),
        Commands::Neighbors { user } => cmd_neighbors(&service, user, format),
        Commands::Stats => cmd_stats(&service, format),
    }
}

fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "affinity=info,affinity_personalization=info".into());
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

// ---------------------------------------------------------------------------
// Catalog commands
// ---------------------------------------------------------------------------

fn cmd_users(service: &RecommendationService, format: Format) -> anyhow::Result<()> {
    let snapshot = service.snapshot();
    let users: Vec<_> = snapshot.catalog().users().collect();
    if format == Format::Json {
        return print_json(&users);
    }

    println!("=== All Users ===");
    for user in users {
        println!("ID: {}, Name: {}, Email: {}", user.user_id, user.name, user.email);
    }
    Ok(())
}

fn cmd_products(service: &RecommendationService, format: Format) -> anyhow::Result<()> {
    let snapshot = service.snapshot();
    let products: Vec<_> = snapshot.catalog().products().collect();
    if format == Format::Json {
        return print_json(&products);
    }

    println!("=== All Products ===");
    let mut current_category = "";
    for product in products {
        if product.category != current_category {
            current_category = &product.category;
            println!();
            println!("--- {} ---", current_category);
        }
        println!(
            "ID: {}, Name: {}, Price: ${:.2}",
            product.product_id, product.name, product.price
        );
    }
    Ok(())
}

fn cmd_ratings(service: &RecommendationService, user_id: UserId, format: Format) -> anyhow::Result<()> {
    let rated = service.user_ratings(user_id)?;
    if format == Format::Json {
        return print_json(&rated);
    }

    let snapshot = service.snapshot();
    let name = snapshot.catalog().user(user_id).map(|u| u.name.as_str()).unwrap_or("?");
    println!("=== Ratings for {} ===", name);
    if rated.is_empty() {
        println!("No ratings found for this user.");
        return Ok(());
    }
    let scale = service.config().ratings.max_rating;
    for item in rated {
        let name = item.product.as_ref().map_or("<unknown>", |p| p.name.as_str());
        println!("Product: {}, Rating: {:.1}/{:.1}", name, item.value, scale);
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Recommendation commands
// ---------------------------------------------------------------------------

fn cmd_recommend(
    service: &RecommendationService,
    user_id: UserId,
    count: Option<usize>,
    format: Format,
) -> anyhow::Result<()> {
    let items = match count {
        Some(count) => service.get_recommendations(user_id, count)?,
        None => service.recommend_default(user_id)?,
    };
    if format == Format::Json {
        return print_json(&RecommendationResponse::new(user_id, items));
    }

    let snapshot = service.snapshot();
    let name = snapshot.catalog().user(user_id).map(|u| u.name.as_str()).unwrap_or("?");
    println!("=== Recommendations for {} ===", name);
    if items.is_empty() {
        println!("No recommendations available for this user.");
        return Ok(());
    }
    for (rank, rec) in items.iter().enumerate() {
        match &rec.product {
            Some(product) => {
                println!("{}. {} (Score: {:.2})", rank + 1, product.name, rec.score);
                println!("   Category: {}, Price: ${:.2}", product.category, product.price);
            }
            None => println!("{}. item {} (Score: {:.2})", rank + 1, rec.item_id, rec.score),
        }
        println!("   Algorithm: {}", rec.source);
        println!();
    }
    Ok(())
}

#[derive(Serialize)]
struct SimilarityOutput {
    user_a: UserId,
    user_b: UserId,
    similarity: f64,
    description: &'static str,
}

fn describe_similarity(similarity: f64) -> &'static str {
    if similarity > 0.7 {
        "These users have very similar preferences!"
    } else if similarity > 0.3 {
        "These users have somewhat similar preferences."
    } else {
        "These users have different preferences."
    }
}

fn cmd_similarity(
    service: &RecommendationService,
    a: UserId,
    b: UserId,
    format: Format,
) -> anyhow::Result<()> {
    let similarity = service.get_user_similarity(a, b)?;
    let output = SimilarityOutput {
        user_a: a,
        user_b: b,
        similarity,
        description: describe_similarity(similarity),
    };
    if format == Format::Json {
        return print_json(&output);
    }

    let snapshot = service.snapshot();
    let catalog = snapshot.catalog();
    let name = |id| catalog.user(id).map(|u| u.name.as_str()).unwrap_or("?");
    println!("=== User Similarity ===");
    println!("User 1: {}", name(a));
    println!("User 2: {}", name(b));
    println!("Similarity Score: {:.3}", output.similarity);
    println!("{}", output.description);
    Ok(())
}

fn cmd_neighbors(service: &RecommendationService, user_id: UserId, format: Format) -> anyhow::Result<()> {
    let neighbors = service.neighbors(user_id)?;
    if format == Format::Json {
        return print_json(&neighbors);
    }

    let snapshot = service.snapshot();
    let catalog = snapshot.catalog();
    println!(
        "=== Neighbors of user {} (threshold {:.2}) ===",
        user_id,
        service.config().recommender.similarity_threshold
    );
    if neighbors.is_empty() {
        println!("No users are similar enough.");
    }
    for neighbor in neighbors {
        let name = catalog
            .user(neighbor.user_id)
            .map(|u| u.name.as_str())
            .unwrap_or("?");
        println!("{:>4}  {:<12} {:+.3}", neighbor.user_id, name, neighbor.similarity);
    }
    Ok(())
}

fn cmd_stats(service: &RecommendationService, format: Format) -> anyhow::Result<()> {
    let stats = report::summarize(&service.snapshot());
    if format == Format::Json {
        return print_json(&stats);
    }

    let scale = service.config().ratings.max_rating;
    println!("=== System Statistics ===");
    println!("Total Users: {}", stats.total_users);
    println!("Total Products: {}", stats.total_products);
    println!("Total Ratings: {}", stats.total_ratings);
    println!("Average Rating: {:.2}/{:.1}", stats.average_rating, scale);
    println!();
    println!("Products by Category:");
    for (category, count) in &stats.products_by_category {
        println!("  {}: {} products", category, count);
    }
    println!();
    println!("Rating Distribution:");
    for (star, count) in &stats.rating_distribution {
        println!("  {} stars: {} ratings", star, count);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_similarity_bands() {
        assert_eq!(
            describe_similarity(0.95),
            "These users have very similar preferences!"
        );
        assert_eq!(
            describe_similarity(0.5),
            "These users have somewhat similar preferences."
        );
        assert_eq!(describe_similarity(0.3), "These users have different preferences.");
        assert_eq!(describe_similarity(-0.8), "These users have different preferences.");
    }

    #[test]
    fn test_cli_parses_subcommands() {
        let cli = Cli::try_parse_from(["affinity", "--seed", "7", "recommend", "--user", "3"]).unwrap();
        assert_eq!(cli.seed, Some(7));
        assert!(matches!(
            cli.command,
            Commands::Recommend { user: 3, count: None }
        ));

        let cli = Cli::try_parse_from(["affinity", "similarity", "1", "2", "--format", "json"]).unwrap();
        assert_eq!(cli.format, Format::Json);
        assert!(matches!(cli.command, Commands::Similarity { a: 1, b: 2 }));
    }
}
