//! Veya CLI - Configuration checks and catalog inspection.
//!
//! # Usage
//!
//! ```bash
//! # Load the storefront configuration and ping the API
//! veya-cli check
//!
//! # List categories
//! veya-cli categories
//!
//! # List products, optionally filtered
//! veya-cli products --category skin --trending
//!
//! # List the products the backend features
//! veya-cli featured
//!
//! # Preview the home page B2G2 rail for a filter
//! veya-cli b2g2 "dry skin"
//! ```
//!
//! # Commands
//!
//! - `check` - Validate configuration and API reachability
//! - `categories` - List catalog categories
//! - `products` - List catalog products
//! - `featured` - List trending and bestselling products
//! - `b2g2` - Preview the Buy 2 Get 2 rail

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "veya-cli")]
#[command(author, version, about = "Veya CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load the storefront configuration and ping the API
    Check,
    /// List catalog categories
    Categories,
    /// List catalog products
    Products {
        /// Category slug
        #[arg(short, long)]
        category: Option<String>,

        /// Search term
        #[arg(short, long)]
        search: Option<String>,

        /// Only trending products
        #[arg(long)]
        trending: bool,

        /// Only bestsellers
        #[arg(long)]
        bestseller: bool,

        /// Page size
        #[arg(long, default_value_t = 20)]
        limit: u32,
    },
    /// List the products the backend features (trending or bestselling)
    Featured,
    /// Preview the Buy 2 Get 2 rail for a filter (e.g. "winter care", `dry-skin`)
    B2g2 {
        /// Filter label or slug
        filter: String,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), commands::CliError> {
    match cli.command {
        Commands::Check => commands::check::run().await?,
        Commands::Categories => commands::catalog::categories().await?,
        Commands::Products {
            category,
            search,
            trending,
            bestseller,
            limit,
        } => {
            let query = commands::catalog::product_query(category, search, trending, bestseller, limit);
            commands::catalog::products(&query).await?;
        }
        Commands::Featured => commands::catalog::featured().await?,
        Commands::B2g2 { filter } => commands::catalog::b2g2(&filter).await?,
    }
    Ok(())
}
