//! Catalog inspection commands.
//!
//! # Usage
//!
//! ```bash
//! veya-cli categories
//! veya-cli products --search serum --limit 5
//! veya-cli featured
//! veya-cli b2g2 winter-care
//! ```
//!
//! # Environment Variables
//!
//! - `VEYA_API_BASE_URL` - Veya REST API root (e.g. `http://localhost:8000/api`)

use veya_storefront::api::{Product, ProductQuery};
use veya_storefront::merchandising::{
    B2g2Filter, apply_b2g2_keywords, b2g2_query, match_category,
};

use super::{CliError, api_client};

/// List every category.
///
/// # Errors
///
/// Returns an error if the API cannot be reached.
pub async fn categories() -> Result<(), CliError> {
    let categories = api_client()?.list_categories().await?;

    #[allow(clippy::print_stdout)]
    {
        println!("{:>5}  {:<24}  {}", "ID", "SLUG", "NAME");
        for category in &categories {
            println!("{:>5}  {:<24}  {}", category.id, category.slug, category.name);
        }
        println!("{} categories", categories.len());
    }
    Ok(())
}

/// Build a product query from command-line flags.
#[must_use]
pub fn product_query(
    category: Option<String>,
    search: Option<String>,
    trending: bool,
    bestseller: bool,
    limit: u32,
) -> ProductQuery {
    ProductQuery {
        category,
        search,
        trending,
        bestseller,
        page_size: Some(limit.max(1)),
        ..ProductQuery::default()
    }
}

/// List products matching a query.
///
/// # Errors
///
/// Returns an error if the API cannot be reached.
pub async fn products(query: &ProductQuery) -> Result<(), CliError> {
    let listing = api_client()?.list_products(query).await?;
    let total = listing.total();

    print_products(&listing.items);
    #[allow(clippy::print_stdout)]
    {
        println!("{total} products found");
    }
    Ok(())
}

/// List the products the backend features.
///
/// # Errors
///
/// Returns an error if the API cannot be reached.
pub async fn featured() -> Result<(), CliError> {
    let products = api_client()?.featured_products().await?;

    print_products(&products);
    #[allow(clippy::print_stdout)]
    {
        println!("{} featured products", products.len());
    }
    Ok(())
}

/// Show which category and products a B2G2 filter picks.
///
/// # Errors
///
/// Returns an error for an unknown filter or if the API cannot be reached.
pub async fn b2g2(filter: &str) -> Result<(), CliError> {
    let filter: B2g2Filter = filter.parse().map_err(|()| {
        let valid = B2g2Filter::ALL.map(|f| f.slug()).join(", ");
        CliError::UnknownFilter(filter.to_string(), valid)
    })?;

    let client = api_client()?;
    let categories = client.list_categories().await?;
    let query = b2g2_query(filter, &categories);
    let listing = client.list_products(&query).await?;
    let picks = apply_b2g2_keywords(filter, listing.items);

    #[allow(clippy::print_stdout)]
    {
        println!("filter:   {}", filter.label());
        match match_category(filter, &categories) {
            Some(category) => println!("category: {} ({})", category.name, category.slug),
            None => println!("category: none matched"),
        }
        println!("query:    {:?}", query.to_pairs());
    }
    print_products(&picks);
    Ok(())
}

fn print_products(products: &[Product]) {
    #[allow(clippy::print_stdout)]
    {
        println!("{:>5}  {:<40}  {:<16}  {:>10}  FLAGS", "ID", "NAME", "CATEGORY", "PRICE");
        for product in products {
            println!(
                "{:>5}  {:<40}  {:<16}  {:>10}  {}",
                product.id,
                truncate(&product.name, 40),
                product.category_slug().unwrap_or("-"),
                product.selling_price().display(),
                flags(product)
            );
        }
    }
}

/// Short flag list, e.g. `trending,bestseller,20% off`.
fn flags(product: &Product) -> String {
    let mut flags = Vec::new();
    if product.is_trending {
        flags.push("trending".to_string());
    }
    if product.is_bestseller {
        flags.push("bestseller".to_string());
    }
    if product.is_new {
        flags.push("new".to_string());
    }
    if let Some(discount) = product.discount_badge() {
        flags.push(format!("{discount}% off"));
    }
    flags.join(",")
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(max.saturating_sub(1)).collect();
    cut.push('…');
    cut
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_product_query_from_flags() {
        let query = product_query(Some("skin".to_string()), None, true, false, 0);
        assert_eq!(query.category.as_deref(), Some("skin"));
        assert!(query.trending);
        assert!(!query.bestseller);
        assert_eq!(query.page_size, Some(1));
    }

    #[test]
    fn test_truncate_long_names() {
        assert_eq!(truncate("Rose Mist", 40), "Rose Mist");
        assert_eq!(truncate("Hyaluronic Dew Serum", 10), "Hyaluroni…");
    }
}
