//! Cache types for catalog responses.

use super::types::{Category, Listing, Product};

/// Cache key for the category list.
pub const CATEGORIES_KEY: &str = "categories";

/// Cache key for the featured product list.
pub const FEATURED_KEY: &str = "products:featured";

/// Cache key for a single product.
pub fn product_key(slug: &str) -> String {
    format!("product:{slug}")
}

/// Cached value types.
#[derive(Debug, Clone)]
pub enum CacheValue {
    Categories(Vec<Category>),
    Products(Listing<Product>),
    Product(Box<Product>),
}
