//! Product route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::instrument;

use veya_core::SkinType;

use crate::api::{ApiError, Category, Product, ProductQuery};
use crate::error::{AppError, Result};
use crate::filters;
use crate::merchandising::card_width;
use crate::routes::context::PageContext;
use crate::state::AppState;

/// Image shown when a product has none.
pub const PLACEHOLDER_IMAGE: &str = "/static/images/placeholder.svg";

/// Rating shown for products nobody has rated yet.
const DEFAULT_RATING: &str = "4.3";

/// Description shown for products without one.
const NO_DESCRIPTION: &str = "No description available.";

/// Similar products shown under a product.
const SIMILAR_PRODUCTS: usize = 4;

// =============================================================================
// Views
// =============================================================================

/// Product card display data for rails and grids.
#[derive(Clone, Debug)]
pub struct ProductCardView {
    pub id: i32,
    pub slug: String,
    pub name: String,
    pub image_url: String,
    pub price: String,
    /// Struck-through list price, when discounted.
    pub list_price: Option<String>,
    /// Whole-number discount percentage for the `N% OFF` badge.
    pub discount: Option<i64>,
    pub is_trending: bool,
    pub is_bestseller: bool,
    pub is_new: bool,
    pub category_name: Option<String>,
    pub rating: String,
    pub review_count: i64,
    /// Card width in pixels when shown in a horizontal rail.
    pub width: u32,
}

impl ProductCardView {
    /// Card for the product at `index` of a rail.
    #[must_use]
    pub fn at(product: &Product, index: usize) -> Self {
        Self {
            id: product.id.as_i32(),
            slug: product.slug.clone(),
            name: product.name.clone(),
            image_url: image_url(product),
            price: product.selling_price().display(),
            list_price: product
                .is_discounted()
                .then(|| product.list_price().display()),
            discount: product.discount_badge(),
            is_trending: product.is_trending,
            is_bestseller: product.is_bestseller,
            is_new: product.is_new,
            category_name: product
                .category
                .as_ref()
                .map(|c| c.name.clone())
                .filter(|name| !name.is_empty()),
            rating: format_rating(product.rating),
            review_count: product.review_count,
            width: card_width(&product.name, index),
        }
    }
}

impl From<&Product> for ProductCardView {
    fn from(product: &Product) -> Self {
        Self::at(product, 0)
    }
}

/// Cards for a rail, each sized by its position.
#[must_use]
pub fn product_cards(products: &[Product]) -> Vec<ProductCardView> {
    products
        .iter()
        .enumerate()
        .map(|(index, product)| ProductCardView::at(product, index))
        .collect()
}

/// Product detail display data.
#[derive(Clone, Debug)]
pub struct ProductDetailView {
    pub card: ProductCardView,
    pub description: String,
    pub skin_type: Option<&'static str>,
    pub category_slug: Option<String>,
    pub in_stock: bool,
    pub tags: Vec<String>,
}

impl From<&Product> for ProductDetailView {
    fn from(product: &Product) -> Self {
        let description = product.description_text().trim();
        Self {
            card: ProductCardView::from(product),
            description: if description.is_empty() {
                NO_DESCRIPTION.to_string()
            } else {
                description.to_string()
            },
            skin_type: product.skin_type().map(|s| s.label()),
            category_slug: product.category_slug().map(ToString::to_string),
            in_stock: product.stock > 0,
            tags: product.tags.clone(),
        }
    }
}

/// Category option for the listing sidebar.
#[derive(Clone, Debug)]
pub struct CategoryOption {
    pub slug: String,
    pub name: String,
    pub selected: bool,
}

/// Skin type option for the listing sidebar.
#[derive(Clone, Debug)]
pub struct SkinTypeOption {
    pub value: &'static str,
    pub label: &'static str,
    pub selected: bool,
}

fn image_url(product: &Product) -> String {
    product
        .image
        .as_deref()
        .map(str::trim)
        .filter(|url| !url.is_empty())
        .map_or_else(|| PLACEHOLDER_IMAGE.to_string(), ToString::to_string)
}

fn format_rating(rating: Option<Decimal>) -> String {
    rating
        .filter(|r| *r > Decimal::ZERO)
        .map_or_else(|| DEFAULT_RATING.to_string(), |r| format!("{:.1}", r.round_dp(1)))
}

// =============================================================================
// Listing
// =============================================================================

/// Listing filters from the query string.
///
/// Checkboxes arrive as `on` (plain forms) or `true` (links we build).
#[derive(Debug, Default, Deserialize)]
pub struct ProductFilters {
    pub category: Option<String>,
    pub search: Option<String>,
    pub skin_type: Option<String>,
    pub trending: Option<String>,
    pub bestseller: Option<String>,
    pub page: Option<u32>,
}

fn is_checked(value: Option<&str>) -> bool {
    matches!(value, Some("on" | "true" | "1"))
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(ToString::to_string)
}

impl ProductFilters {
    /// Translate the form into an API query.
    ///
    /// Unknown skin types are dropped rather than sent to the backend.
    #[must_use]
    pub fn to_query(&self) -> ProductQuery {
        ProductQuery {
            category: non_blank(self.category.as_deref()),
            search: non_blank(self.search.as_deref()),
            skin_type: self
                .skin_type
                .as_deref()
                .and_then(|s| s.parse::<SkinType>().ok()),
            trending: is_checked(self.trending.as_deref()),
            bestseller: is_checked(self.bestseller.as_deref()),
            page: self.page.filter(|p| *p > 1),
            ..ProductQuery::default()
        }
    }
}

/// Product listing page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/index.html")]
pub struct ProductsIndexTemplate {
    pub page: PageContext,
    pub products: Vec<ProductCardView>,
    pub total: u64,
    pub categories: Vec<CategoryOption>,
    /// Whether a category filter is active ("all categories" unchecked).
    pub category_selected: bool,
    pub skin_types: Vec<SkinTypeOption>,
    pub search: String,
    pub trending: bool,
    pub bestseller: bool,
    pub current_page: u32,
    pub prev_url: Option<String>,
    pub next_url: Option<String>,
    /// The catalog could not be loaded at all.
    pub unavailable: bool,
}

/// URL of another page of the same listing.
fn page_url(query: &ProductQuery, page: u32) -> String {
    let mut pairs: Vec<(&str, String)> = query
        .to_pairs()
        .into_iter()
        .filter(|(key, _)| *key != "page")
        .collect();
    if page > 1 {
        pairs.push(("page", page.to_string()));
    }

    if pairs.is_empty() {
        return "/products".to_string();
    }

    let params = pairs
        .iter()
        .map(|(k, v)| format!("{k}={}", urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&");
    format!("/products?{params}")
}

fn category_options(categories: &[Category], selected: Option<&str>) -> Vec<CategoryOption> {
    categories
        .iter()
        .map(|c| CategoryOption {
            slug: c.slug.clone(),
            name: c.name.clone(),
            selected: selected == Some(c.slug.as_str()),
        })
        .collect()
}

fn skin_type_options(selected: Option<SkinType>) -> Vec<SkinTypeOption> {
    SkinType::ALL_VARIANTS
        .iter()
        .map(|s| SkinTypeOption {
            value: s.as_str(),
            label: s.label(),
            selected: selected == Some(*s),
        })
        .collect()
}

/// Display the product listing page.
#[instrument(skip(state, page))]
pub async fn index(
    State(state): State<AppState>,
    page: PageContext,
    Query(filters): Query<ProductFilters>,
) -> impl IntoResponse {
    let query = filters.to_query();
    let api = state.api();

    let (products, categories) = tokio::join!(api.list_products(&query), api.list_categories());

    let categories = categories.unwrap_or_else(|e| {
        tracing::error!("Failed to fetch categories: {e}");
        Vec::new()
    });

    let (listing, unavailable) = match products {
        Ok(listing) => (listing, false),
        Err(e) => {
            tracing::error!("Failed to fetch products: {e}");
            (crate::api::Listing::default(), true)
        }
    };

    let current_page = query.page.unwrap_or(1);

    ProductsIndexTemplate {
        page,
        total: listing.total(),
        products: product_cards(&listing.items),
        categories: category_options(&categories, query.category.as_deref()),
        category_selected: query.category.is_some(),
        skin_types: skin_type_options(query.skin_type),
        search: query.search.clone().unwrap_or_default(),
        trending: query.trending,
        bestseller: query.bestseller,
        current_page,
        prev_url: (current_page > 1).then(|| page_url(&query, current_page - 1)),
        next_url: listing
            .has_next
            .then(|| page_url(&query, current_page + 1)),
        unavailable,
    }
}

// =============================================================================
// Detail
// =============================================================================

/// Product detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/show.html")]
pub struct ProductShowTemplate {
    pub page: PageContext,
    pub product: ProductDetailView,
    pub similar: Vec<ProductCardView>,
}

/// Products from the same category, excluding the one being viewed.
#[must_use]
pub fn similar_products(current_slug: &str, candidates: Vec<Product>) -> Vec<Product> {
    candidates
        .into_iter()
        .filter(|p| p.slug != current_slug)
        .take(SIMILAR_PRODUCTS)
        .collect()
}

/// Display the product detail page.
#[instrument(skip(state, page), fields(product.slug = %slug))]
pub async fn show(
    State(state): State<AppState>,
    page: PageContext,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse> {
    let product = match state.api().get_product(&slug).await {
        Ok(product) => product,
        Err(ApiError::NotFound(_)) => return Err(AppError::NotFound(slug)),
        Err(e) => return Err(e.into()),
    };

    let similar = match product.category_slug().filter(|s| !s.is_empty()) {
        Some(category) => state
            .api()
            .list_products(&ProductQuery::in_category(
                category,
                u32::try_from(SIMILAR_PRODUCTS + 1).unwrap_or(5),
            ))
            .await
            .map_or_else(
                |e| {
                    tracing::error!("Failed to fetch similar products: {e}");
                    Vec::new()
                },
                |listing| similar_products(&product.slug, listing.items),
            ),
        None => Vec::new(),
    };

    Ok(ProductShowTemplate {
        page,
        product: ProductDetailView::from(&product),
        similar: product_cards(&similar),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::str::FromStr;

    use super::*;
    use crate::merchandising::test_support::{category, product};

    #[test]
    fn test_card_defaults() {
        let card = ProductCardView::from(&product(1, "Rose Mist", None));
        assert_eq!(card.image_url, PLACEHOLDER_IMAGE);
        assert_eq!(card.rating, "4.3");
        assert_eq!(card.review_count, 0);
        assert!(card.discount.is_none());
    }

    #[test]
    fn test_card_discount_and_rating() {
        let mut p = product(1, "Rose Mist", None);
        p.price = Decimal::from(999);
        p.discount_price = Some(Decimal::from(699));
        p.discount_percentage = Decimal::from_str("30.0").unwrap();
        p.rating = Some(Decimal::from_str("4.75").unwrap());
        let card = ProductCardView::from(&p);
        assert_eq!(card.price, "₹699.00");
        assert_eq!(card.list_price.as_deref(), Some("₹999.00"));
        assert_eq!(card.discount, Some(30));
        assert_eq!(card.rating, "4.8");
    }

    #[test]
    fn test_detail_description_fallback() {
        let detail = ProductDetailView::from(&product(1, "Rose Mist", None));
        assert_eq!(detail.description, "No description available.");
    }

    #[test]
    fn test_filters_to_query() {
        let filters = ProductFilters {
            category: Some("skin".to_string()),
            search: Some("  ".to_string()),
            skin_type: Some("oily".to_string()),
            trending: Some("on".to_string()),
            bestseller: None,
            page: Some(1),
        };
        let query = filters.to_query();
        assert_eq!(query.category.as_deref(), Some("skin"));
        assert!(query.search.is_none());
        assert_eq!(query.skin_type, Some(SkinType::Oily));
        assert!(query.trending);
        assert!(!query.bestseller);
        assert!(query.page.is_none());

        let bogus = ProductFilters {
            skin_type: Some("scaly".to_string()),
            ..ProductFilters::default()
        };
        assert!(bogus.to_query().skin_type.is_none());
    }

    #[test]
    fn test_page_url_keeps_filters() {
        let query = ProductQuery {
            category: Some("skin".to_string()),
            page: Some(2),
            ..ProductQuery::default()
        };
        assert_eq!(page_url(&query, 3), "/products?category=skin&page=3");
        assert_eq!(page_url(&query, 1), "/products?category=skin");
        assert_eq!(page_url(&ProductQuery::default(), 1), "/products");
    }

    #[test]
    fn test_similar_products_excludes_current() {
        let skin = Some(category("skin", "Skincare"));
        let candidates = (1..=6)
            .map(|i| product(i, &format!("Serum {i}"), skin.clone()))
            .collect::<Vec<_>>();
        let current = candidates[1].slug.clone();
        let similar = similar_products(&current, candidates);
        assert_eq!(similar.len(), 4);
        assert!(similar.iter().all(|p| p.slug != current));
    }
}
