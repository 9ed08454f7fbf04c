//! Data transfer types for the Veya REST API.
//!
//! These mirror the backend serializers field for field. Nothing here
//! enforces business rules: prices, discounts and stock are whatever the API
//! says they are. Optional or null fields fall back to defaults so a sparse
//! record never breaks a page.

use rust_decimal::Decimal;
use secrecy::SecretString;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};

use veya_core::{
    CartItemId, CategoryId, OrderId, OrderItemId, OrderStatus, Price, ProductId, SkinType, UserId,
};

/// Treat an explicit JSON `null` the same as a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

// =============================================================================
// Catalog
// =============================================================================

/// A product category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub slug: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// A product as returned by `products/` and `products/{slug}/`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price: Decimal,
    #[serde(default)]
    pub discount_price: Option<Decimal>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub discount_percentage: Decimal,
    #[serde(default)]
    pub final_price: Option<Decimal>,
    #[serde(default)]
    pub rating: Option<Decimal>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub review_count: i64,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub stock: i64,
    #[serde(default)]
    pub skin_type: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_trending: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_bestseller: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_new: bool,
    #[serde(default)]
    pub category: Option<Category>,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl Product {
    /// List price.
    #[must_use]
    pub const fn list_price(&self) -> Price {
        Price::inr(self.price)
    }

    /// Price the customer pays, as computed by the backend.
    #[must_use]
    pub fn selling_price(&self) -> Price {
        Price::inr(
            self.discount_price
                .or(self.final_price)
                .unwrap_or(self.price),
        )
    }

    /// Whether a strike-through list price should be shown.
    #[must_use]
    pub const fn is_discounted(&self) -> bool {
        self.discount_price.is_some()
    }

    /// Whole-number discount badge value, if there is a discount to show.
    #[must_use]
    pub fn discount_badge(&self) -> Option<i64> {
        if self.discount_percentage > Decimal::ZERO {
            self.discount_percentage.round().try_into().ok()
        } else {
            None
        }
    }

    /// Slug of the product's category, if it has one.
    #[must_use]
    pub fn category_slug(&self) -> Option<&str> {
        self.category.as_ref().map(|c| c.slug.as_str())
    }

    /// Parsed skin type, ignoring values the storefront does not know.
    #[must_use]
    pub fn skin_type(&self) -> Option<SkinType> {
        self.skin_type.as_deref().and_then(|s| s.parse().ok())
    }

    /// Description text, empty when the product has none.
    #[must_use]
    pub fn description_text(&self) -> &str {
        self.description.as_deref().unwrap_or_default()
    }
}

// =============================================================================
// Cart
// =============================================================================

/// A line in the authenticated user's cart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    pub id: CartItemId,
    pub product: Product,
    pub quantity: u32,
    #[serde(default)]
    pub total_price: Option<Decimal>,
}

impl CartItem {
    /// Line total as reported by the backend, else price times quantity.
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.total_price.map_or_else(
            || Price::inr(self.product.selling_price().amount * Decimal::from(self.quantity)),
            Price::inr,
        )
    }
}

/// Response of `cart/total/`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartTotal {
    #[serde(default, deserialize_with = "null_as_default")]
    pub total: Decimal,
}

// =============================================================================
// Orders
// =============================================================================

/// A line item in a placed order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: OrderItemId,
    pub product: Product,
    pub quantity: u32,
    pub price: Decimal,
}

/// A placed order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub order_number: String,
    pub total_amount: Decimal,
    #[serde(default, deserialize_with = "null_as_default")]
    pub full_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub email: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub shipping_address: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub city: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub state: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub pincode: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: OrderStatus,
    #[serde(default, deserialize_with = "null_as_default")]
    pub items: Vec<OrderItem>,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// Shipping details submitted at checkout.
///
/// The backend turns the current cart into an order and clears the cart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NewOrder {
    pub full_name: String,
    pub email: String,
    pub shipping_address: String,
    pub city: String,
    pub state: String,
    pub pincode: String,
    pub phone: String,
}

// =============================================================================
// Users
// =============================================================================

/// A registered user (`users/me/`, login and registration responses).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub email: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub first_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub last_name: String,
    #[serde(default)]
    pub date_joined: Option<String>,
}

impl User {
    /// First name when set, otherwise the username.
    #[must_use]
    pub fn display_name(&self) -> &str {
        if self.first_name.trim().is_empty() {
            &self.username
        } else {
            &self.first_name
        }
    }
}

/// Registration request.
#[derive(Debug)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub password: SecretString,
    pub first_name: String,
    pub last_name: String,
}

/// Partial profile update for `users/me/`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProfileUpdate {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

// =============================================================================
// Listing
// =============================================================================

/// A list endpoint response after the array/type guard.
///
/// The backend answers list endpoints either with a paginated envelope
/// (`{count, next, previous, results}`) or a bare array. Anything else is
/// treated as an empty list.
#[derive(Debug, Clone, PartialEq)]
pub struct Listing<T> {
    pub items: Vec<T>,
    /// Total matches across all pages, when the backend paginates.
    pub count: Option<u64>,
    /// Whether the backend reported a next page.
    pub has_next: bool,
}

impl<T> Default for Listing<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            count: None,
            has_next: false,
        }
    }
}

impl<T: DeserializeOwned> Listing<T> {
    /// Interpret a raw list response.
    ///
    /// # Errors
    ///
    /// Returns an error if an element of the list does not match `T`.
    pub fn from_value(value: serde_json::Value) -> Result<Self, serde_json::Error> {
        match value {
            serde_json::Value::Array(items) => Ok(Self {
                count: Some(items.len() as u64),
                items: serde_json::from_value(serde_json::Value::Array(items))?,
                has_next: false,
            }),
            serde_json::Value::Object(mut map) => match map.remove("results") {
                Some(serde_json::Value::Array(items)) => Ok(Self {
                    count: map.get("count").and_then(serde_json::Value::as_u64),
                    has_next: map.get("next").is_some_and(|next| !next.is_null()),
                    items: serde_json::from_value(serde_json::Value::Array(items))?,
                }),
                _ => Ok(Self::default()),
            },
            _ => Ok(Self::default()),
        }
    }
}

impl<T> Listing<T> {
    /// Number of matches to show in "N products found".
    #[must_use]
    pub fn total(&self) -> u64 {
        self.count.unwrap_or(self.items.len() as u64)
    }

    /// Keep only the first `n` items.
    #[must_use]
    pub fn take(mut self, n: usize) -> Vec<T> {
        self.items.truncate(n);
        self.items
    }
}

// =============================================================================
// Product Query
// =============================================================================

/// Filters accepted by `products/`.
///
/// Only set fields are sent. Boolean flags are sent as `true` when set and
/// omitted otherwise, matching how the backend reads them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProductQuery {
    pub category: Option<String>,
    pub search: Option<String>,
    pub skin_type: Option<SkinType>,
    pub trending: bool,
    pub bestseller: bool,
    pub ordering: Option<String>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

impl ProductQuery {
    /// Trending products, first page of `page_size`.
    #[must_use]
    pub fn trending(page_size: u32) -> Self {
        Self {
            trending: true,
            page_size: Some(page_size),
            ..Self::default()
        }
    }

    /// Bestselling products, first page of `page_size`.
    #[must_use]
    pub fn bestsellers(page_size: u32) -> Self {
        Self {
            bestseller: true,
            page_size: Some(page_size),
            ..Self::default()
        }
    }

    /// Newest products first.
    #[must_use]
    pub fn newest(page_size: u32) -> Self {
        Self {
            ordering: Some("-created_at".to_string()),
            page_size: Some(page_size),
            ..Self::default()
        }
    }

    /// Unfiltered catalog page.
    #[must_use]
    pub fn all(page_size: u32) -> Self {
        Self {
            page_size: Some(page_size),
            ..Self::default()
        }
    }

    /// Products in a category.
    #[must_use]
    pub fn in_category(slug: impl Into<String>, page_size: u32) -> Self {
        Self {
            category: Some(slug.into()),
            page_size: Some(page_size),
            ..Self::default()
        }
    }

    /// Query string pairs for the set fields, in a stable order.
    #[must_use]
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(category) = self.category.as_deref().filter(|c| !c.is_empty()) {
            pairs.push(("category", category.to_string()));
        }
        if let Some(search) = self.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            pairs.push(("search", search.to_string()));
        }
        if let Some(skin_type) = self.skin_type {
            pairs.push(("skin_type", skin_type.as_str().to_string()));
        }
        if self.trending {
            pairs.push(("trending", "true".to_string()));
        }
        if self.bestseller {
            pairs.push(("bestseller", "true".to_string()));
        }
        if let Some(ordering) = &self.ordering {
            pairs.push(("ordering", ordering.clone()));
        }
        if let Some(page) = self.page {
            pairs.push(("page", page.to_string()));
        }
        if let Some(page_size) = self.page_size {
            pairs.push(("page_size", page_size.to_string()));
        }
        pairs
    }

    /// Whether the result may be served from the catalog cache.
    ///
    /// Free-text searches are too varied to be worth caching.
    #[must_use]
    pub fn is_cacheable(&self) -> bool {
        self.search.as_deref().is_none_or(|s| s.trim().is_empty())
    }

    /// Cache key derived from the query string the API is sent.
    ///
    /// Values are form-encoded, so a filter value containing `&` or `=`
    /// cannot collide with a different combination of filters.
    #[must_use]
    pub fn cache_key(&self) -> String {
        let params = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.to_pairs())
            .finish();
        format!("products:{params}")
    }
}
