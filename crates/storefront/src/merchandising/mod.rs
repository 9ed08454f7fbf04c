//! Home page merchandising.
//!
//! Pure functions over data that has already been fetched from the API:
//! tab and B2G2 filtering, the promo countdown and carousel, and card layout.
//! Nothing here talks to the network.

mod b2g2;
mod carousel;
mod countdown;
mod tabs;

pub use b2g2::{
    B2G2_FETCH_SIZE, B2G2_RAIL_SIZE, B2g2Filter, apply_b2g2_keywords, b2g2_query, match_category,
};
pub use carousel::{PromoCarousel, PromoSlide, SEASON_SLIDES};
pub use countdown::Countdown;
pub use tabs::{HomeTab, select_tab};

/// Card width in pixels for position `index` of a rail.
///
/// Long names get wider cards, and the index adds a small rhythm so the rail
/// does not look like a grid.
#[must_use]
pub fn card_width(name: &str, index: usize) -> u32 {
    let name_len = name.chars().count();
    let for_name = if name_len > 40 {
        60
    } else if name_len > 30 {
        40
    } else {
        0
    };

    let base = 280 + for_name;
    match index % 3 {
        0 => base + 20,
        1 => base - 10,
        _ => base,
    }
}

/// A hero shortcut to a category listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategoryShortcut {
    pub name: &'static str,
    pub slug: &'static str,
    pub icon: &'static str,
}

impl CategoryShortcut {
    /// Listing URL for the shortcut.
    #[must_use]
    pub fn href(&self) -> String {
        format!("/products?category={}", urlencoding::encode(self.slug))
    }
}

/// Shortcuts shown in the hero, in display order.
pub const CATEGORY_SHORTCUTS: [CategoryShortcut; 6] = [
    CategoryShortcut {
        name: "new drops",
        slug: "new",
        icon: "🆕",
    },
    CategoryShortcut {
        name: "skincare",
        slug: "skin",
        icon: "🧴",
    },
    CategoryShortcut {
        name: "bodycare",
        slug: "body",
        icon: "🧴",
    },
    CategoryShortcut {
        name: "fragrance",
        slug: "fragrances",
        icon: "💎",
    },
    CategoryShortcut {
        name: "haircare",
        slug: "hair",
        icon: "🧴",
    },
    CategoryShortcut {
        name: "combos",
        slug: "gifting",
        icon: "🎁",
    },
];

#[cfg(test)]
pub(crate) mod test_support {
    use rust_decimal::Decimal;
    use veya_core::{CategoryId, ProductId};

    use crate::api::{Category, Product};

    pub fn category(slug: &str, name: &str) -> Category {
        Category {
            id: CategoryId::new(1),
            name: name.to_string(),
            slug: slug.to_string(),
            description: None,
        }
    }

    pub fn product(id: i32, name: &str, category: Option<Category>) -> Product {
        Product {
            id: ProductId::new(id),
            name: name.to_string(),
            slug: name.to_lowercase().replace(' ', "-"),
            description: None,
            price: Decimal::new(49900, 2),
            discount_price: None,
            discount_percentage: Decimal::ZERO,
            final_price: None,
            rating: None,
            review_count: 0,
            image: None,
            tags: Vec::new(),
            stock: 10,
            skin_type: None,
            is_trending: false,
            is_bestseller: false,
            is_new: false,
            category,
            created_at: None,
        }
    }

    pub fn described(id: i32, name: &str, description: &str) -> Product {
        Product {
            description: Some(description.to_string()),
            ..product(id, name, None)
        }
    }
}
