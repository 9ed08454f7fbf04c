//! "Buy 2 Get 2" picks rail.
//!
//! A filter picks a category to fetch (by fuzzy name match against the live
//! category list), then narrows the fetched products with keyword rules.
//! Keyword rules never empty the rail: if nothing matches, the whole fetched
//! list is shown instead.

use std::str::FromStr;

use crate::api::{Category, Product, ProductQuery};

/// Maximum products shown in the B2G2 rail.
pub const B2G2_RAIL_SIZE: usize = 4;

/// Page size used when fetching B2G2 candidates.
pub const B2G2_FETCH_SIZE: u32 = 20;

/// B2G2 filter buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum B2g2Filter {
    #[default]
    WinterCare,
    NewLaunches,
    DrySkin,
    OilySkin,
    Haircare,
    Fragrances,
    Bodycare,
    AcneProne,
}

impl B2g2Filter {
    /// Every filter, in button order.
    pub const ALL: [Self; 8] = [
        Self::WinterCare,
        Self::NewLaunches,
        Self::DrySkin,
        Self::OilySkin,
        Self::Haircare,
        Self::Fragrances,
        Self::Bodycare,
        Self::AcneProne,
    ];

    /// Button label. Also the string matched against category names.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::WinterCare => "winter care",
            Self::NewLaunches => "new launches",
            Self::DrySkin => "dry skin",
            Self::OilySkin => "oily skin",
            Self::Haircare => "haircare",
            Self::Fragrances => "fragrances",
            Self::Bodycare => "bodycare",
            Self::AcneProne => "acne prone",
        }
    }

    /// Value used in the `?b2g2=` query parameter.
    #[must_use]
    pub const fn slug(&self) -> &'static str {
        match self {
            Self::WinterCare => "winter-care",
            Self::NewLaunches => "new-launches",
            Self::DrySkin => "dry-skin",
            Self::OilySkin => "oily-skin",
            Self::Haircare => "haircare",
            Self::Fragrances => "fragrances",
            Self::Bodycare => "bodycare",
            Self::AcneProne => "acne-prone",
        }
    }

    /// Parse a `?b2g2=` value; anything unknown selects winter care.
    #[must_use]
    pub fn from_query(value: Option<&str>) -> Self {
        value.and_then(|v| v.parse().ok()).unwrap_or_default()
    }

    /// Category slug tried when the fuzzy match finds nothing.
    const fn fallback_slug(self) -> Option<&'static str> {
        match self {
            Self::Haircare => Some("haircare"),
            Self::Fragrances => Some("fragrances"),
            Self::Bodycare => Some("bodycare"),
            _ => None,
        }
    }

    /// Keywords matched against product name and description.
    const fn keywords(self) -> &'static [&'static str] {
        match self {
            Self::WinterCare => &["winter"],
            Self::DrySkin => &["dry", "moisturiz"],
            Self::OilySkin => &["oil", "matte"],
            Self::AcneProne => &["acne", "blemish", "clear"],
            Self::NewLaunches | Self::Haircare | Self::Fragrances | Self::Bodycare => &[],
        }
    }
}

impl FromStr for B2g2Filter {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|f| f.label().eq_ignore_ascii_case(s) || f.slug().eq_ignore_ascii_case(s))
            .ok_or(())
    }
}

/// Find the category a filter should fetch from.
///
/// The first category whose name contains the label, whose slug contains the
/// hyphenated label, or whose name or slug is contained in the label wins.
/// A category with an empty name or slug therefore matches every filter.
#[must_use]
pub fn match_category(filter: B2g2Filter, categories: &[Category]) -> Option<&Category> {
    let label = filter.label();
    let hyphenated = label.replacen(' ', "-", 1);

    categories
        .iter()
        .find(|category| {
            let name = category.name.to_lowercase();
            let slug = category.slug.to_lowercase();
            name.contains(label)
                || slug.contains(&hyphenated)
                || label.contains(name.as_str())
                || label.contains(slug.as_str())
        })
        .or_else(|| {
            let fallback = filter.fallback_slug()?;
            categories.iter().find(|category| category.slug == fallback)
        })
}

/// Product query used to fetch candidates for a filter.
#[must_use]
pub fn b2g2_query(filter: B2g2Filter, categories: &[Category]) -> ProductQuery {
    match match_category(filter, categories) {
        Some(category) => ProductQuery::in_category(category.slug.clone(), B2G2_FETCH_SIZE),
        None if filter == B2g2Filter::NewLaunches => ProductQuery::newest(B2G2_FETCH_SIZE),
        None => ProductQuery::all(B2G2_FETCH_SIZE),
    }
}

/// Narrow fetched candidates by the filter's keywords and cut to rail size.
#[must_use]
pub fn apply_b2g2_keywords(filter: B2g2Filter, products: Vec<Product>) -> Vec<Product> {
    let keywords = filter.keywords();
    let search_tags = filter == B2g2Filter::WinterCare;

    let mut selected = if keywords.is_empty() {
        products
    } else {
        let matching: Vec<Product> = products
            .iter()
            .filter(|product| matches_keywords(product, keywords, search_tags))
            .cloned()
            .collect();

        if matching.is_empty() {
            products
        } else {
            matching
        }
    };

    selected.truncate(B2G2_RAIL_SIZE);
    selected
}

fn matches_keywords(product: &Product, keywords: &[&str], search_tags: bool) -> bool {
    let name = product.name.to_lowercase();
    let description = product.description_text().to_lowercase();

    keywords.iter().any(|keyword| {
        name.contains(keyword)
            || description.contains(keyword)
            || (search_tags
                && product
                    .tags
                    .iter()
                    .any(|tag| tag.to_lowercase().contains(keyword)))
    })
}
