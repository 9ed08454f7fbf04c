//! Curated home page tabs.

use std::str::FromStr;

use crate::api::Product;

/// Tabs above the curated product rail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HomeTab {
    #[default]
    Bestsellers,
    Skincare,
    Bodycare,
    Haircare,
    Combos,
}

impl HomeTab {
    /// Every tab, in display order.
    pub const ALL: [Self; 5] = [
        Self::Bestsellers,
        Self::Skincare,
        Self::Bodycare,
        Self::Haircare,
        Self::Combos,
    ];

    /// Value used in the `?tab=` query parameter.
    #[must_use]
    pub const fn slug(&self) -> &'static str {
        match self {
            Self::Bestsellers => "bestsellers",
            Self::Skincare => "skincare",
            Self::Bodycare => "bodycare",
            Self::Haircare => "haircare",
            Self::Combos => "combos",
        }
    }

    /// Tab label.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Bestsellers => "bestsellers",
            Self::Skincare => "skincare",
            Self::Bodycare => "bodycare",
            Self::Haircare => "haircare",
            Self::Combos => "combos",
        }
    }

    /// Parse a `?tab=` value; anything unknown selects bestsellers.
    #[must_use]
    pub fn from_query(value: Option<&str>) -> Self {
        value.and_then(|v| v.parse().ok()).unwrap_or_default()
    }

    /// Category slug and name fragment a trending product must match.
    const fn category_match(self) -> Option<(&'static str, &'static str)> {
        match self {
            Self::Bestsellers => None,
            Self::Skincare => Some(("skin", "skin")),
            Self::Bodycare => Some(("body", "body")),
            Self::Haircare => Some(("hair", "hair")),
            Self::Combos => Some(("gifting", "gift")),
        }
    }
}

impl FromStr for HomeTab {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|tab| tab.slug().eq_ignore_ascii_case(s))
            .ok_or(())
    }
}

/// Products shown in the curated rail for a tab.
///
/// Bestsellers shows the bestseller list as fetched. Category tabs filter the
/// trending list by category slug or by a fragment of the category name.
#[must_use]
pub fn select_tab(tab: HomeTab, bestsellers: &[Product], trending: &[Product]) -> Vec<Product> {
    let Some((slug, fragment)) = tab.category_match() else {
        return bestsellers.to_vec();
    };

    trending
        .iter()
        .filter(|product| {
            product.category.as_ref().is_some_and(|category| {
                category.slug == slug || category.name.to_lowercase().contains(fragment)
            })
        })
        .cloned()
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::merchandising::test_support::{category, product};

    #[test]
    fn test_unknown_tab_falls_back_to_bestsellers() {
        assert_eq!(HomeTab::from_query(None), HomeTab::Bestsellers);
        assert_eq!(HomeTab::from_query(Some("lipstick")), HomeTab::Bestsellers);
        assert_eq!(HomeTab::from_query(Some("Combos")), HomeTab::Combos);
    }

    #[test]
    fn test_bestsellers_tab_passes_through() {
        let bestsellers = vec![product(1, "Rose Mist", None)];
        let trending = vec![product(2, "Hair Oil", Some(category("hair", "Hair Care")))];
        let selected = select_tab(HomeTab::Bestsellers, &bestsellers, &trending);
        assert_eq!(selected, bestsellers);
    }

    #[test]
    fn test_category_tab_matches_slug_or_name() {
        let trending = vec![
            product(1, "Night Cream", Some(category("skin", "Skin Care"))),
            product(2, "Face Wash", Some(category("face", "Skincare Basics"))),
            product(3, "Body Lotion", Some(category("body", "Body Care"))),
            product(4, "Mystery Box", None),
        ];
        let selected = select_tab(HomeTab::Skincare, &[], &trending);
        let ids: Vec<i32> = selected.iter().map(|p| p.id.as_i32()).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn test_combos_tab_matches_gift_categories() {
        let trending = vec![
            product(1, "Festive Kit", Some(category("gifting", "Gifting"))),
            product(2, "Duo Set", Some(category("sets", "Gift Sets"))),
            product(3, "Shampoo", Some(category("hair", "Hair"))),
        ];
        let selected = select_tab(HomeTab::Combos, &[], &trending);
        assert_eq!(selected.len(), 2);
    }
}
