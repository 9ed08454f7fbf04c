//! Home page route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Query, State},
    response::IntoResponse,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::api::{ApiClient, Category, Product, ProductQuery};
use crate::filters;
use crate::merchandising::{
    B2G2_FETCH_SIZE, B2G2_RAIL_SIZE, B2g2Filter, CATEGORY_SHORTCUTS, CategoryShortcut, Countdown,
    HomeTab, PromoCarousel, apply_b2g2_keywords, b2g2_query, select_tab,
};
use crate::models::session_keys;
use crate::routes::context::PageContext;
use crate::routes::products::{ProductCardView, product_cards};
use crate::state::AppState;

/// Trending products fetched for the hero strip and category tabs.
const TRENDING_FETCH: u32 = 8;
/// Bestsellers fetched for the default tab.
const BESTSELLER_FETCH: u32 = 8;
/// Newest products fetched; the first few are "new on the shelves".
const NEWEST_FETCH: u32 = 12;
/// Products in the "shop all" rail.
const ALL_FETCH: u32 = 12;
/// Trending products in the hero strip.
const HERO_STRIP_SIZE: usize = 5;
/// Products in the "new on the shelves" block.
const NEW_ARRIVALS_SIZE: usize = 4;

// =============================================================================
// Views
// =============================================================================

/// A tab or filter button.
#[derive(Clone, Debug)]
pub struct ToggleView {
    pub slug: &'static str,
    pub label: &'static str,
    pub active: bool,
}

/// A promo carousel slide.
#[derive(Clone, Debug)]
pub struct SlideView {
    pub index: usize,
    pub title: &'static str,
    pub threshold: &'static str,
    pub tagline: &'static str,
    pub call_to_action: &'static str,
    pub fine_print: &'static str,
    pub icon: &'static str,
    pub active: bool,
}

fn slide_views(carousel: &PromoCarousel) -> Vec<SlideView> {
    carousel
        .slides()
        .iter()
        .enumerate()
        .map(|(index, slide)| SlideView {
            index,
            title: slide.title,
            threshold: slide.threshold,
            tagline: slide.tagline,
            call_to_action: slide.call_to_action,
            fine_print: slide.fine_print,
            icon: slide.icon,
            active: index == carousel.current(),
        })
        .collect()
}

fn tab_views(active: HomeTab) -> Vec<ToggleView> {
    HomeTab::ALL
        .iter()
        .map(|tab| ToggleView {
            slug: tab.slug(),
            label: tab.label(),
            active: *tab == active,
        })
        .collect()
}

fn b2g2_views(active: B2g2Filter) -> Vec<ToggleView> {
    B2g2Filter::ALL
        .iter()
        .map(|filter| ToggleView {
            slug: filter.slug(),
            label: filter.label(),
            active: *filter == active,
        })
        .collect()
}

/// Home page query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct HomeQuery {
    pub tab: Option<String>,
    pub b2g2: Option<String>,
    pub slide: Option<String>,
}

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub page: PageContext,
    pub shortcuts: Vec<CategoryShortcut>,
    /// Top trending products under the hero.
    pub hero_strip: Vec<ProductCardView>,
    pub tabs: Vec<ToggleView>,
    pub active_tab: &'static str,
    pub tab_products: Vec<ProductCardView>,
    pub b2g2_filters: Vec<ToggleView>,
    pub active_b2g2: &'static str,
    pub b2g2_products: Vec<ProductCardView>,
    /// Comma-separated product IDs for the "add all" button.
    pub b2g2_ids: String,
    pub new_arrivals: Vec<ProductCardView>,
    pub all_products: Vec<ProductCardView>,
    pub slides: Vec<SlideView>,
    pub current_slide: usize,
    pub rotate_ms: u32,
    pub countdown: Countdown,
    pub countdown_secs: u64,
}

// =============================================================================
// Data Loading
// =============================================================================

/// Fetch a product list, logging and degrading to empty on failure.
async fn products_or_empty(api: &ApiClient, query: &ProductQuery, what: &str) -> Vec<Product> {
    api.list_products(query).await.map_or_else(
        |e| {
            tracing::error!("Failed to fetch {what}: {e}");
            Vec::new()
        },
        |listing| listing.items,
    )
}

/// Products for the B2G2 rail.
///
/// A failed filtered fetch is retried once as an unfiltered catalog page;
/// if that fails too the rail is empty.
async fn b2g2_products(api: &ApiClient, filter: B2g2Filter, categories: &[Category]) -> Vec<Product> {
    match api.list_products(&b2g2_query(filter, categories)).await {
        Ok(listing) => apply_b2g2_keywords(filter, listing.items),
        Err(e) => {
            tracing::warn!(filter = filter.slug(), "B2G2 fetch failed, retrying unfiltered: {e}");
            api.list_products(&ProductQuery::all(B2G2_FETCH_SIZE))
                .await
                .map_or_else(
                    |e| {
                        tracing::error!("Failed to fetch B2G2 fallback products: {e}");
                        Vec::new()
                    },
                    |listing| listing.take(B2G2_RAIL_SIZE),
                )
        }
    }
}

/// Time left on this session's promo countdown.
///
/// The deadline is set on the first visit and renewed once it has passed.
async fn promo_countdown(session: &Session, length: std::time::Duration) -> Countdown {
    let now = Utc::now();
    let stored = session
        .get::<DateTime<Utc>>(session_keys::PROMO_DEADLINE)
        .await
        .unwrap_or_else(|e| {
            tracing::warn!("Failed to read promo deadline: {e}");
            None
        });

    let deadline = match stored {
        Some(deadline) if deadline > now => deadline,
        _ => {
            let deadline = now
                + chrono::Duration::from_std(length).unwrap_or_else(|_| chrono::Duration::zero());
            if let Err(e) = session
                .insert(session_keys::PROMO_DEADLINE, deadline)
                .await
            {
                tracing::warn!("Failed to store promo deadline: {e}");
            }
            deadline
        }
    };

    Countdown::until(deadline, now)
}

// =============================================================================
// Handler
// =============================================================================

/// Display the home page.
#[instrument(skip(state, page, session))]
pub async fn home(
    State(state): State<AppState>,
    page: PageContext,
    session: Session,
    Query(query): Query<HomeQuery>,
) -> impl IntoResponse {
    let api = state.api();
    let tab = HomeTab::from_query(query.tab.as_deref());
    let filter = B2g2Filter::from_query(query.b2g2.as_deref());

    let trending_query = ProductQuery::trending(TRENDING_FETCH);
    let bestseller_query = ProductQuery::bestsellers(BESTSELLER_FETCH);
    let newest_query = ProductQuery::newest(NEWEST_FETCH);
    let all_query = ProductQuery::all(ALL_FETCH);

    let (trending, bestsellers, newest, all, categories) = tokio::join!(
        products_or_empty(api, &trending_query, "trending products"),
        products_or_empty(api, &bestseller_query, "bestsellers"),
        products_or_empty(api, &newest_query, "new products"),
        products_or_empty(api, &all_query, "all products"),
        async {
            api.list_categories().await.unwrap_or_else(|e| {
                tracing::error!("Failed to fetch categories: {e}");
                Vec::new()
            })
        },
    );

    let (b2g2, countdown) = tokio::join!(
        b2g2_products(api, filter, &categories),
        promo_countdown(&session, state.config().promo.countdown),
    );

    let carousel = PromoCarousel::from_query(query.slide.as_deref());
    let hero_strip = trending.iter().take(HERO_STRIP_SIZE).cloned().collect::<Vec<_>>();
    let new_arrivals = newest.iter().take(NEW_ARRIVALS_SIZE).cloned().collect::<Vec<_>>();

    HomeTemplate {
        page,
        shortcuts: CATEGORY_SHORTCUTS.to_vec(),
        hero_strip: product_cards(&hero_strip),
        tabs: tab_views(tab),
        active_tab: tab.slug(),
        tab_products: product_cards(&select_tab(tab, &bestsellers, &trending)),
        b2g2_filters: b2g2_views(filter),
        active_b2g2: filter.slug(),
        b2g2_ids: b2g2
            .iter()
            .map(|p| p.id.to_string())
            .collect::<Vec<_>>()
            .join(","),
        b2g2_products: product_cards(&b2g2),
        new_arrivals: product_cards(&new_arrivals),
        all_products: product_cards(&all),
        slides: slide_views(&carousel),
        current_slide: carousel.current(),
        rotate_ms: state.config().promo.rotate_ms,
        countdown_secs: countdown.total_secs(),
        countdown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exactly_one_toggle_is_active() {
        let tabs = tab_views(HomeTab::Haircare);
        assert_eq!(tabs.iter().filter(|t| t.active).count(), 1);
        assert!(tabs.iter().any(|t| t.active && t.slug == "haircare"));

        let filters = b2g2_views(B2g2Filter::DrySkin);
        assert_eq!(filters.iter().filter(|f| f.active).count(), 1);
        assert!(filters.iter().any(|f| f.active && f.label == "dry skin"));
    }

    #[test]
    fn test_slide_views_mark_current() {
        let carousel = PromoCarousel::from_query(Some("4"));
        let slides = slide_views(&carousel);
        assert_eq!(slides.len(), 3);
        assert!(slides[1].active);
        assert_eq!(slides.iter().filter(|s| s.active).count(), 1);
    }
}
