//! End-to-end tests for the storefront against the mock Veya API.
//!
//! Every test starts its own mock API and storefront on ephemeral ports.

#![allow(clippy::unwrap_used)]

use std::time::Duration;

use reqwest::StatusCode;

use veya_integration_tests::{MockApi, PASSWORD, Storefront, USERNAME, location, unreachable_api_url};

async fn setup() -> (MockApi, Storefront) {
    let api = MockApi::spawn().await;
    let storefront = Storefront::spawn(&api).await;
    (api, storefront)
}

async fn logged_in() -> (MockApi, Storefront) {
    let (api, storefront) = setup().await;
    let resp = storefront.login(USERNAME, PASSWORD).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    (api, storefront)
}

fn checkout_form<'a>() -> Vec<(&'a str, &'a str)> {
    vec![
        ("full_name", "Ananya Krishnan"),
        ("email", "ananya@example.in"),
        ("shipping_address", "12 MG Road, Indiranagar"),
        ("city", "Bengaluru"),
        ("state", "Karnataka"),
        ("pincode", "560038"),
        ("phone", "9876543210"),
    ]
}

/// The part of `html` between the first `start` and the next `end`.
fn between<'a>(html: &'a str, start: &str, end: &str) -> &'a str {
    let (_, rest) = html.split_once(start).expect("start marker");
    rest.split_once(end).map_or(rest, |(inside, _)| inside)
}

/// Value of the first `attr="…"` after `marker`.
fn attr_after<'a>(html: &'a str, marker: &str, attr: &str) -> &'a str {
    let (_, rest) = html.split_once(marker).expect("marker");
    between(rest, &format!("{attr}=\""), "\"")
}

/// `href`s of the active home toggles: the curated tab, then the B2G2 filter.
fn active_toggles(html: &str) -> Vec<&str> {
    html.split("toggle--active\"")
        .skip(1)
        .map(|rest| between(rest, "href=\"", "\""))
        .collect()
}

fn tab_rail(html: &str) -> &str {
    between(html, "id=\"best-of-veya\"", "rail-section--b2g2")
}

fn b2g2_rail(html: &str) -> &str {
    between(html, "id=\"b2g2\"", "id=\"carousel\"")
}

fn countdown_secs(html: &str) -> u64 {
    attr_after(html, "data-countdown", "data-countdown-secs")
        .parse()
        .unwrap()
}

// ============================================================================
// Health
// ============================================================================

#[tokio::test]
async fn test_health_endpoints() {
    let (_api, storefront) = setup().await;

    let resp = storefront.get("/health").await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.text().await.unwrap(), "ok");

    let resp = storefront.get("/health/ready").await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_readiness_fails_without_api() {
    let storefront = Storefront::spawn_with_api_url(&unreachable_api_url().await).await;

    assert_eq!(storefront.get("/health").await.status(), StatusCode::OK);
    assert_eq!(
        storefront.get("/health/ready").await.status(),
        StatusCode::SERVICE_UNAVAILABLE
    );
}

// ============================================================================
// Catalog Pages
// ============================================================================

#[tokio::test]
async fn test_home_page_renders_catalog() {
    let (_api, storefront) = setup().await;

    let resp = storefront.get("/").await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.headers().contains_key("content-security-policy"));
    assert!(resp.headers().contains_key("x-request-id"));

    let html = resp.text().await.unwrap();
    assert!(html.contains("BUY 2 GET 2 FREE"));
    assert!(html.contains("FLASH SALE"));
    assert!(html.contains("Rose Mist Toner"));
    assert!(html.contains("Oud Noir Body Mist"));
}

#[tokio::test]
async fn test_home_page_survives_api_outage() {
    let (api, storefront) = setup().await;
    api.set_down(true);

    let resp = storefront.get("/").await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(!resp.text().await.unwrap().contains("Rose Mist Toner"));
}

#[tokio::test]
async fn test_products_index_filters_by_category() {
    let (_api, storefront) = setup().await;

    let html = storefront
        .get("/products?category=haircare")
        .await
        .text()
        .await
        .unwrap();

    assert!(html.contains("Argan Repair Shampoo"));
    assert!(!html.contains("Velvet Matte Lipstick"));
}

#[tokio::test]
async fn test_product_page_and_missing_product() {
    let (_api, storefront) = setup().await;

    let resp = storefront.get("/products/vitamin-c-serum").await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.text().await.unwrap().contains("Vitamin C Serum"));

    let resp = storefront.get("/products/no-such-thing").await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_trailing_slash_is_ignored() {
    let (_api, storefront) = setup().await;

    let resp = storefront.get("/products/").await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.text().await.unwrap().contains("Argan Repair Shampoo"));

    let resp = storefront.get("/about/").await;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = storefront.get("/account/orders/").await;
    assert_eq!(location(&resp), "/auth/login?next=%2Faccount%2Forders");
}

#[tokio::test]
async fn test_static_assets_are_cacheable() {
    let (_api, storefront) = setup().await;

    let resp = storefront.get("/static/css/main.css").await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()["cache-control"], "public, max-age=86400");

    let resp = storefront.get("/about").await;
    assert_eq!(resp.headers()["cache-control"], "no-store, max-age=0");
}

#[tokio::test]
async fn test_static_pages() {
    let (_api, storefront) = setup().await;

    for path in ["/about", "/help", "/careers", "/blogs", "/bulk-orders"] {
        let resp = storefront.get(path).await;
        assert_eq!(resp.status(), StatusCode::OK, "{path}");
    }
}

#[tokio::test]
async fn test_product_page_add_returns_to_product() {
    let (api, storefront) = logged_in().await;
    let id = api.product_id("rose-mist-toner").to_string();

    let html = storefront
        .get("/products/rose-mist-toner")
        .await
        .text()
        .await
        .unwrap();
    let return_to = attr_after(&html, "name=\"return_to\"", "value");
    assert_eq!(return_to, "/products/rose-mist-toner");

    let resp = storefront
        .post_form("/cart/add", &[("product_id", &id), ("return_to", return_to)])
        .await;
    assert_eq!(location(&resp), "/products/rose-mist-toner?notice=added");

    let resp = storefront.get(&location(&resp)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.text().await.unwrap().contains("Product added to cart!"));
}

// ============================================================================
// Home Merchandising
// ============================================================================

#[tokio::test]
async fn test_home_tabs_select_the_curated_rail() {
    let (_api, storefront) = setup().await;

    let html = storefront.get("/").await.text().await.unwrap();
    assert!(active_toggles(&html)[0].contains("tab=bestsellers"));
    let rail = tab_rail(&html);
    assert!(rail.contains("/products/argan-repair-shampoo"));
    assert!(!rail.contains("/products/rose-mist-toner"));

    let html = storefront.get("/?tab=skincare").await.text().await.unwrap();
    assert!(active_toggles(&html)[0].contains("tab=skincare"));
    let rail = tab_rail(&html);
    for slug in ["rose-mist-toner", "vitamin-c-serum", "hydra-gel-moisturiser"] {
        assert!(rail.contains(&format!("/products/{slug}")), "{slug}");
    }
    assert!(!rail.contains("/products/argan-repair-shampoo"));

    // No trending haircare in the catalog
    let html = storefront.get("/?tab=haircare").await.text().await.unwrap();
    assert!(tab_rail(&html).contains("No products found"));

    let html = storefront.get("/?tab=nonsense").await.text().await.unwrap();
    assert!(active_toggles(&html)[0].contains("tab=bestsellers"));
}

#[tokio::test]
async fn test_home_b2g2_filters_select_the_rail() {
    let (api, storefront) = setup().await;

    let html = storefront.get("/?b2g2=haircare").await.text().await.unwrap();
    assert!(active_toggles(&html)[1].contains("b2g2=haircare"));
    assert_eq!(
        attr_after(&html, "name=\"product_ids\"", "value"),
        api.product_id("argan-repair-shampoo").to_string()
    );

    // Keyword filtering over the whole catalog: only the matte lipstick
    let html = storefront.get("/?b2g2=oily-skin").await.text().await.unwrap();
    assert!(active_toggles(&html)[1].contains("b2g2=oily-skin"));
    assert_eq!(
        attr_after(&html, "name=\"product_ids\"", "value"),
        api.product_id("velvet-matte-lipstick").to_string()
    );
    assert!(b2g2_rail(&html).contains("/products/velvet-matte-lipstick"));
}

#[tokio::test]
async fn test_b2g2_falls_back_to_unfiltered_catalog() {
    let (api, storefront) = setup().await;
    api.fail_listings("category=haircare", 1);

    let html = storefront.get("/?b2g2=haircare").await.text().await.unwrap();

    let first_four = [
        "rose-mist-toner",
        "vitamin-c-serum",
        "velvet-matte-lipstick",
        "argan-repair-shampoo",
    ]
    .map(|slug| api.product_id(slug).to_string())
    .join(",");
    assert_eq!(attr_after(&html, "name=\"product_ids\"", "value"), first_four);
    assert!(!b2g2_rail(&html).contains("/products/oud-noir-body-mist"));
}

#[tokio::test]
async fn test_b2g2_rail_is_empty_when_fallback_fails() {
    let (api, storefront) = setup().await;
    // The filtered fetch and its unfiltered retry both ask for 20 products
    api.fail_listings("page_size=20", 2);

    let resp = storefront.get("/?b2g2=haircare").await;
    assert_eq!(resp.status(), StatusCode::OK);
    let html = resp.text().await.unwrap();

    assert!(b2g2_rail(&html).contains("No products found"));
    assert!(!html.contains("name=\"product_ids\""));
    assert!(html.contains("Rose Mist Toner"));
}

#[tokio::test]
async fn test_home_slide_selection() {
    let (_api, storefront) = setup().await;
    let active_slide =
        |html: &str| attr_after(html, "carousel__slide--active", "data-slide").to_string();

    let html = storefront.get("/").await.text().await.unwrap();
    assert_eq!(active_slide(&html), "0");

    let html = storefront.get("/?slide=2").await.text().await.unwrap();
    assert_eq!(active_slide(&html), "2");

    // Out-of-range indexes wrap around
    let html = storefront.get("/?slide=4").await.text().await.unwrap();
    assert_eq!(active_slide(&html), "1");
}

#[tokio::test]
async fn test_countdown_deadline_is_kept_then_renewed() {
    let api = MockApi::spawn().await;
    let storefront = Storefront::spawn_configured(&api, |config| {
        config.promo.countdown = Duration::from_secs(2);
    })
    .await;

    let first = storefront.get("/").await.text().await.unwrap();
    assert_eq!(countdown_secs(&first), 2);

    // Same session, same deadline
    tokio::time::sleep(Duration::from_millis(1200)).await;
    let reload = storefront.get("/").await.text().await.unwrap();
    assert!(countdown_secs(&reload) < 2);

    // Once it has run out, the next visit starts a fresh countdown
    tokio::time::sleep(Duration::from_millis(1500)).await;
    let renewed = storefront.get("/").await.text().await.unwrap();
    assert_eq!(countdown_secs(&renewed), 2);
}

// ============================================================================
// Authentication
// ============================================================================

#[tokio::test]
async fn test_login_failure_shows_backend_message() {
    let (_api, storefront) = setup().await;

    let resp = storefront.login(USERNAME, "not-the-password").await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.text().await.unwrap().contains("Invalid username or password"));
}

#[tokio::test]
async fn test_login_returns_to_next() {
    let (_api, storefront) = setup().await;

    let resp = storefront
        .post_form(
            "/auth/login",
            &[
                ("username", USERNAME),
                ("password", PASSWORD),
                ("next", "/products/rose-mist-toner"),
            ],
        )
        .await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/products/rose-mist-toner");

    // Already logged in: the login page forwards straight on
    let resp = storefront.get("/auth/login?next=/cart").await;
    assert_eq!(location(&resp), "/cart");
}

#[tokio::test]
async fn test_guest_login_next_keeps_nested_path() {
    let (_api, storefront) = setup().await;

    let resp = storefront.get("/account/orders").await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/auth/login?next=%2Faccount%2Forders");
}

#[tokio::test]
async fn test_login_rejects_offsite_next() {
    let (_api, storefront) = setup().await;

    let resp = storefront
        .post_form(
            "/auth/login",
            &[
                ("username", USERNAME),
                ("password", PASSWORD),
                ("next", "//evil.example/phish"),
            ],
        )
        .await;
    assert_eq!(location(&resp), "/");
}

#[tokio::test]
async fn test_register_logs_in() {
    let (_api, storefront) = setup().await;

    let resp = storefront
        .post_form(
            "/auth/register",
            &[
                ("username", "meera_s"),
                ("email", "meera@example.in"),
                ("password", "sandalwood-9"),
                ("password_confirm", "sandalwood-9"),
                ("first_name", "Meera"),
                ("last_name", "Shah"),
            ],
        )
        .await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);

    let resp = storefront.get("/account").await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.text().await.unwrap().contains("meera@example.in"));
}

#[tokio::test]
async fn test_logout() {
    let (_api, storefront) = logged_in().await;

    let resp = storefront.post_form("/auth/logout", &[]).await;
    assert_eq!(location(&resp), "/?notice=logged_out");

    let resp = storefront.get("/cart").await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/auth/login?next=%2Fcart");
}

#[tokio::test]
async fn test_expired_backend_session_logs_out() {
    let (api, storefront) = logged_in().await;
    api.expire_sessions();

    let resp = storefront.get("/account").await;
    assert_eq!(location(&resp), "/auth/login?error=session_expired");

    // The local login was dropped along with it
    let resp = storefront.get("/account").await;
    assert_eq!(location(&resp), "/auth/login?next=%2Faccount");
}

// ============================================================================
// Cart
// ============================================================================

#[tokio::test]
async fn test_guest_add_to_cart_goes_to_login() {
    let (api, storefront) = setup().await;
    let id = api.product_id("rose-mist-toner").to_string();

    let resp = storefront
        .post_form(
            "/cart/add",
            &[("product_id", &id), ("return_to", "/products/rose-mist-toner")],
        )
        .await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        location(&resp),
        "/auth/login?next=%2Fproducts%2Frose-mist-toner&error=login_required"
    );

    let resp = storefront
        .post_htmx("/cart/add", &[("product_id", &id), ("return_to", "/")])
        .await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers()["HX-Redirect"],
        "/auth/login?error=login_required"
    );

    assert!(api.cart_of(USERNAME).is_empty());
}

#[tokio::test]
async fn test_guest_cart_count_is_zero() {
    let (_api, storefront) = setup().await;
    let body = storefront.get("/cart/count").await.text().await.unwrap();
    assert_eq!(body.trim(), "0");
}

#[tokio::test]
async fn test_htmx_add_updates_badge() {
    let (api, storefront) = logged_in().await;
    let id = api.product_id("vitamin-c-serum").to_string();

    let resp = storefront
        .post_htmx(
            "/cart/add",
            &[("product_id", &id), ("quantity", "2"), ("return_to", "/")],
        )
        .await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()["HX-Trigger"], "cart-updated");
    assert_eq!(resp.text().await.unwrap().trim(), "2");

    assert_eq!(
        api.cart_of(USERNAME),
        vec![("vitamin-c-serum".to_string(), 2)]
    );
    let badge = storefront.get("/cart/count").await.text().await.unwrap();
    assert_eq!(badge.trim(), "2");
}

#[tokio::test]
async fn test_add_redirects_back_with_notice() {
    let (api, storefront) = logged_in().await;
    let id = api.product_id("rose-mist-toner").to_string();

    let resp = storefront
        .post_form(
            "/cart/add",
            &[("product_id", &id), ("return_to", "/products?category=skincare")],
        )
        .await;
    assert_eq!(
        location(&resp),
        "/products?category=skincare&notice=added"
    );
}

#[tokio::test]
async fn test_add_all_b2g2_picks() {
    let (api, storefront) = logged_in().await;
    let ids = ["rose-mist-toner", "vitamin-c-serum", "argan-repair-shampoo"]
        .map(|slug| api.product_id(slug).to_string())
        .join(",");

    let resp = storefront
        .post_form("/cart/add-all", &[("product_ids", &ids), ("return_to", "/")])
        .await;
    assert_eq!(location(&resp), "/?notice=all_added");
    assert_eq!(api.cart_of(USERNAME).len(), 3);
}

#[tokio::test]
async fn test_cart_page_update_and_remove() {
    let (api, storefront) = logged_in().await;
    let id = api.product_id("rose-mist-toner").to_string();
    storefront
        .post_form("/cart/add", &[("product_id", &id), ("return_to", "/")])
        .await;

    let html = storefront.get("/cart").await.text().await.unwrap();
    assert!(html.contains("Rose Mist Toner"));
    assert!(html.contains("₹399.00"));

    let line = api.line_id(USERNAME, "rose-mist-toner").unwrap().to_string();
    let resp = storefront
        .post_htmx("/cart/update", &[("item_id", &line), ("quantity", "3")])
        .await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()["HX-Trigger"], "cart-updated");
    assert!(resp.text().await.unwrap().contains("₹1197.00"));

    let resp = storefront
        .post_form("/cart/update", &[("item_id", &line), ("quantity", "0")])
        .await;
    assert_eq!(location(&resp), "/cart?notice=removed");
    assert!(api.cart_of(USERNAME).is_empty());
}

#[tokio::test]
async fn test_buy_now_goes_to_checkout() {
    let (api, storefront) = logged_in().await;
    let id = api.product_id("hydra-gel-moisturiser").to_string();

    let resp = storefront
        .post_form("/cart/buy-now", &[("product_id", &id), ("quantity", "1")])
        .await;
    assert_eq!(location(&resp), "/checkout");

    let html = storefront.get("/checkout").await.text().await.unwrap();
    assert!(html.contains("Hydra Gel Moisturiser"));
}

// ============================================================================
// Checkout
// ============================================================================

#[tokio::test]
async fn test_checkout_with_empty_cart_returns_to_cart() {
    let (_api, storefront) = logged_in().await;

    let resp = storefront.get("/checkout").await;
    assert_eq!(location(&resp), "/cart");
}

#[tokio::test]
async fn test_checkout_validation_keeps_cart() {
    let (api, storefront) = logged_in().await;
    let id = api.product_id("vitamin-c-serum").to_string();
    storefront
        .post_form("/cart/add", &[("product_id", &id), ("return_to", "/")])
        .await;

    let mut form = checkout_form();
    form.retain(|(field, _)| *field != "pincode");
    let resp = storefront.post_form("/checkout", &form).await;

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(api.order_count(), 0);
    assert_eq!(api.cart_of(USERNAME).len(), 1);
}

#[tokio::test]
async fn test_place_order() {
    let (api, storefront) = logged_in().await;
    let id = api.product_id("velvet-matte-lipstick").to_string();
    storefront
        .post_form(
            "/cart/add",
            &[("product_id", &id), ("quantity", "2"), ("return_to", "/")],
        )
        .await;

    let resp = storefront.post_form("/checkout", &checkout_form()).await;
    assert_eq!(location(&resp), "/account/orders?notice=order_placed");
    assert_eq!(api.order_count(), 1);
    assert!(api.cart_of(USERNAME).is_empty());

    let html = storefront
        .get("/account/orders?notice=order_placed")
        .await
        .text()
        .await
        .unwrap();
    assert!(html.contains("VEYA-"));
    assert!(html.contains("Velvet Matte Lipstick"));
    assert!(html.contains("₹1038.00"));
}

// ============================================================================
// Account
// ============================================================================

#[tokio::test]
async fn test_profile_update() {
    let (_api, storefront) = logged_in().await;

    let resp = storefront
        .post_form(
            "/account",
            &[
                ("first_name", "Ananya"),
                ("last_name", "K"),
                ("email", "ananya.k@example.in"),
            ],
        )
        .await;
    assert_eq!(location(&resp), "/account?notice=profile_updated");

    let html = storefront.get("/account").await.text().await.unwrap();
    assert!(html.contains("ananya.k@example.in"));

    let resp = storefront
        .post_form(
            "/account",
            &[("first_name", "Ananya"), ("last_name", "K"), ("email", "nope")],
        )
        .await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.text().await.unwrap().contains("Please enter a valid email address"));
}

// ============================================================================
// Newsletter
// ============================================================================

#[tokio::test]
async fn test_newsletter_subscribe() {
    let (api, storefront) = setup().await;

    let html = storefront
        .post_htmx("/newsletter/subscribe", &[("email", " Priya@Example.in ")])
        .await
        .text()
        .await
        .unwrap();
    assert!(html.contains("priya@example.in"));
    assert_eq!(api.subscribers(), vec!["priya@example.in".to_string()]);

    let html = storefront
        .post_htmx("/newsletter/subscribe", &[("email", "priya@example.in")])
        .await
        .text()
        .await
        .unwrap();
    assert!(html.contains("This email is already subscribed."));

    let html = storefront
        .post_htmx("/newsletter/subscribe", &[("email", "not-an-email")])
        .await
        .text()
        .await
        .unwrap();
    assert!(html.contains("Please enter a valid email address."));
    assert_eq!(api.subscribers().len(), 1);
}
