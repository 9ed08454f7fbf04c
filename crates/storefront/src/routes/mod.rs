//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                       - Home page
//! GET  /health                 - Liveness check
//! GET  /health/ready           - Readiness check (pings the API)
//!
//! # Products
//! GET  /products               - Product listing with sidebar filters
//! GET  /products/{slug}        - Product detail
//!
//! # Cart (login required; HTMX fragments or redirects)
//! GET  /cart                   - Cart page
//! POST /cart/add               - Add to cart
//! POST /cart/add-all           - Add every B2G2 pick
//! POST /cart/buy-now           - Add to cart, then checkout
//! POST /cart/update            - Update quantity (0 removes)
//! POST /cart/remove            - Remove line
//! GET  /cart/count             - Cart count badge (fragment)
//!
//! # Checkout (login required)
//! GET  /checkout               - Summary and shipping form
//! POST /checkout               - Place order
//!
//! # Auth
//! GET  /auth/login             - Login page
//! POST /auth/login             - Login action
//! GET  /auth/register          - Register page
//! POST /auth/register          - Register action
//! POST /auth/logout            - Logout action
//!
//! # Account (login required)
//! GET  /account                - Profile
//! POST /account                - Update profile
//! GET  /account/orders         - Order history
//!
//! # Misc
//! POST /newsletter/subscribe   - Newsletter signup (fragment)
//! GET  /about, /help, /careers, /blogs, /bulk-orders - Static pages
//! ```

pub mod account;
pub mod auth;
pub mod cart;
pub mod checkout;
pub mod context;
pub mod home;
pub mod newsletter;
pub mod pages;
pub mod products;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use tower_sessions::Session;
use url::Url;

use crate::api::ApiError;
use crate::error::AppError;
use crate::middleware::{auth_rate_limiter, cart_rate_limiter, clear_current_user};
use crate::state::AppState;

pub use context::PageContext;

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/register", get(auth::register_page).post(auth::register))
        .route("/logout", post(auth::logout))
        .layer(auth_rate_limiter())
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .route("/{slug}", get(products::show))
}

/// Create the cart routes router.
///
/// Only mutations are rate limited; the page and badge are plain reads.
pub fn cart_routes() -> Router<AppState> {
    let mutations = Router::new()
        .route("/add", post(cart::add))
        .route("/add-all", post(cart::add_all))
        .route("/buy-now", post(cart::buy_now))
        .route("/update", post(cart::update))
        .route("/remove", post(cart::remove))
        .layer(cart_rate_limiter());

    Router::new()
        .route("/", get(cart::show))
        .route("/count", get(cart::count))
        .merge(mutations)
}

/// Create the account routes router.
pub fn account_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(account::profile).post(account::update_profile))
        .route("/orders", get(account::orders))
}

/// Create the static page routes router.
pub fn page_routes() -> Router<AppState> {
    Router::new()
        .route("/about", get(pages::about))
        .route("/help", get(pages::help))
        .route("/careers", get(pages::careers))
        .route("/blogs", get(pages::blogs))
        .route("/bulk-orders", get(pages::bulk_orders))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home::home))
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .nest("/products", product_routes())
        .nest("/cart", cart_routes())
        .route(
            "/checkout",
            get(checkout::show).post(checkout::place_order),
        )
        .nest("/account", account_routes())
        .nest("/auth", auth_routes())
        .route("/newsletter/subscribe", post(newsletter::subscribe))
        .merge(page_routes())
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the Veya API is not reachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match state.api().ping().await {
        Ok(()) => StatusCode::OK,
        Err(e) => {
            tracing::warn!("Readiness check failed: {e}");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

// =============================================================================
// Handler Helpers
// =============================================================================

/// Turn an API failure on an authenticated call into an `AppError`.
///
/// When the backend no longer accepts the customer's session, the local
/// login is dropped as well so the next page shows them logged out.
pub async fn api_failure(session: &Session, error: ApiError) -> AppError {
    if error.is_unauthorized() {
        if let Err(e) = clear_current_user(session).await {
            tracing::error!("Failed to clear expired login: {e}");
        }
        crate::error::clear_sentry_user();
        return AppError::SessionExpired;
    }
    AppError::Api(error)
}

/// Add `key=code` to a local path, replacing any earlier notice or error.
#[must_use]
pub fn with_notice(path: &str, key: &str, code: &str) -> String {
    let parsed = Url::parse("http://storefront.invalid").and_then(|base| base.join(path));
    let Ok(mut url) = parsed else {
        return format!("/?{key}={code}");
    };

    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(k, _)| k != "notice" && k != "error")
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    url.query_pairs_mut()
        .clear()
        .extend_pairs(kept)
        .append_pair(key, code);

    format!("{}?{}", url.path(), url.query().unwrap_or_default())
}

/// Redirect, using `HX-Redirect` for HTMX requests so the whole page
/// navigates instead of swapping the target into a fragment.
#[must_use]
pub fn redirect(htmx: bool, location: &str) -> Response {
    if htmx {
        (StatusCode::OK, [("HX-Redirect", location.to_string())]).into_response()
    } else {
        Redirect::to(location).into_response()
    }
}
