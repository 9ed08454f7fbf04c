//! Cart route handlers.
//!
//! The cart lives in the backend and belongs to the logged-in user; the
//! storefront only forwards the customer's backend session. Mutations work
//! both as HTMX requests (fragment plus `HX-Trigger: cart-updated`) and as
//! plain form posts (redirect back with a notice).

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{AppendHeaders, IntoResponse, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use veya_core::{CartItemId, ProductId};

use crate::api::{ApiError, BackendSession, CartItem, CartTotal};
use crate::error::{AppError, Result, add_breadcrumb};
use crate::filters;
use crate::middleware::{OptionalAuth, RequireAuth, is_htmx, login_url, safe_next};
use crate::models::CurrentUser;
use crate::routes::context::PageContext;
use crate::routes::products::PLACEHOLDER_IMAGE;
use crate::routes::{api_failure, redirect, with_notice};
use crate::state::AppState;

/// Event HTMX listens for to refresh cart badges and fragments.
const CART_UPDATED: &str = "cart-updated";

// =============================================================================
// Views
// =============================================================================

/// Cart line display data for templates.
#[derive(Clone, Debug)]
pub struct CartItemView {
    pub id: i32,
    pub slug: String,
    pub name: String,
    pub image_url: String,
    pub quantity: u32,
    pub unit_price: String,
    pub line_total: String,
}

impl From<&CartItem> for CartItemView {
    fn from(item: &CartItem) -> Self {
        Self {
            id: item.id.as_i32(),
            slug: item.product.slug.clone(),
            name: item.product.name.clone(),
            image_url: item
                .product
                .image
                .clone()
                .filter(|url| !url.trim().is_empty())
                .unwrap_or_else(|| PLACEHOLDER_IMAGE.to_string()),
            quantity: item.quantity,
            unit_price: item.product.selling_price().display(),
            line_total: item.line_total().display(),
        }
    }
}

/// Cart display data for templates.
#[derive(Clone, Debug)]
pub struct CartView {
    pub items: Vec<CartItemView>,
    pub total: String,
    pub item_count: u32,
}

impl CartView {
    /// Build from the backend's lines and total.
    #[must_use]
    pub fn new(items: &[CartItem], total: &CartTotal) -> Self {
        Self {
            items: items.iter().map(CartItemView::from).collect(),
            total: veya_core::Price::inr(total.total).display(),
            item_count: item_count(items),
        }
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Total units across all lines.
#[must_use]
pub fn item_count(items: &[CartItem]) -> u32 {
    items.iter().map(|item| item.quantity).sum()
}

// =============================================================================
// Forms and Templates
// =============================================================================

/// Add to cart form data.
#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    pub product_id: i32,
    pub quantity: Option<u32>,
    pub return_to: Option<String>,
}

impl AddToCartForm {
    /// Requested quantity, at least 1.
    #[must_use]
    pub fn quantity(&self) -> u32 {
        self.quantity.unwrap_or(1).max(1)
    }
}

/// "Add all" form data: comma-separated product IDs.
#[derive(Debug, Deserialize)]
pub struct AddAllForm {
    pub product_ids: String,
    pub return_to: Option<String>,
}

impl AddAllForm {
    /// Product IDs in order, skipping anything that is not a number.
    #[must_use]
    pub fn ids(&self) -> Vec<ProductId> {
        self.product_ids
            .split(',')
            .filter_map(|id| id.trim().parse().ok())
            .collect()
    }
}

/// Update cart form data.
#[derive(Debug, Deserialize)]
pub struct UpdateCartForm {
    pub item_id: i32,
    pub quantity: u32,
}

/// Remove from cart form data.
#[derive(Debug, Deserialize)]
pub struct RemoveFromCartForm {
    pub item_id: i32,
}

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartShowTemplate {
    pub page: PageContext,
    pub cart: CartView,
}

/// Cart items fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_items.html")]
pub struct CartItemsTemplate {
    pub cart: CartView,
}

/// Cart count badge fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_count.html")]
pub struct CartCountTemplate {
    pub count: u32,
}

// =============================================================================
// Helpers
// =============================================================================

/// Load lines and total together.
async fn load_cart(
    state: &AppState,
    backend: &BackendSession,
) -> std::result::Result<CartView, ApiError> {
    let (items, total) = tokio::join!(state.api().cart_items(backend), state.api().cart_total(backend));
    Ok(CartView::new(&items?, &total?))
}

/// Where a guest goes when they try to use the cart.
fn guest_redirect(htmx: bool, return_to: &str) -> Response {
    let login = login_url(return_to);
    let separator = if login.contains('?') { '&' } else { '?' };
    redirect(htmx, &format!("{login}{separator}error=login_required"))
}

/// Response after a successful add: badge fragment for HTMX, otherwise a
/// redirect back with a notice.
async fn added_response(
    state: &AppState,
    user: &CurrentUser,
    htmx: bool,
    return_to: &str,
    notice: &str,
) -> Response {
    if !htmx {
        return redirect(false, &with_notice(return_to, "notice", notice));
    }

    let count = state
        .api()
        .cart_items(&user.backend)
        .await
        .map_or_else(
            |e| {
                tracing::warn!("Failed to refresh cart count: {e}");
                0
            },
            |items| item_count(&items),
        );

    (
        AppendHeaders([("HX-Trigger", CART_UPDATED)]),
        CartCountTemplate { count },
    )
        .into_response()
}

/// Response when an add failed.
async fn add_failed(session: &Session, error: ApiError, htmx: bool, return_to: &str) -> Response {
    if error.is_unauthorized() {
        let err = api_failure(session, error).await;
        if htmx {
            return redirect(true, "/auth/login?error=session_expired");
        }
        return err.into_response();
    }

    tracing::error!("Failed to add to cart: {error}");
    if htmx {
        (
            StatusCode::BAD_GATEWAY,
            [("HX-Reswap", "none")],
            error
                .user_message()
                .unwrap_or("We couldn't update your cart. Please try again.")
                .to_string(),
        )
            .into_response()
    } else {
        redirect(false, &with_notice(return_to, "error", "cart_failed"))
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// Display cart page.
#[instrument(skip(state, session, page, user), fields(user.id = %user.id))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    page: PageContext,
    RequireAuth(user): RequireAuth,
) -> Result<Response> {
    let cart = match load_cart(&state, &user.backend).await {
        Ok(cart) => cart,
        Err(e) => return Err(api_failure(&session, e).await),
    };

    Ok(CartShowTemplate { page, cart }.into_response())
}

/// Add an item to the cart.
#[instrument(skip(state, session, headers, user, form), fields(product.id = form.product_id))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    headers: HeaderMap,
    OptionalAuth(user): OptionalAuth,
    Form(form): Form<AddToCartForm>,
) -> Response {
    let htmx = is_htmx(&headers);
    let return_to = safe_next(form.return_to.as_deref());

    let Some(user) = user else {
        return guest_redirect(htmx, &return_to);
    };

    let product_id = ProductId::new(form.product_id);
    match state
        .api()
        .add_to_cart(&user.backend, product_id, form.quantity())
        .await
    {
        Ok(_) => {
            add_breadcrumb(
                "cart",
                "Added to cart",
                Some(&[("product_id", product_id.to_string().as_str())]),
            );
            added_response(&state, &user, htmx, &return_to, "added").await
        }
        Err(e) => add_failed(&session, e, htmx, &return_to).await,
    }
}

/// Add every listed product with quantity 1 (the B2G2 "add all" button).
///
/// Succeeds if at least one product was added.
#[instrument(skip(state, session, headers, user, form))]
pub async fn add_all(
    State(state): State<AppState>,
    session: Session,
    headers: HeaderMap,
    OptionalAuth(user): OptionalAuth,
    Form(form): Form<AddAllForm>,
) -> Response {
    let htmx = is_htmx(&headers);
    let return_to = safe_next(form.return_to.as_deref());

    let Some(user) = user else {
        return guest_redirect(htmx, &return_to);
    };

    let ids = form.ids();
    if ids.is_empty() {
        return AppError::BadRequest("No products selected".to_string()).into_response();
    }

    let mut added = 0usize;
    let mut last_error = None;

    for product_id in &ids {
        match state.api().add_to_cart(&user.backend, *product_id, 1).await {
            Ok(_) => added += 1,
            Err(e) if e.is_unauthorized() => return add_failed(&session, e, htmx, &return_to).await,
            Err(e) => {
                tracing::warn!(product.id = %product_id, "Failed to add B2G2 pick: {e}");
                last_error = Some(e);
            }
        }
    }

    match last_error {
        Some(e) if added == 0 => add_failed(&session, e, htmx, &return_to).await,
        _ => {
            add_breadcrumb(
                "cart",
                "Added all B2G2 picks",
                Some(&[("count", added.to_string().as_str())]),
            );
            added_response(&state, &user, htmx, &return_to, "all_added").await
        }
    }
}

/// Add an item and go straight to checkout.
#[instrument(skip(state, session, headers, user, form), fields(product.id = form.product_id))]
pub async fn buy_now(
    State(state): State<AppState>,
    session: Session,
    headers: HeaderMap,
    OptionalAuth(user): OptionalAuth,
    Form(form): Form<AddToCartForm>,
) -> Response {
    let htmx = is_htmx(&headers);
    let return_to = safe_next(form.return_to.as_deref());

    let Some(user) = user else {
        return guest_redirect(htmx, &return_to);
    };

    match state
        .api()
        .add_to_cart(&user.backend, ProductId::new(form.product_id), form.quantity())
        .await
    {
        Ok(_) => redirect(htmx, "/checkout"),
        Err(e) => add_failed(&session, e, htmx, &return_to).await,
    }
}

/// Render the cart after a change: fragment for HTMX, redirect otherwise.
async fn cart_changed(
    state: &AppState,
    session: &Session,
    user: &CurrentUser,
    htmx: bool,
    notice: &str,
) -> Result<Response> {
    if !htmx {
        return Ok(redirect(false, &with_notice("/cart", "notice", notice)));
    }

    match load_cart(state, &user.backend).await {
        Ok(cart) => Ok((
            AppendHeaders([("HX-Trigger", CART_UPDATED)]),
            CartItemsTemplate { cart },
        )
            .into_response()),
        Err(e) => Err(api_failure(session, e).await),
    }
}

/// Update a line's quantity; 0 removes the line.
#[instrument(skip(state, session, headers, user), fields(user.id = %user.id))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    headers: HeaderMap,
    RequireAuth(user): RequireAuth,
    Form(form): Form<UpdateCartForm>,
) -> Result<Response> {
    let item_id = CartItemId::new(form.item_id);
    let result = if form.quantity == 0 {
        state.api().remove_cart_item(&user.backend, item_id).await
    } else {
        state
            .api()
            .update_cart_item(&user.backend, item_id, form.quantity)
            .await
            .map(|_| ())
    };

    if let Err(e) = result {
        return Err(api_failure(&session, e).await);
    }

    let notice = if form.quantity == 0 { "removed" } else { "cart_updated" };
    cart_changed(&state, &session, &user, is_htmx(&headers), notice).await
}

/// Remove a line.
#[instrument(skip(state, session, headers, user), fields(user.id = %user.id))]
pub async fn remove(
    State(state): State<AppState>,
    session: Session,
    headers: HeaderMap,
    RequireAuth(user): RequireAuth,
    Form(form): Form<RemoveFromCartForm>,
) -> Result<Response> {
    if let Err(e) = state
        .api()
        .remove_cart_item(&user.backend, CartItemId::new(form.item_id))
        .await
    {
        return Err(api_failure(&session, e).await);
    }

    add_breadcrumb("cart", "Removed from cart", None);
    cart_changed(&state, &session, &user, is_htmx(&headers), "removed").await
}

/// Cart count badge (HTMX). Guests always see 0.
#[instrument(skip(state, user))]
pub async fn count(State(state): State<AppState>, OptionalAuth(user): OptionalAuth) -> impl IntoResponse {
    let count = match user {
        Some(user) => state
            .api()
            .cart_items(&user.backend)
            .await
            .map_or_else(
                |e| {
                    tracing::warn!("Failed to fetch cart count: {e}");
                    0
                },
                |items| item_count(&items),
            ),
        None => 0,
    };

    CartCountTemplate { count }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_form_quantity_is_at_least_one() {
        let form = AddToCartForm {
            product_id: 1,
            quantity: Some(0),
            return_to: None,
        };
        assert_eq!(form.quantity(), 1);
        let form = AddToCartForm {
            quantity: None,
            ..form
        };
        assert_eq!(form.quantity(), 1);
        let form = AddToCartForm {
            quantity: Some(3),
            ..form
        };
        assert_eq!(form.quantity(), 3);
    }

    #[test]
    fn test_add_all_ids_skip_junk() {
        let form = AddAllForm {
            product_ids: "3, 7,,x,12".to_string(),
            return_to: None,
        };
        let ids: Vec<i32> = form.ids().iter().map(ProductId::as_i32).collect();
        assert_eq!(ids, [3, 7, 12]);
    }

    #[test]
    fn test_guest_redirect_carries_next_and_reason() {
        let response = guest_redirect(false, "/products/rose-mist");
        assert_eq!(
            response.headers()[axum::http::header::LOCATION],
            "/auth/login?next=%2Fproducts%2Frose-mist&error=login_required"
        );

        let response = guest_redirect(true, "/");
        assert_eq!(
            response.headers()["HX-Redirect"],
            "/auth/login?error=login_required"
        );
    }
}
