//! Checkout route handlers.
//!
//! Collects the shipping details and places the order with the backend,
//! which snapshots the cart into an order and empties it. No payment is
//! taken here.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;
use tracing::instrument;

use veya_core::Email;

use crate::api::{ApiError, NewOrder};
use crate::error::{Result, add_breadcrumb};
use crate::filters;
use crate::middleware::RequireAuth;
use crate::models::CurrentUser;
use crate::routes::cart::CartView;
use crate::routes::context::PageContext;
use crate::routes::api_failure;
use crate::state::AppState;

/// Checkout page template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/show.html")]
pub struct CheckoutTemplate {
    pub page: PageContext,
    pub cart: CartView,
    pub form: NewOrder,
    pub error: Option<String>,
}

/// Validate the shipping form.
///
/// Every field is required and the email must look like one; the backend
/// re-validates everything.
///
/// # Errors
///
/// Returns the message to show above the form.
pub fn validate_order(form: &NewOrder) -> std::result::Result<NewOrder, String> {
    let trimmed = NewOrder {
        full_name: form.full_name.trim().to_string(),
        email: form.email.trim().to_string(),
        shipping_address: form.shipping_address.trim().to_string(),
        city: form.city.trim().to_string(),
        state: form.state.trim().to_string(),
        pincode: form.pincode.trim().to_string(),
        phone: form.phone.trim().to_string(),
    };

    let required = [
        &trimmed.full_name,
        &trimmed.email,
        &trimmed.shipping_address,
        &trimmed.city,
        &trimmed.state,
        &trimmed.pincode,
        &trimmed.phone,
    ];
    if required.iter().any(|field| field.is_empty()) {
        return Err("Please fill in all shipping details.".to_string());
    }

    if Email::parse(&trimmed.email).is_err() {
        return Err("Please enter a valid email address.".to_string());
    }

    Ok(trimmed)
}

/// Shipping form pre-filled from the customer's profile.
fn prefilled(user: &CurrentUser) -> NewOrder {
    NewOrder {
        full_name: user.full_name(),
        email: user.email.clone(),
        ..NewOrder::default()
    }
}

/// Load the cart, or `None` when it is empty.
async fn load_cart(
    state: &AppState,
    user: &CurrentUser,
) -> std::result::Result<Option<CartView>, ApiError> {
    let (items, total) = tokio::join!(
        state.api().cart_items(&user.backend),
        state.api().cart_total(&user.backend)
    );
    let items = items?;
    if items.is_empty() {
        return Ok(None);
    }
    Ok(Some(CartView::new(&items, &total?)))
}

/// Display the checkout page. An empty cart goes back to `/cart`.
#[instrument(skip(state, session, page, user), fields(user.id = %user.id))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    page: PageContext,
    RequireAuth(user): RequireAuth,
) -> Result<Response> {
    let cart = match load_cart(&state, &user).await {
        Ok(Some(cart)) => cart,
        Ok(None) => return Ok(Redirect::to("/cart").into_response()),
        Err(e) => return Err(api_failure(&session, e).await),
    };

    Ok(CheckoutTemplate {
        page,
        cart,
        form: prefilled(&user),
        error: None,
    }
    .into_response())
}

/// Place the order.
#[instrument(skip(state, session, page, user, form), fields(user.id = %user.id))]
pub async fn place_order(
    State(state): State<AppState>,
    session: Session,
    page: PageContext,
    RequireAuth(user): RequireAuth,
    Form(form): Form<NewOrder>,
) -> Result<Response> {
    let cart = match load_cart(&state, &user).await {
        Ok(Some(cart)) => cart,
        Ok(None) => return Ok(Redirect::to("/cart").into_response()),
        Err(e) => return Err(api_failure(&session, e).await),
    };

    let order = match validate_order(&form) {
        Ok(order) => order,
        Err(error) => {
            return Ok(CheckoutTemplate {
                page,
                cart,
                form,
                error: Some(error),
            }
            .into_response());
        }
    };

    match state.api().place_order(&user.backend, &order).await {
        Ok(placed) => {
            tracing::info!(order.number = %placed.order_number, "Order placed");
            add_breadcrumb(
                "checkout",
                "Order placed",
                Some(&[("order_number", placed.order_number.as_str())]),
            );
            Ok(Redirect::to("/account/orders?notice=order_placed").into_response())
        }
        Err(e) if e.is_unauthorized() => Err(api_failure(&session, e).await),
        Err(e) => {
            tracing::error!("Failed to place order: {e}");
            let error = e
                .user_message()
                .unwrap_or("We couldn't place your order. Please try again.")
                .to_string();
            Ok(CheckoutTemplate {
                page,
                cart,
                form: order,
                error: Some(error),
            }
            .into_response())
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn complete() -> NewOrder {
        NewOrder {
            full_name: "Asha Rao".to_string(),
            email: "asha@example.in".to_string(),
            shipping_address: "12 MG Road".to_string(),
            city: "Bengaluru".to_string(),
            state: "Karnataka".to_string(),
            pincode: "560001".to_string(),
            phone: "9876543210".to_string(),
        }
    }

    #[test]
    fn test_complete_form_is_trimmed() {
        let form = NewOrder {
            city: "  Bengaluru ".to_string(),
            ..complete()
        };
        assert_eq!(validate_order(&form).map(|o| o.city), Ok("Bengaluru".to_string()));
    }

    #[test]
    fn test_every_field_is_required() {
        let form = NewOrder {
            phone: "   ".to_string(),
            ..complete()
        };
        assert!(validate_order(&form).is_err());
    }

    #[test]
    fn test_email_must_be_valid() {
        let form = NewOrder {
            email: "asha-at-example".to_string(),
            ..complete()
        };
        assert_eq!(
            validate_order(&form).unwrap_err(),
            "Please enter a valid email address."
        );
    }
}
