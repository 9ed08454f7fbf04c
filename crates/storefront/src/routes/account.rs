//! Account route handlers (login required).

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use veya_core::{Email, Price};

use crate::api::{Order, ProfileUpdate, User};
use crate::error::Result;
use crate::filters;
use crate::middleware::{RequireAuth, update_current_user};
use crate::routes::api_failure;
use crate::routes::context::PageContext;
use crate::state::AppState;

// =============================================================================
// Views
// =============================================================================

/// Profile display data.
#[derive(Clone, Debug)]
pub struct ProfileView {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub member_since: Option<String>,
}

impl From<&User> for ProfileView {
    fn from(user: &User) -> Self {
        Self {
            username: user.username.clone(),
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            member_since: user.date_joined.as_deref().map(format_date),
        }
    }
}

/// Order line display data.
#[derive(Clone, Debug)]
pub struct OrderLineView {
    pub name: String,
    pub slug: String,
    pub quantity: u32,
    pub price: String,
}

/// Order display data.
#[derive(Clone, Debug)]
pub struct OrderView {
    pub order_number: String,
    pub placed_on: Option<String>,
    pub status: &'static str,
    pub status_class: &'static str,
    pub total: String,
    pub ship_to: String,
    pub lines: Vec<OrderLineView>,
}

impl From<&Order> for OrderView {
    fn from(order: &Order) -> Self {
        let ship_to = [order.city.as_str(), order.state.as_str(), order.pincode.as_str()]
            .into_iter()
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(", ");

        Self {
            order_number: order.order_number.clone(),
            placed_on: order.created_at.as_deref().map(format_date),
            status: order.status.label(),
            status_class: if order.status.is_final() {
                "status--final"
            } else {
                "status--open"
            },
            total: Price::inr(order.total_amount).display(),
            ship_to,
            lines: order
                .items
                .iter()
                .map(|item| OrderLineView {
                    name: item.product.name.clone(),
                    slug: item.product.slug.clone(),
                    quantity: item.quantity,
                    price: Price::inr(item.price).display(),
                })
                .collect(),
        }
    }
}

/// Render an API timestamp as "14 Feb 2025", or pass it through unchanged.
fn format_date(raw: &str) -> String {
    chrono::DateTime::parse_from_rfc3339(raw).map_or_else(
        |_| raw.to_string(),
        |date| date.format("%d %b %Y").to_string(),
    )
}

// =============================================================================
// Forms and Templates
// =============================================================================

/// Profile form data.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ProfileForm {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

impl ProfileForm {
    /// Validate and build the update.
    ///
    /// # Errors
    ///
    /// Returns the message to show above the form.
    pub fn to_update(&self) -> std::result::Result<ProfileUpdate, String> {
        let email = Email::parse_normalized(&self.email)
            .map_err(|_| "Please enter a valid email address".to_string())?;

        Ok(ProfileUpdate {
            first_name: self.first_name.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
            email: email.into_inner(),
        })
    }
}

/// Profile page template.
#[derive(Template, WebTemplate)]
#[template(path = "account/profile.html")]
pub struct ProfileTemplate {
    pub page: PageContext,
    pub profile: ProfileView,
    pub error: Option<String>,
}

impl ProfileTemplate {
    /// Re-render the form with what was submitted and an error.
    fn rejected(page: PageContext, username: &str, form: &ProfileForm, error: String) -> Self {
        Self {
            page,
            profile: ProfileView {
                username: username.to_string(),
                email: form.email.trim().to_string(),
                first_name: form.first_name.trim().to_string(),
                last_name: form.last_name.trim().to_string(),
                member_since: None,
            },
            error: Some(error),
        }
    }
}

/// Order history template.
#[derive(Template, WebTemplate)]
#[template(path = "account/orders.html")]
pub struct OrdersTemplate {
    pub page: PageContext,
    pub orders: Vec<OrderView>,
}

// =============================================================================
// Handlers
// =============================================================================

/// Display the profile page.
#[instrument(skip(state, session, page, user), fields(user.id = %user.id))]
pub async fn profile(
    State(state): State<AppState>,
    session: Session,
    page: PageContext,
    RequireAuth(user): RequireAuth,
) -> Result<Response> {
    let me = match state.api().current_user(&user.backend).await {
        Ok(me) => me,
        Err(e) => return Err(api_failure(&session, e).await),
    };

    Ok(ProfileTemplate {
        page,
        profile: ProfileView::from(&me),
        error: None,
    }
    .into_response())
}

/// Update first name, last name and email.
#[instrument(skip(state, session, page, user, form), fields(user.id = %user.id))]
pub async fn update_profile(
    State(state): State<AppState>,
    session: Session,
    page: PageContext,
    RequireAuth(mut user): RequireAuth,
    Form(form): Form<ProfileForm>,
) -> Result<Response> {
    let page = page.with_notice(None);

    let update = match form.to_update() {
        Ok(update) => update,
        Err(error) => {
            return Ok(ProfileTemplate::rejected(page, &user.username, &form, error).into_response());
        }
    };

    match state.api().update_profile(&user.backend, &update).await {
        Ok(updated) => {
            user.update_profile(&updated);
            update_current_user(&session, &user).await?;
            Ok(Redirect::to("/account?notice=profile_updated").into_response())
        }
        Err(e) if e.is_unauthorized() => Err(api_failure(&session, e).await),
        Err(e) => {
            tracing::warn!("Profile update rejected: {e}");
            let message = e
                .user_message()
                .unwrap_or("We couldn't update your profile. Please try again.")
                .to_string();
            Ok(ProfileTemplate::rejected(page, &user.username, &form, message).into_response())
        }
    }
}

/// Display order history.
#[instrument(skip(state, session, page, user), fields(user.id = %user.id))]
pub async fn orders(
    State(state): State<AppState>,
    session: Session,
    page: PageContext,
    RequireAuth(user): RequireAuth,
) -> Result<Response> {
    let orders = match state.api().list_orders(&user.backend).await {
        Ok(orders) => orders,
        Err(e) => return Err(api_failure(&session, e).await),
    };

    Ok(OrdersTemplate {
        page,
        orders: orders.iter().map(OrderView::from).collect(),
    }
    .into_response())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;
    use veya_core::{OrderId, OrderStatus};

    use super::*;

    #[test]
    fn test_format_date() {
        assert_eq!(format_date("2025-02-14T10:30:00Z"), "14 Feb 2025");
        assert_eq!(format_date("yesterday"), "yesterday");
    }

    #[test]
    fn test_order_view() {
        let order = Order {
            id: OrderId::new(9),
            order_number: "VEYA-0009".to_string(),
            total_amount: Decimal::new(139_800, 2),
            full_name: "Asha Rao".to_string(),
            email: "asha@example.in".to_string(),
            shipping_address: "12 MG Road".to_string(),
            city: "Bengaluru".to_string(),
            state: String::new(),
            pincode: "560001".to_string(),
            phone: None,
            status: OrderStatus::Shipped,
            items: Vec::new(),
            created_at: None,
        };
        let view = OrderView::from(&order);
        assert_eq!(view.total, "₹1398.00");
        assert_eq!(view.status, "Shipped");
        assert_eq!(view.status_class, "status--open");
        assert_eq!(view.ship_to, "Bengaluru, 560001");
    }

    #[test]
    fn test_profile_form_validates_email() {
        let form = ProfileForm {
            first_name: " Asha ".to_string(),
            last_name: "Rao".to_string(),
            email: " Asha@Example.in ".to_string(),
        };
        let update = form.to_update().unwrap();
        assert_eq!(update.first_name, "Asha");
        assert_eq!(update.email, "asha@example.in");

        let bad = ProfileForm {
            email: "nope".to_string(),
            ..ProfileForm::default()
        };
        assert!(bad.to_update().is_err());
    }
}
