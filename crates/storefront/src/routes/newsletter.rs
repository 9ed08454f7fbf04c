//! Newsletter subscription route handlers.
//!
//! The footer form posts here via HTMX and swaps in whichever fragment comes
//! back. Subscribing needs no login; the backend records the address and
//! sends the welcome email.

use askama::Template;
use askama_web::WebTemplate;
use axum::{Form, extract::State, response::IntoResponse};
use serde::Deserialize;
use tracing::instrument;

use veya_core::Email;

use crate::api::ApiError;
use crate::state::AppState;

const INVALID_EMAIL: &str = "Please enter a valid email address.";
const SUBSCRIBE_FAILED: &str = "Something went wrong. Please try again.";

/// Newsletter subscription form data.
#[derive(Debug, Deserialize)]
pub struct SubscribeForm {
    #[serde(default)]
    pub email: String,
}

/// Success fragment template (replaces the form via HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "newsletter/subscribe_success.html")]
pub struct SubscribeSuccessTemplate {
    pub email: String,
}

/// Error fragment template (replaces the form via HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "newsletter/subscribe_error.html")]
pub struct SubscribeErrorTemplate {
    pub message: String,
    pub email: String,
}

/// Message for a subscription the backend refused.
fn failure_message(error: &ApiError) -> String {
    error.user_message().unwrap_or(SUBSCRIBE_FAILED).to_string()
}

/// Subscribe to the newsletter (HTMX).
#[instrument(skip(state), fields(email = %form.email))]
pub async fn subscribe(
    State(state): State<AppState>,
    Form(form): Form<SubscribeForm>,
) -> impl IntoResponse {
    let Ok(email) = Email::parse_normalized(&form.email) else {
        return SubscribeErrorTemplate {
            message: INVALID_EMAIL.to_string(),
            email: form.email.trim().to_string(),
        }
        .into_response();
    };

    match state.api().subscribe_newsletter(email.as_str()).await {
        Ok(()) => {
            tracing::info!("Newsletter subscription successful");
            SubscribeSuccessTemplate {
                email: email.into_inner(),
            }
            .into_response()
        }
        Err(e) => {
            tracing::warn!(error = %e, "Newsletter subscription failed");
            SubscribeErrorTemplate {
                message: failure_message(&e),
                email: email.into_inner(),
            }
            .into_response()
        }
    }
}
