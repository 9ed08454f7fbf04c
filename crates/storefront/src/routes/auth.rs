//! Authentication route handlers.
//!
//! Login and registration are delegated to the Veya API. On success the
//! backend's session cookies are kept in the storefront session (see
//! `CurrentUser`) and replayed on every authenticated call.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use secrecy::SecretString;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use veya_core::Email;

use crate::api::{ApiError, BackendSession, Registration, User};
use crate::error::{AppError, Result, add_breadcrumb, clear_sentry_user, set_sentry_user};
use crate::filters;
use crate::middleware::{OptionalAuth, safe_next, set_current_user};
use crate::models::CurrentUser;
use crate::routes::context::PageContext;
use crate::state::AppState;

const LOGIN_FAILED: &str = "Login failed. Please check your credentials and try again.";
const REGISTRATION_FAILED: &str = "Registration failed. Please try again.";

// =============================================================================
// Form Types
// =============================================================================

/// Login form data.
#[derive(Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    pub next: Option<String>,
}

/// Registration form data.
#[derive(Deserialize)]
pub struct RegisterForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub password_confirm: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
}

/// Query parameters for the login page.
#[derive(Debug, Deserialize)]
pub struct LoginQuery {
    pub next: Option<String>,
}

// =============================================================================
// Templates
// =============================================================================

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub page: PageContext,
    pub error: Option<String>,
    pub username: String,
    pub next: String,
}

/// Register page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/register.html")]
pub struct RegisterTemplate {
    pub page: PageContext,
    pub error: Option<String>,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

impl RegisterTemplate {
    fn with_error(page: PageContext, form: &RegisterForm, error: impl Into<String>) -> Self {
        Self {
            page,
            error: Some(error.into()),
            username: form.username.trim().to_string(),
            email: form.email.trim().to_string(),
            first_name: form.first_name.trim().to_string(),
            last_name: form.last_name.trim().to_string(),
        }
    }
}

// =============================================================================
// Helpers
// =============================================================================

/// Message to show for a failed login or registration.
fn failure_message(error: &ApiError, fallback: &str) -> String {
    error.user_message().unwrap_or(fallback).to_string()
}

/// Check the registration form before bothering the backend.
///
/// # Errors
///
/// Returns the message to show above the form.
pub fn validate_registration(form: &RegisterForm) -> std::result::Result<Registration, String> {
    let username = form.username.trim();
    if username.is_empty() || form.email.trim().is_empty() || form.password.is_empty() {
        return Err("Username, email and password are required".to_string());
    }

    let email = Email::parse_normalized(&form.email)
        .map_err(|_| "Please enter a valid email address".to_string())?;

    if form.password != form.password_confirm {
        return Err("Passwords do not match".to_string());
    }

    Ok(Registration {
        username: username.to_string(),
        email: email.into_inner(),
        password: SecretString::from(form.password.clone()),
        first_name: form.first_name.trim().to_string(),
        last_name: form.last_name.trim().to_string(),
    })
}

/// Store the freshly authenticated user in the session.
async fn start_session(session: &Session, user: &User, backend: BackendSession) -> Result<()> {
    let current = CurrentUser::new(user, backend);
    set_current_user(session, &current).await?;
    set_sentry_user(&current.id, &current.username);
    Ok(())
}

// =============================================================================
// Login Routes
// =============================================================================

/// Display the login page. Logged-in customers go straight to `next`.
#[instrument(skip(page, user))]
pub async fn login_page(
    page: PageContext,
    OptionalAuth(user): OptionalAuth,
    Query(query): Query<LoginQuery>,
) -> Response {
    let next = safe_next(query.next.as_deref());
    if user.is_some() {
        return Redirect::to(&next).into_response();
    }

    LoginTemplate {
        page,
        error: None,
        username: String::new(),
        next,
    }
    .into_response()
}

/// Handle login form submission.
#[instrument(skip(state, session, page, form), fields(username = %form.username))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    page: PageContext,
    Form(form): Form<LoginForm>,
) -> Result<Response> {
    let next = safe_next(form.next.as_deref());
    let username = form.username.trim().to_string();
    let page = page.with_notice(None);

    if username.is_empty() || form.password.is_empty() {
        return Ok(LoginTemplate {
            page,
            error: Some("Username and password are required".to_string()),
            username,
            next,
        }
        .into_response());
    }

    let password = SecretString::from(form.password);
    match state.api().login(&username, &password).await {
        Ok((user, backend)) => {
            start_session(&session, &user, backend).await?;
            add_breadcrumb("auth", "Logged in", None);
            tracing::info!(user.id = %user.id, "Customer logged in");
            Ok(Redirect::to(&next).into_response())
        }
        Err(e) => {
            tracing::warn!("Login failed: {e}");
            if matches!(e, ApiError::RateLimited(_)) {
                return Err(AppError::RateLimited);
            }
            Ok(LoginTemplate {
                page,
                error: Some(failure_message(&e, LOGIN_FAILED)),
                username,
                next,
            }
            .into_response())
        }
    }
}

// =============================================================================
// Registration Routes
// =============================================================================

/// Display the registration page.
#[instrument(skip(page, user))]
pub async fn register_page(page: PageContext, OptionalAuth(user): OptionalAuth) -> Response {
    if user.is_some() {
        return Redirect::to("/").into_response();
    }

    RegisterTemplate {
        page,
        error: None,
        username: String::new(),
        email: String::new(),
        first_name: String::new(),
        last_name: String::new(),
    }
    .into_response()
}

/// Handle registration form submission. A successful registration logs the
/// customer in.
#[instrument(skip(state, session, page, form), fields(username = %form.username))]
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    page: PageContext,
    Form(form): Form<RegisterForm>,
) -> Result<Response> {
    let page = page.with_notice(None);

    let registration = match validate_registration(&form) {
        Ok(registration) => registration,
        Err(error) => {
            return Ok(RegisterTemplate::with_error(page, &form, error).into_response());
        }
    };

    match state.api().register(&registration).await {
        Ok((user, backend)) => {
            start_session(&session, &user, backend).await?;
            add_breadcrumb("auth", "Registered", None);
            tracing::info!(user.id = %user.id, "Customer registered");
            Ok(Redirect::to("/").into_response())
        }
        Err(e) => {
            tracing::warn!("Registration failed: {e}");
            if matches!(e, ApiError::RateLimited(_)) {
                return Err(AppError::RateLimited);
            }
            let error = failure_message(&e, REGISTRATION_FAILED);
            Ok(RegisterTemplate::with_error(page, &form, error).into_response())
        }
    }
}

// =============================================================================
// Logout
// =============================================================================

/// Log out: end the backend session (best effort) and drop the local one.
#[instrument(skip(state, session, user))]
pub async fn logout(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
) -> Result<Response> {
    if let Some(user) = user
        && let Err(e) = state.api().logout(&user.backend).await
    {
        tracing::warn!("Backend logout failed: {e}");
    }

    session.flush().await?;
    clear_sentry_user();
    add_breadcrumb("auth", "Logged out", None);

    Ok(Redirect::to("/?notice=logged_out").into_response())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::ExposeSecret;

    use super::*;

    fn form() -> RegisterForm {
        RegisterForm {
            username: " ananya_k ".to_string(),
            email: "Ananya@Example.com".to_string(),
            password: "glow-up-2024".to_string(),
            password_confirm: "glow-up-2024".to_string(),
            first_name: "Ananya".to_string(),
            last_name: String::new(),
        }
    }

    #[test]
    fn test_valid_registration_is_normalised() {
        let registration = validate_registration(&form()).ok().unwrap();
        assert_eq!(registration.username, "ananya_k");
        assert_eq!(registration.email, "ananya@example.com");
        assert_eq!(registration.password.expose_secret(), "glow-up-2024");
    }

    #[test]
    fn test_registration_requires_fields() {
        let missing = RegisterForm {
            username: "  ".to_string(),
            ..form()
        };
        assert_eq!(
            validate_registration(&missing).err().unwrap(),
            "Username, email and password are required"
        );
    }

    #[test]
    fn test_registration_checks_email_and_passwords() {
        let bad_email = RegisterForm {
            email: "ananya.example.com".to_string(),
            ..form()
        };
        assert_eq!(
            validate_registration(&bad_email).err().unwrap(),
            "Please enter a valid email address"
        );

        let mismatch = RegisterForm {
            password_confirm: "glow-up-2025".to_string(),
            ..form()
        };
        assert_eq!(
            validate_registration(&mismatch).err().unwrap(),
            "Passwords do not match"
        );
    }

    #[test]
    fn test_failure_message_prefers_backend_text() {
        let rejected = ApiError::Status {
            status: 400,
            message: "Invalid credentials".to_string(),
        };
        assert_eq!(failure_message(&rejected, LOGIN_FAILED), "Invalid credentials");

        let down = ApiError::Status {
            status: 503,
            message: "upstream".to_string(),
        };
        assert_eq!(failure_message(&down, LOGIN_FAILED), LOGIN_FAILED);
    }
}
