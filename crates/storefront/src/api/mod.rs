//! Veya REST API client.
//!
//! # Architecture
//!
//! - The backend is the source of truth. The storefront never persists
//!   catalog, cart or order data, it renders what the API returns.
//! - Catalog reads (categories, product lists, product detail) are cached in
//!   memory via `moka`. Cart, order and account calls are never cached.
//! - Authentication is the backend's cookie session, captured at login and
//!   replayed as a [`BackendSession`].
//!
//! # Example
//!
//! ```rust,ignore
//! use veya_storefront::api::{ApiClient, ProductQuery};
//!
//! let client = ApiClient::new(&config.api)?;
//!
//! let trending = client.list_products(&ProductQuery::trending(8)).await?;
//! let (user, session) = client.login("ananya_k", &password).await?;
//! client.add_to_cart(&session, trending.items[0].id, 1).await?;
//! ```

mod cache;
mod client;
mod session;
pub mod types;

pub use client::ApiClient;
pub use session::BackendSession;
pub use types::*;

use thiserror::Error;

/// Errors that can occur when talking to the Veya API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP request failed (connection refused, timeout, ...).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a non-success status.
    #[error("API returned {status}: {message}")]
    Status { status: u16, message: String },

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The backend rejected the session cookies.
    #[error("Backend session is no longer valid")]
    Unauthorized,

    /// Rate limited by the API.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// A request URL could not be built.
    #[error("Invalid API URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Login or registration succeeded but no session cookie came back.
    #[error("API did not issue a session cookie")]
    MissingSession,
}

impl ApiError {
    /// Message from the backend that is safe to show to the customer.
    ///
    /// Only client errors (4xx) carry backend wording worth showing; anything
    /// else is an outage the customer cannot act on.
    #[must_use]
    pub fn user_message(&self) -> Option<&str> {
        match self {
            Self::Status { status, message } if (400..500).contains(status) => Some(message),
            Self::NotFound(message) => Some(message),
            _ => None,
        }
    }

    /// Whether the error means the backend session has expired.
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized)
    }
}

/// Pull a human-readable message out of an error response body.
///
/// Checks `error`, then `detail`, then `non_field_errors`, then the first
/// field error of a validation response (`{"email": ["Enter a valid..."]}`).
fn error_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    let object = value.as_object()?;

    for key in ["error", "detail"] {
        if let Some(message) = object.get(key).and_then(first_string) {
            return Some(message);
        }
    }

    if let Some(message) = object.get("non_field_errors").and_then(first_string) {
        return Some(message);
    }

    object
        .iter()
        .find_map(|(field, errors)| first_string(errors).map(|msg| format!("{field}: {msg}")))
}

/// A string value, or the first string in an array.
fn first_string(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) if !s.is_empty() => Some(s.clone()),
        serde_json::Value::Array(items) => items.iter().find_map(first_string),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_message_prefers_error_field() {
        let body = r#"{"error": "Invalid username or password", "detail": "ignored"}"#;
        assert_eq!(
            error_message(body).as_deref(),
            Some("Invalid username or password")
        );
    }

    #[test]
    fn test_error_message_falls_back_to_detail() {
        let body = r#"{"detail": "Authentication credentials were not provided."}"#;
        assert_eq!(
            error_message(body).as_deref(),
            Some("Authentication credentials were not provided.")
        );
    }

    #[test]
    fn test_error_message_non_field_errors() {
        let body = r#"{"non_field_errors": ["Cart is locked"]}"#;
        assert_eq!(error_message(body).as_deref(), Some("Cart is locked"));
    }

    #[test]
    fn test_error_message_field_errors() {
        let body = r#"{"email": ["Enter a valid email address."]}"#;
        assert_eq!(
            error_message(body).as_deref(),
            Some("email: Enter a valid email address.")
        );
    }

    #[test]
    fn test_error_message_non_json() {
        assert_eq!(error_message("<html>Bad Gateway</html>"), None);
        assert_eq!(error_message(r#"["a"]"#), None);
    }

    #[test]
    fn test_user_message_only_for_client_errors() {
        let bad_request = ApiError::Status {
            status: 400,
            message: "Cart is empty".to_string(),
        };
        assert_eq!(bad_request.user_message(), Some("Cart is empty"));

        let server_error = ApiError::Status {
            status: 500,
            message: "Traceback".to_string(),
        };
        assert_eq!(server_error.user_message(), None);
        assert_eq!(ApiError::Unauthorized.user_message(), None);
        assert!(ApiError::Unauthorized.is_unauthorized());
    }
}
