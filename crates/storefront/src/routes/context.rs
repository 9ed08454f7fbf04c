//! Layout data shared by every full page.
//!
//! The base template needs the CSP nonce for its `<script>` tags, the
//! logged-in customer's name for the header, and the notice decoded from
//! `?notice=` / `?error=`. Handlers take a `PageContext` instead of pulling
//! those three things apart themselves.

use axum::{
    extract::{FromRequestParts, Query},
    http::request::Parts,
};
use serde::Deserialize;

use crate::middleware::{CspNonce, OptionalAuth, request_target};
use crate::models::Notice;

/// Notice codes carried in the query string.
#[derive(Debug, Default, Deserialize)]
struct NoticeParams {
    notice: Option<String>,
    error: Option<String>,
}

/// Layout data for `base.html`.
#[derive(Debug, Clone)]
pub struct PageContext {
    /// CSP nonce for inline and third-party scripts.
    pub nonce: String,
    /// Display name of the logged-in customer.
    pub user_name: Option<String>,
    /// Notice to show above the page content.
    pub notice: Option<Notice>,
    /// Path and query of this request, used as the login `next` target.
    pub current_path: String,
}

impl PageContext {
    /// Whether a customer is logged in.
    #[must_use]
    pub const fn is_logged_in(&self) -> bool {
        self.user_name.is_some()
    }

    /// Replace the notice (e.g. a validation error rendered in place).
    #[must_use]
    pub const fn with_notice(mut self, notice: Option<Notice>) -> Self {
        self.notice = notice;
        self
    }
}

impl<S> FromRequestParts<S> for PageContext
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let CspNonce(nonce) = CspNonce::from_request_parts(parts, state).await?;
        let OptionalAuth(user) = OptionalAuth::from_request_parts(parts, state).await?;

        let params = Query::<NoticeParams>::try_from_uri(&parts.uri)
            .map(|Query(params)| params)
            .unwrap_or_default();

        Ok(Self {
            nonce,
            user_name: user.map(|u| u.display_name().to_string()),
            notice: Notice::from_query(params.notice.as_deref(), params.error.as_deref()),
            current_path: request_target(parts),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::Request;

    use super::*;

    async fn extract(uri: &str) -> PageContext {
        let (mut parts, ()) = Request::builder()
            .uri(uri)
            .body(())
            .unwrap()
            .into_parts();
        parts
            .extensions
            .insert(CspNonce("bm9uY2U=".to_string()));
        PageContext::from_request_parts(&mut parts, &()).await.unwrap()
    }

    #[tokio::test]
    async fn test_decodes_notice_and_nonce() {
        let page = extract("/products?notice=added").await;
        assert_eq!(page.nonce, "bm9uY2U=");
        assert_eq!(
            page.notice.map(|n| n.message),
            Some("Product added to cart!")
        );
        assert_eq!(page.current_path, "/products?notice=added");
        assert!(!page.is_logged_in());
    }

    #[tokio::test]
    async fn test_current_path_survives_nesting() {
        let (mut parts, ()) = Request::builder()
            .uri("/rose-mist-toner")
            .body(())
            .unwrap()
            .into_parts();
        parts
            .extensions
            .insert(CspNonce("bm9uY2U=".to_string()));
        parts.extensions.insert(axum::extract::OriginalUri(
            "/products/rose-mist-toner".parse().unwrap(),
        ));

        let page = PageContext::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(page.current_path, "/products/rose-mist-toner");
    }

    #[tokio::test]
    async fn test_unknown_codes_are_ignored() {
        let page = extract("/?notice=%3Cscript%3E").await;
        assert!(page.notice.is_none());
    }
}
