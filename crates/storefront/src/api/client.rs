//! Veya REST API client implementation.
//!
//! Uses `reqwest` 0.13 for HTTP. Catalog responses are cached with `moka`
//! for the configured TTL.

use std::sync::Arc;

use moka::future::Cache;
use reqwest::header::{ACCEPT, COOKIE, REFERER, SET_COOKIE};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::{debug, instrument};
use url::Url;

use veya_core::{CartItemId, ProductId};

use super::cache::{CATEGORIES_KEY, CacheValue, FEATURED_KEY, product_key};
use super::types::{
    CartItem, CartTotal, Category, Listing, NewOrder, Order, Product, ProductQuery, ProfileUpdate,
    Registration, User,
};
use super::{ApiError, BackendSession, error_message};
use crate::config::ApiConfig;

/// Longest body excerpt written to logs.
const LOG_BODY_LIMIT: usize = 500;

// =============================================================================
// ApiClient
// =============================================================================

/// Client for the Veya REST API.
///
/// Cheap to clone; clones share the connection pool and the catalog cache.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    client: reqwest::Client,
    base_url: Url,
    referer: String,
    cache: Cache<String, CacheValue>,
}

impl ApiClient {
    /// Create a new API client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let cache = Cache::builder()
            .max_capacity(config.cache_capacity)
            .time_to_live(config.cache_ttl)
            .build();

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("veya-storefront/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let referer = format!("{}/", config.base_url.origin().ascii_serialization());

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                client,
                base_url: config.base_url.clone(),
                referer,
                cache,
            }),
        })
    }

    /// Base URL all request paths are resolved against.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// Drop every cached catalog response.
    pub fn invalidate_cache(&self) {
        self.inner.cache.invalidate_all();
    }

    /// Build a request for a path relative to the API root.
    ///
    /// Authenticated requests carry the session cookies; unsafe methods also
    /// carry the CSRF token and a same-origin `Referer`.
    fn request(
        &self,
        method: Method,
        url: Url,
        session: Option<&BackendSession>,
    ) -> RequestBuilder {
        let is_unsafe = !matches!(method, Method::GET | Method::HEAD | Method::OPTIONS);
        let mut request = self
            .inner
            .client
            .request(method, url)
            .header(ACCEPT, "application/json");

        if let Some(session) = session {
            request = request.header(COOKIE, session.cookie_header());
            if is_unsafe {
                if let Some(csrf) = &session.csrf_token {
                    request = request.header("X-CSRFToken", csrf);
                }
                request = request.header(REFERER, &self.inner.referer);
            }
        }

        request
    }

    fn url(&self, path: &str) -> Result<Url, ApiError> {
        Ok(self.inner.base_url.join(path)?)
    }

    /// Send a request and turn non-success statuses into errors.
    async fn execute(
        &self,
        request: RequestBuilder,
        authenticated: bool,
    ) -> Result<Response, ApiError> {
        let response = request.send().await?;
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        // Check for rate limiting
        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(ApiError::RateLimited(retry_after));
        }

        let body = response.text().await.unwrap_or_default();
        let message = error_message(&body).unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("Request failed")
                .to_string()
        });

        match status {
            StatusCode::NOT_FOUND => Err(ApiError::NotFound(message)),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN if authenticated => {
                debug!(status = %status, "Backend rejected session");
                Err(ApiError::Unauthorized)
            }
            _ => {
                if status.is_server_error() {
                    tracing::error!(
                        status = %status,
                        body = %body.chars().take(LOG_BODY_LIMIT).collect::<String>(),
                        "Veya API returned server error"
                    );
                } else {
                    debug!(status = %status, message = %message, "Veya API rejected request");
                }
                Err(ApiError::Status {
                    status: status.as_u16(),
                    message,
                })
            }
        }
    }

    /// Read a JSON body, logging an excerpt when it does not parse.
    async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %text.chars().take(LOG_BODY_LIMIT).collect::<String>(),
                "Failed to parse Veya API response"
            );
            ApiError::Parse(e)
        })
    }

    /// GET a list endpoint and apply the array/type guard.
    async fn get_listing<T: DeserializeOwned>(
        &self,
        url: Url,
        session: Option<&BackendSession>,
    ) -> Result<Listing<T>, ApiError> {
        let request = self.request(Method::GET, url, session);
        let response = self.execute(request, session.is_some()).await?;
        let value: serde_json::Value = Self::read_json(response).await?;
        Ok(Listing::from_value(value)?)
    }

    /// Send a JSON body with an authenticated unsafe method.
    async fn send_json<B: serde::Serialize + Sync, T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        session: &BackendSession,
        body: &B,
    ) -> Result<T, ApiError> {
        let request = self
            .request(method, self.url(path)?, Some(session))
            .json(body);
        let response = self.execute(request, true).await?;
        Self::read_json(response).await
    }

    // =========================================================================
    // Catalog Methods
    // =========================================================================

    /// List all product categories.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn list_categories(&self) -> Result<Vec<Category>, ApiError> {
        if let Some(CacheValue::Categories(categories)) =
            self.inner.cache.get(CATEGORIES_KEY).await
        {
            debug!("Cache hit for categories");
            return Ok(categories);
        }

        let listing = self
            .get_listing::<Category>(self.url("categories/")?, None)
            .await?;

        self.inner
            .cache
            .insert(
                CATEGORIES_KEY.to_string(),
                CacheValue::Categories(listing.items.clone()),
            )
            .await;

        Ok(listing.items)
    }

    /// List products matching a query.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self), fields(params = %query.cache_key()))]
    pub async fn list_products(&self, query: &ProductQuery) -> Result<Listing<Product>, ApiError> {
        let cache_key = query.cache_key();
        let cacheable = query.is_cacheable();

        if cacheable
            && let Some(CacheValue::Products(listing)) = self.inner.cache.get(&cache_key).await
        {
            debug!("Cache hit for products");
            return Ok(listing);
        }

        let mut url = self.url("products/")?;
        {
            let pairs = query.to_pairs();
            if !pairs.is_empty() {
                url.query_pairs_mut().extend_pairs(pairs);
            }
        }

        let listing = self.get_listing::<Product>(url, None).await?;

        if cacheable {
            self.inner
                .cache
                .insert(cache_key, CacheValue::Products(listing.clone()))
                .await;
        }

        Ok(listing)
    }

    /// Get a product by its slug.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` if no product has this slug, or another
    /// error if the API request fails.
    #[instrument(skip(self), fields(slug = %slug))]
    pub async fn get_product(&self, slug: &str) -> Result<Product, ApiError> {
        let cache_key = product_key(slug);

        if let Some(CacheValue::Product(product)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for product");
            return Ok(*product);
        }

        let url = self.url(&format!("products/{}/", urlencoding::encode(slug)))?;
        let request = self.request(Method::GET, url, None);
        let response = self.execute(request, false).await?;
        let product: Product = Self::read_json(response).await?;

        self.inner
            .cache
            .insert(cache_key, CacheValue::Product(Box::new(product.clone())))
            .await;

        Ok(product)
    }

    /// Products flagged as trending or bestselling by the backend.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn featured_products(&self) -> Result<Vec<Product>, ApiError> {
        if let Some(CacheValue::Products(listing)) = self.inner.cache.get(FEATURED_KEY).await {
            debug!("Cache hit for featured products");
            return Ok(listing.items);
        }

        let listing = self
            .get_listing::<Product>(self.url("products/featured/")?, None)
            .await?;

        self.inner
            .cache
            .insert(
                FEATURED_KEY.to_string(),
                CacheValue::Products(listing.clone()),
            )
            .await;

        Ok(listing.items)
    }

    /// Check that the API is reachable. Never cached.
    ///
    /// # Errors
    ///
    /// Returns an error if the API does not answer with a success status.
    #[instrument(skip(self))]
    pub async fn ping(&self) -> Result<(), ApiError> {
        let request = self.request(Method::GET, self.url("categories/")?, None);
        self.execute(request, false).await?;
        Ok(())
    }

    // =========================================================================
    // Authentication Methods
    // =========================================================================

    /// Log in with username and password.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Status` with the backend's message for bad
    /// credentials, `ApiError::MissingSession` if no session cookie was
    /// issued, or another error if the request fails.
    #[instrument(skip(self, password), fields(username = %username))]
    pub async fn login(
        &self,
        username: &str,
        password: &SecretString,
    ) -> Result<(User, BackendSession), ApiError> {
        let request = self
            .request(Method::POST, self.url("auth/login/")?, None)
            .json(&json!({
                "username": username,
                "password": password.expose_secret(),
            }));

        let response = self.execute(request, false).await?;
        Self::read_session_user(response).await
    }

    /// Register a new account. The backend logs the new user in.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Status` with the backend's message for rejected
    /// registrations (duplicate username or email), or another error if the
    /// request fails.
    #[instrument(skip(self, registration), fields(username = %registration.username))]
    pub async fn register(
        &self,
        registration: &Registration,
    ) -> Result<(User, BackendSession), ApiError> {
        let request = self
            .request(Method::POST, self.url("auth/register/")?, None)
            .json(&json!({
                "username": registration.username,
                "email": registration.email,
                "password": registration.password.expose_secret(),
                "first_name": registration.first_name,
                "last_name": registration.last_name,
            }));

        let response = self.execute(request, false).await?;
        Self::read_session_user(response).await
    }

    async fn read_session_user(response: Response) -> Result<(User, BackendSession), ApiError> {
        let session = BackendSession::from_set_cookie(
            response
                .headers()
                .get_all(SET_COOKIE)
                .iter()
                .filter_map(|value| value.to_str().ok()),
        )
        .ok_or(ApiError::MissingSession)?;

        let user: User = Self::read_json(response).await?;
        Ok((user, session))
    }

    /// End the backend session.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self, session))]
    pub async fn logout(&self, session: &BackendSession) -> Result<(), ApiError> {
        let request = self.request(Method::POST, self.url("auth/logout/")?, Some(session));
        self.execute(request, false).await?;
        Ok(())
    }

    /// Get the logged-in user's profile.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Unauthorized` if the session has expired.
    #[instrument(skip(self, session))]
    pub async fn current_user(&self, session: &BackendSession) -> Result<User, ApiError> {
        let request = self.request(Method::GET, self.url("users/me/")?, Some(session));
        let response = self.execute(request, true).await?;
        Self::read_json(response).await
    }

    /// Update first name, last name and email.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Status` with the validation message if the backend
    /// rejects the update.
    #[instrument(skip(self, session, update))]
    pub async fn update_profile(
        &self,
        session: &BackendSession,
        update: &ProfileUpdate,
    ) -> Result<User, ApiError> {
        self.send_json(Method::PATCH, "users/me/", session, update)
            .await
    }

    // =========================================================================
    // Cart Methods
    // =========================================================================

    /// Get the items in the user's cart.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Unauthorized` if the session has expired.
    #[instrument(skip(self, session))]
    pub async fn cart_items(&self, session: &BackendSession) -> Result<Vec<CartItem>, ApiError> {
        let listing = self
            .get_listing::<CartItem>(self.url("cart/")?, Some(session))
            .await?;
        Ok(listing.items)
    }

    /// Get the cart total as computed by the backend.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Unauthorized` if the session has expired.
    #[instrument(skip(self, session))]
    pub async fn cart_total(&self, session: &BackendSession) -> Result<CartTotal, ApiError> {
        let request = self.request(Method::GET, self.url("cart/total/")?, Some(session));
        let response = self.execute(request, true).await?;
        Self::read_json(response).await
    }

    /// Add a product to the cart. Adding a product already in the cart
    /// increases its quantity.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` for unknown products.
    #[instrument(skip(self, session))]
    pub async fn add_to_cart(
        &self,
        session: &BackendSession,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<CartItem, ApiError> {
        self.send_json(
            Method::POST,
            "cart/",
            session,
            &json!({ "product_id": product_id, "quantity": quantity }),
        )
        .await
    }

    /// Set the quantity of a cart line.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` if the line no longer exists.
    #[instrument(skip(self, session))]
    pub async fn update_cart_item(
        &self,
        session: &BackendSession,
        item_id: CartItemId,
        quantity: u32,
    ) -> Result<CartItem, ApiError> {
        self.send_json(
            Method::PATCH,
            &format!("cart/{item_id}/"),
            session,
            &json!({ "quantity": quantity }),
        )
        .await
    }

    /// Remove a line from the cart.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` if the line no longer exists.
    #[instrument(skip(self, session))]
    pub async fn remove_cart_item(
        &self,
        session: &BackendSession,
        item_id: CartItemId,
    ) -> Result<(), ApiError> {
        let url = self.url(&format!("cart/{item_id}/"))?;
        let request = self.request(Method::DELETE, url, Some(session));
        self.execute(request, true).await?;
        Ok(())
    }

    // =========================================================================
    // Order Methods
    // =========================================================================

    /// Get the user's order history.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Unauthorized` if the session has expired.
    #[instrument(skip(self, session))]
    pub async fn list_orders(&self, session: &BackendSession) -> Result<Vec<Order>, ApiError> {
        let listing = self
            .get_listing::<Order>(self.url("orders/")?, Some(session))
            .await?;
        Ok(listing.items)
    }

    /// Turn the current cart into an order. The backend clears the cart.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Status` ("Cart is empty") if there is nothing to
    /// order.
    #[instrument(skip(self, session, order))]
    pub async fn place_order(
        &self,
        session: &BackendSession,
        order: &NewOrder,
    ) -> Result<Order, ApiError> {
        self.send_json(Method::POST, "orders/", session, order)
            .await
    }

    // =========================================================================
    // Newsletter
    // =========================================================================

    /// Subscribe an email address to the newsletter.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the address or the request
    /// fails.
    #[instrument(skip(self, email))]
    pub async fn subscribe_newsletter(&self, email: &str) -> Result<(), ApiError> {
        let request = self
            .request(Method::POST, self.url("newsletter/subscribe/")?, None)
            .json(&json!({ "email": email }));
        self.execute(request, false).await?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn client() -> ApiClient {
        ApiClient::new(&ApiConfig::with_base_url("http://localhost:8000/api").unwrap()).unwrap()
    }

    fn session() -> BackendSession {
        BackendSession {
            session_id: "abc123".to_string(),
            csrf_token: Some("Tk9x2".to_string()),
        }
    }

    #[test]
    fn test_url_keeps_api_prefix() {
        let client = client();
        assert_eq!(
            client.url("cart/total/").unwrap().as_str(),
            "http://localhost:8000/api/cart/total/"
        );
    }

    #[test]
    fn test_referer_is_api_origin() {
        assert_eq!(client().inner.referer, "http://localhost:8000/");
    }

    #[test]
    fn test_unsafe_request_carries_csrf() {
        let client = client();
        let url = client.url("cart/").unwrap();
        let request = client
            .request(Method::POST, url, Some(&session()))
            .build()
            .unwrap();

        let headers = request.headers();
        assert_eq!(headers[COOKIE], "sessionid=abc123; csrftoken=Tk9x2");
        assert_eq!(headers["X-CSRFToken"], "Tk9x2");
        assert_eq!(headers[REFERER], "http://localhost:8000/");
    }

    #[test]
    fn test_safe_request_has_no_csrf_header() {
        let client = client();
        let url = client.url("cart/").unwrap();
        let request = client
            .request(Method::GET, url, Some(&session()))
            .build()
            .unwrap();

        assert!(request.headers().contains_key(COOKIE));
        assert!(!request.headers().contains_key("X-CSRFToken"));
    }

    #[test]
    fn test_anonymous_request_has_no_cookie() {
        let client = client();
        let url = client.url("products/").unwrap();
        let request = client.request(Method::GET, url, None).build().unwrap();
        assert!(!request.headers().contains_key(COOKIE));
    }
}
