//! Integration test harness for the Veya storefront.
//!
//! Tests run the real storefront router against [`MockApi`], an in-process
//! stand-in for the Veya REST API that speaks the same JSON, cookie session
//! and CSRF conventions. Both servers bind to `127.0.0.1:0`, so tests run in
//! parallel without any outside services.
//!
//! ```rust,ignore
//! let api = MockApi::spawn().await;
//! let storefront = Storefront::spawn(&api).await;
//!
//! storefront.login(USERNAME, PASSWORD).await;
//! let resp = storefront.get("/cart").await;
//! ```

#![allow(clippy::missing_panics_doc, clippy::expect_used)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use axum::{
    Json, Router, ServiceExt,
    extract::{Path, Query, Request, State},
    http::{HeaderMap, Method, StatusCode, header},
    middleware::Next,
    response::{AppendHeaders, IntoResponse, Response},
    routing::{get, patch, post},
};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::net::TcpListener;

use veya_storefront::config::{ApiConfig, StorefrontConfig};
use veya_storefront::state::AppState;

/// Username of the customer every mock starts with.
pub const USERNAME: &str = "ananya_k";
/// Password of the seeded customer.
pub const PASSWORD: &str = "rosewater-22";

// =============================================================================
// Catalog Fixtures
// =============================================================================

const CATEGORIES: [(i32, &str, &str); 4] = [
    (1, "Skincare", "skincare"),
    (2, "Makeup", "makeup"),
    (3, "Haircare", "haircare"),
    (4, "Fragrance", "fragrance"),
];

#[derive(Debug, Clone)]
struct MockProduct {
    id: i32,
    name: &'static str,
    slug: &'static str,
    category: usize,
    price: Decimal,
    discount_price: Option<Decimal>,
    skin_type: &'static str,
    trending: bool,
    bestseller: bool,
    is_new: bool,
    tags: &'static [&'static str],
}

impl MockProduct {
    fn selling_price(&self) -> Decimal {
        self.discount_price.unwrap_or(self.price)
    }

    fn discount_percentage(&self) -> Decimal {
        self.discount_price.map_or(Decimal::ZERO, |discounted| {
            ((self.price - discounted) / self.price * Decimal::ONE_HUNDRED).round_dp(2)
        })
    }

    fn to_json(&self) -> Value {
        let (id, name, slug) = CATEGORIES[self.category];
        json!({
            "id": self.id,
            "name": self.name,
            "slug": self.slug,
            "description": format!("{} from the Veya {} range.", self.name, name.to_lowercase()),
            "price": self.price.to_string(),
            "discount_price": self.discount_price.map(|p| p.to_string()),
            "discount_percentage": self.discount_percentage().to_string(),
            "final_price": self.selling_price().to_string(),
            "rating": "4.50",
            "review_count": 12 + self.id,
            "image": null,
            "tags": self.tags,
            "stock": 40,
            "skin_type": self.skin_type,
            "is_trending": self.trending,
            "is_bestseller": self.bestseller,
            "is_new": self.is_new,
            "category": { "id": id, "name": name, "slug": slug },
            "created_at": format!("2025-01-{:02}T09:00:00Z", self.id),
        })
    }
}

fn catalog() -> Vec<MockProduct> {
    vec![
        MockProduct {
            id: 1,
            name: "Rose Mist Toner",
            slug: "rose-mist-toner",
            category: 0,
            price: Decimal::new(49_900, 2),
            discount_price: Some(Decimal::new(39_900, 2)),
            skin_type: "dry",
            trending: true,
            bestseller: false,
            is_new: false,
            tags: &["toner", "hydrating"],
        },
        MockProduct {
            id: 2,
            name: "Vitamin C Serum",
            slug: "vitamin-c-serum",
            category: 0,
            price: Decimal::new(89_900, 2),
            discount_price: None,
            skin_type: "oily",
            trending: true,
            bestseller: true,
            is_new: false,
            tags: &["serum", "brightening"],
        },
        MockProduct {
            id: 3,
            name: "Velvet Matte Lipstick",
            slug: "velvet-matte-lipstick",
            category: 1,
            price: Decimal::new(64_900, 2),
            discount_price: Some(Decimal::new(51_900, 2)),
            skin_type: "all",
            trending: false,
            bestseller: true,
            is_new: false,
            tags: &["lipstick", "matte"],
        },
        MockProduct {
            id: 4,
            name: "Argan Repair Shampoo",
            slug: "argan-repair-shampoo",
            category: 2,
            price: Decimal::new(54_900, 2),
            discount_price: None,
            skin_type: "all",
            trending: false,
            bestseller: true,
            is_new: true,
            tags: &["shampoo"],
        },
        MockProduct {
            id: 5,
            name: "Oud Noir Body Mist",
            slug: "oud-noir-body-mist",
            category: 3,
            price: Decimal::new(129_900, 2),
            discount_price: None,
            skin_type: "all",
            trending: false,
            bestseller: false,
            is_new: true,
            tags: &["mist", "fragrance"],
        },
        MockProduct {
            id: 6,
            name: "Hydra Gel Moisturiser",
            slug: "hydra-gel-moisturiser",
            category: 0,
            price: Decimal::new(74_900, 2),
            discount_price: Some(Decimal::new(67_400, 2)),
            skin_type: "sensitive",
            trending: true,
            bestseller: false,
            is_new: true,
            tags: &["moisturiser", "gel"],
        },
    ]
}

// =============================================================================
// Mock State
// =============================================================================

#[derive(Debug, Clone)]
struct MockUser {
    id: i32,
    username: String,
    password: String,
    email: String,
    first_name: String,
    last_name: String,
}

impl MockUser {
    fn to_json(&self) -> Value {
        json!({
            "id": self.id,
            "username": self.username,
            "email": self.email,
            "first_name": self.first_name,
            "last_name": self.last_name,
            "date_joined": "2024-11-02T08:15:00Z",
        })
    }
}

#[derive(Debug, Clone)]
struct CartLine {
    id: i32,
    user_id: i32,
    product_id: i32,
    quantity: u32,
}

#[derive(Debug, Default)]
struct Inner {
    users: Vec<MockUser>,
    sessions: HashMap<String, i32>,
    cart: Vec<CartLine>,
    orders: Vec<(i32, Value)>,
    subscribers: Vec<String>,
    hits: HashMap<String, usize>,
    /// `(query fragment, remaining)` pairs of product listings to fail.
    failing_listings: Vec<(String, usize)>,
    next_id: i32,
    down: bool,
}

impl Inner {
    fn next_id(&mut self) -> i32 {
        self.next_id += 1;
        self.next_id
    }
}

#[derive(Clone)]
struct MockState {
    inner: Arc<Mutex<Inner>>,
    products: Arc<Vec<MockProduct>>,
}

impl MockState {
    fn seeded() -> Self {
        let mut inner = Inner {
            next_id: 100,
            ..Inner::default()
        };
        let id = inner.next_id();
        inner.users.push(MockUser {
            id,
            username: USERNAME.to_string(),
            password: PASSWORD.to_string(),
            email: "ananya@example.in".to_string(),
            first_name: "Ananya".to_string(),
            last_name: "Krishnan".to_string(),
        });

        Self {
            inner: Arc::new(Mutex::new(inner)),
            products: Arc::new(catalog()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn product(&self, id: i32) -> Option<&MockProduct> {
        self.products.iter().find(|p| p.id == id)
    }

    fn cart_item_json(&self, line: &CartLine) -> Value {
        let Some(product) = self.product(line.product_id) else {
            return Value::Null;
        };
        json!({
            "id": line.id,
            "product": product.to_json(),
            "quantity": line.quantity,
            "total_price": (product.selling_price() * Decimal::from(line.quantity)).to_string(),
        })
    }

    /// Resolve the caller from its cookies, enforcing CSRF on unsafe methods.
    fn authenticate(&self, method: &Method, headers: &HeaderMap) -> Result<i32, Response> {
        let cookies = headers
            .get(header::COOKIE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();
        let cookie = |name: &str| {
            cookies
                .split(';')
                .filter_map(|pair| pair.trim().split_once('='))
                .find(|(key, _)| *key == name)
                .map(|(_, value)| value.to_string())
        };

        let user_id = cookie("sessionid").and_then(|id| self.lock().sessions.get(&id).copied());
        let Some(user_id) = user_id else {
            return Err(detail(
                StatusCode::FORBIDDEN,
                "Authentication credentials were not provided.",
            ));
        };

        if !matches!(*method, Method::GET | Method::HEAD) {
            let token = headers.get("X-CSRFToken").and_then(|v| v.to_str().ok());
            if token.is_none() || token.map(str::to_string) != cookie("csrftoken") {
                return Err(detail(
                    StatusCode::FORBIDDEN,
                    "CSRF Failed: CSRF token missing or incorrect.",
                ));
            }
        }

        Ok(user_id)
    }
}

fn detail(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "detail": message }))).into_response()
}

fn field_error(field: &str, message: &str) -> Response {
    (StatusCode::BAD_REQUEST, Json(json!({ field: [message] }))).into_response()
}

// =============================================================================
// Mock API Server
// =============================================================================

/// An in-process Veya REST API.
#[derive(Clone)]
pub struct MockApi {
    addr: SocketAddr,
    state: MockState,
}

impl MockApi {
    /// Start a mock API seeded with the catalog and one customer.
    pub async fn spawn() -> Self {
        let state = MockState::seeded();
        let app = Router::new()
            .nest("/api", api_routes())
            .layer(axum::middleware::from_fn_with_state(state.clone(), record_hit))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind mock API");
        let addr = listener.local_addr().expect("mock API address");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("mock API server");
        });

        Self { addr, state }
    }

    /// API root as the storefront expects it.
    #[must_use]
    pub fn base_url(&self) -> String {
        format!("http://{}/api/", self.addr)
    }

    /// Number of requests received for a path relative to the API root.
    #[must_use]
    pub fn hits(&self, path: &str) -> usize {
        let path = format!("/api/{path}");
        self.state.lock().hits.get(&path).copied().unwrap_or(0)
    }

    /// Catalog ID of a fixture product.
    #[must_use]
    pub fn product_id(&self, slug: &str) -> i32 {
        self.state
            .products
            .iter()
            .find(|p| p.slug == slug)
            .map(|p| p.id)
            .expect("fixture product")
    }

    /// `(slug, quantity)` for every line in a customer's cart.
    #[must_use]
    pub fn cart_of(&self, username: &str) -> Vec<(String, u32)> {
        let inner = self.state.lock();
        let Some(user) = inner.users.iter().find(|u| u.username == username) else {
            return Vec::new();
        };
        inner
            .cart
            .iter()
            .filter(|line| line.user_id == user.id)
            .filter_map(|line| {
                self.state
                    .product(line.product_id)
                    .map(|p| (p.slug.to_string(), line.quantity))
            })
            .collect()
    }

    /// Cart line ID of a product in a customer's cart.
    #[must_use]
    pub fn line_id(&self, username: &str, slug: &str) -> Option<i32> {
        let product_id = self.product_id(slug);
        let inner = self.state.lock();
        let user_id = inner.users.iter().find(|u| u.username == username)?.id;
        inner
            .cart
            .iter()
            .find(|line| line.user_id == user_id && line.product_id == product_id)
            .map(|line| line.id)
    }

    /// Number of orders placed so far.
    #[must_use]
    pub fn order_count(&self) -> usize {
        self.state.lock().orders.len()
    }

    /// Addresses subscribed to the newsletter.
    #[must_use]
    pub fn subscribers(&self) -> Vec<String> {
        self.state.lock().subscribers.clone()
    }

    /// Forget every backend session, as if they had all expired.
    pub fn expire_sessions(&self) {
        self.state.lock().sessions.clear();
    }

    /// Answer 503 to the next `times` product listings whose query string
    /// contains `fragment` (e.g. `"category="`).
    pub fn fail_listings(&self, fragment: &str, times: usize) {
        self.state
            .lock()
            .failing_listings
            .push((fragment.to_string(), times));
    }

    /// Make every endpoint answer 503 until called again with `false`.
    pub fn set_down(&self, down: bool) {
        self.state.lock().down = down;
    }
}

async fn record_hit(State(state): State<MockState>, request: Request, next: Next) -> Response {
    let unavailable = {
        let mut inner = state.lock();
        let path = request.uri().path().to_string();
        *inner.hits.entry(path.clone()).or_default() += 1;

        let query = request.uri().query().unwrap_or_default();
        let mut failed_listing = false;
        if path == "/api/products/"
            && let Some((_, remaining)) = inner
                .failing_listings
                .iter_mut()
                .find(|(fragment, remaining)| *remaining > 0 && query.contains(fragment.as_str()))
        {
            *remaining -= 1;
            failed_listing = true;
        }
        inner.down || failed_listing
    };
    if unavailable {
        return detail(StatusCode::SERVICE_UNAVAILABLE, "Service unavailable");
    }
    next.run(request).await
}

fn api_routes() -> Router<MockState> {
    Router::new()
        .route("/categories/", get(categories))
        .route("/products/", get(products))
        .route("/products/featured/", get(featured))
        .route("/products/{slug}/", get(product))
        .route("/auth/login/", post(login))
        .route("/auth/register/", post(register))
        .route("/auth/logout/", post(logout))
        .route("/users/me/", get(me).patch(update_me))
        .route("/cart/", get(cart).post(add_to_cart))
        .route("/cart/total/", get(cart_total))
        .route("/cart/{id}/", patch(update_line).delete(remove_line))
        .route("/orders/", get(orders).post(place_order))
        .route("/newsletter/subscribe/", post(subscribe))
}

// =============================================================================
// Catalog Handlers
// =============================================================================

/// Categories come back as a bare array.
async fn categories() -> Json<Value> {
    Json(
        CATEGORIES
            .iter()
            .map(|(id, name, slug)| json!({ "id": id, "name": name, "slug": slug }))
            .collect(),
    )
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ProductFilters {
    category: Option<String>,
    search: Option<String>,
    skin_type: Option<String>,
    trending: Option<bool>,
    bestseller: Option<bool>,
    ordering: Option<String>,
    page_size: Option<usize>,
}

/// Products come back in the paginated envelope.
async fn products(State(state): State<MockState>, Query(filters): Query<ProductFilters>) -> Json<Value> {
    let search = filters.search.as_deref().map(str::to_lowercase);
    let mut matches: Vec<&MockProduct> = state
        .products
        .iter()
        .filter(|p| {
            filters
                .category
                .as_deref()
                .is_none_or(|slug| CATEGORIES[p.category].2 == slug)
        })
        .filter(|p| {
            search
                .as_deref()
                .is_none_or(|term| p.name.to_lowercase().contains(term))
        })
        .filter(|p| {
            filters
                .skin_type
                .as_deref()
                .is_none_or(|skin| p.skin_type == skin || p.skin_type == "all")
        })
        .filter(|p| !filters.trending.unwrap_or(false) || p.trending)
        .filter(|p| !filters.bestseller.unwrap_or(false) || p.bestseller)
        .collect();

    if filters.ordering.as_deref() == Some("-created_at") {
        matches.reverse();
    }

    let count = matches.len();
    let page_size = filters.page_size.unwrap_or(count);
    let results: Vec<Value> = matches.iter().take(page_size).map(|p| p.to_json()).collect();
    let next = (count > page_size).then(|| "http://mock.invalid/api/products/?page=2".to_string());

    Json(json!({
        "count": count,
        "next": next,
        "previous": null,
        "results": results,
    }))
}

async fn featured(State(state): State<MockState>) -> Json<Value> {
    Json(
        state
            .products
            .iter()
            .filter(|p| p.trending || p.bestseller)
            .map(MockProduct::to_json)
            .collect(),
    )
}

async fn product(State(state): State<MockState>, Path(slug): Path<String>) -> Response {
    state.products.iter().find(|p| p.slug == slug).map_or_else(
        || detail(StatusCode::NOT_FOUND, "No Product matches the given query."),
        |p| Json(p.to_json()).into_response(),
    )
}

// =============================================================================
// Auth Handlers
// =============================================================================

#[derive(Debug, Deserialize)]
struct Credentials {
    username: String,
    password: String,
}

#[derive(Debug, Deserialize)]
struct NewUser {
    username: String,
    email: String,
    password: String,
    #[serde(default)]
    first_name: String,
    #[serde(default)]
    last_name: String,
}

/// Issue a backend session the way the API does: user JSON in the body,
/// `sessionid` and `csrftoken` in `Set-Cookie`.
fn session_response(inner: &mut Inner, user: &MockUser, status: StatusCode) -> Response {
    let n = inner.next_id();
    let session_id = format!("sess{}x{n}", user.id);
    let csrf = format!("csrf{n}");
    inner.sessions.insert(session_id.clone(), user.id);

    (
        status,
        AppendHeaders([
            (header::SET_COOKIE, format!("csrftoken={csrf}; Path=/; SameSite=Lax")),
            (
                header::SET_COOKIE,
                format!("sessionid={session_id}; HttpOnly; Path=/; SameSite=Lax"),
            ),
        ]),
        Json(user.to_json()),
    )
        .into_response()
}

async fn login(State(state): State<MockState>, Json(body): Json<Credentials>) -> Response {
    let mut inner = state.lock();
    let user = inner
        .users
        .iter()
        .find(|u| u.username == body.username && u.password == body.password)
        .cloned();

    match user {
        Some(user) => session_response(&mut inner, &user, StatusCode::OK),
        None => (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": "Invalid username or password" })),
        )
            .into_response(),
    }
}

async fn register(State(state): State<MockState>, Json(body): Json<NewUser>) -> Response {
    let mut inner = state.lock();

    if inner.users.iter().any(|u| u.username == body.username) {
        return field_error("username", "A user with that username already exists.");
    }
    if !body.email.contains('@') {
        return field_error("email", "Enter a valid email address.");
    }
    if body.password.len() < 8 {
        return field_error("password", "This password is too short.");
    }

    let user = MockUser {
        id: inner.next_id(),
        username: body.username,
        password: body.password,
        email: body.email,
        first_name: body.first_name,
        last_name: body.last_name,
    };
    inner.users.push(user.clone());
    session_response(&mut inner, &user, StatusCode::CREATED)
}

async fn logout(State(state): State<MockState>, method: Method, headers: HeaderMap) -> Response {
    let user_id = match state.authenticate(&method, &headers) {
        Ok(user_id) => user_id,
        Err(rejection) => return rejection,
    };
    state.lock().sessions.retain(|_, id| *id != user_id);
    Json(json!({ "detail": "Logged out" })).into_response()
}

// =============================================================================
// User Handlers
// =============================================================================

#[derive(Debug, Deserialize)]
struct ProfilePatch {
    first_name: Option<String>,
    last_name: Option<String>,
    email: Option<String>,
}

async fn me(State(state): State<MockState>, method: Method, headers: HeaderMap) -> Response {
    let user_id = match state.authenticate(&method, &headers) {
        Ok(user_id) => user_id,
        Err(rejection) => return rejection,
    };
    let inner = state.lock();
    inner.users.iter().find(|u| u.id == user_id).map_or_else(
        || detail(StatusCode::NOT_FOUND, "Not found."),
        |u| Json(u.to_json()).into_response(),
    )
}

async fn update_me(
    State(state): State<MockState>,
    method: Method,
    headers: HeaderMap,
    Json(body): Json<ProfilePatch>,
) -> Response {
    let user_id = match state.authenticate(&method, &headers) {
        Ok(user_id) => user_id,
        Err(rejection) => return rejection,
    };
    if body.email.as_deref().is_some_and(|email| !email.contains('@')) {
        return field_error("email", "Enter a valid email address.");
    }

    let mut inner = state.lock();
    let Some(user) = inner.users.iter_mut().find(|u| u.id == user_id) else {
        return detail(StatusCode::NOT_FOUND, "Not found.");
    };
    if let Some(first_name) = body.first_name {
        user.first_name = first_name;
    }
    if let Some(last_name) = body.last_name {
        user.last_name = last_name;
    }
    if let Some(email) = body.email {
        user.email = email;
    }
    Json(user.to_json()).into_response()
}

// =============================================================================
// Cart Handlers
// =============================================================================

#[derive(Debug, Deserialize)]
struct NewLine {
    product_id: i32,
    quantity: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct LineQuantity {
    quantity: u32,
}

async fn cart(State(state): State<MockState>, method: Method, headers: HeaderMap) -> Response {
    let user_id = match state.authenticate(&method, &headers) {
        Ok(user_id) => user_id,
        Err(rejection) => return rejection,
    };
    let lines: Vec<CartLine> = state
        .lock()
        .cart
        .iter()
        .filter(|line| line.user_id == user_id)
        .cloned()
        .collect();
    let items: Vec<Value> = lines.iter().map(|line| state.cart_item_json(line)).collect();
    Json(Value::Array(items)).into_response()
}

async fn cart_total(State(state): State<MockState>, method: Method, headers: HeaderMap) -> Response {
    let user_id = match state.authenticate(&method, &headers) {
        Ok(user_id) => user_id,
        Err(rejection) => return rejection,
    };
    let total: Decimal = state
        .lock()
        .cart
        .iter()
        .filter(|line| line.user_id == user_id)
        .filter_map(|line| {
            state
                .product(line.product_id)
                .map(|p| p.selling_price() * Decimal::from(line.quantity))
        })
        .sum();
    Json(json!({ "total": total.to_string() })).into_response()
}

async fn add_to_cart(
    State(state): State<MockState>,
    method: Method,
    headers: HeaderMap,
    Json(body): Json<NewLine>,
) -> Response {
    let user_id = match state.authenticate(&method, &headers) {
        Ok(user_id) => user_id,
        Err(rejection) => return rejection,
    };
    if state.product(body.product_id).is_none() {
        return detail(StatusCode::NOT_FOUND, "Product not found.");
    }
    let quantity = body.quantity.unwrap_or(1);
    if quantity == 0 {
        return field_error("quantity", "Ensure this value is greater than or equal to 1.");
    }

    let line = {
        let mut inner = state.lock();
        if let Some(line) = inner
            .cart
            .iter_mut()
            .find(|line| line.user_id == user_id && line.product_id == body.product_id)
        {
            line.quantity += quantity;
            line.clone()
        } else {
            let line = CartLine {
                id: inner.next_id(),
                user_id,
                product_id: body.product_id,
                quantity,
            };
            inner.cart.push(line.clone());
            line
        }
    };

    (StatusCode::CREATED, Json(state.cart_item_json(&line))).into_response()
}

async fn update_line(
    State(state): State<MockState>,
    method: Method,
    headers: HeaderMap,
    Path(id): Path<i32>,
    Json(body): Json<LineQuantity>,
) -> Response {
    let user_id = match state.authenticate(&method, &headers) {
        Ok(user_id) => user_id,
        Err(rejection) => return rejection,
    };
    let line = {
        let mut inner = state.lock();
        let Some(line) = inner
            .cart
            .iter_mut()
            .find(|line| line.id == id && line.user_id == user_id)
        else {
            return detail(StatusCode::NOT_FOUND, "Cart item not found.");
        };
        line.quantity = body.quantity;
        line.clone()
    };
    Json(state.cart_item_json(&line)).into_response()
}

async fn remove_line(
    State(state): State<MockState>,
    method: Method,
    headers: HeaderMap,
    Path(id): Path<i32>,
) -> Response {
    let user_id = match state.authenticate(&method, &headers) {
        Ok(user_id) => user_id,
        Err(rejection) => return rejection,
    };
    let mut inner = state.lock();
    let before = inner.cart.len();
    inner.cart.retain(|line| !(line.id == id && line.user_id == user_id));
    if inner.cart.len() == before {
        return detail(StatusCode::NOT_FOUND, "Cart item not found.");
    }
    StatusCode::NO_CONTENT.into_response()
}

// =============================================================================
// Order Handlers
// =============================================================================

#[derive(Debug, Deserialize)]
struct Shipping {
    full_name: String,
    email: String,
    shipping_address: String,
    city: String,
    state: String,
    pincode: String,
    #[serde(default)]
    phone: String,
}

async fn orders(State(state): State<MockState>, method: Method, headers: HeaderMap) -> Response {
    let user_id = match state.authenticate(&method, &headers) {
        Ok(user_id) => user_id,
        Err(rejection) => return rejection,
    };
    let placed: Vec<Value> = state
        .lock()
        .orders
        .iter()
        .rev()
        .filter(|(owner, _)| *owner == user_id)
        .map(|(_, order)| order.clone())
        .collect();
    Json(Value::Array(placed)).into_response()
}

async fn place_order(
    State(state): State<MockState>,
    method: Method,
    headers: HeaderMap,
    Json(body): Json<Shipping>,
) -> Response {
    let user_id = match state.authenticate(&method, &headers) {
        Ok(user_id) => user_id,
        Err(rejection) => return rejection,
    };

    let mut inner = state.lock();
    let (lines, rest): (Vec<CartLine>, Vec<CartLine>) = inner
        .cart
        .drain(..)
        .partition(|line| line.user_id == user_id);
    inner.cart = rest;

    if lines.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "Cart is empty" })),
        )
            .into_response();
    }

    let mut total = Decimal::ZERO;
    let mut items = Vec::new();
    for line in &lines {
        let Some(product) = state.product(line.product_id) else {
            continue;
        };
        total += product.selling_price() * Decimal::from(line.quantity);
        let item_id = inner.next_id();
        items.push(json!({
            "id": item_id,
            "product": product.to_json(),
            "quantity": line.quantity,
            "price": product.selling_price().to_string(),
        }));
    }

    let id = inner.next_id();
    let order = json!({
        "id": id,
        "order_number": format!("VEYA-{id:05}"),
        "total_amount": total.to_string(),
        "full_name": body.full_name,
        "email": body.email,
        "shipping_address": body.shipping_address,
        "city": body.city,
        "state": body.state,
        "pincode": body.pincode,
        "phone": body.phone,
        "status": "pending",
        "items": items,
        "created_at": "2025-02-14T10:30:00Z",
    });
    inner.orders.push((user_id, order.clone()));

    (StatusCode::CREATED, Json(order)).into_response()
}

// =============================================================================
// Newsletter Handler
// =============================================================================

#[derive(Debug, Deserialize)]
struct Subscription {
    email: String,
}

async fn subscribe(State(state): State<MockState>, Json(body): Json<Subscription>) -> Response {
    if !body.email.contains('@') {
        return field_error("email", "Enter a valid email address.");
    }
    let mut inner = state.lock();
    if inner.subscribers.contains(&body.email) {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "This email is already subscribed." })),
        )
            .into_response();
    }
    inner.subscribers.push(body.email);
    (
        StatusCode::CREATED,
        Json(json!({ "message": "Subscribed successfully" })),
    )
        .into_response()
}

// =============================================================================
// Storefront Under Test
// =============================================================================

/// A running storefront plus a cookie-keeping client that does not follow
/// redirects, so tests can assert on `Location`.
pub struct Storefront {
    addr: SocketAddr,
    client: reqwest::Client,
}

impl Storefront {
    /// Start the storefront against a mock API.
    pub async fn spawn(api: &MockApi) -> Self {
        Self::spawn_with_api_url(&api.base_url()).await
    }

    /// Start the storefront against an arbitrary API root.
    pub async fn spawn_with_api_url(api_url: &str) -> Self {
        let api_config = ApiConfig::with_base_url(api_url).expect("valid API URL");
        Self::spawn_with_config(StorefrontConfig::local(api_config)).await
    }

    /// Start the storefront against a mock API, adjusting the configuration
    /// first (e.g. a shorter promo countdown).
    pub async fn spawn_configured(
        api: &MockApi,
        configure: impl FnOnce(&mut StorefrontConfig),
    ) -> Self {
        let api_config = ApiConfig::with_base_url(&api.base_url()).expect("valid API URL");
        let mut config = StorefrontConfig::local(api_config);
        configure(&mut config);
        Self::spawn_with_config(config).await
    }

    async fn spawn_with_config(mut config: StorefrontConfig) -> Self {
        config.static_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../storefront/static");

        let state = AppState::new(config).expect("API client");
        let app = veya_storefront::service(state);

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind storefront");
        let addr = listener.local_addr().expect("storefront address");
        tokio::spawn(async move {
            axum::serve(
                listener,
                ServiceExt::<Request>::into_make_service_with_connect_info::<SocketAddr>(app),
            )
            .await
            .expect("storefront server");
        });

        let client = reqwest::Client::builder()
            .cookie_store(true)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .expect("HTTP client");

        Self { addr, client }
    }

    /// Absolute URL for a storefront path.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }

    /// The session-keeping client.
    #[must_use]
    pub const fn client(&self) -> &reqwest::Client {
        &self.client
    }

    /// GET a storefront path.
    pub async fn get(&self, path: &str) -> reqwest::Response {
        self.client
            .get(self.url(path))
            .send()
            .await
            .expect("storefront GET")
    }

    /// POST a form to a storefront path.
    pub async fn post_form(&self, path: &str, form: &[(&str, &str)]) -> reqwest::Response {
        self.client
            .post(self.url(path))
            .form(form)
            .send()
            .await
            .expect("storefront POST")
    }

    /// POST a form the way HTMX does.
    pub async fn post_htmx(&self, path: &str, form: &[(&str, &str)]) -> reqwest::Response {
        self.client
            .post(self.url(path))
            .header("HX-Request", "true")
            .form(form)
            .send()
            .await
            .expect("storefront HTMX POST")
    }

    /// Log in through the storefront's login form.
    pub async fn login(&self, username: &str, password: &str) -> reqwest::Response {
        self.post_form(
            "/auth/login",
            &[("username", username), ("password", password), ("next", "/")],
        )
        .await
    }
}

/// `Location` header of a redirect, or an empty string.
#[must_use]
pub fn location(response: &reqwest::Response) -> String {
    response
        .headers()
        .get(reqwest::header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

/// An API root nothing is listening on.
pub async fn unreachable_api_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind probe");
    let addr = listener.local_addr().expect("probe address");
    drop(listener);
    format!("http://{addr}/api/")
}
