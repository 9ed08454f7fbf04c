//! Static informational page route handlers.
//!
//! The footer links land here. The pages have no data beyond the shared
//! page context, so each is a template and a one-line handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::response::IntoResponse;
use tracing::instrument;

use crate::filters;
use crate::routes::context::PageContext;

/// About page template.
#[derive(Template, WebTemplate)]
#[template(path = "pages/about.html")]
pub struct AboutTemplate {
    pub page: PageContext,
}

/// Help page template.
#[derive(Template, WebTemplate)]
#[template(path = "pages/help.html")]
pub struct HelpTemplate {
    pub page: PageContext,
    pub faqs: &'static [(&'static str, &'static str)],
}

/// Careers page template.
#[derive(Template, WebTemplate)]
#[template(path = "pages/careers.html")]
pub struct CareersTemplate {
    pub page: PageContext,
}

/// Blogs page template.
#[derive(Template, WebTemplate)]
#[template(path = "pages/blogs.html")]
pub struct BlogsTemplate {
    pub page: PageContext,
}

/// Bulk orders page template.
#[derive(Template, WebTemplate)]
#[template(path = "pages/bulk_orders.html")]
pub struct BulkOrdersTemplate {
    pub page: PageContext,
}

/// Questions answered on the help page.
const FAQS: &[(&str, &str)] = &[
    (
        "How do I track my order?",
        "Your order history under My account shows the status of every order.",
    ),
    (
        "How does Buy 2 Get 2 work?",
        "Add any four products from the Buy 2 Get 2 rail and the two lowest priced are free.",
    ),
    (
        "Which skin types are your products for?",
        "Every product lists its skin type. Filter the shop by oily, dry, combination or sensitive skin.",
    ),
    (
        "Can I change my email address?",
        "Yes, update your name and email from My account.",
    ),
];

/// Display the about page.
#[instrument(skip(page))]
pub async fn about(page: PageContext) -> impl IntoResponse {
    AboutTemplate { page }
}

/// Display the help page.
#[instrument(skip(page))]
pub async fn help(page: PageContext) -> impl IntoResponse {
    HelpTemplate { page, faqs: FAQS }
}

/// Display the careers page.
#[instrument(skip(page))]
pub async fn careers(page: PageContext) -> impl IntoResponse {
    CareersTemplate { page }
}

/// Display the blogs page.
#[instrument(skip(page))]
pub async fn blogs(page: PageContext) -> impl IntoResponse {
    BlogsTemplate { page }
}

/// Display the bulk orders page.
#[instrument(skip(page))]
pub async fn bulk_orders(page: PageContext) -> impl IntoResponse {
    BulkOrdersTemplate { page }
}
