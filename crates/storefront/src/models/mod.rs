//! Storefront-side models.
//!
//! Catalog, cart and order data belong to the API (see [`crate::api`]). The
//! types here only describe what the storefront keeps in its own session and
//! the short status codes it passes between redirects.

mod notice;
mod session;

pub use notice::Notice;
pub use session::{CurrentUser, session_keys};
