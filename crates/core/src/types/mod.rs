//! Core types for Veya.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod price;
pub mod skin_type;
pub mod status;

pub use email::{Email, EmailError};
pub use id::*;
pub use price::{CurrencyCode, Price};
pub use skin_type::{SkinType, SkinTypeError};
pub use status::OrderStatus;
