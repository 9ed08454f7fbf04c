//! Veya Core - Shared types library.
//!
//! This crate provides common types used across all Veya components:
//! - `storefront` - Customer-facing storefront (server-rendered)
//! - `cli` - Operator tools for checking the API and previewing merchandising
//!
//! # Architecture
//!
//! The core crate contains only types and traits - no I/O, no HTTP clients.
//! Everything here mirrors what the Veya REST API returns; business rules
//! (pricing, discounts, stock) stay in the backend.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for IDs, prices, emails, skin types and statuses

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
