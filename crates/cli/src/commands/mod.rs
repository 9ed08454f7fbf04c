//! CLI command implementations.

pub mod catalog;
pub mod check;

use thiserror::Error;
use veya_storefront::api::{ApiClient, ApiError};
use veya_storefront::config::{ApiConfig, ConfigError};

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The Veya API call failed.
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// Unknown B2G2 filter name.
    #[error("Unknown B2G2 filter: {0}. Valid filters: {1}")]
    UnknownFilter(String, String),
}

/// Build an API client from `VEYA_API_BASE_URL` and friends.
fn api_client() -> Result<ApiClient, CliError> {
    let config = ApiConfig::from_env()?;
    tracing::debug!(api = %config.base_url, "Using Veya API");
    Ok(ApiClient::new(&config)?)
}
