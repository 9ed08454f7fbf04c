//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `VEYA_API_BASE_URL` - Root of the Veya REST API (e.g., `http://localhost:8000/api/`)
//! - `VEYA_BASE_URL` - Public URL for the storefront
//!
//! ## Optional
//! - `VEYA_HOST` - Bind address (default: 127.0.0.1)
//! - `VEYA_PORT` - Listen port (default: 3000)
//! - `VEYA_STATIC_DIR` - Static assets directory (default: crates/storefront/static)
//! - `VEYA_API_TIMEOUT_SECS` - Per-request API timeout (default: 10)
//! - `VEYA_CACHE_TTL_SECS` - Catalog cache lifetime (default: 300)
//! - `VEYA_CACHE_CAPACITY` - Catalog cache entries (default: 1000)
//! - `VEYA_PROMO_COUNTDOWN_SECS` - Home page countdown length (default: 692)
//! - `VEYA_PROMO_ROTATE_MS` - Promo carousel autoplay interval (default: 5000)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error event sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Performance trace sample rate (default: 0.0)

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;
use url::Url;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the storefront
    pub base_url: String,
    /// Directory served under `/static`
    pub static_dir: PathBuf,
    /// Veya REST API configuration
    pub api: ApiConfig,
    /// Promotional merchandising configuration
    pub promo: PromoConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., "production")
    pub sentry_environment: Option<String>,
    /// Fraction of error events sent to Sentry
    pub sentry_sample_rate: f32,
    /// Fraction of transactions traced
    pub sentry_traces_sample_rate: f32,
}

/// Veya REST API client configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// API root, always ending in `/` so relative joins keep the path prefix
    pub base_url: Url,
    /// Per-request timeout
    pub timeout: Duration,
    /// Catalog cache time-to-live
    pub cache_ttl: Duration,
    /// Maximum catalog cache entries
    pub cache_capacity: u64,
}

/// Promotional widgets on the home page.
#[derive(Debug, Clone)]
pub struct PromoConfig {
    /// Length of the "free gift of the hour" countdown
    pub countdown: Duration,
    /// Autoplay interval for the season's grand gift carousel
    pub rotate_ms: u32,
}

impl Default for PromoConfig {
    fn default() -> Self {
        Self {
            countdown: Duration::from_secs(11 * 60 + 32),
            rotate_ms: 5000,
        }
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let host = parse_env_or_default::<IpAddr>("VEYA_HOST", "127.0.0.1")?;
        let port = parse_env_or_default::<u16>("VEYA_PORT", "3000")?;
        let base_url = get_required_env("VEYA_BASE_URL")?;
        let static_dir = PathBuf::from(get_env_or_default(
            "VEYA_STATIC_DIR",
            "crates/storefront/static",
        ));

        let api = ApiConfig::from_env()?;
        let promo = PromoConfig::from_env()?;

        Ok(Self {
            host,
            port,
            base_url,
            static_dir,
            api,
            promo,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: parse_env_or_default("SENTRY_SAMPLE_RATE", "1.0")?,
            sentry_traces_sample_rate: parse_env_or_default("SENTRY_TRACES_SAMPLE_RATE", "0.0")?,
        })
    }

    /// Local configuration around an API config: `http://127.0.0.1:3000`,
    /// default promo settings and no Sentry.
    #[must_use]
    pub fn local(api: ApiConfig) -> Self {
        Self {
            host: IpAddr::from([127, 0, 0, 1]),
            port: 3000,
            base_url: "http://127.0.0.1:3000".to_string(),
            static_dir: PathBuf::from("crates/storefront/static"),
            api,
            promo: PromoConfig::default(),
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 0.0,
        }
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether the storefront is served over HTTPS (controls `Secure` cookies).
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

impl ApiConfig {
    /// Load the API settings alone (used by the CLI).
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if `VEYA_API_BASE_URL` is missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();

        let raw = get_required_env("VEYA_API_BASE_URL")?;
        let base_url = normalize_api_base_url(&raw)
            .map_err(|reason| ConfigError::InvalidEnvVar("VEYA_API_BASE_URL".to_string(), reason))?;

        Ok(Self {
            base_url,
            timeout: Duration::from_secs(parse_env_or_default("VEYA_API_TIMEOUT_SECS", "10")?),
            cache_ttl: Duration::from_secs(parse_env_or_default("VEYA_CACHE_TTL_SECS", "300")?),
            cache_capacity: parse_env_or_default("VEYA_CACHE_CAPACITY", "1000")?,
        })
    }

    /// Build an API config for a base URL with default timeouts.
    ///
    /// # Errors
    ///
    /// Returns a description of the problem if the URL is not an absolute
    /// http(s) URL.
    pub fn with_base_url(raw: &str) -> Result<Self, String> {
        Ok(Self {
            base_url: normalize_api_base_url(raw)?,
            timeout: Duration::from_secs(10),
            cache_ttl: Duration::from_secs(300),
            cache_capacity: 1000,
        })
    }
}

impl PromoConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            countdown: Duration::from_secs(parse_env_or_default(
                "VEYA_PROMO_COUNTDOWN_SECS",
                "692",
            )?),
            rotate_ms: parse_env_or_default("VEYA_PROMO_ROTATE_MS", "5000")?,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Validate the API root and make sure it ends with a slash.
///
/// `Url::join` drops the last path segment when the base lacks a trailing
/// slash, which would turn `/api` + `products/` into `/products/`.
fn normalize_api_base_url(raw: &str) -> Result<Url, String> {
    let mut url = Url::parse(raw.trim()).map_err(|e| e.to_string())?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(format!("unsupported scheme '{}'", url.scheme()));
    }

    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }

    Ok(url)
}

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse an environment variable, falling back to a default string.
fn parse_env_or_default<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    get_env_or_default(key, default)
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn test_config(base_url: &str) -> StorefrontConfig {
        StorefrontConfig {
            base_url: base_url.to_string(),
            ..StorefrontConfig::local(ApiConfig::with_base_url("http://localhost:8000/api").unwrap())
        }
    }

    #[test]
    fn test_normalize_adds_trailing_slash() {
        let url = normalize_api_base_url("http://localhost:8000/api").unwrap();
        assert_eq!(url.as_str(), "http://localhost:8000/api/");
        assert_eq!(
            url.join("products/").unwrap().as_str(),
            "http://localhost:8000/api/products/"
        );
    }

    #[test]
    fn test_normalize_keeps_existing_slash() {
        let url = normalize_api_base_url("https://api.veya.in/api/").unwrap();
        assert_eq!(url.as_str(), "https://api.veya.in/api/");
    }

    #[test]
    fn test_normalize_rejects_relative_and_other_schemes() {
        assert!(normalize_api_base_url("/api/").is_err());
        let err = normalize_api_base_url("ftp://files.veya.in/").unwrap_err();
        assert!(err.contains("ftp"));
    }

    #[test]
    fn test_socket_addr() {
        let config = test_config("http://localhost:3000");
        let addr = config.socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 3000);
    }

    #[test]
    fn test_is_secure() {
        assert!(!test_config("http://localhost:3000").is_secure());
        assert!(test_config("https://veya.in").is_secure());
    }

    #[test]
    fn test_promo_defaults() {
        let promo = PromoConfig::default();
        assert_eq!(promo.countdown.as_secs(), 692);
        assert_eq!(promo.rotate_ms, 5000);
    }
}
