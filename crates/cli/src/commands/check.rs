//! Configuration and connectivity check.
//!
//! # Environment Variables
//!
//! Everything `veya-storefront` reads; see its `config` module.

use veya_storefront::api::ApiClient;
use veya_storefront::config::StorefrontConfig;

use super::CliError;

/// Load the full storefront configuration and ping the API.
///
/// # Errors
///
/// Returns an error if the configuration is invalid or the API is down.
pub async fn run() -> Result<(), CliError> {
    let config = StorefrontConfig::from_env()?;

    #[allow(clippy::print_stdout)]
    {
        println!("Configuration OK");
        println!("  listen:        {}", config.socket_addr());
        println!("  public URL:    {}", config.base_url);
        println!("  secure cookie: {}", config.is_secure());
        println!("  API:           {}", config.api.base_url);
        println!("  static files:  {}", config.static_dir.display());
        println!(
            "  sentry:        {}",
            if config.sentry_dsn.is_some() { "enabled" } else { "disabled" }
        );
    }

    let client = ApiClient::new(&config.api)?;
    client.ping().await?;

    #[allow(clippy::print_stdout)]
    {
        println!("API reachable");
    }
    Ok(())
}
