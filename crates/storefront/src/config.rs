//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `STOREFRONT_BASE_URL` - Public URL of the storefront, used to build image URLs
//!
//! ## Optional
//! - `STOREFRONT_DATABASE_URL` - `PostgreSQL` connection string (falls back to
//!   `DATABASE_URL`; when neither is set the in-memory store is used)
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 3000)
//! - `STOREFRONT_SEED_FILE` - YAML catalog seed loaded into the in-memory store
//! - `STOREFRONT_CURRENCY_CODE` - ISO 4217 code (default: PKR)
//! - `STOREFRONT_CURRENCY_SYMBOL` - Symbol override (default: symbol of the code)
//! - `MENU_CACHE_TTL_SECS` - Menu snapshot cache lifetime (default: 300)
//! - `CHECKOUT_ESTIMATED_DELIVERY` - Text returned after checkout (default: 35-45 minutes)
//! - `CHECKOUT_DELIVERY_PRODUCT_NAME` - Service entry used for delivery fees
//!   (default: Delivery Charges)
//! - `CATALOG_LEGACY_NAME_MATCHING` - Match cart items to products by name when
//!   they carry no usable ID (default: true)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment tag
//! - `SENTRY_SAMPLE_RATE` - Error sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Transaction sample rate (default: 0.1)

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use cravely_core::CurrencyCode;
use secrecy::SecretString;
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
    /// `PostgreSQL` connection URL (contains password). `None` selects the
    /// in-memory store.
    pub database_url: Option<SecretString>,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL, without trailing slash
    pub base_url: String,
    /// Catalog seed for the in-memory store
    pub seed_file: Option<PathBuf>,
    /// Menu presentation settings
    pub menu: MenuConfig,
    /// Checkout pipeline settings
    pub checkout: CheckoutConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment tag
    pub sentry_environment: Option<String>,
    /// Fraction of errors sent to Sentry
    pub sentry_sample_rate: f32,
    /// Fraction of requests traced in Sentry
    pub sentry_traces_sample_rate: f32,
}

/// Menu listing configuration.
#[derive(Debug, Clone)]
pub struct MenuConfig {
    pub currency: CurrencyCode,
    /// Printed next to prices. Defaults to the currency's own symbol.
    pub currency_symbol: String,
    /// How long category and product snapshots are served from memory.
    pub cache_ttl: Duration,
}

impl Default for MenuConfig {
    fn default() -> Self {
        let currency = CurrencyCode::default();
        Self {
            currency,
            currency_symbol: currency.symbol().to_owned(),
            cache_ttl: Duration::from_secs(300),
        }
    }
}

/// Checkout pipeline configuration.
#[derive(Debug, Clone)]
pub struct CheckoutConfig {
    /// Returned to the client with every placed order.
    pub estimated_delivery: String,
    /// Name of the service entry that carries delivery fees.
    pub delivery_product_name: String,
    /// Fall back to name matching when a cart item has no usable product ID.
    pub legacy_name_matching: bool,
}

impl Default for CheckoutConfig {
    fn default() -> Self {
        Self {
            estimated_delivery: "35-45 minutes".to_owned(),
            delivery_product_name: "Delivery Charges".to_owned(),
            legacy_name_matching: true,
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
    /// Returns `ConfigError` if a required variable is missing or a value
    /// cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_database_url("STOREFRONT_DATABASE_URL");
        let host = parse_env("STOREFRONT_HOST", "127.0.0.1")?;
        let port = parse_env("STOREFRONT_PORT", "3000")?;
        let base_url = normalize_base_url(&get_required_env("STOREFRONT_BASE_URL")?)?;
        let seed_file = get_optional_env("STOREFRONT_SEED_FILE").map(PathBuf::from);

        let menu = MenuConfig::from_env()?;
        let checkout = CheckoutConfig::from_env()?;

        Ok(Self {
            database_url,
            host,
            port,
            base_url,
            seed_file,
            menu,
            checkout,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: parse_env("SENTRY_SAMPLE_RATE", "1.0")?,
            sentry_traces_sample_rate: parse_env("SENTRY_TRACES_SAMPLE_RATE", "0.1")?,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// A configuration suitable for tests and local development against the
    /// in-memory store.
    #[must_use]
    pub fn local(base_url: &str) -> Self {
        Self {
            database_url: None,
            host: IpAddr::from([127, 0, 0, 1]),
            port: 3000,
            base_url: base_url.trim_end_matches('/').to_owned(),
            seed_file: None,
            menu: MenuConfig::default(),
            checkout: CheckoutConfig::default(),
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 0.0,
        }
    }
}

impl MenuConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let currency: CurrencyCode = get_env_or_default("STOREFRONT_CURRENCY_CODE", "PKR")
            .parse()
            .map_err(|e| ConfigError::InvalidEnvVar("STOREFRONT_CURRENCY_CODE".to_owned(), e))?;
        let currency_symbol = get_optional_env("STOREFRONT_CURRENCY_SYMBOL")
            .unwrap_or_else(|| currency.symbol().to_owned());
        let ttl_secs: u64 = parse_env("MENU_CACHE_TTL_SECS", "300")?;

        Ok(Self {
            currency,
            currency_symbol,
            cache_ttl: Duration::from_secs(ttl_secs),
        })
    }
}

impl CheckoutConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        Ok(Self {
            estimated_delivery: get_optional_env("CHECKOUT_ESTIMATED_DELIVERY")
                .unwrap_or(defaults.estimated_delivery),
            delivery_product_name: get_optional_env("CHECKOUT_DELIVERY_PRODUCT_NAME")
                .filter(|name| !name.trim().is_empty())
                .unwrap_or(defaults.delivery_product_name),
            legacy_name_matching: parse_bool_env("CATALOG_LEGACY_NAME_MATCHING", true)?,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get database URL with fallback to generic `DATABASE_URL`.
fn get_database_url(primary_key: &str) -> Option<SecretString> {
    std::env::var(primary_key)
        .or_else(|_| std::env::var("DATABASE_URL"))
        .ok()
        .filter(|value| !value.trim().is_empty())
        .map(SecretString::from)
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse an environment variable, falling back to `default` when unset.
fn parse_env<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    get_env_or_default(key, default)
        .trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Parse a boolean flag. Accepts true/false, 1/0, yes/no, on/off.
fn parse_bool_env(key: &str, default: bool) -> Result<bool, ConfigError> {
    get_optional_env(key).map_or(Ok(default), |value| parse_flag(key, &value))
}

fn parse_flag(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("expected a boolean, got '{other}'"),
        )),
    }
}

/// Validate the base URL and strip any trailing slash.
fn normalize_base_url(raw: &str) -> Result<String, ConfigError> {
    let url = Url::parse(raw.trim()).map_err(|e| {
        ConfigError::InvalidEnvVar("STOREFRONT_BASE_URL".to_string(), e.to_string())
    })?;
    if url.host_str().is_none() {
        return Err(ConfigError::InvalidEnvVar(
            "STOREFRONT_BASE_URL".to_string(),
            "must have a host".to_string(),
        ));
    }
    Ok(url.as_str().trim_end_matches('/').to_owned())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_flag_variants() {
        assert!(parse_flag("X", "TRUE").unwrap());
        assert!(parse_flag("X", " on ").unwrap());
        assert!(!parse_flag("X", "0").unwrap());
        assert!(!parse_flag("X", "no").unwrap());
        assert!(matches!(
            parse_flag("X", "maybe"),
            Err(ConfigError::InvalidEnvVar(_, _))
        ));
    }

    #[test]
    fn test_normalize_base_url_strips_trailing_slash() {
        assert_eq!(
            normalize_base_url("http://100.110.83.110:8069/").unwrap(),
            "http://100.110.83.110:8069"
        );
        assert_eq!(
            normalize_base_url("https://order.cravely.pk").unwrap(),
            "https://order.cravely.pk"
        );
    }

    #[test]
    fn test_normalize_base_url_rejects_garbage() {
        assert!(normalize_base_url("not a url").is_err());
        assert!(normalize_base_url("mailto:orders@cravely.pk").is_err());
    }

    #[test]
    fn test_socket_addr() {
        let mut config = StorefrontConfig::local("http://localhost:3000/");
        config.port = 8069;

        let addr = config.socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 8069);
        assert_eq!(config.base_url, "http://localhost:3000");
    }

    #[test]
    fn test_defaults() {
        let checkout = CheckoutConfig::default();
        assert_eq!(checkout.estimated_delivery, "35-45 minutes");
        assert_eq!(checkout.delivery_product_name, "Delivery Charges");
        assert!(checkout.legacy_name_matching);

        let menu = MenuConfig::default();
        assert_eq!(menu.currency_symbol, "Rs.");
        assert_eq!(menu.cache_ttl, Duration::from_secs(300));
    }

    #[test]
    fn test_database_url_debug_is_redacted() {
        let mut config = StorefrontConfig::local("http://localhost:3000");
        config.database_url = Some(SecretString::from("postgres://u:hunter2@db/cravely"));

        let debug_output = format!("{config:?}");
        assert!(!debug_output.contains("hunter2"));
    }
}
