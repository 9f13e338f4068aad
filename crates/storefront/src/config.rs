//! Cart configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! All optional:
//! - `ROCKETSHOES_API_URL` - Base URL of the stock/product service (default: `http://localhost:3333/`)
//! - `ROCKETSHOES_STORAGE_DIR` - Directory backing the local key-value store (default: `.rocketshoes`)
//! - `ROCKETSHOES_CART_KEY` - Storage key holding the cart (default: `@RocketShoes:cart`)
//! - `ROCKETSHOES_CATALOG_CACHE_TTL` - Product cache TTL in seconds, `0` disables (default: 300)
//! - `SENTRY_DSN` - Sentry error tracking DSN

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use url::Url;

/// Storage key the cart is persisted under.
pub const DEFAULT_CART_KEY: &str = "@RocketShoes:cart";

const DEFAULT_API_URL: &str = "http://localhost:3333/";
const DEFAULT_STORAGE_DIR: &str = ".rocketshoes";
const DEFAULT_CATALOG_CACHE_TTL_SECS: u64 = 300;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Cart configuration.
#[derive(Debug, Clone)]
pub struct CartConfig {
    /// Base URL of the stock/product service, always ending in `/`
    pub api_url: Url,
    /// Directory of the file-backed key-value store
    pub storage_dir: PathBuf,
    /// Key the cart is persisted under
    pub cart_key: String,
    /// How long product details stay cached; `None` disables caching
    pub catalog_cache_ttl: Option<Duration>,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
}

impl CartConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set to an invalid value.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set to an invalid value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let api_url = parse_api_url(
            &get("ROCKETSHOES_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string()),
        )?;
        let storage_dir = get("ROCKETSHOES_STORAGE_DIR")
            .map_or_else(|| PathBuf::from(DEFAULT_STORAGE_DIR), PathBuf::from);
        let cart_key = get("ROCKETSHOES_CART_KEY").unwrap_or_else(|| DEFAULT_CART_KEY.to_string());
        let catalog_cache_ttl = match get("ROCKETSHOES_CATALOG_CACHE_TTL") {
            Some(raw) => parse_ttl(&raw)?,
            None => Some(Duration::from_secs(DEFAULT_CATALOG_CACHE_TTL_SECS)),
        };
        let sentry_dsn = get("SENTRY_DSN");

        Ok(Self {
            api_url,
            storage_dir,
            cart_key,
            catalog_cache_ttl,
            sentry_dsn,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Parse the service base URL, appending a trailing slash so that relative
/// paths like `stock/1` join under it instead of replacing its last segment.
fn parse_api_url(raw: &str) -> Result<Url, ConfigError> {
    let invalid = |msg: String| ConfigError::InvalidEnvVar("ROCKETSHOES_API_URL".to_string(), msg);

    let mut url = Url::parse(raw.trim()).map_err(|e| invalid(e.to_string()))?;
    if url.cannot_be_a_base() {
        return Err(invalid("must be an absolute http(s) URL".to_string()));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

fn parse_ttl(raw: &str) -> Result<Option<Duration>, ConfigError> {
    let secs = raw.trim().parse::<u64>().map_err(|e| {
        ConfigError::InvalidEnvVar("ROCKETSHOES_CATALOG_CACHE_TTL".to_string(), e.to_string())
    })?;
    Ok((secs > 0).then(|| Duration::from_secs(secs)))
}
