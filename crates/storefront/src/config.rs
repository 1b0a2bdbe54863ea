//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `STOREFRONT_BASE_URL` - Public URL for the storefront (used in payment redirects)
//! - `WOOCOMMERCE_URL` - WooCommerce site URL (e.g., <https://shop.example.nl>)
//! - `WOOCOMMERCE_CONSUMER_KEY` - REST API consumer key
//! - `WOOCOMMERCE_CONSUMER_SECRET` - REST API consumer secret
//! - `MOLLIE_API_KEY` - Mollie API key (`live_...` or `test_...`)
//!
//! ## Optional
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 3000)
//! - `MOLLIE_API_URL` - Mollie API base URL (default: <https://api.mollie.com/v2>)
//! - `UPSTREAM_TIMEOUT_SECS` - Timeout for WooCommerce and Mollie calls (default: 10)
//! - `ADDRESS_LOOKUP_URL` - PDOK locatieserver search endpoint
//! - `ADDRESS_LOOKUP_TIMEOUT_MS` - Address lookup timeout (default: 3000)
//! - `META_PIXEL_ID` - Meta pixel ID for the Conversions API
//! - `META_CONVERSIONS_TOKEN` - Meta Conversions API access token
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Performance trace sample rate (default: 0.0)

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;

const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

const DEFAULT_MOLLIE_API_URL: &str = "https://api.mollie.com/v2";
const DEFAULT_ADDRESS_LOOKUP_URL: &str =
    "https://api.pdok.nl/bzk/locatieserver/search/v3_1/free";

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the storefront, without trailing slash
    pub base_url: String,
    /// WooCommerce REST API configuration
    pub woocommerce: WooCommerceConfig,
    /// Mollie Payments API configuration
    pub mollie: MollieConfig,
    /// Timeout applied to commerce backend and payment provider calls
    pub upstream_timeout: Duration,
    /// Address lookup (PDOK) configuration
    pub address_lookup: AddressLookupConfig,
    /// Server-side conversion tracking, disabled when absent
    pub tracking: Option<TrackingConfig>,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name (e.g., "production")
    pub sentry_environment: Option<String>,
    /// Fraction of errors sent to Sentry
    pub sentry_sample_rate: f32,
    /// Fraction of transactions traced
    pub sentry_traces_sample_rate: f32,
}

/// WooCommerce REST API configuration.
///
/// Implements `Debug` manually to redact secret fields.
#[derive(Clone)]
pub struct WooCommerceConfig {
    /// Site URL, without the `/wp-json` suffix
    pub url: String,
    /// REST API consumer key (`ck_...`)
    pub consumer_key: SecretString,
    /// REST API consumer secret (`cs_...`)
    pub consumer_secret: SecretString,
}

impl std::fmt::Debug for WooCommerceConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WooCommerceConfig")
            .field("url", &self.url)
            .field("consumer_key", &"[REDACTED]")
            .field("consumer_secret", &"[REDACTED]")
            .finish()
    }
}

/// Mollie Payments API configuration.
#[derive(Clone)]
pub struct MollieConfig {
    /// API base URL
    pub api_url: String,
    /// API key
    pub api_key: SecretString,
}

impl std::fmt::Debug for MollieConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MollieConfig")
            .field("api_url", &self.api_url)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

/// Address lookup configuration.
#[derive(Debug, Clone)]
pub struct AddressLookupConfig {
    /// Search endpoint
    pub url: String,
    /// Timeout after which the lookup reports "not found"
    pub timeout: Duration,
}

/// Meta Conversions API configuration.
#[derive(Clone)]
pub struct TrackingConfig {
    /// Meta pixel ID
    pub pixel_id: String,
    /// Conversions API access token
    pub access_token: SecretString,
}

impl std::fmt::Debug for TrackingConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrackingConfig")
            .field("pixel_id", &self.pixel_id)
            .field("access_token", &"[REDACTED]")
            .finish()
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let host = parse_env_or_default::<IpAddr>("STOREFRONT_HOST", "127.0.0.1")?;
        let port = parse_env_or_default::<u16>("STOREFRONT_PORT", "3000")?;
        let base_url = get_base_url("STOREFRONT_BASE_URL")?;

        let woocommerce = WooCommerceConfig::from_env()?;
        let mollie = MollieConfig::from_env()?;
        let upstream_timeout =
            Duration::from_secs(parse_env_or_default::<u64>("UPSTREAM_TIMEOUT_SECS", "10")?);
        let address_lookup = AddressLookupConfig::from_env()?;
        let tracking = TrackingConfig::from_env()?;

        Ok(Self {
            host,
            port,
            base_url,
            woocommerce,
            mollie,
            upstream_timeout,
            address_lookup,
            tracking,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: parse_env_or_default::<f32>("SENTRY_SAMPLE_RATE", "1.0")?,
            sentry_traces_sample_rate: parse_env_or_default::<f32>(
                "SENTRY_TRACES_SAMPLE_RATE",
                "0.0",
            )?,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl WooCommerceConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            url: get_base_url("WOOCOMMERCE_URL")?,
            consumer_key: get_validated_secret("WOOCOMMERCE_CONSUMER_KEY")?,
            consumer_secret: get_validated_secret("WOOCOMMERCE_CONSUMER_SECRET")?,
        })
    }
}

impl MollieConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            api_url: get_env_or_default("MOLLIE_API_URL", DEFAULT_MOLLIE_API_URL)
                .trim_end_matches('/')
                .to_string(),
            api_key: get_validated_secret("MOLLIE_API_KEY")?,
        })
    }
}

impl AddressLookupConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            url: get_env_or_default("ADDRESS_LOOKUP_URL", DEFAULT_ADDRESS_LOOKUP_URL),
            timeout: Duration::from_millis(parse_env_or_default::<u64>(
                "ADDRESS_LOOKUP_TIMEOUT_MS",
                "3000",
            )?),
        })
    }
}

impl Default for AddressLookupConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_ADDRESS_LOOKUP_URL.to_string(),
            timeout: Duration::from_secs(3),
        }
    }
}

impl TrackingConfig {
    /// Tracking is enabled only when both the pixel ID and the token are set.
    fn from_env() -> Result<Option<Self>, ConfigError> {
        let Some(pixel_id) = get_optional_env("META_PIXEL_ID") else {
            return Ok(None);
        };
        if get_optional_env("META_CONVERSIONS_TOKEN").is_none() {
            tracing::warn!("META_PIXEL_ID is set without META_CONVERSIONS_TOKEN, tracking disabled");
            return Ok(None);
        }
        Ok(Some(Self {
            pixel_id,
            access_token: get_validated_secret("META_CONVERSIONS_TOKEN")?,
        }))
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable. Empty values count as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse an environment variable, falling back to `default` when unset.
fn parse_env_or_default<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    get_env_or_default(key, default)
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Get a required absolute http(s) URL, normalized without trailing slash.
fn get_base_url(key: &str) -> Result<String, ConfigError> {
    let value = get_required_env(key)?;
    validate_base_url(&value, key)
}

fn validate_base_url(value: &str, key: &str) -> Result<String, ConfigError> {
    let parsed = url::Url::parse(value)
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
    if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            "must be an absolute http(s) URL".to_string(),
        ));
    }
    Ok(value.trim_end_matches('/').to_string())
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.len() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    // Real API keys are random and have high entropy
    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use the key issued by the provider."
            ),
        ));
    }

    Ok(())
}

/// Load and validate a secret from environment.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}
