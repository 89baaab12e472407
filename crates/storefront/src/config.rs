//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `KEEPSAKE_ORDER_INTAKE_URL` - Endpoint that accepts order payloads
//! - `KEEPSAKE_PRODUCT_SOURCE_URL` - Base URL of the product catalog service
//!
//! ## Optional
//! - `KEEPSAKE_HOST` - Bind address (default: 127.0.0.1)
//! - `KEEPSAKE_PORT` - Listen port (default: 3000)
//! - `KEEPSAKE_ORDER_INTAKE_TOKEN` - Bearer token for the order-intake service
//! - `KEEPSAKE_MESSAGING_NUMBER` - Shop's chat number for order hand-off links
//! - `KEEPSAKE_POLICY_FILE` - YAML file with surcharges, delivery rates, and limits
//! - `KEEPSAKE_CATALOG_FILE` - YAML file replacing the built-in option catalog
//! - `KEEPSAKE_IMAGE_MAX_BYTES` - Per-image size limit (default: 5 MiB)
//! - `KEEPSAKE_IMAGE_MAX_COUNT` - Images per order (default: 5)
//! - `KEEPSAKE_FREE_DELIVERY_THRESHOLD` - Subtotal for free delivery (default: 1000, `off` disables)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use keepsake_core::catalog::{Catalog, CatalogDefinition, CatalogError};
use keepsake_core::policy::{CustomizationPolicy, PolicyError};
use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use url::Url;

const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

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
    #[error("Failed to read {0}: {1}")]
    File(PathBuf, String),
    #[error("Invalid customization policy: {0}")]
    Policy(#[from] PolicyError),
    #[error("Invalid option catalog: {0}")]
    Catalog(#[from] CatalogError),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Order-intake service
    pub order_intake: OrderIntakeConfig,
    /// Base URL of the product catalog service
    pub product_source_url: Url,
    /// Shop's chat number in international format, digits only
    pub messaging_number: Option<String>,
    /// Surcharges, delivery rates, and limits
    pub policy: CustomizationPolicy,
    /// Option catalog
    pub catalog: Catalog,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
    /// Fraction of errors sent to Sentry
    pub sentry_sample_rate: f32,
    /// Fraction of transactions traced
    pub sentry_traces_sample_rate: f32,
}

/// Order-intake service configuration.
///
/// Implements `Debug` manually to redact the token.
#[derive(Clone)]
pub struct OrderIntakeConfig {
    /// Endpoint that accepts `POST`ed order payloads
    pub url: Url,
    /// Bearer token, if the service requires one
    pub token: Option<SecretString>,
}

impl std::fmt::Debug for OrderIntakeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrderIntakeConfig")
            .field("url", &self.url.as_str())
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
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
    /// Returns `ConfigError` if required variables are missing or invalid, if
    /// the intake token looks like a placeholder, or if the policy or catalog
    /// fail validation.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_source(&|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary variable source.
    ///
    /// # Errors
    ///
    /// See [`StorefrontConfig::from_env`].
    pub fn from_source(env: &impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let vars = Vars(env);

        let host = vars.parse_or("KEEPSAKE_HOST", IpAddr::from([127, 0, 0, 1]))?;
        let port = vars.parse_or("KEEPSAKE_PORT", 3000)?;

        let order_intake = OrderIntakeConfig {
            url: vars.url("KEEPSAKE_ORDER_INTAKE_URL")?,
            token: vars
                .optional("KEEPSAKE_ORDER_INTAKE_TOKEN")
                .map(|token| {
                    validate_secret_strength(&token, "KEEPSAKE_ORDER_INTAKE_TOKEN")?;
                    Ok::<_, ConfigError>(SecretString::from(token))
                })
                .transpose()?,
        };
        let product_source_url = vars.url("KEEPSAKE_PRODUCT_SOURCE_URL")?;

        let messaging_number = vars
            .optional("KEEPSAKE_MESSAGING_NUMBER")
            .map(|number| normalize_chat_number(&number))
            .transpose()?;

        let mut policy = match vars.optional("KEEPSAKE_POLICY_FILE") {
            Some(path) => load_yaml::<CustomizationPolicy>(Path::new(&path))?,
            None => CustomizationPolicy::default(),
        };
        policy.images.max_bytes =
            vars.parse_or("KEEPSAKE_IMAGE_MAX_BYTES", policy.images.max_bytes)?;
        policy.images.max_count =
            vars.parse_or("KEEPSAKE_IMAGE_MAX_COUNT", policy.images.max_count)?;
        if let Some(raw) = vars.optional("KEEPSAKE_FREE_DELIVERY_THRESHOLD") {
            policy.pricing.delivery.free_threshold =
                parse_threshold(&raw).map_err(|e| {
                    ConfigError::InvalidEnvVar("KEEPSAKE_FREE_DELIVERY_THRESHOLD".to_string(), e)
                })?;
        }
        policy.validate()?;

        let catalog = match vars.optional("KEEPSAKE_CATALOG_FILE") {
            Some(path) => Catalog::from_definition(load_yaml::<CatalogDefinition>(Path::new(
                &path,
            ))?)?,
            None => Catalog::builtin(),
        };

        Ok(Self {
            host,
            port,
            order_intake,
            product_source_url,
            messaging_number,
            policy,
            catalog,
            sentry_dsn: vars.optional("SENTRY_DSN"),
            sentry_environment: vars.optional("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: vars.parse_or("SENTRY_SAMPLE_RATE", 1.0)?,
            sentry_traces_sample_rate: vars.parse_or("SENTRY_TRACES_SAMPLE_RATE", 0.1)?,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

struct Vars<'a, F: Fn(&str) -> Option<String>>(&'a F);

impl<F: Fn(&str) -> Option<String>> Vars<'_, F> {
    /// Get an optional variable, treating blank values as unset.
    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|v| !v.trim().is_empty())
    }

    /// Get a required variable.
    fn required(&self, key: &str) -> Result<String, ConfigError> {
        self.optional(key)
            .ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
    }

    /// Get a required absolute URL.
    fn url(&self, key: &str) -> Result<Url, ConfigError> {
        let raw = self.required(key)?;
        Url::parse(&raw).map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
    }

    /// Parse a variable, falling back to a default when unset.
    fn parse_or<T>(&self, key: &str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        self.optional(key).map_or(Ok(default), |raw| {
            raw.trim()
                .parse()
                .map_err(|e: T::Err| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
        })
    }
}

/// Parse a free-delivery threshold; `off`/`none` disables the rule.
fn parse_threshold(raw: &str) -> Result<Option<Decimal>, String> {
    let raw = raw.trim();
    if raw.eq_ignore_ascii_case("off") || raw.eq_ignore_ascii_case("none") {
        return Ok(None);
    }
    let amount = Decimal::from_str(raw).map_err(|e| e.to_string())?;
    if amount < Decimal::ZERO {
        return Err("must not be negative".to_string());
    }
    Ok(Some(amount))
}

/// Strip formatting from a chat number, leaving international digits.
fn normalize_chat_number(raw: &str) -> Result<String, ConfigError> {
    let digits: String = raw
        .chars()
        .filter(|c| !matches!(c, '+' | ' ' | '-' | '(' | ')'))
        .collect();
    if digits.len() < 8 || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(ConfigError::InvalidEnvVar(
            "KEEPSAKE_MESSAGING_NUMBER".to_string(),
            "must be an international phone number".to_string(),
        ));
    }
    Ok(digits)
}

/// Read and deserialize a YAML file.
fn load_yaml<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| ConfigError::File(path.to_path_buf(), e.to_string()))?;
    serde_yaml::from_str(&text).map_err(|e| ConfigError::File(path.to_path_buf(), e.to_string()))
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

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated secret."
            ),
        ));
    }

    Ok(())
}

/// Expose the intake token for an `Authorization` header.
#[must_use]
pub fn bearer_token(config: &OrderIntakeConfig) -> Option<String> {
    config
        .token
        .as_ref()
        .map(|token| format!("Bearer {}", token.expose_secret()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn source(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    const REQUIRED: [(&str, &str); 2] = [
        ("KEEPSAKE_ORDER_INTAKE_URL", "https://orders.keepsake.test/api/orders"),
        ("KEEPSAKE_PRODUCT_SOURCE_URL", "https://catalog.keepsake.test/"),
    ];

    #[test]
    fn test_defaults() {
        let config = StorefrontConfig::from_source(&source(&REQUIRED)).unwrap();
        assert_eq!(config.socket_addr().to_string(), "127.0.0.1:3000");
        assert!(config.order_intake.token.is_none());
        assert_eq!(config.policy, CustomizationPolicy::default());
        assert!(config.messaging_number.is_none());
    }

    #[test]
    fn test_missing_required() {
        let err = StorefrontConfig::from_source(&source(&REQUIRED[..1])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(ref k) if k == "KEEPSAKE_PRODUCT_SOURCE_URL"));
    }

    #[test]
    fn test_policy_overrides() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("KEEPSAKE_IMAGE_MAX_COUNT", "3"));
        pairs.push(("KEEPSAKE_FREE_DELIVERY_THRESHOLD", "off"));
        pairs.push(("KEEPSAKE_MESSAGING_NUMBER", "+880 1712-345678"));
        let config = StorefrontConfig::from_source(&source(&pairs)).unwrap();
        assert_eq!(config.policy.images.max_count, 3);
        assert_eq!(config.policy.pricing.delivery.free_threshold, None);
        assert_eq!(config.messaging_number.as_deref(), Some("8801712345678"));
    }

    #[test]
    fn test_zero_image_count_is_rejected() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("KEEPSAKE_IMAGE_MAX_COUNT", "0"));
        let err = StorefrontConfig::from_source(&source(&pairs)).unwrap_err();
        assert!(matches!(err, ConfigError::Policy(_)));
    }

    #[test]
    fn test_invalid_port() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("KEEPSAKE_PORT", "eighty"));
        let err = StorefrontConfig::from_source(&source(&pairs)).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(ref k, _) if k == "KEEPSAKE_PORT"));
    }

    #[test]
    fn test_placeholder_token_is_rejected() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("KEEPSAKE_ORDER_INTAKE_TOKEN", "your-token-here"));
        let err = StorefrontConfig::from_source(&source(&pairs)).unwrap_err();
        assert!(matches!(err, ConfigError::InsecureSecret(_, _)));
    }

    #[test]
    fn test_token_is_redacted_in_debug() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("KEEPSAKE_ORDER_INTAKE_TOKEN", "aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6"));
        let config = StorefrontConfig::from_source(&source(&pairs)).unwrap();
        let debug = format!("{:?}", config.order_intake);
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("aB3$"));
        assert_eq!(
            bearer_token(&config.order_intake).as_deref(),
            Some("Bearer aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6")
        );
    }

    #[test]
    fn test_parse_threshold() {
        assert_eq!(parse_threshold("1500").unwrap(), Some(Decimal::from(1500)));
        assert_eq!(parse_threshold("none").unwrap(), None);
        assert!(parse_threshold("-1").is_err());
    }

    #[test]
    fn test_shannon_entropy() {
        assert!((shannon_entropy("") - 0.0).abs() < f64::EPSILON);
        assert!((shannon_entropy("aaaaaaa") - 0.0).abs() < f64::EPSILON);
        assert!(shannon_entropy("aB3$xY9!mK2@nL5#") > 3.3);
    }
}
