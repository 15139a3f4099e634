//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `KEEPSAKE_API_BASE_URL` - Origin of the backend cart/wishlist API; without it only guest
//!   sessions are served
//! - `KEEPSAKE_REQUEST_TIMEOUT_SECS` - Timeout for each remote call (default: 10)
//! - `KEEPSAKE_STORAGE_DIR` - Directory for the guest cart/wishlist blob (default: .keepsake)
//! - `KEEPSAKE_LOGIN_PATH` - Login entry point for expired sessions (default: /login/)
//! - `KEEPSAKE_CSRF_TOKEN` - Anti-forgery token, when the page does not supply one
//! - `KEEPSAKE_COOKIE` - `Cookie` header forwarded to the backend (session and csrftoken cookies)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

const DEFAULT_TIMEOUT_SECS: u64 = 10;
const MIN_TOKEN_LENGTH: usize = 16;
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
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// Backend API configuration, absent for guest-only use
    pub remote: Option<RemoteConfig>,
    /// Directory holding the guest storage blob
    pub storage_dir: PathBuf,
    /// Login entry point used when an authenticated session has expired
    pub login_path: String,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g. production, staging)
    pub sentry_environment: Option<String>,
}

/// Backend cart/wishlist API configuration.
///
/// Implements `Debug` manually to redact secret fields.
#[derive(Clone)]
pub struct RemoteConfig {
    /// API origin, e.g. `https://shop.example.com/`
    pub base_url: Url,
    /// Timeout applied to every request
    pub timeout: Duration,
    /// Anti-forgery token sent as `X-CSRFToken` on mutating requests
    pub csrf_token: Option<SecretString>,
    /// `Cookie` header identifying the authenticated session
    pub cookie: Option<SecretString>,
}

impl std::fmt::Debug for RemoteConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteConfig")
            .field("base_url", &self.base_url.as_str())
            .field("timeout", &self.timeout)
            .field("csrf_token", &self.csrf_token.as_ref().map(|_| "[REDACTED]"))
            .field("cookie", &self.cookie.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl RemoteConfig {
    /// Configuration for a backend at `base_url` with default timeout and no credentials.
    #[must_use]
    pub const fn new(base_url: Url) -> Self {
        Self {
            base_url,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            csrf_token: None,
            cookie: None,
        }
    }

    fn from_env() -> Result<Option<Self>, ConfigError> {
        let Some(raw_url) = get_optional_env("KEEPSAKE_API_BASE_URL") else {
            return Ok(None);
        };
        let base_url = Url::parse(&raw_url).map_err(|e| {
            ConfigError::InvalidEnvVar("KEEPSAKE_API_BASE_URL".to_string(), e.to_string())
        })?;

        let timeout_secs = get_env_or_default(
            "KEEPSAKE_REQUEST_TIMEOUT_SECS",
            &DEFAULT_TIMEOUT_SECS.to_string(),
        )
        .parse::<u64>()
        .map_err(|e| {
            ConfigError::InvalidEnvVar("KEEPSAKE_REQUEST_TIMEOUT_SECS".to_string(), e.to_string())
        })?;
        if timeout_secs == 0 {
            return Err(ConfigError::InvalidEnvVar(
                "KEEPSAKE_REQUEST_TIMEOUT_SECS".to_string(),
                "must be greater than zero".to_string(),
            ));
        }

        Ok(Some(Self {
            base_url,
            timeout: Duration::from_secs(timeout_secs),
            csrf_token: get_optional_validated_secret("KEEPSAKE_CSRF_TOKEN")?,
            cookie: get_optional_validated_secret("KEEPSAKE_COOKIE")?,
        }))
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if variables are invalid or if secrets fail
    /// validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let remote = RemoteConfig::from_env()?;
        let storage_dir = PathBuf::from(get_env_or_default("KEEPSAKE_STORAGE_DIR", ".keepsake"));
        let login_path = get_env_or_default("KEEPSAKE_LOGIN_PATH", "/login/");
        if !login_path.starts_with('/') {
            return Err(ConfigError::InvalidEnvVar(
                "KEEPSAKE_LOGIN_PATH".to_string(),
                "must be an absolute path".to_string(),
            ));
        }

        Ok(Self {
            remote,
            storage_dir,
            login_path,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get an optional environment variable. Empty values count as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    get_optional_env(key).unwrap_or_else(|| default.to_string())
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

/// Validate that a token is long enough, not a placeholder, and has sufficient entropy.
fn validate_token_strength(token: &str, var_name: &str) -> Result<(), ConfigError> {
    if token.len() < MIN_TOKEN_LENGTH {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "must be at least {MIN_TOKEN_LENGTH} characters (got {})",
                token.len()
            ),
        ));
    }

    let lower = token.to_lowercase();

    // Check blocklist
    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    let entropy = shannon_entropy(token);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Copy the value issued by the backend."
            ),
        ));
    }

    Ok(())
}

/// Load and validate an optional secret from environment.
fn get_optional_validated_secret(key: &str) -> Result<Option<SecretString>, ConfigError> {
    get_optional_env(key)
        .map(|value| {
            validate_token_strength(&value, key)?;
            Ok(SecretString::from(value))
        })
        .transpose()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_shannon_entropy_empty() {
        assert!((shannon_entropy("") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shannon_entropy_single_char() {
        // All same character = 0 entropy
        assert!((shannon_entropy("aaaaaaa") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shannon_entropy_two_chars() {
        let entropy = shannon_entropy("ab");
        assert!((entropy - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_validate_token_placeholder() {
        let result = validate_token_strength("your-csrf-token-goes-here", "TEST_VAR");
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
    }

    #[test]
    fn test_validate_token_too_short() {
        let result = validate_token_strength("aB3$xY9", "TEST_VAR");
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
    }

    #[test]
    fn test_validate_token_low_entropy() {
        let result = validate_token_strength("aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa", "TEST_VAR");
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
    }

    #[test]
    fn test_validate_token_valid() {
        let result = validate_token_strength("Qm7vK2pL9xR4tZ8wN1cB6hJ3dF5gS0aY", "TEST_VAR");
        assert!(result.is_ok());
    }

    #[test]
    fn test_remote_config_defaults() {
        let config = RemoteConfig::new(Url::parse("http://localhost:8000/").unwrap());
        assert_eq!(config.timeout, Duration::from_secs(10));
        assert!(config.csrf_token.is_none());
        assert!(config.cookie.is_none());
    }

    #[test]
    fn test_remote_config_debug_redacts_secrets() {
        let mut config = RemoteConfig::new(Url::parse("https://shop.test/").unwrap());
        config.csrf_token = Some(SecretString::from("super_secret_csrf_value"));
        config.cookie = Some(SecretString::from("sessionid=super_secret_session_value"));

        let debug_output = format!("{config:?}");

        assert!(debug_output.contains("https://shop.test/"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("super_secret_csrf_value"));
        assert!(!debug_output.contains("super_secret_session_value"));
    }
}
