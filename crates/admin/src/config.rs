//! Admin configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `SHOPDESK_DATABASE_URL` - `PostgreSQL` endpoint URL (falls back to `DATABASE_URL`)
//! - `SHOPDESK_DATABASE_KEY` - Service credential for the database role
//!
//! ## Optional
//! - `SHOPDESK_HOST` - Bind address (default: 127.0.0.1)
//! - `SHOPDESK_PORT` - Listen port (default: 3001)
//! - `SHOPDESK_DATABASE_MAX_CONNECTIONS` - Pool size (default: 10)
//! - `SHOPDESK_DATABASE_ACQUIRE_TIMEOUT_SECS` - Pool acquire timeout (default: 10)
//! - `SHOPDESK_CONNECTION_SLOT` - Slot the store connection is kept under (default: `default`)
//! - `SHOPDESK_LOG_FORMAT` - `text` or `json` (default: `json` on Fly.io, `text` elsewhere)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT`, `SENTRY_SAMPLE_RATE`, `SENTRY_TRACES_SAMPLE_RATE`
//!
//! ## Optional (TLS)
//! - `SHOPDESK_TLS_CERT` - PEM-encoded certificate chain
//! - `SHOPDESK_TLS_KEY` - PEM-encoded private key

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use shopdesk_core::ConnectionSlot;
use thiserror::Error;

/// Database endpoint variable.
pub const DATABASE_URL_VAR: &str = "SHOPDESK_DATABASE_URL";
/// Database service credential variable.
pub const DATABASE_KEY_VAR: &str = "SHOPDESK_DATABASE_KEY";

const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
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
    #[error(
        "Missing database settings. Environment variables SHOPDESK_DATABASE_URL and SHOPDESK_DATABASE_KEY must be set."
    )]
    MissingDatabaseSettings,
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable lines.
    Text,
    /// One JSON object per event.
    Json,
}

/// Admin application configuration.
#[derive(Debug, Clone)]
pub struct AdminConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Database gateway settings
    pub database: DatabaseConfig,
    /// Slot the store connection record is stored under
    pub connection_slot: ConnectionSlot,
    /// Log output format
    pub log_format: LogFormat,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., "development", "staging", "production")
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate (0.0 to 1.0)
    pub sentry_sample_rate: f32,
    /// Sentry traces sample rate for performance monitoring (0.0 to 1.0)
    pub sentry_traces_sample_rate: f32,
    /// TLS configuration for HTTPS (optional)
    pub tls: Option<TlsConfig>,
}

/// Settings for the database gateway.
///
/// Implements `Debug` manually to redact the endpoint (it may embed a
/// password) and the service credential.
#[derive(Clone)]
pub struct DatabaseConfig {
    /// Endpoint URL
    pub url: SecretString,
    /// Service credential, applied as the connection password
    pub service_key: SecretString,
    /// Maximum pooled connections
    pub max_connections: u32,
    /// How long to wait for a pooled connection
    pub acquire_timeout: Duration,
}

impl std::fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("url", &"[REDACTED]")
            .field("service_key", &"[REDACTED]")
            .field("max_connections", &self.max_connections)
            .field("acquire_timeout", &self.acquire_timeout)
            .finish()
    }
}

impl DatabaseConfig {
    /// Load the database settings from an environment source.
    ///
    /// Both the endpoint and the service credential are required. If either is
    /// missing the whole load fails; there is no partial configuration.
    fn from_source(env: &EnvSource<'_>) -> Result<Self, ConfigError> {
        let url = env
            .get(DATABASE_URL_VAR)
            .or_else(|| env.get("DATABASE_URL"))
            .filter(|v| !v.trim().is_empty());
        let service_key = env.get(DATABASE_KEY_VAR).filter(|v| !v.trim().is_empty());

        let (Some(url), Some(service_key)) = (url, service_key) else {
            return Err(ConfigError::MissingDatabaseSettings);
        };

        let max_connections = parse_or_default(env, "SHOPDESK_DATABASE_MAX_CONNECTIONS", 10_u32)?;
        if max_connections == 0 {
            return Err(ConfigError::InvalidEnvVar(
                "SHOPDESK_DATABASE_MAX_CONNECTIONS".to_string(),
                "must be at least 1".to_string(),
            ));
        }
        let acquire_timeout_secs =
            parse_or_default(env, "SHOPDESK_DATABASE_ACQUIRE_TIMEOUT_SECS", 10_u64)?;

        Ok(Self {
            url: SecretString::from(url),
            service_key: SecretString::from(service_key),
            max_connections,
            acquire_timeout: Duration::from_secs(acquire_timeout_secs),
        })
    }
}

/// TLS configuration for HTTPS.
#[derive(Clone)]
pub struct TlsConfig {
    /// PEM-encoded certificate chain
    pub cert_pem: String,
    /// PEM-encoded private key
    pub key_pem: SecretString,
}

impl std::fmt::Debug for TlsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TlsConfig")
            .field("cert_pem", &"[CERTIFICATE]")
            .field("key_pem", &"[REDACTED]")
            .finish()
    }
}

impl TlsConfig {
    fn from_source(env: &EnvSource<'_>) -> Result<Option<Self>, ConfigError> {
        let cert_pem = env.get("SHOPDESK_TLS_CERT");
        let key_pem = env.get("SHOPDESK_TLS_KEY");

        match (cert_pem, key_pem) {
            (Some(cert), Some(key)) => Ok(Some(Self {
                cert_pem: cert,
                key_pem: SecretString::from(key),
            })),
            (None, None) => Ok(None),
            _ => Err(ConfigError::InvalidEnvVar(
                "SHOPDESK_TLS_*".to_string(),
                "Both SHOPDESK_TLS_CERT and SHOPDESK_TLS_KEY must be set together".to_string(),
            )),
        }
    }
}

impl AdminConfig {
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

        let lookup = |key: &str| std::env::var(key).ok();
        Self::from_source(&EnvSource::new(&lookup))
    }

    /// Load configuration from an arbitrary key lookup.
    ///
    /// Tests use this instead of mutating the process environment.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_lookup(lookup: &dyn Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        Self::from_source(&EnvSource::new(lookup))
    }

    fn from_source(env: &EnvSource<'_>) -> Result<Self, ConfigError> {
        let database = DatabaseConfig::from_source(env)?;
        let host = env
            .get_or_default("SHOPDESK_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("SHOPDESK_HOST".to_string(), e.to_string()))?;
        let port = parse_or_default(env, "SHOPDESK_PORT", 3001_u16)?;
        let connection_slot = env
            .get_or_default("SHOPDESK_CONNECTION_SLOT", ConnectionSlot::DEFAULT)
            .parse::<ConnectionSlot>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("SHOPDESK_CONNECTION_SLOT".to_string(), e.to_string())
            })?;
        let log_format = match env.get("SHOPDESK_LOG_FORMAT").as_deref() {
            Some("json") => LogFormat::Json,
            Some("text") => LogFormat::Text,
            Some(other) => {
                return Err(ConfigError::InvalidEnvVar(
                    "SHOPDESK_LOG_FORMAT".to_string(),
                    format!("expected 'text' or 'json', got '{other}'"),
                ));
            }
            // Structured logs on Fly.io, readable text locally
            None if env.get("FLY_APP_NAME").is_some() => LogFormat::Json,
            None => LogFormat::Text,
        };
        let sentry_dsn = env.get("SENTRY_DSN");
        let sentry_environment = env.get("SENTRY_ENVIRONMENT");
        let sentry_sample_rate = env
            .get("SENTRY_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);
        let sentry_traces_sample_rate = env
            .get("SENTRY_TRACES_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);
        let tls = TlsConfig::from_source(env)?;

        Ok(Self {
            host,
            port,
            database,
            connection_slot,
            log_format,
            sentry_dsn,
            sentry_environment,
            sentry_sample_rate,
            sentry_traces_sample_rate,
            tls,
        })
    }

    /// Non-fatal problems with the loaded secrets.
    ///
    /// Loading runs before logging is set up, so callers log these once their
    /// subscriber is installed.
    #[must_use]
    pub fn security_warnings(&self) -> Vec<ConfigError> {
        validate_secret_strength(self.database.service_key.expose_secret(), DATABASE_KEY_VAR)
            .err()
            .into_iter()
            .collect()
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

/// Key lookup backing configuration loading.
struct EnvSource<'a> {
    lookup: &'a dyn Fn(&str) -> Option<String>,
}

impl<'a> EnvSource<'a> {
    const fn new(lookup: &'a dyn Fn(&str) -> Option<String>) -> Self {
        Self { lookup }
    }

    /// Get an optional variable.
    fn get(&self, key: &str) -> Option<String> {
        (self.lookup)(key)
    }

    /// Get a variable with a default value.
    fn get_or_default(&self, key: &str, default: &str) -> String {
        self.get(key).unwrap_or_else(|| default.to_string())
    }
}

/// Parse an optional variable, falling back to `default` when unset.
fn parse_or_default<T>(env: &EnvSource<'_>, key: &str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    env.get(key).map_or(Ok(default), |raw| {
        raw.parse::<T>()
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
    })
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
