//! Photobooth configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `PHOTOBOOTH_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//! - `PHOTOBOOTH_SESSION_SECRET` - Session cookie signing secret (min 32 chars, high entropy)
//! - `SMTP_USERNAME` - SMTP authentication username
//! - `SMTP_PASSWORD` - SMTP authentication password
//!
//! ## Optional
//! - `PHOTOBOOTH_HOST` - Bind address (default: 0.0.0.0)
//! - `PORT` / `PHOTOBOOTH_PORT` - Listen port (default: 8000)
//! - `PHOTOBOOTH_ENV` - `production` enables `Secure` session cookies (default: development)
//! - `PHOTOBOOTH_ALLOWED_ORIGIN` - Browser origin allowed to call the API with credentials
//! - `PHOTOBOOTH_UPLOADS_DIR` - Root directory for stored images (default: uploads)
//! - `PHOTOBOOTH_MAX_UPLOAD_BYTES` - Request body limit (default: 10 MiB)
//! - `PHOTOBOOTH_DEPARTMENTS` - Comma-separated department allow-list
//! - `SMTP_HOST` - SMTP server hostname (default: smtp.gmail.com)
//! - `SMTP_PORT` - SMTP port (default: 587)
//! - `SMTP_FROM` - Sender address (default: `SMTP_USERNAME`)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` / `SENTRY_TRACES_SAMPLE_RATE` - Sentry sampling (default: 1.0)

use std::collections::{BTreeSet, HashMap};
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;

use axum::http::HeaderValue;
use photobooth_core::{Department, DepartmentError};
use secrecy::SecretString;
use thiserror::Error;

const MIN_SESSION_SECRET_LENGTH: usize = 32;
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;
const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;
const DEFAULT_PORT: u16 = 8000;

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

/// Photobooth application configuration.
#[derive(Debug, Clone)]
pub struct PhotoboothConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// HTTP server configuration
    pub http: HttpConfig,
    /// Image storage configuration
    pub uploads: UploadConfig,
    /// SMTP configuration for photo delivery
    pub email: EmailConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., "development", "production")
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate (0.0 to 1.0)
    pub sentry_sample_rate: f32,
    /// Sentry traces sample rate for performance monitoring (0.0 to 1.0)
    pub sentry_traces_sample_rate: f32,
}

/// HTTP surface configuration: binding, CORS, sessions and body limits.
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Browser origin allowed to send credentialed cross-origin requests
    pub allowed_origin: Option<HeaderValue>,
    /// Maximum accepted request body size in bytes
    pub max_upload_bytes: usize,
    /// Session cookie configuration
    pub session: SessionConfig,
}

/// Session cookie configuration.
///
/// Implements `Debug` manually to redact the signing secret.
#[derive(Clone)]
pub struct SessionConfig {
    /// Secret the cookie signing key is derived from
    pub secret: SecretString,
    /// Whether the cookie carries the `Secure` attribute
    pub secure: bool,
}

impl std::fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionConfig")
            .field("secret", &"[REDACTED]")
            .field("secure", &self.secure)
            .finish()
    }
}

/// Image storage configuration.
#[derive(Debug, Clone)]
pub struct UploadConfig {
    /// Root directory; images land in `<root>/<department>/`
    pub root: PathBuf,
    /// Departments accepted at registration
    pub departments: DepartmentPolicy,
}

/// Which department names registration accepts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum DepartmentPolicy {
    /// Any syntactically valid department; new ones are created on first use.
    #[default]
    Open,
    /// Only the listed departments.
    AllowList(BTreeSet<Department>),
}

impl DepartmentPolicy {
    /// Parse a comma-separated allow-list.
    ///
    /// An empty or whitespace-only list yields [`DepartmentPolicy::Open`].
    ///
    /// # Errors
    ///
    /// Returns the first entry that is not a valid department name.
    pub fn parse_list(list: &str) -> Result<Self, DepartmentError> {
        let departments = list
            .split(',')
            .filter(|entry| !entry.trim().is_empty())
            .map(Department::parse)
            .collect::<Result<BTreeSet<_>, _>>()?;

        if departments.is_empty() {
            Ok(Self::Open)
        } else {
            Ok(Self::AllowList(departments))
        }
    }

    /// Whether registration may use `department`.
    #[must_use]
    pub fn permits(&self, department: &Department) -> bool {
        match self {
            Self::Open => true,
            Self::AllowList(allowed) => allowed.contains(department),
        }
    }
}

/// SMTP email configuration.
///
/// Implements `Debug` manually to redact the password.
#[derive(Clone)]
pub struct EmailConfig {
    /// SMTP server hostname
    pub smtp_host: String,
    /// SMTP server port
    pub smtp_port: u16,
    /// SMTP authentication username
    pub smtp_username: String,
    /// SMTP authentication password
    pub smtp_password: SecretString,
    /// Email sender address (From header)
    pub from_address: String,
}

impl std::fmt::Debug for EmailConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmailConfig")
            .field("smtp_host", &self.smtp_host)
            .field("smtp_port", &self.smtp_port)
            .field("smtp_username", &self.smtp_username)
            .field("smtp_password", &"[REDACTED]")
            .field("from_address", &self.from_address)
            .finish()
    }
}

impl PhotoboothConfig {
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

        let database_url = database_url("PHOTOBOOTH_DATABASE_URL")?;
        let http = HttpConfig::from_env()?;
        let uploads = UploadConfig::from_env()?;
        let email = EmailConfig::from_env()?;
        let sentry_dsn = env_var("SENTRY_DSN");
        let sentry_environment = env_var("SENTRY_ENVIRONMENT");
        let sentry_sample_rate = parse_env("SENTRY_SAMPLE_RATE", 1.0)?;
        let sentry_traces_sample_rate = parse_env("SENTRY_TRACES_SAMPLE_RATE", 1.0)?;

        Ok(Self {
            database_url,
            http,
            uploads,
            email,
            sentry_dsn,
            sentry_environment,
            sentry_sample_rate,
            sentry_traces_sample_rate,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.http.host, self.http.port)
    }
}

impl HttpConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let host = parse_env("PHOTOBOOTH_HOST", IpAddr::from([0, 0, 0, 0]))?;

        // Hosting platforms inject PORT; PHOTOBOOTH_PORT is the explicit override
        let port = match env_var("PHOTOBOOTH_PORT") {
            Some(_) => parse_env("PHOTOBOOTH_PORT", DEFAULT_PORT)?,
            None => parse_env("PORT", DEFAULT_PORT)?,
        };

        let allowed_origin = env_var("PHOTOBOOTH_ALLOWED_ORIGIN")
            .map(|origin| {
                HeaderValue::from_str(origin.trim().trim_end_matches('/')).map_err(|e| {
                    ConfigError::InvalidEnvVar(
                        "PHOTOBOOTH_ALLOWED_ORIGIN".to_string(),
                        e.to_string(),
                    )
                })
            })
            .transpose()?;

        Ok(Self {
            host,
            port,
            allowed_origin,
            max_upload_bytes: parse_env("PHOTOBOOTH_MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES)?,
            session: SessionConfig {
                secret: session_secret("PHOTOBOOTH_SESSION_SECRET")?,
                secure: env_or("PHOTOBOOTH_ENV", "development") == "production",
            },
        })
    }
}

impl UploadConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let departments = env_var("PHOTOBOOTH_DEPARTMENTS")
            .map(|list| DepartmentPolicy::parse_list(&list))
            .transpose()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("PHOTOBOOTH_DEPARTMENTS".to_string(), e.to_string())
            })?
            .unwrap_or_default();

        Ok(Self {
            root: PathBuf::from(env_or("PHOTOBOOTH_UPLOADS_DIR", "uploads")),
            departments,
        })
    }
}

impl EmailConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let smtp_username = required_env("SMTP_USERNAME")?;
        // Mail-provider app passwords are short by design, so no strength check
        let smtp_password = SecretString::from(required_env("SMTP_PASSWORD")?);
        let from_address = env_var("SMTP_FROM").unwrap_or_else(|| smtp_username.clone());

        Ok(Self {
            smtp_host: env_or("SMTP_HOST", "smtp.gmail.com"),
            smtp_port: parse_env("SMTP_PORT", 587)?,
            smtp_username,
            smtp_password,
            from_address,
        })
    }
}

// =============================================================================
// Environment helpers
// =============================================================================

/// Read a variable, treating an empty value as unset.
fn env_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn required_env(key: &str) -> Result<String, ConfigError> {
    env_var(key).ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
}

fn env_or(key: &str, default: &str) -> String {
    env_var(key).unwrap_or_else(|| default.to_string())
}

/// Parse a variable with `FromStr`, falling back to `default` when unset.
fn parse_env<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    env_var(key).map_or(Ok(default), |value| {
        value
            .trim()
            .parse()
            .map_err(|e: T::Err| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
    })
}

/// Database URL from `key`, falling back to the generic `DATABASE_URL`.
fn database_url(key: &str) -> Result<SecretString, ConfigError> {
    env_var(key)
        .or_else(|| env_var("DATABASE_URL"))
        .map(SecretString::from)
        .ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
}

/// Load the session secret and reject short, placeholder or low-entropy values.
fn session_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = required_env(key)?;
    check_secret_strength(&value)
        .map_err(|reason| ConfigError::InsecureSecret(key.to_string(), reason))?;
    Ok(SecretString::from(value))
}

fn check_secret_strength(secret: &str) -> Result<(), String> {
    let length = secret.chars().count();
    if length < MIN_SESSION_SECRET_LENGTH {
        return Err(format!(
            "must be at least {MIN_SESSION_SECRET_LENGTH} characters (got {length})"
        ));
    }

    let lower = secret.to_lowercase();
    if let Some(pattern) = PLACEHOLDER_PATTERNS.iter().find(|p| lower.contains(*p)) {
        return Err(format!("appears to be a placeholder (contains '{pattern}')"));
    }

    let entropy = entropy_bits_per_char(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(format!(
            "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated secret."
        ));
    }

    Ok(())
}

/// Shannon entropy of `s` in bits per character.
#[allow(clippy::cast_precision_loss)]
fn entropy_bits_per_char(s: &str) -> f64 {
    let mut counts: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *counts.entry(c).or_default() += 1;
    }

    let total = counts.values().sum::<usize>() as f64;
    counts
        .values()
        .map(|&n| {
            let p = n as f64 / total;
            -p * p.log2()
        })
        .sum()
}
