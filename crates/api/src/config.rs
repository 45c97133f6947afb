//! API configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `LAUNDRY_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//!
//! ## Optional
//! - `LAUNDRY_HOST` - Bind address (default: 127.0.0.1)
//! - `LAUNDRY_PORT` - Listen port (default: 8000)
//! - `DB_POOL_MIN` - Minimum pooled connections (default: 1)
//! - `DB_POOL_MAX` - Maximum pooled connections (default: 5)
//! - `DB_ACQUIRE_TIMEOUT_SECS` - How long a caller waits for a pooled connection (default: 10)
//! - `COOKIE_SECURE` - Set the `Secure` flag on the session cookie (default: false)
//! - `SESSION_TTL_HOURS` - Session lifetime (default: 168, i.e. 7 days)
//! - `GOOGLE_CLIENT_ID` - Audience expected in Google identity tokens
//! - `ALLOWED_EMAIL_DOMAINS` - Comma-separated domains allowed for Google login
//! - `ADMIN_USERNAME` / `ADMIN_PASSWORD` - Bootstrap admin created once at startup
//! - `CORS_ORIGIN` - Allowed browser origin (default: <http://localhost:3000>)
//! - `SENTRY_DSN` - Sentry error tracking DSN

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;

const DEFAULT_SESSION_TTL_HOURS: u64 = 7 * 24;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// API application configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Database connection and pool sizing
    pub database: DatabaseConfig,
    /// Session and login policy
    pub auth: AuthConfig,
    /// Browser origin allowed to call the API with credentials
    pub cors_origin: String,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
}

/// Database connection settings.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub url: SecretString,
    /// Connections kept open while idle
    pub min_connections: u32,
    /// Upper bound on pooled connections
    pub max_connections: u32,
    /// How long a caller blocks waiting for a free connection
    pub acquire_timeout: Duration,
}

/// Authentication policy settings.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Whether the session cookie carries the `Secure` attribute
    pub cookie_secure: bool,
    /// Lifetime of an issued session
    pub session_ttl: Duration,
    /// OAuth client ID expected as the audience of Google identity tokens
    pub google_client_id: Option<String>,
    /// Lowercased email domains allowed to use federated login (empty = any)
    pub allowed_email_domains: Vec<String>,
    /// Admin account applied once at startup
    pub bootstrap_admin: Option<BootstrapAdmin>,
}

/// Credentials for the startup admin account.
///
/// Implements `Debug` manually to redact the password.
#[derive(Clone)]
pub struct BootstrapAdmin {
    pub username: String,
    pub password: SecretString,
}

impl std::fmt::Debug for BootstrapAdmin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BootstrapAdmin")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            cookie_secure: false,
            session_ttl: Duration::from_secs(DEFAULT_SESSION_TTL_HOURS * 60 * 60),
            google_client_id: None,
            allowed_email_domains: Vec::new(),
            bootstrap_admin: None,
        }
    }
}

impl ApiConfig {
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
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let env = Env(&lookup);

        Ok(Self {
            host: env.parsed("LAUNDRY_HOST", IpAddr::from([127, 0, 0, 1]))?,
            port: env.parsed("LAUNDRY_PORT", 8000_u16)?,
            database: DatabaseConfig::from_env(&env)?,
            auth: AuthConfig::from_env(&env)?,
            cors_origin: env
                .optional("CORS_ORIGIN")
                .unwrap_or_else(|| "http://localhost:3000".to_string()),
            sentry_dsn: env.optional("SENTRY_DSN"),
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl DatabaseConfig {
    fn from_env(env: &Env<'_>) -> Result<Self, ConfigError> {
        // Try LAUNDRY_DATABASE_URL first, then the generic DATABASE_URL
        let url = env
            .optional("LAUNDRY_DATABASE_URL")
            .or_else(|| env.optional("DATABASE_URL"))
            .ok_or_else(|| ConfigError::MissingEnvVar("LAUNDRY_DATABASE_URL".to_string()))?;

        let min_connections = env.parsed("DB_POOL_MIN", 1_u32)?;
        let max_connections = env.parsed("DB_POOL_MAX", 5_u32)?;
        if max_connections == 0 || max_connections < min_connections {
            return Err(ConfigError::InvalidEnvVar(
                "DB_POOL_MAX".to_string(),
                format!("must be at least 1 and at least DB_POOL_MIN ({min_connections})"),
            ));
        }
        let acquire_secs = env.parsed("DB_ACQUIRE_TIMEOUT_SECS", 10_u64)?;

        Ok(Self {
            url: SecretString::from(url),
            min_connections,
            max_connections,
            acquire_timeout: Duration::from_secs(acquire_secs),
        })
    }
}

impl AuthConfig {
    fn from_env(env: &Env<'_>) -> Result<Self, ConfigError> {
        let cookie_secure = match env.optional("COOKIE_SECURE") {
            Some(raw) => parse_bool(&raw).ok_or_else(|| {
                ConfigError::InvalidEnvVar("COOKIE_SECURE".to_string(), raw.clone())
            })?,
            None => false,
        };

        let ttl_hours = env.parsed("SESSION_TTL_HOURS", DEFAULT_SESSION_TTL_HOURS)?;
        if ttl_hours == 0 {
            return Err(ConfigError::InvalidEnvVar(
                "SESSION_TTL_HOURS".to_string(),
                "must be greater than zero".to_string(),
            ));
        }

        let bootstrap_admin = match (env.optional("ADMIN_USERNAME"), env.optional("ADMIN_PASSWORD")) {
            (Some(username), Some(password)) => Some(BootstrapAdmin {
                username,
                password: SecretString::from(password),
            }),
            (None, None) => None,
            (Some(_), None) => return Err(ConfigError::MissingEnvVar("ADMIN_PASSWORD".to_string())),
            (None, Some(_)) => return Err(ConfigError::MissingEnvVar("ADMIN_USERNAME".to_string())),
        };

        Ok(Self {
            cookie_secure,
            session_ttl: Duration::from_secs(ttl_hours * 60 * 60),
            google_client_id: env.optional("GOOGLE_CLIENT_ID"),
            allowed_email_domains: env
                .optional("ALLOWED_EMAIL_DOMAINS")
                .map(|raw| parse_domain_list(&raw))
                .unwrap_or_default(),
            bootstrap_admin,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Environment lookup that treats blank values as unset.
struct Env<'a>(&'a dyn Fn(&str) -> Option<String>);

impl Env<'_> {
    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn parsed<T>(&self, key: &str, default: T) -> Result<T, ConfigError>
    where
        T: std::str::FromStr,
        T::Err: std::fmt::Display,
    {
        self.optional(key).map_or(Ok(default), |raw| {
            raw.parse::<T>()
                .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
        })
    }
}

/// Parse a permissive boolean (`true/false`, `1/0`, `yes/no`, `on/off`).
fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Split a comma-separated domain list, dropping blanks and a leading `@`.
fn parse_domain_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|d| d.trim().trim_start_matches('@').to_ascii_lowercase())
        .filter(|d| !d.is_empty())
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use secrecy::ExposeSecret;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<ApiConfig, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        ApiConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[("DATABASE_URL", "postgres://localhost/laundry")]).unwrap();
        assert_eq!(config.socket_addr().to_string(), "127.0.0.1:8000");
        assert_eq!(config.database.min_connections, 1);
        assert_eq!(config.database.max_connections, 5);
        assert_eq!(config.database.acquire_timeout, Duration::from_secs(10));
        assert!(!config.auth.cookie_secure);
        assert_eq!(config.auth.session_ttl, Duration::from_secs(7 * 24 * 3600));
        assert!(config.auth.google_client_id.is_none());
        assert!(config.auth.allowed_email_domains.is_empty());
        assert!(config.auth.bootstrap_admin.is_none());
        assert_eq!(config.cors_origin, "http://localhost:3000");
    }

    #[test]
    fn test_database_url_prefers_specific_key() {
        let config = load(&[
            ("DATABASE_URL", "postgres://generic/db"),
            ("LAUNDRY_DATABASE_URL", "postgres://specific/db"),
        ])
        .unwrap();
        assert_eq!(config.database.url.expose_secret(), "postgres://specific/db");
    }

    #[test]
    fn test_missing_database_url() {
        assert!(matches!(load(&[]), Err(ConfigError::MissingEnvVar(_))));
    }

    #[test]
    fn test_pool_bounds_validated() {
        let result = load(&[
            ("DATABASE_URL", "postgres://localhost/laundry"),
            ("DB_POOL_MIN", "4"),
            ("DB_POOL_MAX", "2"),
        ]);
        assert!(matches!(result, Err(ConfigError::InvalidEnvVar(key, _)) if key == "DB_POOL_MAX"));

        let result = load(&[
            ("DATABASE_URL", "postgres://localhost/laundry"),
            ("DB_POOL_MAX", "lots"),
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_auth_settings() {
        let config = load(&[
            ("DATABASE_URL", "postgres://localhost/laundry"),
            ("COOKIE_SECURE", "yes"),
            ("SESSION_TTL_HOURS", "12"),
            ("GOOGLE_CLIENT_ID", "client-123.apps.googleusercontent.com"),
            ("ALLOWED_EMAIL_DOMAINS", " Laundry.Example, @staff.example ,, "),
        ])
        .unwrap();
        assert!(config.auth.cookie_secure);
        assert_eq!(config.auth.session_ttl, Duration::from_secs(12 * 3600));
        assert_eq!(
            config.auth.google_client_id.as_deref(),
            Some("client-123.apps.googleusercontent.com")
        );
        assert_eq!(
            config.auth.allowed_email_domains,
            vec!["laundry.example".to_string(), "staff.example".to_string()]
        );
    }

    #[test]
    fn test_invalid_cookie_flag() {
        let result = load(&[
            ("DATABASE_URL", "postgres://localhost/laundry"),
            ("COOKIE_SECURE", "sometimes"),
        ]);
        assert!(matches!(result, Err(ConfigError::InvalidEnvVar(_, _))));
    }

    #[test]
    fn test_bootstrap_admin_requires_both_halves() {
        let result = load(&[
            ("DATABASE_URL", "postgres://localhost/laundry"),
            ("ADMIN_USERNAME", "admin"),
        ]);
        assert!(matches!(result, Err(ConfigError::MissingEnvVar(key)) if key == "ADMIN_PASSWORD"));

        let config = load(&[
            ("DATABASE_URL", "postgres://localhost/laundry"),
            ("ADMIN_USERNAME", "admin"),
            ("ADMIN_PASSWORD", "hunter22"),
        ])
        .unwrap();
        let admin = config.auth.bootstrap_admin.unwrap();
        assert_eq!(admin.username, "admin");
        assert_eq!(admin.password.expose_secret(), "hunter22");
    }

    #[test]
    fn test_bootstrap_admin_debug_redacts_password() {
        let admin = BootstrapAdmin {
            username: "admin".to_string(),
            password: SecretString::from("super_secret_password"),
        };
        let debug_output = format!("{admin:?}");
        assert!(debug_output.contains("admin"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("super_secret_password"));
    }

    #[test]
    fn test_parse_bool() {
        assert_eq!(parse_bool("TRUE"), Some(true));
        assert_eq!(parse_bool("0"), Some(false));
        assert_eq!(parse_bool("maybe"), None);
    }
}
