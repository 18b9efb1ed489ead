//! Application configuration
//!
//! All configuration is resolved once at process start from environment
//! variables (with CLI overrides) into an explicit `AppConfig` that is passed
//! by reference into the services. Nothing reads the environment after boot.

use std::env;
use std::fmt;

use anyhow::{Context, Result, bail};

use super::cli::CliConfig;
use super::constants::{
    DEFAULT_ACCESS_TOKEN_TTL_SECS, DEFAULT_CORS_ORIGIN, DEFAULT_HOST, DEFAULT_OTP_TTL_MINUTES,
    DEFAULT_PORT, DEFAULT_REFRESH_TOKEN_TTL_SECS, ENV_ACCESS_TOKEN_SECRET, ENV_ACCESS_TOKEN_TTL,
    ENV_CORS_ORIGIN, ENV_DATABASE_PATH, ENV_HOST, ENV_MAILER_API_KEY, ENV_MAILER_API_URL,
    ENV_MAILER_BACKEND, ENV_MAILER_FROM, ENV_OTP_TTL, ENV_PORT, ENV_REFRESH_TOKEN_SECRET,
    ENV_REFRESH_TOKEN_TTL, SQLITE_DB_FILENAME,
};

// =============================================================================
// Mailer Backend Enum
// =============================================================================

/// Outgoing mail backend
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MailerBackend {
    /// Log messages instead of delivering them (dev/test default)
    #[default]
    Log,
    /// Deliver through an HTTP mail API
    Http,
}

impl fmt::Display for MailerBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MailerBackend::Log => write!(f, "log"),
            MailerBackend::Http => write!(f, "http"),
        }
    }
}

// =============================================================================
// Config Sections
// =============================================================================

/// HTTP server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors_origin: String,
}

/// Token and OTP configuration
///
/// The access and refresh secrets are distinct on purpose: a token signed
/// with one must never verify against the other.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub access_secret: String,
    pub access_ttl_secs: i64,
    pub refresh_secret: String,
    pub refresh_ttl_secs: i64,
    pub otp_ttl_minutes: i64,
}

/// SQLite database configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Database file path, or `:memory:` for an in-memory database
    pub path: String,
}

/// Outgoing email configuration
#[derive(Debug, Clone)]
pub struct EmailConfig {
    pub backend: MailerBackend,
    pub api_url: Option<String>,
    pub api_key: Option<String>,
    pub from_address: String,
}

/// Complete application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub auth: AuthConfig,
    pub database: DatabaseConfig,
    pub email: EmailConfig,
}

impl AppConfig {
    /// Load configuration from the environment, applying CLI overrides.
    ///
    /// Fails fast when a required secret is missing or a numeric value does
    /// not parse; a server with a broken auth configuration must not start.
    pub fn load(cli: &CliConfig) -> Result<Self> {
        let host = cli
            .host
            .clone()
            .or_else(|| env::var(ENV_HOST).ok())
            .unwrap_or_else(|| DEFAULT_HOST.to_string());

        let port = match cli.port {
            Some(port) => port,
            None => parse_env(ENV_PORT)?.unwrap_or(DEFAULT_PORT),
        };

        let cors_origin =
            env::var(ENV_CORS_ORIGIN).unwrap_or_else(|_| DEFAULT_CORS_ORIGIN.to_string());

        let access_secret = require_env(ENV_ACCESS_TOKEN_SECRET)?;
        let refresh_secret = require_env(ENV_REFRESH_TOKEN_SECRET)?;
        if access_secret == refresh_secret {
            bail!(
                "{} and {} must not be identical",
                ENV_ACCESS_TOKEN_SECRET,
                ENV_REFRESH_TOKEN_SECRET
            );
        }

        let auth = AuthConfig {
            access_secret,
            access_ttl_secs: parse_env(ENV_ACCESS_TOKEN_TTL)?
                .unwrap_or(DEFAULT_ACCESS_TOKEN_TTL_SECS),
            refresh_secret,
            refresh_ttl_secs: parse_env(ENV_REFRESH_TOKEN_TTL)?
                .unwrap_or(DEFAULT_REFRESH_TOKEN_TTL_SECS),
            otp_ttl_minutes: parse_env(ENV_OTP_TTL)?.unwrap_or(DEFAULT_OTP_TTL_MINUTES),
        };

        let database = DatabaseConfig {
            path: cli
                .database
                .clone()
                .or_else(|| env::var(ENV_DATABASE_PATH).ok())
                .unwrap_or_else(|| SQLITE_DB_FILENAME.to_string()),
        };

        let backend = match env::var(ENV_MAILER_BACKEND).ok().as_deref() {
            None | Some("log") => MailerBackend::Log,
            Some("http") => MailerBackend::Http,
            Some(other) => bail!("Unknown mailer backend: {}", other),
        };

        let email = EmailConfig {
            backend,
            api_url: env::var(ENV_MAILER_API_URL).ok(),
            api_key: env::var(ENV_MAILER_API_KEY).ok(),
            from_address: env::var(ENV_MAILER_FROM)
                .unwrap_or_else(|_| "no-reply@quickbill.local".to_string()),
        };

        if email.backend == MailerBackend::Http && email.api_url.is_none() {
            bail!("{} is required for the http mailer", ENV_MAILER_API_URL);
        }

        Ok(Self {
            server: ServerConfig {
                host,
                port,
                cors_origin,
            },
            auth,
            database,
            email,
        })
    }
}

fn require_env(name: &str) -> Result<String> {
    env::var(name).with_context(|| format!("{} must be set", name))
}

fn parse_env<T: std::str::FromStr>(name: &str) -> Result<Option<T>>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(raw) => {
            let value = raw
                .parse::<T>()
                .with_context(|| format!("{} must be a valid number", name))?;
            Ok(Some(value))
        }
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_auth_config() -> AuthConfig {
        AuthConfig {
            access_secret: "access-secret".to_string(),
            access_ttl_secs: DEFAULT_ACCESS_TOKEN_TTL_SECS,
            refresh_secret: "refresh-secret".to_string(),
            refresh_ttl_secs: DEFAULT_REFRESH_TOKEN_TTL_SECS,
            otp_ttl_minutes: DEFAULT_OTP_TTL_MINUTES,
        }
    }

    #[test]
    fn test_defaults() {
        let auth = test_auth_config();
        assert_eq!(auth.access_ttl_secs, 3600);
        assert_eq!(auth.refresh_ttl_secs, 86_400);
        assert_eq!(auth.otp_ttl_minutes, 5);
    }

    #[test]
    fn test_mailer_backend_display() {
        assert_eq!(MailerBackend::Log.to_string(), "log");
        assert_eq!(MailerBackend::Http.to_string(), "http");
    }
}
