//! Startup configuration.
//!
//! All environment access happens here, once, at startup. Components that
//! need a secret or a policy flag receive it through their constructors;
//! nothing in the crate reads process environment at call time.

use crate::errors::ConfigError;
use crate::executor::ExecutorKind;

/// Token issuance settings.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub token_secret: String,
    pub token_ttl_secs: i64,
}

/// Session cookie policy.
///
/// The resave / save-uninitialized flags mirror the session middleware the
/// upstream clients were written against; the server consults
/// `secure_cookies` when it issues its auth cookie.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub secret: String,
    pub resave: bool,
    pub save_uninitialized: bool,
    pub secure_cookies: bool,
}

/// Full application configuration, initialized once per process.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    /// Allowed browser origin for CORS; `None` means permissive (dev mode).
    pub frontend_origin: Option<String>,
    pub executor: ExecutorKind,
    pub auth: AuthConfig,
    pub session: SessionConfig,
}

impl AppConfig {
    /// Load configuration from process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    /// Load configuration from an arbitrary variable source.
    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let port = match var("PORT") {
            Some(raw) => raw.parse::<u16>().map_err(|e| ConfigError::Invalid {
                var: "PORT".to_string(),
                reason: e.to_string(),
            })?,
            None => 3000,
        };

        let executor = match var("EXECUTOR_KIND") {
            Some(raw) => raw.parse::<ExecutorKind>().map_err(|e| ConfigError::Invalid {
                var: "EXECUTOR_KIND".to_string(),
                reason: e.to_string(),
            })?,
            None => ExecutorKind::Sandbox,
        };

        let token_secret = var("TOKEN_SECRET")
            .filter(|s| !s.is_empty())
            .ok_or_else(|| ConfigError::MissingVar("TOKEN_SECRET".to_string()))?;
        let session_secret = var("SESSION_SECRET")
            .filter(|s| !s.is_empty())
            .ok_or_else(|| ConfigError::MissingVar("SESSION_SECRET".to_string()))?;

        let token_ttl_secs = match var("TOKEN_TTL_SECS") {
            Some(raw) => raw.parse::<i64>().map_err(|e| ConfigError::Invalid {
                var: "TOKEN_TTL_SECS".to_string(),
                reason: e.to_string(),
            })?,
            None => crate::auth::token::DEFAULT_TTL_SECS,
        };

        let production = var("PRISM_ENV").as_deref() == Some("production");

        Ok(Self {
            port,
            frontend_origin: var("FRONTEND_URL").filter(|s| !s.is_empty()),
            executor,
            auth: AuthConfig { token_secret, token_ttl_secs },
            session: SessionConfig {
                secret: session_secret,
                resave: false,
                save_uninitialized: false,
                secure_cookies: production,
            },
        })
    }
}
