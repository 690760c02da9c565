//! Configuration management for the application.
//!
//! This module centralizes all configuration settings and provides validation
//! for required configuration at startup.

use std::time::Duration;

use crate::cookies::CookieOptions;
use crate::gate::RedirectTargets;
use crate::routes::{RouteConfigError, RouteTable};

/// Application configuration
#[derive(Clone, Debug)]
pub struct Config {
    /// The URL of the authentication server
    pub auth_server_url: String,
    /// The client ID used against the authentication server
    pub client_id: String,
    /// The client secret used against the authentication server
    pub client_secret: String,
    /// The application URL
    pub app_url: String,
    /// Whether the application is running in development mode
    pub dev_mode: bool,
    pub host: String,
    pub port: u16,
    /// Introspection endpoint, discovered when unset
    pub introspection_url: Option<String>,
    /// Token endpoint for refreshing sessions, discovered when unset
    pub token_url: Option<String>,
    /// Root of the protected area
    pub protected_root: String,
    /// The auth entry point
    pub login_path: String,
    /// Where signed-in callers visiting the login page are sent
    pub protected_home: String,
    pub access_token_cookie: String,
    pub refresh_token_cookie: String,
    /// Upper bound for a single session verification
    pub verification_timeout: Option<Duration>,
}

impl Config {
    /// Create a new configuration from the process environment
    ///
    /// A `.env` file in the working directory is loaded first when present.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Create a new configuration from an arbitrary key/value source
    ///
    /// # Arguments
    ///
    /// * `lookup` - Returns the value for a configuration key, if set
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let required = |key: &'static str| lookup(key).ok_or(ConfigError::MissingValue(key));
        let optional = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let auth_server_url = required("AUTH_SERVER_URL")?;
        let client_id = required("CLIENT_ID")?;
        let client_secret = required("CLIENT_SECRET")?;
        let app_url = required("APP_URL")?;

        let dev_mode = lookup("DEV_MODE")
            .map(|var| var == "true")
            .unwrap_or(false);

        let port = optional("PORT", "8080");
        let port = port.parse::<u16>().map_err(|_| ConfigError::InvalidValue {
            key: "PORT",
            value: port,
        })?;

        let verification_timeout = match lookup("VERIFY_TIMEOUT_MS") {
            Some(value) => Some(Duration::from_millis(value.parse::<u64>().map_err(|_| {
                ConfigError::InvalidValue {
                    key: "VERIFY_TIMEOUT_MS",
                    value,
                }
            })?)),
            None => None,
        };

        let protected_root = optional("PROTECTED_ROOT", "/dashboard");
        let protected_home = lookup("PROTECTED_HOME").unwrap_or_else(|| protected_root.clone());

        Ok(Config {
            auth_server_url,
            client_id,
            client_secret,
            app_url,
            dev_mode,
            host: optional("HOST", "127.0.0.1"),
            port,
            introspection_url: lookup("INTROSPECTION_URL"),
            token_url: lookup("TOKEN_URL"),
            protected_root,
            login_path: optional("LOGIN_PATH", "/login"),
            protected_home,
            access_token_cookie: optional("ACCESS_TOKEN_COOKIE", "access_token"),
            refresh_token_cookie: optional("REFRESH_TOKEN_COOKIE", "refresh_token"),
            verification_timeout,
        })
    }

    /// Socket address the server binds to, e.g. `127.0.0.1:8080`
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn route_table(&self) -> Result<RouteTable, RouteConfigError> {
        RouteTable::for_paths(&self.protected_root, &self.login_path)
    }

    pub fn redirect_targets(&self) -> RedirectTargets {
        RedirectTargets::new(&self.login_path, &self.protected_home)
    }

    /// Attributes for the session cookies, scoped to the application host
    pub fn cookie_options(&self) -> CookieOptions {
        let mut options = CookieOptions::default().with_secure(!self.dev_mode);

        // Handle localhost special case
        if let Ok(uri) = self.app_url.parse::<http::Uri>() {
            if let Some(host) = uri.host() {
                if host != "localhost" {
                    options = options.with_domain(host);
                }
            }
        }

        options
    }
}

/// Errors that can occur when loading configuration
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// A required configuration value is missing
    #[error("Missing required configuration value: {0}")]
    MissingValue(&'static str),
    /// A configuration value could not be parsed
    #[error("Invalid value for {key}: {value:?}")]
    InvalidValue { key: &'static str, value: String },
}
