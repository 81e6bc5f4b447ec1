//! Configuration management for receptor.
//!
//! Configuration is read once at startup from environment variables:
//! - `HOST` - Optional. Listen host. Defaults to `127.0.0.1`.
//! - `PORT` - Optional. Listen port. Defaults to `8887`.
//! - `STORE_BACKEND` - Optional. `memory` or `sqlite`. Defaults to `sqlite`.
//! - `STORE_PATH` - Optional. SQLite database file. Defaults to `./receptor.db`.
//! - `STORE_TIMEOUT_MS` - Optional. Bound on every store call. Defaults to `5000`.
//! - `RECEPTOR_USERNAME` / `RECEPTOR_PASSWORD` - Optional. HTTP Basic
//!   credentials. Leaving both empty disables authentication.
//!
//! The resulting [`Config`] is immutable and shared by reference.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::store::StoreType;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

/// Store connection settings.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Which backend to open
    pub backend: StoreType,

    /// Store endpoint (database file for SQLite)
    pub path: PathBuf,

    /// Upper bound on any single store call
    pub timeout: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreType::default(),
            path: PathBuf::from("receptor.db"),
            timeout: Duration::from_millis(5000),
        }
    }
}

/// Expected HTTP Basic credentials.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct AuthConfig {
    pub username: String,
    pub password: String,
}

impl AuthConfig {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Auth is off only when both username and password are empty.
    pub fn is_enabled(&self) -> bool {
        !(self.username.is_empty() && self.password.is_empty())
    }
}

// Never print the password.
impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Gateway configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server host
    pub host: String,

    /// Server port
    pub port: u16,

    /// Backing store settings
    pub store: StoreConfig,

    /// Basic auth credentials
    pub auth: AuthConfig,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` for unparsable values.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = lookup("HOST").unwrap_or_else(|| "127.0.0.1".to_string());

        let port = lookup("PORT")
            .unwrap_or_else(|| "8887".to_string())
            .parse()
            .map_err(|e| ConfigError::InvalidValue("PORT".to_string(), format!("{}", e)))?;

        let backend = match lookup("STORE_BACKEND") {
            Some(value) => StoreType::parse(&value).ok_or_else(|| {
                ConfigError::InvalidValue(
                    "STORE_BACKEND".to_string(),
                    format!("unknown backend '{}', expected memory or sqlite", value),
                )
            })?,
            None => StoreType::default(),
        };

        let path = lookup("STORE_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| StoreConfig::default().path);

        let timeout_ms: u64 = lookup("STORE_TIMEOUT_MS")
            .unwrap_or_else(|| "5000".to_string())
            .parse()
            .map_err(|e| {
                ConfigError::InvalidValue("STORE_TIMEOUT_MS".to_string(), format!("{}", e))
            })?;
        if timeout_ms == 0 {
            return Err(ConfigError::InvalidValue(
                "STORE_TIMEOUT_MS".to_string(),
                "must be greater than zero".to_string(),
            ));
        }

        let auth = AuthConfig {
            username: lookup("RECEPTOR_USERNAME").unwrap_or_default(),
            password: lookup("RECEPTOR_PASSWORD").unwrap_or_default(),
        };

        Ok(Self {
            host,
            port,
            store: StoreConfig {
                backend,
                path,
                timeout: Duration::from_millis(timeout_ms),
            },
            auth,
        })
    }

    /// Create a config with custom values (useful for testing).
    pub fn new(auth: AuthConfig, store: StoreConfig) -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8887,
            store,
            auth,
        }
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.listen_addr(), "127.0.0.1:8887");
        assert_eq!(config.store.backend, StoreType::Sqlite);
        assert_eq!(config.store.timeout, Duration::from_millis(5000));
        assert!(!config.auth.is_enabled());
    }

    #[test]
    fn test_explicit_values() {
        let config = Config::from_lookup(lookup_from(&[
            ("HOST", "0.0.0.0"),
            ("PORT", "9000"),
            ("STORE_BACKEND", "memory"),
            ("STORE_PATH", "/var/lib/receptor/store.db"),
            ("STORE_TIMEOUT_MS", "250"),
            ("RECEPTOR_USERNAME", "username"),
            ("RECEPTOR_PASSWORD", "password"),
        ]))
        .unwrap();

        assert_eq!(config.listen_addr(), "0.0.0.0:9000");
        assert_eq!(config.store.backend, StoreType::Memory);
        assert_eq!(config.store.path, PathBuf::from("/var/lib/receptor/store.db"));
        assert_eq!(config.store.timeout, Duration::from_millis(250));
        assert!(config.auth.is_enabled());
    }

    #[test]
    fn test_invalid_values() {
        assert!(matches!(
            Config::from_lookup(lookup_from(&[("PORT", "http")])),
            Err(ConfigError::InvalidValue(name, _)) if name == "PORT"
        ));
        assert!(matches!(
            Config::from_lookup(lookup_from(&[("STORE_BACKEND", "etcd")])),
            Err(ConfigError::InvalidValue(name, _)) if name == "STORE_BACKEND"
        ));
        assert!(matches!(
            Config::from_lookup(lookup_from(&[("STORE_TIMEOUT_MS", "0")])),
            Err(ConfigError::InvalidValue(name, _)) if name == "STORE_TIMEOUT_MS"
        ));
    }

    #[test]
    fn test_auth_enabled_when_either_credential_set() {
        assert!(!AuthConfig::new("", "").is_enabled());
        assert!(AuthConfig::new("user", "").is_enabled());
        assert!(AuthConfig::new("", "secret").is_enabled());
    }

    #[test]
    fn test_debug_redacts_password() {
        let rendered = format!("{:?}", AuthConfig::new("user", "hunter2"));
        assert!(rendered.contains("user"));
        assert!(!rendered.contains("hunter2"));
    }
}
