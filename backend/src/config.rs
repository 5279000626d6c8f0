//! Runtime configuration, read from the environment (and `.env` if present).
//!
//! | Variable           | Default                   |
//! |--------------------|---------------------------|
//! | `BACKEND_HOST`     | `0.0.0.0`                 |
//! | `BACKEND_PORT`     | `3001`                    |
//! | `STORE_BACKEND`    | `redis` (`memory` also)   |
//! | `REDIS_URL`        | `redis://127.0.0.1:6379`  |
//! | `FRONTEND_ORIGINS` | empty (any origin)        |
//! | `STATIC_DIR`       | unset (no static files)   |

use std::env;
use std::path::PathBuf;

use axum::http::HeaderValue;
use thiserror::Error;

const DEFAULT_REDIS_URL: &str = "redis://127.0.0.1:6379";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {message}")]
    InvalidValue { key: &'static str, message: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreBackend {
    Redis { url: String },
    Memory,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub store: StoreBackend,
    /// Browser origins allowed by CORS. Empty allows any origin.
    pub frontend_origins: Vec<String>,
    pub static_dir: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3001,
            store: StoreBackend::Redis {
                url: DEFAULT_REDIS_URL.to_string(),
            },
            frontend_origins: Vec::new(),
            static_dir: None,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let host = lookup("BACKEND_HOST").unwrap_or(defaults.host);
        let port = match lookup("BACKEND_PORT") {
            Some(raw) => raw.parse().map_err(|_| ConfigError::InvalidValue {
                key: "BACKEND_PORT",
                message: format!("'{raw}' is not a port number"),
            })?,
            None => defaults.port,
        };

        let store = match lookup("STORE_BACKEND").as_deref() {
            None | Some("redis") => StoreBackend::Redis {
                url: lookup("REDIS_URL").unwrap_or_else(|| DEFAULT_REDIS_URL.to_string()),
            },
            Some("memory") => StoreBackend::Memory,
            Some(other) => {
                return Err(ConfigError::InvalidValue {
                    key: "STORE_BACKEND",
                    message: format!("'{other}' is not one of redis, memory"),
                })
            }
        };

        let frontend_origins = match lookup("FRONTEND_ORIGINS") {
            Some(raw) => parse_origins(&raw)?,
            None => defaults.frontend_origins,
        };

        let static_dir = lookup("STATIC_DIR")
            .filter(|dir| !dir.is_empty())
            .map(PathBuf::from);

        Ok(Self {
            host,
            port,
            store,
            frontend_origins,
            static_dir,
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_origins(raw: &str) -> Result<Vec<String>, ConfigError> {
    raw.split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(|origin| {
            HeaderValue::from_str(origin)
                .map(|_| origin.to_string())
                .map_err(|_| ConfigError::InvalidValue {
                    key: "FRONTEND_ORIGINS",
                    message: format!("'{origin}' is not a valid origin"),
                })
        })
        .collect()
}
