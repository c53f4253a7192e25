//! Configuration management for Advent Server

use serde::Deserialize;
use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub auth: AuthConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Public URL encoded into QR codes, without trailing slash
    pub base_url: String,
    /// Maximum accepted request body for uploads, in bytes
    pub max_upload_bytes: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Root directory holding one sub-directory per model
    pub models_dir: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    pub username: String,
    pub password: String,
}

const DEFAULT_PORT: u16 = 3000;
const DEFAULT_BASE_URL: &str = "http://localhost:3000";
const DEFAULT_MODELS_DIR: &str = "files";
const DEFAULT_MAX_UPLOAD_MB: usize = 100;

impl Default for Config {
    fn default() -> Self {
        Config {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: DEFAULT_PORT,
                base_url: DEFAULT_BASE_URL.to_string(),
                max_upload_bytes: DEFAULT_MAX_UPLOAD_MB * 1024 * 1024,
            },
            storage: StorageConfig {
                models_dir: PathBuf::from(DEFAULT_MODELS_DIR),
            },
            auth: AuthConfig {
                username: "admin".to_string(),
                password: "admin".to_string(),
            },
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, env::VarError> {
        Ok(Config {
            server: ServerConfig {
                host: env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: parse_or_default("SERVER_PORT", DEFAULT_PORT),
                base_url: normalize_base_url(
                    &env::var("BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
                ),
                max_upload_bytes: parse_or_default("MAX_UPLOAD_MB", DEFAULT_MAX_UPLOAD_MB)
                    * 1024
                    * 1024,
            },
            storage: StorageConfig {
                models_dir: env::var("MODELS_DIR")
                    .map(PathBuf::from)
                    .unwrap_or_else(|_| PathBuf::from(DEFAULT_MODELS_DIR)),
            },
            auth: AuthConfig {
                username: env::var("ADMIN_USERNAME").unwrap_or_else(|_| "admin".to_string()),
                password: env::var("ADMIN_PASSWORD").unwrap_or_else(|_| "admin".to_string()),
            },
        })
    }

    /// Replace the models directory, keeping everything else
    pub fn with_models_dir(mut self, models_dir: impl Into<PathBuf>) -> Self {
        self.storage.models_dir = models_dir.into();
        self
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.server.base_url = normalize_base_url(base_url);
        self
    }
}

fn parse_or_default<T: std::str::FromStr + Copy + std::fmt::Display>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!("Invalid value {:?} for {}, using {}", raw, key, default);
            default
        }),
        Err(_) => default,
    }
}

/// Strip trailing slashes so URLs can be joined with `/api/...`
pub fn normalize_base_url(raw: &str) -> String {
    raw.trim().trim_end_matches('/').to_string()
}
