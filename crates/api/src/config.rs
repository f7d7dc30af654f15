//! Process configuration, read from environment variables.
//!
//! | Variable | Default |
//! |----------|---------|
//! | `BIND_ADDR` | `0.0.0.0:8080` |
//! | `DATABASE_URL` | unset: in-memory store (dev only) |
//! | `DB_MAX_CONNECTIONS` | `5` |
//! | `DB_ENSURE_SCHEMA` | `true` |
//! | `MAX_UPLOAD_BYTES` | `10485760` (10 MiB) |
//! | `MAX_ENTRY_BYTES` | 10 × `MAX_UPLOAD_BYTES` |

use std::net::SocketAddr;
use std::str::FromStr;

use thiserror::Error;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 << 20;
pub const DEFAULT_DB_MAX_CONNECTIONS: u32 = 5;
/// Default inflated-entry ceiling as a multiple of the upload ceiling.
pub const ENTRY_TO_UPLOAD_RATIO: u64 = 10;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{key}: invalid value {value:?}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    pub bind_addr: SocketAddr,
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    pub db_ensure_schema: bool,
    /// Ceiling on a request body; the whole upload is buffered in memory.
    pub max_upload_bytes: usize,
    /// Ceiling on the `data.csv` entry once decompressed.
    pub max_entry_bytes: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            database_url: None,
            db_max_connections: DEFAULT_DB_MAX_CONNECTIONS,
            db_ensure_schema: true,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            max_entry_bytes: entry_ceiling(DEFAULT_MAX_UPLOAD_BYTES),
        }
    }
}

impl ApiConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup (tests pass a map).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let defaults = Self::default();
        let max_upload_bytes = parse_or(
            get("MAX_UPLOAD_BYTES"),
            "MAX_UPLOAD_BYTES",
            defaults.max_upload_bytes,
        )?;

        Ok(Self {
            bind_addr: parse_or(get("BIND_ADDR"), "BIND_ADDR", defaults.bind_addr)?,
            database_url: get("DATABASE_URL"),
            db_max_connections: parse_or(
                get("DB_MAX_CONNECTIONS"),
                "DB_MAX_CONNECTIONS",
                defaults.db_max_connections,
            )?,
            db_ensure_schema: parse_or(
                get("DB_ENSURE_SCHEMA"),
                "DB_ENSURE_SCHEMA",
                defaults.db_ensure_schema,
            )?,
            max_upload_bytes,
            max_entry_bytes: parse_or(
                get("MAX_ENTRY_BYTES"),
                "MAX_ENTRY_BYTES",
                entry_ceiling(max_upload_bytes),
            )?,
        })
    }
}

fn entry_ceiling(max_upload_bytes: usize) -> u64 {
    (max_upload_bytes as u64).saturating_mul(ENTRY_TO_UPLOAD_RATIO)
}

fn parse_or<T: FromStr>(raw: Option<String>, key: &'static str, default: T) -> Result<T, ConfigError> {
    match raw {
        None => Ok(default),
        Some(value) => value.parse().map_err(|_| ConfigError::Invalid { key, value }),
    }
}
