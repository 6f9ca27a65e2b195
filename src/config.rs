//! Server configuration read from the environment (and `.env`, if present).

use std::env;
use thiserror::Error;

/// Minimum length of `SESSION_KEY` accepted by the cookie session signer.
pub const SESSION_KEY_MIN_LEN: usize = 64;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{name} is not a valid number: {value}")]
    InvalidNumber { name: &'static str, value: String },

    #[error("SESSION_KEY must be at least 64 bytes, got {0}")]
    SessionKeyTooShort(usize),
}

#[derive(Clone, Debug)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// Absent: tournaments live in memory for the lifetime of the process.
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    /// Absent: a random key is generated at startup.
    pub session_key: Option<Vec<u8>>,
}

fn var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn number<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match var(name) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidNumber { name, value }),
        None => Ok(default),
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let session_key = var("SESSION_KEY").map(String::into_bytes);
        if let Some(key) = &session_key {
            if key.len() < SESSION_KEY_MIN_LEN {
                return Err(ConfigError::SessionKeyTooShort(key.len()));
            }
        }

        Ok(Self {
            host: var("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: number("PORT", 8080)?,
            database_url: var("DATABASE_URL"),
            database_max_connections: number("DATABASE_MAX_CONNECTIONS", 5)?,
            session_key,
        })
    }

    pub fn bind_address(&self) -> (String, u16) {
        (self.host.clone(), self.port)
    }
}
