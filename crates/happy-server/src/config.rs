use std::net::SocketAddr;
use std::path::PathBuf;

use chrono::Duration;
use thiserror::Error;

/// Placeholder JWT secrets that MUST NOT be used.
const PLACEHOLDER_SECRETS: &[&str] = &["change-me-to-a-random-string", "dev-secret-change-me"];

const DEFAULT_MAX_BODY_BYTES: usize = 16 * 1024 * 1024;

/// Accepted range for HAPPY_SESSION_DAYS.
const SESSION_DAYS: std::ops::RangeInclusive<i64> = 1..=3650;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("HAPPY_JWT_SECRET is unset or still a placeholder")]
    MissingSecret,

    #[error("{key} must be a number, got '{value}'")]
    InvalidNumber { key: &'static str, value: String },

    #[error("HAPPY_SESSION_DAYS must be between 1 and 3650, got {0}")]
    InvalidSessionDays(i64),

    #[error("invalid listen address {0}")]
    InvalidAddress(String),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub db_path: PathBuf,
    pub addr: SocketAddr,
    pub jwt_secret: String,
    pub session_ttl: Duration,
    pub max_body_bytes: usize,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let jwt_secret = lookup("HAPPY_JWT_SECRET").unwrap_or_default();
        if jwt_secret.is_empty() || PLACEHOLDER_SECRETS.contains(&jwt_secret.as_str()) {
            return Err(ConfigError::MissingSecret);
        }

        let db_path = lookup("HAPPY_DB_PATH").unwrap_or_else(|| "happy_journal.db".into());
        let host = lookup("HAPPY_HOST").unwrap_or_else(|| "0.0.0.0".into());
        let port: u16 = parse_or(&lookup, "HAPPY_PORT", 3000)?;
        let session_days: i64 = parse_or(&lookup, "HAPPY_SESSION_DAYS", 30)?;
        let session_ttl = Duration::try_days(session_days)
            .filter(|_| SESSION_DAYS.contains(&session_days))
            .ok_or(ConfigError::InvalidSessionDays(session_days))?;
        let max_body_bytes = parse_or(&lookup, "HAPPY_MAX_BODY_BYTES", DEFAULT_MAX_BODY_BYTES)?;

        let addr = format!("{}:{}", host, port);
        let addr = addr
            .parse()
            .map_err(|_| ConfigError::InvalidAddress(addr))?;

        Ok(Self {
            db_path: db_path.into(),
            addr,
            jwt_secret,
            session_ttl,
            max_body_bytes,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        Some(value) => value
            .parse()
            .map_err(|_| ConfigError::InvalidNumber { key, value }),
        None => Ok(default),
    }
}
