//! Database configuration and pool construction
//!
//! The connection string is resolved once at process startup; its absence
//! is a fatal startup condition, never a per-request error. The pool
//! handle is then passed explicitly into each pipeline run; there is no
//! process-wide connection singleton.

use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;
use thiserror::Error;

/// Default maximum database connections in the pool.
pub const DEFAULT_MAX_CONNECTIONS: u32 = 10;

/// Default minimum database connections in the pool.
pub const DEFAULT_MIN_CONNECTIONS: u32 = 2;

/// Default database connection timeout in seconds.
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Default database idle timeout in seconds (10 minutes).
pub const DEFAULT_IDLE_TIMEOUT_SECS: u64 = 600;

/// Database startup errors
#[derive(Error, Debug)]
pub enum DbError {
    /// Database configuration is invalid or missing
    #[error("Database configuration error: {0}. Check DATABASE_URL and connection settings.")]
    Config(String),

    /// Could not establish the connection pool
    #[error("Database connection failed: {0}")]
    Connect(#[from] sqlx::Error),
}

/// Connection pool configuration
#[derive(Debug, Clone)]
pub struct DbConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout_secs: u64,
    pub idle_timeout_secs: u64,
}

impl DbConfig {
    /// Load configuration from the environment (`.env` honored)
    ///
    /// `DATABASE_URL` is required; `DB_MAX_CONNECTIONS`,
    /// `DB_MIN_CONNECTIONS`, `DB_CONNECT_TIMEOUT` and `DB_IDLE_TIMEOUT`
    /// override the defaults.
    pub fn from_env() -> Result<Self, DbError> {
        dotenvy::dotenv().ok();

        let url = std::env::var("DATABASE_URL")
            .map_err(|_| DbError::Config("DATABASE_URL not set".to_string()))?;

        Ok(Self {
            url,
            max_connections: env_or("DB_MAX_CONNECTIONS", DEFAULT_MAX_CONNECTIONS),
            min_connections: env_or("DB_MIN_CONNECTIONS", DEFAULT_MIN_CONNECTIONS),
            connect_timeout_secs: env_or("DB_CONNECT_TIMEOUT", DEFAULT_CONNECT_TIMEOUT_SECS),
            idle_timeout_secs: env_or("DB_IDLE_TIMEOUT", DEFAULT_IDLE_TIMEOUT_SECS),
        })
    }
}

fn env_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

/// Create the connection pool used by ingestion runs
pub async fn create_pool(config: &DbConfig) -> Result<PgPool, DbError> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.connect_timeout_secs))
        .idle_timeout(Duration::from_secs(config.idle_timeout_secs))
        .connect(&config.url)
        .await?;

    Ok(pool)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_or_falls_back_on_missing_or_garbage() {
        assert_eq!(env_or("HRDP_TEST_UNSET_VARIABLE", 7u32), 7);
    }

    #[test]
    fn test_config_error_mentions_database_url() {
        let err = DbError::Config("DATABASE_URL not set".to_string());
        assert!(err.to_string().contains("DATABASE_URL"));
    }
}
