//! Process configuration.
//!
//! Values come from command-line flags with environment fallbacks.

use std::path::PathBuf;

use clap::{Args, ValueEnum};
use serde::Serialize;

/// Default page size ceiling.
pub const DEFAULT_MAX_ITEMS_PER_PAGE: i64 = 10;

/// Deployment environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Verbose logging.
    #[value(alias = "dev")]
    Development,
    /// Default logging.
    #[default]
    #[value(alias = "prod")]
    Production,
}

/// Errors in the configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The page size ceiling must be positive.
    #[error("max items per page must be greater than 0, got {0}")]
    InvalidPageSize(i64),

    /// The row cache must hold at least one row.
    #[error("cache capacity must be greater than 0")]
    InvalidCacheCapacity,

    /// No connection string was given.
    #[error("no connection string, set DBSTRING or pass --database")]
    MissingDatabase,
}

/// Settings shared by every command.
#[derive(Debug, Clone, Args)]
pub struct Config {
    /// Connection string (postgres://, mysql DSN, or SQLite path).
    #[arg(short, long = "database", env = "DBSTRING")]
    pub database_url: String,

    /// Largest page of rows returned at once.
    #[arg(long, env = "MAX_ITEMS_PER_PAGE", default_value_t = DEFAULT_MAX_ITEMS_PER_PAGE)]
    pub max_items_per_page: i64,

    /// Number of listed rows remembered by token.
    #[arg(long, env = "ROWSQL_CACHE_CAPACITY", default_value_t = rowsql_core::cache::DEFAULT_CAPACITY)]
    pub cache_capacity: usize,

    /// Deployment environment.
    #[arg(long = "env", env = "ENV", value_enum, default_value_t = Environment::Production)]
    pub environment: Environment,

    /// Append logs to this file instead of stderr.
    #[arg(long, env = "LOG_FILE_PATH")]
    pub log_file: Option<PathBuf>,
}

impl Config {
    /// Creates a configuration with defaults for everything but the
    /// connection string.
    #[must_use]
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            max_items_per_page: DEFAULT_MAX_ITEMS_PER_PAGE,
            cache_capacity: rowsql_core::cache::DEFAULT_CAPACITY,
            environment: Environment::default(),
            log_file: None,
        }
    }

    /// Checks value ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database_url.trim().is_empty() {
            return Err(ConfigError::MissingDatabase);
        }
        if self.max_items_per_page <= 0 {
            return Err(ConfigError::InvalidPageSize(self.max_items_per_page));
        }
        if self.cache_capacity == 0 {
            return Err(ConfigError::InvalidCacheCapacity);
        }
        Ok(())
    }

    /// The log file with `~` expanded.
    #[must_use]
    pub fn log_path(&self) -> Option<PathBuf> {
        self.log_file
            .as_ref()
            .map(|path| PathBuf::from(shellexpand::tilde(&path.to_string_lossy()).as_ref()))
    }
}
