//! Logging context.
//!
//! The level and destination are held in a value built from [`Config`] and
//! turned into a [`Dispatch`] that callers attach to the work they run,
//! rather than being installed process-wide.

use std::fs::OpenOptions;
use std::io;
use std::path::PathBuf;
use std::sync::Mutex;

use tracing::level_filters::LevelFilter;
use tracing::{Dispatch, Level};
use tracing_subscriber::EnvFilter;

use crate::config::{Config, Environment};

/// Where and how much to log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogContext {
    level: Level,
    file: Option<PathBuf>,
}

impl LogContext {
    /// Creates a context logging at `level` to stderr.
    #[must_use]
    pub const fn new(level: Level) -> Self {
        Self { level, file: None }
    }

    /// Derives the context from configuration.
    ///
    /// Development or `verbose` lowers the level to DEBUG.
    #[must_use]
    pub fn from_config(config: &Config, verbose: bool) -> Self {
        let level = if verbose || config.environment == Environment::Development {
            Level::DEBUG
        } else {
            Level::INFO
        };
        Self {
            level,
            file: config.log_path(),
        }
    }

    /// Sends output to `path`, appending.
    #[must_use]
    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.file = Some(path.into());
        self
    }

    /// Returns the most verbose level enabled.
    #[must_use]
    pub const fn level(&self) -> Level {
        self.level
    }

    /// Builds the subscriber. `RUST_LOG` directives refine the level.
    pub fn dispatch(&self) -> io::Result<Dispatch> {
        let filter = EnvFilter::builder()
            .with_default_directive(LevelFilter::from_level(self.level).into())
            .from_env_lossy();

        let dispatch = match &self.file {
            Some(path) => {
                let file = OpenOptions::new().create(true).append(true).open(path)?;
                Dispatch::new(
                    tracing_subscriber::fmt()
                        .with_env_filter(filter)
                        .with_target(false)
                        .with_ansi(false)
                        .with_writer(Mutex::new(file))
                        .finish(),
                )
            }
            None => Dispatch::new(
                tracing_subscriber::fmt()
                    .with_env_filter(filter)
                    .with_target(false)
                    .with_writer(io::stderr)
                    .finish(),
            ),
        };
        Ok(dispatch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_from_config() {
        let mut config = Config::new("app.db");
        assert_eq!(LogContext::from_config(&config, false).level(), Level::INFO);
        assert_eq!(LogContext::from_config(&config, true).level(), Level::DEBUG);

        config.environment = Environment::Development;
        assert_eq!(LogContext::from_config(&config, false).level(), Level::DEBUG);
    }

    #[test]
    fn test_file_output() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rowsql.log");
        let dispatch = LogContext::new(Level::INFO)
            .with_file(&path)
            .dispatch()
            .unwrap();

        tracing::dispatcher::with_default(&dispatch, || {
            tracing::info!(table = "people", "Inserted row");
            tracing::debug!("hidden");
        });

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("Inserted row"));
        assert!(written.contains("table=\"people\""));
        assert!(!written.contains("hidden"));
    }
}
