//! # rowsql
//!
//! Browse and edit the tables of a PostgreSQL, MySQL or SQLite database
//! without writing SQL.
//!
//! Rows need no primary key. Each listed row carries a short token derived
//! from its values; later updates and deletes name the row by that token and
//! the [`Repository`] finds it again, from its cache or by re-reading the
//! page the row was listed on.
//!
//! # Architecture
//!
//! - **Connection** - detects the engine from a connection string and opens
//!   a pool
//! - **Repository** - allow-list, row listing, row resolution, mutations
//! - **History** - an audit table of mutations inside the browsed database
//! - **Config** / **Logging** - explicit settings and a logging context
//!
//! SQL is produced by [`rowsql_core`], which performs no I/O.
//!
//! # Example
//!
//! ```rust,no_run
//! use rowsql::{Database, Repository};
//!
//! # async fn example() -> rowsql::Result<()> {
//! let db = Database::connect("app.db").await?;
//! let repo = Repository::new(db, 10, 100);
//! repo.init().await?;
//!
//! for table in repo.list_tables().await? {
//!     println!("{}", table.name);
//! }
//! # Ok(())
//! # }
//! ```

mod codec;
pub mod config;
pub mod connection;
pub mod error;
pub mod history;
pub mod logging;
pub mod repository;

pub use config::{Config, ConfigError, Environment};
pub use connection::{detect_dialect, Database};
pub use error::{RepoError, Result};
pub use history::{HistoryEntry, HistoryLog};
pub use logging::LogContext;
pub use repository::{Repository, TokenRow};
