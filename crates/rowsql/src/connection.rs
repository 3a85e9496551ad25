//! Dialect detection and the database handle.

use std::str::FromStr;

use rowsql_core::{DialectKind, Row, Value};
use sqlx::mysql::{MySqlConnectOptions, MySqlPool, MySqlPoolOptions};
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions, PgSslMode};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use tracing::{debug, info};

use crate::codec::{bind_args, decode_row, mysql_extra, no_extra, postgres_extra};
use crate::error::{RepoError, Result};

const MAX_CONNECTIONS: u32 = 5;

/// Classifies a connection string.
///
/// Returns the engine and the string to connect with, which differs from
/// the input only by `~` expansion of SQLite paths.
pub fn detect_dialect(raw: &str) -> Result<(DialectKind, String)> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(RepoError::DialectDetection(String::from(
            "connection string is empty",
        )));
    }
    let lower = raw.to_ascii_lowercase();

    if lower.starts_with("postgres://")
        || lower.starts_with("postgresql://")
        || (lower.contains("host=") && lower.contains("dbname="))
    {
        return Ok((DialectKind::Postgres, String::from(raw)));
    }

    if lower.starts_with("mysql://") || lower.contains("tcp(") || lower.contains("parsetime=") {
        return Ok((DialectKind::Mysql, String::from(raw)));
    }

    if lower.starts_with("sqlite:")
        || lower.starts_with("file:")
        || lower.ends_with(".db")
        || lower.ends_with(".sqlite")
        || lower.ends_with(".sqlite3")
        || lower == ":memory:"
    {
        let expanded = shellexpand::tilde(raw).into_owned();
        return Ok((DialectKind::Sqlite, expanded));
    }

    Err(RepoError::DialectDetection(String::from(
        "unable to detect driver from connection string",
    )))
}

/// Parses a libpq `key=value` string.
fn postgres_key_values(raw: &str) -> PgConnectOptions {
    let mut options = PgConnectOptions::new();
    for (key, value) in raw.split_whitespace().filter_map(|kv| kv.split_once('=')) {
        let value = value.trim_matches('\'');
        options = match key {
            "host" => options.host(value),
            "port" => match value.parse() {
                Ok(port) => options.port(port),
                Err(_) => options,
            },
            "user" => options.username(value),
            "password" => options.password(value),
            "dbname" => options.database(value),
            "sslmode" => match PgSslMode::from_str(value) {
                Ok(mode) => options.ssl_mode(mode),
                Err(_) => options,
            },
            _ => options,
        };
    }
    options
}

/// Parses a `user:password@tcp(host:port)/dbname?params` DSN.
fn mysql_dsn(raw: &str) -> Result<MySqlConnectOptions> {
    let (credentials, rest) = raw.rsplit_once('@').unwrap_or(("", raw));

    let (address, path) = if let Some(inner) = rest.strip_prefix("tcp(") {
        let (address, path) = inner.split_once(')').ok_or_else(|| {
            RepoError::DialectDetection(String::from("unterminated tcp( address"))
        })?;
        (address, path)
    } else {
        rest.split_once('/').unwrap_or((rest, ""))
    };
    let path = path.trim_start_matches('/');
    let database = path.split('?').next().unwrap_or_default();

    let mut options = MySqlConnectOptions::new();
    match address.rsplit_once(':') {
        Some((host, port)) => {
            options = options.host(host);
            if let Ok(port) = port.parse() {
                options = options.port(port);
            }
        }
        None if !address.is_empty() => options = options.host(address),
        None => {}
    }
    if !credentials.is_empty() {
        let (user, password) = credentials.split_once(':').unwrap_or((credentials, ""));
        options = options.username(user);
        if !password.is_empty() {
            options = options.password(password);
        }
    }
    if !database.is_empty() {
        options = options.database(database);
    }
    Ok(options)
}

fn sqlite_options(target: &str) -> Result<SqliteConnectOptions> {
    if target == ":memory:" {
        return SqliteConnectOptions::from_str("sqlite::memory:").map_err(RepoError::Connect);
    }
    if target.to_ascii_lowercase().starts_with("sqlite:") {
        return SqliteConnectOptions::from_str(target)
            .map(|options| options.create_if_missing(true))
            .map_err(RepoError::Connect);
    }
    let path = target.strip_prefix("file:").unwrap_or(target);
    let path = path.split('?').next().unwrap_or(path);
    Ok(SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true))
}

/// A pooled connection to one of the supported engines.
#[derive(Debug, Clone)]
pub enum Database {
    /// PostgreSQL pool.
    Postgres(PgPool),
    /// MySQL pool.
    MySql(MySqlPool),
    /// SQLite pool.
    Sqlite(SqlitePool),
}

impl Database {
    /// Detects the engine from `raw` and opens a pool.
    pub async fn connect(raw: &str) -> Result<Self> {
        let (kind, target) = detect_dialect(raw)?;
        info!(dialect = %kind, "Connecting to database");

        let db = match kind {
            DialectKind::Postgres => {
                let options = if target.contains("://") {
                    PgConnectOptions::from_str(&target).map_err(RepoError::Connect)?
                } else {
                    postgres_key_values(&target)
                };
                let pool = PgPoolOptions::new()
                    .max_connections(MAX_CONNECTIONS)
                    .connect_with(options)
                    .await
                    .map_err(RepoError::Connect)?;
                Self::Postgres(pool)
            }
            DialectKind::Mysql => {
                let options = if target.contains("://") {
                    MySqlConnectOptions::from_str(&target).map_err(RepoError::Connect)?
                } else {
                    mysql_dsn(&target)?
                };
                let pool = MySqlPoolOptions::new()
                    .max_connections(MAX_CONNECTIONS)
                    .connect_with(options)
                    .await
                    .map_err(RepoError::Connect)?;
                Self::MySql(pool)
            }
            DialectKind::Sqlite => {
                let mut pool_options = SqlitePoolOptions::new().max_connections(MAX_CONNECTIONS);
                if target.contains(":memory:") {
                    // The database lives as long as its single connection.
                    pool_options = pool_options
                        .max_connections(1)
                        .idle_timeout(None)
                        .max_lifetime(None);
                }
                let pool = pool_options
                    .connect_with(sqlite_options(&target)?)
                    .await
                    .map_err(RepoError::Connect)?;
                Self::Sqlite(pool)
            }
        };
        Ok(db)
    }

    /// Returns the engine behind this handle.
    #[must_use]
    pub const fn kind(&self) -> DialectKind {
        match self {
            Self::Postgres(_) => DialectKind::Postgres,
            Self::MySql(_) => DialectKind::Mysql,
            Self::Sqlite(_) => DialectKind::Sqlite,
        }
    }

    /// Runs a query and decodes every returned row.
    pub async fn fetch_all(&self, sql: &str, args: Vec<Value>) -> sqlx::Result<Vec<Row>> {
        debug!(sql = %sql, args = args.len(), "Fetching rows");
        match self {
            Self::Postgres(pool) => bind_args(sqlx::query(sql), args)
                .fetch_all(pool)
                .await?
                .iter()
                .map(|row| decode_row(row, postgres_extra))
                .collect(),
            Self::MySql(pool) => bind_args(sqlx::query(sql), args)
                .fetch_all(pool)
                .await?
                .iter()
                .map(|row| decode_row(row, mysql_extra))
                .collect(),
            Self::Sqlite(pool) => bind_args(sqlx::query(sql), args)
                .fetch_all(pool)
                .await?
                .iter()
                .map(|row| decode_row(row, no_extra))
                .collect(),
        }
    }

    /// Runs a query and decodes the first row, if any.
    pub async fn fetch_optional(&self, sql: &str, args: Vec<Value>) -> sqlx::Result<Option<Row>> {
        debug!(sql = %sql, args = args.len(), "Fetching one row");
        match self {
            Self::Postgres(pool) => bind_args(sqlx::query(sql), args)
                .fetch_optional(pool)
                .await?
                .map(|row| decode_row(&row, postgres_extra))
                .transpose(),
            Self::MySql(pool) => bind_args(sqlx::query(sql), args)
                .fetch_optional(pool)
                .await?
                .map(|row| decode_row(&row, mysql_extra))
                .transpose(),
            Self::Sqlite(pool) => bind_args(sqlx::query(sql), args)
                .fetch_optional(pool)
                .await?
                .map(|row| decode_row(&row, no_extra))
                .transpose(),
        }
    }

    /// Executes a statement and returns the number of affected rows.
    pub async fn execute(&self, sql: &str, args: Vec<Value>) -> sqlx::Result<u64> {
        debug!(sql = %sql, args = args.len(), "Executing SQL");
        let affected = match self {
            Self::Postgres(pool) => bind_args(sqlx::query(sql), args)
                .execute(pool)
                .await?
                .rows_affected(),
            Self::MySql(pool) => bind_args(sqlx::query(sql), args)
                .execute(pool)
                .await?
                .rows_affected(),
            Self::Sqlite(pool) => bind_args(sqlx::query(sql), args)
                .execute(pool)
                .await?
                .rows_affected(),
        };
        Ok(affected)
    }

    /// Closes every pooled connection.
    pub async fn close(&self) {
        match self {
            Self::Postgres(pool) => pool.close().await,
            Self::MySql(pool) => pool.close().await,
            Self::Sqlite(pool) => pool.close().await,
        }
    }
}

impl From<SqlitePool> for Database {
    fn from(pool: SqlitePool) -> Self {
        Self::Sqlite(pool)
    }
}

impl From<PgPool> for Database {
    fn from(pool: PgPool) -> Self {
        Self::Postgres(pool)
    }
}

impl From<MySqlPool> for Database {
    fn from(pool: MySqlPool) -> Self {
        Self::MySql(pool)
    }
}
