//! SQL dialect support.
//!
//! PostgreSQL, MySQL and SQLite differ in placeholder syntax, identifier
//! quoting, auto-increment keywords and the catalog queries used for
//! introspection. Each engine gets one [`Dialect`] implementation, selected
//! once per [`Builder`](crate::Builder).

mod mysql;
mod postgres;
mod sqlite;

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

pub use mysql::MySqlDialect;
pub use postgres::PostgresDialect;
pub use sqlite::SqliteDialect;

use crate::catalog::TypeCatalog;
use crate::error::BuildError;

/// Name of the auxiliary table holding the mutation history.
pub const HISTORY_TABLE: &str = "rowsql_history";

/// The supported database engines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DialectKind {
    /// PostgreSQL.
    Postgres,
    /// MySQL / MariaDB.
    Mysql,
    /// SQLite.
    Sqlite,
}

impl DialectKind {
    /// Returns the canonical name of the engine.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Postgres => "postgres",
            Self::Mysql => "mysql",
            Self::Sqlite => "sqlite",
        }
    }

    /// Returns the dialect implementation for this engine.
    #[must_use]
    pub fn dialect(self) -> Box<dyn Dialect> {
        match self {
            Self::Postgres => Box::new(PostgresDialect::new()),
            Self::Mysql => Box::new(MySqlDialect::new()),
            Self::Sqlite => Box::new(SqliteDialect::new()),
        }
    }
}

impl fmt::Display for DialectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DialectKind {
    type Err = BuildError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" | "pgx" => Ok(Self::Postgres),
            "mysql" | "mariadb" => Ok(Self::Mysql),
            "sqlite" | "sqlite3" => Ok(Self::Sqlite),
            _ => Err(BuildError::UnsupportedDialect(String::from(s))),
        }
    }
}

/// Trait for dialect-specific SQL text.
pub trait Dialect: Send + Sync + fmt::Debug {
    /// Returns the engine this dialect targets.
    fn kind(&self) -> DialectKind;

    /// Returns the name of the dialect.
    fn name(&self) -> &'static str {
        self.kind().as_str()
    }

    /// Returns the identifier quote character.
    fn identifier_quote(&self) -> char {
        '"'
    }

    /// Returns the placeholder for the 1-based parameter `index`.
    fn placeholder(&self, index: usize) -> String {
        format!("${index}")
    }

    /// Quotes a table name if it contains a space.
    fn quote_table(&self, name: &str) -> String {
        if name.contains(' ') {
            let quote = self.identifier_quote();
            format!("{quote}{name}{quote}")
        } else {
            String::from(name)
        }
    }

    /// Returns the keyword appended to an auto-increment primary key.
    fn auto_increment_keyword(&self) -> &'static str;

    /// Query listing user tables as `(schema, name)` pairs.
    fn list_tables_sql(&self) -> &'static str;

    /// Query listing the columns of one table.
    ///
    /// Columns are `(name, type, has_default, is_unique, is_auto_increment)`
    /// in declaration order.
    fn list_columns_sql(&self) -> &'static str;

    /// How many times the table name is bound into [`Self::list_columns_sql`].
    fn list_columns_bind_count(&self) -> usize {
        1
    }

    /// Query returning a row if the table bound as the first argument exists.
    fn table_exists_sql(&self) -> &'static str;

    /// Predicate matching a JSON column against a JSON parameter.
    fn json_match(&self, column: &str, placeholder: &str) -> String;

    /// Converts a text-bound placeholder to a column's declared type.
    ///
    /// Timestamps, UUIDs and decimals are read back as text. Engines that
    /// do not convert text implicitly need the parameter cast before it is
    /// compared with or assigned to such a column.
    fn cast_text(&self, _declared_type: &str, placeholder: &str) -> String {
        String::from(placeholder)
    }

    /// Restricts a predicate to a single physical row.
    ///
    /// The returned text replaces the predicate after `WHERE` in a DELETE or
    /// UPDATE, so that rows duplicating each other's values are affected one
    /// at a time.
    fn limit_to_one_row(&self, table: &str, predicate: &str) -> String;

    /// INSERT statement that relies on column defaults only.
    fn insert_defaults(&self, table: &str) -> String {
        format!("INSERT INTO {table} DEFAULT VALUES")
    }

    /// DDL for the history table.
    fn create_history_table_sql(&self) -> String;

    /// Column types offered when creating a table.
    fn type_catalog(&self) -> TypeCatalog;
}
