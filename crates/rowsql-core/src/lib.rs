//! # rowsql-core
//!
//! The I/O-free half of `rowsql`: it turns browse and edit intents into
//! dialect-correct SQL and keeps track of rows that have no primary key.
//!
//! - [`Builder`] renders statements for PostgreSQL, MySQL or SQLite.
//! - [`row_token`] derives a short identity token from a row's values.
//! - [`RowCache`] remembers recently read rows by token.
//!
//! ```rust
//! use rowsql_core::{row_token, Builder, ColumnDescriptor, DialectKind, RowCache, Value};
//!
//! let row = vec![Value::from("ann"), Value::Int(30)];
//! let cache = RowCache::new(10);
//! let token = row_token(&row);
//! cache.set(token.clone(), row.clone());
//!
//! let columns = [
//!     ColumnDescriptor::new("name", "text"),
//!     ColumnDescriptor::new("age", "integer"),
//! ];
//! let builder = Builder::new(DialectKind::Mysql, 50);
//! let cached = cache.get(&token).unwrap();
//! let (sql, args) = builder.delete_row("people", &columns, &cached).unwrap();
//!
//! assert_eq!(sql, "DELETE FROM people WHERE name = ? AND age = ? LIMIT 1");
//! assert_eq!(args, row);
//! ```

pub mod builder;
pub mod cache;
pub mod catalog;
pub mod dialect;
pub mod error;
pub mod hash;
pub mod pagination;
pub mod schema;
pub mod value;

pub use builder::{Builder, Statement};
pub use cache::RowCache;
pub use catalog::{NumericType, StringType, TypeCatalog};
pub use dialect::{Dialect, DialectKind, HISTORY_TABLE};
pub use error::{BuildError, Result};
pub use hash::{row_token, TOKEN_LEN};
pub use pagination::Page;
pub use schema::{
    is_safe_identifier, validate_table_name, ColumnDescriptor, ColumnInput, InputKind, RowItem,
    TableDescriptor,
};
pub use value::{Row, Value};
