//! Dialect-aware statement builder.
//!
//! Every method produces SQL text plus the ordered arguments to bind. Nothing
//! here performs I/O.
//!
//! # Example
//!
//! ```rust
//! use rowsql_core::{Builder, DialectKind};
//!
//! let builder = Builder::new(DialectKind::Postgres, 50);
//! let (sql, args) = builder.list_rows("users", 10, 20, "name", "desc").unwrap();
//!
//! assert_eq!(sql, "SELECT * FROM users ORDER BY name DESC LIMIT 10 OFFSET 20");
//! assert!(args.is_empty());
//! ```

mod ddl;
mod delete;
mod filter;
mod history;
mod insert;
mod select;
mod update;

use std::collections::HashSet;

use crate::dialect::{Dialect, DialectKind};
use crate::error::{BuildError, Result};
use crate::schema::{validate_column_name, ColumnDescriptor, RowItem};
use crate::value::Value;

/// A SQL statement and the arguments bound to its placeholders, in order.
pub type Statement = (String, Vec<Value>);

/// Builds SQL for one dialect.
///
/// The dialect is chosen once, at construction.
#[derive(Debug)]
pub struct Builder {
    dialect: Box<dyn Dialect>,
    max_limit: i64,
}

impl Builder {
    /// Creates a builder for `kind`, capping page sizes at `max_limit`.
    #[must_use]
    pub fn new(kind: DialectKind, max_limit: i64) -> Self {
        Self {
            dialect: kind.dialect(),
            max_limit,
        }
    }

    /// Creates a builder from a dialect name such as `"postgres"`.
    pub fn from_name(name: &str, max_limit: i64) -> Result<Self> {
        Ok(Self::new(name.parse()?, max_limit))
    }

    /// Returns the dialect in use.
    #[must_use]
    pub fn dialect(&self) -> &dyn Dialect {
        self.dialect.as_ref()
    }

    /// Returns the engine in use.
    #[must_use]
    pub fn kind(&self) -> DialectKind {
        self.dialect.kind()
    }

    /// Returns the page size ceiling.
    #[must_use]
    pub const fn max_limit(&self) -> i64 {
        self.max_limit
    }

    /// Checks submitted fields without building a statement.
    ///
    /// Rejects unsafe or repeated column names and malformed JSON, the same
    /// way [`Self::insert_row`] and [`Self::update_row`] would.
    pub fn validate_items(&self, items: &[RowItem]) -> Result<()> {
        assignments(items).map(|_| ())
    }

    fn table(&self, name: &str) -> Result<String> {
        if name.is_empty() {
            return Err(BuildError::EmptyTableName);
        }
        Ok(self.dialect.quote_table(name))
    }

    /// Renders ` LIMIT n OFFSET m`, leaving out zero parts.
    fn page_clause(&self, limit: i64, offset: i64) -> Result<String> {
        if limit < 0 || offset < 0 {
            return Err(BuildError::InvalidPagination);
        }
        if limit > self.max_limit {
            return Err(BuildError::LimitTooLarge {
                max: self.max_limit,
            });
        }
        let mut clause = String::new();
        if limit > 0 {
            clause.push_str(&format!(" LIMIT {limit}"));
        }
        if offset > 0 {
            clause.push_str(&format!(" OFFSET {offset}"));
        }
        Ok(clause)
    }

    fn params(&self, start: usize) -> Params<'_> {
        Params {
            dialect: self.dialect.as_ref(),
            next: start,
            args: Vec::new(),
        }
    }
}

/// Running placeholder state for one statement.
struct Params<'a> {
    dialect: &'a dyn Dialect,
    next: usize,
    args: Vec<Value>,
}

impl Params<'_> {
    /// Records an argument and returns its placeholder.
    fn bind(&mut self, value: Value) -> String {
        let placeholder = self.dialect.placeholder(self.next);
        self.next += 1;
        self.args.push(value);
        placeholder
    }

    /// Placeholder for a value compared with or assigned to `column`, cast
    /// to the column's type when the value is carried as text.
    fn bind_typed(&mut self, column: Option<&ColumnDescriptor>, value: Value) -> String {
        let is_text = matches!(value, Value::Text(_));
        let placeholder = self.bind(value);
        match column {
            Some(column) if is_text => self
                .dialect
                .cast_text(&column.declared_type, &placeholder),
            _ => placeholder,
        }
    }

    /// Like [`Self::bind_typed`], but NULL becomes a literal that consumes
    /// no index.
    fn assign(&mut self, column: Option<&ColumnDescriptor>, value: Value) -> String {
        if value.is_null() {
            String::from("NULL")
        } else {
            self.bind_typed(column, value)
        }
    }

    fn into_args(self) -> Vec<Value> {
        self.args
    }
}

/// Validates and coerces submitted fields, in order.
fn assignments(items: &[RowItem]) -> Result<Vec<(&str, Value)>> {
    let mut seen = HashSet::with_capacity(items.len());
    items
        .iter()
        .map(|item| {
            validate_column_name(&item.column)?;
            if !seen.insert(item.column.as_str()) {
                return Err(BuildError::DuplicateColumn(item.column.clone()));
            }
            Ok((item.column.as_str(), item.kind.coerce(&item.value)?))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::InputKind;

    #[test]
    fn test_from_name() {
        assert_eq!(
            Builder::from_name("sqlite", 10).unwrap().kind(),
            DialectKind::Sqlite
        );
        assert!(matches!(
            Builder::from_name("mssql", 10),
            Err(BuildError::UnsupportedDialect(_))
        ));
    }

    #[test]
    fn test_assignments_rejects_duplicates() {
        let items = [RowItem::new("a", "1"), RowItem::new("a", "2")];
        assert!(matches!(
            assignments(&items),
            Err(BuildError::DuplicateColumn(name)) if name == "a"
        ));
    }

    #[test]
    fn test_assignments_coerces_in_order() {
        let items = [
            RowItem::new("n", "7").kind(InputKind::Numeric),
            RowItem::new("doc", r#"{"a":1}"#).kind(InputKind::Json),
        ];
        let out = assignments(&items).unwrap();
        assert_eq!(out[0], ("n", Value::Int(7)));
        assert_eq!(out[1], ("doc", Value::Json(serde_json::json!({"a": 1}))));
    }

    #[test]
    fn test_assignments_rejects_unsafe_column() {
        let items = [RowItem::new("a; --", "1")];
        assert!(matches!(
            assignments(&items),
            Err(BuildError::InvalidColumnName(_))
        ));
    }

    #[test]
    fn test_validate_items() {
        let builder = Builder::new(DialectKind::Postgres, 10);
        assert!(builder
            .validate_items(&[RowItem::new("doc", "[1]").kind(InputKind::Json)])
            .is_ok());
        assert!(matches!(
            builder.validate_items(&[RowItem::new("doc", "{bad").kind(InputKind::Json)]),
            Err(BuildError::InvalidJson(_))
        ));
    }

    #[test]
    fn test_empty_table_name() {
        let builder = Builder::new(DialectKind::Mysql, 10);
        assert!(matches!(
            builder.count_rows(""),
            Err(BuildError::EmptyTableName)
        ));
    }
}
