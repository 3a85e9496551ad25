//! Read statements.

use super::{Builder, Statement};
use crate::error::{BuildError, Result};
use crate::schema::is_safe_identifier;
use crate::value::Value;

impl Builder {
    /// Lists user tables as `(schema, name)`.
    #[must_use]
    pub fn list_tables(&self) -> Statement {
        (String::from(self.dialect.list_tables_sql()), Vec::new())
    }

    /// Lists the columns of `table` in declaration order.
    pub fn list_columns(&self, table: &str) -> Result<Statement> {
        if table.is_empty() {
            return Err(BuildError::EmptyTableName);
        }
        let args = (0..self.dialect.list_columns_bind_count())
            .map(|_| Value::from(table))
            .collect();
        Ok((String::from(self.dialect.list_columns_sql()), args))
    }

    /// Checks whether `table` exists.
    pub fn table_exists(&self, table: &str) -> Result<Statement> {
        if table.is_empty() {
            return Err(BuildError::EmptyTableName);
        }
        Ok((
            String::from(self.dialect.table_exists_sql()),
            vec![Value::from(table)],
        ))
    }

    /// Selects a page of rows.
    ///
    /// A zero `limit` or `offset` omits the clause. `order_dir` is
    /// descending only when it equals `desc` ignoring case. An empty
    /// `order_by` omits the ordering.
    pub fn list_rows(
        &self,
        table: &str,
        limit: i64,
        offset: i64,
        order_by: &str,
        order_dir: &str,
    ) -> Result<Statement> {
        let table = self.table(table)?;
        let page = self.page_clause(limit, offset)?;

        let order = order_clause(order_by, order_dir)?;
        Ok((format!("SELECT * FROM {table}{order}{page}"), Vec::new()))
    }

    /// Selects the single row at `position`, used when re-scanning a page.
    ///
    /// Pass the ordering the page was listed with, or the scan walks a
    /// different window.
    pub fn row_at(
        &self,
        table: &str,
        position: i64,
        order_by: &str,
        order_dir: &str,
    ) -> Result<Statement> {
        let table = self.table(table)?;
        if position < 0 {
            return Err(BuildError::InvalidPagination);
        }
        let order = order_clause(order_by, order_dir)?;
        Ok((
            format!("SELECT * FROM {table}{order} LIMIT 1 OFFSET {position}"),
            Vec::new(),
        ))
    }

    /// Counts the rows of `table`.
    pub fn count_rows(&self, table: &str) -> Result<Statement> {
        let table = self.table(table)?;
        Ok((format!("SELECT COUNT(*) FROM {table}"), Vec::new()))
    }
}

fn order_clause(order_by: &str, order_dir: &str) -> Result<String> {
    if order_by.is_empty() {
        return Ok(String::new());
    }
    if !is_safe_identifier(order_by) {
        return Err(BuildError::InvalidColumnName(String::from(order_by)));
    }
    let dir = if order_dir.eq_ignore_ascii_case("desc") {
        "DESC"
    } else {
        "ASC"
    };
    Ok(format!(" ORDER BY {order_by} {dir}"))
}

#[cfg(test)]
mod tests {
    use crate::builder::Builder;
    use crate::dialect::DialectKind;
    use crate::error::BuildError;
    use crate::value::Value;

    fn builders() -> Vec<Builder> {
        [DialectKind::Postgres, DialectKind::Mysql, DialectKind::Sqlite]
            .into_iter()
            .map(|kind| Builder::new(kind, 100))
            .collect()
    }

    #[test]
    fn test_list_rows_pagination_clauses() {
        for builder in builders() {
            let (sql, _) = builder.list_rows("users", 0, 0, "", "").unwrap();
            assert_eq!(sql, "SELECT * FROM users");

            let (sql, _) = builder.list_rows("users", 0, 30, "", "").unwrap();
            assert_eq!(sql, "SELECT * FROM users OFFSET 30");

            let (sql, _) = builder.list_rows("users", 10, 0, "", "").unwrap();
            assert_eq!(sql, "SELECT * FROM users LIMIT 10");
        }
    }

    #[test]
    fn test_list_rows_order() {
        let builder = Builder::new(DialectKind::Sqlite, 100);
        let (sql, _) = builder.list_rows("users", 5, 0, "id", "DeSc").unwrap();
        assert_eq!(sql, "SELECT * FROM users ORDER BY id DESC LIMIT 5");

        let (sql, _) = builder.list_rows("users", 5, 0, "id", "sideways").unwrap();
        assert_eq!(sql, "SELECT * FROM users ORDER BY id ASC LIMIT 5");

        let (sql, _) = builder.list_rows("users", 5, 0, "", "desc").unwrap();
        assert_eq!(sql, "SELECT * FROM users LIMIT 5");
    }

    #[test]
    fn test_list_rows_rejects_bad_pagination() {
        let builder = Builder::new(DialectKind::Postgres, 50);
        assert!(matches!(
            builder.list_rows("users", 51, 0, "", ""),
            Err(BuildError::LimitTooLarge { max: 50 })
        ));
        assert!(matches!(
            builder.list_rows("users", 10, -1, "", ""),
            Err(BuildError::InvalidPagination)
        ));
        assert!(matches!(
            builder.list_rows("users", -1, 0, "", ""),
            Err(BuildError::InvalidPagination)
        ));
    }

    #[test]
    fn test_list_rows_rejects_unsafe_order_column() {
        let builder = Builder::new(DialectKind::Postgres, 50);
        assert!(matches!(
            builder.list_rows("users", 10, 0, "id; DROP TABLE users", "asc"),
            Err(BuildError::InvalidColumnName(_))
        ));
    }

    #[test]
    fn test_list_rows_quotes_table_with_space() {
        let builder = Builder::new(DialectKind::Mysql, 50);
        let (sql, _) = builder.list_rows("order items", 0, 0, "", "").unwrap();
        assert_eq!(sql, "SELECT * FROM `order items`");
    }

    #[test]
    fn test_list_columns_binds_table() {
        let (_, args) = Builder::new(DialectKind::Postgres, 10)
            .list_columns("users")
            .unwrap();
        assert_eq!(args, vec![Value::from("users")]);

        let (_, args) = Builder::new(DialectKind::Sqlite, 10)
            .list_columns("users")
            .unwrap();
        assert_eq!(args.len(), 2);
    }

    #[test]
    fn test_row_at() {
        let (sql, _) = Builder::new(DialectKind::Sqlite, 10)
            .row_at("users", 4, "", "")
            .unwrap();
        assert_eq!(sql, "SELECT * FROM users LIMIT 1 OFFSET 4");

        let (sql, _) = Builder::new(DialectKind::Mysql, 10)
            .row_at("users", 12, "created", "DESC")
            .unwrap();
        assert_eq!(
            sql,
            "SELECT * FROM users ORDER BY created DESC LIMIT 1 OFFSET 12"
        );

        assert!(matches!(
            Builder::new(DialectKind::Mysql, 10).row_at("users", 0, "a b", ""),
            Err(BuildError::InvalidColumnName(_))
        ));
    }
}
