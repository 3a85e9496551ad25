//! CREATE TABLE and DROP TABLE.

use super::Builder;
use crate::error::{BuildError, Result};
use crate::schema::{validate_column_name, validate_table_name, ColumnInput};

impl Builder {
    /// Renders a `CREATE TABLE` statement.
    ///
    /// Entries with an empty name are skipped. Each column renders as
    /// `name type(size) UNIQUE NOT NULL PRIMARY KEY <auto-increment>`, with
    /// unused parts left out.
    pub fn create_table(&self, table: &str, columns: &[ColumnInput]) -> Result<String> {
        validate_table_name(table)?;

        let mut defs = Vec::with_capacity(columns.len());
        for column in columns.iter().filter(|c| !c.name.is_empty()) {
            defs.push(self.column_definition(column)?);
        }
        if defs.is_empty() {
            return Err(BuildError::NoColumns);
        }

        Ok(format!("CREATE TABLE {table} ({})", defs.join(", ")))
    }

    fn column_definition(&self, column: &ColumnInput) -> Result<String> {
        validate_column_name(&column.name)?;
        column.validate_type()?;
        if column.auto_increment && !column.primary_key {
            return Err(BuildError::AutoIncrementWithoutPrimaryKey(
                column.name.clone(),
            ));
        }

        let mut def = format!("{} {}", column.name, column.data_type);
        if let Some(size) = column.size {
            def.push_str(&format!("({size})"));
        }
        if column.unique {
            def.push_str(" UNIQUE");
        }
        if !column.nullable {
            def.push_str(" NOT NULL");
        }
        if column.primary_key {
            def.push_str(" PRIMARY KEY");
        }
        if column.auto_increment {
            def.push(' ');
            def.push_str(self.dialect.auto_increment_keyword());
        }
        Ok(def)
    }

    /// Renders `DROP TABLE IF EXISTS`.
    ///
    /// The same text is what an operator must echo back to confirm the drop.
    pub fn drop_table(&self, table: &str) -> Result<String> {
        let table = self.table(table)?;
        Ok(format!("DROP TABLE IF EXISTS {table}"))
    }
}

#[cfg(test)]
mod tests {
    use crate::builder::Builder;
    use crate::dialect::DialectKind;
    use crate::error::BuildError;
    use crate::schema::ColumnInput;

    #[test]
    fn test_create_table_per_dialect() {
        let columns = [
            ColumnInput::new("id", "INTEGER").primary_key().auto_increment(),
            ColumnInput::new("email", "VARCHAR").size(255).unique(),
            ColumnInput::new("bio", "TEXT").nullable(),
        ];

        let sql = Builder::new(DialectKind::Sqlite, 10)
            .create_table("people", &columns)
            .unwrap();
        assert_eq!(
            sql,
            "CREATE TABLE people (id INTEGER NOT NULL PRIMARY KEY AUTOINCREMENT, \
             email VARCHAR(255) UNIQUE NOT NULL, bio TEXT)"
        );

        let sql = Builder::new(DialectKind::Mysql, 10)
            .create_table("people", &columns)
            .unwrap();
        assert!(sql.starts_with("CREATE TABLE people (id INTEGER NOT NULL PRIMARY KEY AUTO_INCREMENT,"));

        let sql = Builder::new(DialectKind::Postgres, 10)
            .create_table("people", &columns)
            .unwrap();
        assert!(sql.contains("PRIMARY KEY GENERATED BY DEFAULT AS IDENTITY"));
    }

    #[test]
    fn test_auto_increment_requires_primary_key() {
        let columns = [ColumnInput::new("n", "INTEGER").auto_increment()];
        assert!(matches!(
            Builder::new(DialectKind::Postgres, 10).create_table("t", &columns),
            Err(BuildError::AutoIncrementWithoutPrimaryKey(name)) if name == "n"
        ));
    }

    #[test]
    fn test_create_table_rejects_bad_names() {
        let builder = Builder::new(DialectKind::Sqlite, 10);
        let columns = [ColumnInput::new("a", "TEXT")];
        for name in ["1abc", "a b", "a;DROP TABLE x"] {
            assert!(matches!(
                builder.create_table(name, &columns),
                Err(BuildError::InvalidTableName(_))
            ));
        }
        assert!(builder.create_table("valid_name1", &columns).is_ok());

        let bad_type = [ColumnInput::new("a", "TEXT); DROP TABLE x; --")];
        assert!(matches!(
            builder.create_table("t", &bad_type),
            Err(BuildError::InvalidDataType(_))
        ));
    }

    #[test]
    fn test_create_table_skips_unnamed_columns() {
        let builder = Builder::new(DialectKind::Sqlite, 10);
        let columns = [ColumnInput::new("", "TEXT"), ColumnInput::new("a", "TEXT")];
        assert_eq!(
            builder.create_table("t", &columns).unwrap(),
            "CREATE TABLE t (a TEXT NOT NULL)"
        );
        assert!(matches!(
            builder.create_table("t", &columns[..1]),
            Err(BuildError::NoColumns)
        ));
    }

    #[test]
    fn test_drop_table() {
        assert_eq!(
            Builder::new(DialectKind::Mysql, 10).drop_table("users").unwrap(),
            "DROP TABLE IF EXISTS users"
        );
    }
}
