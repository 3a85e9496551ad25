//! SQLite dialect.

use super::{Dialect, DialectKind, HISTORY_TABLE};
use crate::catalog::{NumericType, StringType, TypeCatalog};

const LIST_TABLES: &str = "
SELECT
  '' AS table_schema,
  name AS table_name
FROM sqlite_master
WHERE type = 'table'
  AND name NOT LIKE 'sqlite_%'
ORDER BY name";

const LIST_COLUMNS: &str = r#"
SELECT
    p.name AS column_name,
    p.type AS data_type,
    (p.dflt_value IS NOT NULL) AS has_default,
    CASE
        WHEN p.pk = 1 THEN 1
        WHEN EXISTS (
            SELECT 1
            FROM pragma_index_list($1) il
            JOIN pragma_index_info(il.name) ii
                ON ii.name = p.name
            WHERE il."unique" = 1
        ) THEN 1
        ELSE 0
    END AS is_unique,
    CASE
        WHEN p.pk = 1
             AND lower(p.type) = 'integer'
        THEN 1
        ELSE 0
    END AS is_auto_increment
FROM pragma_table_info($2) AS p
ORDER BY p.cid"#;

const TABLE_EXISTS: &str = "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = $1";

const NUMERIC_TYPES: &[NumericType] = &[
    NumericType::plain("INT"),
    NumericType::integer("INTEGER"),
    NumericType::plain("TINYINT"),
    NumericType::plain("SMALLINT"),
    NumericType::plain("MEDIUMINT"),
    NumericType::plain("BIGINT"),
    NumericType::plain("UNSIGNED BIG INT"),
    NumericType::plain("INT2"),
    NumericType::plain("INT8"),
    NumericType::plain("REAL"),
    NumericType::plain("DOUBLE"),
    NumericType::plain("DOUBLE PRECISION"),
    NumericType::plain("FLOAT"),
    NumericType::decimal("NUMERIC").with_size(),
    NumericType::decimal("DECIMAL").with_size(),
    NumericType::plain("BOOLEAN"),
    NumericType::plain("DATE"),
    NumericType::plain("DATETIME"),
];

const STRING_TYPES: &[StringType] = &[
    StringType::plain("TEXT"),
    StringType::sized("CHARACTER"),
    StringType::sized("VARCHAR"),
    StringType::sized("VARYING CHARACTER"),
    StringType::sized("NCHAR"),
    StringType::sized("NATIVE CHARACTER"),
    StringType::plain("CLOB"),
    StringType::plain("BLOB"),
    StringType::plain("JSON"),
];

/// SQLite dialect.
#[derive(Debug, Default, Clone, Copy)]
pub struct SqliteDialect;

impl SqliteDialect {
    /// Creates a new SQLite dialect.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Dialect for SqliteDialect {
    fn kind(&self) -> DialectKind {
        DialectKind::Sqlite
    }

    fn auto_increment_keyword(&self) -> &'static str {
        // Only valid on an INTEGER PRIMARY KEY.
        "AUTOINCREMENT"
    }

    fn list_tables_sql(&self) -> &'static str {
        LIST_TABLES
    }

    fn list_columns_sql(&self) -> &'static str {
        LIST_COLUMNS
    }

    fn list_columns_bind_count(&self) -> usize {
        2
    }

    fn table_exists_sql(&self) -> &'static str {
        TABLE_EXISTS
    }

    fn json_match(&self, column: &str, placeholder: &str) -> String {
        format!("json({column}) = json({placeholder})")
    }

    fn limit_to_one_row(&self, table: &str, predicate: &str) -> String {
        format!("rowid IN (SELECT rowid FROM {table} WHERE {predicate} LIMIT 1)")
    }

    fn create_history_table_sql(&self) -> String {
        format!(
            "CREATE TABLE IF NOT EXISTS {HISTORY_TABLE} (\
             id INTEGER PRIMARY KEY AUTOINCREMENT, \
             message TEXT NOT NULL, \
             time DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP)"
        )
    }

    fn type_catalog(&self) -> TypeCatalog {
        TypeCatalog::new(NUMERIC_TYPES, STRING_TYPES)
    }
}
