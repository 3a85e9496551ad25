//! MySQL dialect.

use super::{Dialect, DialectKind, HISTORY_TABLE};
use crate::catalog::{NumericType, StringType, TypeCatalog};

const LIST_TABLES: &str = "
SELECT
  table_schema,
  table_name
FROM information_schema.tables
WHERE table_type = 'BASE TABLE'
  AND table_schema = DATABASE()
ORDER BY table_schema, table_name";

const LIST_COLUMNS: &str = "
SELECT
    c.column_name,
    c.data_type,
    (c.column_default IS NOT NULL) AS has_default,
    COALESCE(
        MAX(CASE
            WHEN tc.constraint_type IN ('UNIQUE', 'PRIMARY KEY') THEN 1
            ELSE 0
        END) = 1,
        false
    ) AS is_unique,
    (c.extra LIKE '%auto_increment%') AS is_auto_increment
FROM information_schema.columns c
LEFT JOIN information_schema.key_column_usage kcu
    ON c.table_name = kcu.table_name
    AND c.column_name = kcu.column_name
    AND c.table_schema = kcu.table_schema
LEFT JOIN information_schema.table_constraints tc
    ON kcu.constraint_name = tc.constraint_name
    AND kcu.table_schema = tc.table_schema
WHERE c.table_name = ?
  AND c.table_schema = DATABASE()
GROUP BY
    c.column_name,
    c.data_type,
    c.ordinal_position,
    c.extra,
    c.column_default
ORDER BY c.ordinal_position";

const TABLE_EXISTS: &str = "SELECT 1 FROM information_schema.tables \
     WHERE table_schema = DATABASE() AND table_name = ?";

const NUMERIC_TYPES: &[NumericType] = &[
    NumericType::plain("BIT").with_size(),
    NumericType::integer("TINYINT").with_size(),
    NumericType::plain("BOOL"),
    NumericType::plain("BOOLEAN"),
    NumericType::integer("SMALLINT").with_size(),
    NumericType::integer("MEDIUMINT").with_size(),
    NumericType::integer("INT").with_size(),
    NumericType::integer("INTEGER").with_size(),
    NumericType::integer("BIGINT").with_size(),
    NumericType::decimal("FLOAT").with_size(),
    NumericType::decimal("DOUBLE").with_size(),
    NumericType::decimal("DOUBLE PRECISION").with_size(),
    NumericType::decimal("DECIMAL").with_size(),
    NumericType::decimal("DEC").with_size(),
];

const STRING_TYPES: &[StringType] = &[
    StringType::sized("CHAR"),
    StringType::sized("VARCHAR"),
    StringType::sized("BINARY"),
    StringType::sized("VARBINARY"),
    StringType::plain("TINYBLOB"),
    StringType::plain("TINYTEXT"),
    StringType::sized("TEXT"),
    StringType::sized("BLOB"),
    StringType::plain("MEDIUMTEXT"),
    StringType::plain("MEDIUMBLOB"),
    StringType::plain("LONGTEXT"),
    StringType::plain("LONGBLOB"),
    StringType::plain("JSON"),
    StringType::plain("DATE"),
    StringType::plain("DATETIME"),
    StringType::plain("TIMESTAMP"),
    StringType::enumerated("ENUM"),
    StringType::enumerated("SET"),
];

/// MySQL dialect.
#[derive(Debug, Default, Clone, Copy)]
pub struct MySqlDialect;

impl MySqlDialect {
    /// Creates a new MySQL dialect.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Dialect for MySqlDialect {
    fn kind(&self) -> DialectKind {
        DialectKind::Mysql
    }

    fn identifier_quote(&self) -> char {
        '`'
    }

    fn placeholder(&self, _index: usize) -> String {
        String::from("?")
    }

    fn auto_increment_keyword(&self) -> &'static str {
        "AUTO_INCREMENT"
    }

    fn list_tables_sql(&self) -> &'static str {
        LIST_TABLES
    }

    fn list_columns_sql(&self) -> &'static str {
        LIST_COLUMNS
    }

    fn table_exists_sql(&self) -> &'static str {
        TABLE_EXISTS
    }

    fn json_match(&self, column: &str, placeholder: &str) -> String {
        format!("JSON_CONTAINS({column}, {placeholder})")
    }

    fn limit_to_one_row(&self, _table: &str, predicate: &str) -> String {
        format!("{predicate} LIMIT 1")
    }

    fn insert_defaults(&self, table: &str) -> String {
        format!("INSERT INTO {table} () VALUES ()")
    }

    fn create_history_table_sql(&self) -> String {
        format!(
            "CREATE TABLE IF NOT EXISTS {HISTORY_TABLE} (\
             id INT AUTO_INCREMENT PRIMARY KEY, \
             message TEXT NOT NULL, \
             time TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP)"
        )
    }

    fn type_catalog(&self) -> TypeCatalog {
        TypeCatalog::new(NUMERIC_TYPES, STRING_TYPES)
    }
}
