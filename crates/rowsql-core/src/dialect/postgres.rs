//! PostgreSQL dialect.

use super::{Dialect, DialectKind, HISTORY_TABLE};
use crate::catalog::{NumericType, StringType, TypeCatalog};

const LIST_TABLES: &str = "
SELECT
  table_schema,
  table_name
FROM information_schema.tables
WHERE table_type = 'BASE TABLE'
  AND table_schema NOT IN ('pg_catalog', 'information_schema')
ORDER BY table_schema, table_name";

const LIST_COLUMNS: &str = "
SELECT
    c.column_name::text,
    CASE
        WHEN c.data_type IN ('USER-DEFINED', 'ARRAY') THEN c.udt_name::text
        ELSE c.data_type::text
    END AS data_type,
    (c.column_default IS NOT NULL) AS has_default,
    COALESCE(
        bool_or(tc.constraint_type IN ('UNIQUE', 'PRIMARY KEY')),
        false
    ) AS is_unique,
    (
        c.is_identity = 'YES'
        OR c.column_default LIKE 'nextval(%'
    ) AS is_auto_increment
FROM information_schema.columns c
LEFT JOIN information_schema.key_column_usage kcu
    ON c.table_name = kcu.table_name
    AND c.column_name = kcu.column_name
    AND c.table_schema = kcu.table_schema
LEFT JOIN information_schema.table_constraints tc
    ON kcu.constraint_name = tc.constraint_name
    AND kcu.table_schema = tc.table_schema
WHERE c.table_name = $1
  AND c.table_schema = current_schema()
GROUP BY
    c.column_name,
    c.data_type,
    c.udt_name,
    c.ordinal_position,
    c.is_identity,
    c.column_default
ORDER BY c.ordinal_position";

const TABLE_EXISTS: &str = "SELECT 1 FROM information_schema.tables \
     WHERE table_schema = current_schema() AND table_name = $1";

const NUMERIC_TYPES: &[NumericType] = &[
    NumericType::integer("SMALLINT"),
    NumericType::integer("INTEGER"),
    NumericType::integer("BIGINT"),
    NumericType::decimal("DECIMAL"),
    NumericType::decimal("NUMERIC"),
    NumericType::plain("REAL"),
    NumericType::plain("DOUBLE PRECISION"),
    NumericType::integer("SMALLSERIAL"),
    NumericType::integer("SERIAL"),
    NumericType::integer("BIGSERIAL"),
    NumericType::plain("MONEY"),
    NumericType::plain("BOOLEAN"),
];

const STRING_TYPES: &[StringType] = &[
    StringType::sized("CHAR"),
    StringType::sized("CHARACTER"),
    StringType::sized("VARCHAR"),
    StringType::sized("CHARACTER VARYING"),
    StringType::plain("TEXT"),
    StringType::plain("BYTEA"),
    StringType::plain("UUID"),
    StringType::plain("JSON"),
    StringType::plain("JSONB"),
    StringType::plain("XML"),
    StringType::plain("DATE"),
    StringType::plain("TIMESTAMP"),
    StringType::plain("TIMESTAMPTZ"),
];

/// Names from `information_schema.columns`, e.g. `timestamp with time zone`
/// or an enum's `udt_name`.
fn is_type_name(ty: &str) -> bool {
    ty.starts_with(|c: char| c.is_ascii_alphabetic() || c == '_')
        && ty.chars().all(|c| c == '_' || c == ' ' || c.is_ascii_alphanumeric())
}

/// PostgreSQL dialect.
#[derive(Debug, Default, Clone, Copy)]
pub struct PostgresDialect;

impl PostgresDialect {
    /// Creates a new PostgreSQL dialect.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Dialect for PostgresDialect {
    fn kind(&self) -> DialectKind {
        DialectKind::Postgres
    }

    fn auto_increment_keyword(&self) -> &'static str {
        // Valid after any integer type, unlike the SERIAL pseudo-types.
        "GENERATED BY DEFAULT AS IDENTITY"
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
        format!("{column}::jsonb @> {placeholder}::jsonb")
    }

    fn cast_text(&self, declared_type: &str, placeholder: &str) -> String {
        let ty = declared_type.trim();
        match ty.to_ascii_lowercase().as_str() {
            "" | "text" | "character varying" | "varchar" | "name" | "citext" => {
                String::from(placeholder)
            }
            // Plain `character` and `bit` mean a length of one.
            "character" | "char" => format!("CAST({placeholder} AS bpchar)"),
            "bit" => format!("CAST({placeholder} AS varbit)"),
            _ if is_type_name(ty) => format!("CAST({placeholder} AS {ty})"),
            _ => String::from(placeholder),
        }
    }

    fn limit_to_one_row(&self, table: &str, predicate: &str) -> String {
        format!("ctid IN (SELECT ctid FROM {table} WHERE {predicate} LIMIT 1)")
    }

    fn create_history_table_sql(&self) -> String {
        format!(
            "CREATE TABLE IF NOT EXISTS {HISTORY_TABLE} (\
             id SERIAL PRIMARY KEY, \
             message TEXT NOT NULL, \
             time TIMESTAMPTZ NOT NULL DEFAULT NOW())"
        )
    }

    fn type_catalog(&self) -> TypeCatalog {
        TypeCatalog::new(NUMERIC_TYPES, STRING_TYPES)
    }
}
