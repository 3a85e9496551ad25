//! Table and column descriptors.
//!
//! Descriptors are read from the database's information views and drive both
//! the allow-list of addressable tables and the row identity predicate.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{BuildError, Result};
use crate::value::Value;

static TABLE_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("valid table name pattern"));

static DATA_TYPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9_ ]*$").expect("valid data type pattern"));

/// Checks that a name for a new table can be used unquoted.
///
/// Identifiers cannot be parameterized, so this check is the only guard
/// against injection through the table position of a `CREATE TABLE`.
pub fn validate_table_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(BuildError::EmptyTableName);
    }
    if !TABLE_NAME.is_match(name) {
        return Err(BuildError::InvalidTableName(String::from(name)));
    }
    Ok(())
}

/// Returns true if `name` only contains ASCII letters, digits and underscores.
#[must_use]
pub fn is_safe_identifier(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c == '_' || c.is_ascii_alphanumeric())
}

pub(crate) fn validate_column_name(name: &str) -> Result<()> {
    if is_safe_identifier(name) {
        Ok(())
    } else {
        Err(BuildError::InvalidColumnName(String::from(name)))
    }
}

/// A table visible to the operator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableDescriptor {
    /// Schema the table lives in (empty for SQLite).
    pub schema: String,
    /// Table name.
    pub name: String,
}

/// Kind of form input used to edit a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum InputKind {
    /// Numeric input.
    Numeric,
    /// Boolean checkbox.
    Checkbox,
    /// Single-line text.
    #[default]
    Text,
    /// Multi-line text.
    Textarea,
    /// JSON document.
    Json,
    /// Choice from an enumerated set.
    Select,
}

impl InputKind {
    /// Infers the input kind from a declared column type.
    ///
    /// Size and precision suffixes such as `(255)` or ` unsigned` are stripped
    /// before lookup. Unknown types fall back to [`InputKind::Text`].
    #[must_use]
    pub fn infer(declared_type: &str) -> Self {
        let mut base = declared_type.trim().to_ascii_lowercase();
        if let Some(idx) = base.find('(') {
            base.truncate(idx);
        }
        let base = base.trim_end().trim_end_matches(" unsigned");

        match base {
            "smallint" | "integer" | "bigint" | "decimal" | "numeric" | "real"
            | "double precision" | "smallserial" | "serial" | "bigserial" | "money" | "tinyint"
            | "mediumint" | "float" | "double" | "year" | "int" | "int2" | "int4" | "int8"
            | "float4" | "float8" | "dec" | "unsigned big int" => Self::Numeric,

            "boolean" | "bool" => Self::Checkbox,

            "json" => Self::Json,

            "text" | "jsonb" | "xml" | "bytea" | "tinyblob" | "mediumblob" | "blob"
            | "longblob" | "binary" | "varbinary" | "tinytext" | "mediumtext" | "longtext"
            | "clob" => Self::Textarea,

            "enum" | "set" => Self::Select,

            "character" | "character varying" | "varchar" | "char" | "bpchar" | "uuid"
            | "citext" | "date" | "time" | "time without time zone" | "time with time zone"
            | "timestamp" | "timestamp without time zone" | "timestamp with time zone"
            | "timestamptz" | "interval" | "datetime" | "inet" | "cidr" | "macaddr"
            | "macaddr8" | "bit" | "bit varying" | "point" | "line" | "lseg" | "box" | "path"
            | "polygon" | "circle" | "tsvector" | "tsquery" | "pg_lsn" | "pg_snapshot"
            | "txid_snapshot" | "native character" | "nchar" | "nvarchar"
            | "varying character" => Self::Text,

            _ => {
                warn!(declared_type = %declared_type, "unknown data type, using text input");
                Self::Text
            }
        }
    }

    /// Converts raw form input into a typed value.
    ///
    /// Empty numeric and checkbox input becomes NULL. Numeric input that does
    /// not parse is passed through as text and left for the database to judge.
    pub fn coerce(self, raw: &str) -> Result<Value> {
        match self {
            Self::Json => Ok(Value::Json(serde_json::from_str(raw)?)),
            Self::Numeric => {
                let trimmed = raw.trim();
                if trimmed.is_empty() {
                    Ok(Value::Null)
                } else if let Ok(n) = trimmed.parse::<i64>() {
                    Ok(Value::Int(n))
                } else if let Ok(f) = trimmed.parse::<f64>() {
                    Ok(Value::Float(f))
                } else {
                    Ok(Value::Text(String::from(raw)))
                }
            }
            Self::Checkbox => Ok(match raw.trim().to_ascii_lowercase().as_str() {
                "" => Value::Null,
                "true" | "on" | "1" | "yes" | "t" => Value::Bool(true),
                "false" | "off" | "0" | "no" | "f" => Value::Bool(false),
                _ => Value::Text(String::from(raw)),
            }),
            Self::Text | Self::Textarea | Self::Select => Ok(Value::Text(String::from(raw))),
        }
    }
}

/// A column of an existing table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnDescriptor {
    /// Column name.
    pub name: String,
    /// Type as reported by the database.
    pub declared_type: String,
    /// Whether the column has a default value.
    pub has_default: bool,
    /// Whether the column participates in a UNIQUE or PRIMARY KEY constraint.
    pub is_unique: bool,
    /// Whether the column is filled by a sequence or identity.
    pub has_auto_increment: bool,
    /// Form input kind derived from `declared_type`.
    pub input_kind: InputKind,
}

impl ColumnDescriptor {
    /// Creates a descriptor, inferring the input kind from the declared type.
    #[must_use]
    pub fn new(name: impl Into<String>, declared_type: impl Into<String>) -> Self {
        let declared_type = declared_type.into();
        let input_kind = InputKind::infer(&declared_type);
        Self {
            name: name.into(),
            declared_type,
            has_default: false,
            is_unique: false,
            has_auto_increment: false,
            input_kind,
        }
    }

    /// Marks the column as unique.
    #[must_use]
    pub const fn unique(mut self) -> Self {
        self.is_unique = true;
        self
    }

    /// Returns true for JSON-typed columns.
    #[must_use]
    pub fn is_json(&self) -> bool {
        let ty = self.declared_type.to_ascii_lowercase();
        ty == "json" || ty == "jsonb"
    }
}

/// A submitted form field for insert and update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RowItem {
    /// Target column.
    pub column: String,
    /// Raw input.
    pub value: String,
    /// Input kind used to coerce `value`.
    #[serde(default)]
    pub kind: InputKind,
}

impl RowItem {
    /// Creates a text field.
    #[must_use]
    pub fn new(column: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            value: value.into(),
            kind: InputKind::Text,
        }
    }

    /// Sets the input kind.
    #[must_use]
    pub const fn kind(mut self, kind: InputKind) -> Self {
        self.kind = kind;
        self
    }
}

/// A column definition for `CREATE TABLE`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnInput {
    /// Column name. Entries with an empty name are skipped.
    pub name: String,
    /// SQL type name, e.g. `VARCHAR` or `DOUBLE PRECISION`.
    pub data_type: String,
    /// Optional size rendered as `type(size)`.
    #[serde(default)]
    pub size: Option<u32>,
    /// Whether NULL is allowed.
    #[serde(default)]
    pub nullable: bool,
    /// Whether the column is the primary key.
    #[serde(default)]
    pub primary_key: bool,
    /// Whether the column carries a UNIQUE constraint.
    #[serde(default)]
    pub unique: bool,
    /// Whether the column auto-increments. Requires `primary_key`.
    #[serde(default)]
    pub auto_increment: bool,
}

impl ColumnInput {
    /// Creates a NOT NULL column of the given type.
    #[must_use]
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            size: None,
            nullable: false,
            primary_key: false,
            unique: false,
            auto_increment: false,
        }
    }

    /// Sets the size suffix.
    #[must_use]
    pub const fn size(mut self, size: u32) -> Self {
        self.size = Some(size);
        self
    }

    /// Allows NULL.
    #[must_use]
    pub const fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// Marks as primary key.
    #[must_use]
    pub const fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    /// Adds a UNIQUE constraint.
    #[must_use]
    pub const fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// Marks as auto-increment.
    #[must_use]
    pub const fn auto_increment(mut self) -> Self {
        self.auto_increment = true;
        self
    }

    pub(crate) fn validate_type(&self) -> Result<()> {
        if DATA_TYPE.is_match(&self.data_type) {
            Ok(())
        } else {
            Err(BuildError::InvalidDataType(self.data_type.clone()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_name_validation() {
        assert!(validate_table_name("valid_name1").is_ok());
        assert!(validate_table_name("_private").is_ok());
        assert!(matches!(
            validate_table_name("1abc"),
            Err(BuildError::InvalidTableName(_))
        ));
        assert!(matches!(
            validate_table_name("a b"),
            Err(BuildError::InvalidTableName(_))
        ));
        assert!(matches!(
            validate_table_name("a;DROP TABLE x"),
            Err(BuildError::InvalidTableName(_))
        ));
        assert!(matches!(
            validate_table_name(""),
            Err(BuildError::EmptyTableName)
        ));
    }

    #[test]
    fn test_safe_identifier() {
        assert!(is_safe_identifier("user_id"));
        assert!(!is_safe_identifier("user id"));
        assert!(!is_safe_identifier("x--"));
        assert!(!is_safe_identifier(""));
    }

    #[test]
    fn test_infer_strips_suffixes() {
        assert_eq!(InputKind::infer("VARCHAR(255)"), InputKind::Text);
        assert_eq!(InputKind::infer("int unsigned"), InputKind::Numeric);
        assert_eq!(InputKind::infer("DECIMAL(10, 2)"), InputKind::Numeric);
        assert_eq!(InputKind::infer("boolean"), InputKind::Checkbox);
        assert_eq!(InputKind::infer("json"), InputKind::Json);
        assert_eq!(InputKind::infer("jsonb"), InputKind::Textarea);
        assert_eq!(InputKind::infer("enum"), InputKind::Select);
        assert_eq!(InputKind::infer("longtext"), InputKind::Textarea);
    }

    #[test]
    fn test_infer_unknown_defaults_to_text() {
        assert_eq!(InputKind::infer("geography"), InputKind::Text);
        assert_eq!(InputKind::infer("USER-DEFINED"), InputKind::Text);
    }

    #[test]
    fn test_coerce() {
        assert_eq!(InputKind::Numeric.coerce("42").unwrap(), Value::Int(42));
        assert_eq!(InputKind::Numeric.coerce("2.5").unwrap(), Value::Float(2.5));
        assert_eq!(InputKind::Numeric.coerce("").unwrap(), Value::Null);
        assert_eq!(InputKind::Checkbox.coerce("on").unwrap(), Value::Bool(true));
        assert_eq!(InputKind::Checkbox.coerce("0").unwrap(), Value::Bool(false));
        assert_eq!(
            InputKind::Text.coerce("").unwrap(),
            Value::Text(String::new())
        );
        assert!(matches!(
            InputKind::Json.coerce("{bad"),
            Err(BuildError::InvalidJson(_))
        ));
    }

    #[test]
    fn test_json_column_detection() {
        assert!(ColumnDescriptor::new("doc", "jsonb").is_json());
        assert!(ColumnDescriptor::new("doc", "JSON").is_json());
        assert!(!ColumnDescriptor::new("doc", "text").is_json());
    }
}
