//! Error types for statement building.

use thiserror::Error;

/// Errors raised while building a statement.
///
/// Every variant is detected before any SQL reaches the database.
#[derive(Debug, Error)]
pub enum BuildError {
    /// The table name was empty.
    #[error("table name cannot be empty")]
    EmptyTableName,

    /// The table name is not a safe identifier.
    #[error("invalid table name '{0}': only alphanumeric characters and _ are allowed")]
    InvalidTableName(String),

    /// A column name is not a safe identifier.
    #[error("invalid column name '{0}'")]
    InvalidColumnName(String),

    /// A declared column type contains characters that cannot appear in DDL.
    #[error("invalid data type '{0}'")]
    InvalidDataType(String),

    /// Limit or offset was negative.
    #[error("invalid limit or offset: both must be >= 0")]
    InvalidPagination,

    /// Limit exceeded the configured per-page ceiling.
    #[error("limit cannot be greater than {max}")]
    LimitTooLarge {
        /// The configured ceiling.
        max: i64,
    },

    /// The same column was supplied twice in an insert or update.
    #[error("duplicate column name '{0}'")]
    DuplicateColumn(String),

    /// A value flagged as JSON could not be parsed.
    #[error("invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// The number of columns and row values differ.
    #[error("cols/rows length mismatch: {columns} columns, {values} values")]
    LengthMismatch {
        /// Number of column descriptors.
        columns: usize,
        /// Number of row values.
        values: usize,
    },

    /// Auto-increment was requested on a column that is not the primary key.
    #[error("auto-increment can only be set on primary key columns (column '{0}')")]
    AutoIncrementWithoutPrimaryKey(String),

    /// A statement needs at least one column.
    #[error("at least one column is required")]
    NoColumns,

    /// The dialect name is not one of the supported engines.
    #[error("unsupported dialect '{0}'")]
    UnsupportedDialect(String),
}

/// Result type alias for statement building.
pub type Result<T> = std::result::Result<T, BuildError>;
