//! Error types for repository operations.

use rowsql_core::BuildError;

/// Errors raised by the repository and its connection.
#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    /// The statement could not be built. Nothing was executed.
    #[error(transparent)]
    Build(#[from] BuildError),

    /// The table is not in the allow-list.
    #[error("table '{0}' not found")]
    TableNotAllowed(String),

    /// No row in the scanned window hashes to the token.
    #[error("row '{token}' not found in table '{table}'")]
    RowNotFound {
        /// Table that was scanned.
        table: String,
        /// Requested token.
        token: String,
    },

    /// The drop confirmation did not match the statement to be run.
    #[error("confirmation does not match, type '{expected}' to confirm")]
    ConfirmationMismatch {
        /// The text the operator must echo back.
        expected: String,
    },

    /// The database rejected a statement.
    #[error("failed to {operation} '{resource}': {source}")]
    Execution {
        /// What was being done, e.g. `list rows`.
        operation: &'static str,
        /// The table or object acted on.
        resource: String,
        /// Driver error.
        #[source]
        source: sqlx::Error,
    },

    /// The connection could not be opened.
    #[error("failed to connect: {0}")]
    Connect(#[source] sqlx::Error),

    /// The connection string matches no supported engine.
    #[error("cannot detect database type: {0}")]
    DialectDetection(String),

    /// A value read back had an unexpected shape.
    #[error("unexpected value: {0}")]
    Decode(String),
}

impl RepoError {
    pub(crate) fn execution(
        operation: &'static str,
        resource: impl Into<String>,
    ) -> impl FnOnce(sqlx::Error) -> Self {
        let resource = resource.into();
        move |source| Self::Execution {
            operation,
            resource,
            source,
        }
    }

    /// Returns true for errors detected before any SQL ran.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Build(_) | Self::ConfirmationMismatch { .. })
    }

    /// Returns true when the requested row was not found.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::RowNotFound { .. })
    }

    /// Returns true when the table is outside the allow-list.
    #[must_use]
    pub const fn is_authorization(&self) -> bool {
        matches!(self, Self::TableNotAllowed(_))
    }

    /// Returns true if the underlying driver error reports a missing table.
    #[must_use]
    pub fn is_missing_table(&self) -> bool {
        match self {
            Self::Execution { source, .. } => is_missing_table(source),
            _ => false,
        }
    }
}

/// Recognizes "table does not exist" across the three engines.
pub(crate) fn is_missing_table(err: &sqlx::Error) -> bool {
    let sqlx::Error::Database(db) = err else {
        return false;
    };
    if matches!(db.code().as_deref(), Some("42P01" | "42S02")) {
        return true;
    }
    let message = db.message();
    message.contains("no such table") || message.contains("doesn't exist")
}

/// Result type for repository operations.
pub type Result<T> = std::result::Result<T, RepoError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        assert!(RepoError::Build(BuildError::NoColumns).is_validation());
        assert!(RepoError::TableNotAllowed(String::from("x")).is_authorization());
        assert!(RepoError::RowNotFound {
            table: String::from("t"),
            token: String::from("abcd1234"),
        }
        .is_not_found());
        assert!(!RepoError::DialectDetection(String::new()).is_validation());
    }

    #[test]
    fn test_execution_message_carries_context() {
        let err = RepoError::execution("list rows", "users")(sqlx::Error::RowNotFound);
        assert!(err.to_string().starts_with("failed to list rows 'users':"));
        assert!(!err.is_missing_table());
    }

    #[test]
    fn test_build_error_is_transparent() {
        let err = RepoError::from(BuildError::LengthMismatch {
            columns: 2,
            values: 1,
        });
        assert!(err.to_string().starts_with("cols/rows length mismatch"));
    }
}
