//! Statements for the history table.

use super::{Builder, Statement};
use crate::dialect::HISTORY_TABLE;
use crate::error::Result;
use crate::value::Value;

impl Builder {
    /// Creates the history table if it is missing.
    #[must_use]
    pub fn create_history_table(&self) -> String {
        self.dialect.create_history_table_sql()
    }

    /// Appends a history message.
    #[must_use]
    pub fn insert_history(&self, message: &str) -> Statement {
        let mut params = self.params(1);
        let placeholder = params.bind(Value::from(message));
        (
            format!("INSERT INTO {HISTORY_TABLE} (message) VALUES ({placeholder})"),
            params.into_args(),
        )
    }

    /// Lists history entries, newest first.
    pub fn list_history(&self, limit: i64, offset: i64) -> Result<Statement> {
        let page = self.page_clause(limit, offset)?;
        Ok((
            format!("SELECT id, message, time FROM {HISTORY_TABLE} ORDER BY id DESC{page}"),
            Vec::new(),
        ))
    }

    /// Deletes one history entry.
    #[must_use]
    pub fn delete_history(&self, id: i64) -> Statement {
        let mut params = self.params(1);
        let placeholder = params.bind(Value::Int(id));
        (
            format!("DELETE FROM {HISTORY_TABLE} WHERE id = {placeholder}"),
            params.into_args(),
        )
    }

    /// Counts history entries.
    #[must_use]
    pub fn count_history(&self) -> Statement {
        (format!("SELECT COUNT(*) FROM {HISTORY_TABLE}"), Vec::new())
    }
}
