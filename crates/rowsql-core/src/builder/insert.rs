//! INSERT statements.

use super::{assignments, Builder, Statement};
use crate::error::Result;
use crate::schema::{ColumnDescriptor, RowItem};

impl Builder {
    /// Inserts one row from submitted fields.
    ///
    /// With no fields, every column takes its default.
    pub fn insert_row(&self, table: &str, items: &[RowItem]) -> Result<Statement> {
        self.insert_typed(table, items, &[])
    }

    /// Like [`Self::insert_row`], casting text values to the declared type
    /// of the matching column in `columns`.
    pub fn insert_typed(
        &self,
        table: &str,
        items: &[RowItem],
        columns: &[ColumnDescriptor],
    ) -> Result<Statement> {
        let table = self.table(table)?;
        let values = assignments(items)?;

        if values.is_empty() {
            return Ok((self.dialect.insert_defaults(&table), Vec::new()));
        }

        let mut params = self.params(1);
        let mut names = Vec::with_capacity(values.len());
        let mut placeholders = Vec::with_capacity(values.len());
        for (column, value) in values {
            let descriptor = columns.iter().find(|c| c.name == column);
            names.push(column);
            placeholders.push(params.assign(descriptor, value));
        }

        let sql = format!(
            "INSERT INTO {table} ({}) VALUES ({})",
            names.join(", "),
            placeholders.join(", ")
        );
        Ok((sql, params.into_args()))
    }
}
