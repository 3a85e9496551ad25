//! UPDATE statements.

use super::{assignments, Builder, Statement};
use crate::error::{BuildError, Result};
use crate::schema::{ColumnDescriptor, RowItem};
use crate::value::Value;

impl Builder {
    /// Updates the single row currently holding `row`.
    ///
    /// WHERE placeholders continue numbering after the SET placeholders.
    pub fn update_row(
        &self,
        table: &str,
        items: &[RowItem],
        columns: &[ColumnDescriptor],
        row: &[Value],
    ) -> Result<Statement> {
        let table = self.table(table)?;
        let values = assignments(items)?;
        if values.is_empty() {
            return Err(BuildError::NoColumns);
        }

        let mut params = self.params(1);
        let set: Vec<String> = values
            .into_iter()
            .map(|(column, value)| {
                let descriptor = columns.iter().find(|c| c.name == column);
                format!("{column} = {}", params.assign(descriptor, value))
            })
            .collect();

        let predicate = self.identity(&mut params, columns, row)?;
        let sql = format!(
            "UPDATE {table} SET {} WHERE {}",
            set.join(", "),
            self.dialect.limit_to_one_row(&table, &predicate)
        );
        Ok((sql, params.into_args()))
    }
}
