//! DELETE statements.

use super::{Builder, Statement};
use crate::error::Result;
use crate::schema::ColumnDescriptor;
use crate::value::Value;

impl Builder {
    /// Deletes at most one row currently holding `row`.
    pub fn delete_row(
        &self,
        table: &str,
        columns: &[ColumnDescriptor],
        row: &[Value],
    ) -> Result<Statement> {
        let table = self.table(table)?;
        let mut params = self.params(1);
        let predicate = self.identity(&mut params, columns, row)?;
        let sql = format!(
            "DELETE FROM {table} WHERE {}",
            self.dialect.limit_to_one_row(&table, &predicate)
        );
        Ok((sql, params.into_args()))
    }
}
