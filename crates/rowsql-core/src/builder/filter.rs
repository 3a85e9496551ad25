//! Row identity predicates.
//!
//! Rows carry no stored key, so UPDATE and DELETE locate their target by the
//! values last read from it. A unique column identifies the row on its own.
//! Without one, every column is compared and the statement is scoped to a
//! single physical row by the dialect.

use super::{Builder, Params, Statement};
use crate::error::{BuildError, Result};
use crate::schema::ColumnDescriptor;
use crate::value::Value;

impl Builder {
    /// Builds a predicate identifying `row`, numbering placeholders from
    /// `start` (1-based).
    pub fn where_clause(
        &self,
        columns: &[ColumnDescriptor],
        row: &[Value],
        start: usize,
    ) -> Result<Statement> {
        let mut params = self.params(start);
        let predicate = self.identity(&mut params, columns, row)?;
        Ok((predicate, params.into_args()))
    }

    pub(super) fn identity(
        &self,
        params: &mut Params<'_>,
        columns: &[ColumnDescriptor],
        row: &[Value],
    ) -> Result<String> {
        if columns.len() != row.len() {
            return Err(BuildError::LengthMismatch {
                columns: columns.len(),
                values: row.len(),
            });
        }
        if columns.is_empty() {
            return Err(BuildError::NoColumns);
        }

        if let Some(idx) = columns.iter().position(|c| c.is_unique) {
            return Ok(equals(params, &columns[idx], &row[idx]));
        }

        let mut parts = Vec::with_capacity(columns.len());
        for (column, value) in columns.iter().zip(row) {
            if column.is_json() && !value.is_null() {
                let doc = match value {
                    Value::Json(doc) => doc.clone(),
                    Value::Text(text) => serde_json::from_str(text)?,
                    other => other.to_json(),
                };
                let placeholder = params.bind(Value::Json(doc));
                parts.push(self.dialect.json_match(&column.name, &placeholder));
            } else {
                parts.push(equals(params, column, value));
            }
        }
        Ok(parts.join(" AND "))
    }
}

fn equals(params: &mut Params<'_>, column: &ColumnDescriptor, value: &Value) -> String {
    if value.is_null() {
        format!("{} IS NULL", column.name)
    } else {
        let placeholder = params.bind_typed(Some(column), value.clone());
        format!("{} = {placeholder}", column.name)
    }
}
