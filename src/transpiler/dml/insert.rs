//! INSERT generation.

use super::column_names;
use crate::cursor::ParameterBuffer;
use crate::error::{RelqError, RelqResult};
use crate::linearizer::{Datum, RecordLinearizer, ValueLinearizer};
use crate::transpiler::dialect::{Capability, Dialect};
use tracing::debug;

/// A column handed back after an insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Returned {
    /// A generated key.
    Key(String),
    /// Any other column.
    Column(String),
}

/// `insert into "t" ("a", "b") values (?, ?)`.
#[derive(Debug, Clone)]
pub struct InsertStatement {
    pub sql: String,
    pub table: String,
    pub columns: Vec<String>,
    /// Columns the driver returns through its generated-keys channel.
    pub returned: Vec<Returned>,
}

impl InsertStatement {
    /// Return a generated key column.
    pub fn returning_key(mut self, dialect: &dyn Dialect, column: impl Into<String>) -> RelqResult<Self> {
        dialect.require(Capability::ReturnInsertKey)?;
        self.returned.push(Returned::Key(column.into()));
        Ok(self)
    }

    /// Return a non-key column.
    pub fn returning(mut self, dialect: &dyn Dialect, column: impl Into<String>) -> RelqResult<Self> {
        dialect.require(Capability::ReturnInsertOther)?;
        self.returned.push(Returned::Column(column.into()));
        Ok(self)
    }

    /// Bind one row through the linearizer the statement was built from.
    pub fn bind(
        &self,
        dialect: &dyn Dialect,
        linearizer: &dyn ValueLinearizer,
        value: &Datum,
    ) -> RelqResult<ParameterBuffer> {
        let buf = crate::linearizer::bind(dialect, linearizer, Some(value))?;
        if buf.len() != self.columns.len() {
            return Err(RelqError::LinearizationArityMismatch {
                expected: self.columns.len(),
                got: buf.len(),
            });
        }
        Ok(buf)
    }
}

/// Insert one row into `table`, writing the linearizer's columns.
pub fn build_insert(
    dialect: &dyn Dialect,
    table: &str,
    linearizer: &dyn RecordLinearizer,
) -> RelqResult<InsertStatement> {
    let columns = column_names(&linearizer.linearized_nodes(), None, "insert")?;
    if columns.is_empty() {
        return Err(RelqError::malformed("insert without columns"));
    }
    let q = dialect.query_builder();
    let sql = format!(
        "insert into {} ({}) values ({})",
        q.quote_identifier(table),
        columns
            .iter()
            .map(|c| q.quote_identifier(c))
            .collect::<Vec<_>>()
            .join(", "),
        vec!["?"; columns.len()].join(", ")
    );
    debug!(dialect = dialect.name(), %sql, "built insert");
    Ok(InsertStatement {
        sql,
        table: table.to_string(),
        columns,
        returned: Vec::new(),
    })
}
