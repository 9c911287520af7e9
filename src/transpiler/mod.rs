//! SQL generation for comprehensions.
//!
//! A build walks the comprehension tree through the dialect's
//! [`QueryBuilder`], producing SQL text with `?` placeholders and one
//! [`ParameterSetter`] per placeholder.

pub mod base;
pub mod context;
pub mod ddl;
pub mod dialect;
pub mod dml;
pub mod paging;
pub mod sql;
pub mod statement;
pub mod traits;

#[cfg(test)]
mod tests;

pub use context::BuildContext;
pub use ddl::{
    ColumnDef, ForeignKeyAction, ForeignKeyDef, IndexDef, PrimaryKeyDef, SequenceDdl, SequenceDef, TableDdl,
    TableDef,
};
pub use dialect::{Capabilities, Capability, Dialect, DialectKind, DialectRegistry};
pub use dml::{build_delete, build_insert, build_update, InsertStatement, Returned, UpdateStatement};
pub use statement::{ParameterSetter, Statement};
pub use traits::{QueryBuilder, StandardQueryBuilder};

use crate::ast::{Comprehension, Node};
use crate::error::RelqResult;
use tracing::debug;

/// Build the SELECT statement for `c`.
///
/// Scopes are validated first; nothing is emitted for a malformed tree.
/// The build is a pure function of `c` and the dialect.
pub fn build_statement(c: &Comprehension, dialect: &dyn Dialect) -> RelqResult<Statement> {
    c.validate_scopes()?;
    let mut ctx = BuildContext::new(dialect);
    dialect.query_builder().build_comprehension(c, &mut ctx)?;
    let (sql, setters, skip_rows) = ctx.finish();
    debug!(
        dialect = dialect.name(),
        %sql,
        setters = setters.len(),
        skip_rows,
        "built statement"
    );
    Ok(Statement {
        sql,
        setters,
        column_count: column_count(c),
        skip_rows,
    })
}

/// Columns in the projection, when none of them expands to a whole row.
fn column_count(c: &Comprehension) -> Option<usize> {
    match &c.select {
        None | Some(Node::Ref(_)) => None,
        Some(Node::Struct(fields)) => {
            (!fields.iter().any(|(_, n)| matches!(n, Node::Ref(_)))).then_some(fields.len())
        }
        Some(Node::Product(items)) => (!items.iter().any(|n| matches!(n, Node::Ref(_)))).then_some(items.len()),
        Some(_) => Some(1),
    }
}

/// Trait for turning a query tree into a statement.
pub trait ToSql {
    /// Build for the default dialect.
    fn to_sql(&self) -> RelqResult<Statement> {
        self.to_sql_with_dialect(DialectKind::default().profile())
    }

    fn to_sql_with_dialect(&self, dialect: &dyn Dialect) -> RelqResult<Statement>;
}

impl ToSql for Comprehension {
    fn to_sql_with_dialect(&self, dialect: &dyn Dialect) -> RelqResult<Statement> {
        build_statement(self, dialect)
    }
}
