//! UPDATE generation.

use super::{column_names, single_table};
use crate::ast::{Comprehension, Node, Value};
use crate::cursor::ParameterBuffer;
use crate::error::{RelqError, RelqResult};
use crate::linearizer::{Datum, ValueLinearizer};
use crate::transpiler::context::BuildContext;
use crate::transpiler::dialect::Dialect;
use crate::transpiler::statement::ParameterSetter;
use tracing::debug;

/// `update "t" set "a" = ?, "b" = ? where ...`.
#[derive(Debug, Clone)]
pub struct UpdateStatement {
    pub sql: String,
    pub columns: Vec<String>,
    /// Setters of the WHERE clause, bound after the new values.
    pub setters: Vec<ParameterSetter>,
}

impl UpdateStatement {
    /// Bind the new values, then the WHERE clause arguments.
    pub fn bind(
        &self,
        dialect: &dyn Dialect,
        linearizer: &dyn ValueLinearizer,
        value: &Datum,
        args: &[Value],
    ) -> RelqResult<ParameterBuffer> {
        let mut buf = ParameterBuffer::new();
        linearizer.set_parameter(dialect, &mut buf, Some(value))?;
        if buf.len() != self.columns.len() {
            return Err(RelqError::LinearizationArityMismatch {
                expected: self.columns.len(),
                got: buf.len(),
            });
        }
        for setter in &self.setters {
            setter.apply(args, &mut buf)?;
        }
        Ok(buf)
    }
}

/// Update the columns `c` projects, on the rows its filters select.
pub fn build_update(dialect: &dyn Dialect, c: &Comprehension) -> RelqResult<UpdateStatement> {
    c.validate_scopes()?;
    let (sym, table) = single_table(c, "update")?;
    let targets = match &c.select {
        Some(Node::Product(items)) => items.clone(),
        Some(Node::Struct(fields)) => fields.iter().map(|(_, n)| n.clone()).collect(),
        Some(node @ Node::Column { .. }) => vec![node.clone()],
        _ => return Err(RelqError::malformed("update needs a projection of the columns to set")),
    };
    let columns = column_names(&targets, Some(sym), "update")?;

    let q = dialect.query_builder();
    let mut ctx = BuildContext::new(dialect);
    let target = q.quote_identifier(table);
    ctx.bind_qualifier(sym, target.clone());
    ctx.push_str("update ");
    ctx.push_str(&target);
    ctx.push_str(" set ");
    let assignments = columns
        .iter()
        .map(|col| format!("{} = ?", q.quote_identifier(col)))
        .collect::<Vec<_>>()
        .join(", ");
    ctx.push_str(&assignments);
    q.build_where_clause(c, &mut ctx)?;

    let (sql, setters, _) = ctx.finish();
    debug!(dialect = dialect.name(), %sql, setters = setters.len(), "built update");
    Ok(UpdateStatement { sql, columns, setters })
}
