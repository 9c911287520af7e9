//! DELETE generation.

use super::single_table;
use crate::ast::Comprehension;
use crate::error::RelqResult;
use crate::transpiler::context::BuildContext;
use crate::transpiler::dialect::Dialect;
use crate::transpiler::statement::Statement;
use tracing::debug;

/// `delete from "t" where ...`, for a comprehension over one table.
pub fn build_delete(dialect: &dyn Dialect, c: &Comprehension) -> RelqResult<Statement> {
    c.validate_scopes()?;
    let (sym, table) = single_table(c, "delete")?;

    let q = dialect.query_builder();
    let mut ctx = BuildContext::new(dialect);
    let target = q.quote_identifier(table);
    ctx.bind_qualifier(sym, target.clone());
    ctx.push_str("delete from ");
    ctx.push_str(&target);
    q.build_where_clause(c, &mut ctx)?;

    let (sql, setters, _) = ctx.finish();
    debug!(dialect = dialect.name(), %sql, setters = setters.len(), "built delete");
    Ok(Statement {
        sql,
        setters,
        column_count: None,
        skip_rows: 0,
    })
}
