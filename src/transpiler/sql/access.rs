use super::bracket_identifier;
use crate::ast::{Comprehension, Function, Node, NullOrdering, Ordering, ScalarKind};
use crate::error::{RelqError, RelqResult};
use crate::transpiler::base;
use crate::transpiler::context::BuildContext;
use crate::transpiler::ddl::{self, ColumnDef, TableDdl};
use crate::transpiler::dialect::{Capabilities, Capability, Dialect};
use crate::transpiler::traits::QueryBuilder;
use crate::types::{sql_type, AccessDateDelegate, NumericBooleanDelegate, TextUuidDelegate, TypeMappers};
use tracing::trace;

/// Microsoft Access (Jet / ACE).
#[derive(Debug)]
pub struct AccessDialect {
    capabilities: Capabilities,
    mappers: TypeMappers,
    builder: AccessQueryBuilder,
    ddl: AccessTableDdl,
}

impl AccessDialect {
    pub fn new() -> Self {
        Self {
            capabilities: Capabilities::all().without(&[
                Capability::Sequence,
                Capability::SequenceCurr,
                Capability::SequenceMin,
                Capability::SequenceMax,
                Capability::SequenceCycle,
                Capability::PagingNested,
                Capability::PagingDrop,
                Capability::FunctionDatabase,
                Capability::FunctionUser,
                Capability::ColumnDefaults,
                Capability::TypeBigDecimal,
                Capability::TypeBlob,
                Capability::ReturnInsertOther,
                Capability::MutableCursor,
                Capability::LikeEscape,
            ]),
            mappers: TypeMappers::standard()
                .with(NumericBooleanDelegate::new(sql_type::BIT, "YESNO"))
                .with(AccessDateDelegate::new(ScalarKind::Date))
                .with(AccessDateDelegate::new(ScalarKind::Time))
                .with(AccessDateDelegate::new(ScalarKind::Timestamp))
                .with(TextUuidDelegate),
            builder: AccessQueryBuilder,
            ddl: AccessTableDdl,
        }
    }
}

impl Default for AccessDialect {
    fn default() -> Self {
        Self::new()
    }
}

impl Dialect for AccessDialect {
    fn name(&self) -> &str {
        "access"
    }

    fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    fn query_builder(&self) -> &dyn QueryBuilder {
        &self.builder
    }

    fn type_mappers(&self) -> &TypeMappers {
        &self.mappers
    }

    fn table_ddl(&self) -> &dyn TableDdl {
        &self.ddl
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AccessQueryBuilder;

impl QueryBuilder for AccessQueryBuilder {
    fn quote_identifier(&self, name: &str) -> String {
        bracket_identifier(name)
    }

    /// `top (fetch + offset)`; the caller discards the first `offset` rows.
    fn build_select_modifiers(&self, c: &Comprehension, ctx: &mut BuildContext) -> RelqResult<()> {
        if let Some(t) = c.fetch {
            let d = c.offset.unwrap_or(0);
            let rows = t
                .checked_add(d)
                .ok_or_else(|| RelqError::malformed(format!("fetch {} plus offset {} overflows", t, d)))?;
            let text = format!("top {} ", rows);
            ctx.push_str(&text);
            if d > 0 {
                trace!(skip = d, "offset left to the client");
                ctx.set_skip_rows(d);
            }
        }
        Ok(())
    }

    fn build_fetch_offset_clause(&self, _c: &Comprehension, _ctx: &mut BuildContext) -> RelqResult<()> {
        Ok(())
    }

    /// No `case`; null placement goes through `iif(isnull(e), ..)`.
    fn build_ordering(&self, node: &Node, ordering: Ordering, ctx: &mut BuildContext) -> RelqResult<()> {
        let key = match ordering.nulls {
            NullOrdering::Default => None,
            NullOrdering::First => Some("0, 1"),
            NullOrdering::Last => Some("1, 0"),
        };
        if let Some(key) = key {
            ctx.push_str("iif(isnull(");
            self.expr(node, ctx)?;
            ctx.push_str("), ");
            ctx.push_str(key);
            ctx.push_str("), ");
        }
        self.expr(node, ctx)?;
        if ordering.is_desc() {
            ctx.push_str(" desc");
        }
        Ok(())
    }

    fn expr(&self, node: &Node, ctx: &mut BuildContext) -> RelqResult<()> {
        match node {
            Node::Case { clauses, otherwise } if !clauses.is_empty() => {
                ctx.push_str("switch(");
                for (i, (cond, value)) in clauses.iter().enumerate() {
                    if i > 0 {
                        ctx.push_str(", ");
                    }
                    self.expr(cond, ctx)?;
                    ctx.push_str(", ");
                    self.expr(value, ctx)?;
                }
                if let Some(e) = otherwise {
                    ctx.push_str(", true, ");
                    self.expr(e, ctx)?;
                }
                ctx.push(')');
                Ok(())
            }
            _ => base::expr(self, node, ctx),
        }
    }

    fn apply(&self, function: &Function, args: &[Node], ctx: &mut BuildContext) -> RelqResult<()> {
        match function {
            Function::Concat => base::infix(self, "&", args, ctx),
            Function::Modulo => base::infix(self, "mod", args, ctx),
            Function::Length => base::call(self, "len", args, ctx),
            Function::Lower => base::call(self, "lcase", args, ctx),
            Function::Upper => base::call(self, "ucase", args, ctx),
            Function::CurrentDate => {
                ctx.push_str("date()");
                Ok(())
            }
            _ => base::apply(self, function, args, ctx),
        }
    }

    fn row_number(&self, _by: &[(Node, Ordering)], ctx: &mut BuildContext) -> RelqResult<()> {
        Err(ctx.unsupported("row_number"))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AccessTableDdl;

impl TableDdl for AccessTableDdl {
    fn column_type(&self, dialect: &dyn Dialect, column: &ColumnDef) -> RelqResult<String> {
        if column.auto_increment && column.db_type.is_none() {
            return Ok("COUNTER".to_string());
        }
        ddl::standard_column_type(dialect, column)
    }

    fn auto_increment_clause(&self, _column: &ColumnDef) -> String {
        String::new()
    }
}
