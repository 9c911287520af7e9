use super::bracket_identifier;
use crate::ast::{Comprehension, Function, Node, ScalarKind};
use crate::error::RelqResult;
use crate::transpiler::base;
use crate::transpiler::context::BuildContext;
use crate::transpiler::ddl::{ColumnDef, TableDdl};
use crate::transpiler::dialect::{Capabilities, Capability, Dialect};
use crate::transpiler::paging;
use crate::transpiler::traits::QueryBuilder;
use crate::types::{sql_type, NumericBooleanDelegate, StandardDelegate, TypeMappers, VarbinaryDelegate};

/// Microsoft SQL Server.
#[derive(Debug)]
pub struct SqlServerDialect {
    capabilities: Capabilities,
    mappers: TypeMappers,
    builder: SqlServerQueryBuilder,
    ddl: SqlServerTableDdl,
}

impl SqlServerDialect {
    pub fn new() -> Self {
        Self {
            capabilities: Capabilities::all().without(&[Capability::SequenceCurr, Capability::ReturnInsertOther]),
            mappers: TypeMappers::standard()
                .with(NumericBooleanDelegate::new(sql_type::BIT, "BIT"))
                .with(StandardDelegate::renamed(ScalarKind::Double, "FLOAT(53)"))
                .with(StandardDelegate::renamed(ScalarKind::Timestamp, "DATETIME"))
                .with(StandardDelegate::renamed(ScalarKind::Uuid, "UNIQUEIDENTIFIER"))
                .with(VarbinaryDelegate::new(ScalarKind::Bytes))
                .with(VarbinaryDelegate::new(ScalarKind::Blob)),
            builder: SqlServerQueryBuilder,
            ddl: SqlServerTableDdl,
        }
    }
}

impl Default for SqlServerDialect {
    fn default() -> Self {
        Self::new()
    }
}

impl Dialect for SqlServerDialect {
    fn name(&self) -> &str {
        "sqlserver"
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
pub struct SqlServerQueryBuilder;

impl QueryBuilder for SqlServerQueryBuilder {
    fn quote_identifier(&self, name: &str) -> String {
        bracket_identifier(name)
    }

    /// Offsets go through a numbered-row subquery; a bare fetch is `top n`.
    fn build_comprehension(&self, c: &Comprehension, ctx: &mut BuildContext) -> RelqResult<()> {
        if c.offset.is_some() {
            let paged = paging::row_number_paging(c, ctx.dialect().name())?;
            return base::build_comprehension(self, &paged, ctx);
        }
        base::build_comprehension(self, c, ctx)
    }

    fn build_select_modifiers(&self, c: &Comprehension, ctx: &mut BuildContext) -> RelqResult<()> {
        if let (Some(t), None) = (c.fetch, c.offset) {
            let text = format!("top {} ", t);
            ctx.push_str(&text);
        }
        Ok(())
    }

    fn build_fetch_offset_clause(&self, _c: &Comprehension, _ctx: &mut BuildContext) -> RelqResult<()> {
        Ok(())
    }

    fn apply(&self, function: &Function, args: &[Node], ctx: &mut BuildContext) -> RelqResult<()> {
        match function {
            Function::Concat => base::infix(self, "+", args, ctx),
            Function::Length => base::call(self, "len", args, ctx),
            Function::Database => {
                ctx.push_str("db_name()");
                Ok(())
            }
            Function::User => {
                ctx.push_str("suser_sname()");
                Ok(())
            }
            Function::CurrentDate => {
                ctx.push_str("cast(getdate() as date)");
                Ok(())
            }
            _ => base::apply(self, function, args, ctx),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SqlServerTableDdl;

impl TableDdl for SqlServerTableDdl {
    fn auto_increment_clause(&self, _column: &ColumnDef) -> String {
        " IDENTITY".to_string()
    }
}
