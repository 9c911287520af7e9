use crate::ast::{Comprehension, Function, Node, NullOrdering, Ordering, ScalarKind};
use crate::error::RelqResult;
use crate::transpiler::base;
use crate::transpiler::context::BuildContext;
use crate::transpiler::ddl::{ColumnDef, ForeignKeyDef, TableDdl, TableDef};
use crate::transpiler::dialect::{Capabilities, Capability, Dialect};
use crate::transpiler::traits::QueryBuilder;
use crate::types::{StandardDelegate, TextUuidDelegate, TypeMappers};

/// Largest row count MySQL accepts, standing in for "no limit".
const UNBOUNDED_LIMIT: &str = "18446744073709551615";

/// MySQL.
#[derive(Debug)]
pub struct MySqlDialect {
    capabilities: Capabilities,
    mappers: TypeMappers,
    builder: MySqlQueryBuilder,
    ddl: MySqlTableDdl,
}

impl MySqlDialect {
    pub fn new() -> Self {
        Self {
            capabilities: Capabilities::all().without(&[
                Capability::Sequence,
                Capability::SequenceCurr,
                Capability::SequenceMin,
                Capability::SequenceMax,
                Capability::SequenceCycle,
                Capability::ReturnInsertOther,
            ]),
            mappers: TypeMappers::standard()
                .with(TextUuidDelegate)
                .with(StandardDelegate::renamed(ScalarKind::Blob, "LONGBLOB")),
            builder: MySqlQueryBuilder,
            ddl: MySqlTableDdl,
        }
    }
}

impl Default for MySqlDialect {
    fn default() -> Self {
        Self::new()
    }
}

impl Dialect for MySqlDialect {
    fn name(&self) -> &str {
        "mysql"
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
pub struct MySqlQueryBuilder;

impl QueryBuilder for MySqlQueryBuilder {
    fn quote_identifier(&self, name: &str) -> String {
        format!("`{}`", name.replace('`', "``"))
    }

    /// Nulls sort first ascending; an `isnull(e)` key moves them.
    fn build_ordering(&self, node: &Node, ordering: Ordering, ctx: &mut BuildContext) -> RelqResult<()> {
        match ordering.nulls {
            NullOrdering::Default => {}
            NullOrdering::First => {
                ctx.push_str("isnull(");
                self.expr(node, ctx)?;
                ctx.push_str(") desc, ");
            }
            NullOrdering::Last => {
                ctx.push_str("isnull(");
                self.expr(node, ctx)?;
                ctx.push_str("), ");
            }
        }
        self.expr(node, ctx)?;
        if ordering.is_desc() {
            ctx.push_str(" desc");
        }
        Ok(())
    }

    fn build_fetch_offset_clause(&self, c: &Comprehension, ctx: &mut BuildContext) -> RelqResult<()> {
        match (c.fetch, c.offset) {
            (None, Some(d)) => {
                let text = format!(" limit {} offset {}", UNBOUNDED_LIMIT, d);
                ctx.push_str(&text);
                Ok(())
            }
            _ => base::build_fetch_offset_clause(self, c, ctx),
        }
    }

    fn apply(&self, function: &Function, args: &[Node], ctx: &mut BuildContext) -> RelqResult<()> {
        match function {
            Function::Concat => base::call(self, "concat", args, ctx),
            _ => base::apply(self, function, args, ctx),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MySqlTableDdl;

impl TableDdl for MySqlTableDdl {
    fn auto_increment_clause(&self, _column: &ColumnDef) -> String {
        " AUTO_INCREMENT".to_string()
    }

    fn drop_foreign_key(&self, dialect: &dyn Dialect, table: &TableDef, fk: &ForeignKeyDef) -> String {
        let q = dialect.query_builder();
        format!(
            "alter table {} drop foreign key {}",
            q.quote_identifier(&table.name),
            q.quote_identifier(&fk.name)
        )
    }
}
