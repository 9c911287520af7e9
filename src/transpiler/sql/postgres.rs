use crate::ast::{Function, Node, Ordering, ScalarKind};
use crate::error::RelqResult;
use crate::transpiler::base;
use crate::transpiler::context::BuildContext;
use crate::transpiler::ddl::{self, ColumnDef, TableDdl, TableDef};
use crate::transpiler::dialect::{Capabilities, Dialect};
use crate::transpiler::traits::QueryBuilder;
use crate::types::{PostgresByteaDelegate, StandardDelegate, TypeMappers};

/// PostgreSQL.
#[derive(Debug)]
pub struct PostgresDialect {
    capabilities: Capabilities,
    mappers: TypeMappers,
    builder: PostgresQueryBuilder,
    ddl: PostgresTableDdl,
}

impl PostgresDialect {
    pub fn new() -> Self {
        Self {
            capabilities: Capabilities::all(),
            mappers: TypeMappers::standard()
                .with(StandardDelegate::renamed(ScalarKind::Double, "DOUBLE PRECISION"))
                .with(PostgresByteaDelegate)
                .with(StandardDelegate::renamed(ScalarKind::Blob, "lo")),
            builder: PostgresQueryBuilder,
            ddl: PostgresTableDdl { lob_triggers: true },
        }
    }

    /// Toggle `lo_manage` triggers on `Blob` columns.
    pub fn with_lob_triggers(mut self, enabled: bool) -> Self {
        self.ddl.lob_triggers = enabled;
        self
    }
}

impl Default for PostgresDialect {
    fn default() -> Self {
        Self::new()
    }
}

impl Dialect for PostgresDialect {
    fn name(&self) -> &str {
        "postgres"
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
pub struct PostgresQueryBuilder;

impl QueryBuilder for PostgresQueryBuilder {
    fn build_ordering(&self, node: &Node, ordering: Ordering, ctx: &mut BuildContext) -> RelqResult<()> {
        base::build_ordering_native(self, node, ordering, ctx)
    }

    fn apply(&self, function: &Function, args: &[Node], ctx: &mut BuildContext) -> RelqResult<()> {
        match function {
            Function::Database => {
                ctx.push_str("current_database()");
                Ok(())
            }
            Function::User => {
                ctx.push_str("current_user");
                Ok(())
            }
            _ => base::apply(self, function, args, ctx),
        }
    }

    fn next_value(&self, sequence: &str, ctx: &mut BuildContext) -> RelqResult<()> {
        let text = format!("nextval('{}')", self.quote_identifier(sequence).replace('\'', "''"));
        ctx.push_str(&text);
        Ok(())
    }

    fn current_value(&self, sequence: &str, ctx: &mut BuildContext) -> RelqResult<()> {
        let text = format!("currval('{}')", self.quote_identifier(sequence).replace('\'', "''"));
        ctx.push_str(&text);
        Ok(())
    }
}

/// Serial types for auto-increment, plus `lo_manage` triggers that unlink
/// large objects when their row goes away.
#[derive(Debug, Clone)]
pub struct PostgresTableDdl {
    lob_triggers: bool,
}

impl PostgresTableDdl {
    fn lob_columns<'t>(&self, table: &'t TableDef) -> impl Iterator<Item = &'t ColumnDef> {
        let enabled = self.lob_triggers;
        table
            .columns
            .iter()
            .filter(move |c| enabled && c.kind == ScalarKind::Blob)
    }

    fn trigger_name(table: &TableDef, column: &ColumnDef) -> String {
        format!("{}__{}_lob", table.name, column.name)
    }
}

impl TableDdl for PostgresTableDdl {
    fn create_statements(&self, dialect: &dyn Dialect, table: &TableDef) -> RelqResult<Vec<String>> {
        let q = dialect.query_builder();
        let mut out = ddl::standard_create_statements(self, dialect, table)?;
        for column in self.lob_columns(table) {
            out.push(format!(
                "create trigger {} before update or delete on {} for each row execute procedure lo_manage({})",
                q.quote_identifier(&Self::trigger_name(table, column)),
                q.quote_identifier(&table.name),
                q.quote_identifier(&column.name)
            ));
        }
        Ok(out)
    }

    fn drop_statements(&self, dialect: &dyn Dialect, table: &TableDef) -> RelqResult<Vec<String>> {
        let q = dialect.query_builder();
        let mut out: Vec<String> = self
            .lob_columns(table)
            .map(|column| {
                format!(
                    "drop trigger {} on {}",
                    q.quote_identifier(&Self::trigger_name(table, column)),
                    q.quote_identifier(&table.name)
                )
            })
            .collect();
        out.extend(ddl::standard_drop_statements(self, dialect, table)?);
        Ok(out)
    }

    fn column_type(&self, dialect: &dyn Dialect, column: &ColumnDef) -> RelqResult<String> {
        if column.auto_increment && column.db_type.is_none() {
            match column.kind {
                ScalarKind::Short => return Ok("SMALLSERIAL".to_string()),
                ScalarKind::Int => return Ok("SERIAL".to_string()),
                ScalarKind::Long => return Ok("BIGSERIAL".to_string()),
                _ => {}
            }
        }
        ddl::standard_column_type(dialect, column)
    }

    fn auto_increment_clause(&self, _column: &ColumnDef) -> String {
        String::new()
    }
}
