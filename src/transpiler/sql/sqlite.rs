use crate::ast::Comprehension;
use crate::error::RelqResult;
use crate::transpiler::base;
use crate::transpiler::context::BuildContext;
use crate::transpiler::ddl::{self, ColumnDef, TableDdl, TableDef};
use crate::transpiler::dialect::{Capabilities, Capability, Dialect};
use crate::transpiler::traits::QueryBuilder;
use crate::types::{sql_type, NumericBooleanDelegate, TextUuidDelegate, TypeMappers};

/// SQLite.
#[derive(Debug)]
pub struct SqliteDialect {
    capabilities: Capabilities,
    mappers: TypeMappers,
    builder: SqliteQueryBuilder,
    ddl: SqliteTableDdl,
}

impl SqliteDialect {
    pub fn new() -> Self {
        Self {
            capabilities: Capabilities::all().without(&[
                Capability::Sequence,
                Capability::SequenceCurr,
                Capability::SequenceMin,
                Capability::SequenceMax,
                Capability::SequenceCycle,
                Capability::FunctionDatabase,
                Capability::FunctionUser,
                Capability::TypeBigDecimal,
                Capability::TypeBlob,
                Capability::ReturnInsertOther,
                Capability::MutableCursor,
            ]),
            mappers: TypeMappers::standard()
                .with(NumericBooleanDelegate::new(sql_type::INTEGER, "INTEGER"))
                .with(TextUuidDelegate),
            builder: SqliteQueryBuilder,
            ddl: SqliteTableDdl,
        }
    }
}

impl Default for SqliteDialect {
    fn default() -> Self {
        Self::new()
    }
}

impl Dialect for SqliteDialect {
    fn name(&self) -> &str {
        "sqlite"
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
pub struct SqliteQueryBuilder;

impl QueryBuilder for SqliteQueryBuilder {
    fn build_fetch_offset_clause(&self, c: &Comprehension, ctx: &mut BuildContext) -> RelqResult<()> {
        match (c.fetch, c.offset) {
            (None, Some(d)) => {
                let text = format!(" limit -1 offset {}", d);
                ctx.push_str(&text);
                Ok(())
            }
            _ => base::build_fetch_offset_clause(self, c, ctx),
        }
    }
}

/// SQLite cannot add constraints to an existing table, so keys go inline.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteTableDdl;

impl TableDdl for SqliteTableDdl {
    fn create_statements(&self, dialect: &dyn Dialect, table: &TableDef) -> RelqResult<Vec<String>> {
        let mut out = vec![self.create_table(dialect, table)?];
        out.extend(table.indexes.iter().map(|ix| self.create_index(dialect, table, ix)));
        Ok(out)
    }

    fn drop_statements(&self, dialect: &dyn Dialect, table: &TableDef) -> RelqResult<Vec<String>> {
        Ok(vec![format!(
            "drop table {}",
            dialect.query_builder().quote_identifier(&table.name)
        )])
    }

    fn create_table(&self, dialect: &dyn Dialect, table: &TableDef) -> RelqResult<String> {
        let mut sql = ddl::standard_create_table(self, dialect, table)?;
        if !table.foreign_keys.is_empty() {
            sql.pop();
            for fk in &table.foreign_keys {
                sql.push_str(", ");
                sql.push_str(&ddl::foreign_key_constraint(dialect, fk));
            }
            sql.push(')');
        }
        Ok(sql)
    }

    /// `INTEGER PRIMARY KEY AUTOINCREMENT` is the only auto-increment form.
    fn column_definition(&self, dialect: &dyn Dialect, column: &ColumnDef) -> RelqResult<String> {
        if column.auto_increment {
            return Ok(format!(
                "{} INTEGER PRIMARY KEY AUTOINCREMENT",
                dialect.query_builder().quote_identifier(&column.name)
            ));
        }
        ddl::standard_column_definition(self, dialect, column)
    }
}
