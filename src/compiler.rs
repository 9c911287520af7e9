//! One-stop entry point binding a dialect to the statement builders.

use crate::ast::Comprehension;
use crate::config::CompilerConfig;
use crate::cursor::PositionedResult;
use crate::error::RelqResult;
use crate::linearizer::{self, Datum, RecordLinearizer};
use crate::transpiler::{
    self, Dialect, DialectKind, InsertStatement, SequenceDef, Statement, TableDef, UpdateStatement,
};
use std::sync::Arc;
use tracing::info;

/// A dialect plus compiler settings.
#[derive(Debug, Clone)]
pub struct Compiler {
    dialect: Arc<dyn Dialect>,
    log_sql: bool,
}

impl Compiler {
    pub fn new(dialect: Arc<dyn Dialect>) -> Self {
        Self {
            dialect,
            log_sql: false,
        }
    }

    pub fn for_kind(kind: DialectKind) -> Self {
        Self::new(kind.shared())
    }

    pub fn from_config(config: &CompilerConfig) -> Self {
        Self {
            dialect: config.dialect(),
            log_sql: config.log_sql,
        }
    }

    pub fn dialect(&self) -> &dyn Dialect {
        self.dialect.as_ref()
    }

    fn log(&self, sql: &str) {
        if self.log_sql {
            info!(dialect = self.dialect.name(), "{}", sql);
        }
    }

    pub fn select(&self, c: &Comprehension) -> RelqResult<Statement> {
        let stmt = transpiler::build_statement(c, self.dialect())?;
        self.log(&stmt.sql);
        Ok(stmt)
    }

    pub fn insert(&self, table: &str, linearizer: &dyn RecordLinearizer) -> RelqResult<InsertStatement> {
        let stmt = transpiler::build_insert(self.dialect(), table, linearizer)?;
        self.log(&stmt.sql);
        Ok(stmt)
    }

    pub fn update(&self, c: &Comprehension) -> RelqResult<UpdateStatement> {
        let stmt = transpiler::build_update(self.dialect(), c)?;
        self.log(&stmt.sql);
        Ok(stmt)
    }

    pub fn delete(&self, c: &Comprehension) -> RelqResult<Statement> {
        let stmt = transpiler::build_delete(self.dialect(), c)?;
        self.log(&stmt.sql);
        Ok(stmt)
    }

    pub fn create_table(&self, table: &TableDef) -> RelqResult<Vec<String>> {
        self.dialect.table_ddl().create_statements(self.dialect(), table)
    }

    pub fn drop_table(&self, table: &TableDef) -> RelqResult<Vec<String>> {
        self.dialect.table_ddl().drop_statements(self.dialect(), table)
    }

    pub fn create_sequence(&self, seq: &SequenceDef) -> RelqResult<Vec<String>> {
        self.dialect.sequence_ddl().create_statements(self.dialect(), seq)
    }

    pub fn drop_sequence(&self, seq: &SequenceDef) -> RelqResult<Vec<String>> {
        self.dialect.sequence_ddl().drop_statements(self.dialect(), seq)
    }

    /// Read one row through `linearizer`.
    pub fn read_row(&self, linearizer: &dyn RecordLinearizer, row: &mut dyn PositionedResult) -> RelqResult<Datum> {
        linearizer::read_row(self.dialect(), linearizer, row)
    }
}

impl Default for Compiler {
    fn default() -> Self {
        Self::for_kind(DialectKind::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Node, ScalarKind, SymbolTable, Value};
    use crate::cursor::ResultRow;
    use crate::linearizer::ColumnLinearizer;
    use crate::transpiler::ColumnDef;

    #[test]
    fn test_compiler_uses_configured_dialect() {
        let config = CompilerConfig::from_toml("dialect = \"derby\"").unwrap();
        let compiler = Compiler::from_config(&config);
        assert_eq!(compiler.dialect().name(), "derby");

        let mut table = SymbolTable::new();
        let u = table.fresh("u");
        let c = Comprehension::new().from(u, Node::table("users")).fetch(1);
        assert_eq!(
            compiler.select(&c).unwrap().sql,
            "select * from \"users\" x1 fetch next 1 rows only"
        );
    }

    #[test]
    fn test_ddl_and_rows() {
        let compiler = Compiler::for_kind(DialectKind::Sqlite);
        let table = TableDef::new("flags").column(ColumnDef::new("on", ScalarKind::Boolean));
        assert_eq!(
            compiler.create_table(&table).unwrap(),
            vec!["create table \"flags\" (\"on\" INTEGER NOT NULL)".to_string()]
        );

        let mut symbols = SymbolTable::new();
        let f = symbols.fresh("f");
        let lin = ColumnLinearizer::new(Node::column(f, "on"), ScalarKind::Boolean);
        let mut row = ResultRow::new(vec![Value::Int(1)]);
        assert_eq!(compiler.read_row(&lin, &mut row).unwrap(), Datum::scalar(true));
    }
}
