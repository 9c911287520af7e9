use crate::ast::{Node, Ordering};
use crate::error::RelqResult;
use crate::transpiler::base;
use crate::transpiler::context::BuildContext;
use crate::transpiler::ddl::{ColumnDef, TableDdl};
use crate::transpiler::dialect::{Capabilities, Capability, Dialect};
use crate::transpiler::traits::QueryBuilder;
use crate::types::TypeMappers;

/// H2.
#[derive(Debug)]
pub struct H2Dialect {
    capabilities: Capabilities,
    mappers: TypeMappers,
    builder: H2QueryBuilder,
    ddl: H2TableDdl,
}

impl H2Dialect {
    pub fn new() -> Self {
        Self {
            capabilities: Capabilities::all().without(&[Capability::ReturnInsertOther]),
            mappers: TypeMappers::standard(),
            builder: H2QueryBuilder,
            ddl: H2TableDdl,
        }
    }
}

impl Default for H2Dialect {
    fn default() -> Self {
        Self::new()
    }
}

impl Dialect for H2Dialect {
    fn name(&self) -> &str {
        "h2"
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
pub struct H2QueryBuilder;

impl QueryBuilder for H2QueryBuilder {
    fn build_ordering(&self, node: &Node, ordering: Ordering, ctx: &mut BuildContext) -> RelqResult<()> {
        base::build_ordering_native(self, node, ordering, ctx)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct H2TableDdl;

impl TableDdl for H2TableDdl {
    fn auto_increment_clause(&self, _column: &ColumnDef) -> String {
        " AUTO_INCREMENT".to_string()
    }
}
