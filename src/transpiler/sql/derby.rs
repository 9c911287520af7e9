use crate::ast::{Comprehension, Function, Node, ScalarKind};
use crate::error::RelqResult;
use crate::transpiler::base;
use crate::transpiler::context::BuildContext;
use crate::transpiler::ddl::{self, SequenceDdl, SequenceDef};
use crate::transpiler::dialect::{Capabilities, Capability, Dialect};
use crate::transpiler::traits::QueryBuilder;
use crate::types::{sql_type, NumericBooleanDelegate, TypeMappers};
use tracing::warn;

/// Apache Derby.
#[derive(Debug)]
pub struct DerbyDialect {
    capabilities: Capabilities,
    mappers: TypeMappers,
    builder: DerbyQueryBuilder,
    sequences: DerbySequenceDdl,
}

impl DerbyDialect {
    pub fn new() -> Self {
        Self {
            capabilities: Capabilities::all().without(&[
                Capability::SequenceCurr,
                Capability::FunctionDatabase,
                Capability::PagingNested,
                Capability::ReturnInsertOther,
            ]),
            mappers: TypeMappers::standard().with(NumericBooleanDelegate::new(sql_type::SMALLINT, "SMALLINT")),
            builder: DerbyQueryBuilder,
            sequences: DerbySequenceDdl,
        }
    }
}

impl Default for DerbyDialect {
    fn default() -> Self {
        Self::new()
    }
}

impl Dialect for DerbyDialect {
    fn name(&self) -> &str {
        "derby"
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

    fn sequence_ddl(&self) -> &dyn SequenceDdl {
        &self.sequences
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DerbyQueryBuilder;

impl QueryBuilder for DerbyQueryBuilder {
    /// Derby has no FROM-less select.
    fn build_from_clause(&self, c: &Comprehension, ctx: &mut BuildContext) -> RelqResult<()> {
        if c.from.is_empty() {
            ctx.push_str(" from sysibm.sysdummy1");
            return Ok(());
        }
        base::build_from_clause(self, c, ctx)
    }

    fn build_fetch_offset_clause(&self, c: &Comprehension, ctx: &mut BuildContext) -> RelqResult<()> {
        let text = match (c.fetch, c.offset) {
            (Some(t), Some(d)) => format!(" offset {} rows fetch next {} rows only", d, t),
            (Some(t), None) => format!(" fetch next {} rows only", t),
            (None, Some(d)) => format!(" offset {} rows", d),
            (None, None) => return Ok(()),
        };
        ctx.push_str(&text);
        Ok(())
    }

    fn apply(&self, function: &Function, args: &[Node], ctx: &mut BuildContext) -> RelqResult<()> {
        match function {
            Function::Modulo => base::call(self, "mod", args, ctx),
            Function::User => {
                ctx.push_str("current_user");
                Ok(())
            }
            _ => base::apply(self, function, args, ctx),
        }
    }
}

/// Sequences need an explicit integer type.
#[derive(Debug, Clone, Copy, Default)]
pub struct DerbySequenceDdl;

impl SequenceDdl for DerbySequenceDdl {
    fn create_statements(&self, dialect: &dyn Dialect, seq: &SequenceDef) -> RelqResult<Vec<String>> {
        if seq.cycle {
            warn!(
                sequence = %seq.name,
                "Derby cycles a sequence back to its minimum value, not its start value"
            );
        }
        let type_clause = match seq.kind {
            ScalarKind::Short => " as SMALLINT",
            ScalarKind::Int => " as INTEGER",
            _ => " as BIGINT",
        };
        Ok(vec![ddl::standard_create_sequence(dialect, seq, type_clause)?])
    }
}
