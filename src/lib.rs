//! # relq: a relational query compiler
//!
//! Lowers a composable query AST into SQL for a target dialect, and maps
//! structured values to and from positional result and parameter columns.
//!
//! ## Quick Example
//!
//! ```
//! use relq::prelude::*;
//!
//! let mut symbols = SymbolTable::new();
//! let u = symbols.fresh("u");
//! let query = Comprehension::new()
//!     .from(u, Node::table("users"))
//!     .filter(Node::eq(Node::column(u, "active"), Node::literal(true)))
//!     .select(Node::Product(vec![Node::column(u, "id"), Node::column(u, "name")]))
//!     .fetch(10);
//!
//! let stmt = query.to_sql_with_dialect(DialectKind::Sqlite.profile()).unwrap();
//! assert_eq!(
//!     stmt.sql,
//!     "select x1.\"id\", x1.\"name\" from \"users\" x1 where (x1.\"active\" = 1) limit 10"
//! );
//! ```
//!
//! ## Layers
//!
//! | Module        | Role                                              |
//! |---------------|---------------------------------------------------|
//! | `ast`         | Comprehensions, expressions, symbols, values      |
//! | `transpiler`  | Query builder hooks, dialects, DDL and DML        |
//! | `types`       | Per-kind type mapping and literal syntax          |
//! | `linearizer`  | Structured values to and from positional columns  |
//! | `cursor`      | Positioned row and parameter abstractions         |

pub mod ast;
pub mod compiler;
pub mod config;
pub mod cursor;
pub mod error;
pub mod linearizer;
pub mod transpiler;
pub mod types;

pub mod prelude {
    pub use crate::ast::*;
    pub use crate::compiler::Compiler;
    pub use crate::config::CompilerConfig;
    pub use crate::cursor::{ParameterBuffer, PositionedParameters, PositionedResult, ResultRow};
    pub use crate::error::*;
    pub use crate::linearizer::{
        CollectionLinearizer, ColumnLinearizer, Datum, ProductLinearizer, RecordLinearizer, ValueLinearizer,
    };
    pub use crate::transpiler::{
        build_statement, Capability, ColumnDef, Dialect, DialectKind, Statement, TableDef, ToSql,
    };
}

/// Build a SELECT for one of the built-in dialects.
///
/// ```
/// use relq::prelude::*;
///
/// let mut symbols = SymbolTable::new();
/// let u = symbols.fresh("u");
/// let query = Comprehension::new().from(u, Node::table("users"));
/// let stmt = relq::compile(&query, DialectKind::SqlServer).unwrap();
/// assert_eq!(stmt.sql, "select * from [users] x1");
/// ```
pub fn compile(query: &ast::Comprehension, dialect: transpiler::DialectKind) -> error::RelqResult<transpiler::Statement> {
    transpiler::build_statement(query, dialect.profile())
}
