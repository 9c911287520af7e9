//! Transpiler test modules.
//!
//! Tests are organized by category:
//! - `core`: SELECT construction on the default dialect
//! - `dialects`: golden SQL per dialect family
//! - `ddl`: table, index and sequence DDL
//! - `dml`: INSERT, UPDATE and DELETE

mod core;
mod ddl;

use crate::ast::{Comprehension, Symbol, SymbolTable};
use crate::transpiler::{build_statement, DialectKind};

/// A symbol table with one generator symbol already allocated.
fn one_generator() -> (SymbolTable, Symbol) {
    let mut table = SymbolTable::new();
    let u = table.fresh("u");
    (table, u)
}

fn sql(c: &Comprehension, kind: DialectKind) -> String {
    build_statement(c, kind.profile()).unwrap().sql
}
