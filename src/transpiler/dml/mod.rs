//! INSERT, UPDATE and DELETE generation.
//!
//! Values written by INSERT and UPDATE are bound through a linearizer, in
//! column order, ahead of any setters produced by the WHERE clause.

pub mod delete;
pub mod insert;
pub mod update;

pub use delete::build_delete;
pub use insert::{build_insert, InsertStatement, Returned};
pub use update::{build_update, UpdateStatement};

use crate::ast::{Comprehension, Node, Symbol};
use crate::error::{RelqError, RelqResult};

/// The one table a DML comprehension may target, with its generator.
pub(crate) fn single_table<'c>(c: &'c Comprehension, statement: &str) -> RelqResult<(Symbol, &'c str)> {
    let [(sym, Node::Table { name })] = c.from.as_slice() else {
        return Err(RelqError::malformed(format!(
            "{} needs a comprehension over exactly one table",
            statement
        )));
    };
    if c.group_by.is_some() || !c.order_by.is_empty() || c.fetch.is_some() || c.offset.is_some() {
        return Err(RelqError::malformed(format!(
            "{} supports only filters on its table",
            statement
        )));
    }
    Ok((*sym, name.as_str()))
}

/// Column names of `nodes`, which must all be columns of `source`.
pub(crate) fn column_names(nodes: &[Node], source: Option<Symbol>, statement: &str) -> RelqResult<Vec<String>> {
    nodes
        .iter()
        .map(|node| match node {
            Node::Column { source: s, name } if source.is_none_or(|expected| expected == *s) => Ok(name.clone()),
            other => Err(RelqError::malformed(format!(
                "{} can only write plain columns of its table, got {}",
                statement,
                other.kind_name()
            ))),
        })
        .collect()
}
