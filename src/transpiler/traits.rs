//! The query builder hook surface.

use super::base;
use super::context::BuildContext;
use crate::ast::{Comprehension, Function, Literal, Node, Ordering};
use crate::error::RelqResult;

/// Dialect-specific SQL emission for one comprehension.
///
/// Every hook has a default in [`base`]; a dialect overrides only the hooks
/// whose default is wrong for its database and calls the `base` function
/// for every case it does not handle itself. Base functions recurse through
/// the builder passed to them, so overrides apply at every depth.
pub trait QueryBuilder: Send + Sync + std::fmt::Debug {
    /// Quote a table, column, constraint or sequence name.
    fn quote_identifier(&self, name: &str) -> String {
        base::quote_identifier(name)
    }

    fn build_comprehension(&self, c: &Comprehension, ctx: &mut BuildContext) -> RelqResult<()> {
        base::build_comprehension(self, c, ctx)
    }

    /// Text between `select ` and the select list (`distinct`, `top n`).
    fn build_select_modifiers(&self, c: &Comprehension, ctx: &mut BuildContext) -> RelqResult<()> {
        base::build_select_modifiers(self, c, ctx)
    }

    fn build_select_clause(&self, c: &Comprehension, ctx: &mut BuildContext) -> RelqResult<()> {
        base::build_select_clause(self, c, ctx)
    }

    fn build_from_clause(&self, c: &Comprehension, ctx: &mut BuildContext) -> RelqResult<()> {
        base::build_from_clause(self, c, ctx)
    }

    fn build_where_clause(&self, c: &Comprehension, ctx: &mut BuildContext) -> RelqResult<()> {
        base::build_where_clause(self, c, ctx)
    }

    fn build_group_by_clause(&self, c: &Comprehension, ctx: &mut BuildContext) -> RelqResult<()> {
        base::build_group_by_clause(self, c, ctx)
    }

    fn build_order_by_clause(&self, c: &Comprehension, ctx: &mut BuildContext) -> RelqResult<()> {
        base::build_order_by_clause(self, c, ctx)
    }

    /// One ordering key. The default emulates null placement with a
    /// `case when` prefix key.
    fn build_ordering(&self, node: &Node, ordering: Ordering, ctx: &mut BuildContext) -> RelqResult<()> {
        base::build_ordering(self, node, ordering, ctx)
    }

    fn build_fetch_offset_clause(&self, c: &Comprehension, ctx: &mut BuildContext) -> RelqResult<()> {
        base::build_fetch_offset_clause(self, c, ctx)
    }

    /// Expression dispatch.
    fn expr(&self, node: &Node, ctx: &mut BuildContext) -> RelqResult<()> {
        base::expr(self, node, ctx)
    }

    fn apply(&self, function: &Function, args: &[Node], ctx: &mut BuildContext) -> RelqResult<()> {
        base::apply(self, function, args, ctx)
    }

    fn literal(&self, lit: &Literal, ctx: &mut BuildContext) -> RelqResult<()> {
        base::literal(self, lit, ctx)
    }

    fn row_number(&self, by: &[(Node, Ordering)], ctx: &mut BuildContext) -> RelqResult<()> {
        base::row_number(self, by, ctx)
    }

    fn next_value(&self, sequence: &str, ctx: &mut BuildContext) -> RelqResult<()> {
        base::next_value(self, sequence, ctx)
    }

    fn current_value(&self, sequence: &str, ctx: &mut BuildContext) -> RelqResult<()> {
        base::current_value(self, sequence, ctx)
    }
}

/// The builder with every hook at its default.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardQueryBuilder;

impl QueryBuilder for StandardQueryBuilder {}
