//! Default behavior of every [`QueryBuilder`] hook.
//!
//! Each function takes the builder it was called through, so a dialect
//! override that falls back here still has its other overrides applied
//! to nested expressions and subqueries.

use super::context::BuildContext;
use super::dialect::Capability;
use super::statement::ParameterSetter;
use super::traits::QueryBuilder;
use crate::ast::{Comprehension, DefNode, Function, Literal, Node, NullOrdering, Ordering, ScalarKind, Symbol};
use crate::error::{RelqError, RelqResult};
use tracing::trace;

/// `"name"`, with embedded quotes doubled.
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

pub fn build_comprehension<Q: QueryBuilder + ?Sized>(
    q: &Q,
    c: &Comprehension,
    ctx: &mut BuildContext,
) -> RelqResult<()> {
    if c.fetch.is_some() || c.offset.is_some() {
        if ctx.depth() > 0 {
            ctx.require(Capability::PagingNested)?;
        }
        if c.fetch.is_none() {
            ctx.require(Capability::PagingDrop)?;
        }
    }

    let binders = c.generator_symbols();
    let saved = ctx.save_aliases(&binders);
    for sym in &binders {
        ctx.bind_alias(*sym);
    }

    ctx.push_str("select ");
    q.build_select_modifiers(c, ctx)?;
    q.build_select_clause(c, ctx)?;
    q.build_from_clause(c, ctx)?;
    q.build_where_clause(c, ctx)?;
    q.build_group_by_clause(c, ctx)?;
    q.build_order_by_clause(c, ctx)?;
    q.build_fetch_offset_clause(c, ctx)?;

    ctx.restore_aliases(saved);
    Ok(())
}

pub fn build_select_modifiers<Q: QueryBuilder + ?Sized>(
    _q: &Q,
    _c: &Comprehension,
    _ctx: &mut BuildContext,
) -> RelqResult<()> {
    Ok(())
}

/// A missing projection selects the single generator's row. Struct fields
/// are aliased by name; a `Ref` item expands to the generator's columns.
pub fn build_select_clause<Q: QueryBuilder + ?Sized>(
    q: &Q,
    c: &Comprehension,
    ctx: &mut BuildContext,
) -> RelqResult<()> {
    match &c.select {
        None => {
            if c.from.len() != 1 {
                return Err(RelqError::malformed(format!(
                    "a comprehension without a projection needs exactly one generator, found {}",
                    c.from.len()
                )));
            }
            ctx.push('*');
        }
        Some(Node::Struct(fields)) => {
            for (i, (name, node)) in fields.iter().enumerate() {
                if i > 0 {
                    ctx.push_str(", ");
                }
                select_item(q, node, ctx)?;
                if !matches!(node, Node::Ref(_)) {
                    ctx.push_str(" as ");
                    ctx.push_str(&q.quote_identifier(name));
                }
            }
        }
        Some(Node::Product(items)) => {
            for (i, node) in items.iter().enumerate() {
                if i > 0 {
                    ctx.push_str(", ");
                }
                select_item(q, node, ctx)?;
            }
        }
        Some(node) => select_item(q, node, ctx)?,
    }
    Ok(())
}

fn select_item<Q: QueryBuilder + ?Sized>(q: &Q, node: &Node, ctx: &mut BuildContext) -> RelqResult<()> {
    match node {
        Node::Ref(sym) => row_ref(*sym, ctx),
        other => q.expr(other, ctx),
    }
}

fn row_ref(sym: Symbol, ctx: &mut BuildContext) -> RelqResult<()> {
    let text = format!("{}.*", ctx.alias(sym)?);
    ctx.push_str(&text);
    Ok(())
}

pub fn build_from_clause<Q: QueryBuilder + ?Sized>(
    q: &Q,
    c: &Comprehension,
    ctx: &mut BuildContext,
) -> RelqResult<()> {
    if c.from.is_empty() {
        return Ok(());
    }
    ctx.push_str(" from ");
    for (i, (sym, source)) in c.from.iter().enumerate() {
        if i > 0 {
            ctx.push_str(", ");
        }
        match source {
            Node::Table { name } => ctx.push_str(&q.quote_identifier(name)),
            Node::Comprehension(inner) => subquery(q, inner, ctx)?,
            other => {
                return Err(ctx.unsupported(format!("{} as a generator source", other.kind_name())));
            }
        }
        let alias = ctx.alias(*sym)?.to_string();
        ctx.push(' ');
        ctx.push_str(&alias);
    }
    Ok(())
}

/// `(select ...)`, one level deeper.
pub fn subquery<Q: QueryBuilder + ?Sized>(q: &Q, c: &Comprehension, ctx: &mut BuildContext) -> RelqResult<()> {
    ctx.push('(');
    ctx.enter_subquery();
    q.build_comprehension(c, ctx)?;
    ctx.leave_subquery();
    ctx.push(')');
    Ok(())
}

/// Filters are conjoined. Operators render parenthesized, so plain
/// ` and ` keeps precedence.
pub fn build_where_clause<Q: QueryBuilder + ?Sized>(
    q: &Q,
    c: &Comprehension,
    ctx: &mut BuildContext,
) -> RelqResult<()> {
    if c.filters.is_empty() {
        return Ok(());
    }
    ctx.push_str(" where ");
    for (i, filter) in c.filters.iter().enumerate() {
        if i > 0 {
            ctx.push_str(" and ");
        }
        q.expr(filter, ctx)?;
    }
    Ok(())
}

pub fn build_group_by_clause<Q: QueryBuilder + ?Sized>(
    q: &Q,
    c: &Comprehension,
    ctx: &mut BuildContext,
) -> RelqResult<()> {
    let Some(key) = &c.group_by else {
        return Ok(());
    };
    ctx.push_str(" group by ");
    match key {
        Node::Product(items) => expr_list(q, items, ", ", ctx),
        single => q.expr(single, ctx),
    }
}

pub fn build_order_by_clause<Q: QueryBuilder + ?Sized>(
    q: &Q,
    c: &Comprehension,
    ctx: &mut BuildContext,
) -> RelqResult<()> {
    if c.order_by.is_empty() {
        return Ok(());
    }
    ctx.push_str(" order by ");
    orderings(q, &c.order_by, ctx)
}

fn orderings<Q: QueryBuilder + ?Sized>(
    q: &Q,
    by: &[(Node, Ordering)],
    ctx: &mut BuildContext,
) -> RelqResult<()> {
    for (i, (node, ordering)) in by.iter().enumerate() {
        if i > 0 {
            ctx.push_str(", ");
        }
        q.build_ordering(node, *ordering, ctx)?;
    }
    Ok(())
}

/// Null placement through a leading `case when (e) is null` key, for
/// databases without `nulls first` / `nulls last`.
pub fn build_ordering<Q: QueryBuilder + ?Sized>(
    q: &Q,
    node: &Node,
    ordering: Ordering,
    ctx: &mut BuildContext,
) -> RelqResult<()> {
    let (when_null, otherwise) = match ordering.nulls {
        NullOrdering::Default => ("", ""),
        NullOrdering::First => ("0", "1"),
        NullOrdering::Last => ("1", "0"),
    };
    if !when_null.is_empty() {
        trace!(nulls = ?ordering.nulls, "emulating null ordering");
        ctx.push_str("case when (");
        q.expr(node, ctx)?;
        ctx.push_str(") is null then ");
        ctx.push_str(when_null);
        ctx.push_str(" else ");
        ctx.push_str(otherwise);
        ctx.push_str(" end, ");
    }
    q.expr(node, ctx)?;
    if ordering.is_desc() {
        ctx.push_str(" desc");
    }
    Ok(())
}

/// `e [desc] [nulls first|last]`.
pub fn build_ordering_native<Q: QueryBuilder + ?Sized>(
    q: &Q,
    node: &Node,
    ordering: Ordering,
    ctx: &mut BuildContext,
) -> RelqResult<()> {
    q.expr(node, ctx)?;
    if ordering.is_desc() {
        ctx.push_str(" desc");
    }
    match ordering.nulls {
        NullOrdering::Default => {}
        NullOrdering::First => ctx.push_str(" nulls first"),
        NullOrdering::Last => ctx.push_str(" nulls last"),
    }
    Ok(())
}

/// `limit t offset d`.
pub fn build_fetch_offset_clause<Q: QueryBuilder + ?Sized>(
    _q: &Q,
    c: &Comprehension,
    ctx: &mut BuildContext,
) -> RelqResult<()> {
    let text = match (c.fetch, c.offset) {
        (Some(t), Some(d)) => format!(" limit {} offset {}", t, d),
        (Some(t), None) => format!(" limit {}", t),
        (None, Some(d)) => format!(" offset {}", d),
        (None, None) => return Ok(()),
    };
    ctx.push_str(&text);
    Ok(())
}

/// The capability an application needs before any dialect may emit it.
pub fn required_capability(function: &Function, arg_count: usize) -> Option<Capability> {
    match function {
        Function::Database => Some(Capability::FunctionDatabase),
        Function::User => Some(Capability::FunctionUser),
        Function::Like if arg_count == 3 => Some(Capability::LikeEscape),
        _ => None,
    }
}

pub fn expr<Q: QueryBuilder + ?Sized>(q: &Q, node: &Node, ctx: &mut BuildContext) -> RelqResult<()> {
    match node {
        Node::Comprehension(c) => subquery(q, c, ctx),
        Node::Column { source, name } => {
            let alias = ctx.alias(*source)?.to_string();
            ctx.push_str(&alias);
            ctx.push('.');
            ctx.push_str(&q.quote_identifier(name));
            Ok(())
        }
        Node::Literal(lit) => q.literal(lit, ctx),
        Node::QueryParameter { index, kind } => {
            let delegate = ctx.dialect().type_mappers().shared(*kind);
            ctx.add_setter(ParameterSetter::argument(delegate, *index));
            ctx.push('?');
            Ok(())
        }
        Node::Apply { function, args } => {
            function.check_arity(args.len())?;
            if let Some(cap) = required_capability(function, args.len()) {
                ctx.require(cap)?;
            }
            q.apply(function, args, ctx)
        }
        Node::Case { clauses, otherwise } => {
            if clauses.is_empty() {
                return Err(RelqError::malformed("case expression without a when clause"));
            }
            ctx.push_str("(case");
            for (cond, value) in clauses {
                ctx.push_str(" when ");
                q.expr(cond, ctx)?;
                ctx.push_str(" then ");
                q.expr(value, ctx)?;
            }
            if let Some(e) = otherwise {
                ctx.push_str(" else ");
                q.expr(e, ctx)?;
            }
            ctx.push_str(" end)");
            Ok(())
        }
        Node::RowNumber(by) => q.row_number(by, ctx),
        Node::NextValue(seq) => {
            ctx.require(Capability::Sequence)?;
            q.next_value(seq, ctx)
        }
        Node::CurrentValue(seq) => {
            ctx.require(Capability::Sequence)?;
            ctx.require(Capability::SequenceCurr)?;
            q.current_value(seq, ctx)
        }
        Node::Table { .. } | Node::Ref(_) | Node::Product(_) | Node::Struct(_) => {
            Err(ctx.unsupported(format!("{} in expression position", node.kind_name())))
        }
    }
}

/// Emit `items` separated by `sep`.
pub fn expr_list<Q: QueryBuilder + ?Sized>(
    q: &Q,
    items: &[Node],
    sep: &str,
    ctx: &mut BuildContext,
) -> RelqResult<()> {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            ctx.push_str(sep);
        }
        q.expr(item, ctx)?;
    }
    Ok(())
}

/// `(a op b op c)`.
pub fn infix<Q: QueryBuilder + ?Sized>(q: &Q, op: &str, args: &[Node], ctx: &mut BuildContext) -> RelqResult<()> {
    ctx.push('(');
    expr_list(q, args, &format!(" {} ", op), ctx)?;
    ctx.push(')');
    Ok(())
}

/// `name(a, b)`.
pub fn call<Q: QueryBuilder + ?Sized>(q: &Q, name: &str, args: &[Node], ctx: &mut BuildContext) -> RelqResult<()> {
    ctx.push_str(name);
    ctx.push('(');
    expr_list(q, args, ", ", ctx)?;
    ctx.push(')');
    Ok(())
}

pub fn apply<Q: QueryBuilder + ?Sized>(
    q: &Q,
    function: &Function,
    args: &[Node],
    ctx: &mut BuildContext,
) -> RelqResult<()> {
    match function {
        Function::Eq => infix(q, "=", args, ctx),
        Function::Ne => infix(q, "<>", args, ctx),
        Function::Lt => infix(q, "<", args, ctx),
        Function::Le => infix(q, "<=", args, ctx),
        Function::Gt => infix(q, ">", args, ctx),
        Function::Ge => infix(q, ">=", args, ctx),
        Function::And => infix(q, "and", args, ctx),
        Function::Or => infix(q, "or", args, ctx),
        Function::Plus => infix(q, "+", args, ctx),
        Function::Minus => infix(q, "-", args, ctx),
        Function::Times => infix(q, "*", args, ctx),
        Function::Divide => infix(q, "/", args, ctx),
        Function::Modulo => infix(q, "%", args, ctx),
        Function::Concat => infix(q, "||", args, ctx),
        Function::Not => {
            ctx.push_str("(not ");
            q.expr(&args[0], ctx)?;
            ctx.push(')');
            Ok(())
        }
        Function::IsNull => {
            ctx.push('(');
            q.expr(&args[0], ctx)?;
            ctx.push_str(" is null)");
            Ok(())
        }
        Function::In => {
            ctx.push('(');
            q.expr(&args[0], ctx)?;
            ctx.push_str(" in (");
            expr_list(q, &args[1..], ", ", ctx)?;
            ctx.push_str("))");
            Ok(())
        }
        Function::Like => {
            ctx.push('(');
            q.expr(&args[0], ctx)?;
            ctx.push_str(" like ");
            q.expr(&args[1], ctx)?;
            if let Some(escape) = args.get(2) {
                ctx.push_str(" escape ");
                q.expr(escape, ctx)?;
            }
            ctx.push(')');
            Ok(())
        }
        Function::Lower => call(q, "lower", args, ctx),
        Function::Upper => call(q, "upper", args, ctx),
        Function::Length => call(q, "length", args, ctx),
        Function::Abs => call(q, "abs", args, ctx),
        Function::Coalesce => call(q, "coalesce", args, ctx),
        Function::Count => call(q, "count", args, ctx),
        Function::Sum => call(q, "sum", args, ctx),
        Function::Avg => call(q, "avg", args, ctx),
        Function::Min => call(q, "min", args, ctx),
        Function::Max => call(q, "max", args, ctx),
        Function::CountAll => {
            ctx.push_str("count(*)");
            Ok(())
        }
        Function::CountDistinct => {
            ctx.push_str("count(distinct ");
            q.expr(&args[0], ctx)?;
            ctx.push(')');
            Ok(())
        }
        Function::Exists => match &args[0] {
            Node::Comprehension(c) => {
                ctx.push_str("exists");
                subquery(q, c, ctx)
            }
            other => Err(RelqError::malformed(format!(
                "exists expects a subquery, got {}",
                other.kind_name()
            ))),
        },
        Function::CurrentDate => {
            ctx.push_str("current_date");
            Ok(())
        }
        Function::Database => {
            ctx.push_str("database()");
            Ok(())
        }
        Function::User => {
            ctx.push_str("user()");
            Ok(())
        }
        Function::Named(name) => call(q, name, args, ctx),
    }
}

/// Inline literals go through the kind's delegate; bind literals become a
/// placeholder plus a setter.
pub fn literal<Q: QueryBuilder + ?Sized>(_q: &Q, lit: &Literal, ctx: &mut BuildContext) -> RelqResult<()> {
    let mappers = ctx.dialect().type_mappers();
    let delegate = mappers.delegate(lit.kind);
    if lit.bind {
        delegate.to_cell(&lit.value)?;
        ctx.add_setter(ParameterSetter::literal(mappers.shared(lit.kind), lit.value.clone()));
        ctx.push('?');
        return Ok(());
    }
    if lit.kind == ScalarKind::Blob && !lit.value.is_null() {
        return Err(ctx.unsupported("inline Blob literal"));
    }
    let text = delegate.value_to_sql_literal(&lit.value)?;
    ctx.push_str(&text);
    Ok(())
}

/// `row_number() over(order by ...)`.
pub fn row_number<Q: QueryBuilder + ?Sized>(
    q: &Q,
    by: &[(Node, Ordering)],
    ctx: &mut BuildContext,
) -> RelqResult<()> {
    ctx.push_str("row_number() over(order by ");
    if by.is_empty() {
        ctx.push_str("(select 1)");
    } else {
        orderings(q, by, ctx)?;
    }
    ctx.push(')');
    Ok(())
}

/// `(next value for "s")`.
pub fn next_value<Q: QueryBuilder + ?Sized>(q: &Q, sequence: &str, ctx: &mut BuildContext) -> RelqResult<()> {
    let text = format!("(next value for {})", q.quote_identifier(sequence));
    ctx.push_str(&text);
    Ok(())
}

/// `(current value for "s")`.
pub fn current_value<Q: QueryBuilder + ?Sized>(
    q: &Q,
    sequence: &str,
    ctx: &mut BuildContext,
) -> RelqResult<()> {
    let text = format!("(current value for {})", q.quote_identifier(sequence));
    ctx.push_str(&text);
    Ok(())
}
