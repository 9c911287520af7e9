//! Offset emulation with a numbered-row subquery, for databases whose
//! only native paging is `top n`.

use crate::ast::{Comprehension, Node, Ordering, SymbolTable};
use crate::error::{RelqError, RelqResult};
use tracing::trace;

/// Name of the row-number column added to the inner query.
pub const ROW_NUMBER_COLUMN: &str = "rownum";

/// Rewrite `c` (which has an offset) into
/// `select <cols> from (select <cols>, row_number() over(order by ...) as rownum ...) p
///  where p.rownum > d [and p.rownum <= d + t] order by p.rownum`.
///
/// Needs an explicit projection so the outer query can list the original
/// columns without the row number.
pub fn row_number_paging(c: &Comprehension, dialect: &str) -> RelqResult<Comprehension> {
    let offset = c.offset.unwrap_or(0);
    let mut table = SymbolTable::above_comprehension(c);
    let outer = table.fresh("paged");

    let whole_row = match &c.select {
        Some(Node::Struct(fields)) => fields.iter().any(|(_, n)| matches!(n, Node::Ref(_))),
        Some(Node::Product(items)) => items.iter().any(|n| matches!(n, Node::Ref(_))),
        _ => false,
    };
    if whole_row {
        return Err(RelqError::unsupported("offset paging over a whole-row projection item", dialect));
    }

    let (inner_fields, outer_select) = match &c.select {
        Some(Node::Struct(fields)) => {
            let outer_fields = fields
                .iter()
                .map(|(name, _)| (name.clone(), Node::column(outer, name.clone())))
                .collect();
            (fields.clone(), Node::Struct(outer_fields))
        }
        Some(Node::Product(items)) => {
            let names: Vec<String> = (1..=items.len()).map(|i| format!("c{}", i)).collect();
            let inner = names.iter().cloned().zip(items.iter().cloned()).collect();
            let outer_items = names.into_iter().map(|n| Node::column(outer, n)).collect();
            (inner, Node::Product(outer_items))
        }
        Some(Node::Ref(_)) | None => {
            return Err(RelqError::unsupported("offset paging without an explicit projection", dialect));
        }
        Some(single) => (
            vec![("c1".to_string(), single.clone())],
            Node::column(outer, "c1"),
        ),
    };

    let mut fields = inner_fields;
    fields.push((
        ROW_NUMBER_COLUMN.to_string(),
        Node::RowNumber(c.order_by.clone()),
    ));
    let inner = Comprehension {
        from: c.from.clone(),
        filters: c.filters.clone(),
        group_by: c.group_by.clone(),
        order_by: Vec::new(),
        select: Some(Node::Struct(fields)),
        fetch: None,
        offset: None,
    };

    let rownum = Node::column(outer, ROW_NUMBER_COLUMN);
    let mut paged = Comprehension::new()
        .from(outer, Node::subquery(inner))
        .filter(Node::gt(rownum.clone(), Node::literal(row_bound(offset)?)))
        .order_by(rownum.clone(), Ordering::asc())
        .select(outer_select);
    if let Some(fetch) = c.fetch {
        let last = offset
            .checked_add(fetch)
            .ok_or_else(|| RelqError::malformed(format!("fetch {} plus offset {} overflows", fetch, offset)))?;
        paged = paged.filter(Node::le(rownum, Node::literal(row_bound(last)?)));
    }
    trace!(offset, fetch = ?c.fetch, "row-number paging rewrite");
    Ok(paged)
}

/// Row numbers are BIGINT.
fn row_bound(n: u64) -> RelqResult<i64> {
    i64::try_from(n).map_err(|_| RelqError::malformed(format!("row bound {} exceeds BIGINT", n)))
}
