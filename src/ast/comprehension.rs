//! The canonical relational query node and its binder-aware utilities.

use super::{Node, Ordering, Symbol, SymbolTable};
use crate::error::{RelqError, RelqResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A node that introduces bound variables.
///
/// Renaming binders must go through `rewrite_generators` so references are
/// renamed with them; plain child rewriting never touches binders.
pub trait DefNode: Sized {
    /// Symbols bound by this node, in binding order.
    fn generator_symbols(&self) -> Vec<Symbol>;

    /// Rename bound symbols per `mapping`, together with every reference to
    /// them. Symbols absent from the mapping are left alone.
    fn rewrite_generators(&self, mapping: &HashMap<Symbol, Symbol>) -> Self;
}

/// One SELECT-shaped query: generators, filters, grouping, ordering,
/// projection and paging.
///
/// Later generators may reference earlier ones; every other clause may
/// reference any generator of this comprehension or an enclosing one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Comprehension {
    #[serde(default)]
    pub from: Vec<(Symbol, Node)>,
    /// Implicitly conjoined predicates.
    #[serde(default, rename = "where")]
    pub filters: Vec<Node>,
    #[serde(default)]
    pub group_by: Option<Node>,
    #[serde(default)]
    pub order_by: Vec<(Node, Ordering)>,
    /// Absent means the FROM row itself.
    #[serde(default)]
    pub select: Option<Node>,
    #[serde(default)]
    pub fetch: Option<u64>,
    #[serde(default)]
    pub offset: Option<u64>,
}

impl Comprehension {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from(mut self, sym: Symbol, source: Node) -> Self {
        self.from.push((sym, source));
        self
    }

    pub fn filter(mut self, predicate: Node) -> Self {
        self.filters.push(predicate);
        self
    }

    pub fn group_by(mut self, key: Node) -> Self {
        self.group_by = Some(key);
        self
    }

    pub fn order_by(mut self, key: Node, ordering: Ordering) -> Self {
        self.order_by.push((key, ordering));
        self
    }

    pub fn select(mut self, projection: Node) -> Self {
        self.select = Some(projection);
        self
    }

    pub fn fetch(mut self, n: u64) -> Self {
        self.fetch = Some(n);
        self
    }

    pub fn offset(mut self, n: u64) -> Self {
        self.offset = Some(n);
        self
    }

    /// Children in order: generator sources, filters, group key, ordering
    /// keys, projection.
    pub fn children(&self) -> Vec<&Node> {
        let mut out: Vec<&Node> = self.from.iter().map(|(_, n)| n).collect();
        out.extend(self.filters.iter());
        out.extend(self.group_by.iter());
        out.extend(self.order_by.iter().map(|(n, _)| n));
        out.extend(self.select.iter());
        out
    }

    pub fn child_names(&self) -> Vec<String> {
        let mut out: Vec<String> = self.from.iter().map(|(s, _)| format!("from {}", s)).collect();
        out.extend((0..self.filters.len()).map(|i| format!("where {}", i)));
        if self.group_by.is_some() {
            out.push("groupBy".to_string());
        }
        out.extend(self.order_by.iter().map(|(_, o)| format!("orderBy {}", o)));
        if self.select.is_some() {
            out.push("select".to_string());
        }
        out
    }

    pub fn rewrite_children(&self, children: Vec<Node>) -> RelqResult<Comprehension> {
        let expected = self.children().len();
        if children.len() != expected {
            return Err(RelqError::MalformedRewrite {
                node: "Comprehension",
                expected,
                got: children.len(),
            });
        }
        let mut it = children.into_iter();
        let mut next = || it.next().unwrap_or(Node::Product(Vec::new()));
        Ok(Comprehension {
            from: self.from.iter().map(|(s, _)| (*s, next())).collect(),
            filters: self.filters.iter().map(|_| next()).collect(),
            group_by: self.group_by.as_ref().map(|_| next()),
            order_by: self.order_by.iter().map(|(_, o)| (next(), *o)).collect(),
            select: self.select.as_ref().map(|_| next()),
            fetch: self.fetch,
            offset: self.offset,
        })
    }

    /// Rewrite generator sources through `from_fn` and every other
    /// expression position through `expr_fn`. Binders are untouched.
    pub fn map_from_and_exprs<F, G>(&self, mut from_fn: F, mut expr_fn: G) -> RelqResult<Comprehension>
    where
        F: FnMut(&Node) -> RelqResult<Node>,
        G: FnMut(&Node) -> RelqResult<Node>,
    {
        Ok(Comprehension {
            from: self
                .from
                .iter()
                .map(|(s, n)| Ok((*s, from_fn(n)?)))
                .collect::<RelqResult<_>>()?,
            filters: self.filters.iter().map(&mut expr_fn).collect::<RelqResult<_>>()?,
            group_by: self.group_by.as_ref().map(&mut expr_fn).transpose()?,
            order_by: self
                .order_by
                .iter()
                .map(|(n, o)| Ok((expr_fn(n)?, *o)))
                .collect::<RelqResult<_>>()?,
            select: self.select.as_ref().map(&mut expr_fn).transpose()?,
            fetch: self.fetch,
            offset: self.offset,
        })
    }

    /// Give every generator a fresh symbol from `table` and rename all
    /// references to match. Used before inlining a comprehension into
    /// another scope so its binders cannot capture anything.
    pub fn refresh_generators(&self, table: &mut SymbolTable) -> Comprehension {
        let mapping: HashMap<Symbol, Symbol> = self
            .generator_symbols()
            .into_iter()
            .map(|old| {
                let hint = table.hint(old).unwrap_or("t").to_string();
                (old, table.fresh(hint))
            })
            .collect();
        self.rewrite_generators(&mapping)
    }

    /// Visit every bound and referenced symbol, binders first per generator.
    pub fn visit_symbols(&self, f: &mut dyn FnMut(Symbol)) {
        for (sym, source) in &self.from {
            source.visit_symbols(f);
            f(*sym);
        }
        for child in self.children().into_iter().skip(self.from.len()) {
            child.visit_symbols(f);
        }
    }

    /// Check that every symbol reference is bound by this comprehension
    /// (by an earlier generator, for generator sources) or by an enclosing one.
    pub fn validate_scopes(&self) -> RelqResult<()> {
        let mut scope = Vec::new();
        check_comprehension(self, &mut scope)
    }
}

impl DefNode for Comprehension {
    fn generator_symbols(&self) -> Vec<Symbol> {
        self.from.iter().map(|(s, _)| *s).collect()
    }

    fn rewrite_generators(&self, mapping: &HashMap<Symbol, Symbol>) -> Self {
        let rename = |s: &Symbol| mapping.get(s).copied().unwrap_or(*s);
        Comprehension {
            from: self
                .from
                .iter()
                .map(|(s, n)| (rename(s), substitute(n, mapping)))
                .collect(),
            filters: self.filters.iter().map(|n| substitute(n, mapping)).collect(),
            group_by: self.group_by.as_ref().map(|n| substitute(n, mapping)),
            order_by: self
                .order_by
                .iter()
                .map(|(n, o)| (substitute(n, mapping), *o))
                .collect(),
            select: self.select.as_ref().map(|n| substitute(n, mapping)),
            fetch: self.fetch,
            offset: self.offset,
        }
    }
}

/// Rename symbol references inside an expression. A nested comprehension
/// that rebinds a mapped symbol shadows it for its own subtree.
fn substitute(node: &Node, mapping: &HashMap<Symbol, Symbol>) -> Node {
    match node {
        Node::Ref(sym) => Node::Ref(mapping.get(sym).copied().unwrap_or(*sym)),
        Node::Column { source, name } => Node::Column {
            source: mapping.get(source).copied().unwrap_or(*source),
            name: name.clone(),
        },
        Node::Comprehension(c) => {
            let shadowed = c.generator_symbols();
            if shadowed.iter().any(|s| mapping.contains_key(s)) {
                let narrowed: HashMap<Symbol, Symbol> = mapping
                    .iter()
                    .filter(|(k, _)| !shadowed.contains(k))
                    .map(|(k, v)| (*k, *v))
                    .collect();
                Node::Comprehension(Box::new(inner_substitute(c, &narrowed)))
            } else {
                Node::Comprehension(Box::new(inner_substitute(c, mapping)))
            }
        }
        other => {
            let children = other
                .children()
                .into_iter()
                .map(|child| substitute(child, mapping))
                .collect();
            // Same shape and count, so the rewrite cannot fail.
            other.rewrite_children(children).unwrap_or_else(|_| other.clone())
        }
    }
}

// References inside a nested comprehension, keeping its own binders.
fn inner_substitute(c: &Comprehension, mapping: &HashMap<Symbol, Symbol>) -> Comprehension {
    Comprehension {
        from: c
            .from
            .iter()
            .map(|(s, n)| (*s, substitute(n, mapping)))
            .collect(),
        filters: c.filters.iter().map(|n| substitute(n, mapping)).collect(),
        group_by: c.group_by.as_ref().map(|n| substitute(n, mapping)),
        order_by: c
            .order_by
            .iter()
            .map(|(n, o)| (substitute(n, mapping), *o))
            .collect(),
        select: c.select.as_ref().map(|n| substitute(n, mapping)),
        fetch: c.fetch,
        offset: c.offset,
    }
}

fn check_comprehension(c: &Comprehension, scope: &mut Vec<Symbol>) -> RelqResult<()> {
    let base = scope.len();
    for (sym, source) in &c.from {
        check_expr(source, scope)?;
        if scope[base..].contains(sym) {
            return Err(RelqError::malformed(format!(
                "symbol {} is bound twice in one comprehension",
                sym
            )));
        }
        scope.push(*sym);
    }
    for child in c.children().into_iter().skip(c.from.len()) {
        check_expr(child, scope)?;
    }
    scope.truncate(base);
    Ok(())
}

fn check_expr(node: &Node, scope: &mut Vec<Symbol>) -> RelqResult<()> {
    match node {
        Node::Comprehension(c) => check_comprehension(c, scope),
        Node::Ref(sym) | Node::Column { source: sym, .. } => {
            if scope.contains(sym) {
                Ok(())
            } else {
                Err(RelqError::malformed(format!(
                    "symbol {} is referenced outside the scope that binds it",
                    sym
                )))
            }
        }
        other => other
            .children()
            .into_iter()
            .try_for_each(|child| check_expr(child, scope)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Function, ScalarKind};

    fn users_query(table: &mut SymbolTable) -> (Comprehension, Symbol) {
        let u = table.fresh("u");
        let c = Comprehension::new()
            .from(u, Node::table("users"))
            .filter(Node::gt(Node::column(u, "age"), Node::literal(18)))
            .order_by(Node::column(u, "name"), Ordering::asc())
            .select(Node::Product(vec![
                Node::column(u, "id"),
                Node::column(u, "name"),
            ]));
        (c, u)
    }

    #[test]
    fn test_children_order() {
        let mut table = SymbolTable::new();
        let (c, u) = users_query(&mut table);
        let names = c.child_names();
        assert_eq!(
            names,
            vec![
                format!("from {}", u),
                "where 0".to_string(),
                "orderBy asc".to_string(),
                "select".to_string()
            ]
        );
        assert_eq!(c.children().len(), names.len());
        assert_eq!(c.children()[0], &Node::table("users"));
    }

    #[test]
    fn test_rewrite_children_round_trip() {
        let mut table = SymbolTable::new();
        let (c, _) = users_query(&mut table);
        let same = c
            .rewrite_children(c.children().into_iter().cloned().collect())
            .unwrap();
        assert_eq!(same, c);
        assert!(c.rewrite_children(Vec::new()).is_err());
    }

    #[test]
    fn test_identical_shapes_with_fresh_symbols_differ() {
        let mut table = SymbolTable::new();
        let (a, _) = users_query(&mut table);
        let (b, _) = users_query(&mut table);
        assert_ne!(a, b);
    }

    #[test]
    fn test_map_from_keeps_binders_and_references() {
        let mut table = SymbolTable::new();
        let (c, u) = users_query(&mut table);
        let mapped = c
            .map_from_and_exprs(|_| Ok(Node::table("people")), |n| Ok(n.clone()))
            .unwrap();
        assert_eq!(mapped.generator_symbols(), vec![u]);
        assert_eq!(mapped.from[0].1, Node::table("people"));
        assert!(mapped.validate_scopes().is_ok());
        assert_eq!(mapped.filters, c.filters);
    }

    #[test]
    fn test_refresh_generators_renames_references() {
        let mut table = SymbolTable::new();
        let (c, u) = users_query(&mut table);
        let fresh = c.refresh_generators(&mut table);

        let v = fresh.generator_symbols()[0];
        assert_ne!(u, v);
        assert_eq!(table.hint(v), Some("u"));
        assert!(fresh.validate_scopes().is_ok());

        let mut refs = Vec::new();
        for child in fresh.children() {
            refs.extend(child.symbol_refs());
        }
        assert!(refs.iter().all(|s| *s == v));
        assert_ne!(fresh, c);
    }

    #[test]
    fn test_rewrite_generators_respects_shadowing() {
        let mut table = SymbolTable::new();
        let u = table.fresh("u");
        let inner = Comprehension::new()
            .from(u, Node::table("orders"))
            .select(Node::column(u, "total"));
        let outer = Comprehension::new()
            .from(u, Node::table("users"))
            .select(Node::Product(vec![
                Node::column(u, "id"),
                Node::subquery(inner.clone()),
            ]));

        let v = table.fresh("v");
        let mapping = HashMap::from([(u, v)]);
        let renamed = outer.rewrite_generators(&mapping);

        assert_eq!(renamed.from[0].0, v);
        let Some(Node::Product(items)) = &renamed.select else {
            panic!("expected product projection");
        };
        assert_eq!(items[0], Node::column(v, "id"));
        assert_eq!(items[1], Node::subquery(inner));
    }

    #[test]
    fn test_validate_scopes() {
        let mut table = SymbolTable::new();
        let (c, _) = users_query(&mut table);
        assert!(c.validate_scopes().is_ok());

        let stray = table.fresh("stray");
        let bad = c.clone().filter(Node::is_null(Node::column(stray, "x")));
        assert!(matches!(bad.validate_scopes(), Err(RelqError::MalformedQuery(_))));

        // A generator may not reference a later one.
        let a = table.fresh("a");
        let b = table.fresh("b");
        let forward = Comprehension::new()
            .from(
                a,
                Node::subquery(
                    Comprehension::new()
                        .from(table.fresh("x"), Node::table("t"))
                        .filter(Node::eq(Node::column(b, "id"), Node::literal(1))),
                ),
            )
            .from(b, Node::table("u"));
        assert!(forward.validate_scopes().is_err());
    }

    #[test]
    fn test_correlated_subquery_sees_outer_scope() {
        let mut table = SymbolTable::new();
        let u = table.fresh("u");
        let o = table.fresh("o");
        let orders = Comprehension::new()
            .from(o, Node::table("orders"))
            .filter(Node::eq(Node::column(o, "user_id"), Node::column(u, "id")))
            .select(Node::apply(Function::CountAll, vec![]));
        let c = Comprehension::new()
            .from(u, Node::table("users"))
            .select(Node::Struct(vec![
                ("id".into(), Node::column(u, "id")),
                ("orders".into(), Node::subquery(orders)),
            ]))
            .filter(Node::eq(
                Node::column(u, "kind"),
                Node::param(0, ScalarKind::String),
            ));
        assert!(c.validate_scopes().is_ok());
    }
}
