use super::{Comprehension, Ordering, ScalarKind, Symbol, Value};
use crate::error::{RelqError, RelqResult};
use serde::{Deserialize, Serialize};

/// Scalar functions and operators an [`Node::Apply`] can call.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Function {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
    Not,
    IsNull,
    /// `lhs in (a, b, ...)`
    In,
    /// `lhs like pattern [escape e]`
    Like,
    Plus,
    Minus,
    Times,
    Divide,
    Modulo,
    Concat,
    Lower,
    Upper,
    Length,
    Abs,
    Coalesce,
    Count,
    CountAll,
    CountDistinct,
    Sum,
    Avg,
    Min,
    Max,
    /// `exists(subquery)`
    Exists,
    CurrentDate,
    /// Name of the current database
    Database,
    /// Name of the current user
    User,
    /// A user-defined function, emitted verbatim as `name(args)`
    Named(String),
}

impl Function {
    /// Accepted argument count as `(min, max)`; `None` means unbounded.
    pub fn arity(&self) -> (usize, Option<usize>) {
        use Function::*;
        match self {
            Eq | Ne | Lt | Le | Gt | Ge | Plus | Minus | Times | Divide | Modulo => (2, Some(2)),
            And | Or | Concat | In => (2, None),
            Like => (2, Some(3)),
            Not | IsNull | Lower | Upper | Length | Abs | Exists => (1, Some(1)),
            Count | CountDistinct | Sum | Avg | Min | Max => (1, Some(1)),
            Coalesce => (1, None),
            CountAll | CurrentDate | Database | User => (0, Some(0)),
            Named(_) => (0, None),
        }
    }

    pub fn check_arity(&self, got: usize) -> RelqResult<()> {
        let (min, max) = self.arity();
        if got < min || max.is_some_and(|m| got > m) {
            let expected = match max {
                Some(m) if m == min => format!("{}", min),
                Some(m) => format!("{} to {}", min, m),
                None => format!("at least {}", min),
            };
            return Err(RelqError::malformed(format!(
                "{:?} expects {} arguments, got {}",
                self, expected, got
            )));
        }
        Ok(())
    }
}

/// A constant. Inline literals are rendered into the SQL text by the
/// kind's type mapper; bind literals become `?` plus a parameter setter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Literal {
    pub kind: ScalarKind,
    pub value: Value,
    #[serde(default)]
    pub bind: bool,
}

/// One node of the query AST.
///
/// Nodes are immutable values with structural equality, except that
/// [`Symbol`]s compare by identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Node {
    /// A SELECT-shaped query.
    Comprehension(Box<Comprehension>),
    /// A base table, only valid as a generator source.
    Table { name: String },
    /// The whole row of a generator.
    Ref(Symbol),
    /// A column of a generator's row.
    Column { source: Symbol, name: String },
    Literal(Literal),
    /// Runtime argument supplied at execution time, by position.
    QueryParameter { index: usize, kind: ScalarKind },
    Apply { function: Function, args: Vec<Node> },
    /// `case when c then v ... else e end`
    Case {
        clauses: Vec<(Node, Node)>,
        otherwise: Option<Box<Node>>,
    },
    /// Positional projection.
    Product(Vec<Node>),
    /// Named projection.
    Struct(Vec<(String, Node)>),
    /// `row_number() over (order by ...)`
    RowNumber(Vec<(Node, Ordering)>),
    /// Next value of a sequence.
    NextValue(String),
    /// Current value of a sequence.
    CurrentValue(String),
}

impl Node {
    pub fn table(name: impl Into<String>) -> Self {
        Node::Table { name: name.into() }
    }

    pub fn column(source: Symbol, name: impl Into<String>) -> Self {
        Node::Column {
            source,
            name: name.into(),
        }
    }

    /// Inline literal typed by the value's natural kind (NULL is a string).
    pub fn literal(value: impl Into<Value>) -> Self {
        let value = value.into();
        let kind = value.natural_kind().unwrap_or(ScalarKind::String);
        Node::Literal(Literal {
            kind,
            value,
            bind: false,
        })
    }

    pub fn typed_literal(kind: ScalarKind, value: impl Into<Value>) -> Self {
        Node::Literal(Literal {
            kind,
            value: value.into(),
            bind: false,
        })
    }

    /// Literal sent as a bound parameter instead of inline text.
    pub fn bind(kind: ScalarKind, value: impl Into<Value>) -> Self {
        Node::Literal(Literal {
            kind,
            value: value.into(),
            bind: true,
        })
    }

    pub fn param(index: usize, kind: ScalarKind) -> Self {
        Node::QueryParameter { index, kind }
    }

    pub fn apply(function: Function, args: Vec<Node>) -> Self {
        Node::Apply { function, args }
    }

    pub fn eq(left: Node, right: Node) -> Self {
        Self::apply(Function::Eq, vec![left, right])
    }

    pub fn ne(left: Node, right: Node) -> Self {
        Self::apply(Function::Ne, vec![left, right])
    }

    pub fn lt(left: Node, right: Node) -> Self {
        Self::apply(Function::Lt, vec![left, right])
    }

    pub fn le(left: Node, right: Node) -> Self {
        Self::apply(Function::Le, vec![left, right])
    }

    pub fn gt(left: Node, right: Node) -> Self {
        Self::apply(Function::Gt, vec![left, right])
    }

    pub fn ge(left: Node, right: Node) -> Self {
        Self::apply(Function::Ge, vec![left, right])
    }

    pub fn and(left: Node, right: Node) -> Self {
        Self::apply(Function::And, vec![left, right])
    }

    pub fn or(left: Node, right: Node) -> Self {
        Self::apply(Function::Or, vec![left, right])
    }

    pub fn not(node: Node) -> Self {
        Self::apply(Function::Not, vec![node])
    }

    pub fn is_null(node: Node) -> Self {
        Self::apply(Function::IsNull, vec![node])
    }

    pub fn subquery(c: Comprehension) -> Self {
        Node::Comprehension(Box::new(c))
    }

    /// Diagnostic identity of the node shape.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Node::Comprehension(_) => "Comprehension",
            Node::Table { .. } => "Table",
            Node::Ref(_) => "Ref",
            Node::Column { .. } => "Column",
            Node::Literal(_) => "Literal",
            Node::QueryParameter { .. } => "QueryParameter",
            Node::Apply { .. } => "Apply",
            Node::Case { .. } => "Case",
            Node::Product(_) => "Product",
            Node::Struct(_) => "Struct",
            Node::RowNumber(_) => "RowNumber",
            Node::NextValue(_) => "NextValue",
            Node::CurrentValue(_) => "CurrentValue",
        }
    }

    /// One-line description: kind plus the node's own (non-child) fields.
    pub fn label(&self) -> String {
        match self {
            Node::Table { name } => format!("Table \"{}\"", name),
            Node::Ref(sym) => format!("Ref {}", sym),
            Node::Column { source, name } => format!("Column {}.\"{}\"", source, name),
            Node::Literal(lit) => {
                let bind = if lit.bind { " bind" } else { "" };
                format!("Literal {}: {}{}", lit.value, lit.kind, bind)
            }
            Node::QueryParameter { index, kind } => format!("QueryParameter #{}: {}", index, kind),
            Node::Apply { function, .. } => format!("Apply {:?}", function),
            Node::NextValue(seq) => format!("NextValue \"{}\"", seq),
            Node::CurrentValue(seq) => format!("CurrentValue \"{}\"", seq),
            other => other.kind_name().to_string(),
        }
    }

    /// Direct children, in a fixed order shared with `child_names` and
    /// `rewrite_children`.
    pub fn children(&self) -> Vec<&Node> {
        match self {
            Node::Comprehension(c) => c.children(),
            Node::Table { .. }
            | Node::Ref(_)
            | Node::Column { .. }
            | Node::Literal(_)
            | Node::QueryParameter { .. }
            | Node::NextValue(_)
            | Node::CurrentValue(_) => Vec::new(),
            Node::Apply { args, .. } => args.iter().collect(),
            Node::Case { clauses, otherwise } => {
                let mut out: Vec<&Node> = clauses.iter().flat_map(|(c, v)| [c, v]).collect();
                if let Some(e) = otherwise {
                    out.push(e);
                }
                out
            }
            Node::Product(items) => items.iter().collect(),
            Node::Struct(fields) => fields.iter().map(|(_, n)| n).collect(),
            Node::RowNumber(by) => by.iter().map(|(n, _)| n).collect(),
        }
    }

    /// Debug labels aligned positionally with `children()`.
    pub fn child_names(&self) -> Vec<String> {
        match self {
            Node::Comprehension(c) => c.child_names(),
            Node::Apply { args, .. } => (0..args.len()).map(|i| format!("arg {}", i)).collect(),
            Node::Case { clauses, otherwise } => {
                let mut out: Vec<String> = (0..clauses.len())
                    .flat_map(|i| [format!("when {}", i), format!("then {}", i)])
                    .collect();
                if otherwise.is_some() {
                    out.push("else".to_string());
                }
                out
            }
            Node::Product(items) => (1..=items.len()).map(|i| format!("_{}", i)).collect(),
            Node::Struct(fields) => fields.iter().map(|(name, _)| name.clone()).collect(),
            Node::RowNumber(by) => by.iter().map(|(_, o)| format!("by {}", o)).collect(),
            _ => Vec::new(),
        }
    }

    /// Same node shape with children replaced positionally.
    pub fn rewrite_children(&self, children: Vec<Node>) -> RelqResult<Node> {
        let expected = self.children().len();
        if children.len() != expected {
            return Err(RelqError::MalformedRewrite {
                node: self.kind_name(),
                expected,
                got: children.len(),
            });
        }
        let mut it = children.into_iter();
        // Count was checked above, so the iterator never runs dry.
        let mut next = || it.next().unwrap_or(Node::Product(Vec::new()));
        Ok(match self {
            Node::Comprehension(c) => {
                let n = c.children().len();
                let kids = (0..n).map(|_| next()).collect();
                Node::Comprehension(Box::new(c.rewrite_children(kids)?))
            }
            Node::Apply { function, args } => Node::Apply {
                function: function.clone(),
                args: args.iter().map(|_| next()).collect(),
            },
            Node::Case { clauses, otherwise } => Node::Case {
                clauses: clauses.iter().map(|_| (next(), next())).collect(),
                otherwise: otherwise.as_ref().map(|_| Box::new(next())),
            },
            Node::Product(items) => Node::Product(items.iter().map(|_| next()).collect()),
            Node::Struct(fields) => {
                Node::Struct(fields.iter().map(|(name, _)| (name.clone(), next())).collect())
            }
            Node::RowNumber(by) => Node::RowNumber(by.iter().map(|(_, o)| (next(), *o)).collect()),
            leaf => leaf.clone(),
        })
    }

    /// Rewrite every direct child through `f`.
    pub fn map_children<F>(&self, mut f: F) -> RelqResult<Node>
    where
        F: FnMut(&Node) -> RelqResult<Node>,
    {
        let children = self
            .children()
            .into_iter()
            .map(&mut f)
            .collect::<RelqResult<Vec<_>>>()?;
        self.rewrite_children(children)
    }

    /// Visit every symbol bound or referenced anywhere in this subtree.
    pub fn visit_symbols(&self, f: &mut dyn FnMut(Symbol)) {
        match self {
            Node::Comprehension(c) => c.visit_symbols(f),
            Node::Ref(sym) | Node::Column { source: sym, .. } => f(*sym),
            other => {
                for child in other.children() {
                    child.visit_symbols(f);
                }
            }
        }
    }

    /// Symbols referenced (not bound) anywhere in this subtree, in visit order.
    pub fn symbol_refs(&self) -> Vec<Symbol> {
        let mut out = Vec::new();
        self.collect_refs(&mut out);
        out
    }

    fn collect_refs(&self, out: &mut Vec<Symbol>) {
        match self {
            Node::Ref(sym) | Node::Column { source: sym, .. } => out.push(*sym),
            other => {
                for child in other.children() {
                    child.collect_refs(out);
                }
            }
        }
    }

    fn fmt_tree(
        &self,
        f: &mut std::fmt::Formatter<'_>,
        label: Option<&str>,
        depth: usize,
    ) -> std::fmt::Result {
        let indent = "  ".repeat(depth);
        match label {
            Some(l) => writeln!(f, "{}{}: {}", indent, l, self.label())?,
            None => writeln!(f, "{}{}", indent, self.label())?,
        }
        if let Node::Comprehension(c) = self {
            if let Some(n) = c.fetch {
                writeln!(f, "{}  fetch {}", indent, n)?;
            }
            if let Some(n) = c.offset {
                writeln!(f, "{}  offset {}", indent, n)?;
            }
        }
        for (child, name) in self.children().into_iter().zip(self.child_names()) {
            child.fmt_tree(f, Some(&name), depth + 1)?;
        }
        Ok(())
    }
}

impl std::fmt::Display for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.fmt_tree(f, None, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::SymbolTable;

    #[test]
    fn test_children_and_names_align() {
        let node = Node::Case {
            clauses: vec![(Node::literal(true), Node::literal(1))],
            otherwise: Some(Box::new(Node::literal(0))),
        };
        assert_eq!(node.children().len(), 3);
        assert_eq!(node.child_names(), vec!["when 0", "then 0", "else"]);
    }

    #[test]
    fn test_rewrite_children_replaces_positionally() {
        let node = Node::gt(Node::literal(1), Node::literal(2));
        let swapped = node
            .rewrite_children(vec![Node::literal(2), Node::literal(1)])
            .unwrap();
        assert_eq!(swapped, Node::gt(Node::literal(2), Node::literal(1)));
    }

    #[test]
    fn test_rewrite_children_rejects_count_mismatch() {
        let node = Node::eq(Node::literal(1), Node::literal(2));
        let err = node.rewrite_children(vec![Node::literal(1)]).unwrap_err();
        assert!(matches!(
            err,
            RelqError::MalformedRewrite {
                node: "Apply",
                expected: 2,
                got: 1
            }
        ));

        let leaf = Node::table("users");
        assert!(leaf.rewrite_children(vec![Node::literal(1)]).is_err());
        assert_eq!(leaf.rewrite_children(Vec::new()).unwrap(), leaf);
    }

    #[test]
    fn test_symbol_identity_in_equality() {
        let mut table = SymbolTable::new();
        let a = table.fresh("t");
        let b = table.fresh("t");
        assert_eq!(Node::column(a, "id"), Node::column(a, "id"));
        assert_ne!(Node::column(a, "id"), Node::column(b, "id"));
    }

    #[test]
    fn test_function_arity() {
        assert!(Function::Eq.check_arity(2).is_ok());
        assert!(Function::Eq.check_arity(3).is_err());
        assert!(Function::Like.check_arity(3).is_ok());
        assert!(Function::And.check_arity(5).is_ok());
        assert!(Function::CountAll.check_arity(1).is_err());
    }

    #[test]
    fn test_tree_dump_uses_child_names() {
        let mut table = SymbolTable::new();
        let u = table.fresh("u");
        let node = Node::eq(Node::column(u, "id"), Node::literal(1));
        let dump = node.to_string();
        assert!(dump.starts_with("Apply Eq\n"));
        assert!(dump.contains("  arg 0: Column s0.\"id\""));
        assert!(dump.contains("  arg 1: Literal 1: int"));
    }
}
