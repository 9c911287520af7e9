//! SELECT construction on the default dialect.

use super::{one_generator, sql};
use crate::ast::{Comprehension, Function, Node, Ordering, ScalarKind, Value};
use crate::cursor::BoundParameter;
use crate::error::RelqError;
use crate::linearizer::ColumnLinearizer;
use crate::transpiler::{build_statement, DialectKind, ToSql};
use pretty_assertions::assert_eq;

const PG: DialectKind = DialectKind::Postgres;

#[test]
fn test_select_whole_row() {
    let (_, u) = one_generator();
    let c = Comprehension::new().from(u, Node::table("users"));
    assert_eq!(sql(&c, PG), "select * from \"users\" x1");
}

#[test]
fn test_select_with_all_clauses() {
    let (_, u) = one_generator();
    let c = Comprehension::new()
        .from(u, Node::table("users"))
        .filter(Node::eq(Node::column(u, "active"), Node::literal(true)))
        .order_by(Node::column(u, "name"), Ordering::asc())
        .select(Node::Product(vec![Node::column(u, "id"), Node::column(u, "name")]))
        .fetch(10)
        .offset(5);
    assert_eq!(
        sql(&c, PG),
        "select x1.\"id\", x1.\"name\" from \"users\" x1 where (x1.\"active\" = true) order by x1.\"name\" limit 10 offset 5"
    );
}

#[test]
fn test_fetch_and_offset_alone() {
    let (_, u) = one_generator();
    let base = Comprehension::new().from(u, Node::table("users"));
    assert_eq!(sql(&base.clone().fetch(3), PG), "select * from \"users\" x1 limit 3");
    assert_eq!(sql(&base.offset(7), PG), "select * from \"users\" x1 offset 7");
}

#[test]
fn test_named_projection() {
    let (_, u) = one_generator();
    let c = Comprehension::new()
        .from(u, Node::table("users"))
        .select(Node::Struct(vec![
            ("user_id".into(), Node::column(u, "id")),
            ("row".into(), Node::Ref(u)),
        ]));
    assert_eq!(sql(&c, PG), "select x1.\"id\" as \"user_id\", x1.* from \"users\" x1");
}

#[test]
fn test_bind_literal_and_query_parameter() {
    let (_, u) = one_generator();
    let c = Comprehension::new()
        .from(u, Node::table("users"))
        .filter(Node::eq(Node::column(u, "age"), Node::bind(ScalarKind::Int, 30)))
        .filter(Node::eq(Node::column(u, "name"), Node::param(0, ScalarKind::String)));

    let stmt = build_statement(&c, PG.profile()).unwrap();
    assert_eq!(
        stmt.sql,
        "select * from \"users\" x1 where (x1.\"age\" = ?) and (x1.\"name\" = ?)"
    );
    assert_eq!(stmt.setter_kinds(), vec![ScalarKind::Int, ScalarKind::String]);

    let params = stmt.parameters(&[Value::from("bob")]).unwrap();
    assert_eq!(
        params.params(),
        &[
            BoundParameter::Value(Value::Int(30)),
            BoundParameter::Value(Value::from("bob")),
        ]
    );
}

#[test]
fn test_null_argument_binds_typed_null() {
    let (_, u) = one_generator();
    let c = Comprehension::new()
        .from(u, Node::table("users"))
        .filter(Node::eq(Node::column(u, "age"), Node::param(0, ScalarKind::Int)));
    let stmt = build_statement(&c, PG.profile()).unwrap();
    let params = stmt.parameters(&[Value::Null]).unwrap();
    assert_eq!(params.null_count(), 1);
}

#[test]
fn test_subquery_generator() {
    let (mut table, v) = one_generator();
    let a = table.fresh("a");
    let inner = Comprehension::new()
        .from(v, Node::table("users"))
        .filter(Node::gt(Node::column(v, "age"), Node::literal(18)));
    let c = Comprehension::new()
        .from(a, Node::subquery(inner))
        .select(Node::Product(vec![Node::column(a, "name")]));
    assert_eq!(
        sql(&c, PG),
        "select x1.\"name\" from (select * from \"users\" x2 where (x2.\"age\" > 18)) x1"
    );
}

#[test]
fn test_correlated_exists() {
    let (mut table, u) = one_generator();
    let o = table.fresh("o");
    let orders = Comprehension::new()
        .from(o, Node::table("orders"))
        .filter(Node::eq(Node::column(o, "user_id"), Node::column(u, "id")));
    let c = Comprehension::new()
        .from(u, Node::table("users"))
        .filter(Node::apply(Function::Exists, vec![Node::subquery(orders)]));
    assert_eq!(
        sql(&c, PG),
        "select * from \"users\" x1 where exists(select * from \"orders\" x2 where (x2.\"user_id\" = x1.\"id\"))"
    );
}

#[test]
fn test_case_and_group_by() {
    let (_, u) = one_generator();
    let bucket = Node::Case {
        clauses: vec![(Node::gt(Node::column(u, "age"), Node::literal(17)), Node::literal("adult"))],
        otherwise: Some(Box::new(Node::literal("minor"))),
    };
    let c = Comprehension::new()
        .from(u, Node::table("users"))
        .group_by(bucket.clone())
        .select(Node::Struct(vec![
            ("bucket".into(), bucket),
            ("n".into(), Node::apply(Function::CountAll, vec![])),
        ]));
    assert_eq!(
        sql(&c, PG),
        "select (case when (x1.\"age\" > 17) then 'adult' else 'minor' end) as \"bucket\", count(*) as \"n\" \
         from \"users\" x1 group by (case when (x1.\"age\" > 17) then 'adult' else 'minor' end)"
    );
}

#[test]
fn test_operators_and_functions() {
    let (_, u) = one_generator();
    let c = Comprehension::new()
        .from(u, Node::table("users"))
        .filter(Node::apply(
            Function::In,
            vec![Node::column(u, "id"), Node::literal(1), Node::literal(2), Node::literal(3)],
        ))
        .filter(Node::apply(
            Function::Like,
            vec![Node::column(u, "name"), Node::literal("a!%%"), Node::literal("!")],
        ))
        .filter(Node::not(Node::is_null(Node::column(u, "email"))))
        .select(Node::Product(vec![
            Node::apply(Function::Upper, vec![Node::column(u, "name")]),
            Node::apply(Function::Concat, vec![Node::column(u, "first"), Node::column(u, "last")]),
        ]));
    assert_eq!(
        sql(&c, PG),
        "select upper(x1.\"name\"), (x1.\"first\" || x1.\"last\") from \"users\" x1 \
         where (x1.\"id\" in (1, 2, 3)) and (x1.\"name\" like 'a!%%' escape '!') and (not (x1.\"email\" is null))"
    );
}

#[test]
fn test_native_null_ordering() {
    let (_, u) = one_generator();
    let c = Comprehension::new()
        .from(u, Node::table("users"))
        .order_by(Node::column(u, "name"), Ordering::desc().nulls_last());
    assert_eq!(
        sql(&c, PG),
        "select * from \"users\" x1 order by x1.\"name\" desc nulls last"
    );
}

#[test]
fn test_sequence_functions() {
    let c = Comprehension::new().select(Node::Struct(vec![
        ("next".into(), Node::NextValue("user_seq".into())),
        ("db".into(), Node::apply(Function::Database, vec![])),
    ]));
    assert_eq!(
        sql(&c, PG),
        "select nextval('\"user_seq\"') as \"next\", current_database() as \"db\""
    );
}

#[test]
fn test_build_is_repeatable() {
    let (_, u) = one_generator();
    let c = Comprehension::new()
        .from(u, Node::table("users"))
        .filter(Node::eq(Node::column(u, "id"), Node::param(0, ScalarKind::Long)))
        .fetch(1);
    let first = build_statement(&c, PG.profile()).unwrap();
    let second = build_statement(&c, PG.profile()).unwrap();
    assert_eq!(first.sql, second.sql);
    assert_eq!(first.setter_kinds(), second.setter_kinds());
}

#[test]
fn test_to_sql_uses_default_dialect() {
    let (_, u) = one_generator();
    let c = Comprehension::new().from(u, Node::table("users"));
    assert_eq!(c.to_sql().unwrap().sql, sql(&c, PG));
}

#[test]
fn test_scope_violation_is_rejected() {
    let (mut table, u) = one_generator();
    let stray = table.fresh("stray");
    let c = Comprehension::new()
        .from(u, Node::table("users"))
        .select(Node::column(stray, "id"));
    assert!(matches!(build_statement(&c, PG.profile()), Err(RelqError::MalformedQuery(_))));
}

#[test]
fn test_missing_projection_needs_one_generator() {
    let (mut table, u) = one_generator();
    let o = table.fresh("o");
    let c = Comprehension::new()
        .from(u, Node::table("users"))
        .from(o, Node::table("orders"));
    assert!(matches!(build_statement(&c, PG.profile()), Err(RelqError::MalformedQuery(_))));
}

#[test]
fn test_wrong_arity_is_malformed() {
    let (_, u) = one_generator();
    let c = Comprehension::new()
        .from(u, Node::table("users"))
        .filter(Node::apply(Function::Eq, vec![Node::column(u, "id")]));
    assert!(matches!(build_statement(&c, PG.profile()), Err(RelqError::MalformedQuery(_))));
}

#[test]
fn test_table_in_expression_position() {
    let (_, u) = one_generator();
    let c = Comprehension::new()
        .from(u, Node::table("users"))
        .select(Node::Product(vec![Node::table("orders")]));
    let err = build_statement(&c, PG.profile()).unwrap_err();
    assert!(matches!(err, RelqError::UnsupportedConstruct { ref dialect, .. } if dialect == "postgres"));
}

#[test]
fn test_column_count_checks_linearizer() {
    let (_, u) = one_generator();
    let c = Comprehension::new()
        .from(u, Node::table("users"))
        .select(Node::Product(vec![Node::column(u, "id"), Node::column(u, "name")]));
    let stmt = build_statement(&c, PG.profile()).unwrap();
    assert_eq!(stmt.column_count, Some(2));

    let single = ColumnLinearizer::new(Node::column(u, "id"), ScalarKind::Int);
    assert!(matches!(
        stmt.verify_linearizer(&single),
        Err(RelqError::LinearizationArityMismatch { expected: 2, got: 1 })
    ));
}
