use chrono::{NaiveDate, NaiveTime};
use relq::linearizer::{bind, read_row, update_row, ListBuilder, MAX_TUPLE_ARITY};
use relq::prelude::*;
use rust_decimal::Decimal;
use std::sync::Arc;
use uuid::Uuid;

fn user_linearizer(symbols: &mut SymbolTable) -> ProductLinearizer {
    let u = symbols.fresh("u");
    let fields: Vec<Box<dyn RecordLinearizer>> = vec![
        Box::new(ColumnLinearizer::new(Node::column(u, "name"), ScalarKind::String)),
        Box::new(ColumnLinearizer::new(Node::column(u, "age"), ScalarKind::Int)),
        Box::new(ColumnLinearizer::new(Node::column(u, "active"), ScalarKind::Boolean)),
        Box::new(ColumnLinearizer::new(Node::column(u, "key"), ScalarKind::Uuid)),
        Box::new(ColumnLinearizer::new(Node::column(u, "born"), ScalarKind::Date)),
        Box::new(ColumnLinearizer::new(Node::column(u, "avatar"), ScalarKind::Bytes)),
        Box::new(ColumnLinearizer::new(Node::column(u, "nick"), ScalarKind::String).optional()),
        Box::new(ColumnLinearizer::new(Node::column(u, "rank"), ScalarKind::Short)),
        Box::new(ColumnLinearizer::new(Node::column(u, "visits"), ScalarKind::Long)),
        Box::new(ColumnLinearizer::new(Node::column(u, "ratio"), ScalarKind::Float)),
        Box::new(ColumnLinearizer::new(Node::column(u, "score"), ScalarKind::Double)),
        Box::new(ColumnLinearizer::new(Node::column(u, "balance"), ScalarKind::Decimal)),
        Box::new(ColumnLinearizer::new(Node::column(u, "wakes"), ScalarKind::Time)),
        Box::new(ColumnLinearizer::new(Node::column(u, "joined"), ScalarKind::Timestamp)),
        Box::new(ColumnLinearizer::new(Node::column(u, "resume"), ScalarKind::Blob)),
    ];
    ProductLinearizer::new(fields).unwrap()
}

fn sample_user() -> Datum {
    Datum::Record(vec![
        Datum::scalar("ann"),
        Datum::scalar(30),
        Datum::scalar(true),
        Datum::scalar(Uuid::from_u128(0xfeed)),
        Datum::scalar(NaiveDate::from_ymd_opt(1990, 4, 1).unwrap()),
        Datum::scalar(vec![0xde_u8, 0xad]),
        Datum::null(),
        Datum::scalar(3_i16),
        Datum::scalar(9_000_000_000_i64),
        Datum::scalar(0.5_f32),
        Datum::scalar(2.25_f64),
        Datum::scalar(Decimal::new(1999, 2)),
        Datum::scalar(NaiveTime::from_hms_opt(6, 30, 0).unwrap()),
        Datum::scalar(
            NaiveDate::from_ymd_opt(2021, 7, 9)
                .unwrap()
                .and_hms_opt(12, 0, 1)
                .unwrap(),
        ),
        Datum::scalar(vec![1_u8, 2, 3, 4]),
    ])
}

#[test]
fn test_bind_then_read_is_identity_on_every_dialect() {
    let mut symbols = SymbolTable::new();
    let lin = user_linearizer(&mut symbols);
    let value = sample_user();

    for kind in DialectKind::ALL {
        let dialect = kind.profile();
        let params = bind(dialect, &lin, Some(&value)).unwrap();
        assert_eq!(params.len(), lin.width());
        assert_eq!(params.null_count(), 1);

        let mut row = params.into_row();
        let read = read_row(dialect, &lin, &mut row).unwrap();
        assert_eq!(read, value, "round trip through {}", kind);
    }
}

#[test]
fn test_binding_none_nulls_every_column() {
    let mut symbols = SymbolTable::new();
    let lin = user_linearizer(&mut symbols);
    let params = bind(DialectKind::Postgres.profile(), &lin, None).unwrap();
    assert_eq!(params.null_count(), lin.width());
}

#[test]
fn test_update_in_place() {
    let mut symbols = SymbolTable::new();
    let lin = user_linearizer(&mut symbols);
    let dialect = DialectKind::H2.profile();

    let mut row = bind(dialect, &lin, Some(&sample_user())).unwrap().into_row();
    let renamed = match sample_user() {
        Datum::Record(mut fields) => {
            fields[0] = Datum::scalar("bea");
            fields[6] = Datum::scalar("b");
            Datum::Record(fields)
        }
        other => other,
    };
    update_row(dialect, &lin, &mut row, &renamed).unwrap();
    row.rewind();
    assert_eq!(read_row(dialect, &lin, &mut row).unwrap(), renamed);

    let sqlite = DialectKind::Sqlite.profile();
    assert!(matches!(
        update_row(sqlite, &lin, &mut row, &renamed),
        Err(RelqError::UnsupportedCapability {
            capability: Capability::MutableCursor,
            ..
        })
    ));
}

#[test]
fn test_width_mismatch() {
    let mut symbols = SymbolTable::new();
    let lin = user_linearizer(&mut symbols);
    let mut short = ResultRow::new(vec![Value::from("ann"), Value::Int(1)]);
    assert!(matches!(
        read_row(DialectKind::Postgres.profile(), &lin, &mut short),
        Err(RelqError::LinearizationArityMismatch { expected: 15, got: 2 })
    ));
}

#[test]
fn test_collection_of_rows() {
    let mut symbols = SymbolTable::new();
    let t = symbols.fresh("t");
    let element: Arc<dyn RecordLinearizer> =
        Arc::new(ColumnLinearizer::new(Node::column(t, "tag"), ScalarKind::String));
    let tags = CollectionLinearizer::new(element, Arc::new(ListBuilder));

    let rows = ["a", "b", "a"].map(|s| ResultRow::new(vec![Value::from(s)]));
    let list = tags.materialize(DialectKind::Postgres.profile(), rows).unwrap();
    assert_eq!(
        list,
        Datum::Collection(vec![Datum::scalar("a"), Datum::scalar("b"), Datum::scalar("a")])
    );
}

fn counters(symbols: &mut SymbolTable, arity: usize) -> RelqResult<ProductLinearizer> {
    let t = symbols.fresh("t");
    let fields: Vec<Box<dyn RecordLinearizer>> = (0..arity)
        .map(|i| {
            Box::new(ColumnLinearizer::new(Node::column(t, format!("c{}", i)), ScalarKind::Long))
                as Box<dyn RecordLinearizer>
        })
        .collect();
    ProductLinearizer::new(fields)
}

#[test]
fn test_widest_record_round_trips() {
    let mut symbols = SymbolTable::new();
    let lin = counters(&mut symbols, MAX_TUPLE_ARITY).unwrap();
    let value = Datum::Record((0..MAX_TUPLE_ARITY as i64).map(|n| Datum::scalar(n * 10)).collect());

    for kind in DialectKind::ALL {
        let dialect = kind.profile();
        let params = bind(dialect, &lin, Some(&value)).unwrap();
        assert_eq!(params.len(), MAX_TUPLE_ARITY);
        let mut row = params.into_row();
        assert_eq!(read_row(dialect, &lin, &mut row).unwrap(), value, "{}", kind);
    }

    let none = bind(DialectKind::Derby.profile(), &lin, None).unwrap();
    assert_eq!(none.null_count(), MAX_TUPLE_ARITY);

    assert!(matches!(
        counters(&mut symbols, MAX_TUPLE_ARITY + 1),
        Err(RelqError::ArityExceeded { arity: 23, max: 22 })
    ));
}
