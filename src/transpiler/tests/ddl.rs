//! Table, index and sequence DDL.

use crate::ast::ScalarKind;
use crate::error::RelqError;
use crate::transpiler::sql::postgres::PostgresDialect;
use crate::transpiler::{
    Capability, ColumnDef, Dialect, DialectKind, ForeignKeyAction, ForeignKeyDef, SequenceDef, TableDef,
};
use pretty_assertions::assert_eq;

fn users() -> TableDef {
    TableDef::new("users")
        .column(ColumnDef::new("id", ScalarKind::Int).primary_key().auto_increment())
        .column(ColumnDef::new("name", ScalarKind::String))
        .column(ColumnDef::new("nick", ScalarKind::String).nullable())
}

fn orders() -> TableDef {
    TableDef::new("orders")
        .column(ColumnDef::new("id", ScalarKind::Long).primary_key())
        .column(ColumnDef::new("user_id", ScalarKind::Int))
        .foreign_key(ForeignKeyDef {
            name: "fk_user".into(),
            columns: vec!["user_id".into()],
            target_table: "users".into(),
            target_columns: vec!["id".into()],
            on_update: ForeignKeyAction::NoAction,
            on_delete: ForeignKeyAction::Cascade,
        })
        .index("ix_user", &["user_id"], false)
}

fn create_sql(kind: DialectKind, table: &TableDef) -> Vec<String> {
    let dialect = kind.profile();
    dialect.table_ddl().create_statements(dialect, table).unwrap()
}

fn drop_sql(kind: DialectKind, table: &TableDef) -> Vec<String> {
    let dialect = kind.profile();
    dialect.table_ddl().drop_statements(dialect, table).unwrap()
}

#[test]
fn test_auto_increment_per_dialect() {
    let expected = [
        (
            DialectKind::Postgres,
            "create table \"users\" (\"id\" SERIAL NOT NULL PRIMARY KEY, \"name\" VARCHAR(254) NOT NULL, \"nick\" VARCHAR(254))",
        ),
        (
            DialectKind::MySql,
            "create table `users` (`id` INTEGER NOT NULL AUTO_INCREMENT PRIMARY KEY, `name` VARCHAR(254) NOT NULL, `nick` VARCHAR(254))",
        ),
        (
            DialectKind::Sqlite,
            "create table \"users\" (\"id\" INTEGER PRIMARY KEY AUTOINCREMENT, \"name\" VARCHAR(254) NOT NULL, \"nick\" VARCHAR(254))",
        ),
        (
            DialectKind::H2,
            "create table \"users\" (\"id\" INTEGER NOT NULL AUTO_INCREMENT PRIMARY KEY, \"name\" VARCHAR(254) NOT NULL, \"nick\" VARCHAR(254))",
        ),
        (
            DialectKind::Derby,
            "create table \"users\" (\"id\" INTEGER NOT NULL GENERATED BY DEFAULT AS IDENTITY PRIMARY KEY, \"name\" VARCHAR(254) NOT NULL, \"nick\" VARCHAR(254))",
        ),
        (
            DialectKind::Access,
            "create table [users] ([id] COUNTER NOT NULL PRIMARY KEY, [name] VARCHAR(254) NOT NULL, [nick] VARCHAR(254))",
        ),
        (
            DialectKind::SqlServer,
            "create table [users] ([id] INTEGER NOT NULL IDENTITY PRIMARY KEY, [name] VARCHAR(254) NOT NULL, [nick] VARCHAR(254))",
        ),
    ];
    for (kind, sql) in expected {
        assert_eq!(create_sql(kind, &users()), vec![sql.to_string()], "{}", kind);
    }
}

#[test]
fn test_foreign_keys_and_indexes() {
    assert_eq!(
        create_sql(DialectKind::Postgres, &orders()),
        vec![
            "create table \"orders\" (\"id\" BIGINT NOT NULL PRIMARY KEY, \"user_id\" INTEGER NOT NULL)".to_string(),
            "alter table \"orders\" add constraint \"fk_user\" foreign key(\"user_id\") references \"users\"(\"id\") \
             on update NO ACTION on delete CASCADE"
                .to_string(),
            "create index \"ix_user\" on \"orders\" (\"user_id\")".to_string(),
        ]
    );
    assert_eq!(
        drop_sql(DialectKind::Postgres, &orders()),
        vec![
            "alter table \"orders\" drop constraint \"fk_user\"".to_string(),
            "drop table \"orders\"".to_string(),
        ]
    );
    assert_eq!(
        drop_sql(DialectKind::MySql, &orders())[0],
        "alter table `orders` drop foreign key `fk_user`"
    );
}

#[test]
fn test_sqlite_keeps_constraints_inline() {
    assert_eq!(
        create_sql(DialectKind::Sqlite, &orders()),
        vec![
            "create table \"orders\" (\"id\" BIGINT NOT NULL PRIMARY KEY, \"user_id\" INTEGER NOT NULL, \
             constraint \"fk_user\" foreign key(\"user_id\") references \"users\"(\"id\") on update NO ACTION on delete CASCADE)"
                .to_string(),
            "create index \"ix_user\" on \"orders\" (\"user_id\")".to_string(),
        ]
    );
    assert_eq!(drop_sql(DialectKind::Sqlite, &orders()), vec!["drop table \"orders\"".to_string()]);
}

#[test]
fn test_composite_primary_key_and_unique_index() {
    let table = TableDef::new("pairs")
        .column(ColumnDef::new("a", ScalarKind::Int))
        .column(ColumnDef::new("b", ScalarKind::Int))
        .primary_key("pk_pairs", &["a", "b"])
        .index("ix_b", &["b"], true);
    assert_eq!(
        create_sql(DialectKind::H2, &table),
        vec![
            "create table \"pairs\" (\"a\" INTEGER NOT NULL, \"b\" INTEGER NOT NULL, constraint \"pk_pairs\" primary key (\"a\", \"b\"))"
                .to_string(),
            "create unique index \"ix_b\" on \"pairs\" (\"b\")".to_string(),
        ]
    );
}

#[test]
fn test_postgres_lob_triggers() {
    let docs = TableDef::new("docs")
        .column(ColumnDef::new("id", ScalarKind::Int).primary_key())
        .column(ColumnDef::new("data", ScalarKind::Blob));
    assert_eq!(
        create_sql(DialectKind::Postgres, &docs),
        vec![
            "create table \"docs\" (\"id\" INTEGER NOT NULL PRIMARY KEY, \"data\" lo NOT NULL)".to_string(),
            "create trigger \"docs__data_lob\" before update or delete on \"docs\" for each row execute procedure lo_manage(\"data\")"
                .to_string(),
        ]
    );
    assert_eq!(
        drop_sql(DialectKind::Postgres, &docs),
        vec![
            "drop trigger \"docs__data_lob\" on \"docs\"".to_string(),
            "drop table \"docs\"".to_string(),
        ]
    );

    let plain = PostgresDialect::new().with_lob_triggers(false);
    assert_eq!(plain.table_ddl().create_statements(&plain, &docs).unwrap().len(), 1);
}

#[test]
fn test_column_defaults() {
    let table = TableDef::new("flags").column(ColumnDef::new("active", ScalarKind::Boolean).with_default(true));
    assert_eq!(
        create_sql(DialectKind::Postgres, &table),
        vec!["create table \"flags\" (\"active\" BOOLEAN DEFAULT true NOT NULL)".to_string()]
    );
    assert_eq!(
        create_sql(DialectKind::SqlServer, &table),
        vec!["create table [flags] ([active] BIT DEFAULT 1 NOT NULL)".to_string()]
    );

    let access = DialectKind::Access.profile();
    let err = access.table_ddl().create_statements(access, &table).unwrap_err();
    assert!(matches!(
        err,
        RelqError::UnsupportedCapability {
            capability: Capability::ColumnDefaults,
            ..
        }
    ));
}

#[test]
fn test_type_capabilities_gate_columns() {
    let sqlite = DialectKind::Sqlite.profile();
    let blob = TableDef::new("t").column(ColumnDef::new("data", ScalarKind::Blob));
    let decimal = TableDef::new("t").column(ColumnDef::new("price", ScalarKind::Decimal));
    assert!(matches!(
        sqlite.table_ddl().create_statements(sqlite, &blob),
        Err(RelqError::UnsupportedCapability {
            capability: Capability::TypeBlob,
            ..
        })
    ));
    assert!(matches!(
        sqlite.table_ddl().create_statements(sqlite, &decimal),
        Err(RelqError::UnsupportedCapability {
            capability: Capability::TypeBigDecimal,
            ..
        })
    ));

    let explicit = TableDef::new("t").column(ColumnDef::new("price", ScalarKind::Int).db_type("NUMERIC(8)"));
    assert_eq!(
        create_sql(DialectKind::Sqlite, &explicit),
        vec!["create table \"t\" (\"price\" NUMERIC(8) NOT NULL)".to_string()]
    );
}

#[test]
fn test_sequences() {
    let full = SequenceDef::new("user_seq").start(1).increment(1).min(1).max(100).cycle();
    let pg = DialectKind::Postgres.profile();
    assert_eq!(
        pg.sequence_ddl().create_statements(pg, &full).unwrap(),
        vec!["create sequence \"user_seq\" start with 1 increment by 1 minvalue 1 maxvalue 100 cycle".to_string()]
    );
    assert_eq!(
        pg.sequence_ddl().drop_statements(pg, &full).unwrap(),
        vec!["drop sequence \"user_seq\"".to_string()]
    );

    let derby = DialectKind::Derby.profile();
    assert_eq!(
        derby
            .sequence_ddl()
            .create_statements(derby, &SequenceDef::new("user_seq").start(10).cycle())
            .unwrap(),
        vec!["create sequence \"user_seq\" as BIGINT start with 10 cycle".to_string()]
    );

    let mysql = DialectKind::MySql.profile();
    assert!(matches!(
        mysql.sequence_ddl().create_statements(mysql, &full),
        Err(RelqError::UnsupportedCapability {
            capability: Capability::Sequence,
            ..
        })
    ));
}
