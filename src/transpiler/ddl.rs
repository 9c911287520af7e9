//! DDL: table, index, foreign key and sequence statements.

use super::dialect::{Capability, Dialect};
use crate::ast::{ScalarKind, Value};
use crate::error::RelqResult;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// One column of a table definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDef {
    pub name: String,
    pub kind: ScalarKind,
    #[serde(default)]
    pub nullable: bool,
    #[serde(default)]
    pub primary_key: bool,
    #[serde(default)]
    pub auto_increment: bool,
    #[serde(default)]
    pub default: Option<Value>,
    /// Explicit column type, bypassing the type mapper.
    #[serde(default)]
    pub db_type: Option<String>,
}

impl ColumnDef {
    pub fn new(name: impl Into<String>, kind: ScalarKind) -> Self {
        Self {
            name: name.into(),
            kind,
            nullable: false,
            primary_key: false,
            auto_increment: false,
            default: None,
            db_type: None,
        }
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    pub fn auto_increment(mut self) -> Self {
        self.auto_increment = true;
        self
    }

    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn db_type(mut self, ty: impl Into<String>) -> Self {
        self.db_type = Some(ty.into());
        self
    }
}

/// A named, possibly composite, primary key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrimaryKeyDef {
    pub name: String,
    pub columns: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ForeignKeyAction {
    #[default]
    NoAction,
    Restrict,
    Cascade,
    SetNull,
    SetDefault,
}

impl std::fmt::Display for ForeignKeyAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            ForeignKeyAction::NoAction => "NO ACTION",
            ForeignKeyAction::Restrict => "RESTRICT",
            ForeignKeyAction::Cascade => "CASCADE",
            ForeignKeyAction::SetNull => "SET NULL",
            ForeignKeyAction::SetDefault => "SET DEFAULT",
        };
        write!(f, "{}", text)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKeyDef {
    pub name: String,
    pub columns: Vec<String>,
    pub target_table: String,
    pub target_columns: Vec<String>,
    #[serde(default)]
    pub on_update: ForeignKeyAction,
    #[serde(default)]
    pub on_delete: ForeignKeyAction,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexDef {
    pub name: String,
    pub columns: Vec<String>,
    #[serde(default)]
    pub unique: bool,
}

/// A table and everything created alongside it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableDef {
    pub name: String,
    pub columns: Vec<ColumnDef>,
    #[serde(default)]
    pub primary_key: Option<PrimaryKeyDef>,
    #[serde(default)]
    pub foreign_keys: Vec<ForeignKeyDef>,
    #[serde(default)]
    pub indexes: Vec<IndexDef>,
}

impl TableDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
            primary_key: None,
            foreign_keys: Vec::new(),
            indexes: Vec::new(),
        }
    }

    pub fn column(mut self, column: ColumnDef) -> Self {
        self.columns.push(column);
        self
    }

    pub fn primary_key(mut self, name: impl Into<String>, columns: &[&str]) -> Self {
        self.primary_key = Some(PrimaryKeyDef {
            name: name.into(),
            columns: columns.iter().map(|c| c.to_string()).collect(),
        });
        self
    }

    pub fn foreign_key(mut self, fk: ForeignKeyDef) -> Self {
        self.foreign_keys.push(fk);
        self
    }

    pub fn index(mut self, name: impl Into<String>, columns: &[&str], unique: bool) -> Self {
        self.indexes.push(IndexDef {
            name: name.into(),
            columns: columns.iter().map(|c| c.to_string()).collect(),
            unique,
        });
        self
    }

    pub fn find_column(&self, name: &str) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.name == name)
    }
}

/// Table DDL hooks. Defaults live in the `standard_*` functions of this
/// module; dialects override what their database spells differently.
pub trait TableDdl: Send + Sync + std::fmt::Debug {
    /// `create table`, then foreign keys and indexes.
    fn create_statements(&self, dialect: &dyn Dialect, table: &TableDef) -> RelqResult<Vec<String>> {
        standard_create_statements(self, dialect, table)
    }

    /// Foreign keys first, then the table.
    fn drop_statements(&self, dialect: &dyn Dialect, table: &TableDef) -> RelqResult<Vec<String>> {
        standard_drop_statements(self, dialect, table)
    }

    fn create_table(&self, dialect: &dyn Dialect, table: &TableDef) -> RelqResult<String> {
        standard_create_table(self, dialect, table)
    }

    fn column_definition(&self, dialect: &dyn Dialect, column: &ColumnDef) -> RelqResult<String> {
        standard_column_definition(self, dialect, column)
    }

    fn column_type(&self, dialect: &dyn Dialect, column: &ColumnDef) -> RelqResult<String> {
        standard_column_type(dialect, column)
    }

    fn auto_increment_clause(&self, _column: &ColumnDef) -> String {
        " GENERATED BY DEFAULT AS IDENTITY".to_string()
    }

    fn add_foreign_key(&self, dialect: &dyn Dialect, table: &TableDef, fk: &ForeignKeyDef) -> String {
        let q = dialect.query_builder();
        format!(
            "alter table {} add {}",
            q.quote_identifier(&table.name),
            foreign_key_constraint(dialect, fk)
        )
    }

    fn drop_foreign_key(&self, dialect: &dyn Dialect, table: &TableDef, fk: &ForeignKeyDef) -> String {
        let q = dialect.query_builder();
        format!(
            "alter table {} drop constraint {}",
            q.quote_identifier(&table.name),
            q.quote_identifier(&fk.name)
        )
    }

    fn create_index(&self, dialect: &dyn Dialect, table: &TableDef, index: &IndexDef) -> String {
        let q = dialect.query_builder();
        format!(
            "create {}index {} on {} ({})",
            if index.unique { "unique " } else { "" },
            q.quote_identifier(&index.name),
            q.quote_identifier(&table.name),
            quote_list(dialect, &index.columns)
        )
    }
}

/// The table DDL with every hook at its default.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardTableDdl;

impl TableDdl for StandardTableDdl {}

pub fn standard_create_statements<D: TableDdl + ?Sized>(
    ddl: &D,
    dialect: &dyn Dialect,
    table: &TableDef,
) -> RelqResult<Vec<String>> {
    let mut out = vec![ddl.create_table(dialect, table)?];
    out.extend(table.foreign_keys.iter().map(|fk| ddl.add_foreign_key(dialect, table, fk)));
    out.extend(table.indexes.iter().map(|ix| ddl.create_index(dialect, table, ix)));
    debug!(table = %table.name, statements = out.len(), "built create DDL");
    Ok(out)
}

pub fn standard_drop_statements<D: TableDdl + ?Sized>(
    ddl: &D,
    dialect: &dyn Dialect,
    table: &TableDef,
) -> RelqResult<Vec<String>> {
    let q = dialect.query_builder();
    let mut out: Vec<String> = table
        .foreign_keys
        .iter()
        .map(|fk| ddl.drop_foreign_key(dialect, table, fk))
        .collect();
    out.push(format!("drop table {}", q.quote_identifier(&table.name)));
    Ok(out)
}

/// `create table "t" (cols[, constraint "pk" primary key (...)])`.
pub fn standard_create_table<D: TableDdl + ?Sized>(
    ddl: &D,
    dialect: &dyn Dialect,
    table: &TableDef,
) -> RelqResult<String> {
    let q = dialect.query_builder();
    let mut parts = table
        .columns
        .iter()
        .map(|c| ddl.column_definition(dialect, c))
        .collect::<RelqResult<Vec<_>>>()?;
    if let Some(pk) = &table.primary_key {
        parts.push(format!(
            "constraint {} primary key ({})",
            q.quote_identifier(&pk.name),
            quote_list(dialect, &pk.columns)
        ));
    }
    Ok(format!(
        "create table {} ({})",
        q.quote_identifier(&table.name),
        parts.join(", ")
    ))
}

/// `"name" TYPE [DEFAULT v] [NOT NULL] [auto increment] [PRIMARY KEY]`.
pub fn standard_column_definition<D: TableDdl + ?Sized>(
    ddl: &D,
    dialect: &dyn Dialect,
    column: &ColumnDef,
) -> RelqResult<String> {
    let q = dialect.query_builder();
    let mut sql = format!(
        "{} {}",
        q.quote_identifier(&column.name),
        ddl.column_type(dialect, column)?
    );
    if let Some(default) = &column.default {
        dialect.require(Capability::ColumnDefaults)?;
        let literal = dialect
            .type_mappers()
            .delegate(column.kind)
            .value_to_sql_literal(default)?;
        sql.push_str(" DEFAULT ");
        sql.push_str(&literal);
    }
    if !column.nullable {
        sql.push_str(" NOT NULL");
    }
    if column.auto_increment {
        sql.push_str(&ddl.auto_increment_clause(column));
    }
    if column.primary_key {
        sql.push_str(" PRIMARY KEY");
    }
    Ok(sql)
}

/// The explicit type, or the delegate's name for the column kind.
pub fn standard_column_type(dialect: &dyn Dialect, column: &ColumnDef) -> RelqResult<String> {
    match column.kind {
        ScalarKind::Blob => dialect.require(Capability::TypeBlob)?,
        ScalarKind::Decimal => dialect.require(Capability::TypeBigDecimal)?,
        _ => {}
    }
    Ok(match &column.db_type {
        Some(ty) => ty.clone(),
        None => dialect
            .type_mappers()
            .delegate(column.kind)
            .sql_type_name()
            .to_string(),
    })
}

/// `constraint "fk" foreign key("a") references "t"("id") on update .. on delete ..`.
pub fn foreign_key_constraint(dialect: &dyn Dialect, fk: &ForeignKeyDef) -> String {
    let q = dialect.query_builder();
    format!(
        "constraint {} foreign key({}) references {}({}) on update {} on delete {}",
        q.quote_identifier(&fk.name),
        quote_list(dialect, &fk.columns),
        q.quote_identifier(&fk.target_table),
        quote_list(dialect, &fk.target_columns),
        fk.on_update,
        fk.on_delete
    )
}

pub fn quote_list(dialect: &dyn Dialect, names: &[String]) -> String {
    let q = dialect.query_builder();
    names
        .iter()
        .map(|n| q.quote_identifier(n))
        .collect::<Vec<_>>()
        .join(", ")
}

/// A database sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequenceDef {
    pub name: String,
    #[serde(default = "SequenceDef::default_kind")]
    pub kind: ScalarKind,
    #[serde(default)]
    pub start: Option<i64>,
    #[serde(default)]
    pub increment: Option<i64>,
    #[serde(default)]
    pub min: Option<i64>,
    #[serde(default)]
    pub max: Option<i64>,
    #[serde(default)]
    pub cycle: bool,
}

impl SequenceDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: Self::default_kind(),
            start: None,
            increment: None,
            min: None,
            max: None,
            cycle: false,
        }
    }

    fn default_kind() -> ScalarKind {
        ScalarKind::Long
    }

    pub fn start(mut self, n: i64) -> Self {
        self.start = Some(n);
        self
    }

    pub fn increment(mut self, n: i64) -> Self {
        self.increment = Some(n);
        self
    }

    pub fn min(mut self, n: i64) -> Self {
        self.min = Some(n);
        self
    }

    pub fn max(mut self, n: i64) -> Self {
        self.max = Some(n);
        self
    }

    pub fn cycle(mut self) -> Self {
        self.cycle = true;
        self
    }
}

pub trait SequenceDdl: Send + Sync + std::fmt::Debug {
    fn create_statements(&self, dialect: &dyn Dialect, seq: &SequenceDef) -> RelqResult<Vec<String>> {
        Ok(vec![standard_create_sequence(dialect, seq, "")?])
    }

    fn drop_statements(&self, dialect: &dyn Dialect, seq: &SequenceDef) -> RelqResult<Vec<String>> {
        dialect.require(Capability::Sequence)?;
        Ok(vec![format!(
            "drop sequence {}",
            dialect.query_builder().quote_identifier(&seq.name)
        )])
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct StandardSequenceDdl;

impl SequenceDdl for StandardSequenceDdl {}

/// `create sequence "s"<type_clause> [start with n] [increment by n]
/// [minvalue n] [maxvalue n] [cycle]`, each bound gated by its capability.
pub fn standard_create_sequence(dialect: &dyn Dialect, seq: &SequenceDef, type_clause: &str) -> RelqResult<String> {
    dialect.require(Capability::Sequence)?;
    let mut sql = format!(
        "create sequence {}{}",
        dialect.query_builder().quote_identifier(&seq.name),
        type_clause
    );
    if let Some(n) = seq.start {
        sql.push_str(&format!(" start with {}", n));
    }
    if let Some(n) = seq.increment {
        sql.push_str(&format!(" increment by {}", n));
    }
    if let Some(n) = seq.min {
        dialect.require(Capability::SequenceMin)?;
        sql.push_str(&format!(" minvalue {}", n));
    }
    if let Some(n) = seq.max {
        dialect.require(Capability::SequenceMax)?;
        sql.push_str(&format!(" maxvalue {}", n));
    }
    if seq.cycle {
        dialect.require(Capability::SequenceCycle)?;
        sql.push_str(" cycle");
    }
    Ok(sql)
}
