//! Dialects: capability sets plus the builder, type-mapper and DDL
//! strategies for one target database.

use super::ddl::{SequenceDdl, StandardSequenceDdl, StandardTableDdl, TableDdl};
use super::sql::{
    access::AccessDialect, derby::DerbyDialect, h2::H2Dialect, mysql::MySqlDialect,
    postgres::PostgresDialect, sqlite::SqliteDialect, sqlserver::SqlServerDialect,
};
use super::traits::QueryBuilder;
use crate::error::{RelqError, RelqResult};
use crate::types::TypeMappers;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, LazyLock};

/// An optional database feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Capability {
    /// `next value` for sequences.
    Sequence,
    /// Current value of a sequence.
    SequenceCurr,
    SequenceMin,
    SequenceMax,
    SequenceCycle,
    /// Fetch/offset inside subqueries.
    PagingNested,
    /// Offset without a fetch bound.
    PagingDrop,
    FunctionDatabase,
    FunctionUser,
    /// `like ... escape ...`
    LikeEscape,
    TypeBlob,
    TypeBigDecimal,
    /// Returning generated keys from an insert.
    ReturnInsertKey,
    /// Returning non-key columns from an insert.
    ReturnInsertOther,
    /// Updatable result cursors.
    MutableCursor,
    ColumnDefaults,
}

impl Capability {
    pub const ALL: [Capability; 16] = [
        Capability::Sequence,
        Capability::SequenceCurr,
        Capability::SequenceMin,
        Capability::SequenceMax,
        Capability::SequenceCycle,
        Capability::PagingNested,
        Capability::PagingDrop,
        Capability::FunctionDatabase,
        Capability::FunctionUser,
        Capability::LikeEscape,
        Capability::TypeBlob,
        Capability::TypeBigDecimal,
        Capability::ReturnInsertKey,
        Capability::ReturnInsertOther,
        Capability::MutableCursor,
        Capability::ColumnDefaults,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Capability::Sequence => "sequence",
            Capability::SequenceCurr => "sequenceCurr",
            Capability::SequenceMin => "sequenceMin",
            Capability::SequenceMax => "sequenceMax",
            Capability::SequenceCycle => "sequenceCycle",
            Capability::PagingNested => "pagingNested",
            Capability::PagingDrop => "pagingDrop",
            Capability::FunctionDatabase => "functionDatabase",
            Capability::FunctionUser => "functionUser",
            Capability::LikeEscape => "likeEscape",
            Capability::TypeBlob => "typeBlob",
            Capability::TypeBigDecimal => "typeBigDecimal",
            Capability::ReturnInsertKey => "returnInsertKey",
            Capability::ReturnInsertOther => "returnInsertOther",
            Capability::MutableCursor => "mutableCursor",
            Capability::ColumnDefaults => "columnDefaults",
        }
    }
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A fixed set of capabilities.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Capabilities(BTreeSet<Capability>);

impl Capabilities {
    pub fn all() -> Self {
        Self(Capability::ALL.into_iter().collect())
    }

    pub fn without(mut self, missing: &[Capability]) -> Self {
        for cap in missing {
            self.0.remove(cap);
        }
        self
    }

    pub fn contains(&self, cap: Capability) -> bool {
        self.0.contains(&cap)
    }

    pub fn iter(&self) -> impl Iterator<Item = Capability> + '_ {
        self.0.iter().copied()
    }

    /// Capabilities of the full set that this one lacks.
    pub fn missing(&self) -> Vec<Capability> {
        Capability::ALL
            .into_iter()
            .filter(|c| !self.contains(*c))
            .collect()
    }
}

/// One target database.
///
/// Dialects are read-only after construction and shared across threads;
/// all mutable state of a build lives in its `BuildContext`.
pub trait Dialect: Send + Sync + std::fmt::Debug {
    fn name(&self) -> &str;

    fn capabilities(&self) -> &Capabilities;

    fn query_builder(&self) -> &dyn QueryBuilder;

    fn type_mappers(&self) -> &TypeMappers;

    fn table_ddl(&self) -> &dyn TableDdl {
        &StandardTableDdl
    }

    fn sequence_ddl(&self) -> &dyn SequenceDdl {
        &StandardSequenceDdl
    }

    fn supports(&self, cap: Capability) -> bool {
        self.capabilities().contains(cap)
    }

    fn require(&self, cap: Capability) -> RelqResult<()> {
        if self.supports(cap) {
            Ok(())
        } else {
            Err(RelqError::capability(cap, self.name()))
        }
    }
}

/// Built-in dialects.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DialectKind {
    #[default]
    Postgres,
    MySql,
    Sqlite,
    H2,
    Derby,
    Access,
    SqlServer,
}

static POSTGRES: LazyLock<Arc<dyn Dialect>> = LazyLock::new(|| Arc::new(PostgresDialect::new()));
static MYSQL: LazyLock<Arc<dyn Dialect>> = LazyLock::new(|| Arc::new(MySqlDialect::new()));
static SQLITE: LazyLock<Arc<dyn Dialect>> = LazyLock::new(|| Arc::new(SqliteDialect::new()));
static H2: LazyLock<Arc<dyn Dialect>> = LazyLock::new(|| Arc::new(H2Dialect::new()));
static DERBY: LazyLock<Arc<dyn Dialect>> = LazyLock::new(|| Arc::new(DerbyDialect::new()));
static ACCESS: LazyLock<Arc<dyn Dialect>> = LazyLock::new(|| Arc::new(AccessDialect::new()));
static SQLSERVER: LazyLock<Arc<dyn Dialect>> = LazyLock::new(|| Arc::new(SqlServerDialect::new()));

impl DialectKind {
    pub const ALL: [DialectKind; 7] = [
        DialectKind::Postgres,
        DialectKind::MySql,
        DialectKind::Sqlite,
        DialectKind::H2,
        DialectKind::Derby,
        DialectKind::Access,
        DialectKind::SqlServer,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            DialectKind::Postgres => "postgres",
            DialectKind::MySql => "mysql",
            DialectKind::Sqlite => "sqlite",
            DialectKind::H2 => "h2",
            DialectKind::Derby => "derby",
            DialectKind::Access => "access",
            DialectKind::SqlServer => "sqlserver",
        }
    }

    fn cell(&self) -> &'static LazyLock<Arc<dyn Dialect>> {
        match self {
            DialectKind::Postgres => &POSTGRES,
            DialectKind::MySql => &MYSQL,
            DialectKind::Sqlite => &SQLITE,
            DialectKind::H2 => &H2,
            DialectKind::Derby => &DERBY,
            DialectKind::Access => &ACCESS,
            DialectKind::SqlServer => &SQLSERVER,
        }
    }

    /// The process-wide instance.
    pub fn shared(&self) -> Arc<dyn Dialect> {
        Arc::clone(LazyLock::force(self.cell()))
    }

    /// Borrowed process-wide instance.
    pub fn profile(&self) -> &'static dyn Dialect {
        LazyLock::force(self.cell()).as_ref()
    }
}

impl std::fmt::Display for DialectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for DialectKind {
    type Err = RelqError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" | "pg" => Ok(DialectKind::Postgres),
            "mysql" => Ok(DialectKind::MySql),
            "sqlite" => Ok(DialectKind::Sqlite),
            "h2" => Ok(DialectKind::H2),
            "derby" => Ok(DialectKind::Derby),
            "access" => Ok(DialectKind::Access),
            "sqlserver" | "mssql" => Ok(DialectKind::SqlServer),
            other => Err(RelqError::Config(format!("unknown dialect '{}'", other))),
        }
    }
}

/// Dialects by name: the built-ins plus any registered at startup.
#[derive(Debug, Clone)]
pub struct DialectRegistry {
    dialects: BTreeMap<String, Arc<dyn Dialect>>,
}

impl DialectRegistry {
    pub fn builtin() -> Self {
        let dialects = DialectKind::ALL
            .iter()
            .map(|k| (k.name().to_string(), k.shared()))
            .collect();
        Self { dialects }
    }

    /// Add or replace a dialect under its own name.
    pub fn register(&mut self, dialect: Arc<dyn Dialect>) -> Option<Arc<dyn Dialect>> {
        self.dialects.insert(dialect.name().to_string(), dialect)
    }

    pub fn get(&self, name: &str) -> RelqResult<Arc<dyn Dialect>> {
        self.dialects
            .get(name)
            .cloned()
            .ok_or_else(|| RelqError::Config(format!("unknown dialect '{}'", name)))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.dialects.keys().map(String::as_str)
    }
}

impl Default for DialectRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capability_subtraction() {
        let caps = Capabilities::all().without(&[Capability::SequenceCurr, Capability::TypeBlob]);
        assert!(!caps.contains(Capability::SequenceCurr));
        assert!(caps.contains(Capability::Sequence));
        assert_eq!(caps.missing(), vec![Capability::SequenceCurr, Capability::TypeBlob]);
    }

    #[test]
    fn test_dialect_kind_parsing() {
        assert_eq!("PostgreSQL".parse::<DialectKind>().unwrap(), DialectKind::Postgres);
        assert_eq!("mssql".parse::<DialectKind>().unwrap(), DialectKind::SqlServer);
        assert!(matches!("oracle".parse::<DialectKind>(), Err(RelqError::Config(_))));
    }

    #[test]
    fn test_profiles_are_singletons() {
        for kind in DialectKind::ALL {
            let a = kind.shared();
            let b = kind.shared();
            assert!(Arc::ptr_eq(&a, &b));
            assert_eq!(kind.profile().name(), kind.name());
        }
    }

    #[test]
    fn test_registry_lookup() {
        let mut registry = DialectRegistry::builtin();
        assert_eq!(registry.names().count(), 7);
        assert!(registry.get("derby").is_ok());
        assert!(registry.get("oracle").is_err());

        // Re-registering under an existing name replaces it.
        let previous = registry.register(DialectKind::H2.shared());
        assert!(previous.is_some());
        assert_eq!(registry.names().count(), 7);
    }

    #[test]
    fn test_require_reports_dialect() {
        let err = DialectKind::Derby
            .profile()
            .require(Capability::SequenceCurr)
            .unwrap_err();
        assert_eq!(err.to_string(), "Dialect derby does not support capability 'sequenceCurr'");
    }
}
