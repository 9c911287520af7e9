//! Compiler configuration, read from `relq.toml`.
//!
//! ```toml
//! dialect = "sqlserver"
//! log_sql = true
//!
//! [ddl]
//! lob_triggers = false
//! ```

use crate::error::{RelqError, RelqResult};
use crate::transpiler::sql::postgres::PostgresDialect;
use crate::transpiler::{Dialect, DialectKind};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

pub const CONFIG_FILE: &str = "relq.toml";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CompilerConfig {
    pub dialect: DialectKind,
    /// Log every built statement at `info`.
    pub log_sql: bool,
    pub ddl: DdlConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DdlConfig {
    /// Postgres `lo_manage` triggers on large-object columns.
    pub lob_triggers: bool,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            dialect: DialectKind::Postgres,
            log_sql: false,
            ddl: DdlConfig::default(),
        }
    }
}

impl Default for DdlConfig {
    fn default() -> Self {
        Self { lob_triggers: true }
    }
}

impl CompilerConfig {
    pub fn from_toml(content: &str) -> RelqResult<Self> {
        toml::from_str(content).map_err(|e| RelqError::Config(e.to_string()))
    }

    pub fn load(path: &Path) -> RelqResult<Self> {
        let content = fs::read_to_string(path)?;
        let config = Self::from_toml(&content)?;
        debug!(path = %path.display(), dialect = %config.dialect, "loaded config");
        Ok(config)
    }

    /// `./relq.toml`, then `<config dir>/relq/relq.toml`, else defaults.
    pub fn discover() -> RelqResult<Self> {
        match Self::search_paths().into_iter().find(|p| p.is_file()) {
            Some(path) => Self::load(&path),
            None => Ok(Self::default()),
        }
    }

    fn search_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from(CONFIG_FILE)];
        if let Some(dir) = dirs::config_dir() {
            paths.push(dir.join("relq").join(CONFIG_FILE));
        }
        paths
    }

    /// The configured dialect. Settings that change a dialect's behavior
    /// get a private instance; otherwise the shared one is returned.
    pub fn dialect(&self) -> Arc<dyn Dialect> {
        match self.dialect {
            DialectKind::Postgres if !self.ddl.lob_triggers => {
                Arc::new(PostgresDialect::new().with_lob_triggers(false))
            }
            kind => kind.shared(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CompilerConfig::from_toml("").unwrap();
        assert_eq!(config, CompilerConfig::default());
        assert_eq!(config.dialect().name(), "postgres");
        assert!(config.ddl.lob_triggers);
    }

    #[test]
    fn test_parse() {
        let config = CompilerConfig::from_toml(
            r#"
            dialect = "sqlserver"
            log_sql = true

            [ddl]
            lob_triggers = false
            "#,
        )
        .unwrap();
        assert_eq!(config.dialect, DialectKind::SqlServer);
        assert!(config.log_sql);
        assert!(!config.ddl.lob_triggers);
        assert_eq!(config.dialect().name(), "sqlserver");
    }

    #[test]
    fn test_unknown_dialect_and_keys() {
        assert!(matches!(
            CompilerConfig::from_toml("dialect = \"oracle\""),
            Err(RelqError::Config(_))
        ));
        assert!(matches!(
            CompilerConfig::from_toml("dialects = \"h2\""),
            Err(RelqError::Config(_))
        ));
    }

    #[test]
    fn test_lob_triggers_off_gets_private_postgres() {
        let config = CompilerConfig::from_toml("[ddl]\nlob_triggers = false").unwrap();
        let dialect = config.dialect();
        assert!(!Arc::ptr_eq(&dialect, &DialectKind::Postgres.shared()));
    }
}
