//! Built-in dialects.

pub mod access;
pub mod derby;
pub mod h2;
pub mod mysql;
pub mod postgres;
pub mod sqlite;
pub mod sqlserver;

/// `[name]`, with `]` doubled. Access and SQL Server.
pub(crate) fn bracket_identifier(name: &str) -> String {
    format!("[{}]", name.replace(']', "]]"))
}
