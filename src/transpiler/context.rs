//! Per-build mutable state.

use super::dialect::{Capability, Dialect};
use super::statement::ParameterSetter;
use crate::ast::Symbol;
use crate::error::{RelqError, RelqResult};
use std::collections::HashMap;

/// Everything one build call mutates: the SQL buffer, the setters in
/// emission order, and the alias table. Never shared between builds.
pub struct BuildContext<'d> {
    dialect: &'d dyn Dialect,
    pub sql: String,
    setters: Vec<ParameterSetter>,
    aliases: HashMap<Symbol, String>,
    next_alias: usize,
    depth: usize,
    skip_rows: u64,
}

/// Alias bindings replaced by a nested comprehension, restored when it ends.
pub struct SavedAliases(Vec<(Symbol, Option<String>)>);

impl<'d> BuildContext<'d> {
    pub fn new(dialect: &'d dyn Dialect) -> Self {
        Self {
            dialect,
            sql: String::new(),
            setters: Vec::new(),
            aliases: HashMap::new(),
            next_alias: 0,
            depth: 0,
            skip_rows: 0,
        }
    }

    pub fn dialect(&self) -> &'d dyn Dialect {
        self.dialect
    }

    pub fn push_str(&mut self, s: &str) {
        self.sql.push_str(s);
    }

    pub fn push(&mut self, c: char) {
        self.sql.push(c);
    }

    /// Give a generator the next table alias (`x1`, `x2`, ...).
    pub fn bind_alias(&mut self, sym: Symbol) -> String {
        self.next_alias += 1;
        let alias = format!("x{}", self.next_alias);
        self.aliases.insert(sym, alias.clone());
        alias
    }

    /// Qualify this generator's columns with `qualifier` instead of an
    /// `xN` alias. DML targets pass their quoted table name.
    pub fn bind_qualifier(&mut self, sym: Symbol, qualifier: String) {
        self.aliases.insert(sym, qualifier);
    }

    /// The alias or qualifier of a bound generator.
    pub fn alias(&self, sym: Symbol) -> RelqResult<&str> {
        match self.aliases.get(&sym) {
            Some(alias) => Ok(alias),
            None => Err(RelqError::malformed(format!("symbol {} has no binding in scope", sym))),
        }
    }

    pub fn save_aliases(&self, syms: &[Symbol]) -> SavedAliases {
        SavedAliases(syms.iter().map(|s| (*s, self.aliases.get(s).cloned())).collect())
    }

    pub fn restore_aliases(&mut self, saved: SavedAliases) {
        for (sym, previous) in saved.0 {
            match previous {
                Some(alias) => {
                    self.aliases.insert(sym, alias);
                }
                None => {
                    self.aliases.remove(&sym);
                }
            }
        }
    }

    pub fn add_setter(&mut self, setter: ParameterSetter) {
        self.setters.push(setter);
    }

    pub fn require(&self, cap: Capability) -> RelqResult<()> {
        self.dialect.require(cap)
    }

    /// Error for a node shape this dialect cannot emit.
    pub fn unsupported(&self, what: impl Into<String>) -> RelqError {
        RelqError::unsupported(what, self.dialect.name())
    }

    pub fn enter_subquery(&mut self) {
        self.depth += 1;
    }

    pub fn leave_subquery(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    /// Zero while emitting the outermost query.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Rows the caller must drop from the front of the result.
    pub fn set_skip_rows(&mut self, n: u64) {
        self.skip_rows = n;
    }

    pub fn finish(self) -> (String, Vec<ParameterSetter>, u64) {
        (self.sql, self.setters, self.skip_rows)
    }
}

impl std::fmt::Write for BuildContext<'_> {
    fn write_str(&mut self, s: &str) -> std::fmt::Result {
        self.sql.push_str(s);
        Ok(())
    }
}
