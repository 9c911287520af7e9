//! Error types for relq.

use crate::ast::ScalarKind;
use crate::transpiler::Capability;
use thiserror::Error;

/// The main error type for query compilation and linearization.
///
/// Every variant is a synchronous abort of the current build or
/// linearize call; nothing is retried and no partial SQL is returned.
#[derive(Debug, Error)]
pub enum RelqError {
    /// `rewrite_children` received the wrong number of children.
    #[error("Malformed rewrite of {node}: expected {expected} children, got {got}")]
    MalformedRewrite {
        node: &'static str,
        expected: usize,
        got: usize,
    },

    /// The tree violates a structural invariant (scope, arity, required field).
    #[error("Malformed query: {0}")]
    MalformedQuery(String),

    /// The active dialect has no emission rule for a node shape.
    #[error("Unsupported construct for dialect {dialect}: {node}")]
    UnsupportedConstruct { node: String, dialect: String },

    /// The query needs a capability the dialect does not declare.
    #[error("Dialect {dialect} does not support capability '{capability}'")]
    UnsupportedCapability {
        capability: Capability,
        dialect: String,
    },

    /// Linearized column count differs from the emitted or supplied columns.
    #[error("Linearization arity mismatch: expected {expected} columns, got {got}")]
    LinearizationArityMismatch { expected: usize, got: usize },

    /// A product linearizer was declared wider than the tuple ceiling.
    #[error("Record arity {arity} exceeds the supported maximum of {max}")]
    ArityExceeded { arity: usize, max: usize },

    /// A cell, literal or argument does not match the declared scalar kind.
    #[error("Type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        expected: ScalarKind,
        found: &'static str,
    },

    /// A non-optional read hit SQL NULL.
    #[error("Unexpected NULL at column position {position}")]
    UnexpectedNull { position: usize },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl RelqError {
    /// Create a malformed query error.
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedQuery(message.into())
    }

    /// Create an unsupported construct error.
    pub fn unsupported(node: impl Into<String>, dialect: &str) -> Self {
        Self::UnsupportedConstruct {
            node: node.into(),
            dialect: dialect.to_string(),
        }
    }

    /// Create a missing capability error.
    pub fn capability(capability: Capability, dialect: &str) -> Self {
        Self::UnsupportedCapability {
            capability,
            dialect: dialect.to_string(),
        }
    }
}

/// Result type alias for relq operations.
pub type RelqResult<T> = Result<T, RelqError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = RelqError::capability(Capability::SequenceCurr, "derby");
        assert_eq!(
            err.to_string(),
            "Dialect derby does not support capability 'sequenceCurr'"
        );

        let err = RelqError::MalformedRewrite {
            node: "Apply",
            expected: 2,
            got: 1,
        };
        assert_eq!(
            err.to_string(),
            "Malformed rewrite of Apply: expected 2 children, got 1"
        );
    }
}
