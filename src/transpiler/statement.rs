//! Built statements and their parameter setters.

use crate::ast::{ScalarKind, Value};
use crate::cursor::{ParameterBuffer, PositionedParameters};
use crate::error::{RelqError, RelqResult};
use crate::linearizer::RecordLinearizer;
use crate::types::TypeMapperDelegate;
use std::sync::Arc;

type SetFn = dyn Fn(&[Value], &mut dyn PositionedParameters) -> RelqResult<()> + Send + Sync;

/// Binds one `?` placeholder at execution time.
#[derive(Clone)]
pub struct ParameterSetter {
    kind: ScalarKind,
    set: Arc<SetFn>,
}

impl ParameterSetter {
    /// A constant captured at build time.
    pub fn literal(delegate: Arc<dyn TypeMapperDelegate>, value: Value) -> Self {
        let kind = delegate.kind();
        Self {
            kind,
            set: Arc::new(move |_: &[Value], params: &mut dyn PositionedParameters| delegate.set_option(Some(&value), params)),
        }
    }

    /// The runtime argument at `index`.
    pub fn argument(delegate: Arc<dyn TypeMapperDelegate>, index: usize) -> Self {
        let kind = delegate.kind();
        Self {
            kind,
            set: Arc::new(move |args: &[Value], params: &mut dyn PositionedParameters| match args.get(index) {
                Some(value) => delegate.set_option(Some(value), params),
                None => Err(RelqError::malformed(format!(
                    "query parameter #{} missing: {} arguments supplied",
                    index,
                    args.len()
                ))),
            }),
        }
    }

    pub fn kind(&self) -> ScalarKind {
        self.kind
    }

    pub fn apply(&self, args: &[Value], params: &mut dyn PositionedParameters) -> RelqResult<()> {
        (self.set)(args, params)
    }
}

impl std::fmt::Debug for ParameterSetter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParameterSetter").field("kind", &self.kind).finish()
    }
}

/// SQL text plus the setters for its placeholders, in placeholder order.
#[derive(Debug, Clone)]
pub struct Statement {
    pub sql: String,
    pub setters: Vec<ParameterSetter>,
    /// Projected column count, when the projection names its columns.
    pub column_count: Option<usize>,
    /// Leading rows the caller must discard (TOP-style paging).
    pub skip_rows: u64,
}

impl Statement {
    /// Apply every setter against `params`, in order.
    pub fn bind(&self, args: &[Value], params: &mut dyn PositionedParameters) -> RelqResult<()> {
        for setter in &self.setters {
            setter.apply(args, params)?;
        }
        Ok(())
    }

    /// Bind into a fresh in-memory buffer.
    pub fn parameters(&self, args: &[Value]) -> RelqResult<ParameterBuffer> {
        let mut buf = ParameterBuffer::new();
        self.bind(args, &mut buf)?;
        Ok(buf)
    }

    pub fn setter_kinds(&self) -> Vec<ScalarKind> {
        self.setters.iter().map(|s| s.kind()).collect()
    }

    /// Check a linearizer against the projected column count.
    pub fn verify_linearizer(&self, linearizer: &dyn RecordLinearizer) -> RelqResult<()> {
        match self.column_count {
            Some(expected) if expected != linearizer.width() => Err(RelqError::LinearizationArityMismatch {
                expected,
                got: linearizer.width(),
            }),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cursor::BoundParameter;
    use crate::types::TypeMappers;

    #[test]
    fn test_setters_bind_in_order() {
        let mappers = TypeMappers::standard();
        let stmt = Statement {
            sql: "select ? , ?".into(),
            setters: vec![
                ParameterSetter::literal(mappers.shared(ScalarKind::String), Value::from("x")),
                ParameterSetter::argument(mappers.shared(ScalarKind::Int), 1),
            ],
            column_count: Some(2),
            skip_rows: 0,
        };
        let buf = stmt.parameters(&[Value::Null, Value::Int(9)]).unwrap();
        assert_eq!(
            buf.params(),
            &[
                BoundParameter::Value(Value::from("x")),
                BoundParameter::Value(Value::Int(9)),
            ]
        );
        assert_eq!(stmt.setter_kinds(), vec![ScalarKind::String, ScalarKind::Int]);
        assert!(stmt.parameters(&[]).is_err());
    }
}
