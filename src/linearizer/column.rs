use super::{shape_error, Datum, RecordLinearizer, ValueLinearizer};
use crate::ast::{Node, ScalarKind, Value};
use crate::cursor::{PositionedParameters, PositionedResult};
use crate::error::RelqResult;
use crate::transpiler::Dialect;

/// One scalar column, read and bound through the dialect's delegate for
/// its kind.
#[derive(Debug, Clone)]
pub struct ColumnLinearizer {
    node: Node,
    kind: ScalarKind,
    nullable: bool,
}

impl ColumnLinearizer {
    pub fn new(node: Node, kind: ScalarKind) -> Self {
        Self {
            node,
            kind,
            nullable: false,
        }
    }

    /// SQL NULL reads as a null scalar instead of failing.
    pub fn optional(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub fn node(&self) -> &Node {
        &self.node
    }

    pub fn kind(&self) -> ScalarKind {
        self.kind
    }

    pub fn is_nullable(&self) -> bool {
        self.nullable
    }
}

impl ValueLinearizer for ColumnLinearizer {
    fn get_result(&self, dialect: &dyn Dialect, row: &mut dyn PositionedResult) -> RelqResult<Datum> {
        let delegate = dialect.type_mappers().delegate(self.kind);
        if self.nullable {
            Ok(Datum::from(delegate.next_option(row)?.unwrap_or(Value::Null)))
        } else {
            delegate.next_value(row).map(Datum::Scalar)
        }
    }

    fn update_result(
        &self,
        dialect: &dyn Dialect,
        row: &mut dyn PositionedResult,
        value: &Datum,
    ) -> RelqResult<()> {
        let value = value.as_scalar().ok_or_else(|| shape_error("scalar", value))?;
        let delegate = dialect.type_mappers().delegate(self.kind);
        if self.nullable {
            delegate.update_option(Some(value), row)
        } else {
            delegate.update_value(value, row)
        }
    }

    fn set_parameter(
        &self,
        dialect: &dyn Dialect,
        params: &mut dyn PositionedParameters,
        value: Option<&Datum>,
    ) -> RelqResult<()> {
        let delegate = dialect.type_mappers().delegate(self.kind);
        match value {
            None => delegate.set_option(None, params),
            Some(datum) => {
                let value = datum.as_scalar().ok_or_else(|| shape_error("scalar", datum))?;
                if self.nullable {
                    delegate.set_option(Some(value), params)
                } else {
                    delegate.set_value(value, params)
                }
            }
        }
    }
}

impl RecordLinearizer for ColumnLinearizer {
    fn linearized_nodes(&self) -> Vec<Node> {
        vec![self.node.clone()]
    }

    fn width(&self) -> usize {
        1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::SymbolTable;
    use crate::cursor::ResultRow;
    use crate::error::RelqError;
    use crate::linearizer::bind;
    use crate::transpiler::DialectKind;

    #[test]
    fn test_required_column_rejects_null() {
        let mut table = SymbolTable::new();
        let u = table.fresh("u");
        let lin = ColumnLinearizer::new(Node::column(u, "name"), ScalarKind::String);
        let dialect = DialectKind::Postgres.profile();

        let mut row = ResultRow::new(vec![Value::Null]);
        assert!(matches!(
            lin.get_result(dialect, &mut row),
            Err(RelqError::UnexpectedNull { position: 0 })
        ));

        let optional = lin.clone().optional();
        row.rewind();
        assert_eq!(optional.get_result(dialect, &mut row).unwrap(), Datum::null());
    }

    #[test]
    fn test_boolean_binds_through_dialect_delegate() {
        let mut table = SymbolTable::new();
        let u = table.fresh("u");
        let lin = ColumnLinearizer::new(Node::column(u, "active"), ScalarKind::Boolean);

        let pg = bind(DialectKind::Postgres.profile(), &lin, Some(&Datum::scalar(true))).unwrap();
        let sqlite = bind(DialectKind::Sqlite.profile(), &lin, Some(&Datum::scalar(true))).unwrap();
        assert_eq!(pg.into_row().into_cells(), vec![Value::Bool(true)]);
        assert_eq!(sqlite.into_row().into_cells(), vec![Value::Int(1)]);
    }

    #[test]
    fn test_record_value_is_rejected() {
        let mut table = SymbolTable::new();
        let u = table.fresh("u");
        let lin = ColumnLinearizer::new(Node::column(u, "id"), ScalarKind::Int);
        let err = bind(DialectKind::H2.profile(), &lin, Some(&Datum::Record(vec![]))).unwrap_err();
        assert!(matches!(err, RelqError::MalformedQuery(_)));
    }
}
