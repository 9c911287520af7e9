use super::{check_width, shape_error, Datum, RecordLinearizer, ValueLinearizer, MAX_TUPLE_ARITY};
use crate::ast::Node;
use crate::cursor::{PositionedParameters, PositionedResult};
use crate::error::{RelqError, RelqResult};
use crate::transpiler::Dialect;

/// A fixed-arity record composed of field linearizers, read and bound
/// field by field in declaration order.
#[derive(Debug)]
pub struct ProductLinearizer {
    fields: Vec<Box<dyn RecordLinearizer>>,
}

impl ProductLinearizer {
    /// Fails with `ArityExceeded` beyond [`MAX_TUPLE_ARITY`] fields.
    pub fn new(fields: Vec<Box<dyn RecordLinearizer>>) -> RelqResult<Self> {
        if fields.len() > MAX_TUPLE_ARITY {
            return Err(RelqError::ArityExceeded {
                arity: fields.len(),
                max: MAX_TUPLE_ARITY,
            });
        }
        if fields.is_empty() {
            return Err(RelqError::malformed("a record needs at least one field"));
        }
        Ok(Self { fields })
    }

    pub fn arity(&self) -> usize {
        self.fields.len()
    }

    pub fn fields(&self) -> &[Box<dyn RecordLinearizer>] {
        &self.fields
    }

    fn record<'a>(&self, value: &'a Datum) -> RelqResult<&'a [Datum]> {
        match value {
            Datum::Record(items) if items.len() == self.fields.len() => Ok(items),
            Datum::Record(items) => Err(RelqError::LinearizationArityMismatch {
                expected: self.fields.len(),
                got: items.len(),
            }),
            other => Err(shape_error("record", other)),
        }
    }
}

impl ValueLinearizer for ProductLinearizer {
    fn get_result(&self, dialect: &dyn Dialect, row: &mut dyn PositionedResult) -> RelqResult<Datum> {
        self.fields
            .iter()
            .map(|field| field.get_result(dialect, row))
            .collect::<RelqResult<Vec<_>>>()
            .map(Datum::Record)
    }

    fn update_result(
        &self,
        dialect: &dyn Dialect,
        row: &mut dyn PositionedResult,
        value: &Datum,
    ) -> RelqResult<()> {
        let items = self.record(value)?;
        for (field, item) in self.fields.iter().zip(items) {
            field.update_result(dialect, row, item)?;
        }
        Ok(())
    }

    fn set_parameter(
        &self,
        dialect: &dyn Dialect,
        params: &mut dyn PositionedParameters,
        value: Option<&Datum>,
    ) -> RelqResult<()> {
        match value {
            // Absence reaches every leaf column.
            None => self
                .fields
                .iter()
                .try_for_each(|field| field.set_parameter(dialect, params, None)),
            Some(datum) => {
                let items = self.record(datum)?;
                self.fields
                    .iter()
                    .zip(items)
                    .try_for_each(|(field, item)| field.set_parameter(dialect, params, Some(item)))
            }
        }
    }
}

impl RecordLinearizer for ProductLinearizer {
    fn linearized_nodes(&self) -> Vec<Node> {
        self.fields.iter().flat_map(|f| f.linearized_nodes()).collect()
    }

    fn width(&self) -> usize {
        self.fields.iter().map(|f| f.width()).sum()
    }
}

/// Check that a product's columns match a projection, position by position.
pub fn matches_projection(linearizer: &dyn RecordLinearizer, projection: &Node) -> RelqResult<()> {
    let columns: Vec<&Node> = match projection {
        Node::Product(items) => items.iter().collect(),
        Node::Struct(fields) => fields.iter().map(|(_, n)| n).collect(),
        single => vec![single],
    };
    check_width(linearizer, columns.len())?;
    let nodes = linearizer.linearized_nodes();
    match nodes.iter().zip(columns).position(|(a, b)| a != b) {
        Some(i) => Err(RelqError::malformed(format!(
            "linearized column {} does not match the projected column",
            i
        ))),
        None => Ok(()),
    }
}
