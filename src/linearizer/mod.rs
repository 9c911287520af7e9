//! Value linearizers: conversion between structured values and the flat,
//! positional column sequence a statement reads or binds.
//!
//! A [`RecordLinearizer`]'s `linearized_nodes` must line up one-to-one with
//! the columns the query's `select` emits. Execution zips cursor columns
//! to linearizer slots by position only.

pub mod collection;
pub mod column;
pub mod product;

pub use collection::{CollectionBuilder, CollectionLinearizer, DistinctBuilder, ListBuilder};
pub use column::ColumnLinearizer;
pub use product::{matches_projection, ProductLinearizer};

use crate::ast::{Node, Value};
use crate::cursor::{ParameterBuffer, PositionedParameters, PositionedResult};
use crate::error::{RelqError, RelqResult};
use crate::transpiler::{Capability, Dialect};
use serde::{Deserialize, Serialize};

/// Widest record a [`ProductLinearizer`] accepts.
pub const MAX_TUPLE_ARITY: usize = 22;

/// A structured value as seen by linearizers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Datum {
    Scalar(Value),
    /// Fixed-arity tuple, one entry per field linearizer.
    Record(Vec<Datum>),
    Collection(Vec<Datum>),
}

impl Datum {
    pub fn scalar(value: impl Into<Value>) -> Self {
        Datum::Scalar(value.into())
    }

    pub fn null() -> Self {
        Datum::Scalar(Value::Null)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Datum::Scalar(Value::Null))
    }

    pub fn as_scalar(&self) -> Option<&Value> {
        match self {
            Datum::Scalar(v) => Some(v),
            _ => None,
        }
    }

    pub fn shape_name(&self) -> &'static str {
        match self {
            Datum::Scalar(_) => "scalar",
            Datum::Record(_) => "record",
            Datum::Collection(_) => "collection",
        }
    }
}

impl From<Value> for Datum {
    fn from(value: Value) -> Self {
        Datum::Scalar(value)
    }
}

/// Reads, updates and binds one structured value.
pub trait ValueLinearizer: Send + Sync + std::fmt::Debug {
    /// Consume this linearizer's columns from `row` and assemble a value.
    fn get_result(&self, dialect: &dyn Dialect, row: &mut dyn PositionedResult) -> RelqResult<Datum>;

    /// Write `value` back into this linearizer's columns of `row`.
    fn update_result(
        &self,
        dialect: &dyn Dialect,
        row: &mut dyn PositionedResult,
        value: &Datum,
    ) -> RelqResult<()>;

    /// Bind `value`, or SQL NULL for every underlying column when `None`.
    fn set_parameter(
        &self,
        dialect: &dyn Dialect,
        params: &mut dyn PositionedParameters,
        value: Option<&Datum>,
    ) -> RelqResult<()>;
}

/// A linearizer that knows the column nodes it maps to.
pub trait RecordLinearizer: ValueLinearizer {
    /// Column nodes in cursor order.
    fn linearized_nodes(&self) -> Vec<Node>;

    fn width(&self) -> usize {
        self.linearized_nodes().len()
    }
}

/// Read a whole row, checking that its width matches the linearizer.
pub fn read_row(
    dialect: &dyn Dialect,
    linearizer: &dyn RecordLinearizer,
    row: &mut dyn PositionedResult,
) -> RelqResult<Datum> {
    check_width(linearizer, row.width())?;
    linearizer.get_result(dialect, row)
}

/// Update a whole row in place. Needs an updatable cursor.
pub fn update_row(
    dialect: &dyn Dialect,
    linearizer: &dyn RecordLinearizer,
    row: &mut dyn PositionedResult,
    value: &Datum,
) -> RelqResult<()> {
    dialect.require(Capability::MutableCursor)?;
    check_width(linearizer, row.width())?;
    row.rewind();
    linearizer.update_result(dialect, row, value)
}

/// Bind a value into a fresh in-memory buffer.
pub fn bind(
    dialect: &dyn Dialect,
    linearizer: &dyn ValueLinearizer,
    value: Option<&Datum>,
) -> RelqResult<ParameterBuffer> {
    let mut buf = ParameterBuffer::new();
    linearizer.set_parameter(dialect, &mut buf, value)?;
    Ok(buf)
}

pub(crate) fn check_width(linearizer: &dyn RecordLinearizer, got: usize) -> RelqResult<()> {
    let expected = linearizer.width();
    if expected != got {
        return Err(RelqError::LinearizationArityMismatch { expected, got });
    }
    Ok(())
}

pub(crate) fn shape_error(expected: &str, got: &Datum) -> RelqError {
    RelqError::malformed(format!("expected a {} value, got a {}", expected, got.shape_name()))
}
