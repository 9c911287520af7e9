//! Per-kind type mapping: SQL type names, literal rendering, and cursor
//! conversions for every [`ScalarKind`].
//!
//! Each dialect owns a [`TypeMappers`] table built from
//! [`TypeMappers::standard`] with vendor delegates swapped in for the kinds
//! whose default is wrong for that database.

pub mod standard;
pub mod vendor;

pub use standard::StandardDelegate;
pub use vendor::{AccessDateDelegate, NumericBooleanDelegate, PostgresByteaDelegate, TextUuidDelegate, VarbinaryDelegate};

use crate::ast::{ScalarKind, Value};
use crate::cursor::{PositionedParameters, PositionedResult};
use crate::error::{RelqError, RelqResult};
use std::sync::Arc;

/// JDBC type codes, used to type NULL binds.
pub mod sql_type {
    pub const BIT: i32 = -7;
    pub const TINYINT: i32 = -6;
    pub const SMALLINT: i32 = 5;
    pub const INTEGER: i32 = 4;
    pub const BIGINT: i32 = -5;
    pub const REAL: i32 = 7;
    pub const DOUBLE: i32 = 8;
    pub const DECIMAL: i32 = 3;
    pub const CHAR: i32 = 1;
    pub const VARCHAR: i32 = 12;
    pub const DATE: i32 = 91;
    pub const TIME: i32 = 92;
    pub const TIMESTAMP: i32 = 93;
    pub const BINARY: i32 = -2;
    pub const VARBINARY: i32 = -3;
    pub const BLOB: i32 = 2004;
    pub const BOOLEAN: i32 = 16;
    pub const OTHER: i32 = 1111;
}

/// Strategy for one scalar kind.
///
/// Only `kind`, `sql_type` and `sql_type_name` are required. The rest
/// default to the standard conversions in [`standard`], so a vendor
/// delegate overrides just the functions its database disagrees on.
pub trait TypeMapperDelegate: Send + Sync + std::fmt::Debug {
    fn kind(&self) -> ScalarKind;

    /// JDBC-style type code.
    fn sql_type(&self) -> i32;

    /// Column type used in DDL.
    fn sql_type_name(&self) -> &str;

    /// Render a value as inline SQL text.
    fn value_to_sql_literal(&self, value: &Value) -> RelqResult<String> {
        standard::render_literal(self.kind(), &standard::coerce(self.kind(), value)?)
    }

    /// Convert a value into what gets written to a cursor.
    fn to_cell(&self, value: &Value) -> RelqResult<Value> {
        standard::coerce(self.kind(), value)
    }

    /// Convert a cell read from a cursor into this kind's value.
    fn from_cell(&self, cell: Value) -> RelqResult<Value> {
        standard::coerce(self.kind(), &cell)
    }

    fn set_value(&self, value: &Value, params: &mut dyn PositionedParameters) -> RelqResult<()> {
        if value.is_null() {
            return Err(RelqError::UnexpectedNull {
                position: params.position(),
            });
        }
        params.set_next(self.to_cell(value)?);
        Ok(())
    }

    fn set_option(&self, value: Option<&Value>, params: &mut dyn PositionedParameters) -> RelqResult<()> {
        match value {
            Some(v) if !v.is_null() => self.set_value(v, params),
            _ => {
                params.set_null(self.sql_type());
                Ok(())
            }
        }
    }

    fn next_value(&self, row: &mut dyn PositionedResult) -> RelqResult<Value> {
        let position = row.position();
        match row.next_cell()? {
            Value::Null => Err(RelqError::UnexpectedNull { position }),
            cell => self.from_cell(cell),
        }
    }

    fn next_option(&self, row: &mut dyn PositionedResult) -> RelqResult<Option<Value>> {
        match row.next_cell()? {
            Value::Null => Ok(None),
            cell => self.from_cell(cell).map(Some),
        }
    }

    fn update_value(&self, value: &Value, row: &mut dyn PositionedResult) -> RelqResult<()> {
        if value.is_null() {
            return Err(RelqError::UnexpectedNull {
                position: row.position(),
            });
        }
        row.update_cell(self.to_cell(value)?)
    }

    fn update_option(&self, value: Option<&Value>, row: &mut dyn PositionedResult) -> RelqResult<()> {
        match value {
            Some(v) if !v.is_null() => self.update_value(v, row),
            _ => row.update_cell(Value::Null),
        }
    }
}

/// One delegate per [`ScalarKind`], indexed by [`ScalarKind::index`].
#[derive(Debug, Clone)]
pub struct TypeMappers {
    delegates: Vec<Arc<dyn TypeMapperDelegate>>,
}

impl TypeMappers {
    /// The ANSI-ish defaults every dialect starts from.
    pub fn standard() -> Self {
        let delegates = ScalarKind::ALL
            .iter()
            .map(|&kind| Arc::new(StandardDelegate::for_kind(kind)) as Arc<dyn TypeMapperDelegate>)
            .collect();
        Self { delegates }
    }

    /// Replace the delegate for `delegate.kind()`.
    pub fn with(mut self, delegate: impl TypeMapperDelegate + 'static) -> Self {
        let idx = delegate.kind().index();
        self.delegates[idx] = Arc::new(delegate);
        self
    }

    pub fn delegate(&self, kind: ScalarKind) -> &dyn TypeMapperDelegate {
        self.delegates[kind.index()].as_ref()
    }

    /// Shared handle, for setters that outlive the build call.
    pub fn shared(&self, kind: ScalarKind) -> Arc<dyn TypeMapperDelegate> {
        Arc::clone(&self.delegates[kind.index()])
    }
}

impl Default for TypeMappers {
    fn default() -> Self {
        Self::standard()
    }
}
