//! Vendor delegates for databases that disagree with the standard mapping.

use super::standard::{coerce, hex, render_literal};
use super::{sql_type, TypeMapperDelegate};
use crate::ast::{ScalarKind, Value};
use crate::error::{RelqError, RelqResult};
use uuid::Uuid;

/// Booleans stored as an integer column, rendered as `1` / `0`.
#[derive(Debug, Clone)]
pub struct NumericBooleanDelegate {
    sql_type: i32,
    type_name: String,
}

impl NumericBooleanDelegate {
    pub fn new(sql_type: i32, type_name: impl Into<String>) -> Self {
        Self {
            sql_type,
            type_name: type_name.into(),
        }
    }
}

impl TypeMapperDelegate for NumericBooleanDelegate {
    fn kind(&self) -> ScalarKind {
        ScalarKind::Boolean
    }

    fn sql_type(&self) -> i32 {
        self.sql_type
    }

    fn sql_type_name(&self) -> &str {
        &self.type_name
    }

    fn value_to_sql_literal(&self, value: &Value) -> RelqResult<String> {
        Ok(match self.to_cell(value)? {
            Value::Int(n) => n.to_string(),
            _ => "null".to_string(),
        })
    }

    fn to_cell(&self, value: &Value) -> RelqResult<Value> {
        match value {
            Value::Null => Ok(Value::Null),
            Value::Bool(b) => Ok(Value::Int(i32::from(*b))),
            other => Err(RelqError::TypeMismatch {
                expected: ScalarKind::Boolean,
                found: other.type_name(),
            }),
        }
    }

    fn from_cell(&self, cell: Value) -> RelqResult<Value> {
        match cell {
            Value::Bool(b) => Ok(Value::Bool(b)),
            Value::Short(n) => Ok(Value::Bool(n != 0)),
            Value::Int(n) => Ok(Value::Bool(n != 0)),
            Value::Long(n) => Ok(Value::Bool(n != 0)),
            Value::Null => Ok(Value::Null),
            other => Err(RelqError::TypeMismatch {
                expected: ScalarKind::Boolean,
                found: other.type_name(),
            }),
        }
    }
}

/// UUIDs stored as 36-character text.
#[derive(Debug, Clone, Default)]
pub struct TextUuidDelegate;

impl TypeMapperDelegate for TextUuidDelegate {
    fn kind(&self) -> ScalarKind {
        ScalarKind::Uuid
    }

    fn sql_type(&self) -> i32 {
        sql_type::CHAR
    }

    fn sql_type_name(&self) -> &str {
        "CHAR(36)"
    }

    fn to_cell(&self, value: &Value) -> RelqResult<Value> {
        Ok(match coerce(ScalarKind::Uuid, value)? {
            Value::Uuid(u) => Value::String(u.hyphenated().to_string()),
            other => other,
        })
    }

    fn from_cell(&self, cell: Value) -> RelqResult<Value> {
        match cell {
            Value::String(s) => Uuid::parse_str(s.trim())
                .map(Value::Uuid)
                .map_err(|_| RelqError::TypeMismatch {
                    expected: ScalarKind::Uuid,
                    found: "string",
                }),
            other => coerce(ScalarKind::Uuid, &other),
        }
    }
}

/// Postgres `bytea`, rendered as an escaped hex string.
#[derive(Debug, Clone, Default)]
pub struct PostgresByteaDelegate;

impl TypeMapperDelegate for PostgresByteaDelegate {
    fn kind(&self) -> ScalarKind {
        ScalarKind::Bytes
    }

    fn sql_type(&self) -> i32 {
        sql_type::BINARY
    }

    fn sql_type_name(&self) -> &str {
        "BYTEA"
    }

    fn value_to_sql_literal(&self, value: &Value) -> RelqResult<String> {
        match coerce(ScalarKind::Bytes, value)? {
            Value::Bytes(b) => Ok(format!("'\\x{}'::bytea", hex(&b).to_lowercase())),
            other => render_literal(ScalarKind::Bytes, &other),
        }
    }
}

/// Binary kinds on SQL Server, rendered as `0x..`.
#[derive(Debug, Clone)]
pub struct VarbinaryDelegate {
    kind: ScalarKind,
}

impl VarbinaryDelegate {
    pub fn new(kind: ScalarKind) -> Self {
        Self { kind }
    }
}

impl TypeMapperDelegate for VarbinaryDelegate {
    fn kind(&self) -> ScalarKind {
        self.kind
    }

    fn sql_type(&self) -> i32 {
        sql_type::VARBINARY
    }

    fn sql_type_name(&self) -> &str {
        "VARBINARY(MAX)"
    }

    fn value_to_sql_literal(&self, value: &Value) -> RelqResult<String> {
        match coerce(self.kind, value)? {
            Value::Bytes(b) => Ok(format!("0x{}", hex(&b))),
            other => render_literal(self.kind, &other),
        }
    }
}

/// Date and time kinds on Access: `DATETIME` columns and `#...#` literals.
#[derive(Debug, Clone)]
pub struct AccessDateDelegate {
    kind: ScalarKind,
}

impl AccessDateDelegate {
    pub fn new(kind: ScalarKind) -> Self {
        Self { kind }
    }
}

impl TypeMapperDelegate for AccessDateDelegate {
    fn kind(&self) -> ScalarKind {
        self.kind
    }

    fn sql_type(&self) -> i32 {
        match self.kind {
            ScalarKind::Date => sql_type::DATE,
            ScalarKind::Time => sql_type::TIME,
            _ => sql_type::TIMESTAMP,
        }
    }

    fn sql_type_name(&self) -> &str {
        "DATETIME"
    }

    fn value_to_sql_literal(&self, value: &Value) -> RelqResult<String> {
        Ok(match coerce(self.kind, value)? {
            Value::Date(d) => format!("#{}#", d.format("%Y-%m-%d")),
            Value::Time(t) => format!("#{}#", t.format("%H:%M:%S")),
            Value::Timestamp(ts) => format!("#{}#", ts.format("%Y-%m-%d %H:%M:%S")),
            _ => "null".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cursor::{ParameterBuffer, PositionedParameters};
    use chrono::NaiveDate;

    #[test]
    fn test_numeric_boolean() {
        let d = NumericBooleanDelegate::new(sql_type::SMALLINT, "SMALLINT");
        assert_eq!(d.value_to_sql_literal(&Value::Bool(true)).unwrap(), "1");
        assert_eq!(d.value_to_sql_literal(&Value::Bool(false)).unwrap(), "0");
        assert_eq!(d.from_cell(Value::Short(0)).unwrap(), Value::Bool(false));

        let mut buf = ParameterBuffer::new();
        d.set_value(&Value::Bool(true), &mut buf).unwrap();
        assert_eq!(buf.position(), 1);
        assert_eq!(d.from_cell(buf.into_row().into_cells().remove(0)).unwrap(), Value::Bool(true));
    }

    #[test]
    fn test_text_uuid_round_trip() {
        let d = TextUuidDelegate;
        let u = Uuid::from_u128(0x1234);
        let cell = d.to_cell(&Value::Uuid(u)).unwrap();
        assert!(matches!(&cell, Value::String(s) if s.len() == 36));
        assert_eq!(d.from_cell(cell).unwrap(), Value::Uuid(u));
    }

    #[test]
    fn test_vendor_literals() {
        let bytes = Value::Bytes(vec![0x0a, 0xff]);
        assert_eq!(VarbinaryDelegate::new(ScalarKind::Bytes).value_to_sql_literal(&bytes).unwrap(), "0x0AFF");
        assert_eq!(PostgresByteaDelegate.value_to_sql_literal(&bytes).unwrap(), "'\\x0aff'::bytea");

        let date = NaiveDate::from_ymd_opt(2020, 1, 31).unwrap();
        assert_eq!(
            AccessDateDelegate::new(ScalarKind::Date).value_to_sql_literal(&Value::Date(date)).unwrap(),
            "#2020-01-31#"
        );
    }
}
