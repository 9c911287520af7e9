//! Default conversions and literal syntax shared by every dialect.

use super::{sql_type, TypeMapperDelegate};
use crate::ast::{ScalarKind, Value};
use crate::error::{RelqError, RelqResult};
use rust_decimal::Decimal;
use uuid::Uuid;

/// A delegate that only varies the type code and DDL name; everything else
/// is the standard behavior for its kind.
#[derive(Debug, Clone)]
pub struct StandardDelegate {
    kind: ScalarKind,
    sql_type: i32,
    type_name: String,
}

impl StandardDelegate {
    pub fn new(kind: ScalarKind, sql_type: i32, type_name: impl Into<String>) -> Self {
        Self {
            kind,
            sql_type,
            type_name: type_name.into(),
        }
    }

    pub fn for_kind(kind: ScalarKind) -> Self {
        let (code, name) = match kind {
            ScalarKind::Boolean => (sql_type::BOOLEAN, "BOOLEAN"),
            ScalarKind::Short => (sql_type::SMALLINT, "SMALLINT"),
            ScalarKind::Int => (sql_type::INTEGER, "INTEGER"),
            ScalarKind::Long => (sql_type::BIGINT, "BIGINT"),
            ScalarKind::Float => (sql_type::REAL, "REAL"),
            ScalarKind::Double => (sql_type::DOUBLE, "DOUBLE"),
            ScalarKind::Decimal => (sql_type::DECIMAL, "DECIMAL(21,2)"),
            ScalarKind::String => (sql_type::VARCHAR, "VARCHAR(254)"),
            ScalarKind::Date => (sql_type::DATE, "DATE"),
            ScalarKind::Time => (sql_type::TIME, "TIME"),
            ScalarKind::Timestamp => (sql_type::TIMESTAMP, "TIMESTAMP"),
            ScalarKind::Uuid => (sql_type::OTHER, "UUID"),
            ScalarKind::Bytes => (sql_type::BLOB, "BLOB"),
            ScalarKind::Blob => (sql_type::BLOB, "BLOB"),
        };
        Self::new(kind, code, name)
    }

    /// Same kind and type code, different DDL name.
    pub fn renamed(kind: ScalarKind, type_name: impl Into<String>) -> Self {
        let base = Self::for_kind(kind);
        Self::new(kind, base.sql_type, type_name)
    }
}

impl TypeMapperDelegate for StandardDelegate {
    fn kind(&self) -> ScalarKind {
        self.kind
    }

    fn sql_type(&self) -> i32 {
        self.sql_type
    }

    fn sql_type_name(&self) -> &str {
        &self.type_name
    }
}

fn mismatch(expected: ScalarKind, found: &Value) -> RelqError {
    RelqError::TypeMismatch {
        expected,
        found: found.type_name(),
    }
}

/// Normalize a value to the variant for `kind`. Integers convert between
/// widths when the value fits; floats accept integers; NULL passes through.
pub fn coerce(kind: ScalarKind, value: &Value) -> RelqResult<Value> {
    let out = match (kind, value) {
        (_, Value::Null) => Value::Null,
        (ScalarKind::Boolean, Value::Bool(b)) => Value::Bool(*b),
        (ScalarKind::Short, v) => Value::Short(as_i64(v).and_then(|n| i16::try_from(n).ok()).ok_or_else(|| mismatch(kind, v))?),
        (ScalarKind::Int, v) => Value::Int(as_i64(v).and_then(|n| i32::try_from(n).ok()).ok_or_else(|| mismatch(kind, v))?),
        (ScalarKind::Long, v) => Value::Long(as_i64(v).ok_or_else(|| mismatch(kind, v))?),
        (ScalarKind::Float, Value::Float(f)) => Value::Float(*f),
        (ScalarKind::Float, Value::Short(n)) => Value::Float(f32::from(*n)),
        (ScalarKind::Double, Value::Double(f)) => Value::Double(*f),
        (ScalarKind::Double, Value::Float(f)) => Value::Double(f64::from(*f)),
        (ScalarKind::Double, Value::Short(n)) => Value::Double(f64::from(*n)),
        (ScalarKind::Double, Value::Int(n)) => Value::Double(f64::from(*n)),
        (ScalarKind::Decimal, Value::Decimal(d)) => Value::Decimal(*d),
        (ScalarKind::Decimal, v) => match as_i64(v) {
            Some(n) => Value::Decimal(Decimal::from(n)),
            None => return Err(mismatch(kind, v)),
        },
        (ScalarKind::String, Value::String(s)) => Value::String(s.clone()),
        (ScalarKind::Date, Value::Date(d)) => Value::Date(*d),
        (ScalarKind::Time, Value::Time(t)) => Value::Time(*t),
        (ScalarKind::Timestamp, Value::Timestamp(ts)) => Value::Timestamp(*ts),
        (ScalarKind::Uuid, Value::Uuid(u)) => Value::Uuid(*u),
        (ScalarKind::Uuid, Value::String(s)) => {
            Value::Uuid(Uuid::parse_str(s).map_err(|_| mismatch(kind, value))?)
        }
        (ScalarKind::Bytes | ScalarKind::Blob, Value::Bytes(b)) => Value::Bytes(b.clone()),
        (_, v) => return Err(mismatch(kind, v)),
    };
    Ok(out)
}

fn as_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Short(n) => Some(i64::from(*n)),
        Value::Int(n) => Some(i64::from(*n)),
        Value::Long(n) => Some(*n),
        _ => None,
    }
}

/// Standard SQL literal text for an already-coerced value.
pub fn render_literal(kind: ScalarKind, value: &Value) -> RelqResult<String> {
    let text = match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Short(n) => n.to_string(),
        Value::Int(n) => n.to_string(),
        Value::Long(n) => n.to_string(),
        Value::Float(n) => n.to_string(),
        Value::Double(n) => n.to_string(),
        Value::Decimal(d) => d.to_string(),
        Value::String(s) => quote_string(s),
        Value::Date(d) => format!("{{d '{}'}}", d.format("%Y-%m-%d")),
        Value::Time(t) => format!("{{t '{}'}}", t.format("%H:%M:%S")),
        Value::Timestamp(ts) => format!("{{ts '{}'}}", ts.format("%Y-%m-%d %H:%M:%S%.f")),
        Value::Uuid(u) => quote_string(&u.to_string()),
        Value::Bytes(_) if kind == ScalarKind::Blob => {
            return Err(RelqError::malformed(
                "large object values cannot be inlined; bind them as parameters",
            ));
        }
        Value::Bytes(b) => format!("X'{}'", hex(b)),
    };
    Ok(text)
}

/// `'text'` with embedded quotes doubled.
pub fn quote_string(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

/// Uppercase hex digits, no prefix.
pub fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02X}", b)).collect()
}
