// Canonical scalar type system
//
// Every expression in the command tree carries one of these declared type
// codes. Rewrite dispatch tables key on (source, target) pairs of this enum
// rather than on runtime value classes, so "every pairing handled" is an
// exhaustive-match property rather than a lookup that can silently miss.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

/// The finite set of canonical scalar kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeCode {
    String,
    Char,
    Boolean,
    Byte,
    Short,
    Integer,
    Long,
    BigInteger,
    Float,
    Double,
    BigDecimal,
    Date,
    Time,
    Timestamp,
}

impl TypeCode {
    /// Canonical lower-case type name, as used in CONVERT target literals
    pub fn as_str(&self) -> &'static str {
        match self {
            TypeCode::String => "string",
            TypeCode::Char => "char",
            TypeCode::Boolean => "boolean",
            TypeCode::Byte => "byte",
            TypeCode::Short => "short",
            TypeCode::Integer => "integer",
            TypeCode::Long => "long",
            TypeCode::BigInteger => "biginteger",
            TypeCode::Float => "float",
            TypeCode::Double => "double",
            TypeCode::BigDecimal => "bigdecimal",
            TypeCode::Date => "date",
            TypeCode::Time => "time",
            TypeCode::Timestamp => "timestamp",
        }
    }

    /// Parse a canonical type name as found in a CONVERT target literal
    ///
    /// Returns `None` for unknown names; callers fall back to the drop
    /// rewrite rather than raising.
    pub fn from_type_name(name: &str) -> Option<TypeCode> {
        match name.trim().to_ascii_lowercase().as_str() {
            "string" => Some(TypeCode::String),
            "char" => Some(TypeCode::Char),
            "boolean" => Some(TypeCode::Boolean),
            "byte" => Some(TypeCode::Byte),
            "short" => Some(TypeCode::Short),
            "integer" => Some(TypeCode::Integer),
            "long" => Some(TypeCode::Long),
            "biginteger" => Some(TypeCode::BigInteger),
            "float" => Some(TypeCode::Float),
            "double" => Some(TypeCode::Double),
            "bigdecimal" => Some(TypeCode::BigDecimal),
            "date" => Some(TypeCode::Date),
            "time" => Some(TypeCode::Time),
            "timestamp" => Some(TypeCode::Timestamp),
            _ => None,
        }
    }

    /// True for the exact-width integral kinds
    pub fn is_integral(&self) -> bool {
        matches!(
            self,
            TypeCode::Byte
                | TypeCode::Short
                | TypeCode::Integer
                | TypeCode::Long
                | TypeCode::BigInteger
        )
    }

    /// True for any numeric kind, integral or fractional
    pub fn is_numeric(&self) -> bool {
        self.is_integral()
            || matches!(
                self,
                TypeCode::Float | TypeCode::Double | TypeCode::BigDecimal
            )
    }

    /// True for the date/time family
    pub fn is_temporal(&self) -> bool {
        matches!(self, TypeCode::Date | TypeCode::Time | TypeCode::Timestamp)
    }
}

/// A runtime datum
///
/// Decimal values are carried as `f64`, consistent with how the rest of the
/// stack downconverts decimal columns for transport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Null,
    String(String),
    Char(char),
    Boolean(bool),
    Byte(i8),
    Short(i16),
    Integer(i32),
    Long(i64),
    BigInteger(i128),
    Float(f32),
    Double(f64),
    BigDecimal(f64),
    Date(NaiveDate),
    Time(NaiveTime),
    Timestamp(NaiveDateTime),
}

impl Value {
    /// The type code of this datum, `None` for SQL NULL
    pub fn type_code(&self) -> Option<TypeCode> {
        match self {
            Value::Null => None,
            Value::String(_) => Some(TypeCode::String),
            Value::Char(_) => Some(TypeCode::Char),
            Value::Boolean(_) => Some(TypeCode::Boolean),
            Value::Byte(_) => Some(TypeCode::Byte),
            Value::Short(_) => Some(TypeCode::Short),
            Value::Integer(_) => Some(TypeCode::Integer),
            Value::Long(_) => Some(TypeCode::Long),
            Value::BigInteger(_) => Some(TypeCode::BigInteger),
            Value::Float(_) => Some(TypeCode::Float),
            Value::Double(_) => Some(TypeCode::Double),
            Value::BigDecimal(_) => Some(TypeCode::BigDecimal),
            Value::Date(_) => Some(TypeCode::Date),
            Value::Time(_) => Some(TypeCode::Time),
            Value::Timestamp(_) => Some(TypeCode::Timestamp),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Numeric view of this datum, used by cross-type comparisons
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Byte(v) => Some(*v as f64),
            Value::Short(v) => Some(*v as f64),
            Value::Integer(v) => Some(*v as f64),
            Value::Long(v) => Some(*v as f64),
            Value::BigInteger(v) => Some(*v as f64),
            Value::Float(v) => Some(*v as f64),
            Value::Double(v) => Some(*v),
            Value::BigDecimal(v) => Some(*v),
            _ => None,
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::String(v) => write!(f, "{}", v),
            Value::Char(v) => write!(f, "{}", v),
            Value::Boolean(v) => write!(f, "{}", v),
            Value::Byte(v) => write!(f, "{}", v),
            Value::Short(v) => write!(f, "{}", v),
            Value::Integer(v) => write!(f, "{}", v),
            Value::Long(v) => write!(f, "{}", v),
            Value::BigInteger(v) => write!(f, "{}", v),
            Value::Float(v) => write!(f, "{}", v),
            Value::Double(v) => write!(f, "{}", v),
            Value::BigDecimal(v) => write!(f, "{}", v),
            Value::Date(v) => write!(f, "{}", v.format("%Y-%m-%d")),
            Value::Time(v) => write!(f, "{}", v.format("%H:%M:%S")),
            Value::Timestamp(v) => write!(f, "{}", v.format("%Y-%m-%d %H:%M:%S%.f")),
        }
    }
}
