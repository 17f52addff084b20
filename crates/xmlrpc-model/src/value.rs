//! XML-RPC `Value` type and native value classification.
//!
//! `Value` is a closed tagged union where exactly one variant is present.
//! Native Rust values are classified into a variant through [`IntoValue`];
//! inputs that have no wire representation (an absent value, an integer
//! outside the 32-bit range, a non-finite double) are rejected before any
//! XML is produced.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::ops::RangeInclusive;

use bytes::Bytes;
use chrono::{Datelike, NaiveDateTime};

/// Wire format of `dateTime.iso8601` values.
pub const DATETIME_FORMAT: &str = "%Y%m%dT%H:%M:%S";

/// Years that fit the four-digit `YYYY` field of [`DATETIME_FORMAT`].
pub const DATETIME_YEARS: RangeInclusive<i32> = 0..=9999;

/// XML-RPC value.
///
/// Arrays keep element order. Struct members are keyed by name and iterate
/// in name order, which keeps serialized payloads deterministic.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// 32-bit signed integer (`int` / `i4`).
    Int(i32),
    /// IEEE-754 double (`double`).
    Double(f64),
    /// Boolean (`boolean`, `0`/`1` on the wire).
    Boolean(bool),
    /// String (`string`, or an untyped `value`).
    String(String),
    /// Timestamp without timezone (`dateTime.iso8601`).
    DateTime(NaiveDateTime),
    /// Binary payload (`base64`).
    Base64(Bytes),
    /// Ordered sequence of values (`array`).
    Array(Vec<Value>),
    /// Named members (`struct`).
    Struct(BTreeMap<String, Value>),
}

impl Value {
    /// Returns `true` if this is an `Int` value.
    #[must_use]
    pub fn is_int(&self) -> bool {
        matches!(self, Self::Int(_))
    }

    /// Returns `true` if this is a `Double` value.
    #[must_use]
    pub fn is_double(&self) -> bool {
        matches!(self, Self::Double(_))
    }

    /// Returns `true` if this is a `Boolean` value.
    #[must_use]
    pub fn is_boolean(&self) -> bool {
        matches!(self, Self::Boolean(_))
    }

    /// Returns `true` if this is a `String` value.
    #[must_use]
    pub fn is_string(&self) -> bool {
        matches!(self, Self::String(_))
    }

    /// Returns `true` if this is an `Array` value.
    #[must_use]
    pub fn is_array(&self) -> bool {
        matches!(self, Self::Array(_))
    }

    /// Returns `true` if this is a `Struct` value.
    #[must_use]
    pub fn is_struct(&self) -> bool {
        matches!(self, Self::Struct(_))
    }

    /// Returns the integer if this is an `Int` variant.
    #[must_use]
    pub fn as_i32(&self) -> Option<i32> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Returns the double if this is a `Double` variant.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Double(d) => Some(*d),
            _ => None,
        }
    }

    /// Returns the boolean if this is a `Boolean` variant.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the string if this is a `String` variant.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the timestamp if this is a `DateTime` variant.
    #[must_use]
    pub fn as_datetime(&self) -> Option<&NaiveDateTime> {
        match self {
            Self::DateTime(dt) => Some(dt),
            _ => None,
        }
    }

    /// Returns the bytes if this is a `Base64` variant.
    #[must_use]
    pub fn as_bytes(&self) -> Option<&Bytes> {
        match self {
            Self::Base64(b) => Some(b),
            _ => None,
        }
    }

    /// Returns the elements if this is an `Array` variant.
    #[must_use]
    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Self::Array(a) => Some(a),
            _ => None,
        }
    }

    /// Returns the members if this is a `Struct` variant.
    #[must_use]
    pub fn as_struct(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Self::Struct(m) => Some(m),
            _ => None,
        }
    }

    /// Returns the wire tag of this value (e.g. `"int"`, `"dateTime.iso8601"`).
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Int(_) => "int",
            Self::Double(_) => "double",
            Self::Boolean(_) => "boolean",
            Self::String(_) => "string",
            Self::DateTime(_) => "dateTime.iso8601",
            Self::Base64(_) => "base64",
            Self::Array(_) => "array",
            Self::Struct(_) => "struct",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(i) => write!(f, "{i}"),
            Self::Double(d) => write!(f, "{d}"),
            Self::Boolean(b) => write!(f, "{b}"),
            Self::String(s) => write!(f, "{s:?}"),
            Self::DateTime(dt) => write!(f, "{}", dt.format(DATETIME_FORMAT)),
            Self::Base64(b) => write!(f, "<{} bytes>", b.len()),
            Self::Array(a) => {
                f.write_str("[")?;
                for (i, v) in a.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{v}")?;
                }
                f.write_str("]")
            }
            Self::Struct(m) => {
                f.write_str("{")?;
                for (i, (k, v)) in m.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{k}: {v}")?;
                }
                f.write_str("}")
            }
        }
    }
}

/// Reasons a native value cannot be classified into a [`Value`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValueError {
    /// An absent value; XML-RPC has no nil.
    #[error("nil value is not supported")]
    Nil,

    /// An integer outside the `i32` range.
    #[error("integer {0} does not fit in a 32-bit int")]
    IntegerOutOfRange(i128),

    /// NaN or an infinity.
    #[error("double {0} is not finite")]
    NonFiniteDouble(f64),

    /// A timestamp whose year does not fit in four digits.
    #[error("timestamp {0} is outside years 0000-9999")]
    DateTimeOutOfRange(NaiveDateTime),

    /// A failure inside an array element.
    #[error("array element {index}: {source}")]
    Element {
        /// Zero-based element index.
        index: usize,
        /// The underlying failure.
        #[source]
        source: Box<ValueError>,
    },

    /// A failure inside a struct member.
    #[error("struct member {name:?}: {source}")]
    Member {
        /// Member name.
        name: String,
        /// The underlying failure.
        #[source]
        source: Box<ValueError>,
    },
}

/// Conversion of a native value into an XML-RPC [`Value`].
pub trait IntoValue {
    /// Classify `self` as a [`Value`].
    ///
    /// # Errors
    ///
    /// Returns [`ValueError`] if the value has no XML-RPC representation.
    fn into_value(self) -> Result<Value, ValueError>;
}

impl IntoValue for Value {
    fn into_value(self) -> Result<Value, ValueError> {
        Ok(self)
    }
}

impl IntoValue for bool {
    fn into_value(self) -> Result<Value, ValueError> {
        Ok(Value::Boolean(self))
    }
}

impl IntoValue for String {
    fn into_value(self) -> Result<Value, ValueError> {
        Ok(Value::String(self))
    }
}

impl IntoValue for &str {
    fn into_value(self) -> Result<Value, ValueError> {
        Ok(Value::String(self.to_owned()))
    }
}

impl IntoValue for &String {
    fn into_value(self) -> Result<Value, ValueError> {
        Ok(Value::String(self.clone()))
    }
}

impl IntoValue for NaiveDateTime {
    fn into_value(self) -> Result<Value, ValueError> {
        if DATETIME_YEARS.contains(&self.year()) {
            Ok(Value::DateTime(self))
        } else {
            Err(ValueError::DateTimeOutOfRange(self))
        }
    }
}

impl IntoValue for chrono::DateTime<chrono::Utc> {
    fn into_value(self) -> Result<Value, ValueError> {
        self.naive_utc().into_value()
    }
}

impl IntoValue for Bytes {
    fn into_value(self) -> Result<Value, ValueError> {
        Ok(Value::Base64(self))
    }
}

macro_rules! impl_lossless_int {
    ($($t:ty),*) => {
        $(
            impl IntoValue for $t {
                fn into_value(self) -> Result<Value, ValueError> {
                    Ok(Value::Int(i32::from(self)))
                }
            }
        )*
    };
}

impl_lossless_int!(i8, i16, i32, u8, u16);

macro_rules! impl_checked_int {
    ($($t:ty),*) => {
        $(
            impl IntoValue for $t {
                fn into_value(self) -> Result<Value, ValueError> {
                    i32::try_from(self)
                        .map(Value::Int)
                        .map_err(|_| ValueError::IntegerOutOfRange(self as i128))
                }
            }
        )*
    };
}

impl_checked_int!(i64, u32, u64, isize, usize);

impl IntoValue for f64 {
    fn into_value(self) -> Result<Value, ValueError> {
        if self.is_finite() {
            Ok(Value::Double(self))
        } else {
            Err(ValueError::NonFiniteDouble(self))
        }
    }
}

impl IntoValue for f32 {
    fn into_value(self) -> Result<Value, ValueError> {
        f64::from(self).into_value()
    }
}

impl<T: IntoValue> IntoValue for Option<T> {
    fn into_value(self) -> Result<Value, ValueError> {
        match self {
            Some(v) => v.into_value(),
            None => Err(ValueError::Nil),
        }
    }
}

impl<T: IntoValue> IntoValue for Vec<T> {
    fn into_value(self) -> Result<Value, ValueError> {
        collect_array(self)
    }
}

impl<T: IntoValue, const N: usize> IntoValue for [T; N] {
    fn into_value(self) -> Result<Value, ValueError> {
        collect_array(self)
    }
}

impl<K: Into<String>, V: IntoValue, S> IntoValue for HashMap<K, V, S> {
    fn into_value(self) -> Result<Value, ValueError> {
        collect_struct(self)
    }
}

impl<K: Into<String>, V: IntoValue> IntoValue for BTreeMap<K, V> {
    fn into_value(self) -> Result<Value, ValueError> {
        collect_struct(self)
    }
}

impl IntoValue for serde_json::Value {
    fn into_value(self) -> Result<Value, ValueError> {
        match self {
            serde_json::Value::Null => Err(ValueError::Nil),
            serde_json::Value::Bool(b) => Ok(Value::Boolean(b)),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    i.into_value()
                } else if let Some(u) = n.as_u64() {
                    u.into_value()
                } else {
                    n.as_f64()
                        .ok_or(ValueError::NonFiniteDouble(f64::NAN))?
                        .into_value()
                }
            }
            serde_json::Value::String(s) => Ok(Value::String(s)),
            serde_json::Value::Array(a) => collect_array(a),
            serde_json::Value::Object(o) => collect_struct(o),
        }
    }
}

fn collect_array<I>(items: I) -> Result<Value, ValueError>
where
    I: IntoIterator,
    I::Item: IntoValue,
{
    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            item.into_value().map_err(|e| ValueError::Element {
                index,
                source: Box::new(e),
            })
        })
        .collect::<Result<Vec<_>, _>>()
        .map(Value::Array)
}

fn collect_struct<I, K, V>(members: I) -> Result<Value, ValueError>
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: IntoValue,
{
    let mut out = BTreeMap::new();
    for (name, value) in members {
        let name = name.into();
        match value.into_value() {
            Ok(v) => {
                out.insert(name, v);
            }
            Err(e) => {
                return Err(ValueError::Member {
                    name,
                    source: Box::new(e),
                });
            }
        }
    }
    Ok(Value::Struct(out))
}
