//! Fault responses and the decoded shape of a `methodResponse`.

use std::fmt;

use crate::value::Value;

/// Member name carrying the numeric fault code.
pub const FAULT_CODE: &str = "faultCode";

/// Member name carrying the human-readable fault message.
pub const FAULT_STRING: &str = "faultString";

/// A remote fault: the error half of a `methodResponse`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fault {
    /// Value of `faultCode`.
    pub code: i32,
    /// Value of `faultString`.
    pub message: String,
}

impl Fault {
    /// Create a fault.
    #[must_use]
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// The struct value this fault is carried as on the wire.
    #[must_use]
    pub fn to_value(&self) -> Value {
        Value::Struct(
            [
                (FAULT_CODE.to_owned(), Value::Int(self.code)),
                (FAULT_STRING.to_owned(), Value::String(self.message.clone())),
            ]
            .into_iter()
            .collect(),
        )
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "fault {}: {}", self.code, self.message)
    }
}

/// A decoded `methodResponse`: either the single result value or a fault.
#[derive(Debug, Clone, PartialEq)]
pub enum MethodResponse {
    /// The value of the only `<param>`.
    Success(Value),
    /// A well-formed fault.
    Fault(Fault),
}

impl MethodResponse {
    /// Returns `true` if this response carries a fault.
    #[must_use]
    pub fn is_fault(&self) -> bool {
        matches!(self, Self::Fault(_))
    }

    /// Convert into a `Result`, the success value on the left.
    ///
    /// # Errors
    ///
    /// Returns the [`Fault`] if this response carries one.
    pub fn into_result(self) -> Result<Value, Fault> {
        match self {
            Self::Success(v) => Ok(v),
            Self::Fault(f) => Err(f),
        }
    }
}
