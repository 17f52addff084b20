//! Method calls and positional parameter lists.

use crate::value::{IntoValue, Value, ValueError};

/// A single XML-RPC method call: a method name and its ordered parameters.
///
/// The method name is carried verbatim. Whether it names a real method, and
/// whether the parameters match its signature, is for the remote endpoint to
/// decide.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodCall {
    /// Name of the remote method (may be empty).
    pub method_name: String,
    /// Positional parameters.
    pub params: Vec<Value>,
}

impl MethodCall {
    /// Create a method call from already classified parameters.
    #[must_use]
    pub fn new(method_name: impl Into<String>, params: Vec<Value>) -> Self {
        Self {
            method_name: method_name.into(),
            params,
        }
    }

    /// Create a method call by classifying native parameters.
    ///
    /// # Errors
    ///
    /// Returns [`ArgumentError`] naming the first parameter that has no
    /// XML-RPC representation.
    pub fn with_params<P: ToParams>(
        method_name: impl Into<String>,
        params: P,
    ) -> Result<Self, ArgumentError> {
        Ok(Self::new(method_name, params.to_params()?))
    }
}

/// A parameter that could not be classified, with its position in the call.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("argument {position}: {source}")]
pub struct ArgumentError {
    /// Zero-based parameter position.
    pub position: usize,
    /// Why the parameter was rejected.
    #[source]
    pub source: ValueError,
}

/// Conversion of a native argument list into positional [`Value`]s.
///
/// Implemented for `()`, tuples of up to eight [`IntoValue`] items,
/// homogeneous `Vec`s and arrays, and `&[Value]`.
pub trait ToParams {
    /// Classify every argument in order.
    ///
    /// # Errors
    ///
    /// Returns [`ArgumentError`] for the first argument that fails.
    fn to_params(self) -> Result<Vec<Value>, ArgumentError>;
}

fn classify<T: IntoValue>(position: usize, arg: T) -> Result<Value, ArgumentError> {
    arg.into_value()
        .map_err(|source| ArgumentError { position, source })
}

impl ToParams for () {
    fn to_params(self) -> Result<Vec<Value>, ArgumentError> {
        Ok(Vec::new())
    }
}

impl<T: IntoValue> ToParams for Vec<T> {
    fn to_params(self) -> Result<Vec<Value>, ArgumentError> {
        self.into_iter()
            .enumerate()
            .map(|(i, arg)| classify(i, arg))
            .collect()
    }
}

impl<T: IntoValue, const N: usize> ToParams for [T; N] {
    fn to_params(self) -> Result<Vec<Value>, ArgumentError> {
        self.into_iter()
            .enumerate()
            .map(|(i, arg)| classify(i, arg))
            .collect()
    }
}

impl ToParams for &[Value] {
    fn to_params(self) -> Result<Vec<Value>, ArgumentError> {
        Ok(self.to_vec())
    }
}

macro_rules! impl_tuple_params {
    ($($idx:tt $name:ident),+) => {
        impl<$($name: IntoValue),+> ToParams for ($($name,)+) {
            fn to_params(self) -> Result<Vec<Value>, ArgumentError> {
                Ok(vec![$(classify($idx, self.$idx)?),+])
            }
        }
    };
}

impl_tuple_params!(0 A);
impl_tuple_params!(0 A, 1 B);
impl_tuple_params!(0 A, 1 B, 2 C);
impl_tuple_params!(0 A, 1 B, 2 C, 3 D);
impl_tuple_params!(0 A, 1 B, 2 C, 3 D, 4 E);
impl_tuple_params!(0 A, 1 B, 2 C, 3 D, 4 E, 5 F);
impl_tuple_params!(0 A, 1 B, 2 C, 3 D, 4 E, 5 F, 6 G);
impl_tuple_params!(0 A, 1 B, 2 C, 3 D, 4 E, 5 F, 6 G, 7 H);
