//! XML-RPC model types.
//!
//! This crate defines the in-memory side of the XML-RPC wire protocol:
//!
//! - [`Value`]: the closed set of XML-RPC types (`int`, `double`, `boolean`,
//!   `string`, `dateTime.iso8601`, `base64`, `array`, `struct`)
//! - [`IntoValue`] / [`ToParams`]: classification of native Rust arguments
//! - [`MethodCall`]: a method name plus positional parameters
//! - [`Fault`] / [`MethodResponse`]: the two shapes of a response
//!
//! Nothing here performs I/O or touches XML; see `xmlrpc-xml` for the codec.

pub mod call;
pub mod fault;
pub mod value;

pub use call::{ArgumentError, MethodCall, ToParams};
pub use fault::{FAULT_CODE, FAULT_STRING, Fault, MethodResponse};
pub use value::{DATETIME_FORMAT, DATETIME_YEARS, IntoValue, Value, ValueError};
