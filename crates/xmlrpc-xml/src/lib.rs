//! XML-RPC XML codec.
//!
//! This crate converts between the model types of `xmlrpc-model` and the
//! XML documents exchanged on the wire. It provides:
//!
//! - **Serialization** ([`serialize`]): writes `methodCall` and
//!   `methodResponse` documents with quick-xml's element writer
//! - **Deserialization** ([`deserialize`]): a strict decoder that rejects any
//!   document not matching the XML-RPC grammar
//!
//! The codec holds no state and performs no network I/O.

pub mod deserialize;
pub mod error;
pub mod serialize;

pub use deserialize::{MAX_DEPTH, from_method_call, from_method_response};
pub use error::XmlError;
pub use serialize::{
    METHOD_CALL, METHOD_RESPONSE, XmlRpcSerialize, method_call_to_xml, method_response_to_xml,
    to_xml,
};
