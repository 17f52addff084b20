//! XML-RPC client over HTTP.
//!
//! This crate runs single XML-RPC calls against a remote endpoint:
//!
//! - **Client**: [`XmlRpcClient`] orchestrates payload encoding, request
//!   building, dispatch, status validation and response decoding
//! - **Transport trait**: [`HttpTransport`] is the boundary to the network;
//!   [`HyperTransport`] is the default hyper-based implementation
//! - **Errors**: [`ClientError`] names the phase a call failed in and carries
//!   remote faults
//! - **Configuration**: [`XmlRpcClientConfig`], loadable from the environment

pub mod client;
pub mod config;
pub mod error;
pub mod transport;

pub use client::XmlRpcClient;
pub use config::XmlRpcClientConfig;
pub use error::{ClientError, ErrorKind, PayloadError, RequestError};
pub use transport::{HttpTransport, HyperTransport, TransportError, TransportFuture};
