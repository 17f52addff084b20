//! Client error types.
//!
//! [`ClientError`] has one variant per phase of a call, so a caller can
//! always tell where a call stopped. Remote faults are translated into
//! [`ClientError::Fault`] through `From<Fault>`.

use std::fmt;

use xmlrpc_model::{ArgumentError, Fault};
use xmlrpc_xml::XmlError;

use crate::transport::TransportError;

/// Field-less discriminant of [`ClientError`], for programmatic matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Arguments could not be classified or encoded.
    PayloadPreparationFailed,
    /// The HTTP request could not be built.
    RequestPreparationFailed,
    /// The transport failed, timed out or was cancelled.
    TransportFailure,
    /// The server answered with a non-2xx status.
    UnexpectedStatus,
    /// The response body is not a valid `methodResponse`.
    UnparsableResponse,
    /// The server returned a well-formed fault.
    RemoteFault,
}

impl ErrorKind {
    /// Returns the kind name as a static string.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::PayloadPreparationFailed => "PayloadPreparationFailed",
            Self::RequestPreparationFailed => "RequestPreparationFailed",
            Self::TransportFailure => "TransportFailure",
            Self::UnexpectedStatus => "UnexpectedStatus",
            Self::UnparsableResponse => "UnparsableResponse",
            Self::RemoteFault => "RemoteFault",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why the request payload could not be produced.
#[derive(Debug, thiserror::Error)]
pub enum PayloadError {
    /// An argument has no XML-RPC representation.
    #[error(transparent)]
    Argument(#[from] ArgumentError),

    /// The `methodCall` document could not be written.
    #[error("cannot encode request: {0}")]
    Encode(#[from] XmlError),
}

/// Why the HTTP request could not be built.
#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    /// The endpoint is not a valid URI.
    #[error("invalid endpoint {endpoint:?}: {source}")]
    InvalidEndpoint {
        /// The configured endpoint.
        endpoint: String,
        /// Parse failure.
        #[source]
        source: http::uri::InvalidUri,
    },

    /// The endpoint has no scheme or no host.
    #[error("endpoint {0:?} is not an absolute URL")]
    NotAbsolute(String),

    /// A header value or the request itself was rejected.
    #[error(transparent)]
    Build(#[from] http::Error),
}

/// Errors returned by [`XmlRpcClient`](crate::XmlRpcClient) calls.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ClientError {
    /// The call's arguments could not be turned into a request document.
    #[error("payload preparation failed: {0}")]
    PayloadPreparation(#[from] PayloadError),

    /// The HTTP request could not be built from the configuration.
    #[error("request preparation failed: {0}")]
    RequestPreparation(#[from] RequestError),

    /// The transport reported an error.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The server answered with a status outside 200-299.
    #[error("server responded with status code {code}")]
    UnexpectedStatus {
        /// HTTP status code.
        code: u16,
    },

    /// The response body violates the XML-RPC response grammar.
    #[error("cannot parse XML-RPC response: {0}")]
    UnparsableResponse(#[source] XmlError),

    /// The remote method returned a fault.
    #[error("remote fault {code}: {message}")]
    Fault {
        /// `faultCode` of the fault.
        code: i32,
        /// `faultString` of the fault.
        message: String,
    },
}

impl From<Fault> for ClientError {
    fn from(fault: Fault) -> Self {
        Self::Fault {
            code: fault.code,
            message: fault.message,
        }
    }
}

impl ClientError {
    /// The phase this error belongs to.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::PayloadPreparation(_) => ErrorKind::PayloadPreparationFailed,
            Self::RequestPreparation(_) => ErrorKind::RequestPreparationFailed,
            Self::Transport(_) => ErrorKind::TransportFailure,
            Self::UnexpectedStatus { .. } => ErrorKind::UnexpectedStatus,
            Self::UnparsableResponse(_) => ErrorKind::UnparsableResponse,
            Self::Fault { .. } => ErrorKind::RemoteFault,
        }
    }

    /// The `faultCode` if this is a remote fault.
    #[must_use]
    pub fn fault_code(&self) -> Option<i32> {
        match self {
            Self::Fault { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// The HTTP status code if the server answered with a non-2xx status.
    #[must_use]
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::UnexpectedStatus { code } => Some(*code),
            _ => None,
        }
    }
}
