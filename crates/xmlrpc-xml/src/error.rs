//! XML codec error type.

use std::io;

/// Errors that can occur while writing or reading XML-RPC documents.
///
/// Every grammar violation found by the decoder is reported through this
/// type; callers that only need to know "the response was not valid
/// XML-RPC" can treat all variants alike.
#[derive(Debug, thiserror::Error)]
pub enum XmlError {
    /// An I/O error during XML writing.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Malformed XML reported by quick-xml.
    #[error("XML processing error: {0}")]
    QuickXml(#[from] quick_xml::Error),

    /// A required XML element was missing.
    #[error("missing required XML element: {0}")]
    MissingElement(String),

    /// An element appeared where the grammar does not allow it.
    #[error("unexpected XML element: {0}")]
    UnexpectedElement(String),

    /// Text content that could not be parsed as the declared type.
    #[error("failed to parse value: {0}")]
    ParseError(String),

    /// Elements nested deeper than the decoder accepts.
    #[error("elements nested deeper than {0} levels")]
    NestingTooDeep(usize),

    /// A `fault` struct without exactly `faultCode` and `faultString`.
    #[error("invalid fault: {0}")]
    InvalidFault(String),
}
