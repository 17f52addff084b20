//! HTTP transport boundary.
//!
//! The client never talks to the network directly. It hands a fully built
//! request to an [`HttpTransport`] and receives a response whose body has
//! already been collected. [`HyperTransport`] is the default implementation.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper_util::client::legacy::Client;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::rt::TokioExecutor;

/// Future returned by [`HttpTransport::send`].
pub type TransportFuture<'a> =
    Pin<Box<dyn Future<Output = Result<http::Response<Bytes>, TransportError>> + Send + 'a>>;

/// Errors produced while exchanging a request with the remote endpoint.
///
/// These are surfaced to callers unmodified, wrapped only in
/// [`ClientError::Transport`](crate::ClientError::Transport).
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The request could not be sent or no response head was received.
    #[error("HTTP request failed: {0}")]
    Request(#[from] hyper_util::client::legacy::Error),

    /// The response body could not be read.
    #[error("failed to read response body: {0}")]
    Body(#[from] hyper::Error),

    /// The call did not complete within the configured timeout.
    #[error("request timed out after {}ms", .0.as_millis())]
    TimedOut(Duration),

    /// The caller cancelled the call before a response arrived.
    #[error("request cancelled")]
    Cancelled,

    /// Any other failure reported by a custom transport.
    #[error("transport error: {0}")]
    Other(Box<dyn std::error::Error + Send + Sync>),
}

/// Sends one HTTP request and returns the buffered response.
///
/// Implementations must not retry and must not interpret the status code;
/// both are decisions of the caller.
pub trait HttpTransport: Send + Sync + 'static {
    /// Send the request and collect the full response body.
    fn send(&self, request: http::Request<Bytes>) -> TransportFuture<'_>;
}

/// Plain HTTP/1 transport built on hyper's pooled legacy client.
#[derive(Debug, Clone)]
pub struct HyperTransport {
    client: Client<HttpConnector, Full<Bytes>>,
}

impl HyperTransport {
    /// Create a transport with its own connection pool.
    #[must_use]
    pub fn new() -> Self {
        Self {
            client: Client::builder(TokioExecutor::new()).build_http(),
        }
    }
}

impl Default for HyperTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpTransport for HyperTransport {
    fn send(&self, request: http::Request<Bytes>) -> TransportFuture<'_> {
        let request = request.map(Full::new);
        Box::pin(async move {
            let response = self.client.request(request).await?;
            let (parts, body) = response.into_parts();
            let body = body.collect().await?.to_bytes();
            tracing::trace!(status = %parts.status, bytes = body.len(), "collected response body");
            Ok(http::Response::from_parts(parts, body))
        })
    }
}
