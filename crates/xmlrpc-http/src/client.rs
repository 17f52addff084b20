//! XML-RPC call orchestration.
//!
//! A call runs through five phases, each with its own error kind:
//!
//! 1. **Payload**: classify the arguments and write the `methodCall` document
//! 2. **Request**: parse the endpoint and build the `POST` request
//! 3. **Dispatch**: hand the request to the [`HttpTransport`], racing the
//!    caller's cancellation future and the configured timeout
//! 4. **Status**: reject any status outside 200-299
//! 5. **Decode**: parse the `methodResponse`, translating faults
//!
//! The first failing phase ends the call. Nothing is retried.

use std::future::Future;
use std::sync::Arc;

use bytes::Bytes;
use http::header::{CONTENT_TYPE, USER_AGENT};
use http::{Method, Uri};
use xmlrpc_model::{MethodCall, ToParams, Value};
use xmlrpc_xml::{from_method_response, method_call_to_xml};

use crate::config::XmlRpcClientConfig;
use crate::error::{ClientError, PayloadError, RequestError};
use crate::transport::{HttpTransport, HyperTransport, TransportError};

/// Content type of XML-RPC requests.
pub const XML_CONTENT_TYPE: &str = "text/xml";

/// XML-RPC client bound to one endpoint.
///
/// Cloning is cheap; clones share the transport and configuration.
///
/// # Examples
///
/// ```no_run
/// # async fn demo() -> Result<(), xmlrpc_http::ClientError> {
/// use xmlrpc_http::{XmlRpcClient, XmlRpcClientConfig};
/// use xmlrpc_model::Value;
///
/// let client = XmlRpcClient::new(
///     XmlRpcClientConfig::builder()
///         .endpoint("http://localhost:8080/RPC2")
///         .build(),
/// );
/// let result = client.call("pow", (2, 9)).await?;
/// assert_eq!(result, Value::Int(512));
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct XmlRpcClient<T: HttpTransport = HyperTransport> {
    transport: Arc<T>,
    config: Arc<XmlRpcClientConfig>,
}

impl XmlRpcClient<HyperTransport> {
    /// Create a client using the default hyper transport.
    #[must_use]
    pub fn new(config: XmlRpcClientConfig) -> Self {
        Self::with_transport(Arc::new(HyperTransport::new()), config)
    }

    /// Create a client configured from `XMLRPC_*` environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self::new(XmlRpcClientConfig::from_env())
    }
}

impl<T: HttpTransport> Clone for XmlRpcClient<T> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            config: Arc::clone(&self.config),
        }
    }
}

impl<T: HttpTransport> XmlRpcClient<T> {
    /// Create a client over a custom transport.
    pub fn with_transport(transport: Arc<T>, config: XmlRpcClientConfig) -> Self {
        Self {
            transport,
            config: Arc::new(config),
        }
    }

    /// The configuration this client was built with.
    #[must_use]
    pub fn config(&self) -> &XmlRpcClientConfig {
        &self.config
    }

    /// Call `method` with `params` and return its single result value.
    ///
    /// # Errors
    ///
    /// Returns a [`ClientError`] whose [`kind`](ClientError::kind) names the
    /// phase that failed; a remote fault is [`ClientError::Fault`].
    pub async fn call<P: ToParams>(&self, method: &str, params: P) -> Result<Value, ClientError> {
        self.call_with_cancel(method, params, std::future::pending())
            .await
    }

    /// Like [`call`](Self::call), but gives up as soon as `cancel` completes.
    ///
    /// Cancellation is observed only while the request is in flight. A call
    /// cancelled there fails with [`TransportError::Cancelled`]; no partial
    /// result is ever returned.
    ///
    /// # Errors
    ///
    /// See [`call`](Self::call).
    pub async fn call_with_cancel<P, C>(
        &self,
        method: &str,
        params: P,
        cancel: C,
    ) -> Result<Value, ClientError>
    where
        P: ToParams,
        C: Future<Output = ()>,
    {
        let payload = prepare_payload(method, params)?;
        let request = prepare_request(&self.config, payload)?;

        tracing::debug!(
            method,
            endpoint = %request.uri(),
            bytes = request.body().len(),
            "dispatching XML-RPC call"
        );
        let response = self.dispatch(request, cancel).await?;

        let body = check_status(method, response)?;
        decode(method, &body)
    }

    async fn dispatch<C>(
        &self,
        request: http::Request<Bytes>,
        cancel: C,
    ) -> Result<http::Response<Bytes>, TransportError>
    where
        C: Future<Output = ()>,
    {
        let timeout = self.config.timeout();
        let exchange = async {
            let send = self.transport.send(request);
            match timeout {
                Some(limit) => tokio::time::timeout(limit, send)
                    .await
                    .unwrap_or(Err(TransportError::TimedOut(limit))),
                None => send.await,
            }
        };

        tokio::select! {
            biased;
            () = cancel => Err(TransportError::Cancelled),
            result = exchange => result,
        }
    }
}

fn prepare_payload<P: ToParams>(method: &str, params: P) -> Result<Bytes, PayloadError> {
    let call = MethodCall::with_params(method, params)?;
    let xml = method_call_to_xml(&call)?;
    tracing::trace!(method, params = call.params.len(), "encoded method call");
    Ok(Bytes::from(xml))
}

fn prepare_request(
    config: &XmlRpcClientConfig,
    payload: Bytes,
) -> Result<http::Request<Bytes>, RequestError> {
    let uri: Uri = config
        .endpoint
        .parse()
        .map_err(|source| RequestError::InvalidEndpoint {
            endpoint: config.endpoint.clone(),
            source,
        })?;
    if uri.scheme().is_none() || uri.host().is_none() {
        return Err(RequestError::NotAbsolute(config.endpoint.clone()));
    }

    let request = http::Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(CONTENT_TYPE, XML_CONTENT_TYPE)
        .header(USER_AGENT, config.user_agent.as_str())
        .body(payload)?;
    Ok(request)
}

fn check_status(method: &str, response: http::Response<Bytes>) -> Result<Bytes, ClientError> {
    let status = response.status();
    if !status.is_success() {
        tracing::warn!(
            method,
            status = status.as_u16(),
            "XML-RPC endpoint returned an error status"
        );
        return Err(ClientError::UnexpectedStatus {
            code: status.as_u16(),
        });
    }
    Ok(response.into_body())
}

fn decode(method: &str, body: &[u8]) -> Result<Value, ClientError> {
    let response = from_method_response(body).map_err(|e| {
        tracing::debug!(method, error = %e, bytes = body.len(), "unparsable XML-RPC response");
        ClientError::UnparsableResponse(e)
    })?;

    response.into_result().map_err(|fault| {
        tracing::debug!(method, code = fault.code, "remote fault");
        ClientError::from(fault)
    })
}
