//! Integration tests for the XML-RPC client.
//!
//! Each test starts its own XML-RPC endpoint on an ephemeral localhost port
//! and drives it through [`XmlRpcClient`] over real HTTP. The endpoint serves:
//!
//! - `POST /RPC2`: the methods `pow` and `echo`; anything else is a fault
//! - `GET|POST /fixture/<name>`: a canned `methodResponse` document
//! - every other path: `404 Not Found`
//!
//! Run them with:
//! ```text
//! cargo test -p xmlrpc-integration
//! ```

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Once;

use bytes::Bytes;
use http::{Method, Request, Response, StatusCode};
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::service::service_fn;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as HttpConnBuilder;
use tokio::net::TcpListener;
use tracing::{debug, warn};
use xmlrpc_http::{XmlRpcClient, XmlRpcClientConfig};
use xmlrpc_model::{Fault, MethodCall, MethodResponse, Value};
use xmlrpc_xml::{from_method_call, method_response_to_xml};

static INIT: Once = Once::new();

/// Path of the method endpoint.
pub const RPC_PATH: &str = "/RPC2";

/// Fault code for an unknown method.
pub const METHOD_NOT_FOUND: i32 = -32601;

/// Fault code for bad method arguments.
pub const INVALID_PARAMS: i32 = -32602;

/// Fault code for a failure inside a method.
pub const APPLICATION_ERROR: i32 = -32500;

/// Initialize tracing (once).
fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .with_test_writer()
            .init();
    });
}

/// Start an endpoint on an ephemeral port and return its address.
///
/// The accept loop runs on the calling test's runtime and stops with it.
pub async fn spawn_server() -> anyhow::Result<SocketAddr> {
    init_tracing();

    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(serve(listener));
    Ok(addr)
}

/// Create a client for `path` on a running endpoint.
#[must_use]
pub fn client_for(addr: SocketAddr, path: &str) -> XmlRpcClient {
    client_with_endpoint(format!("http://{addr}{path}"))
}

/// Create a client with an arbitrary endpoint string.
#[must_use]
pub fn client_with_endpoint(endpoint: impl Into<String>) -> XmlRpcClient {
    init_tracing();

    XmlRpcClient::new(
        XmlRpcClientConfig::builder()
            .endpoint(endpoint)
            .timeout_ms(5_000)
            .build(),
    )
}

async fn serve(listener: TcpListener) {
    let http = HttpConnBuilder::new(TokioExecutor::new());

    loop {
        let (stream, peer_addr) = match listener.accept().await {
            Ok(conn) => conn,
            Err(e) => {
                warn!(error = %e, "failed to accept connection");
                continue;
            }
        };

        let conn = http
            .serve_connection(TokioIo::new(stream), service_fn(handle))
            .into_owned();

        tokio::spawn(async move {
            if let Err(e) = conn.await {
                debug!(peer_addr = %peer_addr, error = %e, "connection error");
            }
        });
    }
}

async fn handle(req: Request<Incoming>) -> Result<Response<Full<Bytes>>, Infallible> {
    let path = req.uri().path().to_owned();
    debug!(method = %req.method(), path = %path, "test endpoint request");

    if path == RPC_PATH && req.method() == Method::POST {
        let response = match req.into_body().collect().await {
            Ok(body) => respond_to_call(&body.to_bytes()),
            Err(e) => {
                warn!(error = %e, "failed to read request body");
                status_response(StatusCode::BAD_REQUEST)
            }
        };
        return Ok(response);
    }

    let response = match path.strip_prefix("/fixture/").and_then(fixture) {
        Some(document) => xml_response(Bytes::from_static(document.as_bytes())),
        None => status_response(StatusCode::NOT_FOUND),
    };
    Ok(response)
}

fn respond_to_call(body: &[u8]) -> Response<Full<Bytes>> {
    let call = match from_method_call(body) {
        Ok(call) => call,
        Err(e) => {
            warn!(error = %e, "rejecting malformed methodCall");
            return status_response(StatusCode::BAD_REQUEST);
        }
    };

    let response = match invoke(&call) {
        Ok(value) => MethodResponse::Success(value),
        Err(fault) => MethodResponse::Fault(fault),
    };

    match method_response_to_xml(&response) {
        Ok(xml) => xml_response(Bytes::from(xml)),
        Err(e) => {
            warn!(error = %e, "failed to encode methodResponse");
            status_response(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

fn invoke(call: &MethodCall) -> Result<Value, Fault> {
    match call.method_name.as_str() {
        "pow" => pow(&call.params),
        "echo" => call
            .params
            .first()
            .cloned()
            .ok_or_else(|| Fault::new(INVALID_PARAMS, "echo expected 1 argument, got 0")),
        other => Err(Fault::new(
            METHOD_NOT_FOUND,
            format!("method \"{other}\" is not supported"),
        )),
    }
}

fn pow(params: &[Value]) -> Result<Value, Fault> {
    let [base, exp, ..] = params else {
        return Err(Fault::new(
            INVALID_PARAMS,
            format!("pow expected at least 2 arguments, got {}", params.len()),
        ));
    };

    match (base, exp) {
        (Value::Int(b), Value::Int(e)) if *e >= 0 => u32::try_from(*e)
            .ok()
            .and_then(|e| b.checked_pow(e))
            .map(Value::Int)
            .ok_or_else(|| Fault::new(APPLICATION_ERROR, "integer overflow in pow")),
        _ => match (number(base), number(exp)) {
            (Some(b), Some(e)) => Ok(Value::Double(b.powf(e))),
            _ => Err(Fault::new(
                INVALID_PARAMS,
                format!(
                    "unsupported operand type(s) for pow(): '{}' and '{}'",
                    base.type_name(),
                    exp.type_name()
                ),
            )),
        },
    }
}

fn number(value: &Value) -> Option<f64> {
    match value {
        Value::Int(i) => Some(f64::from(*i)),
        Value::Double(d) => Some(*d),
        _ => None,
    }
}

fn xml_response(body: Bytes) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(body));
    response.headers_mut().insert(
        http::header::CONTENT_TYPE,
        http::HeaderValue::from_static("text/xml"),
    );
    response
}

fn status_response(status: StatusCode) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::new()));
    *response.status_mut() = status;
    response
}

macro_rules! param_document {
    ($value:literal) => {
        concat!(
            r#"<?xml version="1.0"?><methodResponse><params><param>"#,
            $value,
            "</param></params></methodResponse>"
        )
    };
}

macro_rules! fault_document {
    ($members:literal) => {
        concat!(
            r#"<?xml version="1.0"?><methodResponse><fault><value><struct>"#,
            $members,
            "</struct></value></fault></methodResponse>"
        )
    };
}

/// Canned documents served under `/fixture/<name>`.
pub const FIXTURES: &[(&str, &str)] = &[
    (
        "pow_result",
        param_document!("<value><int>512</int></value>"),
    ),
    (
        "pretty_struct",
        "<?xml version=\"1.0\"?>\n<methodResponse>\n  <params>\n    <param>\n      <value>\n        \
         <struct>\n          <member><name>ok</name><value><boolean>1</boolean></value></member>\n        \
         </struct>\n      </value>\n    </param>\n  </params>\n</methodResponse>\n",
    ),
    (
        "fault",
        fault_document!(
            "<member><name>faultCode</name><value><int>-32601</int></value></member>\
             <member><name>faultString</name><value><string>method \"pancake\" is not supported</string></value></member>"
        ),
    ),
    ("empty_body", ""),
    (
        "wrong_xml_format",
        r#"<?xml version="1.0"?><methodResponse><params><param><value><int>1</int></value>"#,
    ),
    (
        "wrong_xml_response",
        r#"<?xml version="1.0"?><methodCall><methodName>pow</methodName><params/></methodCall>"#,
    ),
    (
        "wrong_value_tag",
        param_document!("<val><int>1</int></val>"),
    ),
    (
        "two_params",
        r#"<?xml version="1.0"?><methodResponse><params><param><value>1</value></param><param><value>2</value></param></params></methodResponse>"#,
    ),
    (
        "parse_error_onechildtag",
        param_document!("<value><int>1</int><string>1</string></value>"),
    ),
    (
        "parse_error_wrongtag",
        param_document!("<value><float>1.5</float></value>"),
    ),
    (
        "parse_error_int",
        param_document!("<value><int>one</int></value>"),
    ),
    (
        "parse_error_double",
        param_document!("<value><double>1,5</double></value>"),
    ),
    (
        "parse_error_time",
        param_document!("<value><dateTime.iso8601>yesterday</dateTime.iso8601></value>"),
    ),
    (
        "parse_error_array",
        param_document!("<value><array><value><int>1</int></value></array></value>"),
    ),
    (
        "parse_error_array_element",
        param_document!("<value><array><data><int>1</int></data></array></value>"),
    ),
    (
        "parse_error_boolean",
        param_document!("<value><boolean>yes</boolean></value>"),
    ),
    (
        "parse_error_base64",
        param_document!("<value><base64>***</base64></value>"),
    ),
    (
        "parse_error_struct_noname",
        param_document!("<value><struct><member><value>1</value></member></struct></value>"),
    ),
    (
        "parse_error_struct_novalue",
        param_document!("<value><struct><member><name>a</name></member></struct></value>"),
    ),
    (
        "parse_error_struct_nomember",
        param_document!("<value><struct><name>a</name><value>1</value></struct></value>"),
    ),
    (
        "parse_error_struct_multiple_members",
        param_document!(
            "<value><struct><member><name>a</name><value>1</value><value>2</value></member></struct></value>"
        ),
    ),
    (
        "parse_error_struct_onechildtag",
        param_document!(
            "<value><struct><member><name>a</name><value><int>1</int><int>2</int></value></member></struct></value>"
        ),
    ),
    (
        "parse_error_struct_element",
        param_document!(
            "<value><struct><member><name>a</name><value>1</value><note/></member></struct></value>"
        ),
    ),
    (
        "parse_error_struct_duplicate",
        param_document!(
            "<value><struct><member><name>a</name><value>1</value></member><member><name>a</name><value>2</value></member></struct></value>"
        ),
    ),
    (
        "parse_fault",
        fault_document!("<member><name>faultString</name><value>boom</value></member>"),
    ),
    (
        "parse_fault_name",
        fault_document!(
            "<member><name>faultCode</name><value><int>1</int></value></member>\
             <member><name>faultMessage</name><value>boom</value></member>"
        ),
    ),
    (
        "parse_fault_members",
        fault_document!(
            "<member><name>faultCode</name><value><int>1</int></value></member>\
             <member><name>faultString</name><value>boom</value></member>\
             <member><name>faultDetail</name><value>stack</value></member>"
        ),
    ),
    (
        "parse_fault_type",
        fault_document!(
            "<member><name>faultCode</name><value><string>1</string></value></member>\
             <member><name>faultString</name><value>boom</value></member>"
        ),
    ),
];

fn fixture(name: &str) -> Option<&'static str> {
    FIXTURES
        .iter()
        .find(|(fixture_name, _)| *fixture_name == name)
        .map(|(_, document)| *document)
}

mod test_response;
