//! Client configuration.
//!
//! Provides [`XmlRpcClientConfig`] for configuring an [`XmlRpcClient`](crate::XmlRpcClient).
//! Values can be loaded from environment variables.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

/// Endpoint used when none is configured.
pub const DEFAULT_ENDPOINT: &str = "http://localhost:8080/RPC2";

/// Default per-call timeout in milliseconds.
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

/// `User-Agent` sent when none is configured.
pub const DEFAULT_USER_AGENT: &str = concat!("xmlrpc-http/", env!("CARGO_PKG_VERSION"));

/// XML-RPC client configuration.
///
/// The endpoint is kept as an opaque string; it is only parsed when a call
/// prepares its HTTP request, so an invalid endpoint surfaces as a
/// request preparation error on the first call.
///
/// # Examples
///
/// ```
/// use xmlrpc_http::config::XmlRpcClientConfig;
///
/// let config = XmlRpcClientConfig::builder()
///     .endpoint("http://127.0.0.1:8000/RPC2")
///     .timeout_ms(5_000)
///     .build();
/// assert_eq!(config.endpoint, "http://127.0.0.1:8000/RPC2");
/// assert_eq!(config.timeout_ms, 5_000);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, TypedBuilder)]
#[serde(rename_all = "camelCase")]
pub struct XmlRpcClientConfig {
    /// URL every call is POSTed to (e.g. `"http://localhost:8080/RPC2"`).
    #[builder(setter(into))]
    pub endpoint: String,

    /// Upper bound on dispatch plus body collection, in milliseconds.
    /// `0` disables the timeout.
    #[builder(default = DEFAULT_TIMEOUT_MS)]
    pub timeout_ms: u64,

    /// Value of the `User-Agent` request header.
    #[builder(default = String::from(DEFAULT_USER_AGENT), setter(into))]
    pub user_agent: String,
}

impl Default for XmlRpcClientConfig {
    fn default() -> Self {
        Self {
            endpoint: String::from(DEFAULT_ENDPOINT),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            user_agent: String::from(DEFAULT_USER_AGENT),
        }
    }
}

impl XmlRpcClientConfig {
    /// Load configuration from environment variables.
    ///
    /// | Variable | Default |
    /// |----------|---------|
    /// | `XMLRPC_ENDPOINT` | `http://localhost:8080/RPC2` |
    /// | `XMLRPC_TIMEOUT_MS` | `30000` |
    /// | `XMLRPC_USER_AGENT` | `xmlrpc-http/<version>` |
    ///
    /// An unparsable `XMLRPC_TIMEOUT_MS` is ignored with a warning.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(v) = lookup("XMLRPC_ENDPOINT") {
            config.endpoint = v;
        }
        if let Some(v) = lookup("XMLRPC_TIMEOUT_MS") {
            match v.trim().parse::<u64>() {
                Ok(n) => config.timeout_ms = n,
                Err(e) => {
                    tracing::warn!(value = %v, error = %e, "ignoring invalid XMLRPC_TIMEOUT_MS");
                }
            }
        }
        if let Some(v) = lookup("XMLRPC_USER_AGENT") {
            config.user_agent = v;
        }

        config
    }

    /// The call timeout, or `None` when disabled.
    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_ms > 0).then(|| Duration::from_millis(self.timeout_ms))
    }
}
