//! Transport abstraction and the reqwest-backed HTTP transport.

use std::collections::HashMap;
use std::error::Error as StdError;
use std::io;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{self, HeaderMap, HeaderName, HeaderValue};
use serde::Serialize;
use tracing::debug;

use crate::error::{GraphqlClientError, NetworkError, TransportError};
use crate::operation::OperationKind;
use crate::options::JsonMap;
use crate::response::GraphqlResponse;

/// One request as handed to a [`Transport`].
#[derive(Debug, Clone)]
pub struct TransportRequest {
    /// Query or mutation.
    pub kind: OperationKind,
    /// Document source.
    pub query: String,
    /// Operation name, if known.
    pub operation_name: Option<String>,
    /// Variables.
    pub variables: JsonMap,
    /// Request headers, including the request id and name headers.
    pub headers: HeaderMap,
}

/// Something that can send GraphQL operations.
///
/// Failures that should be retried must carry a [`NetworkError`].
#[async_trait]
pub trait Transport: Send + Sync + std::fmt::Debug {
    /// Run a query.
    async fn query(&self, request: TransportRequest) -> Result<GraphqlResponse, TransportError>;

    /// Run a mutation.
    async fn mutate(&self, request: TransportRequest) -> Result<GraphqlResponse, TransportError>;
}

/// HTTP transport configuration.
#[derive(Debug, Clone)]
pub struct HttpTransportConfig {
    /// Server origin, e.g. `http://localhost:4000`.
    pub origin: String,
    /// Endpoint path.
    pub path: String,
    /// Bearer token sent as `authorization`.
    pub token: Option<String>,
    /// Headers sent with every request.
    pub headers: HashMap<String, String>,
    /// Request timeout.
    pub timeout: Option<Duration>,
}

impl Default for HttpTransportConfig {
    fn default() -> Self {
        Self {
            origin: "http://localhost:4000".to_string(),
            path: "/graphql".to_string(),
            token: None,
            headers: HashMap::new(),
            timeout: Some(Duration::from_secs(30)),
        }
    }
}

impl HttpTransportConfig {
    /// Configuration for an origin with the default path.
    pub fn new(origin: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            ..Self::default()
        }
    }

    /// Full endpoint URL.
    pub fn url(&self) -> String {
        let origin = self.origin.trim_end_matches('/');
        if self.path.is_empty() {
            origin.to_string()
        } else if self.path.starts_with('/') {
            format!("{origin}{}", self.path)
        } else {
            format!("{origin}/{}", self.path)
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RequestBody<'a> {
    query: &'a str,
    variables: &'a JsonMap,
    #[serde(skip_serializing_if = "Option::is_none")]
    operation_name: Option<&'a str>,
}

/// GraphQL over HTTP POST.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    http: reqwest::Client,
    url: String,
}

impl HttpTransport {
    /// Build a transport from its configuration.
    ///
    /// # Errors
    ///
    /// Returns [`GraphqlClientError::Build`] when a header is invalid or the
    /// reqwest client cannot be built.
    pub fn new(config: &HttpTransportConfig) -> Result<Self, GraphqlClientError> {
        let mut default_headers = HeaderMap::new();
        for (name, value) in &config.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|err| GraphqlClientError::Build(format!("header {name}: {err}")))?;
            let value = HeaderValue::from_str(value)
                .map_err(|err| GraphqlClientError::Build(format!("header {name}: {err}")))?;
            default_headers.insert(name, value);
        }
        if let Some(token) = &config.token {
            let mut value = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|err| GraphqlClientError::Build(format!("authorization: {err}")))?;
            value.set_sensitive(true);
            default_headers.insert(header::AUTHORIZATION, value);
        }

        let mut builder = reqwest::Client::builder().default_headers(default_headers);
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            http: builder.build()?,
            url: config.url(),
        })
    }

    /// Wrap an existing reqwest client.
    pub fn from_client(http: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            http,
            url: url.into(),
        }
    }

    /// Endpoint URL.
    pub fn url(&self) -> &str {
        &self.url
    }

    async fn send(&self, request: TransportRequest) -> Result<GraphqlResponse, TransportError> {
        let body = RequestBody {
            query: &request.query,
            variables: &request.variables,
            operation_name: request.operation_name.as_deref(),
        };
        debug!(url = %self.url, kind = %request.kind, "Sending GraphQL request");

        let response = self
            .http
            .post(&self.url)
            .headers(request.headers.clone())
            .json(&body)
            .send()
            .await
            .map_err(from_reqwest)?;

        let status = response.status();
        if !status.is_success() {
            let headers = response.headers().clone();
            return Err(TransportError::network(
                format!(
                    "Response not successful: Received status code {}",
                    status.as_u16()
                ),
                NetworkError::with_status(status.as_u16()).headers(headers),
            ));
        }

        response.json::<GraphqlResponse>().await.map_err(|err| {
            if err.is_decode() {
                TransportError::new(format!("Failed to parse GraphQL response: {err}"))
                    .with_source(err)
            } else {
                from_reqwest(err)
            }
        })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn query(&self, request: TransportRequest) -> Result<GraphqlResponse, TransportError> {
        self.send(request).await
    }

    async fn mutate(&self, request: TransportRequest) -> Result<GraphqlResponse, TransportError> {
        self.send(request).await
    }
}

fn from_reqwest(err: reqwest::Error) -> TransportError {
    let message = err.to_string();
    let error = match error_code(&err) {
        Some(code) => TransportError::network(message, NetworkError::with_code(code)),
        None => TransportError::new(message),
    };
    error.with_source(err)
}

/// Map a reqwest failure to a connection error code.
fn error_code(err: &reqwest::Error) -> Option<&'static str> {
    let mut source: Option<&(dyn StdError + 'static)> = err.source();
    while let Some(current) = source {
        if let Some(io_err) = current.downcast_ref::<io::Error>()
            && let Some(code) = io_error_code(io_err.kind())
        {
            return Some(code);
        }
        if current.to_string().contains("dns error") {
            return Some("ENOTFOUND");
        }
        source = current.source();
    }
    if err.is_timeout() {
        return Some("ETIMEDOUT");
    }
    None
}

fn io_error_code(kind: io::ErrorKind) -> Option<&'static str> {
    match kind {
        io::ErrorKind::ConnectionRefused => Some("ECONNREFUSED"),
        io::ErrorKind::ConnectionReset | io::ErrorKind::ConnectionAborted => Some("ECONNRESET"),
        io::ErrorKind::TimedOut => Some("ETIMEDOUT"),
        io::ErrorKind::BrokenPipe => Some("EPIPE"),
        io::ErrorKind::AddrInUse => Some("EADDRINUSE"),
        io::ErrorKind::NetworkUnreachable | io::ErrorKind::HostUnreachable => Some("ENETUNREACH"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_joining() {
        assert_eq!(
            HttpTransportConfig::new("http://localhost:4000/").url(),
            "http://localhost:4000/graphql"
        );
        let config = HttpTransportConfig {
            path: "api".to_string(),
            ..HttpTransportConfig::new("https://example.com")
        };
        assert_eq!(config.url(), "https://example.com/api");
    }

    #[test]
    fn test_io_error_codes() {
        assert_eq!(io_error_code(io::ErrorKind::ConnectionRefused), Some("ECONNREFUSED"));
        assert_eq!(io_error_code(io::ErrorKind::BrokenPipe), Some("EPIPE"));
        assert_eq!(io_error_code(io::ErrorKind::NotFound), None);
    }

    #[test]
    fn test_invalid_header_rejected() {
        let mut config = HttpTransportConfig::new("http://localhost");
        config.headers.insert("bad header".to_string(), "x".to_string());
        assert!(matches!(
            HttpTransport::new(&config),
            Err(GraphqlClientError::Build(_))
        ));
    }

    #[test]
    fn test_body_shape() {
        let variables = JsonMap::new();
        let body = RequestBody {
            query: "query Q { foo }",
            variables: &variables,
            operation_name: Some("Q"),
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            serde_json::json!({ "query": "query Q { foo }", "variables": {}, "operationName": "Q" })
        );
    }
}
