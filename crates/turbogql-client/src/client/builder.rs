//! Builder for [`GraphqlClient`].

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{HeaderName, HeaderValue};

use super::{ClientInner, ClientResult, GraphqlClient};
use crate::document::Document;
use crate::error::{BoxError, GraphqlClientError};
use crate::metrics::{DEFAULT_PREFIX, MetricsObserver};
use crate::observer::RequestObserver;
use crate::options::{DefaultOptions, LogLevel};
use crate::response::GraphqlResponse;
use crate::retry::RetryConfig;
use crate::transport::{HttpTransport, HttpTransportConfig, Transport};

/// Default request id header.
pub const DEFAULT_REQ_ID_HEADER: &str = "x-request-id";
/// Default request name header.
pub const DEFAULT_REQ_NAME_HEADER: &str = "x-request-name";
/// Default client name.
pub const DEFAULT_CLIENT_NAME: &str = "graphql";

/// Fluent configuration for a [`GraphqlClient`].
///
/// Without an explicit transport, [`build`](Self::build) creates an
/// [`HttpTransport`] from the origin, path and token settings.
pub struct GraphqlClientBuilder {
    name: String,
    transport: Option<Arc<dyn Transport>>,
    http: HttpTransportConfig,
    req_id: Option<String>,
    req_id_header: String,
    req_name_header: String,
    defaults: DefaultOptions,
    observers: Vec<Arc<dyn RequestObserver>>,
    metrics_prefix: Option<String>,
    health_query: Option<Document>,
}

impl Default for GraphqlClientBuilder {
    fn default() -> Self {
        Self {
            name: DEFAULT_CLIENT_NAME.to_string(),
            transport: None,
            http: HttpTransportConfig::default(),
            req_id: None,
            req_id_header: DEFAULT_REQ_ID_HEADER.to_string(),
            req_name_header: DEFAULT_REQ_NAME_HEADER.to_string(),
            defaults: DefaultOptions::default(),
            observers: Vec::new(),
            metrics_prefix: None,
            health_query: None,
        }
    }
}

impl GraphqlClientBuilder {
    /// New builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    // ============================================================================
    // IDENTITY
    // ============================================================================

    /// Client name used in logs and metric labels.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Fixed request id. Defaults to a fresh UUID v4.
    pub fn with_req_id(mut self, req_id: impl Into<String>) -> Self {
        self.req_id = Some(req_id.into());
        self
    }

    /// Header carrying the request id.
    pub fn with_req_id_header(mut self, header: impl Into<String>) -> Self {
        self.req_id_header = header.into();
        self
    }

    /// Header carrying the operation name.
    pub fn with_req_name_header(mut self, header: impl Into<String>) -> Self {
        self.req_name_header = header.into();
        self
    }

    // ============================================================================
    // TRANSPORT
    // ============================================================================

    /// Use a custom transport.
    pub fn with_transport<T: Transport + 'static>(self, transport: T) -> Self {
        self.with_shared_transport(Arc::new(transport))
    }

    /// Use a shared transport.
    pub fn with_shared_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Server origin for the HTTP transport.
    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.http.origin = origin.into();
        self
    }

    /// Endpoint path for the HTTP transport.
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.http.path = path.into();
        self
    }

    /// Bearer token for the HTTP transport.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.http.token = Some(token.into());
        self
    }

    /// Header sent with every HTTP request.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.http.headers.insert(name.into(), value.into());
        self
    }

    /// HTTP request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.http.timeout = Some(timeout);
        self
    }

    /// Replace the whole HTTP transport configuration.
    pub fn with_http_config(mut self, config: HttpTransportConfig) -> Self {
        self.http = config;
        self
    }

    // ============================================================================
    // CALL DEFAULTS
    // ============================================================================

    /// Default retry configuration (an integer is a retry count).
    pub fn with_retry(mut self, retry: impl Into<RetryConfig>) -> Self {
        self.defaults.retry = retry.into();
        self
    }

    /// Default response log level.
    pub fn with_response_log_level(mut self, level: LogLevel) -> Self {
        self.defaults.response_log_level = level;
        self
    }

    /// Log variables and headers with every call.
    pub fn with_will_log_options(mut self, enabled: bool) -> Self {
        self.defaults.will_log_options = enabled;
        self
    }

    /// Log extracted response properties.
    pub fn with_will_log_response_props(mut self, enabled: bool) -> Self {
        self.defaults.will_log_response_props = enabled;
        self
    }

    /// Log response data.
    pub fn with_will_log_response_data(mut self, enabled: bool) -> Self {
        self.defaults.will_log_response_data = enabled;
        self
    }

    /// Default response-properties extractor.
    pub fn with_log_response_props<F>(mut self, f: F) -> Self
    where
        F: Fn(&GraphqlResponse) -> Result<serde_json::Value, BoxError> + Send + Sync + 'static,
    {
        self.defaults.get_log_response_props = Arc::new(f);
        self
    }

    /// Default response-data extractor.
    pub fn with_log_response_data<F>(mut self, f: F) -> Self
    where
        F: Fn(&GraphqlResponse) -> Result<serde_json::Value, BoxError> + Send + Sync + 'static,
    {
        self.defaults.get_log_response_data = Arc::new(f);
        self
    }

    /// Replace all call defaults.
    pub fn with_defaults(mut self, defaults: DefaultOptions) -> Self {
        self.defaults = defaults;
        self
    }

    // ============================================================================
    // OBSERVATION
    // ============================================================================

    /// Register a lifecycle observer.
    pub fn with_observer(mut self, observer: Arc<dyn RequestObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    /// Record request metrics under the default prefix.
    pub fn with_metrics(self) -> Self {
        self.with_metrics_prefix(DEFAULT_PREFIX)
    }

    /// Record request metrics under `prefix`.
    pub fn with_metrics_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.metrics_prefix = Some(prefix.into());
        self
    }

    /// Document run by [`GraphqlClient::health`].
    pub fn with_health_query(mut self, document: Document) -> Self {
        self.health_query = Some(document);
        self
    }

    // ============================================================================
    // BUILD
    // ============================================================================

    /// Build the client.
    ///
    /// # Errors
    ///
    /// Returns [`GraphqlClientError::Build`] for invalid header names or
    /// values, or when the HTTP transport cannot be created.
    pub fn build(self) -> ClientResult<GraphqlClient> {
        let transport = match self.transport {
            Some(transport) => transport,
            None => Arc::new(HttpTransport::new(&self.http)?),
        };

        let req_id = self
            .req_id
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        let req_id_value = HeaderValue::from_str(&req_id)
            .map_err(|err| GraphqlClientError::Build(format!("request id: {err}")))?;

        let mut observers = self.observers;
        if let Some(prefix) = &self.metrics_prefix {
            observers.push(Arc::new(MetricsObserver::new(prefix)));
        }

        Ok(GraphqlClient {
            inner: Arc::new(ClientInner {
                name: self.name,
                transport,
                req_id,
                req_id_header: header_name(&self.req_id_header)?,
                req_id_value,
                req_name_header: header_name(&self.req_name_header)?,
                defaults: self.defaults,
                observers,
                health_query: self.health_query.unwrap_or_else(Document::health),
            }),
        })
    }
}

fn header_name(name: &str) -> ClientResult<HeaderName> {
    HeaderName::from_bytes(name.to_ascii_lowercase().as_bytes())
        .map_err(|err| GraphqlClientError::Build(format!("header {name}: {err}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let client = GraphqlClientBuilder::new().build().unwrap();
        assert_eq!(client.name(), "graphql");
        assert!(uuid::Uuid::parse_str(client.req_id()).is_ok());
    }

    #[test]
    fn test_invalid_header_name() {
        let result = GraphqlClientBuilder::new()
            .with_req_id_header("not a header")
            .build();
        assert!(matches!(result, Err(GraphqlClientError::Build(_))));
    }

    #[test]
    fn test_invalid_req_id() {
        let result = GraphqlClientBuilder::new().with_req_id("line\nbreak").build();
        assert!(matches!(result, Err(GraphqlClientError::Build(_))));
    }
}
