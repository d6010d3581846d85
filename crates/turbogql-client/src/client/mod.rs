//! The request executor.
//!
//! [`GraphqlClient`] wraps a [`Transport`] with request headers, retries,
//! structured logging and lifecycle events. Each call runs:
//!
//! 1. `on_start`, then an info line `"<name>: Start"`;
//! 2. the transport call under the retry policy;
//! 3. on success, timings on the response, `on_success`, `on_done` and an
//!    optional response log line;
//! 4. on failure, timings on the error, `on_fail`, `on_done` and an error
//!    line `"<name>: Fail"`. The error is returned as-is.

mod builder;

pub use builder::GraphqlClientBuilder;

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use tracing::{Instrument, info};

use crate::document::Document;
use crate::error::GraphqlClientError;
use crate::logging::{CallSpan, log_failure, log_success};
use crate::observer::{Outcome, RequestEvent, RequestObserver};
use crate::operation::{OperationKind, RequestArgs};
use crate::options::{DefaultOptions, RequestOptions};
use crate::response::{GraphqlResponse, Timings};
use crate::retry::{RetryContext, retry_request};
use crate::transport::{Transport, TransportRequest};

/// Result type for client calls.
pub type ClientResult<T> = Result<T, GraphqlClientError>;

struct ClientInner {
    name: String,
    transport: Arc<dyn Transport>,
    req_id: String,
    req_id_header: HeaderName,
    req_id_value: HeaderValue,
    req_name_header: HeaderName,
    defaults: DefaultOptions,
    observers: Vec<Arc<dyn RequestObserver>>,
    health_query: Document,
}

/// GraphQL client with retry, structured logging and metrics hooks.
///
/// Cheap to clone; clones share the transport and configuration.
///
/// ```rust,no_run
/// use turbogql_client::{Document, GraphqlClient, RequestOptions};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = GraphqlClient::builder()
///     .with_origin("http://localhost:4000")
///     .with_retry(3)
///     .build()?;
///
/// let query = Document::parse("query GetUser($id: ID!) { user(id: $id) { name } }")?;
/// let response = client
///     .query((query, RequestOptions::new().variable("id", "42")))
///     .await?;
/// println!("{:?}", response.data);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct GraphqlClient {
    inner: Arc<ClientInner>,
}

impl GraphqlClient {
    /// Start building a client.
    pub fn builder() -> GraphqlClientBuilder {
        GraphqlClientBuilder::new()
    }

    /// Client name used in logs and metric labels.
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Request id sent with every call.
    pub fn req_id(&self) -> &str {
        &self.inner.req_id
    }

    /// Run a query.
    ///
    /// # Errors
    ///
    /// Returns the transport error once retries are exhausted, or
    /// [`GraphqlClientError::GraphqlErrors`] when the response carries errors.
    pub async fn query(&self, args: impl Into<RequestArgs>) -> ClientResult<GraphqlResponse> {
        self.execute(OperationKind::Query, args.into()).await
    }

    /// Run a mutation.
    ///
    /// # Errors
    ///
    /// See [`GraphqlClient::query`].
    pub async fn mutate(&self, args: impl Into<RequestArgs>) -> ClientResult<GraphqlResponse> {
        self.execute(OperationKind::Mutation, args.into()).await
    }

    /// Run a JSON-shaped request (see [`RequestArgs::from_json`]).
    ///
    /// # Errors
    ///
    /// Returns [`GraphqlClientError::Document`] before anything is sent when
    /// the request has no valid document; otherwise as [`GraphqlClient::query`].
    pub async fn execute_json(
        &self,
        kind: OperationKind,
        request: serde_json::Value,
    ) -> ClientResult<GraphqlResponse> {
        let args = RequestArgs::from_json(kind, request)?;
        self.execute(kind, args).await
    }

    /// Run the health query under the name `Health`.
    ///
    /// # Errors
    ///
    /// Propagates any failure of the health query.
    pub async fn health(&self) -> ClientResult<bool> {
        let document = self.inner.health_query.clone();
        self.query((document, RequestOptions::new().name("Health")))
            .await?;
        Ok(true)
    }

    /// Run an operation.
    ///
    /// # Errors
    ///
    /// See [`GraphqlClient::query`].
    pub async fn execute(
        &self,
        kind: OperationKind,
        args: RequestArgs,
    ) -> ClientResult<GraphqlResponse> {
        let inner = &*self.inner;
        let (operation, options) = args.normalize(kind);
        let (retry, log) = inner.defaults.resolve(&options);
        let resource_name = operation.resource_name();

        let span = CallSpan {
            client: &inner.name,
            req_id: &inner.req_id,
            operation: &operation,
            resource_name: &resource_name,
            log: &log,
        }
        .span();
        let event = RequestEvent {
            client: inner.name.clone(),
            name: operation.name.clone(),
            resource_name: resource_name.clone(),
            method: kind,
        };
        let request = TransportRequest {
            kind,
            query: operation.document.as_str().to_owned(),
            operation_name: operation.document.operation_name().map(str::to_owned),
            variables: operation.variables.clone(),
            headers: self.request_headers(&resource_name, &operation.headers),
        };

        async {
            let start = Instant::now();
            inner.notify(|observer| observer.on_start(&event));
            info!("{}: Start", resource_name);

            let transport = &inner.transport;
            let result = retry_request(
                || {
                    let request = request.clone();
                    async move {
                        let result = match kind {
                            OperationKind::Query => transport.query(request).await,
                            OperationKind::Mutation => transport.mutate(request).await,
                        };
                        match result {
                            Ok(response) if response.errors.is_empty() => Ok(response),
                            Ok(response) => Err(GraphqlClientError::GraphqlErrors {
                                errors: response.errors,
                                timings: None,
                            }),
                            Err(err) => Err(GraphqlClientError::Transport(err)),
                        }
                    }
                },
                RetryContext {
                    name: &resource_name,
                },
                &retry,
            )
            .await;

            let elapsed = start.elapsed();
            match result {
                Ok(mut response) => {
                    response.timings = Some(Timings::from_duration(elapsed));
                    inner.notify(|observer| observer.on_success(&event, &response, elapsed));
                    inner.notify(|observer| observer.on_done(&event, Outcome::Success));
                    log_success(&resource_name, &log, &response);
                    Ok(response)
                }
                Err(mut err) => {
                    err.record_timings(Timings::from_duration(elapsed));
                    inner.notify(|observer| observer.on_fail(&event, &err, elapsed));
                    inner.notify(|observer| observer.on_done(&event, Outcome::Failure));
                    log_failure(&resource_name, &err);
                    Err(err)
                }
            }
        }
        .instrument(span)
        .await
    }

    /// Request id and name headers, with caller headers merged over them.
    fn request_headers(&self, resource_name: &str, caller: &HeaderMap) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            self.inner.req_id_header.clone(),
            self.inner.req_id_value.clone(),
        );
        if let Ok(value) = HeaderValue::from_str(resource_name) {
            headers.insert(self.inner.req_name_header.clone(), value);
        }
        headers.extend(caller.clone());
        headers
    }
}

impl ClientInner {
    fn notify(&self, f: impl Fn(&dyn RequestObserver)) {
        for observer in &self.observers {
            f(observer.as_ref());
        }
    }
}

impl fmt::Debug for GraphqlClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GraphqlClient")
            .field("name", &self.inner.name)
            .field("req_id", &self.inner.req_id)
            .field("transport", &self.inner.transport)
            .field("observers", &self.inner.observers.len())
            .finish_non_exhaustive()
    }
}
