//! GraphQL client with retry, structured logging and metrics hooks.
//!
//! [`GraphqlClient`] sends queries and mutations through a [`Transport`]
//! (by default [`HttpTransport`], built on reqwest). Each call:
//!
//! - carries a request id header and an operation name header,
//! - is retried on transient HTTP statuses and connection errors, honouring
//!   `retry-after` on `503` responses,
//! - logs `Start`, `Success` and `Fail` lines inside a per-call span,
//! - emits lifecycle events to [`RequestObserver`]s, including the optional
//!   [`MetricsObserver`].
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use turbogql_client::{Document, GraphqlClient, GraphqlRequest, RequestOptions};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = GraphqlClient::builder()
//!     .with_name("users")
//!     .with_origin("https://users.example.com")
//!     .with_token("secret")
//!     .with_metrics()
//!     .build()?;
//!
//! // Document plus options
//! let query = Document::parse("query Me { me { id } }")?;
//! let response = client.query((query.clone(), RequestOptions::new().retry(2))).await?;
//!
//! // Single request object
//! let response = client.query(GraphqlRequest::new(query)).await?;
//!
//! assert!(client.health().await?);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

mod client;
mod config;
mod document;
mod error;
mod logging;
mod observer;
mod operation;
mod options;
mod registry;
mod response;

pub mod metrics;
pub mod retry;
pub mod transport;

pub use client::{ClientResult, GraphqlClient, GraphqlClientBuilder};
pub use config::{ClientConfig, ClientsConfig, RetryOptions, RetrySetting};
pub use document::{Document, HEALTH_QUERY};
pub use error::{
    BoxError, DocumentError, GraphqlClientError, GraphqlError, GraphqlErrorLocation,
    GraphqlPathSegment, NetworkError, TransportError,
};
pub use metrics::MetricsObserver;
pub use observer::{Outcome, RequestEvent, RequestObserver};
pub use operation::{GraphqlRequest, Operation, OperationKind, RequestArgs};
pub use options::{DefaultOptions, JsonMap, LogLevel, RequestOptions, ResponseExtractor};
pub use registry::ClientRegistry;
pub use response::{GraphqlResponse, Phases, Timings};
pub use retry::{RetryConfig, RetryDecision, RetryPolicy, Retryable, retry_request};
pub use transport::{HttpTransport, HttpTransportConfig, Transport, TransportRequest};

/// Prelude module for convenient imports
pub mod prelude {
    pub use super::{
        ClientRegistry, Document, GraphqlClient, GraphqlClientError, GraphqlRequest,
        GraphqlResponse, OperationKind, RequestOptions, RetryConfig,
    };
}
