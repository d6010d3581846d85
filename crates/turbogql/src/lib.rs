//! # turbogql
//!
//! A thin GraphQL toolkit: a client that wraps every query and mutation
//! with retry, per-call structured logging and metrics hooks, plus the
//! pieces around it.
//!
//! ## Features
//!
//! - **Request executor** - [`GraphqlClient`] with `query`, `mutate` and
//!   `health`, request id and name headers, and timings on every result
//! - **Retry policy** - exponential backoff with jitter over network errors
//!   and retryable status codes, honouring `Retry-After` on 503
//! - **Observers** - [`RequestObserver`] hooks; [`MetricsObserver`] records
//!   counters, histograms and in-flight gauges through the `metrics` facade
//! - **Configuration** - [`ClientsConfig`] and [`ClientRegistry`] build named
//!   clients from a file with shared defaults
//! - **Telemetry** (`telemetry`, `prometheus`) - subscriber setup and
//!   Prometheus export
//! - **Server** (`server`) - `exec` against an external schema executor
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use turbogql::prelude::*;
//!
//! # async fn example() -> Result<(), GraphqlClientError> {
//! let client = GraphqlClient::builder()
//!     .with_name("users")
//!     .with_origin("http://localhost:4000")
//!     .with_retry(3)
//!     .with_metrics()
//!     .build()?;
//!
//! let query = Document::parse("query GetUser($id: ID!) { user(id: $id) { name } }")?;
//! let response = client
//!     .query((query, RequestOptions::new().variable("id", "42")))
//!     .await?;
//! println!("{:?}", response.data);
//! # Ok(())
//! # }
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(unsafe_code)]

pub use turbogql_client::*;

#[cfg(feature = "telemetry")]
#[cfg_attr(docsrs, doc(cfg(feature = "telemetry")))]
pub use turbogql_telemetry as telemetry;

#[cfg(feature = "server")]
#[cfg_attr(docsrs, doc(cfg(feature = "server")))]
pub use turbogql_server as server;

pub use async_trait::async_trait;
pub use tracing;

/// Prelude module for convenient imports
pub mod prelude {
    pub use turbogql_client::prelude::*;
    pub use turbogql_client::{
        DocumentError, RequestObserver, Transport, TransportRequest,
    };

    #[cfg(feature = "telemetry")]
    pub use turbogql_telemetry::{TelemetryConfig, TelemetryGuard};

    #[cfg(feature = "server")]
    pub use turbogql_server::{ExecRequest, SchemaExecutor, exec};

    pub use async_trait::async_trait;
}
