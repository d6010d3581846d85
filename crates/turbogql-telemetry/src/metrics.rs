//! Prometheus export for client metrics
//!
//! Client metrics are recorded by `turbogql_client::MetricsObserver` through
//! the `metrics` facade. This module installs the Prometheus recorder they
//! end up in and registers their descriptions.
//!
//! # Example
//!
//! ```rust,no_run
//! use turbogql_telemetry::metrics::collect_metrics;
//!
//! let handle = collect_metrics("graphql_client_", Some(&[0.0, 200.0, 300.0, 800.0]))?;
//! println!("{}", handle.render());
//! # Ok::<(), turbogql_telemetry::TelemetryError>(())
//! ```

use std::net::SocketAddr;

use metrics::{Unit, describe_counter, describe_gauge, describe_histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use tracing::info;
use turbogql_client::metrics::MetricNames;

use crate::{TelemetryError, TelemetryResult};

/// Register descriptions for the client metrics under `prefix`.
pub fn describe_client_metrics(prefix: &str) {
    let names = MetricNames::new(prefix);
    describe_counter!(
        names.requests_total.clone(),
        Unit::Count,
        "Total number of GraphQL client requests"
    );
    describe_histogram!(
        names.request_duration.clone(),
        Unit::Milliseconds,
        "Duration of GraphQL client requests in milliseconds"
    );
    describe_gauge!(
        names.requests_in_flight.clone(),
        "Number of GraphQL client requests in flight"
    );
}

/// Prometheus builder with optional duration buckets.
///
/// Without buckets the duration histogram is exported as a summary.
pub fn prometheus_builder(prefix: &str, buckets: Option<&[f64]>) -> TelemetryResult<PrometheusBuilder> {
    let builder = PrometheusBuilder::new();
    match buckets {
        Some(buckets) => builder
            .set_buckets_for_metric(Matcher::Full(MetricNames::new(prefix).request_duration), buckets)
            .map_err(|e| TelemetryError::MetricsError(e.to_string())),
        None => Ok(builder),
    }
}

/// Install a global Prometheus recorder and describe the client metrics.
///
/// # Errors
///
/// Fails when the buckets are empty or a recorder is already installed.
pub fn collect_metrics(prefix: &str, buckets: Option<&[f64]>) -> TelemetryResult<PrometheusHandle> {
    let handle = prometheus_builder(prefix, buckets)?
        .install_recorder()
        .map_err(|e| TelemetryError::MetricsError(e.to_string()))?;
    describe_client_metrics(prefix);
    Ok(handle)
}

/// Install a global Prometheus recorder served over HTTP on `port`.
///
/// # Errors
///
/// Fails when the buckets are empty, the listener cannot be set up, or a
/// recorder is already installed.
pub fn serve_metrics(prefix: &str, buckets: Option<&[f64]>, port: u16) -> TelemetryResult<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    prometheus_builder(prefix, buckets)?
        .with_http_listener(addr)
        .install()
        .map_err(|e| TelemetryError::MetricsError(e.to_string()))?;
    describe_client_metrics(prefix);
    info!(port, "Prometheus metrics endpoint started");
    Ok(())
}
