//! Request metrics recorded through the `metrics` facade.
//!
//! Nothing is exported unless the application installs a recorder
//! (for example the Prometheus exporter in `turbogql-telemetry`).

use std::time::Duration;

use metrics::{counter, gauge, histogram};

use crate::error::GraphqlClientError;
use crate::observer::{Outcome, RequestEvent, RequestObserver};
use crate::response::GraphqlResponse;

/// Default metric name prefix.
pub const DEFAULT_PREFIX: &str = "graphql_client_";

/// Counter of finished requests.
pub const REQUESTS_TOTAL: &str = "requests_total";
/// Histogram of request durations in milliseconds.
pub const REQUEST_DURATION: &str = "request_duration_milliseconds";
/// Gauge of requests currently running.
pub const REQUESTS_IN_FLIGHT: &str = "requests_in_flight";

/// Full metric names for a prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricNames {
    /// Request counter.
    pub requests_total: String,
    /// Duration histogram.
    pub request_duration: String,
    /// In-flight gauge.
    pub requests_in_flight: String,
}

impl MetricNames {
    /// Names under `prefix`.
    pub fn new(prefix: &str) -> Self {
        Self {
            requests_total: format!("{prefix}{REQUESTS_TOTAL}"),
            request_duration: format!("{prefix}{REQUEST_DURATION}"),
            requests_in_flight: format!("{prefix}{REQUESTS_IN_FLIGHT}"),
        }
    }
}

impl Default for MetricNames {
    fn default() -> Self {
        Self::new(DEFAULT_PREFIX)
    }
}

/// Observer that feeds request count, duration and in-flight metrics.
#[derive(Debug, Clone, Default)]
pub struct MetricsObserver {
    names: MetricNames,
}

impl MetricsObserver {
    /// Observer writing metrics under `prefix`.
    pub fn new(prefix: &str) -> Self {
        Self {
            names: MetricNames::new(prefix),
        }
    }

    /// Metric names in use.
    pub fn names(&self) -> &MetricNames {
        &self.names
    }

    fn in_flight(&self, event: &RequestEvent) -> metrics::Gauge {
        gauge!(
            self.names.requests_in_flight.clone(),
            "client" => event.client.clone(),
            "resource" => event.resource_name.clone(),
            "method" => event.method.verb()
        )
    }

    fn record_duration(&self, event: &RequestEvent, elapsed: Duration) {
        histogram!(
            self.names.request_duration.clone(),
            "client" => event.client.clone(),
            "resource" => event.resource_name.clone(),
            "method" => event.method.verb()
        )
        .record(elapsed.as_secs_f64() * 1000.0);
    }
}

impl RequestObserver for MetricsObserver {
    fn on_start(&self, event: &RequestEvent) {
        self.in_flight(event).increment(1.0);
    }

    fn on_success(&self, event: &RequestEvent, _response: &GraphqlResponse, elapsed: Duration) {
        self.record_duration(event, elapsed);
    }

    fn on_fail(&self, event: &RequestEvent, _error: &GraphqlClientError, elapsed: Duration) {
        self.record_duration(event, elapsed);
    }

    fn on_done(&self, event: &RequestEvent, outcome: Outcome) {
        self.in_flight(event).decrement(1.0);
        counter!(
            self.names.requests_total.clone(),
            "client" => event.client.clone(),
            "resource" => event.resource_name.clone(),
            "method" => event.method.verb(),
            "status" => outcome.as_str()
        )
        .increment(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_names() {
        let names = MetricNames::default();
        assert_eq!(names.requests_total, "graphql_client_requests_total");
        assert_eq!(
            MetricNames::new("api_").request_duration,
            "api_request_duration_milliseconds"
        );
    }
}
