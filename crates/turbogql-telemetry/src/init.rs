//! Telemetry initialization
//!
//! Provides the [`TelemetryGuard`] for managing telemetry lifecycle.

use crate::{TelemetryConfig, TelemetryError};
use tracing::info;
use tracing_subscriber::{
    Registry, filter::EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt,
};

/// Guard holding the telemetry installed by [`TelemetryConfig::init`].
///
/// Keep it alive in `main()` for as long as the application logs or
/// records metrics.
///
/// ```rust,ignore
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let _telemetry = TelemetryConfig::default().init()?;
///     run().await?;
///     Ok(())
/// }
/// ```
pub struct TelemetryGuard {
    config: TelemetryConfig,
    #[cfg(feature = "prometheus")]
    metrics_handle: Option<metrics_exporter_prometheus::PrometheusHandle>,
}

impl std::fmt::Debug for TelemetryGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut debug = f.debug_struct("TelemetryGuard");
        debug.field("config", &self.config);
        #[cfg(feature = "prometheus")]
        debug.field(
            "metrics_handle",
            &self.metrics_handle.as_ref().map(|_| "PrometheusHandle"),
        );
        debug.finish()
    }
}

impl TelemetryGuard {
    /// Install the tracing subscriber and, if configured, the Prometheus
    /// recorder.
    ///
    /// # Errors
    ///
    /// Fails on an invalid log filter, when a global subscriber or recorder
    /// is already installed, or when the metrics exporter cannot start.
    pub fn init(config: TelemetryConfig) -> Result<Self, TelemetryError> {
        init_subscriber(&config)?;

        #[cfg(feature = "prometheus")]
        let metrics_handle = init_prometheus(&config)?;

        info!(
            service_name = %config.service_name,
            json_logs = config.json_logs,
            stderr_output = config.stderr_output,
            "turbogql telemetry initialized"
        );

        Ok(Self {
            config,
            #[cfg(feature = "prometheus")]
            metrics_handle,
        })
    }

    /// Get the service name
    #[must_use]
    pub fn service_name(&self) -> &str {
        &self.config.service_name
    }

    /// Get the configuration
    #[must_use]
    pub fn config(&self) -> &TelemetryConfig {
        &self.config
    }

    /// Handle to the installed Prometheus recorder
    ///
    /// `None` when metrics are disabled or served over HTTP.
    #[cfg(feature = "prometheus")]
    #[cfg_attr(docsrs, doc(cfg(feature = "prometheus")))]
    #[must_use]
    pub fn metrics_handle(&self) -> Option<&metrics_exporter_prometheus::PrometheusHandle> {
        self.metrics_handle.as_ref()
    }

    /// Current metrics in the Prometheus text format
    #[cfg(feature = "prometheus")]
    #[cfg_attr(docsrs, doc(cfg(feature = "prometheus")))]
    #[must_use]
    pub fn render_metrics(&self) -> Option<String> {
        self.metrics_handle.as_ref().map(|handle| handle.render())
    }
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        info!(
            service_name = %self.config.service_name,
            "Shutting down turbogql telemetry"
        );
    }
}

/// Build the env filter: `RUST_LOG` wins over the configured level.
pub(crate) fn env_filter(config: &TelemetryConfig) -> Result<EnvFilter, TelemetryError> {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .map_err(|e| TelemetryError::InvalidConfiguration(format!("Invalid log level: {e}")))
}

/// Initialize the tracing subscriber
///
/// Each output combination needs its own path because the layer types differ.
fn init_subscriber(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    let env_filter = env_filter(config)?;

    if config.json_logs && config.stderr_output {
        let fmt_layer = fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .json()
            .with_current_span(true);

        Registry::default()
            .with(env_filter)
            .with(fmt_layer)
            .try_init()
            .map_err(|e| TelemetryError::TracingError(e.to_string()))
    } else if config.json_logs {
        let fmt_layer = fmt::layer()
            .with_target(true)
            .json()
            .with_current_span(true);

        Registry::default()
            .with(env_filter)
            .with(fmt_layer)
            .try_init()
            .map_err(|e| TelemetryError::TracingError(e.to_string()))
    } else if config.stderr_output {
        let fmt_layer = fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_thread_ids(false);

        Registry::default()
            .with(env_filter)
            .with(fmt_layer)
            .try_init()
            .map_err(|e| TelemetryError::TracingError(e.to_string()))
    } else {
        let fmt_layer = fmt::layer().with_target(true).with_thread_ids(false);

        Registry::default()
            .with(env_filter)
            .with(fmt_layer)
            .try_init()
            .map_err(|e| TelemetryError::TracingError(e.to_string()))
    }
}

/// Initialize the Prometheus recorder
#[cfg(feature = "prometheus")]
fn init_prometheus(
    config: &TelemetryConfig,
) -> Result<Option<metrics_exporter_prometheus::PrometheusHandle>, TelemetryError> {
    let buckets = config.duration_buckets.as_deref();
    if let Some(port) = config.prometheus_port {
        crate::metrics::serve_metrics(&config.metrics_prefix, buckets, port)?;
        return Ok(None);
    }
    if config.prometheus {
        return crate::metrics::collect_metrics(&config.metrics_prefix, buckets).map(Some);
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_log_level() {
        let config = TelemetryConfig::builder()
            .log_level("turbogql=loudest")
            .build();
        if std::env::var_os("RUST_LOG").is_none() {
            assert!(matches!(
                env_filter(&config),
                Err(TelemetryError::InvalidConfiguration(_))
            ));
        }
    }

    // Full initialization installs global state; see tests/init.rs.
}
